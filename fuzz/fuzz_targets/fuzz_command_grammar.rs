#![no_main]

use libfuzzer_sys::fuzz_target;

use whosdown::poll::model::Poll;
use whosdown::poll::render::{keyboard, who_list};
use whosdown::poll::split_query;

/// Drives the creation path end to end on arbitrary command text:
/// parse -> poll -> render text -> render keyboard.
///
/// This catches:
/// - Panics on adversarial delimiter layouts (`##`, `#`, empty segments)
/// - Slicing panics on multi-byte UTF-8 around the delimiters
/// - Renderer panics on pathological question/label content
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok((question, options)) = split_query(text) else {
        return; // Oversized option lists are a normal rejection
    };

    let poll = Poll::new(question, options);
    let rendered = who_list(&poll);
    let markup = keyboard(&poll);

    assert!(!rendered.is_empty());
    assert_eq!(
        markup.inline_keyboard.iter().flatten().count(),
        poll.choices.len()
    );
});
