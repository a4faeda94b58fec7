#![no_main]

use libfuzzer_sys::fuzz_target;

use whosdown::telegram::types::Update;

/// Feeds arbitrary bytes through the same decode path the webhook
/// listener uses for inbound update bodies.
///
/// This catches:
/// - Panics in serde_json on malformed input
/// - Unexpected panics from missing/extra fields in adversarial updates
fuzz_target!(|data: &[u8]| {
    let Ok(update) = serde_json::from_slice::<Update>(data) else {
        return; // Invalid JSON is fine, just not a panic
    };

    // Touch the routed fields the dispatcher reads.
    let _ = update.update_id;
    if let Some(cb) = &update.callback_query {
        let _ = cb.data.as_deref().map(|d| d.parse::<usize>());
    }
});
