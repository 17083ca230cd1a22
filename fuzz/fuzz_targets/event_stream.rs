#![no_main]

use libfuzzer_sys::fuzz_target;
use optrace::clock::ClockSample;
use optrace::config::ReconstructConfig;
use optrace::event::parse_events;
use optrace::session::build_report;

fuzz_target!(|data: &[u8]| {
    // Any byte string must either fail to load, fail to reconstruct, or
    // produce a trace; it must never panic
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(events) = parse_events(input) {
            let _ = build_report(&events, ClockSample::new(0, 0, 0), &ReconstructConfig::default());
        }
    }
});
