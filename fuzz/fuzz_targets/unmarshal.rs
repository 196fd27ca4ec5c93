#![no_main]

use hllpp::Hll;
use libfuzzer_sys::fuzz_target;

// Arbitrary input must either unmarshal into a usable estimator or surface
// a structured error; it must never panic.
fuzz_target!(|data: &[u8]| {
    if let Ok(mut estimator) = Hll::unmarshal(data) {
        estimator.add(1);
        assert!(estimator.cardinality() > 0);
    }
});
