#![no_main]

use hllpp::Hll;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let split_index = data[0] as usize % data.len();
    let (first_half, second_half) = data.split_at(split_index);

    let mut estimator1 = Hll::new(10, 20);
    for chunk in first_half.chunks(8) {
        estimator1.add(hash_chunk(chunk));
        assert!(estimator1.cardinality() > 0);
    }

    let mut estimator2 = Hll::new(10, 20);
    for chunk in second_half.chunks(8) {
        estimator2.add(hash_chunk(chunk));
        assert!(estimator2.cardinality() > 0);
    }

    estimator1.combine(&mut estimator2);
    let _ = estimator1.cardinality();
});

fn hash_chunk(chunk: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes[..chunk.len()].copy_from_slice(chunk);
    u64::from_le_bytes(bytes)
}
