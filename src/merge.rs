//! Ordered merge of sorted hashcode streams into a fresh sparse list, and
//! the one-way conversion from a sparse list to dense registers.

use crate::encoding::decode_hash;
use crate::registers::Registers;
use crate::sparse::SparseList;

/// A decoded element of a merge stream.
#[derive(Clone, Copy)]
struct MergeElem {
    index: u64,
    rho: u8,
    encoded: u64,
}

/// Decodes hashcodes and suppresses runs of equal-index codes, keeping the
/// first of each run. Scratch input is sorted with the highest rho first,
/// so the survivor is the max-rho variant.
struct DedupIter<I> {
    input: I,
    last_index: Option<u64>,
    p: u32,
    p_prime: u32,
}

impl<I: Iterator<Item = u64>> DedupIter<I> {
    fn new(input: I, p: u32, p_prime: u32) -> Self {
        Self {
            input,
            last_index: None,
            p,
            p_prime,
        }
    }
}

impl<I: Iterator<Item = u64>> Iterator for DedupIter<I> {
    type Item = MergeElem;

    fn next(&mut self) -> Option<MergeElem> {
        loop {
            let encoded = self.input.next()?;
            let (index, rho) = decode_hash(encoded, self.p, self.p_prime);
            if self.last_index == Some(index) {
                continue;
            }
            self.last_index = Some(index);
            return Some(MergeElem {
                index,
                rho,
                encoded,
            });
        }
    }
}

/// Two-way ordered merge of index-sorted hashcode streams. Elements sharing
/// an index are deduplicated, keeping the one with the higher rho. Output is
/// appended to a fresh list; `cap_bytes` is a capacity hint.
pub(crate) fn merge(
    p: u32,
    p_prime: u32,
    cap_bytes: usize,
    left: impl Iterator<Item = u64>,
    right: impl Iterator<Item = u64>,
) -> SparseList {
    let mut left = DedupIter::new(left, p, p_prime);
    let mut right = DedupIter::new(right, p, p_prime);
    let mut output = SparseList::with_capacity(cap_bytes);

    let mut l = left.next();
    let mut r = right.next();
    while let (Some(a), Some(b)) = (l, r) {
        if a.index < b.index {
            output.add(a.encoded);
            l = left.next();
        } else if b.index < a.index {
            output.add(b.encoded);
            r = right.next();
        } else {
            // Equal indices: keep the higher rho, consume both.
            output.add(if a.rho > b.rho { a.encoded } else { b.encoded });
            l = left.next();
            r = right.next();
        }
    }
    while let Some(b) = r {
        output.add(b.encoded);
        r = right.next();
    }
    while let Some(a) = l {
        output.add(a.encoded);
        l = left.next();
    }

    output
}

/// Expand a sparse list into a dense register array.
pub(crate) fn sparse_to_dense(list: &SparseList, p: u32, p_prime: u32) -> Registers {
    let mut registers = Registers::new(1 << p);
    for k in list.iter() {
        let (idx, r) = decode_hash(k, p, p_prime);
        if r > registers.get(idx) {
            registers.set(idx, r);
        }
    }
    registers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{encode_hash, get_index, sort_hashcodes};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const P: u32 = 12;
    const P_PRIME: u32 = 25;

    fn sorted_hashcodes(seed: u64, count: usize) -> Vec<u64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut codes: Vec<u64> = (0..count)
            .map(|_| encode_hash(rng.gen(), P, P_PRIME))
            .collect();
        sort_hashcodes(&mut codes, P, P_PRIME);
        codes
    }

    #[test]
    fn test_merged_indices_strictly_increase() {
        let input1 = sorted_hashcodes(1, 200);
        let input2 = sorted_hashcodes(2, 100);

        let merged = merge(
            P,
            P_PRIME,
            0,
            input1.iter().copied(),
            input2.iter().copied(),
        );

        let mut last_index = None;
        for k in merged.iter() {
            let index = get_index(k, P);
            assert!(Some(index) > last_index, "{index:?} after {last_index:?}");
            last_index = Some(index);
        }
    }

    #[test]
    fn test_equal_index_keeps_max_rho() {
        // Two tagged codes for the same register, differing only in tail rho.
        let stronger = encode_hash(0x1u64 << 52, P, P_PRIME);
        let weaker = encode_hash((0x1u64 << 52) | 1, P, P_PRIME);
        let (index_a, rho_a) = decode_hash(stronger, P, P_PRIME);
        let (index_b, rho_b) = decode_hash(weaker, P, P_PRIME);
        assert_eq!(index_a, index_b);
        assert!(rho_a > rho_b);

        let merged = merge(
            P,
            P_PRIME,
            0,
            std::iter::once(stronger),
            std::iter::once(weaker),
        );
        assert_eq!(merged.num_elements(), 1);
        assert_eq!(merged.iter().next(), Some(stronger));
    }

    #[test]
    fn test_merge_with_empty_side() {
        let input = sorted_hashcodes(3, 50);
        let merged = merge(P, P_PRIME, 0, input.iter().copied(), std::iter::empty());
        assert_eq!(merged.num_elements() as usize, {
            let mut indices: Vec<u64> = input.iter().map(|&k| get_index(k, P)).collect();
            indices.dedup();
            indices.len()
        });
    }

    #[test]
    fn test_sparse_to_dense_places_decoded_values() {
        // Untagged codes with distinct indices plus one tagged code.
        let mut codes = vec![
            encode_hash(0x1u64 << 39, P, P_PRIME),
            encode_hash(0x2u64 << 39, P, P_PRIME),
            encode_hash(0xcu64 << 39, P, P_PRIME),
            encode_hash(0x1u64 << 52, P, P_PRIME),
        ];
        sort_hashcodes(&mut codes, P, P_PRIME);
        let mut list = SparseList::default();
        for &k in &codes {
            list.add(k);
        }

        let registers = sparse_to_dense(&list, P, P_PRIME);
        assert_eq!(registers.len(), 1 << P);
        for &k in &codes {
            let (idx, rho) = decode_hash(k, P, P_PRIME);
            assert_eq!(registers.get(idx), rho, "register {idx}");
        }
    }
}
