//! Top-level HyperLogLog++ estimator.

use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};

use wyhash::WyHash;

use crate::bias::{estimate_bias, threshold};
use crate::bits::rho;
use crate::encoding::{decode_hash, encode_hash, sort_hashcodes};
use crate::merge::{merge, sparse_to_dense};
use crate::registers::Registers;
use crate::sparse::SparseList;

const ALPHA_16: f64 = 0.673;
const ALPHA_32: f64 = 0.697;
const ALPHA_64: f64 = 0.709;

/// HyperLogLog++ cardinality estimator.
///
/// Estimates the number of distinct 64-bit hashes seen so far. New
/// estimators hold their data in a compressed sparse list which counts
/// nearly exactly at small cardinalities; once the list outgrows its budget
/// the estimator converts, irreversibly, to a dense array of `2^p` 6-bit
/// registers with a fixed footprint of `(3 * 2^p) / 4 + 1` bytes.
///
/// A single estimator must not be used from multiple threads at once;
/// distinct estimators are independent.
#[derive(Clone, PartialEq)]
pub struct Hll {
    pub(crate) repr: Repr,
    alpha: f64,
    pub(crate) p: u32,
    pub(crate) p_prime: u32,
    pub(crate) m: u64,
    m_prime: u64,
    merge_threshold_bits: u64,
    promotion_threshold_bits: u64,
}

/// Exactly one representation is live at any time; the sparse-to-dense
/// transition is one-way.
#[derive(Clone, PartialEq)]
pub(crate) enum Repr {
    Sparse {
        list: SparseList,
        /// Pending hashcodes, unsorted and possibly duplicated, awaiting a
        /// merge into the list.
        scratch: Vec<u64>,
    },
    Dense(Registers),
}

impl Hll {
    /// Create an estimator with dense precision `p` and sparse precision
    /// `p_prime`. The paper recommends `p = 14` and a `p_prime` of 20
    /// or 25.
    ///
    /// # Panics
    ///
    /// Panics when `p` is outside `[4, 18]`, or `p_prime` is outside
    /// `[p, 57]` (larger sparse precisions cannot encode a hashcode in
    /// 64 bits).
    pub fn new(p: u32, p_prime: u32) -> Self {
        assert!((4..=18).contains(&p), "p must be in the range [4,18]");
        assert!(
            (p..=57).contains(&p_prime),
            "p_prime must be in the range [p,57]"
        );

        let m = 1u64 << p;
        let alpha = match m {
            16 => ALPHA_16,
            32 => ALPHA_32,
            64 => ALPHA_64,
            _ => 0.7213 / (1.0 + 1.079 / m as f64),
        };

        // Promote to dense once the sparse list outgrows m*6 bits; merge
        // the scratch into the list when it reaches a quarter of that.
        let promotion_threshold_bits = m * 6;

        Self {
            repr: Repr::Sparse {
                list: SparseList::default(),
                scratch: Vec::new(),
            },
            alpha,
            p,
            p_prime,
            m,
            m_prime: 1u64 << p_prime,
            merge_threshold_bits: promotion_threshold_bits / 4,
            promotion_threshold_bits,
        }
    }

    /// Add a pre-hashed 64-bit value.
    ///
    /// The input should be a hash of whatever is being counted; see
    /// [`Hll::insert`] for a variant that hashes for you.
    #[inline]
    pub fn add(&mut self, x: u64) {
        let needs_flush = match &mut self.repr {
            Repr::Sparse { scratch, .. } => {
                scratch.push(encode_hash(x, self.p, self.p_prime));
                scratch.len() as u64 * 64 > self.merge_threshold_bits
            }
            Repr::Dense(registers) => {
                let idx = x >> (64 - self.p);
                let r = rho(x);
                if r > registers.get(idx) {
                    registers.set(idx, r);
                }
                false
            }
        };
        if needs_flush {
            self.flush_scratch();
        }
    }

    /// Hash `item` and add it.
    #[inline]
    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        let mut hasher = WyHash::default();
        item.hash(&mut hasher);
        self.add(hasher.finish());
    }

    /// Merge `other` into `self`, yielding the estimator of the union of
    /// the two input streams. This is what makes sharded counting work:
    /// each worker feeds its own estimator and the results combine later.
    ///
    /// `other` is first flushed to its canonical form and may be mutated;
    /// callers must not assume it is untouched.
    ///
    /// # Panics
    ///
    /// Panics when the two estimators disagree on `p` or `p_prime`.
    pub fn combine(&mut self, other: &mut Hll) {
        assert!(
            self.p == other.p && self.p_prime == other.p_prime,
            "parameter mismatch: p={}/{}, p_prime={}/{}",
            self.p,
            other.p,
            self.p_prime,
            other.p_prime
        );

        // Canonicalize both sides. A pending scratch on the left would
        // otherwise be dropped if this combine triggers promotion.
        self.flush_scratch();
        other.flush_scratch();

        // A dense side forces the union dense.
        if self.is_sparse() && !other.is_sparse() {
            self.promote();
        }

        let exceeds_threshold = match (&mut self.repr, &other.repr) {
            (
                Repr::Sparse { list, .. },
                Repr::Sparse {
                    list: other_list, ..
                },
            ) => {
                let cap = list.size_in_bytes().max(other_list.size_in_bytes());
                let merged = merge(
                    self.p,
                    self.p_prime,
                    cap as usize,
                    list.iter(),
                    other_list.iter(),
                );
                *list = merged;
                list.size_in_bits() > self.promotion_threshold_bits
            }
            (Repr::Dense(registers), Repr::Dense(other_registers)) => {
                for i in 0..self.m {
                    let r = other_registers.get(i);
                    if r > registers.get(i) {
                        registers.set(i, r);
                    }
                }
                false
            }
            (Repr::Dense(registers), Repr::Sparse { list, .. }) => {
                for k in list.iter() {
                    let (idx, r) = decode_hash(k, self.p, self.p_prime);
                    if r > registers.get(idx) {
                        registers.set(idx, r);
                    }
                }
                false
            }
            (Repr::Sparse { .. }, Repr::Dense(_)) => unreachable!("left side promoted above"),
        };
        if exceeds_threshold {
            self.promote();
        }
    }

    /// Estimated number of distinct values added so far.
    ///
    /// Flushes the scratch first, so interleaving `add` with `cardinality`
    /// cannot stall the sparse list below its promotion threshold.
    pub fn cardinality(&mut self) -> u64 {
        self.flush_scratch();
        match &self.repr {
            Repr::Sparse { list, .. } => {
                linear_counting(self.m_prime, self.m_prime - list.num_elements())
            }
            Repr::Dense(registers) => self.cardinality_dense(registers),
        }
    }

    /// Whether the estimator still uses the sparse representation.
    pub fn is_sparse(&self) -> bool {
        matches!(self.repr, Repr::Sparse { .. })
    }

    /// Dense precision `p`.
    pub fn precision(&self) -> u32 {
        self.p
    }

    /// Sparse precision `p_prime`.
    pub fn sparse_precision(&self) -> u32 {
        self.p_prime
    }

    /// Merge pending scratch hashcodes into the sparse list, promoting to
    /// dense when the list outgrows its budget. No-op when already dense
    /// or when the scratch is empty.
    pub(crate) fn flush_scratch(&mut self) {
        let exceeds_threshold = match &mut self.repr {
            Repr::Sparse { list, scratch } if !scratch.is_empty() => {
                sort_hashcodes(scratch, self.p, self.p_prime);
                let merged = merge(
                    self.p,
                    self.p_prime,
                    list.size_in_bytes() as usize,
                    list.iter(),
                    scratch.iter().copied(),
                );
                *list = merged;
                scratch.clear();
                list.size_in_bits() > self.promotion_threshold_bits
            }
            _ => false,
        };
        if exceeds_threshold {
            self.promote();
        }
    }

    /// One-way conversion from the sparse list to dense registers.
    fn promote(&mut self) {
        let Repr::Sparse { list, .. } = &self.repr else {
            return;
        };
        let registers = sparse_to_dense(list, self.p, self.p_prime);
        self.repr = Repr::Dense(registers);
    }

    /// Two-stage bias-corrected estimate over the dense registers.
    fn cardinality_dense(&self, registers: &Registers) -> u64 {
        let mut inverse_sum = 0.0;
        let mut zero_registers = 0u64;
        for i in 0..self.m {
            let val = registers.get(i);
            inverse_sum += 1.0 / (1u64 << val) as f64;
            if val == 0 {
                zero_registers += 1;
            }
        }

        let e1 = self.alpha * (self.m * self.m) as f64 / inverse_sum;
        let e2 = if e1 <= 5.0 * self.m as f64 {
            e1 - estimate_bias(e1, self.p)
        } else {
            e1
        };

        // With empty registers around, linear counting is more accurate
        // than the bias-corrected raw estimate.
        let h = if zero_registers != 0 {
            linear_counting(self.m, zero_registers)
        } else {
            round_half_up(e2)
        };
        if h <= threshold(self.p) {
            h
        } else {
            round_half_up(e2)
        }
    }
}

impl Debug for Hll {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let repr = match &self.repr {
            Repr::Sparse { .. } => "sparse",
            Repr::Dense(_) => "dense",
        };
        f.debug_struct("Hll")
            .field("p", &self.p)
            .field("p_prime", &self.p_prime)
            .field("representation", &repr)
            .finish()
    }
}

fn linear_counting(m: u64, v: u64) -> u64 {
    round_half_up(m as f64 * (m as f64 / v as f64).ln())
}

fn round_half_up(value: f64) -> u64 {
    if value.fract() >= 0.5 {
        value.ceil() as u64
    } else {
        value.floor() as u64
    }
}
