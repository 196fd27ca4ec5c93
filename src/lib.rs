//! `hllpp` estimates the number of distinct elements in a stream using the
//! HyperLogLog++ algorithm from "HyperLogLog in Practice: Algorithmic
//! Engineering of a State of The Art Cardinality Estimation Algorithm" by
//! Heule, Nunkesser and Hall of Google, with memory sub-linear in the
//! cardinality.
//!
//! The estimator consumes pre-hashed 64-bit values through [`Hll::add`];
//! [`Hll::insert`] hashes arbitrary items for you. The estimation error is
//! controlled by the dense precision `p`: roughly `1.04 / sqrt(2^p)` once
//! the estimator is dense, using `(3 * 2^p) / 4 + 1` bytes of register
//! storage.
//!
//! # Data-structure design
//!
//! An estimator starts in a **sparse** representation: hashes are encoded
//! into compact hashcodes at a higher precision `p_prime`, buffered in a
//! scratch set and periodically merged into a delta + varint compressed
//! list sorted by register index. Small cardinalities are counted almost
//! exactly this way. Once the list outgrows `6 * 2^p` bits, the estimator
//! converts to the **dense** representation, an array of `2^p` 6-bit
//! registers packed four-to-three-bytes, and never converts back.
//!
//! Dense estimates are bias-corrected with the empirical tables from the
//! paper's appendix, falling back to linear counting while empty registers
//! remain and the estimate sits below a per-precision threshold. Decoding
//! of sparse hashcodes uses the corrected `getIndex` bit ranges published
//! after the paper's Figure 7, not the original printed ones.
//!
//! Estimators for shards of a data set can be unioned with
//! [`Hll::combine`], and [`Hll::marshal`] / [`Hll::unmarshal`] round-trip
//! an estimator through a compressed wire form.
//!
//! # Examples
//!
//! ```
//! use hllpp::Hll;
//!
//! let mut hll = Hll::new(14, 25);
//! for i in 0..1000u64 {
//!     hll.insert(&i);
//! }
//! let estimate = hll.cardinality();
//! assert!((900..=1100).contains(&estimate));
//! ```
//!
//! [Original HyperLogLog++ paper](https://static.googleusercontent.com/media/research.google.com/en//pubs/archive/40671.pdf)

mod bias;
mod bits;
mod encoding;
mod merge;
mod registers;
mod serialize;
mod sparse;
mod tables;

pub mod estimator;

pub use estimator::Hll;
pub use serialize::SerializationError;
