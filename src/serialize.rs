//! Externalization of estimator state.
//!
//! The wire form is a small JSON container holding `p`, `p_prime` and
//! exactly one of the two buffers: the dense register bytes, or the sparse
//! buffer together with its delta-decoder state. Buffer payloads are
//! snappy-compressed and then URL-safe base64-encoded. The scratch is never
//! serialized; it is flushed before marshaling.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::estimator::{Hll, Repr};
use crate::registers::Registers;
use crate::sparse::SparseList;

/// Errors surfaced while marshaling or unmarshaling estimator state.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("snappy: {0}")]
    Snappy(#[from] snap::Error),

    #[error("p must be in the range [4,18], got {0}")]
    PrecisionOutOfRange(u32),

    #[error("p_prime must be in the range [p,57], got {0}")]
    SparsePrecisionOutOfRange(u32),

    #[error("exactly one of the dense and sparse buffers must be present")]
    AmbiguousRepresentation,

    #[error("sparse list claims {0} elements, more than 2^p_prime")]
    SparseCountOutOfRange(u64),

    #[error("dense buffer holds {got} bytes, expected {expected}")]
    DenseLengthMismatch { got: usize, expected: usize },
}

#[derive(Serialize, Deserialize)]
struct WireHll {
    #[serde(rename = "M", skip_serializing_if = "Option::is_none", default)]
    dense: Option<String>,
    #[serde(rename = "s", skip_serializing_if = "Option::is_none", default)]
    sparse: Option<WireSparse>,
    p: u32,
    pp: u32,
}

#[derive(Serialize, Deserialize)]
struct WireSparse {
    #[serde(rename = "B")]
    buf: String,
    #[serde(rename = "L")]
    last_val: u64,
    #[serde(rename = "N")]
    num_elements: u64,
}

impl Hll {
    /// Serialize the estimator into its wire form.
    ///
    /// The scratch is flushed first (saving the cost of serializing it),
    /// which may promote the representation to dense.
    pub fn marshal(&mut self) -> Result<Vec<u8>, SerializationError> {
        self.flush_scratch();

        let wire = match &self.repr {
            Repr::Sparse { list, .. } => WireHll {
                dense: None,
                sparse: Some(WireSparse {
                    buf: snappy_b64(list.as_bytes())?,
                    last_val: list.last_val(),
                    num_elements: list.num_elements(),
                }),
                p: self.p,
                pp: self.p_prime,
            },
            Repr::Dense(registers) => WireHll {
                dense: Some(snappy_b64(registers.as_bytes())?),
                sparse: None,
                p: self.p,
                pp: self.p_prime,
            },
        };

        Ok(serde_json::to_vec(&wire)?)
    }

    /// Reconstruct an estimator from `marshal` output. The representation
    /// is inferred from which buffer field is present.
    pub fn unmarshal(buf: &[u8]) -> Result<Hll, SerializationError> {
        let wire: WireHll = serde_json::from_slice(buf)?;
        if !(4..=18).contains(&wire.p) {
            return Err(SerializationError::PrecisionOutOfRange(wire.p));
        }
        if !(wire.p..=57).contains(&wire.pp) {
            return Err(SerializationError::SparsePrecisionOutOfRange(wire.pp));
        }

        let mut hll = Hll::new(wire.p, wire.pp);
        hll.repr = match (wire.dense, wire.sparse) {
            (Some(dense), None) => {
                let bytes = unsnappy_b64(&dense)?;
                let expected = ((hll.m * 3) / 4 + 1) as usize;
                if bytes.len() != expected {
                    return Err(SerializationError::DenseLengthMismatch {
                        got: bytes.len(),
                        expected,
                    });
                }
                Repr::Dense(Registers::from_bytes(bytes, hll.m))
            }
            (None, Some(sparse)) => {
                if sparse.num_elements > 1 << wire.pp {
                    return Err(SerializationError::SparseCountOutOfRange(
                        sparse.num_elements,
                    ));
                }
                Repr::Sparse {
                    list: SparseList::from_parts(
                        unsnappy_b64(&sparse.buf)?,
                        sparse.last_val,
                        sparse.num_elements,
                    ),
                    scratch: Vec::new(),
                }
            }
            _ => return Err(SerializationError::AmbiguousRepresentation),
        };

        Ok(hll)
    }
}

/// Compress with snappy, then URL-safe base64.
fn snappy_b64(raw: &[u8]) -> Result<String, SerializationError> {
    let compressed = snap::raw::Encoder::new().compress_vec(raw)?;
    Ok(URL_SAFE.encode(compressed))
}

/// The inverse of `snappy_b64`.
fn unsnappy_b64(encoded: &str) -> Result<Vec<u8>, SerializationError> {
    let compressed = URL_SAFE.decode(encoded)?;
    Ok(snap::raw::Decoder::new().decompress_vec(&compressed)?)
}
