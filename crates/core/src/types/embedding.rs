//! Unit-length face embeddings.
//!
//! Raw embeddings arrive from the phone as arbitrary-scale float vectors.
//! [`UnitVector::normalize`] validates the dimension and scales them to unit
//! L2 norm; only `UnitVector`s are ever matched or persisted, so cosine
//! distance reduces to `1 - dot(a, b)`.
//!
//! Stored embeddings are encoded as `4 * D` bytes of little-endian `f32`.

use thiserror::Error;

/// Number of bytes per stored component.
pub const BYTES_PER_COMPONENT: usize = core::mem::size_of::<f32>();

/// Errors raised while building or decoding an embedding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbeddingError {
    /// The embedding has the wrong number of components.
    #[error("wrong embedding size: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured dimension.
        expected: usize,
        /// Length of the supplied vector.
        actual: usize,
    },

    /// The embedding has zero (or non-finite) Euclidean norm.
    #[error("embedding has zero norm")]
    ZeroNorm,

    /// The enrollment samples average out to a zero vector.
    #[error("mean of enrollment samples has zero norm")]
    EmptyMean,

    /// Enrollment was attempted without any sample.
    #[error("at least one embedding sample is required")]
    NoSamples,

    /// A stored embedding blob does not match the configured dimension.
    #[error("stored embedding has {actual_bytes} bytes, expected {expected_bytes}")]
    StoredVectorCorrupt {
        /// `4 * D`.
        expected_bytes: usize,
        /// Length of the stored blob.
        actual_bytes: usize,
    },
}

impl EmbeddingError {
    /// Whether the error was caused by client input rather than stored data.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::StoredVectorCorrupt { .. })
    }
}

/// A vector of fixed dimension with unit L2 norm.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitVector(Vec<f32>);

impl UnitVector {
    /// Validate and L2-normalize a raw embedding.
    ///
    /// The norm is accumulated in `f64` and applied once, so vectors
    /// normalized at enrollment and at scan time share the same precision.
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::DimensionMismatch` if `raw.len() != dim`.
    /// Returns `EmbeddingError::ZeroNorm` if the norm is zero or not finite.
    pub fn normalize(raw: &[f32], dim: usize) -> Result<Self, EmbeddingError> {
        if raw.len() != dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dim,
                actual: raw.len(),
            });
        }

        let norm = l2_norm(raw);
        if norm == 0.0 || !norm.is_finite() {
            return Err(EmbeddingError::ZeroNorm);
        }

        Ok(Self(scale(raw.iter().map(|&x| f64::from(x)), norm)))
    }

    /// Build the representative embedding of a customer from one or more
    /// samples.
    ///
    /// Each sample is normalized independently; the element-wise mean of the
    /// unit vectors is then re-normalized. Any failing sample aborts the
    /// whole operation.
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::NoSamples` if `samples` is empty, any error of
    /// [`UnitVector::normalize`] for an invalid sample, and
    /// `EmbeddingError::EmptyMean` if the samples cancel out.
    pub fn mean_of<S>(samples: &[S], dim: usize) -> Result<Self, EmbeddingError>
    where
        S: AsRef<[f32]>,
    {
        if samples.is_empty() {
            return Err(EmbeddingError::NoSamples);
        }

        let units = samples
            .iter()
            .map(|s| Self::normalize(s.as_ref(), dim))
            .collect::<Result<Vec<_>, _>>()?;

        let mut sum = vec![0.0_f64; dim];
        for unit in &units {
            for (acc, &x) in sum.iter_mut().zip(unit.as_slice()) {
                *acc += f64::from(x);
            }
        }

        #[allow(clippy::cast_precision_loss)] // sample counts are tiny
        let count = units.len() as f64;
        let mean: Vec<f64> = sum.into_iter().map(|x| x / count).collect();

        let norm = mean.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return Err(EmbeddingError::EmptyMean);
        }

        Ok(Self(scale(mean.into_iter(), norm)))
    }

    /// Decode a stored embedding.
    ///
    /// The components are taken as stored; no re-normalization happens, so
    /// a value written with [`UnitVector::to_le_bytes`] round-trips exactly.
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::StoredVectorCorrupt` if the blob is not
    /// exactly `4 * dim` bytes long.
    pub fn from_le_bytes(bytes: &[u8], dim: usize) -> Result<Self, EmbeddingError> {
        let expected_bytes = dim * BYTES_PER_COMPONENT;
        if bytes.len() != expected_bytes {
            return Err(EmbeddingError::StoredVectorCorrupt {
                expected_bytes,
                actual_bytes: bytes.len(),
            });
        }

        let components = bytes
            .chunks_exact(BYTES_PER_COMPONENT)
            .map(|chunk| {
                let mut raw = [0_u8; BYTES_PER_COMPONENT];
                raw.copy_from_slice(chunk);
                f32::from_le_bytes(raw)
            })
            .collect();

        Ok(Self(components))
    }

    /// Encode as little-endian `f32` bytes for storage.
    #[must_use]
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|x| x.to_le_bytes()).collect()
    }

    /// Number of components.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// The components as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Dot product, accumulated in `f64`.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(&a, &b)| f64::from(a) * f64::from(b))
            .sum()
    }
}

impl AsRef<[f32]> for UnitVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

fn l2_norm(v: &[f32]) -> f64 {
    v.iter()
        .map(|&x| {
            let x = f64::from(x);
            x * x
        })
        .sum::<f64>()
        .sqrt()
}

#[allow(clippy::cast_possible_truncation)] // unit components fit in f32
fn scale(components: impl Iterator<Item = f64>, norm: f64) -> Vec<f32> {
    components.map(|x| (x / norm) as f32).collect()
}
