pub mod simd;

/// Row-major N × D embedding matrix aligned with the catalog index. Norms are kept
/// in `f64`, matching the precision similarities are computed in.
pub struct EmbeddingStore {
    dim: usize,
    data: Vec<f32>,
    norms: Vec<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding row {row} has {found} components, expected {expected}")]
    DimMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("embedding row {row} contains a non-finite component")]
    NonFinite { row: usize },
    #[error("embedding row {row} has a norm that cannot be represented")]
    DegenerateNorm { row: usize },
    #[error("embeddings have zero dimensions")]
    ZeroDim,
}

impl EmbeddingStore {
    /// Flattens and validates per-book rows. Every row must share one non-zero
    /// dimension, contain only finite values and have a finite norm that is zero only
    /// for an all-zero row.
    pub fn from_rows(rows: Vec<Vec<f32>>, simd_enabled: bool) -> Result<Self, EmbeddingError> {
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        if !rows.is_empty() && dim == 0 {
            return Err(EmbeddingError::ZeroDim);
        }
        let mut data = Vec::with_capacity(rows.len() * dim);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != dim {
                return Err(EmbeddingError::DimMismatch {
                    row,
                    expected: dim,
                    found: values.len(),
                });
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(EmbeddingError::NonFinite { row });
            }
            data.extend_from_slice(values);
        }
        let norms = if dim == 0 {
            Vec::new()
        } else {
            data.chunks_exact(dim)
                .enumerate()
                .map(|(row, values)| row_norm(row, values, simd_enabled))
                .collect::<Result<Vec<f64>, _>>()?
        };
        Ok(Self { dim, data, norms })
    }

    pub fn len(&self) -> usize {
        self.norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.len() {
            return None;
        }
        let start = index * self.dim;
        Some(&self.data[start..start + self.dim])
    }

    pub fn norm(&self, index: usize) -> Option<f64> {
        self.norms.get(index).copied()
    }
}

fn row_norm(row: usize, values: &[f32], simd_enabled: bool) -> Result<f64, EmbeddingError> {
    let norm = simd::norm(values, simd_enabled);
    let underflowed = norm == 0.0 && values.iter().any(|v| *v != 0.0);
    if !norm.is_finite() || underflowed {
        return Err(EmbeddingError::DegenerateNorm { row });
    }
    Ok(norm)
}
