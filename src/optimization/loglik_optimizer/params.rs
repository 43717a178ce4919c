//! loglik_optimizer::params — structured parameters and the flat-vector codec.
//!
//! Purpose
//! -------
//! Map a model's natural parameter layout (an optional fixed-length vector
//! plus an optional matrix) to and from the single flat vector [`Theta`]
//! that every driver operates on.
//!
//! Key behaviors
//! -------------
//! - [`Parameters::pack`] concatenates the vector component followed by the
//!   matrix component in row-major order.
//! - [`Parameters::unpack`] is the exact inverse for a given [`ParamShape`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `ParamShape::len() == vector_len + rows * cols` is the flat length and
//!   stays fixed for one optimization run.
//! - Components with zero elements are stored as `None`, so that
//!   `unpack(pack(p), ParamShape::of(&p)) == p` holds bit-for-bit.
//! - Unpacking a flat vector whose length disagrees with the shape is a
//!   caller bug and panics.
//!
//! Testing notes
//! -------------
//! - Unit tests cover round trips for every combination of present/absent
//!   components, row-major ordering, and the length-mismatch panic.
use crate::optimization::loglik_optimizer::types::Theta;
use ndarray::{Array1, Array2};

/// Shape descriptor of a model's structured parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamShape {
    pub vector_len: usize,
    pub rows: usize,
    pub cols: usize,
}

impl ParamShape {
    pub fn new(vector_len: usize, rows: usize, cols: usize) -> Self {
        Self { vector_len, rows, cols }
    }

    /// Shape with only a fixed-length component.
    pub fn vector(vector_len: usize) -> Self {
        Self { vector_len, rows: 0, cols: 0 }
    }

    /// Shape with only a matrix component.
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self { vector_len: 0, rows, cols }
    }

    /// Shape of an existing parameter set.
    pub fn of(params: &Parameters) -> Self {
        let vector_len = params.vector.as_ref().map_or(0, |v| v.len());
        let (rows, cols) = params.matrix.as_ref().map_or((0, 0), |m| m.dim());
        Self { vector_len, rows, cols }
    }

    /// Length of the flat vector.
    pub fn len(&self) -> usize {
        self.vector_len + self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A model's structured parameters.
///
/// Either component may be absent. Use [`Parameters::new`] (or the
/// `from_*` helpers) to get the empty-as-`None` normalization the codec
/// relies on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameters {
    pub vector: Option<Array1<f64>>,
    pub matrix: Option<Array2<f64>>,
}

impl Parameters {
    pub fn new(vector: Option<Array1<f64>>, matrix: Option<Array2<f64>>) -> Self {
        Self {
            vector: vector.filter(|v| !v.is_empty()),
            matrix: matrix.filter(|m| !m.is_empty()),
        }
    }

    pub fn from_vector(vector: Array1<f64>) -> Self {
        Self::new(Some(vector), None)
    }

    pub fn from_matrix(matrix: Array2<f64>) -> Self {
        Self::new(None, Some(matrix))
    }

    /// Flatten into a [`Theta`]: vector first, then the matrix row by row.
    pub fn pack(&self) -> Theta {
        let mut flat = Vec::with_capacity(ParamShape::of(self).len());
        if let Some(v) = &self.vector {
            flat.extend(v.iter().copied());
        }
        if let Some(m) = &self.matrix {
            // `iter` walks logical row-major order whatever the memory layout.
            flat.extend(m.iter().copied());
        }
        Array1::from(flat)
    }

    /// Rebuild structured parameters from a flat vector.
    ///
    /// Panics
    /// ------
    /// - If `theta.len() != shape.len()`.
    pub fn unpack(theta: &Theta, shape: &ParamShape) -> Self {
        assert_eq!(
            theta.len(),
            shape.len(),
            "flat parameter length does not match shape {shape:?}"
        );
        let n = shape.vector_len;
        let vector = (n > 0).then(|| theta.slice(ndarray::s![..n]).to_owned());
        let matrix = (shape.rows * shape.cols > 0).then(|| {
            Array2::from_shape_fn((shape.rows, shape.cols), |(i, j)| theta[n + i * shape.cols + j])
        });
        Self { vector, matrix }
    }
}
