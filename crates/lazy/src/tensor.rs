//! Dense result of an executed graph.

use ndarray::ArrayD;
use num_complex::Complex32;

use crate::error::LazyError;

/// Dense array realized by [`LazyArray::compute`](crate::LazyArray::compute).
#[derive(Clone, Debug, PartialEq)]
pub enum Tensor {
    /// 32-bit real elements.
    Real(ArrayD<f32>),
    /// 32-bit complex elements.
    Complex(ArrayD<Complex32>),
}

impl Tensor {
    /// Shape of the realized array.
    pub fn shape(&self) -> &[usize] {
        match self {
            Tensor::Real(a) => a.shape(),
            Tensor::Complex(a) => a.shape(),
        }
    }

    /// Unwraps a real tensor.
    pub fn into_real(self) -> Result<ArrayD<f32>, LazyError> {
        match self {
            Tensor::Real(a) => Ok(a),
            Tensor::Complex(_) => Err(LazyError::WrongKind {
                op: "into_real",
                expected: "real",
            }),
        }
    }

    /// Unwraps a complex tensor.
    pub fn into_complex(self) -> Result<ArrayD<Complex32>, LazyError> {
        match self {
            Tensor::Complex(a) => Ok(a),
            Tensor::Real(_) => Err(LazyError::WrongKind {
                op: "into_complex",
                expected: "complex",
            }),
        }
    }
}
