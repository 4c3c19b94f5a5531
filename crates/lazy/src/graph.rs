//! Graph composition: each operation extends an op list and updates the
//! tracked output shape, so composition errors surface before any data is
//! read.

use ndarray::ArrayD;

use magnon_store::{Dataset, Selection};

use crate::error::LazyError;

/// Element kind tracked through the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Kind {
    Real,
    Complex,
}

/// One node of the operation list.
#[derive(Clone, Debug)]
pub(crate) enum Op {
    Mul(ArrayD<f32>),
    Sub(ArrayD<f32>),
    Div(ArrayD<f32>),
    SubFrame { axis: usize, index: usize },
    SubMean { axes: Vec<usize> },
    Sum { axes: Vec<usize> },
    Average { axes: Vec<usize> },
    MoveAxis { from: usize, to: usize },
    SwapAxes { a: usize, b: usize },
    Reshape { shape: Vec<usize> },
    SliceAxis { axis: usize, start: usize, end: usize },
    Rfft { axis: usize },
    Fft2 { axes: [usize; 2] },
    FftShift { axes: Vec<usize> },
    Abs,
}

/// A chunked, lazily-evaluated computation graph over one store-backed
/// dataset.
///
/// See the crate docs for the execution model. All composition methods
/// consume `self` and return an extended graph, so a graph is a value that
/// is built once and executed once.
#[derive(Debug)]
pub struct LazyArray<'s> {
    pub(crate) source: Dataset<'s>,
    pub(crate) chunking: Vec<Option<usize>>,
    pub(crate) selection: Selection,
    pub(crate) ops: Vec<Op>,
    pub(crate) shape: Vec<usize>,
    pub(crate) kind: Kind,
}

impl<'s> LazyArray<'s> {
    /// Wraps a dataset with a per-axis chunking policy: `Some(block)` for a
    /// fixed block size, `None` for the whole axis. A fixed chunk on the z
    /// axis is the standard policy for raw field datasets.
    pub fn wrap(source: Dataset<'s>, chunking: Vec<Option<usize>>) -> Result<Self, LazyError> {
        if chunking.len() != source.shape().len() {
            return Err(LazyError::ShapeMismatch {
                op: "wrap",
                lhs: source.shape().to_vec(),
                rhs: vec![chunking.len()],
            });
        }
        let shape = source.shape().to_vec();
        Ok(LazyArray {
            source,
            chunking,
            selection: Selection::all(),
            ops: Vec::new(),
            shape,
            kind: Kind::Real,
        })
    }

    /// Current output shape of the graph.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Whether the graph's output is complex at this point.
    pub fn is_complex(&self) -> bool {
        self.kind == Kind::Complex
    }

    /// Restricts the source region. Must be the first operation; indexed
    /// axes are dropped, so the chunking policy is re-aligned to the
    /// surviving axes internally.
    pub fn select(mut self, selection: Selection) -> Result<Self, LazyError> {
        if !self.ops.is_empty() {
            return Err(LazyError::LateSelect);
        }
        let resolved = selection.resolve(self.source.shape(), self.source.name())?;
        self.shape = resolved.out_shape();
        self.selection = selection;
        Ok(self)
    }

    /// Element-wise multiply by a broadcastable operand.
    pub fn mul(self, operand: ArrayD<f32>) -> Result<Self, LazyError> {
        self.broadcast_op("mul", operand, Op::Mul)
    }

    /// Element-wise subtract of a broadcastable operand.
    pub fn sub(self, operand: ArrayD<f32>) -> Result<Self, LazyError> {
        self.broadcast_op("sub", operand, Op::Sub)
    }

    /// Element-wise divide by a broadcastable operand.
    pub fn div(self, operand: ArrayD<f32>) -> Result<Self, LazyError> {
        self.broadcast_op("div", operand, Op::Div)
    }

    fn broadcast_op(
        mut self,
        op: &'static str,
        operand: ArrayD<f32>,
        make: impl FnOnce(ArrayD<f32>) -> Op,
    ) -> Result<Self, LazyError> {
        if !broadcast_compatible(&self.shape, operand.shape()) {
            return Err(LazyError::ShapeMismatch {
                op,
                lhs: self.shape.clone(),
                rhs: operand.shape().to_vec(),
            });
        }
        self.ops.push(make(operand));
        Ok(self)
    }

    /// Subtracts the hyperplane at `index` along `axis` from every other
    /// position along that axis (e.g. removing a static offset frame).
    pub fn sub_frame(mut self, axis: usize, index: usize) -> Result<Self, LazyError> {
        self.check_axis("sub_frame", axis)?;
        if index >= self.shape[axis] {
            return Err(LazyError::IndexOutOfBounds {
                op: "sub_frame",
                index,
                len: self.shape[axis],
            });
        }
        self.ops.push(Op::SubFrame { axis, index });
        Ok(self)
    }

    /// Subtracts the mean over `axes`, broadcast back over them.
    pub fn sub_mean(mut self, axes: &[usize]) -> Result<Self, LazyError> {
        let axes = self.check_axes("sub_mean", axes)?;
        self.ops.push(Op::SubMean { axes });
        Ok(self)
    }

    /// Sums over `axes`, removing them from the shape.
    pub fn sum(mut self, axes: &[usize]) -> Result<Self, LazyError> {
        let axes = self.check_axes("sum", axes)?;
        self.shape = remove_axes(&self.shape, &axes);
        self.ops.push(Op::Sum { axes });
        Ok(self)
    }

    /// Averages over `axes`, removing them from the shape.
    pub fn average(mut self, axes: &[usize]) -> Result<Self, LazyError> {
        let axes = self.check_axes("average", axes)?;
        self.shape = remove_axes(&self.shape, &axes);
        self.ops.push(Op::Average { axes });
        Ok(self)
    }

    /// Moves axis `from` to position `to`, shifting the others.
    pub fn move_axis(mut self, from: usize, to: usize) -> Result<Self, LazyError> {
        self.check_axis("move_axis", from)?;
        self.check_axis("move_axis", to)?;
        let dim = self.shape.remove(from);
        self.shape.insert(to, dim);
        self.ops.push(Op::MoveAxis { from, to });
        Ok(self)
    }

    /// Swaps two axes.
    pub fn swap_axes(mut self, a: usize, b: usize) -> Result<Self, LazyError> {
        self.check_axis("swap_axes", a)?;
        self.check_axis("swap_axes", b)?;
        self.shape.swap(a, b);
        self.ops.push(Op::SwapAxes { a, b });
        Ok(self)
    }

    /// Reshapes to `shape`; the element count must match.
    pub fn reshape(mut self, shape: &[usize]) -> Result<Self, LazyError> {
        let have: usize = self.shape.iter().product();
        let want: usize = shape.iter().product();
        if have != want {
            return Err(LazyError::ShapeMismatch {
                op: "reshape",
                lhs: self.shape.clone(),
                rhs: shape.to_vec(),
            });
        }
        self.shape = shape.to_vec();
        self.ops.push(Op::Reshape {
            shape: shape.to_vec(),
        });
        Ok(self)
    }

    /// Keeps `start..end` along `axis`.
    pub fn slice_axis(mut self, axis: usize, start: usize, end: usize) -> Result<Self, LazyError> {
        self.check_axis("slice_axis", axis)?;
        if end > self.shape[axis] || start > end {
            return Err(LazyError::ShapeMismatch {
                op: "slice_axis",
                lhs: self.shape.clone(),
                rhs: vec![start, end],
            });
        }
        if start == end {
            return Err(LazyError::EmptySelection {
                op: "slice_axis",
                axis,
            });
        }
        self.shape[axis] = end - start;
        self.ops.push(Op::SliceAxis { axis, start, end });
        Ok(self)
    }

    /// Forward real FFT along `axis`: keeps the `n/2 + 1` non-negative
    /// frequency bins, output is complex, no normalization.
    pub fn rfft(mut self, axis: usize) -> Result<Self, LazyError> {
        self.check_axis("rfft", axis)?;
        if self.kind != Kind::Real {
            return Err(LazyError::WrongKind {
                op: "rfft",
                expected: "real",
            });
        }
        self.shape[axis] = self.shape[axis] / 2 + 1;
        self.kind = Kind::Complex;
        self.ops.push(Op::Rfft { axis });
        Ok(self)
    }

    /// Forward complex FFT over two axes (applied one axis after the
    /// other, the standard separable 2-D transform). Real input is
    /// promoted to complex.
    pub fn fft2(mut self, axes: [usize; 2]) -> Result<Self, LazyError> {
        self.check_axis("fft2", axes[0])?;
        self.check_axis("fft2", axes[1])?;
        if axes[0] == axes[1] {
            return Err(LazyError::UnsupportedAxis {
                op: "fft2",
                axis: axes[1],
                rank: self.shape.len(),
            });
        }
        self.kind = Kind::Complex;
        self.ops.push(Op::Fft2 { axes });
        Ok(self)
    }

    /// Rolls each of `axes` by half its length to center zero frequency.
    pub fn fftshift(mut self, axes: &[usize]) -> Result<Self, LazyError> {
        let axes = self.check_axes("fftshift", axes)?;
        self.ops.push(Op::FftShift { axes });
        Ok(self)
    }

    /// Element-wise magnitude; complex input becomes real.
    pub fn abs(mut self) -> Result<Self, LazyError> {
        self.kind = Kind::Real;
        self.ops.push(Op::Abs);
        Ok(self)
    }

    fn check_axis(&self, op: &'static str, axis: usize) -> Result<(), LazyError> {
        if axis >= self.shape.len() {
            return Err(LazyError::UnsupportedAxis {
                op,
                axis,
                rank: self.shape.len(),
            });
        }
        Ok(())
    }

    /// Validates, sorts and dedups a set of axes.
    fn check_axes(&self, op: &'static str, axes: &[usize]) -> Result<Vec<usize>, LazyError> {
        let mut out = Vec::with_capacity(axes.len());
        for &axis in axes {
            self.check_axis(op, axis)?;
            if !out.contains(&axis) {
                out.push(axis);
            }
        }
        out.sort_unstable();
        Ok(out)
    }
}

/// NumPy-style broadcast check: align shapes from the trailing axis; every
/// operand extent must equal the array extent or be 1, and the operand may
/// not have more axes than the array.
fn broadcast_compatible(shape: &[usize], operand: &[usize]) -> bool {
    if operand.len() > shape.len() {
        return false;
    }
    let offset = shape.len() - operand.len();
    operand
        .iter()
        .zip(&shape[offset..])
        .all(|(&o, &s)| o == 1 || o == s)
}

fn remove_axes(shape: &[usize], sorted_axes: &[usize]) -> Vec<usize> {
    shape
        .iter()
        .enumerate()
        .filter(|(i, _)| !sorted_axes.contains(i))
        .map(|(_, &d)| d)
        .collect()
}
