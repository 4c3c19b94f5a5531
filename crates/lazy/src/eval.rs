//! Graph execution: streams source chunks along the chunked axis through
//! element-wise operations, folds them at the first reduction that
//! collapses that axis, and applies the remaining operations densely.

use ndarray::{ArrayD, Axis, IxDyn, LinalgScalar, Slice, Zip};
use num_complex::Complex32;
use rustfft::FftPlanner;

use magnon_store::{AxisSel, ResolvedSelection, Selection};

use crate::error::LazyError;
use crate::graph::{LazyArray, Op};
use crate::tensor::Tensor;

/// Where and how the executor may stream the source.
struct StreamPlan {
    /// Chunked axis in source coordinates.
    src_axis: usize,
    /// The same axis after indexed axes are dropped.
    out_axis: usize,
    /// Block size along the chunked axis.
    block: u64,
    /// Index of the reduction op that collapses the chunked axis.
    collapse: usize,
}

impl LazyArray<'_> {
    /// Executes the graph exactly once and realizes a dense array.
    ///
    /// Consumes the graph; wrap the dataset again to recompute.
    pub fn compute(self) -> Result<Tensor, LazyError> {
        let resolved = self
            .selection
            .resolve(self.source.shape(), self.source.name())?;

        match self.stream_plan(&resolved) {
            Some(plan) => self.execute_streamed(&resolved, &plan),
            None => self.execute_dense(),
        }
    }

    /// Picks the streaming strategy: the first chunked, surviving source
    /// axis qualifies if every op before the first reduction over it is
    /// element-wise and does not vary along it.
    fn stream_plan(&self, resolved: &ResolvedSelection) -> Option<StreamPlan> {
        let (src_axis, block) = self
            .chunking
            .iter()
            .enumerate()
            .find_map(|(i, c)| match c {
                Some(b) if resolved.keep[i] => Some((i, *b as u64)),
                _ => None,
            })?;
        let out_axis = resolved.keep[..src_axis].iter().filter(|&&k| k).count();
        let rank = resolved.out_shape().len();

        for (idx, op) in self.ops.iter().enumerate() {
            match op {
                Op::Mul(o) | Op::Sub(o) | Op::Div(o) => {
                    if !operand_constant_along(o.shape(), rank, out_axis) {
                        return None;
                    }
                }
                Op::SubFrame { axis, .. } if *axis != out_axis => {}
                Op::Abs => {}
                Op::Sum { axes } | Op::Average { axes } if axes.contains(&out_axis) => {
                    return Some(StreamPlan {
                        src_axis,
                        out_axis,
                        block,
                        collapse: idx,
                    });
                }
                _ => return None,
            }
        }
        None
    }

    fn execute_dense(&self) -> Result<Tensor, LazyError> {
        tracing::trace!(dataset = self.source.name(), "dense graph execution");
        let full = self.source.read_f32(&self.selection)?;
        let mut tensor = Tensor::Real(full);
        for op in &self.ops {
            tensor = apply_op(tensor, op)?;
        }
        Ok(tensor)
    }

    fn execute_streamed(
        &self,
        resolved: &ResolvedSelection,
        plan: &StreamPlan,
    ) -> Result<Tensor, LazyError> {
        let (axes, is_average) = match &self.ops[plan.collapse] {
            Op::Sum { axes } => (axes.clone(), false),
            Op::Average { axes } => (axes.clone(), true),
            _ => return self.execute_dense(),
        };
        tracing::trace!(
            dataset = self.source.name(),
            axis = plan.src_axis,
            block = plan.block,
            "streamed graph execution"
        );

        let sel_shape = resolved.out_shape();
        let range = resolved.ranges[plan.src_axis].clone();

        let mut acc: Option<ArrayD<f32>> = None;
        let mut start = range.start;
        while start < range.end {
            let end = (start + plan.block).min(range.end);
            let chunk_sel = sub_selection(resolved, plan.src_axis, start, end);
            let mut chunk = self.source.read_f32(&chunk_sel)?;
            for op in &self.ops[..plan.collapse] {
                chunk = apply_real_elementwise(chunk, op)?;
            }
            let part = sum_axes(chunk, &axes);
            acc = Some(match acc {
                Some(a) => a + part,
                None => part,
            });
            start = end;
        }

        let mut summed = acc.ok_or(LazyError::EmptySelection {
            op: "compute",
            axis: plan.out_axis,
        })?;
        if is_average {
            let count: usize = axes.iter().map(|&a| sel_shape[a]).product();
            summed.mapv_inplace(|v| v / count as f32);
        }

        let mut tensor = Tensor::Real(summed);
        for op in &self.ops[plan.collapse + 1..] {
            tensor = apply_op(tensor, op)?;
        }
        Ok(tensor)
    }
}

/// Whether a broadcast operand has extent 1 (or no axis at all) along
/// `axis` of an array of rank `rank`, i.e. chunking that axis does not
/// change which operand values apply.
fn operand_constant_along(operand: &[usize], rank: usize, axis: usize) -> bool {
    let offset = rank - operand.len();
    axis < offset || operand[axis - offset] == 1
}

/// Builds a concrete per-chunk selection: every axis pinned to its
/// resolved range, with the streamed axis narrowed to `start..end`.
fn sub_selection(resolved: &ResolvedSelection, src_axis: usize, start: u64, end: u64) -> Selection {
    let axes = resolved
        .ranges
        .iter()
        .zip(&resolved.keep)
        .enumerate()
        .map(|(i, (r, &keep))| {
            if !keep {
                AxisSel::Index(r.start as usize)
            } else if i == src_axis {
                AxisSel::range(start as usize, end as usize)
            } else {
                AxisSel::range(r.start as usize, r.end as usize)
            }
        })
        .collect();
    Selection::new(axes)
}

fn apply_real_elementwise(a: ArrayD<f32>, op: &Op) -> Result<ArrayD<f32>, LazyError> {
    match op {
        Op::Mul(o) => bin_real(a, o, "mul", |x, y| x * y),
        Op::Sub(o) => bin_real(a, o, "sub", |x, y| x - y),
        Op::Div(o) => bin_real(a, o, "div", |x, y| x / y),
        Op::SubFrame { axis, index } => Ok(sub_frame(a, *axis, *index)),
        Op::Abs => Ok(a.mapv(f32::abs)),
        _ => Err(LazyError::WrongKind {
            op: "stream",
            expected: "real",
        }),
    }
}

pub(crate) fn apply_op(t: Tensor, op: &Op) -> Result<Tensor, LazyError> {
    Ok(match (t, op) {
        (Tensor::Real(a), Op::Mul(o)) => Tensor::Real(bin_real(a, o, "mul", |x, y| x * y)?),
        (Tensor::Real(a), Op::Sub(o)) => Tensor::Real(bin_real(a, o, "sub", |x, y| x - y)?),
        (Tensor::Real(a), Op::Div(o)) => Tensor::Real(bin_real(a, o, "div", |x, y| x / y)?),
        (Tensor::Complex(a), Op::Mul(o)) => {
            Tensor::Complex(bin_complex(a, o, "mul", |x, y| x * y)?)
        }
        (Tensor::Complex(a), Op::Sub(o)) => {
            Tensor::Complex(bin_complex(a, o, "sub", |x, y| x - y)?)
        }
        (Tensor::Complex(a), Op::Div(o)) => {
            Tensor::Complex(bin_complex(a, o, "div", |x, y| x / y)?)
        }

        (Tensor::Real(a), Op::SubFrame { axis, index }) => {
            Tensor::Real(sub_frame(a, *axis, *index))
        }
        (Tensor::Complex(a), Op::SubFrame { axis, index }) => {
            Tensor::Complex(sub_frame(a, *axis, *index))
        }

        (Tensor::Real(a), Op::SubMean { axes }) => {
            let count: usize = axes.iter().map(|&ax| a.shape()[ax]).product();
            let mean = mean_keepdims(&a, axes, count as f32);
            Tensor::Real(&a - &mean)
        }
        (Tensor::Complex(a), Op::SubMean { axes }) => {
            let count: usize = axes.iter().map(|&ax| a.shape()[ax]).product();
            let mean = mean_keepdims(&a, axes, Complex32::new(count as f32, 0.0));
            Tensor::Complex(&a - &mean)
        }

        (Tensor::Real(a), Op::Sum { axes }) => Tensor::Real(sum_axes(a, axes)),
        (Tensor::Complex(a), Op::Sum { axes }) => Tensor::Complex(sum_axes(a, axes)),
        (Tensor::Real(a), Op::Average { axes }) => {
            let count: usize = axes.iter().map(|&ax| a.shape()[ax]).product();
            Tensor::Real(sum_axes(a, axes).mapv(|v| v / count as f32))
        }
        (Tensor::Complex(a), Op::Average { axes }) => {
            let count: usize = axes.iter().map(|&ax| a.shape()[ax]).product();
            let scale = Complex32::new(count as f32, 0.0);
            Tensor::Complex(sum_axes(a, axes).mapv(|v| v / scale))
        }

        (Tensor::Real(a), Op::MoveAxis { from, to }) => Tensor::Real(move_axis_nd(a, *from, *to)),
        (Tensor::Complex(a), Op::MoveAxis { from, to }) => {
            Tensor::Complex(move_axis_nd(a, *from, *to))
        }
        (Tensor::Real(mut a), Op::SwapAxes { a: i, b: j }) => {
            a.swap_axes(*i, *j);
            Tensor::Real(a)
        }
        (Tensor::Complex(mut a), Op::SwapAxes { a: i, b: j }) => {
            a.swap_axes(*i, *j);
            Tensor::Complex(a)
        }

        (Tensor::Real(a), Op::Reshape { shape }) => Tensor::Real(reshape_nd(a, shape)?),
        (Tensor::Complex(a), Op::Reshape { shape }) => Tensor::Complex(reshape_nd(a, shape)?),
        (Tensor::Real(a), Op::SliceAxis { axis, start, end }) => {
            Tensor::Real(slice_axis_nd(a, *axis, *start, *end))
        }
        (Tensor::Complex(a), Op::SliceAxis { axis, start, end }) => {
            Tensor::Complex(slice_axis_nd(a, *axis, *start, *end))
        }

        (Tensor::Real(a), Op::Rfft { axis }) => Tensor::Complex(rfft_along(&a, *axis)),
        (Tensor::Complex(_), Op::Rfft { .. }) => {
            return Err(LazyError::WrongKind {
                op: "rfft",
                expected: "real",
            });
        }
        (Tensor::Real(a), Op::Fft2 { axes }) => {
            let mut c = a.mapv(|v| Complex32::new(v, 0.0));
            fft_along(&mut c, axes[0]);
            fft_along(&mut c, axes[1]);
            Tensor::Complex(c)
        }
        (Tensor::Complex(mut a), Op::Fft2 { axes }) => {
            fft_along(&mut a, axes[0]);
            fft_along(&mut a, axes[1]);
            Tensor::Complex(a)
        }
        (Tensor::Real(a), Op::FftShift { axes }) => Tensor::Real(fftshift_axes(a, axes)),
        (Tensor::Complex(a), Op::FftShift { axes }) => Tensor::Complex(fftshift_axes(a, axes)),

        (Tensor::Real(a), Op::Abs) => Tensor::Real(a.mapv(f32::abs)),
        (Tensor::Complex(a), Op::Abs) => Tensor::Real(a.mapv(|c| c.norm())),
    })
}

fn bin_real(
    a: ArrayD<f32>,
    operand: &ArrayD<f32>,
    op: &'static str,
    f: fn(f32, f32) -> f32,
) -> Result<ArrayD<f32>, LazyError> {
    let broadcast = operand
        .broadcast(a.raw_dim())
        .ok_or_else(|| LazyError::ShapeMismatch {
            op,
            lhs: a.shape().to_vec(),
            rhs: operand.shape().to_vec(),
        })?;
    Ok(Zip::from(&a).and(&broadcast).map_collect(|&x, &y| f(x, y)))
}

fn bin_complex(
    a: ArrayD<Complex32>,
    operand: &ArrayD<f32>,
    op: &'static str,
    f: fn(Complex32, f32) -> Complex32,
) -> Result<ArrayD<Complex32>, LazyError> {
    let broadcast = operand
        .broadcast(a.raw_dim())
        .ok_or_else(|| LazyError::ShapeMismatch {
            op,
            lhs: a.shape().to_vec(),
            rhs: operand.shape().to_vec(),
        })?;
    Ok(Zip::from(&a).and(&broadcast).map_collect(|&x, &y| f(x, y)))
}

fn sub_frame<T: LinalgScalar>(a: ArrayD<T>, axis: usize, index: usize) -> ArrayD<T> {
    let frame = a
        .index_axis(Axis(axis), index)
        .to_owned()
        .insert_axis(Axis(axis));
    &a - &frame
}

/// Sums over `axes` (sorted ascending), removing them.
fn sum_axes<T: LinalgScalar>(mut a: ArrayD<T>, axes: &[usize]) -> ArrayD<T> {
    for &ax in axes.iter().rev() {
        a = a.sum_axis(Axis(ax));
    }
    a
}

/// Mean over `axes` with the reduced axes re-inserted as length 1, so the
/// result broadcasts against the input.
fn mean_keepdims<T: LinalgScalar>(a: &ArrayD<T>, axes: &[usize], count: T) -> ArrayD<T> {
    let mut m = sum_axes(a.clone(), axes);
    for &ax in axes {
        m = m.insert_axis(Axis(ax));
    }
    m.mapv(|v| v / count)
}

fn move_axis_nd<T>(a: ArrayD<T>, from: usize, to: usize) -> ArrayD<T> {
    let rank = a.ndim();
    let mut order: Vec<usize> = (0..rank).filter(|&i| i != from).collect();
    order.insert(to, from);
    a.permuted_axes(order)
}

fn reshape_nd<T: Clone>(a: ArrayD<T>, shape: &[usize]) -> Result<ArrayD<T>, LazyError> {
    let lhs = a.shape().to_vec();
    let contiguous = if a.is_standard_layout() {
        a
    } else {
        a.as_standard_layout().to_owned()
    };
    contiguous
        .into_shape_with_order(IxDyn(shape))
        .map_err(|_| LazyError::ShapeMismatch {
            op: "reshape",
            lhs,
            rhs: shape.to_vec(),
        })
}

fn slice_axis_nd<T: Clone>(a: ArrayD<T>, axis: usize, start: usize, end: usize) -> ArrayD<T> {
    a.slice_axis(Axis(axis), Slice::from(start..end)).to_owned()
}

fn rfft_along(a: &ArrayD<f32>, axis: usize) -> ArrayD<Complex32> {
    let n = a.shape()[axis];
    let n_out = n / 2 + 1;
    let mut out_shape = a.shape().to_vec();
    out_shape[axis] = n_out;
    let mut out = ArrayD::from_elem(IxDyn(&out_shape), Complex32::new(0.0, 0.0));

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let mut buf = vec![Complex32::new(0.0, 0.0); n];

    for (lane_in, mut lane_out) in a
        .lanes(Axis(axis))
        .into_iter()
        .zip(out.lanes_mut(Axis(axis)))
    {
        for (b, &v) in buf.iter_mut().zip(lane_in.iter()) {
            *b = Complex32::new(v, 0.0);
        }
        fft.process(&mut buf);
        for (o, &c) in lane_out.iter_mut().zip(buf.iter().take(n_out)) {
            *o = c;
        }
    }
    out
}

/// Unnormalized forward FFT along one axis, in place.
fn fft_along(a: &mut ArrayD<Complex32>, axis: usize) {
    let n = a.shape()[axis];
    if n < 2 {
        return;
    }
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let mut buf = vec![Complex32::new(0.0, 0.0); n];

    for mut lane in a.lanes_mut(Axis(axis)) {
        for (b, &v) in buf.iter_mut().zip(lane.iter()) {
            *b = v;
        }
        fft.process(&mut buf);
        for (v, &b) in lane.iter_mut().zip(buf.iter()) {
            *v = b;
        }
    }
}

/// Rolls each of `axes` by `n/2` so the zero bin lands in the middle.
fn fftshift_axes<T: Clone>(mut a: ArrayD<T>, axes: &[usize]) -> ArrayD<T> {
    for &axis in axes {
        let n = a.shape()[axis];
        if n < 2 {
            continue;
        }
        let shift = n / 2;
        let src = a.clone();
        for i in 0..n {
            let j = (i + shift) % n;
            a.index_axis_mut(Axis(axis), j)
                .assign(&src.index_axis(Axis(axis), i));
        }
    }
    a
}
