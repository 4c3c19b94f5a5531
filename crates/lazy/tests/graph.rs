use ndarray::{ArrayD, IxDyn};
use tempfile::TempDir;

use magnon_lazy::{LazyArray, LazyError, hann};
use magnon_store::{AxisSel, Selection, Store};

/// Store with one `(T, Z, Y, X)` ramp dataset; element value encodes the
/// flat index.
fn store_with_ramp(shape: &[usize]) -> (TempDir, Store) {
    let dir = TempDir::new().expect("tempdir");
    let store = Store::create(dir.path().join("job.zarr")).expect("create store");
    let n: usize = shape.iter().product();
    let arr = ArrayD::from_shape_vec(IxDyn(shape), (0..n).map(|i| i as f32).collect()).unwrap();
    store.write("m", arr, false).unwrap();
    (dir, store)
}

fn whole(rank: usize) -> Vec<Option<usize>> {
    vec![None; rank]
}

#[test]
fn wrap_requires_chunking_per_axis() {
    let (_dir, store) = store_with_ramp(&[4, 4]);
    let dset = store.dataset("m").unwrap();
    let err = LazyArray::wrap(dset, vec![None]).unwrap_err();
    assert!(matches!(err, LazyError::ShapeMismatch { op: "wrap", .. }));
}

#[test]
fn compute_without_ops_reads_selection() {
    let (_dir, store) = store_with_ramp(&[4, 6]);
    let dset = store.dataset("m").unwrap();
    let out = LazyArray::wrap(dset, whole(2))
        .unwrap()
        .select(Selection::new(vec![AxisSel::Index(1), AxisSel::range(2, 5)]))
        .unwrap()
        .compute()
        .unwrap()
        .into_real()
        .unwrap();
    assert_eq!(out.shape(), &[3]);
    assert_eq!(out[[0]], 8.0); // flat index 1 * 6 + 2
}

#[test]
fn select_after_ops_is_rejected() {
    let (_dir, store) = store_with_ramp(&[4, 6]);
    let dset = store.dataset("m").unwrap();
    let err = LazyArray::wrap(dset, whole(2))
        .unwrap()
        .sum(&[0])
        .unwrap()
        .select(Selection::all())
        .unwrap_err();
    assert!(matches!(err, LazyError::LateSelect));
}

#[test]
fn chunked_and_dense_sums_agree() {
    let (_dir, store) = store_with_ramp(&[8, 10, 6]);

    let dense = LazyArray::wrap(store.dataset("m").unwrap(), whole(3))
        .unwrap()
        .sum(&[1])
        .unwrap()
        .compute()
        .unwrap()
        .into_real()
        .unwrap();

    // Chunk the summed axis with a block that does not divide its length.
    let chunked = LazyArray::wrap(store.dataset("m").unwrap(), vec![None, Some(3), None])
        .unwrap()
        .sum(&[1])
        .unwrap()
        .compute()
        .unwrap()
        .into_real()
        .unwrap();

    assert_eq!(dense.shape(), &[8, 6]);
    assert_eq!(dense, chunked);
}

#[test]
fn chunked_windowed_sum_matches_dense() {
    let (_dir, store) = store_with_ramp(&[16, 9, 4]);
    let window = hann(16)
        .into_dyn()
        .into_shape_with_order(IxDyn(&[16, 1, 1]))
        .unwrap();

    let dense = LazyArray::wrap(store.dataset("m").unwrap(), whole(3))
        .unwrap()
        .mul(window.clone())
        .unwrap()
        .sum(&[1])
        .unwrap()
        .compute()
        .unwrap()
        .into_real()
        .unwrap();

    let chunked = LazyArray::wrap(store.dataset("m").unwrap(), vec![None, Some(4), None])
        .unwrap()
        .mul(window)
        .unwrap()
        .sum(&[1])
        .unwrap()
        .compute()
        .unwrap()
        .into_real()
        .unwrap();

    for (a, b) in dense.iter().zip(chunked.iter()) {
        assert!((a - b).abs() < 1e-2, "chunked {b} != dense {a}");
    }
}

#[test]
fn chunked_average_divides_by_full_extent() {
    let (_dir, store) = store_with_ramp(&[2, 6]);

    let avg = LazyArray::wrap(store.dataset("m").unwrap(), vec![None, Some(4)])
        .unwrap()
        .average(&[1])
        .unwrap()
        .compute()
        .unwrap()
        .into_real()
        .unwrap();

    // Row 0 holds 0..6, mean 2.5; row 1 holds 6..12, mean 8.5.
    assert_eq!(avg.shape(), &[2]);
    assert!((avg[[0]] - 2.5).abs() < 1e-6);
    assert!((avg[[1]] - 8.5).abs() < 1e-6);
}

#[test]
fn mul_shape_mismatch_is_rejected_at_composition() {
    let (_dir, store) = store_with_ramp(&[4, 6]);
    let operand = ArrayD::<f32>::zeros(IxDyn(&[5]));
    let err = LazyArray::wrap(store.dataset("m").unwrap(), whole(2))
        .unwrap()
        .mul(operand)
        .unwrap_err();
    assert!(matches!(err, LazyError::ShapeMismatch { op: "mul", .. }));
}

#[test]
fn axis_out_of_range_is_rejected() {
    let (_dir, store) = store_with_ramp(&[4, 6]);
    let err = LazyArray::wrap(store.dataset("m").unwrap(), whole(2))
        .unwrap()
        .sum(&[2])
        .unwrap_err();
    assert!(matches!(
        err,
        LazyError::UnsupportedAxis {
            op: "sum",
            axis: 2,
            rank: 2
        }
    ));
}

#[test]
fn empty_selection_is_rejected() {
    let (_dir, store) = store_with_ramp(&[4, 6]);
    let err = LazyArray::wrap(store.dataset("m").unwrap(), whole(2))
        .unwrap()
        .select(Selection::new(vec![AxisSel::range(2, 2)]))
        .unwrap_err();
    assert!(matches!(err, LazyError::Store(_)));
}

#[test]
fn rfft_shape_and_kind() {
    let (_dir, store) = store_with_ramp(&[100, 4]);
    let graph = LazyArray::wrap(store.dataset("m").unwrap(), whole(2))
        .unwrap()
        .rfft(0)
        .unwrap();
    assert_eq!(graph.shape(), &[51, 4]);
    assert!(graph.is_complex());

    let out = graph.compute().unwrap().into_complex().unwrap();
    assert_eq!(out.shape(), &[51, 4]);
}

#[test]
fn rfft_on_complex_graph_is_rejected() {
    let (_dir, store) = store_with_ramp(&[16, 4]);
    let err = LazyArray::wrap(store.dataset("m").unwrap(), whole(2))
        .unwrap()
        .fft2([0, 1])
        .unwrap()
        .rfft(0)
        .unwrap_err();
    assert!(matches!(
        err,
        LazyError::WrongKind {
            op: "rfft",
            expected: "real"
        }
    ));
}

#[test]
fn sub_frame_then_sum_removes_static_offset() {
    let dir = TempDir::new().unwrap();
    let store = Store::create(dir.path().join("job.zarr")).unwrap();
    // Constant-in-time array: subtracting frame 0 must zero everything.
    let arr = ArrayD::from_shape_fn(IxDyn(&[5, 3]), |ix| 7.0 + ix[1] as f32);
    store.write("m", arr, false).unwrap();

    let out = LazyArray::wrap(store.dataset("m").unwrap(), whole(2))
        .unwrap()
        .sub_frame(0, 0)
        .unwrap()
        .abs()
        .unwrap()
        .sum(&[0, 1])
        .unwrap()
        .compute()
        .unwrap()
        .into_real()
        .unwrap();
    assert_eq!(out.ndim(), 0);
    assert!(out[[]] < 1e-6);
}

#[test]
fn sub_mean_centers_each_lane() {
    let (_dir, store) = store_with_ramp(&[4, 3]);
    let out = LazyArray::wrap(store.dataset("m").unwrap(), whole(2))
        .unwrap()
        .sub_mean(&[0])
        .unwrap()
        .sum(&[0])
        .unwrap()
        .compute()
        .unwrap()
        .into_real()
        .unwrap();
    for &v in out.iter() {
        assert!(v.abs() < 1e-4, "column sum {v} should vanish after centering");
    }
}

#[test]
fn reshape_flattens_cells() {
    let (_dir, store) = store_with_ramp(&[2, 3, 4]);
    let graph = LazyArray::wrap(store.dataset("m").unwrap(), whole(3))
        .unwrap()
        .swap_axes(0, 2)
        .unwrap()
        .reshape(&[12, 2])
        .unwrap();
    assert_eq!(graph.shape(), &[12, 2]);
    let out = graph.compute().unwrap().into_real().unwrap();
    assert_eq!(out.shape(), &[12, 2]);
    // (x, y, t) element (0, 0, 1) is source element (1, 0, 0) = 12.
    assert_eq!(out[[0, 1]], 12.0);
}

#[test]
fn reshape_with_wrong_element_count_is_rejected() {
    let (_dir, store) = store_with_ramp(&[2, 3]);
    let err = LazyArray::wrap(store.dataset("m").unwrap(), whole(2))
        .unwrap()
        .reshape(&[5])
        .unwrap_err();
    assert!(matches!(err, LazyError::ShapeMismatch { op: "reshape", .. }));
}

#[test]
fn slice_axis_keeps_first_half() {
    let (_dir, store) = store_with_ramp(&[8, 2]);
    let out = LazyArray::wrap(store.dataset("m").unwrap(), whole(2))
        .unwrap()
        .slice_axis(0, 0, 4)
        .unwrap()
        .compute()
        .unwrap()
        .into_real()
        .unwrap();
    assert_eq!(out.shape(), &[4, 2]);
    assert_eq!(out[[3, 1]], 7.0);
}

#[test]
fn tone_survives_windowed_pipeline() {
    // A pure tone at bin 4 over 64 samples, constant in space.
    let dir = TempDir::new().unwrap();
    let store = Store::create(dir.path().join("job.zarr")).unwrap();
    let n = 64;
    let arr = ArrayD::from_shape_fn(IxDyn(&[n, 2, 3]), |ix| {
        (2.0 * std::f32::consts::PI * 4.0 * ix[0] as f32 / n as f32).sin()
    });
    store.write("m", arr, false).unwrap();

    let window = hann(n)
        .into_dyn()
        .into_shape_with_order(IxDyn(&[n, 1]))
        .unwrap();
    let out = LazyArray::wrap(store.dataset("m").unwrap(), vec![None, Some(1), None])
        .unwrap()
        .sum(&[1])
        .unwrap()
        .mul(window)
        .unwrap()
        .rfft(0)
        .unwrap()
        .abs()
        .unwrap()
        .sum(&[1])
        .unwrap()
        .compute()
        .unwrap()
        .into_real()
        .unwrap();

    assert_eq!(out.shape(), &[n / 2 + 1]);
    let (peak, _) = out
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .unwrap();
    assert_eq!(peak, 4, "windowed tone should peak at its bin");
}
