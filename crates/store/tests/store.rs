use ndarray::{ArrayD, IxDyn};
use num_complex::Complex32;
use tempfile::TempDir;

use magnon_store::{AxisSel, Selection, Store, StoreError};

fn fresh_store() -> (TempDir, Store) {
    let dir = TempDir::new().expect("tempdir");
    let store = Store::create(dir.path().join("job.zarr")).expect("create store");
    (dir, store)
}

/// Ramp array so every element value encodes its flat index.
fn ramp(shape: &[usize]) -> ArrayD<f32> {
    let n: usize = shape.iter().product();
    ArrayD::from_shape_vec(IxDyn(shape), (0..n).map(|i| i as f32).collect()).unwrap()
}

#[test]
fn open_missing_container_fails() {
    let dir = TempDir::new().unwrap();
    let err = Store::open(dir.path().join("absent.zarr")).unwrap_err();
    assert!(matches!(err, StoreError::ContainerNotFound { .. }));
}

#[test]
fn open_after_create_succeeds() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("job.zarr");
    Store::create(&path).unwrap();
    let store = Store::open(&path).unwrap();
    assert!(!store.exists("m").unwrap());
}

#[test]
fn shape_matches_written_array() {
    let (_dir, store) = fresh_store();
    store.write("m", ramp(&[4, 1, 8, 8, 3]), false).unwrap();
    assert_eq!(store.shape("m").unwrap(), vec![4, 1, 8, 8, 3]);
}

#[test]
fn read_full_round_trip() {
    let (_dir, store) = fresh_store();
    let arr = ramp(&[3, 4, 5]);
    store.write("m", arr.clone(), false).unwrap();
    let back = store.read::<f32>("m", &Selection::all()).unwrap();
    assert_eq!(back, arr);
}

#[test]
fn read_sliced_region_only() {
    let (_dir, store) = fresh_store();
    store.write("m", ramp(&[4, 6]), false).unwrap();

    let sel = Selection::new(vec![AxisSel::range(1, 3), AxisSel::range(2, 5)]);
    let sub = store.read::<f32>("m", &sel).unwrap();
    assert_eq!(sub.shape(), &[2, 3]);
    // Element (1, 2) of the source is flat index 1 * 6 + 2 = 8.
    assert_eq!(sub[[0, 0]], 8.0);
    assert_eq!(sub[[1, 2]], 16.0);
}

#[test]
fn read_index_drops_axis() {
    let (_dir, store) = fresh_store();
    store.write("m", ramp(&[4, 6]), false).unwrap();

    let sel = Selection::new(vec![AxisSel::Index(2)]);
    let row = store.read::<f32>("m", &sel).unwrap();
    assert_eq!(row.shape(), &[6]);
    assert_eq!(row[[0]], 12.0);
}

#[test]
fn read_missing_dataset_fails() {
    let (_dir, store) = fresh_store();
    let err = store.read::<f32>("nope", &Selection::all()).unwrap_err();
    assert!(matches!(err, StoreError::KeyNotFound { .. }));
}

#[test]
fn write_duplicate_fails_without_override() {
    let (_dir, store) = fresh_store();
    store.write("m", ramp(&[2, 2]), false).unwrap();
    let err = store.write("m", ramp(&[2, 2]), false).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }));
}

#[test]
fn override_replaces_shape() {
    let (_dir, store) = fresh_store();
    store.write("m", ramp(&[2, 2]), false).unwrap();
    store.write("m", ramp(&[5, 3]), true).unwrap();
    assert!(store.exists("m").unwrap());
    assert_eq!(store.shape("m").unwrap(), vec![5, 3]);
}

#[test]
fn delete_removes_entry() {
    let (_dir, store) = fresh_store();
    store.write("m", ramp(&[2, 2]), false).unwrap();
    store.delete("m").unwrap();
    assert!(!store.exists("m").unwrap());
}

#[test]
fn delete_absent_entry_is_an_error() {
    // Documented policy: deleting a missing entry fails rather than no-ops.
    let (_dir, store) = fresh_store();
    let err = store.delete("ghost").unwrap_err();
    assert!(matches!(err, StoreError::KeyNotFound { .. }));
}

#[test]
fn move_entry_renames_and_keeps_attributes() {
    let (_dir, store) = fresh_store();
    store.write("fft/m/arr", ramp(&[4]), false).unwrap();
    store
        .set_attr(Some("fft/m/arr"), "component", serde_json::json!(2))
        .unwrap();

    store.move_entry("fft/m/arr", "fft/mz/arr").unwrap();

    assert!(!store.exists("fft/m/arr").unwrap());
    assert!(store.exists("fft/mz/arr").unwrap());
    let attr = store.get_attr(Some("fft/mz/arr"), "component").unwrap();
    assert_eq!(attr, serde_json::json!(2));

    let err = store.shape("fft/m/arr").unwrap_err();
    assert!(matches!(err, StoreError::KeyNotFound { .. }));
}

#[test]
fn move_onto_existing_entry_fails() {
    let (_dir, store) = fresh_store();
    store.write("a", ramp(&[2]), false).unwrap();
    store.write("b", ramp(&[2]), false).unwrap();
    let err = store.move_entry("a", "b").unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }));
}

#[test]
fn root_attributes_round_trip() {
    let (_dir, store) = fresh_store();
    store.set_attr(None, "dt", serde_json::json!(1e-12)).unwrap();
    store
        .set_attr(None, "mx3", serde_json::json!("setgridsize(64, 64, 1)"))
        .unwrap();

    assert_eq!(store.attr_f64(None, "dt").unwrap(), 1e-12);
    let attrs = store.list_attrs().unwrap();
    assert_eq!(attrs.len(), 2);
    assert!(attrs.contains_key("mx3"));
}

#[test]
fn missing_attribute_fails() {
    let (_dir, store) = fresh_store();
    let err = store.get_attr(None, "dt").unwrap_err();
    assert!(matches!(err, StoreError::AttributeNotFound { .. }));
}

#[test]
fn non_numeric_attribute_rejected_by_typed_getter() {
    let (_dir, store) = fresh_store();
    store.set_attr(None, "script", serde_json::json!("run(1e-9)")).unwrap();
    let err = store.attr_f64(None, "script").unwrap_err();
    assert!(matches!(err, StoreError::AttributeType { .. }));
}

#[test]
fn list_arrays_reports_hierarchy() {
    let (_dir, store) = fresh_store();
    store.write("m", ramp(&[2, 1, 4, 4, 3]), false).unwrap();
    store.write("fft/m/arr", ramp(&[3]), false).unwrap();
    store.write("fft/m/freqs", ramp(&[3]), false).unwrap();

    let arrays = store.list_arrays().unwrap();
    assert_eq!(arrays.len(), 3);
    assert_eq!(arrays["m"], vec![2, 1, 4, 4, 3]);
    assert_eq!(arrays["fft/m/freqs"], vec![3]);
}

#[test]
fn complex_round_trip() {
    let (_dir, store) = fresh_store();
    let arr = ArrayD::from_shape_vec(
        IxDyn(&[2, 2]),
        vec![
            Complex32::new(1.0, -1.0),
            Complex32::new(0.0, 0.5),
            Complex32::new(-2.0, 0.0),
            Complex32::new(3.5, 3.5),
        ],
    )
    .unwrap();
    store.write("modes/m/arr", arr.clone(), false).unwrap();
    let back = store.read::<Complex32>("modes/m/arr", &Selection::all()).unwrap();
    assert_eq!(back, arr);
}

#[test]
fn f64_axis_round_trip() {
    let (_dir, store) = fresh_store();
    let freqs = ArrayD::from_shape_vec(IxDyn(&[3]), vec![0.0, 1.0e9, 2.0e9]).unwrap();
    store.write("fft/m/freqs", freqs.clone(), false).unwrap();
    let back = store.read::<f64>("fft/m/freqs", &Selection::all()).unwrap();
    assert_eq!(back, freqs);
}

#[test]
fn dataset_writer_lands_frames_at_their_index() {
    let (_dir, store) = fresh_store();
    let writer = store.create_dataset("m", &[3, 1, 2, 2, 3], false).unwrap();

    // Write frames out of order, as a worker pool would.
    for &t in &[2usize, 0, 1] {
        let frame = ArrayD::from_elem(IxDyn(&[1, 2, 2, 3]), t as f32);
        writer.write_frame(t, frame).unwrap();
    }

    for t in 0..3 {
        let sel = Selection::new(vec![AxisSel::Index(t)]);
        let frame = store.read::<f32>("m", &sel).unwrap();
        assert!(frame.iter().all(|&v| v == t as f32), "frame {t} mismatch");
    }
}

#[test]
fn dataset_writer_rejects_bad_slab() {
    let (_dir, store) = fresh_store();
    let writer = store.create_dataset("m", &[3, 1, 2, 2, 3], false).unwrap();
    let bad = ArrayD::zeros(IxDyn(&[1, 2, 3, 3]));
    let err = writer.write_frame(0, bad).unwrap_err();
    assert!(matches!(err, StoreError::SlabShape { .. }));
}
