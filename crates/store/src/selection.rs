//! Per-axis index expressions for sliced dataset reads.

use std::ops::Range;

use crate::error::StoreError;

/// Selection applied to a single axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AxisSel {
    /// The whole axis.
    Full,
    /// A single index; the axis is dropped from the result.
    Index(usize),
    /// A contiguous half-open range. `end = None` means "to the end".
    Range {
        /// First index.
        start: usize,
        /// One past the last index, or `None` for the axis length.
        end: Option<usize>,
    },
}

impl AxisSel {
    /// Convenience constructor for `start..end`.
    pub fn range(start: usize, end: usize) -> Self {
        AxisSel::Range {
            start,
            end: Some(end),
        }
    }
}

/// Index expression over an N-dimensional array: one [`AxisSel`] per axis.
///
/// Trailing axes may be omitted and default to [`AxisSel::Full`], matching
/// the usual slicing shorthand. A selection is resolved against a concrete
/// shape before any data is read, so out-of-bounds and degenerate slices
/// are rejected up front.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection(Vec<AxisSel>);

impl Selection {
    /// Creates a selection from explicit per-axis expressions.
    pub fn new(axes: Vec<AxisSel>) -> Self {
        Selection(axes)
    }

    /// Selects every element of every axis.
    pub fn all() -> Self {
        Selection(Vec::new())
    }

    /// Returns the per-axis expressions.
    pub fn axes(&self) -> &[AxisSel] {
        &self.0
    }

    /// Resolves the selection against `shape`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`StoreError::SelectionRank`] | more axes than the array has |
    /// | [`StoreError::SelectionOutOfBounds`] | index or range past the axis end |
    /// | [`StoreError::EmptySelection`] | zero-length range or zero-length axis |
    pub fn resolve(&self, shape: &[usize], name: &str) -> Result<ResolvedSelection, StoreError> {
        if self.0.len() > shape.len() {
            return Err(StoreError::SelectionRank {
                name: name.to_string(),
                got: self.0.len(),
                rank: shape.len(),
            });
        }

        let mut ranges = Vec::with_capacity(shape.len());
        let mut keep = Vec::with_capacity(shape.len());

        for (axis, &len) in shape.iter().enumerate() {
            let sel = self.0.get(axis).unwrap_or(&AxisSel::Full);
            let (start, end, kept) = match *sel {
                AxisSel::Full => (0, len, true),
                AxisSel::Index(i) => {
                    if i >= len {
                        return Err(StoreError::SelectionOutOfBounds {
                            name: name.to_string(),
                            axis,
                            start: i,
                            end: i + 1,
                            len,
                        });
                    }
                    (i, i + 1, false)
                }
                AxisSel::Range { start, end } => {
                    let end = end.unwrap_or(len);
                    if end > len || start > end {
                        return Err(StoreError::SelectionOutOfBounds {
                            name: name.to_string(),
                            axis,
                            start,
                            end,
                            len,
                        });
                    }
                    (start, end, true)
                }
            };
            if end == start {
                return Err(StoreError::EmptySelection {
                    name: name.to_string(),
                    axis,
                });
            }
            ranges.push(start as u64..end as u64);
            keep.push(kept);
        }

        Ok(ResolvedSelection { ranges, keep })
    }
}

/// A [`Selection`] resolved against a concrete array shape.
#[derive(Clone, Debug)]
pub struct ResolvedSelection {
    /// Absolute half-open range per source axis.
    pub ranges: Vec<Range<u64>>,
    /// Whether each source axis survives in the result (`false` for
    /// single-index axes, which are dropped).
    pub keep: Vec<bool>,
}

impl ResolvedSelection {
    /// Shape of the selected region before indexed axes are dropped.
    pub fn region_shape(&self) -> Vec<usize> {
        self.ranges
            .iter()
            .map(|r| (r.end - r.start) as usize)
            .collect()
    }

    /// Shape of the result after indexed axes are dropped.
    pub fn out_shape(&self) -> Vec<usize> {
        self.ranges
            .iter()
            .zip(&self.keep)
            .filter(|&(_, &k)| k)
            .map(|(r, _)| (r.end - r.start) as usize)
            .collect()
    }
}
