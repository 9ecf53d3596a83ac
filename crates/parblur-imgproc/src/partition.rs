use std::fmt;

use parblur_image::ImageSize;

/// How rows are distributed among the workers of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Every worker gets the same number of rows, the last one takes the remainder.
    #[default]
    Balanced,

    /// The first worker gets twice the rows of every other worker.
    ///
    /// Meant as a comparison point for skewed load, not as a faster schedule.
    Unbalanced,
}

impl LoadPolicy {
    /// The policy actually used for `num_threads` workers.
    ///
    /// With two workers or fewer the skew buys nothing, so it falls back to [`LoadPolicy::Balanced`].
    pub fn effective(self, num_threads: usize) -> Self {
        match self {
            LoadPolicy::Unbalanced if num_threads > 2 => LoadPolicy::Unbalanced,
            _ => LoadPolicy::Balanced,
        }
    }
}

impl fmt::Display for LoadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadPolicy::Balanced => write!(f, "balanced"),
            LoadPolicy::Unbalanced => write!(f, "unbalanced"),
        }
    }
}

/// Whether a worker's rows are split again into column tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decomposition {
    /// One task per row range.
    #[default]
    Rows,

    /// One task per (row, column range) inside each row range, run on a nested pool.
    RowsAndColumns,
}

/// A half-open interval `[start, end)` of rows or columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// First index of the span.
    pub start: usize,
    /// One past the last index of the span.
    pub end: usize,
}

impl Span {
    /// Create a new span, `end` is exclusive.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of indices in the span.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the indices of the span.
    #[inline]
    pub fn iter(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    // keep the span inside the interior [1, extent - 1) and non-reversed
    fn clamp_interior(self, extent: usize) -> Self {
        let hi = extent.saturating_sub(1).max(1);
        let start = self.start.clamp(1, hi);
        let end = self.end.clamp(start, hi);
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Split the interior `[1, extent - 1)` into `parts` contiguous spans of equal size.
///
/// The chunk size is `extent / parts`; span `t` is `[t * chunk + 1, (t + 1) * chunk + 1)` and the
/// last span extends to `extent - 1`. Spans are clamped to the interior, so trailing spans may be
/// empty when there are more parts than interior indices.
///
/// # Arguments
///
/// * `extent` - The number of rows (or columns) of the image, borders included.
/// * `parts` - The number of spans to produce.
///
/// # Examples
///
/// ```
/// use parblur_imgproc::partition::{balanced_spans, Span};
///
/// let spans = balanced_spans(10, 3);
/// assert_eq!(spans, vec![Span::new(1, 4), Span::new(4, 7), Span::new(7, 9)]);
/// ```
pub fn balanced_spans(extent: usize, parts: usize) -> Vec<Span> {
    if parts == 0 {
        return Vec::new();
    }

    let chunk = extent / parts;
    (0..parts)
        .map(|t| {
            let start = t * chunk + 1;
            let end = if t == parts - 1 {
                extent.saturating_sub(1)
            } else {
                (t + 1) * chunk + 1
            };
            Span::new(start, end).clamp_interior(extent)
        })
        .collect()
}

/// Split the interior `[1, extent - 1)` so the first span is twice as long as the others.
///
/// The unit is `extent / (parts + 1)`: span 0 is `[1, 2 * unit + 1)`, span `t >= 1` is
/// `[(t + 1) * unit + 1, (t + 2) * unit + 1)` and the last span extends to `extent - 1`.
///
/// # Examples
///
/// ```
/// use parblur_imgproc::partition::{unbalanced_spans, Span};
///
/// let spans = unbalanced_spans(41, 4);
/// let rows = spans.iter().map(Span::len).collect::<Vec<_>>();
/// assert_eq!(rows, vec![16, 8, 8, 7]);
/// ```
pub fn unbalanced_spans(extent: usize, parts: usize) -> Vec<Span> {
    if parts == 0 {
        return Vec::new();
    }

    let unit = extent / (parts + 1);
    (0..parts)
        .map(|t| {
            let start = if t == 0 { 1 } else { (t + 1) * unit + 1 };
            let end = if t == parts - 1 {
                extent.saturating_sub(1)
            } else {
                (t + 2) * unit + 1
            };
            Span::new(start, end).clamp_interior(extent)
        })
        .collect()
}

/// The range of pixels a single task filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkItem {
    /// Every interior column of the rows in the span.
    Rows(Span),

    /// The columns in `cols` of a single row.
    Cells {
        /// The row index.
        row: usize,
        /// The column span within the row.
        cols: Span,
    },
}

impl WorkItem {
    /// The rows covered by the item.
    pub fn rows(&self) -> Span {
        match *self {
            WorkItem::Rows(rows) => rows,
            WorkItem::Cells { row, .. } => Span::new(row, row + 1),
        }
    }

    /// The columns covered by the item in an image `width` pixels wide.
    pub fn cols(&self, width: usize) -> Span {
        match *self {
            WorkItem::Rows(_) => Span::new(1, width.saturating_sub(1).max(1)),
            WorkItem::Cells { cols, .. } => cols,
        }
    }

    /// Number of pixels the item filters in an image `width` pixels wide.
    pub fn num_pixels(&self, width: usize) -> usize {
        self.rows().len() * self.cols(width).len()
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WorkItem::Rows(rows) => write!(f, "rows {}", rows),
            WorkItem::Cells { row, cols } => write!(f, "row {} cols {}", row, cols),
        }
    }
}

/// The work of one outer worker: its row span and the tasks it runs over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowBatch {
    /// The rows assigned to the worker.
    pub rows: Span,
    /// The tasks covering `rows`, a single [`WorkItem::Rows`] unless nested.
    pub items: Vec<WorkItem>,
}

impl RowBatch {
    /// Whether the batch must run on its own nested pool.
    pub fn is_nested(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, WorkItem::Cells { .. }))
    }
}

/// The work items of one pass, grouped by outer worker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadPlan {
    batches: Vec<RowBatch>,
}

impl LoadPlan {
    /// Partition the interior of an image among `num_threads` workers.
    ///
    /// Empty row spans produce no batch, and an image without interior produces an empty plan.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image.
    /// * `num_threads` - The number of workers, also the number of column spans when nested.
    /// * `policy` - The row distribution, see [`LoadPolicy::effective`].
    /// * `decomposition` - Whether rows are split again into column tasks.
    pub fn new(
        size: ImageSize,
        num_threads: usize,
        policy: LoadPolicy,
        decomposition: Decomposition,
    ) -> Self {
        if !size.has_interior() {
            return Self::default();
        }

        let row_spans = match policy.effective(num_threads) {
            LoadPolicy::Balanced => balanced_spans(size.height, num_threads),
            LoadPolicy::Unbalanced => unbalanced_spans(size.height, num_threads),
        };

        let col_spans = match decomposition {
            Decomposition::Rows => Vec::new(),
            Decomposition::RowsAndColumns => balanced_spans(size.width, num_threads)
                .into_iter()
                .filter(|cols| !cols.is_empty())
                .collect(),
        };

        let batches = row_spans
            .into_iter()
            .filter(|rows| !rows.is_empty())
            .map(|rows| {
                let items = match decomposition {
                    Decomposition::Rows => vec![WorkItem::Rows(rows)],
                    Decomposition::RowsAndColumns => rows
                        .iter()
                        .flat_map(|row| {
                            col_spans
                                .iter()
                                .map(move |&cols| WorkItem::Cells { row, cols })
                        })
                        .collect(),
                };
                RowBatch { rows, items }
            })
            .collect();

        Self { batches }
    }

    /// The batches of the plan, one per outer worker with rows to filter.
    pub fn batches(&self) -> &[RowBatch] {
        &self.batches
    }

    /// Consume the plan and return its batches.
    pub fn into_batches(self) -> Vec<RowBatch> {
        self.batches
    }

    /// Iterate over every work item of the plan.
    pub fn items(&self) -> impl Iterator<Item = &WorkItem> {
        self.batches.iter().flat_map(|batch| batch.items.iter())
    }

    /// Number of work items in the plan.
    pub fn num_items(&self) -> usize {
        self.batches.iter().map(|batch| batch.items.len()).sum()
    }
}
