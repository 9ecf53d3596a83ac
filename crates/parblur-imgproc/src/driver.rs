use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use parblur_image::{ImageError, PixelBuffer};

use crate::config::FilterConfig;
use crate::error::FilterError;
use crate::kernel::{BoxBlur3x3, PixelKernel, Tile};
use crate::parallel::{Completion, WorkerPool};
use crate::partition::{LoadPlan, RowBatch};

/// How a single pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every worker finished and the buffers swapped roles.
    Completed,

    /// The wait bound elapsed; the buffers kept their roles.
    TimedOut {
        /// Number of tasks that had not reported, outer and nested.
        pending: usize,
    },
}

/// Counts of pass outcomes over a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    /// Passes whose output became the source of the next pass.
    pub completed: usize,
    /// Passes that hit the wait bound and were not promoted.
    pub timed_out: usize,
}

/// Result of [`box_blur_parallel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlurOutput {
    /// The output of the last completed pass, or the input if none completed.
    pub image: PixelBuffer,
    /// The other buffer of the pair.
    pub scratch: PixelBuffer,
    /// Outcome counts of the passes.
    pub report: PassReport,
}

// tiles of one outer worker, plus the nested tasks it gave up on
struct BatchOutput {
    tiles: Vec<Tile>,
    pending: usize,
}

/// Runs filter passes over a source/destination buffer pair.
///
/// The source is shared read-only with the workers of a pass; the destination is owned by the
/// driver, which commits the workers' tiles into it. After every completed pass the two buffers
/// swap roles, so the next pass reads what was just written.
pub struct PassDriver<K = BoxBlur3x3> {
    kernel: Arc<K>,
    source: Arc<PixelBuffer>,
    destination: PixelBuffer,
}

impl PassDriver<BoxBlur3x3> {
    /// Create a box blur driver over `source` and `destination`.
    ///
    /// The border of `destination` is never written; fill it beforehand if it matters, e.g. with
    /// [`PixelBuffer::copy_border_from`].
    pub fn new(source: PixelBuffer, destination: PixelBuffer) -> Result<Self, FilterError> {
        Self::with_kernel(source, destination, BoxBlur3x3)
    }
}

impl<K: PixelKernel + 'static> PassDriver<K> {
    /// Create a driver running `kernel` over `source` and `destination`.
    ///
    /// # Errors
    ///
    /// If the buffers do not have the same size.
    pub fn with_kernel(
        source: PixelBuffer,
        destination: PixelBuffer,
        kernel: K,
    ) -> Result<Self, FilterError> {
        if source.size() != destination.size() {
            return Err(ImageError::InvalidImageSize(
                source.size().to_string(),
                destination.size().to_string(),
            )
            .into());
        }

        Ok(Self {
            kernel: Arc::new(kernel),
            source: Arc::new(source),
            destination,
        })
    }

    /// The buffer the next pass reads: the output of the last completed pass.
    pub fn latest(&self) -> &PixelBuffer {
        &self.source
    }

    /// The buffer the next pass writes.
    pub fn destination(&self) -> &PixelBuffer {
        &self.destination
    }

    /// Consume the driver, returning `(latest, destination)`.
    pub fn into_buffers(self) -> (PixelBuffer, PixelBuffer) {
        (Arc::unwrap_or_clone(self.source), self.destination)
    }

    /// Run `config.passes` passes.
    ///
    /// Timed out passes are counted in the report, not retried; the next pass reads the same
    /// source again.
    ///
    /// # Errors
    ///
    /// On an invalid configuration, before any work is started, or when a worker panics, in which
    /// case the failing pass is not promoted.
    pub fn run(&mut self, config: &FilterConfig) -> Result<PassReport, FilterError> {
        config.validate()?;

        let mut report = PassReport::default();
        for pass in 0..config.passes {
            let outcome = self.run_pass(config)?;
            debug!("pass {}/{}: {:?}", pass + 1, config.passes, outcome);

            match outcome {
                PassOutcome::Completed => report.completed += 1,
                PassOutcome::TimedOut { .. } => report.timed_out += 1,
            }
        }

        Ok(report)
    }

    /// Run a single pass and swap the buffers if every worker finished in time.
    pub fn run_pass(&mut self, config: &FilterConfig) -> Result<PassOutcome, FilterError> {
        config.validate()?;

        let policy = config.load_policy.effective(config.num_threads);
        let plan = LoadPlan::new(
            self.source.size(),
            config.num_threads,
            policy,
            config.decomposition,
        );
        debug!(
            "{} load plan with {} threads: {} row batches, {} work items",
            policy,
            config.num_threads,
            plan.batches().len(),
            plan.num_items()
        );

        let pool = WorkerPool::new(config.num_threads, config.wait_bound)?;

        let batches = plan.into_batches();
        let labels = batches
            .iter()
            .map(|batch| format!("rows {}", batch.rows))
            .collect::<Vec<_>>();
        let tasks = batches
            .into_iter()
            .map(|batch| {
                let kernel = Arc::clone(&self.kernel);
                let source = Arc::clone(&self.source);
                let (num_threads, wait_bound) = (config.num_threads, config.wait_bound);
                move || run_batch(kernel, source, batch, num_threads, wait_bound)
            })
            .collect();

        match pool.run(tasks) {
            Completion::Finished(outputs) => {
                let pending = self.commit(outputs)?;
                if pending > 0 {
                    return Ok(PassOutcome::TimedOut { pending });
                }
                self.swap_roles();
                Ok(PassOutcome::Completed)
            }
            Completion::TimedOut { finished, pending } => {
                warn!(
                    "TIMEOUT: not all workers with {} load finished in time, {} row batches pending",
                    policy, pending
                );
                let nested_pending = self.commit(finished)?;
                Ok(PassOutcome::TimedOut {
                    pending: pending + nested_pending,
                })
            }
            Completion::Panicked { index, message } => {
                error!("worker filtering {} panicked: {}", labels[index], message);
                Err(FilterError::WorkerPanicked {
                    task: labels[index].clone(),
                    message,
                })
            }
        }
    }

    // write the finished tiles, returning the number of abandoned nested tasks
    fn commit(
        &mut self,
        outputs: Vec<Result<BatchOutput, FilterError>>,
    ) -> Result<usize, FilterError> {
        let mut pending = 0;
        for output in outputs {
            let output = output?;
            pending += output.pending;
            for tile in &output.tiles {
                tile.write_into(&mut self.destination);
            }
        }
        Ok(pending)
    }

    fn swap_roles(&mut self) {
        let written = std::mem::take(&mut self.destination);
        let read = std::mem::replace(&mut self.source, Arc::new(written));
        // workers abandoned by a timed out pass may still hold the old source
        self.destination = Arc::unwrap_or_clone(read);
    }
}

fn run_batch<K: PixelKernel + 'static>(
    kernel: Arc<K>,
    source: Arc<PixelBuffer>,
    batch: RowBatch,
    num_threads: usize,
    wait_bound: Option<Duration>,
) -> Result<BatchOutput, FilterError> {
    if !batch.is_nested() {
        let tiles = batch
            .items
            .into_iter()
            .map(|item| Tile::compute(kernel.as_ref(), &source, item))
            .collect();
        return Ok(BatchOutput { tiles, pending: 0 });
    }

    let pool = WorkerPool::new(num_threads, wait_bound)?;
    let tasks = batch
        .items
        .iter()
        .map(|&item| {
            let kernel = Arc::clone(&kernel);
            let source = Arc::clone(&source);
            move || Tile::compute(kernel.as_ref(), &source, item)
        })
        .collect();

    match pool.run(tasks) {
        Completion::Finished(tiles) => Ok(BatchOutput { tiles, pending: 0 }),
        Completion::TimedOut { finished, pending } => {
            warn!(
                "TIMEOUT: not all nested workers for rows {} finished in time, {} tasks pending",
                batch.rows, pending
            );
            Ok(BatchOutput {
                tiles: finished,
                pending,
            })
        }
        Completion::Panicked { index, message } => {
            error!("worker filtering {} panicked: {}", batch.items[index], message);
            Err(FilterError::WorkerPanicked {
                task: batch.items[index].to_string(),
                message,
            })
        }
    }
}

/// Blur `src` with the 3x3 box kernel over `config.passes` parallel passes.
///
/// The buffers swap roles after every completed pass; the result is the output of the last
/// completed pass. Border pixels of either buffer are never written.
///
/// # Arguments
///
/// * `src` - The input buffer.
/// * `dst` - The buffer the first pass writes, same size as `src`.
/// * `config` - Threads, load policy, decomposition, passes and wait bound.
///
/// # Errors
///
/// On an invalid configuration or mismatching sizes, before any work is started, or when a
/// worker panics.
///
/// # Examples
///
/// ```
/// use parblur_image::PixelBuffer;
/// use parblur_imgproc::{box_blur_parallel, FilterConfig, LoadPolicy};
///
/// let src = PixelBuffer::from_size_val([16, 16].into(), 0xFF102030).unwrap();
/// let dst = src.clone();
/// let config = FilterConfig::new()
///     .with_num_threads(4)
///     .with_load_policy(LoadPolicy::Unbalanced)
///     .with_passes(3);
///
/// let output = box_blur_parallel(src, dst, &config).unwrap();
/// assert_eq!(output.report.completed, 3);
/// assert!(output.image.as_slice().iter().all(|&px| px == 0xFF102030));
/// ```
pub fn box_blur_parallel(
    src: PixelBuffer,
    dst: PixelBuffer,
    config: &FilterConfig,
) -> Result<BlurOutput, FilterError> {
    config.validate()?;

    let mut driver = PassDriver::new(src, dst)?;
    let report = driver.run(config)?;
    let (image, scratch) = driver.into_buffers();

    Ok(BlurOutput {
        image,
        scratch,
        report,
    })
}
