use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;

use crate::error::FilterError;

/// How a batch of tasks submitted to a [`WorkerPool`] ended.
#[derive(Debug, PartialEq)]
pub enum Completion<T> {
    /// Every task finished; results are in submission order.
    Finished(Vec<T>),

    /// The wait bound elapsed first.
    ///
    /// The tasks still running are abandoned, their results are dropped when they arrive.
    TimedOut {
        /// The results that arrived in time, in submission order.
        finished: Vec<T>,
        /// Number of tasks that had not reported.
        pending: usize,
    },

    /// A task panicked; the remaining results are discarded.
    Panicked {
        /// Submission index of the task.
        index: usize,
        /// The panic payload, if it was a string.
        message: String,
    },
}

impl<T> Completion<T> {
    /// Whether every task finished.
    pub fn is_finished(&self) -> bool {
        matches!(self, Completion::Finished(_))
    }
}

/// A fixed-size pool of OS threads that runs one batch of tasks and is then torn down.
///
/// The pool is consumed by [`WorkerPool::run`]: once a batch is submitted no more work can be
/// added, and the threads exit on their own after the last submitted task returns.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    wait_bound: Option<Duration>,
}

impl WorkerPool {
    /// Build a pool with `num_threads` threads.
    ///
    /// # Arguments
    ///
    /// * `num_threads` - The number of threads, must be > 0.
    /// * `wait_bound` - How long [`WorkerPool::run`] waits for the batch, `None` waits forever.
    ///
    /// # Errors
    ///
    /// [`FilterError::InvalidThreadCount`] for zero threads and [`FilterError::BuildError`] if the
    /// threads cannot be spawned.
    pub fn new(num_threads: usize, wait_bound: Option<Duration>) -> Result<Self, FilterError> {
        if num_threads == 0 {
            return Err(FilterError::InvalidThreadCount(num_threads));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|index| format!("parblur-worker-{index}"))
            .build()
            .map_err(|e| FilterError::BuildError(e.to_string()))?;

        Ok(Self { pool, wait_bound })
    }

    /// Number of threads of the pool.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run every task on the pool and block until they all finish or the wait bound elapses.
    ///
    /// Each task runs under `catch_unwind`, a panicking task is reported as
    /// [`Completion::Panicked`] instead of tearing down the process.
    ///
    /// # Examples
    ///
    /// ```
    /// use parblur_imgproc::parallel::{Completion, WorkerPool};
    ///
    /// let pool = WorkerPool::new(2, None).unwrap();
    /// let tasks = (0..4).map(|i| move || i * 10).collect();
    /// assert_eq!(pool.run(tasks), Completion::Finished(vec![0, 10, 20, 30]));
    /// ```
    pub fn run<T, F>(self, tasks: Vec<F>) -> Completion<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let num_tasks = tasks.len();
        let (tx, rx) = crossbeam_channel::unbounded();

        for (index, task) in tasks.into_iter().enumerate() {
            let tx = tx.clone();
            self.pool.spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(task));
                // the receiver is gone if the batch already timed out
                let _ = tx.send((index, outcome));
            });
        }
        drop(tx);

        // no further submissions; spawned tasks keep the threads alive until they return
        let Self { pool, wait_bound } = self;
        drop(pool);

        let deadline = wait_bound.and_then(|bound| Instant::now().checked_add(bound));
        let mut finished = Vec::with_capacity(num_tasks);

        while finished.len() < num_tasks {
            let received = match deadline {
                Some(deadline) => rx.recv_deadline(deadline),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok((index, Ok(value))) => finished.push((index, value)),
                Ok((index, Err(payload))) => {
                    return Completion::Panicked {
                        index,
                        message: panic_message(payload.as_ref()),
                    };
                }
                // every sender reports before dropping, so a disconnect means lost tasks
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    let pending = num_tasks - finished.len();
                    return Completion::TimedOut {
                        finished: in_submission_order(finished),
                        pending,
                    };
                }
            }
        }

        Completion::Finished(in_submission_order(finished))
    }
}

fn in_submission_order<T>(mut finished: Vec<(usize, T)>) -> Vec<T> {
    finished.sort_unstable_by_key(|(index, _)| *index);
    finished.into_iter().map(|(_, value)| value).collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn run_finished_in_order() -> Result<(), FilterError> {
        let pool = WorkerPool::new(3, None)?;
        assert_eq!(pool.num_threads(), 3);

        let tasks = (0..16)
            .map(|i| {
                move || {
                    // make later tasks finish first
                    std::thread::sleep(Duration::from_millis((16 - i) as u64));
                    i * 2
                }
            })
            .collect();
        let expected = (0..16).map(|i| i * 2).collect::<Vec<_>>();
        assert_eq!(pool.run(tasks), Completion::Finished(expected));

        Ok(())
    }

    #[test]
    fn run_empty() -> Result<(), FilterError> {
        let pool = WorkerPool::new(1, Some(Duration::from_millis(1)))?;
        let tasks: Vec<fn() -> u8> = Vec::new();
        assert!(pool.run(tasks).is_finished());

        Ok(())
    }

    #[test]
    fn run_every_task_once() -> Result<(), FilterError> {
        let counter = Arc::new(AtomicUsize::new(0));
        let tasks = (0..100)
            .map(|_| {
                let counter = Arc::clone(&counter);
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
            .collect();
        assert!(WorkerPool::new(4, None)?.run(tasks).is_finished());
        assert_eq!(counter.load(Ordering::SeqCst), 100);

        Ok(())
    }

    #[test]
    fn run_timeout() -> Result<(), FilterError> {
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);
        let pool = WorkerPool::new(2, Some(Duration::from_millis(50)))?;

        let tasks: Vec<Box<dyn FnOnce() -> usize + Send>> = vec![
            Box::new(|| 1),
            Box::new(move || {
                let _ = release_rx.recv();
                2
            }),
        ];
        let completion = pool.run(tasks);
        assert_eq!(
            completion,
            Completion::TimedOut {
                finished: vec![1],
                pending: 1
            }
        );

        // let the abandoned task return
        drop(release_tx);

        Ok(())
    }

    #[test]
    fn run_panic() -> Result<(), FilterError> {
        let pool = WorkerPool::new(2, None)?;
        let tasks: Vec<Box<dyn FnOnce() -> usize + Send>> =
            vec![Box::new(|| 1), Box::new(|| -> usize { panic!("boom") })];

        match pool.run(tasks) {
            Completion::Panicked { index, message } => {
                assert_eq!(index, 1);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected completion {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn invalid_thread_count() {
        assert!(matches!(
            WorkerPool::new(0, None),
            Err(FilterError::InvalidThreadCount(0))
        ));
    }
}
