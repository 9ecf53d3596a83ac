use std::time::Duration;

use crate::error::FilterError;
use crate::partition::{Decomposition, LoadPolicy};

/// Default number of passes of [`FilterConfig`].
pub const DEFAULT_PASSES: usize = 100;

/// Configuration of a parallel box blur run.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use parblur_imgproc::{Decomposition, FilterConfig, LoadPolicy};
///
/// let config = FilterConfig::new()
///     .with_num_threads(8)
///     .with_load_policy(LoadPolicy::Unbalanced)
///     .with_decomposition(Decomposition::RowsAndColumns)
///     .with_passes(10)
///     .with_wait_bound(Duration::from_secs(5));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    /// Number of worker threads per pass, must be > 0.
    pub num_threads: usize,
    /// How rows are distributed among the workers.
    pub load_policy: LoadPolicy,
    /// Whether rows are split again into column tasks.
    pub decomposition: Decomposition,
    /// Number of passes, each one reading the output of the previous completed pass.
    pub passes: usize,
    /// How long a pass waits for its workers, `None` waits forever.
    pub wait_bound: Option<Duration>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            num_threads: 1,
            load_policy: LoadPolicy::default(),
            decomposition: Decomposition::default(),
            passes: DEFAULT_PASSES,
            wait_bound: None,
        }
    }
}

impl FilterConfig {
    /// Create a new configuration with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Set the load policy.
    pub fn with_load_policy(mut self, load_policy: LoadPolicy) -> Self {
        self.load_policy = load_policy;
        self
    }

    /// Set the decomposition.
    pub fn with_decomposition(mut self, decomposition: Decomposition) -> Self {
        self.decomposition = decomposition;
        self
    }

    /// Set the number of passes.
    pub fn with_passes(mut self, passes: usize) -> Self {
        self.passes = passes;
        self
    }

    /// Bound the time a pass waits for its workers.
    pub fn with_wait_bound(mut self, wait_bound: Duration) -> Self {
        self.wait_bound = Some(wait_bound);
        self
    }

    /// Check the configuration before any work is started.
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.num_threads == 0 {
            return Err(FilterError::InvalidThreadCount(self.num_threads));
        }
        if self.passes == 0 {
            return Err(FilterError::InvalidPassCount(self.passes));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FilterConfig::default();
        assert_eq!(config.num_threads, 1);
        assert_eq!(config.load_policy, LoadPolicy::Balanced);
        assert_eq!(config.decomposition, Decomposition::Rows);
        assert_eq!(config.passes, 100);
        assert_eq!(config.wait_bound, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid() {
        let config = FilterConfig::new().with_num_threads(0);
        assert_eq!(config.validate(), Err(FilterError::InvalidThreadCount(0)));

        let config = FilterConfig::new().with_passes(0);
        assert_eq!(config.validate(), Err(FilterError::InvalidPassCount(0)));
    }
}
