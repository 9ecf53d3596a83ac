use parblur_image::ImageError;

/// Errors that can occur while filtering.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FilterError {
    /// The worker pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The requested number of passes is invalid.
    #[error("number of passes must be > 0, got {0}")]
    InvalidPassCount(usize),

    /// A worker panicked while filtering its range.
    #[error("worker filtering {task} panicked: {message}")]
    WorkerPanicked {
        /// The range the worker was assigned.
        task: String,
        /// The panic payload, if it was a string.
        message: String,
    },

    /// Error coming from the image buffers.
    #[error(transparent)]
    Image(#[from] ImageError),
}
