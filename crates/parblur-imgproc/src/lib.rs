#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// filter configuration.
pub mod config;

/// pass driver swapping source and destination buffers.
pub mod driver;

/// error types of the filters.
pub mod error;

/// per-pixel convolution kernels.
pub mod kernel;

/// module containing parallization utilities.
pub mod parallel;

/// row and column partitioning of the work of a pass.
pub mod partition;

pub use config::FilterConfig;
pub use driver::{box_blur_parallel, BlurOutput, PassDriver, PassOutcome, PassReport};
pub use error::FilterError;
pub use kernel::{box_blur_sequential, BoxBlur3x3, PixelKernel};
pub use partition::{Decomposition, LoadPlan, LoadPolicy};
