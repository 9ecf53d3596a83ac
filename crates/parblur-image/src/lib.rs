#![deny(missing_docs)]
//! Packed ARGB pixel buffers for the parblur filters

/// pixel buffer representation.
pub mod image;

/// packed pixel channel helpers.
pub mod pixel;

/// Error types for the image module.
pub mod error;

/// conversions from and to decoded `image` crate buffers.
#[cfg(feature = "image")]
mod convert;

pub use crate::error::ImageError;
pub use crate::image::{ImageSize, PixelBuffer};
pub use crate::pixel::{Argb, ALPHA_MASK};
