#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use parblur_image as image;

#[doc(inline)]
pub use parblur_imgproc as imgproc;
