/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when the pixel data does not match the image size.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidDataLength(usize, usize),

    /// Error when width * height does not fit in memory.
    #[error("Image size {0}x{1} overflows")]
    SizeOverflow(usize, usize),

    /// Error when a pixel coordinate is outside of the image.
    #[error("Pixel coordinate ({0}, {1}) is out of bounds")]
    PixelIndexOutOfBounds(usize, usize),

    /// Error when two images are expected to have the same size.
    #[error("Image size mismatch: ({0}) vs ({1})")]
    InvalidImageSize(String, String),
}
