use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use parblur_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels covered by the size, failing on overflow.
    pub fn num_pixels(&self) -> Result<usize, ImageError> {
        self.width
            .checked_mul(self.height)
            .ok_or(ImageError::SizeOverflow(self.width, self.height))
    }

    /// Whether the image has at least one pixel that is not on its border.
    pub fn has_interior(&self) -> bool {
        self.width >= 3 && self.height >= 3
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

impl From<ImageSize> for [u32; 2] {
    fn from(size: ImageSize) -> Self {
        [size.width as u32, size.height as u32]
    }
}

/// A row-major buffer of packed `0xAARRGGBB` pixels.
///
/// The size is fixed for the lifetime of the buffer. The default buffer is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelBuffer {
    size: ImageSize,
    data: Vec<u32>,
}

impl PixelBuffer {
    /// Create a new buffer from packed pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The packed pixels, row after row.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use parblur_image::{ImageSize, PixelBuffer};
    ///
    /// let buffer = PixelBuffer::new(
    ///     ImageSize {
    ///         width: 10,
    ///         height: 20,
    ///     },
    ///     vec![0u32; 10 * 20],
    /// ).unwrap();
    ///
    /// assert_eq!(buffer.width(), 10);
    /// assert_eq!(buffer.height(), 20);
    /// ```
    pub fn new(size: ImageSize, data: Vec<u32>) -> Result<Self, ImageError> {
        let num_pixels = size.num_pixels()?;
        if data.len() != num_pixels {
            return Err(ImageError::InvalidDataLength(data.len(), num_pixels));
        }

        Ok(Self { size, data })
    }

    /// Create a new buffer with every pixel set to `val`.
    ///
    /// # Examples
    ///
    /// ```
    /// use parblur_image::{ImageSize, PixelBuffer};
    ///
    /// let buffer = PixelBuffer::from_size_val([4, 3].into(), 0xff000000).unwrap();
    /// assert_eq!(buffer.as_slice().len(), 12);
    /// ```
    pub fn from_size_val(size: ImageSize, val: u32) -> Result<Self, ImageError> {
        let data = vec![val; size.num_pixels()?];
        Ok(Self { size, data })
    }

    /// The size of the buffer in pixels.
    #[inline]
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// The number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// The packed pixels as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }

    /// The packed pixels as a mutable slice.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [u32] {
        &mut self.data
    }

    /// Consume the buffer and return its pixels.
    pub fn into_vec(self) -> Vec<u32> {
        self.data
    }

    /// The pixels of row `y`.
    ///
    /// PRECONDITION: `y < height`.
    #[inline]
    pub fn row(&self, y: usize) -> &[u32] {
        let start = y * self.size.width;
        &self.data[start..start + self.size.width]
    }

    /// The mutable pixels of row `y`.
    ///
    /// PRECONDITION: `y < height`.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u32] {
        let start = y * self.size.width;
        &mut self.data[start..start + self.size.width]
    }

    /// Get the packed pixel at column `x`, row `y`.
    pub fn get_pixel(&self, x: usize, y: usize) -> Result<u32, ImageError> {
        if x >= self.size.width || y >= self.size.height {
            return Err(ImageError::PixelIndexOutOfBounds(x, y));
        }
        Ok(self.data[y * self.size.width + x])
    }

    /// Set the packed pixel at column `x`, row `y`.
    pub fn set_pixel(&mut self, x: usize, y: usize, val: u32) -> Result<(), ImageError> {
        if x >= self.size.width || y >= self.size.height {
            return Err(ImageError::PixelIndexOutOfBounds(x, y));
        }
        self.data[y * self.size.width + x] = val;
        Ok(())
    }

    /// Whether `(x, y)` lies on the outer row or column of the buffer.
    #[inline]
    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.size.width || y + 1 == self.size.height
    }

    /// Copy the outer rows and columns of `other` into `self`.
    ///
    /// The interior of `self` is left untouched.
    pub fn copy_border_from(&mut self, other: &PixelBuffer) -> Result<(), ImageError> {
        if self.size != other.size {
            return Err(ImageError::InvalidImageSize(
                self.size.to_string(),
                other.size.to_string(),
            ));
        }

        let (width, height) = (self.size.width, self.size.height);
        if width == 0 || height == 0 {
            return Ok(());
        }

        self.row_mut(0).copy_from_slice(other.row(0));
        self.row_mut(height - 1).copy_from_slice(other.row(height - 1));
        for y in 1..height.saturating_sub(1) {
            let offset = y * width;
            self.data[offset] = other.data[offset];
            self.data[offset + width - 1] = other.data[offset + width - 1];
        }

        Ok(())
    }
}
