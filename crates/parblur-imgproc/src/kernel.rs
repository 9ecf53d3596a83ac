use parblur_image::{Argb, ImageError, PixelBuffer};

use crate::partition::WorkItem;

/// A per-pixel filter evaluated over the neighborhood of an interior pixel.
///
/// Implementations read only from `src` and must be callable from many threads at once.
pub trait PixelKernel: Send + Sync {
    /// Compute the output pixel at `(row, col)`.
    ///
    /// PRECONDITION: `1 <= row <= height - 2` and `1 <= col <= width - 2`.
    fn apply(&self, src: &PixelBuffer, row: usize, col: usize) -> u32;
}

/// Average of the 3x3 neighborhood, per color channel, with opaque alpha.
///
/// The mean is truncated toward zero and the source alpha is ignored.
///
/// # Examples
///
/// ```
/// use parblur_image::PixelBuffer;
/// use parblur_imgproc::kernel::{BoxBlur3x3, PixelKernel};
///
/// let src = PixelBuffer::from_size_val([3, 3].into(), 0x00090909).unwrap();
/// assert_eq!(BoxBlur3x3.apply(&src, 1, 1), 0xff090909);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxBlur3x3;

impl PixelKernel for BoxBlur3x3 {
    #[inline]
    fn apply(&self, src: &PixelBuffer, row: usize, col: usize) -> u32 {
        let width = src.width();
        let data = src.as_slice();

        let (mut r, mut g, mut b) = (0u32, 0u32, 0u32);
        for k in row - 1..=row + 1 {
            let center = k * width + col;
            for &px in &data[center - 1..=center + 1] {
                let px = Argb(px);
                r += px.red() as u32;
                g += px.green() as u32;
                b += px.blue() as u32;
            }
        }

        Argb::opaque((r / 9) as u8, (g / 9) as u8, (b / 9) as u8).0
    }
}

/// The filtered pixels of one work item, row after row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    item: WorkItem,
    pixels: Vec<u32>,
}

impl Tile {
    /// Run `kernel` over every pixel of `item`.
    pub fn compute<K: PixelKernel + ?Sized>(kernel: &K, src: &PixelBuffer, item: WorkItem) -> Self {
        let cols = item.cols(src.width());
        let mut pixels = Vec::with_capacity(item.num_pixels(src.width()));
        for row in item.rows().iter() {
            pixels.extend(cols.iter().map(|col| kernel.apply(src, row, col)));
        }
        Self { item, pixels }
    }

    /// The work item the tile was computed for.
    pub fn item(&self) -> WorkItem {
        self.item
    }

    /// Copy the tile into its place in `dst`.
    ///
    /// PRECONDITION: `dst` has the size of the buffer the tile was computed from.
    pub fn write_into(&self, dst: &mut PixelBuffer) {
        let cols = self.item.cols(dst.width());
        if cols.is_empty() {
            return;
        }
        for (row, pixels) in self
            .item
            .rows()
            .iter()
            .zip(self.pixels.chunks_exact(cols.len()))
        {
            dst.row_mut(row)[cols.start..cols.end].copy_from_slice(pixels);
        }
    }
}

/// Blur every interior pixel of `src` into `dst` on the calling thread.
///
/// Border pixels of `dst` are left untouched.
///
/// # Arguments
///
/// * `src` - The source buffer.
/// * `dst` - The destination buffer, same size as `src`.
///
/// # Examples
///
/// ```
/// use parblur_image::PixelBuffer;
/// use parblur_imgproc::kernel::box_blur_sequential;
///
/// let src = PixelBuffer::from_size_val([5, 5].into(), 0xFF102030).unwrap();
/// let mut dst = PixelBuffer::from_size_val([5, 5].into(), 0).unwrap();
/// box_blur_sequential(&src, &mut dst).unwrap();
/// assert_eq!(dst.get_pixel(2, 2).unwrap(), 0xFF102030);
/// assert_eq!(dst.get_pixel(0, 0).unwrap(), 0);
/// ```
pub fn box_blur_sequential(src: &PixelBuffer, dst: &mut PixelBuffer) -> Result<(), ImageError> {
    filter_sequential(&BoxBlur3x3, src, dst)
}

/// Run `kernel` over every interior pixel of `src` into `dst` on the calling thread.
pub fn filter_sequential<K: PixelKernel + ?Sized>(
    kernel: &K,
    src: &PixelBuffer,
    dst: &mut PixelBuffer,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.size().to_string(),
            dst.size().to_string(),
        ));
    }

    let (width, height) = (src.width(), src.height());
    if !src.size().has_interior() {
        return Ok(());
    }

    for row in 1..height - 1 {
        let dst_row = &mut dst.row_mut(row)[1..width - 1];
        for (col, px) in (1..).zip(dst_row.iter_mut()) {
            *px = kernel.apply(src, row, col);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::Span;
    use parblur_image::ImageSize;

    #[test]
    fn uniform_is_fixed_point() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 5,
            height: 5,
        };
        let src = PixelBuffer::from_size_val(size, 0xFF102030)?;
        assert_eq!(BoxBlur3x3.apply(&src, 2, 2), 0xFF102030);

        let mut dst = PixelBuffer::from_size_val(size, 0)?;
        box_blur_sequential(&src, &mut dst)?;
        for y in 0..5 {
            for x in 0..5 {
                let expected = if dst.is_border(x, y) { 0 } else { 0xFF102030 };
                assert_eq!(dst.get_pixel(x, y)?, expected);
            }
        }

        Ok(())
    }

    #[test]
    fn mean_truncates_and_forces_alpha() -> Result<(), ImageError> {
        // a single bright red pixel in the middle, transparent black around
        let mut src = PixelBuffer::from_size_val([3, 3].into(), 0)?;
        src.set_pixel(1, 1, 0x00ff_0a11)?;
        // 255 / 9 = 28, 10 / 9 = 1, 17 / 9 = 1
        assert_eq!(BoxBlur3x3.apply(&src, 1, 1), 0xff1c_0101);

        Ok(())
    }

    #[test]
    fn channels_do_not_bleed() -> Result<(), ImageError> {
        let src = PixelBuffer::from_size_val([3, 3].into(), 0xffff_ffff)?;
        assert_eq!(BoxBlur3x3.apply(&src, 1, 1), 0xffff_ffff);

        Ok(())
    }

    #[test]
    fn neighborhood_is_3x3() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let data = vec![
            0, 0, 0, 0, 90,
            9, 9, 9, 0, 90,
            9, 9, 9, 0, 90,
            9, 9, 9, 0, 90,
        ];
        let src = PixelBuffer::new([5, 4].into(), data)?;
        assert_eq!(BoxBlur3x3.apply(&src, 2, 1), 0xff00_0009);
        assert_eq!(BoxBlur3x3.apply(&src, 1, 1), 0xff00_0006);
        assert_eq!(BoxBlur3x3.apply(&src, 2, 3), 0xff00_0021);

        Ok(())
    }

    #[test]
    fn tile_matches_sequential() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 6,
            height: 5,
        };
        let src = PixelBuffer::new(size, (0..30).map(|i| i * 0x0103_0507).collect())?;
        let mut expected = PixelBuffer::from_size_val(size, 0)?;
        box_blur_sequential(&src, &mut expected)?;

        let mut dst = PixelBuffer::from_size_val(size, 0)?;
        Tile::compute(&BoxBlur3x3, &src, WorkItem::Rows(Span::new(1, 3))).write_into(&mut dst);
        let cells = [
            WorkItem::Cells {
                row: 3,
                cols: Span::new(1, 2),
            },
            WorkItem::Cells {
                row: 3,
                cols: Span::new(2, 5),
            },
        ];
        for item in cells {
            let tile = Tile::compute(&BoxBlur3x3, &src, item);
            assert_eq!(tile.item(), item);
            tile.write_into(&mut dst);
        }

        assert_eq!(dst, expected);

        Ok(())
    }

    #[test]
    fn sequential_size_mismatch() -> Result<(), ImageError> {
        let src = PixelBuffer::from_size_val([4, 4].into(), 0)?;
        let mut dst = PixelBuffer::from_size_val([4, 5].into(), 0)?;
        assert!(box_blur_sequential(&src, &mut dst).is_err());

        Ok(())
    }

    #[test]
    fn sequential_without_interior() -> Result<(), ImageError> {
        let src = PixelBuffer::from_size_val([2, 8].into(), 7)?;
        let mut dst = PixelBuffer::from_size_val([2, 8].into(), 1)?;
        box_blur_sequential(&src, &mut dst)?;
        assert!(dst.as_slice().iter().all(|&px| px == 1));

        Ok(())
    }
}
