use parblur_image::{ImageSize, PixelBuffer};
use parblur_imgproc::{
    box_blur_parallel, box_blur_sequential, Decomposition, FilterConfig, FilterError, LoadPolicy,
    PassDriver, PassOutcome,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_buffer(size: ImageSize, seed: u64) -> PixelBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..size.width * size.height).map(|_| rng.random()).collect();
    PixelBuffer::new(size, data).unwrap()
}

fn sequential_passes(src: &PixelBuffer, dst: &PixelBuffer, passes: usize) -> PixelBuffer {
    let (mut src, mut dst) = (src.clone(), dst.clone());
    for _ in 0..passes {
        box_blur_sequential(&src, &mut dst).unwrap();
        std::mem::swap(&mut src, &mut dst);
    }
    src
}

#[test]
fn test_uniform_fixed_point() -> Result<(), FilterError> {
    let size = ImageSize {
        width: 5,
        height: 5,
    };
    let src = PixelBuffer::from_size_val(size, 0xFF102030)?;
    let dst = PixelBuffer::from_size_val(size, 0)?;
    let config = FilterConfig::new().with_num_threads(2).with_passes(1);

    let output = box_blur_parallel(src, dst, &config)?;
    assert_eq!(output.image.get_pixel(2, 2)?, 0xFF102030);

    Ok(())
}

#[test]
fn test_parallel_equals_sequential() -> Result<(), FilterError> {
    let size = ImageSize {
        width: 23,
        height: 19,
    };
    let src = random_buffer(size, 42);
    let dst = random_buffer(size, 7);
    let passes = 3;
    let expected = sequential_passes(&src, &dst, passes);

    for num_threads in [1, 2, 3, 4, 7, 17] {
        for load_policy in [LoadPolicy::Balanced, LoadPolicy::Unbalanced] {
            for decomposition in [Decomposition::Rows, Decomposition::RowsAndColumns] {
                let config = FilterConfig::new()
                    .with_num_threads(num_threads)
                    .with_load_policy(load_policy)
                    .with_decomposition(decomposition)
                    .with_passes(passes);

                let output = box_blur_parallel(src.clone(), dst.clone(), &config)?;
                assert_eq!(output.report.completed, passes);
                assert_eq!(
                    output.image, expected,
                    "threads {num_threads}, {load_policy}, {decomposition:?}"
                );
            }
        }
    }

    Ok(())
}

#[test]
fn test_more_threads_than_rows() -> Result<(), FilterError> {
    let size = ImageSize {
        width: 9,
        height: 4,
    };
    let src = random_buffer(size, 1);
    let expected = sequential_passes(&src, &src, 2);

    for load_policy in [LoadPolicy::Balanced, LoadPolicy::Unbalanced] {
        let config = FilterConfig::new()
            .with_num_threads(6)
            .with_load_policy(load_policy)
            .with_decomposition(Decomposition::RowsAndColumns)
            .with_passes(2);
        let output = box_blur_parallel(src.clone(), src.clone(), &config)?;
        assert_eq!(output.image, expected);
    }

    Ok(())
}

#[test]
fn test_border_untouched() -> Result<(), FilterError> {
    let size = ImageSize {
        width: 12,
        height: 10,
    };
    let src = random_buffer(size, 3);
    let dst = PixelBuffer::from_size_val(size, 0xDEAD_BEEF)?;
    let config = FilterConfig::new()
        .with_num_threads(4)
        .with_load_policy(LoadPolicy::Unbalanced)
        .with_decomposition(Decomposition::RowsAndColumns);

    let mut driver = PassDriver::new(src.clone(), dst)?;
    assert_eq!(driver.run_pass(&config)?, PassOutcome::Completed);

    // the first pass wrote into the sentinel buffer
    let written = driver.latest();
    for y in 0..size.height {
        for x in 0..size.width {
            let px = written.get_pixel(x, y)?;
            if written.is_border(x, y) {
                assert_eq!(px, 0xDEAD_BEEF, "({x}, {y})");
            } else {
                assert_eq!(px >> 24, 0xff, "({x}, {y})");
            }
        }
    }

    // the second pass wrote into the original source
    assert_eq!(driver.run_pass(&config)?, PassOutcome::Completed);
    let written = driver.latest();
    for y in 0..size.height {
        for x in 0..size.width {
            if written.is_border(x, y) {
                assert_eq!(written.get_pixel(x, y)?, src.get_pixel(x, y)?);
            }
        }
    }

    Ok(())
}

#[test]
fn test_single_thread_deterministic() -> Result<(), FilterError> {
    let size = ImageSize {
        width: 31,
        height: 17,
    };
    let src = random_buffer(size, 11);
    let config = FilterConfig::new().with_num_threads(1).with_passes(5);

    let first = box_blur_parallel(src.clone(), src.clone(), &config)?;
    let second = box_blur_parallel(src.clone(), src, &config)?;
    assert_eq!(first, second);

    Ok(())
}

#[test]
fn test_default_passes() -> Result<(), FilterError> {
    let size = ImageSize {
        width: 8,
        height: 8,
    };
    let src = random_buffer(size, 5);
    let mut dst = PixelBuffer::from_size_val(size, 0)?;
    dst.copy_border_from(&src)?;

    let output = box_blur_parallel(src.clone(), dst.clone(), &FilterConfig::new().with_num_threads(3))?;
    assert_eq!(output.report.completed, 100);
    assert_eq!(output.report.timed_out, 0);
    assert_eq!(output.image, sequential_passes(&src, &dst, 100));

    Ok(())
}
