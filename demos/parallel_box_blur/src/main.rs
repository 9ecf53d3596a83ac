use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use argh::FromArgs;

use parblur::image::PixelBuffer;
use parblur::imgproc::{
    box_blur_parallel, box_blur_sequential, Decomposition, FilterConfig, LoadPolicy,
};

#[derive(FromArgs, Debug)]
/// Compare the parallel box blur against the sequential one on an image.
struct Args {
    /// path to the source image
    #[argh(option, short = 'i')]
    input: PathBuf,

    /// directory for the filtered images and the report
    #[argh(option, short = 'o', default = "PathBuf::from(\"output\")")]
    output_dir: PathBuf,

    /// largest thread count to try, doubling from 1
    #[argh(option, default = "32")]
    max_threads: usize,

    /// give the first worker twice the rows of the others
    #[argh(switch)]
    unbalanced: bool,

    /// split every row into column tasks on a nested pool
    #[argh(switch)]
    nested: bool,

    /// number of filter passes
    #[argh(option, default = "100")]
    passes: usize,

    /// per-pass wait bound in milliseconds, unbounded if not set
    #[argh(option)]
    wait_ms: Option<u64>,
}

fn sequential_passes(
    src: &PixelBuffer,
    passes: usize,
) -> Result<PixelBuffer, Box<dyn std::error::Error>> {
    let mut src = src.clone();
    let mut dst = PixelBuffer::from_size_val(src.size(), 0)?;
    for _ in 0..passes {
        box_blur_sequential(&src, &mut dst)?;
        std::mem::swap(&mut src, &mut dst);
    }
    Ok(src)
}

fn save(
    buffer: &PixelBuffer,
    dir: &Path,
    prefix: &str,
    file_name: &str,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = dir.join(format!("{prefix}{file_name}"));
    buffer.to_rgb_image()?.save(&path)?;
    Ok(path)
}

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1e3
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let file_name = args
        .input
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or("the input path has no file name")?
        .to_string();
    let stem = args
        .input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("image")
        .to_string();

    let img = image::open(&args.input)?.to_rgba8();
    let src = PixelBuffer::try_from(&img)?;

    std::fs::create_dir_all(&args.output_dir)?;

    let mut report = String::new();
    writeln!(report, "Source image: {}", args.input.display())?;
    writeln!(report, "Image size is {}x{}", src.width(), src.height())?;
    writeln!(report)?;

    println!("Starting sequential image filter.");
    writeln!(report, "Starting sequential image filter.")?;
    let start = Instant::now();
    let expected = sequential_passes(&src, args.passes)?;
    let sequential_time = start.elapsed();
    save(&expected, &args.output_dir, "Filtered", &file_name)?;

    writeln!(
        report,
        "Sequential image filter took {:.0} milliseconds.",
        millis(sequential_time)
    )?;
    writeln!(report, "Output image: Filtered{}", file_name)?;
    writeln!(report)?;
    writeln!(
        report,
        "Available processors: {}",
        std::thread::available_parallelism().map_or(1, |n| n.get())
    )?;

    let load_policy = if args.unbalanced {
        LoadPolicy::Unbalanced
    } else {
        LoadPolicy::Balanced
    };
    let decomposition = if args.nested {
        Decomposition::RowsAndColumns
    } else {
        Decomposition::Rows
    };

    let mut num_threads = 1;
    while num_threads <= args.max_threads {
        writeln!(report)?;
        println!("Starting parallel image filter using {num_threads} threads.");
        writeln!(
            report,
            "Starting parallel image filter using {num_threads} threads."
        )?;

        let mut config = FilterConfig::new()
            .with_num_threads(num_threads)
            .with_load_policy(load_policy)
            .with_decomposition(decomposition)
            .with_passes(args.passes);
        if let Some(wait_ms) = args.wait_ms {
            config = config.with_wait_bound(Duration::from_millis(wait_ms));
        }

        let dst = PixelBuffer::from_size_val(src.size(), 0)?;
        let start = Instant::now();
        let output = box_blur_parallel(src.clone(), dst, &config)?;
        let parallel_time = start.elapsed();

        if output.report.timed_out > 0 {
            log::warn!(
                "{} of {} passes timed out with {} threads",
                output.report.timed_out,
                args.passes,
                num_threads
            );
        }

        let speedup = sequential_time.as_secs_f64() / parallel_time.as_secs_f64();
        let threshold = 0.7 * num_threads as f64;
        let efficiency = if speedup >= threshold {
            format!(" ok (>= {threshold})")
        } else {
            String::new()
        };

        writeln!(
            report,
            "Parallel image filter took {:.0} milliseconds using {} threads.",
            millis(parallel_time),
            num_threads
        )?;
        if output.image == expected {
            writeln!(report, "Output image verified successfully!")?;
        } else {
            log::error!("parallel output with {num_threads} threads differs from the sequential one");
            writeln!(report, "Output image verification failed!")?;
        }
        writeln!(report, "Speedup: {speedup}{efficiency}")?;

        save(&output.image, &args.output_dir, "ParallelFiltered", &file_name)?;
        num_threads *= 2;
    }

    writeln!(report)?;
    writeln!(
        report,
        "Output image (parallel filter): ParallelFiltered{}",
        file_name
    )?;

    let report_path = args.output_dir.join(format!("out{stem}.txt"));
    std::fs::write(&report_path, report)?;
    println!("Report written to {}", report_path.display());

    Ok(())
}
