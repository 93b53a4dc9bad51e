use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use clap::Parser;
use mandel_core::{FractalSet, PlotArea, SetKind};
use mandel_render::{Colorizer, RenderJob};
use tracing_subscriber::EnvFilter;

/// Plot Mandelbrot and Julia sets to PNG files.
#[derive(Debug, Parser)]
#[command(
    name = "mandel",
    after_help = "Example:\n  mandel -f julia.png --set julia --param=-0.4;0.6 --resolution 800"
)]
struct Args {
    /// Name of the PNG file to generate
    #[arg(short = 'f', long = "file", default_value = "output.png")]
    file: PathBuf,

    /// Name of the set to plot (mandelbrot or julia)
    #[arg(long, default_value = SetKind::MANDELBROT)]
    set: String,

    /// Resolution in pixels per unit
    #[arg(long, default_value_t = 250.0)]
    resolution: f64,

    /// Number of iterations
    #[arg(long = "iter", default_value_t = 80)]
    iterations: u32,

    /// Area to plot ("left;right;bottom;top", e.g. "-1.5;1.5;-1;1"), or "auto"
    #[arg(long, default_value = "auto", allow_hyphen_values = true)]
    area: String,

    /// Plot color, either '#xxxxxx,#xxxxxx' for a bicolor plot or '#xxxxxx..#xxxxxx' for a gradient
    #[arg(long, default_value = "#000000..#ffffff")]
    color: Colorizer,

    /// Extra parameter defining the fractal (e.g. "-0.4;0.6" for a Julia set)
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    param: String,

    /// Custom transformation used instead of `z^2 + c`
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    transformation: String,

    /// Number of worker threads
    #[arg(short = 'j', long = "threads", default_value_t = 4)]
    threads: usize,

    /// Rows claimed by a worker at a time
    #[arg(long, default_value_t = 1)]
    batch: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the set, renders it and writes the PNG.
fn plot(args: &Args) -> Result<&Path, Box<dyn std::error::Error>> {
    let started = Instant::now();

    let set = FractalSet::build(&args.set, &args.transformation, &args.param, args.iterations)?;
    let area = if args.area == "auto" {
        set.default_area()
    } else {
        args.area.parse::<PlotArea>()?
    };
    let size = area.size(args.resolution)?;
    tracing::info!("plotting {} over {:?}", set, area);

    let values = RenderJob::new(&set, area, size)
        .with_threads(args.threads)
        .with_batch(args.batch)
        .render()?;
    let img = args.color.render(size, &values)?;

    tracing::info!("generating output file");
    img.save_with_format(&args.file, image::ImageFormat::Png)?;
    tracing::info!("plot ended in {} ms", started.elapsed().as_millis());
    Ok(args.file.as_path())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match plot(&args) {
        Ok(file) => {
            println!("Result saved in {}", file.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("mandel").chain(line.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let args = args(&[]);
        assert_eq!(args.file, PathBuf::from("output.png"));
        assert_eq!(args.set, "mandelbrot");
        assert_eq!(args.resolution, 250.0);
        assert_eq!(args.iterations, 80);
        assert_eq!(args.area, "auto");
        assert_eq!(args.color, Colorizer::default());
        assert_eq!(args.param, "");
        assert_eq!(args.transformation, "");
        assert_eq!(args.threads, 4);
        assert_eq!(args.batch, 1);
        assert!(!args.verbose);
    }

    #[test]
    fn negative_values_are_not_flags() {
        let args = args(&["--set", "julia", "--param", "-0.4;0.6", "--area", "-1;1;-1;1"]);
        assert_eq!(args.param, "-0.4;0.6");
        assert_eq!(args.area, "-1;1;-1;1");
    }

    #[test]
    fn rejects_bad_color() {
        let parsed = Args::try_parse_from(["mandel", "--color", "red"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn plots_julia_png() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("julia.png");
        let file_arg = file.to_string_lossy().into_owned();
        let args = args(&[
            "-f",
            &file_arg,
            "--set",
            "julia",
            "--param",
            "-0.4;0.6",
            "--resolution",
            "10",
            "-j",
            "3",
        ]);

        assert_eq!(plot(&args).unwrap(), file.as_path());
        let img = image::open(&file).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (30, 20));
    }

    #[test]
    fn custom_transformation_matches_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let builtin = dir.path().join("builtin.png");
        let custom = dir.path().join("custom.png");
        let builtin_arg = builtin.to_string_lossy().into_owned();
        let custom_arg = custom.to_string_lossy().into_owned();

        plot(&args(&["-f", &builtin_arg, "--resolution", "10"])).unwrap();
        plot(&args(&["-f", &custom_arg, "--resolution", "10", "--transformation", "z^2+c"]))
            .unwrap();

        let a = image::open(&builtin).unwrap().to_rgb8();
        let b = image::open(&custom).unwrap().to_rgb8();
        assert_eq!(a, b);
    }

    #[test]
    fn reports_unknown_set() {
        let err = plot(&args(&["--set", "iam_no_set"])).unwrap_err();
        assert_eq!(err.to_string(), "unrecognized set 'iam_no_set'");
    }

    #[test]
    fn reports_oversized_image() {
        let err = plot(&args(&["--resolution", "1e10"])).unwrap_err();
        assert!(err.to_string().contains("too large"), "{}", err);
    }

    #[test]
    fn reports_overly_deep_formula() {
        let formula = vec!["z"; 5000].join("+");
        let err = plot(&args(&["--resolution", "5", "--transformation", &formula])).unwrap_err();
        assert!(err.to_string().contains("levels deep"), "{}", err);
    }

    #[test]
    fn reports_first_worker_fault() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("fault.png");
        let file_arg = file.to_string_lossy().into_owned();
        let err = plot(&args(&[
            "-f",
            &file_arg,
            "--resolution",
            "10",
            "--transformation",
            "z*w+c",
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "no such variable w");
        assert!(!file.exists());
    }
}
