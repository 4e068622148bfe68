use clap::{Parser, Subcommand};
use rust_iris::tools::{gray_stats, load_gray, read_record, write_record};
use rust_iris::{IrisRecognizer, MatchParams, RecognizerConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "iristool", version, about = "rust_iris CLI tools")]
struct Cli {
    /// JSON config file; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Locate pupil and iris circles in an eye image
    Boundaries {
        #[arg(long)]
        image: PathBuf,
    },
    /// Extract an iris record and write it as JSON
    Extract {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Compare two extracted records
    Compare {
        #[arg(long)]
        a: PathBuf,
        #[arg(long)]
        b: PathBuf,
        #[arg(long)]
        dratio: Option<f32>,
        #[arg(long)]
        stdev_angle: Option<f64>,
        #[arg(long)]
        stdev_dist: Option<f64>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load config: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Boundaries { image } => boundaries_cmd(config, &image),
        Command::Extract { image, out, seed } => extract_cmd(config, &image, &out, seed),
        Command::Compare {
            a,
            b,
            dratio,
            stdev_angle,
            stdev_dist,
        } => {
            let defaults = config.matching;
            let params = MatchParams {
                dratio: dratio.unwrap_or(defaults.dratio),
                stdev_angle: stdev_angle.unwrap_or(defaults.stdev_angle),
                stdev_dist: stdev_dist.unwrap_or(defaults.stdev_dist),
            };
            compare_cmd(config, &a, &b, &params)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> rust_iris::Result<RecognizerConfig> {
    let config = match path {
        Some(path) => RecognizerConfig::from_json_file(path)?,
        None => RecognizerConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn boundaries_cmd(config: RecognizerConfig, image: &Path) -> rust_iris::Result<()> {
    let gray = load_gray(image)?;
    let stats = gray_stats(&gray);
    println!("Image: {} ({}x{})", image.display(), gray.width(), gray.height());
    println!("Grayscale range: {}-{}, average: {}", stats.min, stats.max, stats.avg);

    let start = Instant::now();
    let (pupil, ext) = IrisRecognizer::new(config).find_boundaries(&gray)?;
    println!("Pupil: {}", pupil);
    println!("Iris:  {}", ext);
    println!("Elapsed: {:.2?}", start.elapsed());
    Ok(())
}

fn extract_cmd(mut config: RecognizerConfig, image: &Path, out: &Path, seed: Option<u64>) -> rust_iris::Result<()> {
    if let Some(seed) = seed {
        config.seed = seed;
    }
    let gray = load_gray(image)?;
    let start = Instant::now();
    let record = IrisRecognizer::new(config).extract(&gray)?;
    write_record(out, &record)?;

    println!("Image: {} ({}x{})", image.display(), gray.width(), gray.height());
    println!("Pupil: {}  Iris: {}", record.pupil_circle, record.ext_circle);
    for region in &record.regions {
        println!("  {}: {} keypoints", region.name, region.keypoints.len());
    }
    println!(
        "kp_len={} kp_filtered_len={} desc_len={}",
        record.metadata.kp_len, record.metadata.kp_filtered_len, record.metadata.desc_len
    );
    println!("Wrote {} in {:.2?}", out.display(), start.elapsed());
    Ok(())
}

fn compare_cmd(config: RecognizerConfig, a: &Path, b: &Path, params: &MatchParams) -> rust_iris::Result<()> {
    let (ra, rb) = (read_record(a)?, read_record(b)?);
    let result = IrisRecognizer::new(config).compare_with(&ra, &rb, params)?;
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
