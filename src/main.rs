use clap::{Parser, Subcommand};
use downsize::config::{self, Config};
use downsize::imaging::RustBackend;
use downsize::output;
use downsize::policy::CompressionPolicy;
use downsize::process;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "downsize")]
#[command(about = "Shrink oversized JPEG and PNG files to a byte budget, in place")]
#[command(long_about = "\
Shrink oversized JPEG and PNG files to a byte budget, in place

For every file over the target size, a grid of resample scales (and JPEG
qualities) is walked until the first encoding fits. If nothing fits without
going under the minimum width, the smallest allowed setting is used.

  photo.jpg            → overwritten, same format
  photo.jpg.backup     → pristine original, created once, never overwritten

Files already under the target are left untouched.

Run 'downsize gen-config' to generate a documented downsize.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./downsize.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More diagnostics on stderr (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress files in place
    Compress {
        /// JPEG or PNG files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Target size in KiB (overrides config)
        #[arg(long)]
        target_kb: Option<u64>,
        /// Minimum output width in pixels (overrides config)
        #[arg(long)]
        min_width: Option<u32>,
        /// Write a JSON report of every file to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Show the trials each file would get, without encoding anything
    Plan {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        target_kb: Option<u64>,
        #[arg(long)]
        min_width: Option<u32>,
    },
    /// Print a stock downsize.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Compress {
            files,
            target_kb,
            min_width,
            report,
        } => {
            let config = load(cli.config.as_deref(), target_kb, min_width)?;
            init_thread_pool(&config.processing);
            let policy = CompressionPolicy::from_config(&config);

            let candidates = process::candidates_from_paths(files);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result =
                process::process_batch(&candidates, &policy, &config.backup.suffix, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            output::print_summary(&result.summary);

            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(&path, json)?;
            }
            if result.has_failures() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Plan {
            files,
            target_kb,
            min_width,
        } => {
            let config = load(cli.config.as_deref(), target_kb, min_width)?;
            let policy = CompressionPolicy::from_config(&config);
            let backend = RustBackend::new();
            let mut failed = false;
            for path in &files {
                match process::plan_file(&backend, path, &policy) {
                    Ok(plan) => output::print_plan(&plan),
                    Err(e) => {
                        failed = true;
                        println!("{}: {}", path.display(), e);
                    }
                }
            }
            if failed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Load config and apply command-line overrides.
fn load(
    explicit: Option<&Path>,
    target_kb: Option<u64>,
    min_width: Option<u32>,
) -> Result<Config, config::ConfigError> {
    config::load_config(explicit, Path::new("."))?.with_overrides(target_kb, min_width)
}

/// Diagnostics go to stderr so progress output on stdout stays clean.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("downsize={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. The user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
