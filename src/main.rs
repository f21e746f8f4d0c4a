//! Stream Summary Agent CLI
//!
//! Windowed statistical summaries over record streams.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stream_summary_agent::{
    activity::create_shared_log_with_persistence,
    config::Config,
    core::EnvelopeBuilder,
    pipeline::{PipelineDriver, Termination},
    sink::{FileSink, OutputFormat, RetryingSink, SummarySink, WriterSink},
    source::{self, InputFormat},
    VERSION,
};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "http")]
use stream_summary_agent::sink::{BlockingHttpSink, HttpSinkConfig};

#[derive(Parser)]
#[command(name = "stream-summary")]
#[command(version = VERSION)]
#[command(about = "Windowed statistical summaries over record streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a stream of records
    Run {
        /// Input file of JSON lines or CSV ("-" for stdin)
        #[arg(long, short, default_value = "-")]
        input: String,

        /// Input format (jsonl or csv); detected from the file extension by default
        #[arg(long)]
        input_format: Option<String>,

        /// Records per window
        #[arg(long)]
        window_size: Option<usize>,

        /// Histogram bin count
        #[arg(long)]
        num_bins: Option<usize>,

        /// Lower bound of the histogram range
        #[arg(long, allow_hyphen_values = true)]
        lower_bound: Option<f64>,

        /// Upper bound of the histogram range
        #[arg(long, allow_hyphen_values = true)]
        upper_bound: Option<f64>,

        /// Output directory for summaries
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Output format (json, jsonl or stdout)
        #[arg(long)]
        format: Option<String>,

        /// Summarize the trailing partial window at end of input
        #[arg(long)]
        flush_partial: bool,

        /// Stop on the first failed sink write
        #[arg(long)]
        fail_fast: bool,

        /// Delivery attempts per summary
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Post summaries to this HTTP endpoint (requires http feature)
        #[arg(long)]
        endpoint: Option<String>,

        /// Bearer token for the HTTP endpoint
        #[arg(long)]
        token: Option<String>,
    },

    /// Show cumulative pipeline activity
    Status,

    /// Show the effective configuration
    Config {
        /// Persist the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Output selection after CLI and config are merged.
enum OutputTarget {
    Files(OutputFormat),
    Stdout,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            input_format,
            window_size,
            num_bins,
            lower_bound,
            upper_bound,
            output,
            format,
            flush_partial,
            fail_fast,
            max_attempts,
            endpoint,
            token,
        } => {
            let mut config = load_config();

            if let Some(size) = window_size {
                config.window_size = size;
            }
            if num_bins.is_some() || lower_bound.is_some() || upper_bound.is_some() {
                match stream_summary_agent::BinningConfig::new(
                    num_bins.unwrap_or(config.binning.num_bins()),
                    lower_bound.unwrap_or(config.binning.lower_bound()),
                    upper_bound.unwrap_or(config.binning.upper_bound()),
                ) {
                    Ok(binning) => config.binning = binning,
                    Err(e) => {
                        eprintln!("Error: {e}");
                        std::process::exit(2);
                    }
                }
            }
            if let Some(path) = output {
                config.sink.output_path = path;
            }
            if let Some(attempts) = max_attempts {
                config.sink.max_attempts = attempts;
            }
            config.flush_partial |= flush_partial;
            config.fail_fast |= fail_fast;

            let target = match format.as_deref() {
                None => OutputTarget::Files(config.sink.format),
                Some("stdout") => OutputTarget::Stdout,
                Some(other) => match other.parse::<OutputFormat>() {
                    Ok(format) => {
                        config.sink.format = format;
                        OutputTarget::Files(format)
                    }
                    Err(e) => {
                        eprintln!("Error: {e}");
                        std::process::exit(2);
                    }
                },
            };

            let input_format = match input_format.as_deref() {
                None => InputFormat::detect(&input),
                Some(name) => match name.parse::<InputFormat>() {
                    Ok(format) => format,
                    Err(e) => {
                        eprintln!("Error: {e}");
                        std::process::exit(2);
                    }
                },
            };

            cmd_run(&config, &input, input_format, target, endpoint, token);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Config { save } => {
            cmd_config(save);
        }
    }
}

/// Install the stderr log subscriber, honoring `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file, then environment overrides.
fn load_config() -> Config {
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Could not load config file, using defaults: {}", e);
            Config::default()
        }
    };
    if let Err(e) = config.apply_env() {
        eprintln!("Error: {e}");
        std::process::exit(2);
    }
    config
}

fn cmd_run(
    config: &Config,
    input: &str,
    input_format: InputFormat,
    target: OutputTarget,
    endpoint: Option<String>,
    token: Option<String>,
) {
    let pipeline_config = match config.pipeline_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = config.ensure_directories() {
        tracing::warn!("Could not create data directory: {}", e);
    }

    let source = match source::open(input, input_format) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error opening {input}: {e}");
            std::process::exit(1);
        }
    };

    let envelopes = EnvelopeBuilder::new();
    tracing::info!("Instance ID: {}", envelopes.instance_id());

    let sink = match build_sink(config, target, endpoint, token, envelopes) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("Error creating sink: {e}");
            std::process::exit(1);
        }
    };

    let activity = create_shared_log_with_persistence(config.activity_path());

    // First Ctrl+C finishes the window in flight, a second one exits
    let stop = Arc::new(AtomicBool::new(false));
    ctrlc_handler(stop.clone());

    let mut driver = PipelineDriver::new(pipeline_config, source, sink)
        .with_stop_signal(stop)
        .with_activity_log(activity.clone());

    let result = driver.run();

    if let Err(e) = activity.save() {
        tracing::warn!("Could not save activity log: {}", e);
    }

    match result {
        Ok(report) => {
            if report.termination == Termination::Stopped {
                eprintln!("Stopped on request.");
            }
            eprintln!();
            eprintln!(
                "Run complete: {} records read, {} rejected, {} summaries emitted, {} windows dropped, {} sink failures",
                report.records_read,
                report.records_rejected,
                report.summaries_emitted,
                report.windows_failed,
                report.sink_failures
            );
            eprintln!("{}", activity.summary());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn build_sink(
    config: &Config,
    target: OutputTarget,
    endpoint: Option<String>,
    token: Option<String>,
    envelopes: EnvelopeBuilder,
) -> Result<Box<dyn SummarySink>, stream_summary_agent::SinkError> {
    let sink: Box<dyn SummarySink> = match (endpoint, target) {
        #[cfg(feature = "http")]
        (Some(endpoint), _) => {
            let mut http = HttpSinkConfig::new(endpoint);
            if let Some(token) = token {
                http = http.with_token(token);
            }
            let sink = BlockingHttpSink::new(http, envelopes)?;
            match sink.test_connection() {
                Ok(true) => tracing::info!("Collector connection: OK"),
                Ok(false) => tracing::warn!("Collector health check failed"),
                Err(e) => tracing::warn!("Could not reach collector: {}", e),
            }
            Box::new(sink)
        }
        #[cfg(not(feature = "http"))]
        (Some(_), target) => {
            let _ = token;
            tracing::warn!("--endpoint ignored (http feature not enabled at compile time)");
            file_or_stdout(config, target, envelopes)?
        }
        (None, target) => file_or_stdout(config, target, envelopes)?,
    };

    if config.sink.max_attempts > 1 {
        Ok(Box::new(RetryingSink::new(sink, config.sink.retry_policy())))
    } else {
        Ok(sink)
    }
}

fn file_or_stdout(
    config: &Config,
    target: OutputTarget,
    envelopes: EnvelopeBuilder,
) -> Result<Box<dyn SummarySink>, stream_summary_agent::SinkError> {
    Ok(match target {
        OutputTarget::Stdout => Box::new(WriterSink::stdout(envelopes)),
        OutputTarget::Files(format) => {
            let sink = FileSink::new(&config.sink.output_path, format, envelopes)?;
            tracing::info!("Writing summaries to {:?}", sink.directory());
            Box::new(sink)
        }
    })
}

fn cmd_status() {
    let config = load_config();

    println!("Stream Summary Agent Status");
    println!("===========================");
    println!();

    println!("Configuration:");
    println!("  Window size: {} records", config.window_size);
    println!(
        "  Histogram: {} bins over [{}, {}]",
        config.binning.num_bins(),
        config.binning.lower_bound(),
        config.binning.upper_bound()
    );
    println!("  Output: {:?}", config.sink.output_path);
    println!();

    let stats_path = config.activity_path();
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                for key in [
                    "records_read",
                    "records_rejected",
                    "windows_sealed",
                    "windows_failed",
                    "summaries_emitted",
                    "sink_failures",
                ] {
                    if let Some(value) = stats.get(key) {
                        println!("  {}: {value}", key.replace('_', " "));
                    }
                }
            }
        }
    } else {
        println!("No previous run data found.");
    }
}

fn cmd_config(save: bool) {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );

    if save {
        if let Err(e) = config.save() {
            eprintln!("Error saving config: {e}");
            std::process::exit(1);
        }
        println!();
        println!("Saved.");
    }
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(stopping: Arc<AtomicBool>) {
    let result = ctrlc::set_handler(move || {
        if stopping.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        eprintln!("Stopping after the current window (Ctrl+C again to exit now)...");
    });
    if let Err(e) = result {
        tracing::warn!("Could not install Ctrl+C handler: {}", e);
    }
}
