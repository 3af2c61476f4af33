use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use chrono::Local;
use clap::Parser;
use env_logger::Builder;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, LevelFilter};
use linkent::{
    LinkentConfig,
    CandidateEvaluator,
    CandidatePipeline,
    TantivySearchClient,
    config::subsystems::logging::parse_level,
    entities::load_resolved_identities,
    utils::io::{open_input, open_output},
};

/// Resolve anchor-text phrases to canonical entities using a link index.
#[derive(Parser, Debug)]
#[command(name = "analyze_links", version)]
struct Args {
    /// INI configuration file
    #[arg(default_value = "default.ini")]
    config: PathBuf,

    /// Number of scoring workers (capped by available cores)
    #[arg(long)]
    parallelism: Option<usize>,

    /// Output file, overriding [files] output
    #[arg(long)]
    output: Option<PathBuf>,

    /// error, warn, info, debug, trace or none
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(config: &LinkentConfig, override_level: Option<&str>) -> Result<LevelFilter, Box<dyn std::error::Error>> {
    let log_level = match override_level {
        Some(level) => parse_level(level).unwrap_or_else(|| {
            eprintln!("Invalid log level '{}', defaulting to Info", level);
            LevelFilter::Info
        }),
        None => config.logging.level_filter(),
    };

    let mut builder = Builder::new();
    builder.filter(None, log_level);
    if config.logging.to_file {
        fs::create_dir_all(&config.logging.log_dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_file = File::create(config.logging.log_dir.join(format!("analyze_links_{}.log", timestamp)))?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }
    builder.init();
    Ok(log_level)
}

fn progress_bar() -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.green} Computing support: {pos} candidates ({per_sec}) | Elapsed: {elapsed_precise}")
    {
        progress.set_style(style);
    }
    progress.enable_steady_tick(Duration::from_millis(200));
    progress
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let start_time = Instant::now();

    let mut config = LinkentConfig::from_ini(&args.config)?;
    if let Some(parallelism) = args.parallelism {
        config.pipeline.parallelism = parallelism;
    }
    if let Some(output) = args.output {
        config.files.output = output;
    }
    // Overrides bypass the checks from_ini ran, including creating the output directory.
    config.validate()?;

    let log_level = init_logging(&config, args.log_level.as_deref())?;
    if log_level != LevelFilter::Off {
        info!("Starting link analysis with log level: {:?}", log_level);
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::Relaxed);
        })?;
    }

    let identities = load_resolved_identities(
        &config.files.wikidata,
        &config.files.redirects,
        config.analyzer.interner_capacity,
    )?;
    let index = TantivySearchClient::open(&config.files.index_dir)?;

    let evaluator = CandidateEvaluator::new(index, Arc::new(identities), config.analyzer.clone());
    let pipeline = CandidatePipeline::new(evaluator, &config.pipeline)
        .with_progress(progress_bar())
        .with_interrupt(Arc::clone(&interrupted));

    info!("Reading candidates from {:?}, writing to {:?}", config.files.linktext, config.files.output);
    let stats = pipeline.run(open_input(&config.files.linktext)?, open_output(&config.files.output)?)?;

    if stats.interrupted {
        warn!("Run was interrupted; output covers the first {} candidates only", stats.read);
    }
    info!(
        "Resolved {} of {} candidates ({} dead, {} failed, {} lost, {} skipped) in {:?}",
        stats.resolved, stats.read, stats.dead, stats.failed, stats.lost, stats.skipped,
        start_time.elapsed()
    );
    Ok(())
}
