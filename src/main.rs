//! Studentflow - student score pipeline
//!
//! Fetches a list of student records, cleans, validates and deduplicates
//! them, encrypts emails, writes JSON/CSV/PNG summaries and relays
//! low-score records to a remote endpoint.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (no valid records, bad key, decrypt failure, etc.)

mod analysis;
mod cli;
mod config;
mod crypto;
mod decrypt;
mod error;
mod fetch;
mod models;
mod pipeline;
mod relay;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE};
use crypto::FieldCipher;
use fetch::FetchOptions;
use models::{LowScoreReport, StudentRecord};
use pipeline::RecordProcessor;
use relay::LowScoreRelay;
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so `[general] verbose` applies
    let (mut config, config_path) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.log_level(&args));

    info!("Studentflow v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    let outcome = if args.decrypt {
        run_decrypt(&args, &config)
    } else {
        run_pipeline(&args, &config).await
    };

    match outcome {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .studentflow.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the source, relay, output directory and key.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run fetch, process, write and relay. Returns the exit code.
async fn run_pipeline(args: &Args, config: &Config) -> Result<i32> {
    let start_time = Instant::now();

    // Step 1: Get the records
    let (records, low_scores) = match config.source.input.clone() {
        Some(path) => {
            println!("📂 Loading records from {}", path.display());
            let records = fetch::load_records(&path).unwrap_or_else(|e| {
                error!("Failed to load {}: {}", path.display(), e);
                Vec::new()
            });
            (records, Vec::new())
        }
        None => {
            let cipher = build_cipher(config)?;
            let mut processor =
                RecordProcessor::new(cipher).with_threshold(config.relay.threshold);

            println!("📥 Fetching student data: {}", config.source.url);
            let options = FetchOptions {
                timeout_seconds: config.source.timeout_seconds,
                show_progress: !args.quiet,
            };
            let records =
                fetch_and_process(&config.source.url, &options, &mut processor).await;
            (records, processor.take_low_scores())
        }
    };

    if records.is_empty() {
        error!("No valid student data found.");
        return Ok(1);
    }

    // Step 2: Aggregate
    println!("\n📊 Calculating summary metrics...");
    let summary = analysis::calculate_summary_metrics(&records);

    // Step 3: Write outputs
    println!("📝 Writing output files to {}", config.output.dir.display());
    let written = report::write_outputs(
        &config.output.dir,
        &records,
        &summary,
        config.output.chart,
    );

    // Step 4: Relay low scores
    let relayed = if config.relay.enabled {
        relay_low_scores(config, &low_scores).await
    } else {
        debug!(
            "Relay disabled, {} low score records not sent",
            low_scores.len()
        );
        0
    };

    let duration = start_time.elapsed().as_secs_f64();

    println!("\n📋 Run Summary:");
    println!("   Valid records: {}", records.len());
    println!(
        "   Low score records: {} ({} relayed)",
        low_scores.len(),
        relayed
    );
    println!(
        "   Files written: {} | failed: {}",
        written.written.len(),
        written.failed.len()
    );
    println!("   Duration: {:.1}s", duration);
    println!(
        "\n✅ Done! Outputs saved to: {}",
        config.output.dir.display()
    );

    Ok(0)
}

/// Fetch the source document and run it through the processor.
///
/// Any fetch or parse failure is logged and yields no records.
async fn fetch_and_process(
    url: &str,
    options: &FetchOptions,
    processor: &mut RecordProcessor,
) -> Vec<StudentRecord> {
    let raw = match fetch::fetch_json(url, options).await {
        Ok(raw) => raw,
        Err(e) => {
            error!("Error fetching data: {}", e);
            return Vec::new();
        }
    };

    let entries = match pipeline::parse_student_data(raw) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Error parsing student data: {}", e);
            return Vec::new();
        }
    };

    let cleaned = pipeline::clean_records(entries);
    let report = processor.process(cleaned);

    for rejection in &report.rejected {
        debug!("Rejected {}", rejection);
    }
    if !report.rejected.is_empty() {
        warn!("{} student records were rejected", report.rejected.len());
    }
    if report.merged > 0 {
        info!("{} duplicate student records were merged", report.merged);
    }

    report.records
}

async fn relay_low_scores(config: &Config, low_scores: &[LowScoreReport]) -> usize {
    let relay = match LowScoreRelay::new(
        config.relay.url.clone(),
        config.source.timeout_seconds,
    ) {
        Ok(relay) => relay,
        Err(e) => {
            error!("Error creating relay client: {}", e);
            return 0;
        }
    };

    match relay.post_low_scores(low_scores).await {
        Ok(sent) => sent,
        Err(e) => {
            error!("Error posting low score records: {}", e);
            0
        }
    }
}

/// Build the field cipher from the configured key, or a fresh random one.
fn build_cipher(config: &Config) -> Result<FieldCipher> {
    match config.crypto.key {
        Some(ref key) => FieldCipher::from_hex(key).context("Invalid encryption key"),
        None => {
            let cipher = FieldCipher::random();
            println!("🔑 Generated encryption key (keep it to decrypt emails later):");
            println!("   {}", cipher.key_hex());
            Ok(cipher)
        }
    }
}

/// Decrypt and print the email of one student. Returns the exit code.
fn run_decrypt(args: &Args, config: &Config) -> Result<i32> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let id = match args.id {
        Some(ref id) => id.clone(),
        None => decrypt::prompt(&mut input, &mut output, "Student id")?,
    };
    let key = match config.crypto.key {
        Some(ref key) => key.clone(),
        None => decrypt::prompt(&mut input, &mut output, "Encryption key (hex)")?,
    };

    let cipher = FieldCipher::from_hex(&key).context("Invalid encryption key")?;

    let path = config
        .source
        .input
        .clone()
        .unwrap_or_else(|| config.output.dir.join(report::STUDENT_DATA_JSON));
    let records = fetch::load_records(&path)
        .with_context(|| format!("Failed to load records from {}", path.display()))?;

    let email = decrypt::decrypt_email(&records, &id, &cipher)?;
    println!("📧 Student {}: {}", id, email);

    Ok(0)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
/// Returns the path the configuration came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("⚠️  Failed to load config: {:#}", e);
            Ok((Config::default(), None))
        }
    }
}
