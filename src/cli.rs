//! Command-line flags.
//!
//! Every flag is optional; unset values fall back to the config file
//! and then to built-in defaults (see `config.rs`).

use clap::Parser;
use std::path::PathBuf;

/// Studentflow - student score pipeline
///
/// Fetches student records, validates and deduplicates them, encrypts
/// emails, writes JSON/CSV/PNG summaries and relays low scores.
///
/// Examples:
///   studentflow
///   studentflow --output-dir out --threshold 60
///   studentflow --input out/student_data.json --no-relay
///   studentflow --decrypt --input out/student_data.json
///   studentflow --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// URL of the JSON student list
    #[arg(short, long, value_name = "URL", env = "STUDENTFLOW_SOURCE_URL")]
    pub source_url: Option<String>,

    /// Load already-processed records from a .json or .csv file instead of fetching
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory receiving the output files
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Endpoint receiving the low-score batch
    #[arg(long, value_name = "URL", env = "STUDENTFLOW_RELAY_URL")]
    pub relay_url: Option<String>,

    /// Do not post low-score records
    #[arg(long)]
    pub no_relay: bool,

    /// Scores strictly below this value are flagged
    #[arg(long, value_name = "SCORE")]
    pub threshold: Option<f64>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Encryption key as 64 hex characters
    ///
    /// A random key is generated and printed when none is given.
    #[arg(
        short,
        long,
        value_name = "HEX",
        env = "STUDENTFLOW_KEY",
        hide_env_values = true
    )]
    pub key: Option<String>,

    /// Skip rendering the subject chart
    #[arg(long)]
    pub no_chart: bool,

    /// Decrypt the email of one student and exit
    #[arg(long)]
    pub decrypt: bool,

    /// Student id to decrypt (prompted when omitted)
    #[arg(long, value_name = "ID", requires = "decrypt")]
    pub id: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .studentflow.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .studentflow.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.source_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Source URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref url) = self.relay_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Relay URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(threshold) = self.threshold {
            if !threshold.is_finite() {
                return Err("Threshold must be a finite number".to_string());
            }
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            source_url: Some("https://example.com/students.json".to_string()),
            input: None,
            output_dir: None,
            relay_url: None,
            no_relay: false,
            threshold: None,
            timeout: None,
            key: None,
            no_chart: false,
            decrypt: false,
            id: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.source_url = Some("ftp://example.com".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("/nonexistent/student_data.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_decrypt_flags() {
        let args = Args::try_parse_from(["studentflow", "--decrypt", "--id", "7"]).unwrap();
        assert!(args.decrypt);
        assert_eq!(args.id.as_deref(), Some("7"));
        assert!(Args::try_parse_from(["studentflow", "--id", "7"]).is_err());
    }
}
