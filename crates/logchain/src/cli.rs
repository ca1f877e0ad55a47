//! The `logscan` command line.
//!
//! Commands:
//! - logscan [--file <path>] [--full] [--chain] [--no-resync] [--seed <hex>] scan
//! - logscan [--full] [--chain] [--alone] [--seed <hex>] demo

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use logchain_core::{Attr, ChecksumMode, Level, Value};
use logchain_handler::EnricherOptions;
use logchain_verify::{ChainScanner, ScanOptions, ScanOutcome};

use crate::logger::{Logger, LoggerConfig};

/// Verify checksums and chains of logchain JSON logs
#[derive(Parser, Debug)]
#[command(name = "logscan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Input log file (stdin when omitted)
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,

    /// Records carry Full-mode checksums
    #[arg(long, global = true)]
    pub full: bool,

    /// Records are chained
    #[arg(long, global = true)]
    pub chain: bool,

    /// Keep flagging records after a chain break instead of resynchronizing
    #[arg(long, global = true)]
    pub no_resync: bool,

    /// Initial chain value, in hex
    #[arg(long, global = true, value_parser = parse_hex_u16, default_value = "0")]
    pub seed: u16,

    /// Write `logSum` as a separate field (demo)
    #[arg(long, global = true)]
    pub alone: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Verify a log (default)
    Scan,

    /// Write a sample enriched log to stdout
    Demo {
        /// Number of records to emit
        #[arg(long, default_value_t = 8)]
        count: usize,
    },
}

impl Cli {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            mode: ChecksumMode::from_full(self.full),
            chain: self.chain,
            seed: self.seed,
            resync: !self.no_resync,
        }
    }

    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            enricher: EnricherOptions {
                go_id: true,
                log_id: true,
                add_sum: true,
                sum_full: self.full,
                sum_chain: self.chain,
                sum_alone: self.alone,
                ..Default::default()
            },
            seed: self.seed,
            level: Level::DEBUG,
            ..Default::default()
        }
    }
}

fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex seed {s:?}: {e}"))
}

/// Install the stderr subscriber (`RUST_LOG`, default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Run a parsed command line. Returns whether the log was clean.
pub fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command.unwrap_or(Command::Scan) {
        Command::Scan => scan(&cli),
        Command::Demo { count } => {
            demo(&cli, count)?;
            Ok(true)
        }
    }
}

fn scan(cli: &Cli) -> anyhow::Result<bool> {
    let input: Box<dyn Read> = match &cli.file {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("can't open log file {}", path.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    };
    let file = cli
        .file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    tracing::info!(%file, chain = cli.chain, full = cli.full, "start scan");

    let mut scanner = ChainScanner::new(cli.scan_options());
    let report = scanner
        .scan_with(BufReader::new(input), |index, outcome| {
            if let ScanOutcome::Rejected(failure) = outcome {
                tracing::error!(record = index, msg = %failure.partial.message, "record rejected");
            }
        })
        .context("scan aborted")?;

    tracing::info!(
        records = report.records,
        verified = report.verified,
        anomalies = report.anomalies,
        rejected = report.rejected,
        "finish scan"
    );
    Ok(report.is_clean())
}

fn demo(cli: &Cli, count: usize) -> anyhow::Result<()> {
    let logger = Logger::json(io::stdout(), &cli.logger_config())
        .with_source(true)
        .with(vec![Attr::new("app", "logscan")]);

    logger.info("demo started", vec![Attr::new("count", count)])?;
    let request = logger
        .with_group("request")
        .with(vec![Attr::new("method", "GET")]);
    for i in 0..count {
        let attrs = vec![
            Attr::new("seq", i),
            Attr::new("ratio", i as f64 / 3.0),
            Attr::new("tags", vec![Value::from("demo"), Value::from(i % 2 == 0)]),
            Attr::lazy("expensive", move || Value::from(format!("item-{i}"))),
        ];
        match i % 3 {
            0 => request.debug("fetching", attrs)?,
            1 => request.info("served", attrs)?,
            _ => request.warn("slow response", attrs)?,
        }
    }
    logger.notice("demo finished", vec![])?;
    Ok(())
}
