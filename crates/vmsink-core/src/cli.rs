//! Command-line interface definition.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use vmsink_config::SinkConfig;

use crate::logging::{LogFormat, LogOptions};

/// Default substreams output module.
pub const DEFAULT_MODULE_NAME: &str = "prom_out";

#[derive(Parser, Debug)]
#[command(name = "vmsink")]
#[command(about = "Sink block-stream metrics into VictoriaMetrics or partitioned CSV files")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Default)]
pub struct GlobalOpts {
    /// Path to config file (overrides VMSINK_CONFIG and the platform default)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl GlobalOpts {
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            verbose: self.verbose,
            quiet: self.quiet,
            format: self.log_format,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Forward sampled metrics straight to VictoriaMetrics
    Run(RunArgs),

    /// CSV export and import
    Csv {
        #[command(subcommand)]
        command: CsvCommands,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum CsvCommands {
    /// Sample metrics into partitioned CSV files
    Export(ExportArgs),

    /// Upload CSV files through the CSV import endpoint
    Import(ImportArgs),
}

/// Tick stream input.
#[derive(Args, Debug, Default)]
pub struct TickArgs {
    /// JSON-lines tick stream (`-` or absent reads stdin)
    #[arg(long)]
    pub ticks: Option<PathBuf>,
}

/// Metrics database endpoint.
#[derive(Args, Debug, Default)]
pub struct EndpointArgs {
    /// VictoriaMetrics address to connect to
    #[arg(short = 'a', long)]
    pub address: Option<String>,

    /// VictoriaMetrics port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,
}

/// Package manifest used to derive the content hash.
#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Substreams package the ticks were produced by
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Output module name
    #[arg(long, default_value = DEFAULT_MODULE_NAME)]
    pub module_name: String,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub ticks: TickArgs,

    #[command(flatten)]
    pub endpoint: EndpointArgs,

    /// Scrape interval in seconds
    #[arg(short = 'i', long, allow_negative_numbers = true)]
    pub scrape_interval: Option<i64>,

    /// Labels applied to every metric (key=value, repeatable)
    #[arg(short = 'l', long = "labels", num_args = 1..)]
    pub labels: Vec<String>,

    /// Also forward this process's own `process_*` metrics
    #[arg(long)]
    pub collect_default_metrics: bool,

    #[command(flatten)]
    pub manifest: ManifestArgs,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub ticks: TickArgs,

    /// Scrape interval in seconds
    #[arg(short = 'i', long, allow_negative_numbers = true)]
    pub scrape_interval: Option<i64>,

    /// Root directory for CSV output
    #[arg(long)]
    pub csv_root: Option<String>,

    /// Blocks per folder
    #[arg(long, allow_negative_numbers = true)]
    pub folder_granular: Option<i64>,

    /// Blocks per file
    #[arg(long, allow_negative_numbers = true)]
    pub file_granular: Option<i64>,

    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Output subdirectory name, instead of hashing the manifest
    #[arg(long)]
    pub module_hash: Option<String>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,

    /// Root directory scanned for CSV files
    #[arg(long)]
    pub csv_root: Option<String>,

    /// Labels added to every imported row (key=value, repeatable)
    #[arg(short = 'l', long = "labels", num_args = 1..)]
    pub labels: Vec<String>,
}

impl EndpointArgs {
    fn apply_to(&self, config: &mut SinkConfig) {
        if let Some(address) = &self.address {
            config.endpoint.address = address.clone();
        }
        if let Some(port) = self.port {
            config.endpoint.port = port;
        }
    }
}

fn apply_labels(labels: &[String], config: &mut SinkConfig) {
    config.labels.extend(labels.iter().cloned());
}

impl RunArgs {
    /// Overlay flags on top of the file configuration.
    pub fn apply_to(&self, config: &mut SinkConfig) {
        self.endpoint.apply_to(config);
        if let Some(interval) = self.scrape_interval {
            config.scrape_interval = interval;
        }
        apply_labels(&self.labels, config);
    }
}

impl ExportArgs {
    pub fn apply_to(&self, config: &mut SinkConfig) {
        if let Some(interval) = self.scrape_interval {
            config.scrape_interval = interval;
        }
        if let Some(root) = &self.csv_root {
            config.csv.root = root.clone();
        }
        if let Some(folder) = self.folder_granular {
            config.csv.folder_granular = folder;
        }
        if let Some(file) = self.file_granular {
            config.csv.file_granular = file;
        }
    }
}

impl ImportArgs {
    pub fn apply_to(&self, config: &mut SinkConfig) {
        self.endpoint.apply_to(config);
        if let Some(root) = &self.csv_root {
            config.csv.root = root.clone();
        }
        apply_labels(&self.labels, config);
    }
}
