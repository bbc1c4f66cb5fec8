//! vmsink binary entry point.

use clap::{CommandFactory, Parser};
use tracing::{error, info};
use vmsink_common::Result;
use vmsink_config::{load_config, SinkConfig, ValidatedConfig};
use vmsink_core::cli::{Cli, Commands, CsvCommands, ExportArgs, ImportArgs, RunArgs};
use vmsink_core::exit_codes::ExitCode;
use vmsink_core::logging::init_logging;
use vmsink_core::manifest::{module_hash, output_root, resolve_hash};
use vmsink_core::{
    open_tick_source, ExportPipeline, ForwardPipeline, HttpSink, ImportPipeline, PromRegistry,
};
use vmsink_csv::{PartitionRouter, SampleInterval, Sampler};

fn main() {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "vmsink", &mut std::io::stdout());
        return;
    }

    init_logging(&cli.global.log_options());

    let code = match dispatch(&cli) {
        Ok(()) => ExitCode::Clean,
        Err(e) => {
            let code = ExitCode::from(&e);
            error!(code = e.code(), exit = code.as_i32(), "{}", e);
            code
        }
    };
    std::process::exit(code.as_i32());
}

fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run(args) => run_forward(cli, args),
        Commands::Csv {
            command: CsvCommands::Export(args),
        } => run_export(cli, args),
        Commands::Csv {
            command: CsvCommands::Import(args),
        } => run_import(cli, args),
        Commands::Completions { .. } => Ok(()),
    }
}

/// Load the file configuration, overlay flags, validate.
fn load(cli: &Cli, overlay: impl FnOnce(&mut SinkConfig)) -> Result<ValidatedConfig> {
    let (mut config, source) = load_config(cli.global.config.as_deref())?;
    overlay(&mut config);
    let validated = config.validate()?;
    info!(
        config = ?source.path(),
        host = %validated.host(),
        scrape_interval = validated.scrape_interval.get(),
        "configuration loaded"
    );
    Ok(validated)
}

fn run_forward(cli: &Cli, args: &RunArgs) -> Result<()> {
    let config = load(cli, |c| args.apply_to(c))?;

    let mut registry = PromRegistry::with_common_labels(config.labels.iter())?;
    if let Some(manifest) = &args.manifest.manifest {
        let hash = module_hash(manifest, &args.manifest.module_name)?;
        registry.register_manifest(&hash)?;
    }
    if args.collect_default_metrics {
        registry.register_process_collector()?;
    }

    let mut source = open_tick_source(args.ticks.ticks.as_deref())?;
    let mut pipeline = ForwardPipeline::new(
        Sampler::new(SampleInterval::from(config.scrape_interval)),
        registry,
        HttpSink::new(config.host()),
    );
    pipeline.run(source.as_mut())?;
    Ok(())
}

fn run_export(cli: &Cli, args: &ExportArgs) -> Result<()> {
    let config = load(cli, |c| args.apply_to(c))?;

    let hash = resolve_hash(
        args.module_hash.as_deref(),
        args.manifest.manifest.as_deref(),
        &args.manifest.module_name,
    )?;
    let router = PartitionRouter::with_granularity(
        output_root(&config.csv_root, &hash),
        config.folder_granular,
        config.file_granular,
    );
    info!(module_hash = %hash, root = %router.root().display(), "export output");

    let mut source = open_tick_source(args.ticks.ticks.as_deref())?;
    let mut pipeline = ExportPipeline::new(
        Sampler::new(SampleInterval::from(config.scrape_interval)),
        router,
        PromRegistry::with_manifest(&hash)?,
    );
    pipeline.run(source.as_mut())?;
    Ok(())
}

fn run_import(cli: &Cli, args: &ImportArgs) -> Result<()> {
    let config = load(cli, |c| args.apply_to(c))?;
    let pipeline = ImportPipeline::new(HttpSink::new(config.host()), config.labels.clone());
    pipeline.run(&config.csv_root);
    Ok(())
}
