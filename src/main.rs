use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::io::BufRead;
use std::path::PathBuf;
use texbatch::{
    parse_exclusions, Cli, Commands, ConvertConfig, Converter, ImageBackend, IndicatifReporter,
    Layout, RunReport,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    setup_interrupt_handler()?;

    let report = match cli.command {
        Commands::Hdr { root } => process_hdrs(resolve_root(root)?)?,
        Commands::Textures { root, exclude } => {
            process_textures(resolve_root(root)?, &parse_exclusions(&exclude))?
        }
    };

    if !report.success() {
        log::warn!("Some files failed, see messages above");
    }

    if !cli.no_wait {
        wait_for_enter();
    }

    Ok(())
}

/// Ctrl+C ends the run immediately. Originals are only ever replaced by rename.
fn setup_interrupt_handler() -> Result<()> {
    ctrlc::set_handler(|| std::process::exit(0))
        .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = root {
        return Ok(root);
    }

    let exe = std::env::current_exe().context("cannot locate the executable")?;
    exe.parent()
        .map(|dir| dir.to_path_buf())
        .context("executable has no parent directory")
}

fn process_hdrs(root: PathBuf) -> Result<RunReport> {
    let layout = Layout::new(&root);
    log::info!("Processing HDRs in {}", layout.hdr_dir.display());

    let backend = ImageBackend::new();
    let reporter = IndicatifReporter::new();
    let converter = Converter::new(ConvertConfig::default(), &backend, &reporter)?;

    let report = converter
        .run_hdrs(&layout)
        .with_context(|| format!("HDR batch failed in {}", root.display()))?;
    println!("{}", report.summary());

    Ok(report)
}

fn process_textures(root: PathBuf, excluded: &[String]) -> Result<RunReport> {
    log::info!("Processing textures in {}", root.display());
    if !excluded.is_empty() {
        log::info!("Skipping folders: {}", excluded.join(", "));
    }

    let backend = ImageBackend::new();
    let reporter = IndicatifReporter::new();
    let converter = Converter::new(ConvertConfig::default(), &backend, &reporter)?;

    let report = converter
        .run_textures(&root, excluded)
        .with_context(|| format!("texture batch failed in {}", root.display()))?;
    println!("{}", report.summary());

    Ok(report)
}

fn wait_for_enter() {
    println!("Press Enter to exit...");
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);
}
