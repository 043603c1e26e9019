//! scanreq CLI - find unused packages in a Python requirements file.
//!
//! Reads the requirements manifest, maps each package to the modules it
//! installs and reports the packages whose modules never appear in the
//! project tree.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use scanreq_core::{
    init_structured_logging, load_config, log_error, log_info, print_json, scan_with,
    write_output, DistributionSource, FileConfig, PythonInterpreter, ScanConfig, ScanStrategy,
    Scanreq, SitePackages,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Scan for unused Python packages.")]
pub struct Cli {
    /// Path to the requirements.txt file to read packages from
    #[arg(short, long, default_value = "requirements.txt")]
    requirements: PathBuf,

    /// Project path to scan for unused packages
    #[arg(short, long, default_value = ".")]
    path: PathBuf,

    /// Path to the output file where unused packages will be saved
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Comma-separated package names to ignore
    #[arg(short, long, value_delimiter = ',')]
    ignored_packages: Vec<String>,

    /// Python interpreter used to list installed distributions
    #[arg(long)]
    python: Option<String>,

    /// Read *.dist-info metadata from these site-packages directories instead of running Python
    #[arg(long, value_name = "DIR")]
    site_packages: Vec<PathBuf>,

    /// Directory names to skip while scanning
    #[arg(long, value_name = "NAME")]
    exclude_dir: Vec<String>,

    /// Walk the project once per module instead of once overall
    #[arg(long)]
    per_module_scan: bool,

    /// Print a JSON summary instead of the plain report
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// User-supplied ignore names with blank items removed.
    fn ignored(&self) -> impl Iterator<Item = &str> {
        self.ignored_packages
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    fn strategy(&self) -> ScanStrategy {
        if self.per_module_scan {
            ScanStrategy::PerModule
        } else {
            ScanStrategy::SinglePass
        }
    }

    /// Layers: defaults, then `scanreq.toml`, then flags.
    fn scan_config(&self, file_config: &FileConfig) -> ScanConfig {
        ScanConfig::default()
            .merge_file(file_config)
            .with_ignored(self.ignored())
            .with_exclude_dirs(self.exclude_dir.iter().cloned())
            // stdout carries the JSON document; read failures go to the log only
            .with_echo_read_errors(!self.json)
    }
}

/// Picks the distribution source: explicit site-packages first, then an interpreter.
fn distribution_source(
    site_packages: Vec<PathBuf>,
    python: Option<String>,
) -> Box<dyn DistributionSource> {
    if site_packages.is_empty() {
        match python {
            Some(program) => Box::new(PythonInterpreter::new(program)),
            None => Box::new(PythonInterpreter::default()),
        }
    } else {
        Box::new(SitePackages::new(site_packages))
    }
}

fn run(cli: Cli) -> Result<()> {
    // 1. Configuration
    let file_config = load_config(&cli.path)
        .with_context(|| format!("Failed to load configuration from {}", cli.path.display()))?
        .unwrap_or_default();
    let config = cli.scan_config(&file_config);

    let mut site_packages = file_config.site_packages.clone().unwrap_or_default();
    site_packages.extend(cli.site_packages.iter().cloned());
    let python = cli.python.clone().or(file_config.python.clone());
    let source = distribution_source(site_packages, python);

    log_info(&format!(
        "scanning {} against {}",
        cli.path.display(),
        cli.requirements.display()
    ));

    // 2. Scan and report
    let scanreq = Scanreq::new(&cli.requirements, &cli.path)
        .config(config)
        .strategy(cli.strategy());

    if !cli.json {
        // Unlocked handle: scan workers print read failures to stdout concurrently.
        let mut stdout = std::io::stdout();
        scan_with(&scanreq, &*source, cli.output.as_deref(), &mut stdout)?;
        return Ok(());
    }

    let result = scanreq.analyze(&*source)?;
    print_json(&result);

    if let Some(output) = &cli.output {
        write_output(output, &result.unused)
            .with_context(|| format!("Failed to write {}", output.display()))?;
    }

    Ok(())
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] scanreq internal error: {}", info);
    }));

    // JSON logs to stderr, filtered by RUST_LOG
    init_structured_logging();

    let cli = Cli::parse();
    run(cli).inspect_err(|e| log_error(&format!("{:#}", e)))
}
