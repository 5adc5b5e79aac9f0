//! test-allocator CLI - Splits test classes into buckets for parallel CI.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use test_allocator::config::{self, Config, EngineKind};
use test_allocator::orchestrator::Allocator;
use test_allocator::report::ConsoleReporter;

const DEFAULT_CONFIG: &str = "test-allocator.toml";

#[derive(Parser)]
#[command(name = "test-allocator")]
#[command(about = "Split test classes into balanced buckets for parallel CI runners", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate test classes and write the manifest
    Allocate {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Compute the allocation and print it without writing anything
    Plan {
        #[command(flatten)]
        overrides: Overrides,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate configuration file
    Validate,

    /// Initialize a new configuration file
    Init {
        /// Test engine (junit, testng)
        #[arg(short, long, default_value = "junit")]
        engine: String,
    },
}

/// Command-line overrides applied on top of the configuration file.
#[derive(Args)]
struct Overrides {
    /// Test engine (junit, testng)
    #[arg(long)]
    engine: Option<String>,

    /// Maximum methods per packed bucket
    #[arg(long)]
    max_methods: Option<usize>,

    /// Maximum number of parallel runners
    #[arg(long)]
    max_runners: Option<usize>,

    /// Weight classes by method count (true) or as one unit (false)
    #[arg(long)]
    parallel_methods: Option<bool>,

    /// Directory with compiled test classes
    #[arg(long)]
    test_output_dir: Option<PathBuf>,

    /// Classpath element holding test-index metadata (repeatable)
    #[arg(long = "classpath")]
    classpath: Vec<PathBuf>,

    /// Root searched for suite XML files
    #[arg(long)]
    project_root: Option<PathBuf>,

    /// Manifest output path (".json" is appended when missing)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Comma-separated tags to include (junit)
    #[arg(long)]
    include_tags: Option<String>,

    /// Comma-separated tags to exclude (junit)
    #[arg(long)]
    exclude_tags: Option<String>,

    /// Comma-separated suite names (testng)
    #[arg(long)]
    suites: Option<String>,

    /// Skip allocation entirely
    #[arg(long)]
    disable: bool,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        let settings = &mut config.allocator;
        if let Some(engine) = self.engine {
            settings.engine = engine;
        }
        if let Some(max) = self.max_methods {
            settings.max_methods_per_bucket = max;
        }
        if let Some(runners) = self.max_runners {
            settings.max_parallel_runners = runners;
        }
        if let Some(parallel) = self.parallel_methods {
            settings.parallel_methods = parallel;
        }
        if let Some(dir) = self.test_output_dir {
            settings.test_output_dir = dir;
        }
        if !self.classpath.is_empty() {
            settings.classpath = self.classpath;
        }
        if let Some(root) = self.project_root {
            settings.project_root = root;
        }
        if let Some(output) = self.output {
            settings.output = output;
        }
        if self.disable {
            settings.enabled = false;
        }
        if let Some(tags) = self.include_tags {
            config.junit.include_tags = config::parse_list(&tags);
        }
        if let Some(tags) = self.exclude_tags {
            config.junit.exclude_tags = config::parse_list(&tags);
        }
        if let Some(suites) = self.suites {
            config.testng.suites = config::parse_list(&suites);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging; stdout is reserved for command output
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr);
    if std::env::var_os("RUST_LOG").is_some() {
        tracing::subscriber::set_global_default(
            builder.with_env_filter(EnvFilter::from_default_env()).finish(),
        )?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    match cli.command {
        Commands::Allocate { overrides } => allocate(&cli.config, overrides, cli.verbose),
        Commands::Plan { overrides, format } => plan(&cli.config, overrides, &format, cli.verbose),
        Commands::Validate => validate_config(&cli.config),
        Commands::Init { engine } => init_config(&engine),
    }
}

/// Loads the configuration, falling back to defaults when the default
/// config file is absent.
fn load(config_path: &Path, overrides: Overrides) -> Result<Config> {
    let mut config = if config_path.exists() || config_path != Path::new(DEFAULT_CONFIG) {
        let config = config::load_config(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        info!("Loaded configuration from {}", config_path.display());
        config
    } else {
        info!("No {} found, using defaults", DEFAULT_CONFIG);
        Config::default()
    };
    overrides.apply(&mut config);
    Ok(config)
}

fn allocate(config_path: &Path, overrides: Overrides, verbose: bool) -> Result<()> {
    let config = load(config_path, overrides)?;

    match Allocator::new(config)
        .run()
        .context("Test allocation failed")?
    {
        Some(outcome) => ConsoleReporter::new(verbose).report(&outcome),
        None => println!("Test allocation is disabled; nothing written."),
    }

    Ok(())
}

fn plan(config_path: &Path, overrides: Overrides, format: &str, verbose: bool) -> Result<()> {
    let config = load(config_path, overrides)?;
    let outcome = Allocator::new(config)
        .plan()
        .context("Test allocation failed")?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&outcome.manifest)?;
            println!("{}", json);
        }
        _ => ConsoleReporter::new(verbose).report(&outcome),
    }

    Ok(())
}

fn validate_config(config_path: &Path) -> Result<()> {
    match config::load_config(config_path) {
        Ok(config) => {
            let settings = &config.allocator;
            let engine: EngineKind = settings
                .engine
                .parse()
                .with_context(|| format!("Invalid engine in {}", config_path.display()))?;

            println!("Configuration is valid!");
            println!();
            println!("Settings:");
            println!("  Enabled: {}", settings.enabled);
            println!("  Engine: {}", engine);
            println!("  Max methods per bucket: {}", settings.max_methods_per_bucket);
            println!("  Max parallel runners: {}", settings.max_parallel_runners);
            println!("  Parallel methods: {}", settings.parallel_methods);
            println!("  Test output dir: {}", settings.test_output_dir.display());
            println!("  Output: {}", settings.output.display());
            match engine {
                EngineKind::Junit => {
                    println!("  Include tags: {:?}", config.junit.include_tags);
                    println!("  Exclude tags: {:?}", config.junit.exclude_tags);
                }
                EngineKind::Testng => {
                    println!("  Suites: {:?}", config.testng.suites);
                    println!("  Project root: {}", settings.project_root.display());
                }
            }

            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_config(engine: &str) -> Result<()> {
    let engine: EngineKind = match engine.parse() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{}. Use: junit, testng", e);
            std::process::exit(1);
        }
    };

    let engine_config = match engine {
        EngineKind::Junit => {
            r#"[junit]
# Only methods with one of these tags are counted (empty = all)
include_tags = []
# Methods with any of these tags are never counted
exclude_tags = []"#
        }
        EngineKind::Testng => {
            r#"[testng]
# Suite names to allocate, matched against <suite name="..."> in *.xml files
suites = ["regression"]"#
        }
    };

    let config = format!(
        r#"# test-allocator configuration file

[allocator]
enabled = true
engine = "{}"
max_methods_per_bucket = 20
max_parallel_runners = 10
parallel_methods = true
test_output_dir = "target/test-classes"
classpath = ["target/test-classes"]
project_root = "."
output = "target/test-allocation"

{}
"#,
        engine, engine_config
    );

    let path = PathBuf::from(DEFAULT_CONFIG);
    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit manually.",
            DEFAULT_CONFIG
        );
        std::process::exit(1);
    }

    std::fs::write(&path, config)?;
    println!("Created {}", DEFAULT_CONFIG);
    println!();
    println!("Edit the configuration as needed, then run:");
    println!("  test-allocator allocate");

    Ok(())
}
