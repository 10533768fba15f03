//! codejudge CLI
//!
//! A command-line tool and HTTP server for judging code submissions.

use std::io::Read;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codejudge::{
    BackendKind, Config, EXAMPLE_CONFIG, ExecutionRequest, LanguageRegistry, ResourceLimits,
    backend,
};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

mod serve;

/// Exit status for a submission that was judged but did not succeed
const EXIT_FAILED_VERDICT: i32 = 1;

/// Exit status for a request rejected before judging
const EXIT_BAD_REQUEST: i32 = 2;

#[derive(Parser)]
#[command(name = "codejudge")]
#[command(about = "Compile, run and classify untrusted code submissions")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: codejudge.toml)
        #[arg(short, long, default_value = "codejudge.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Run a program (compile if needed, then execute)
    Run {
        /// Source file to run
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language ID (e.g., cpp, python)
        #[arg(short, long)]
        language: String,

        /// Input file fed to the program's stdin (default: empty)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Wall time limit in seconds
        #[arg(short, long)]
        time_limit: Option<f64>,
    },

    /// Read one JSON request from stdin and print the JSON result
    Exec,

    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:3000")]
        listen: SocketAddr,
    },

    /// List available languages
    Languages,

    /// Show effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Init { output, force } = &cli.command {
        return init_config(output, *force).await;
    }

    // Load configuration
    if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
    } else {
        debug!("using default configuration");
    }
    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Run {
            source,
            language,
            input,
            time_limit,
        } => {
            if let Some(secs) = time_limit {
                apply_time_limit(&mut config, secs)?;
            }
            run_file(&config, &source, language, input.as_deref()).await
        }
        Commands::Exec => exec_json(&config).await,
        Commands::Serve { listen } => {
            let backend = backend::from_config(&config).context("failed to build backend")?;
            serve::serve(listen, backend).await
        }
        Commands::Languages => {
            list_languages(&LanguageRegistry::from_config(&config));
            Ok(())
        }
        Commands::ShowConfig => {
            show_config(&config);
            Ok(())
        }
    }
}

/// Override the time limit for every language, locally or on the remote judge
fn apply_time_limit(config: &mut Config, secs: f64) -> Result<()> {
    if !ResourceLimits::is_valid_wall_time(secs) {
        anyhow::bail!("time limit must be a positive number of seconds");
    }
    if let Some(ref mut judge0) = config.judge0 {
        judge0.cpu_time_limit = secs;
    }
    let user_limits = ResourceLimits::unset().with_wall_time_limit(secs);
    config.default_limits = config.default_limits.with_overrides(&user_limits);
    for language in config.languages.values_mut() {
        if let Some(ref mut limits) = language.run.limits {
            *limits = limits.with_overrides(&user_limits);
        }
    }
    Ok(())
}

async fn run_file(
    config: &Config,
    source: &Path,
    language: String,
    input: Option<&Path>,
) -> Result<()> {
    let code = tokio::fs::read_to_string(source)
        .await
        .context("failed to read source file")?;

    let input = match input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .context("failed to read input file")?,
        None => String::new(),
    };

    let backend = backend::from_config(config).context("failed to build backend")?;
    info!(%language, backend = backend.name(), "running program");

    let judgement = backend
        .judge(ExecutionRequest::new(code, language).with_input(input))
        .await;
    let result = judgement.to_result();

    // Log execution info via tracing (stderr), keeping stdout clean for piping
    info!(
        verdict = %judgement.verdict.kind(),
        execution_time_ms = result.execution_time_ms,
        "execution result"
    );

    if let Some(output) = &result.output {
        print!("{output}");
    }
    if let Some(error) = &result.error {
        eprintln!("{error}");
    }

    if judgement.verdict.is_bad_request() {
        std::process::exit(EXIT_BAD_REQUEST);
    }
    if !result.success {
        std::process::exit(EXIT_FAILED_VERDICT);
    }
    Ok(())
}

async fn exec_json(config: &Config) -> Result<()> {
    let mut body = String::new();
    std::io::stdin()
        .read_to_string(&mut body)
        .context("failed to read request from stdin")?;
    let request: ExecutionRequest =
        serde_json::from_str(&body).context("request must be a JSON object")?;

    let backend = backend::from_config(config).context("failed to build backend")?;
    let judgement = backend.judge(request).await;

    println!(
        "{}",
        serde_json::to_string(&judgement.to_result()).context("failed to encode result")?
    );

    if judgement.verdict.is_bad_request() {
        std::process::exit(EXIT_BAD_REQUEST);
    }
    Ok(())
}

fn list_languages(registry: &LanguageRegistry) {
    println!("Available languages:\n");

    for (id, lang) in registry.iter() {
        let lang_type = if lang.is_compiled() {
            "compiled"
        } else {
            "interpreted"
        };
        println!("  {:<15} {} ({})", id, lang.name, lang_type);
    }
}

fn show_config(config: &Config) {
    let backend = match config.backend {
        BackendKind::Local => "local",
        BackendKind::Judge0 => "judge0",
    };
    println!("Backend: {backend}");
    if let Some(ref judge0) = config.judge0 {
        println!("  Judge0 URL: {}", judge0.url);
        println!("  CPU time limit: {}s", judge0.cpu_time_limit);
        println!("  Memory limit: {} KB", judge0.memory_limit);
    }
    println!();
    println!("Scratch root: {}", config.scratch_root().display());
    println!();
    println!("Compile limits:");
    print_limits(&config.compile_limits);
    println!("Default resource limits:");
    print_limits(&config.default_limits);
    println!();
    println!("Languages configured: {}", config.languages.len());
}

fn print_limits(limits: &ResourceLimits) {
    println!("  Wall time limit: {:?} s", limits.wall_time_limit);
    println!("  Max output: {:?} KB", limits.max_output);
}

async fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(())
}
