//! CodePrep CLI
//!
//! Command-line interface for running code and managing configuration.

use clap::{Parser, Subcommand};
use codeprep::config::{
    config_path, read_config_snapshot, save_config, validate_config, Config,
};
use codeprep::sandbox::{
    ExecutionRequest, Language, LanguageProfile, LocalExecutor, Orchestrator, ProblemSignature,
    TemplateEngine,
};
use codeprep::{Error, Result, VERSION};
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "codeprep",
    version = VERSION,
    about = "CodePrep - run and grade interview solutions",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a source file
    Run {
        /// Programming language
        language: String,
        /// Source file
        file: PathBuf,
        /// File whose contents are fed to stdin
        #[arg(long)]
        stdin: Option<PathBuf>,
        /// Problem signature (JSON) used to wrap a bare solution
        #[arg(long)]
        problem: Option<PathBuf>,
        /// Skip the judge and run on the local toolchains
        #[arg(long)]
        local_only: bool,
    },

    /// List supported languages and local toolchain availability
    Languages,

    /// Validate the configuration and probe the execution backends
    CheckConfig,

    /// Write a default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,codeprep=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            language,
            file,
            stdin,
            problem,
            local_only,
        } => run_file(&language, &file, stdin.as_deref(), problem.as_deref(), local_only).await,
        Commands::Languages => list_languages(),
        Commands::CheckConfig => check_config().await,
        Commands::InitConfig { force } => init_config(force),
    }
}

/// Run a source file and print the result
async fn run_file(
    language: &str,
    file: &Path,
    stdin: Option<&Path>,
    problem: Option<&Path>,
    local_only: bool,
) -> Result<()> {
    let language: Language = language.parse()?;
    let code = tokio::fs::read_to_string(file).await?;
    let stdin = match stdin {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => String::new(),
    };

    let config = Config::from_env()?;
    let orchestrator = if local_only {
        Orchestrator::new(
            TemplateEngine::new(),
            None,
            Arc::new(LocalExecutor::new(config.local.clone())),
        )
    } else {
        Orchestrator::from_config(&config)?
    };

    let mut request = ExecutionRequest::new(code, language).with_stdin(stdin);
    if let Some(path) = problem {
        let signature: ProblemSignature =
            serde_json::from_str(&tokio::fs::read_to_string(path).await?)?;
        request = request.with_problem(signature);
    }

    println!(
        "{} {} code via {}...\n",
        style("Executing").dim(),
        language,
        if orchestrator.has_sandbox() { "judge" } else { "local toolchain" }
    );

    let result = orchestrator.run(&request).await;
    orchestrator.shutdown().await;

    if !result.stdout.is_empty() {
        println!("{}\n{}", style("Output:").bold(), result.stdout);
    }
    if let Some(compile_output) = &result.compile_output {
        println!("{}\n{}", style("Compiler:").yellow(), compile_output);
    } else if !result.stderr.is_empty() {
        println!("{}\n{}", style("Stderr:").yellow(), result.stderr);
    }

    let status = if result.is_accepted() {
        style(result.description()).green()
    } else {
        style(result.description()).red()
    };
    print!("Status: {} ({})", status, result.backend);
    if let Some(ms) = result.elapsed_ms {
        print!("  Time: {} ms", ms);
    }
    if let Some(kb) = result.memory_kb {
        print!("  Memory: {} KB", kb);
    }
    println!();

    if !result.is_accepted() {
        std::process::exit(1);
    }
    Ok(())
}

/// Print the language table
fn list_languages() -> Result<()> {
    let installed = LocalExecutor::available_toolchains();
    let engine = TemplateEngine::new();

    println!(
        "{:<12} {:>9} {:>8} {:>8}",
        style("LANGUAGE").bold(),
        style("JUDGE ID").bold(),
        style("HARNESS").bold(),
        style("LOCAL").bold()
    );
    for language in Language::ALL {
        let profile = LanguageProfile::for_language(language);
        let harness = if engine.has_harness(language) { "yes" } else { "-" };
        let local = if installed.contains(&language) {
            style("yes").green()
        } else {
            style("missing").dim()
        };
        println!(
            "{:<12} {:>9} {:>8} {:>8}",
            language.to_string(),
            profile.remote_id,
            harness,
            local
        );
    }
    Ok(())
}

/// Validate configuration and report backend health
async fn check_config() -> Result<()> {
    let path = config_path();
    let snapshot = read_config_snapshot(&path);

    println!("Config file: {}", path.display());
    if snapshot.exists {
        for issue in &snapshot.issues {
            println!("  {} {}", style("x").red(), issue);
        }
    } else {
        println!("  {}", style("not found, using defaults").dim());
    }

    let config = Config::from_env()?;
    let validation = validate_config(&config);
    for issue in &validation.errors {
        println!("  {} {}", style("error").red(), issue);
    }
    for issue in &validation.warnings {
        println!("  {} {}", style("warning").yellow(), issue);
    }
    if validation.valid {
        println!("Configuration: {}", style("valid").green());
    } else {
        return Err(Error::Config(format!(
            "{} configuration error(s)",
            validation.errors.len()
        )));
    }

    let orchestrator = Orchestrator::from_config(&config)?;
    if !orchestrator.has_sandbox() {
        println!("Judge: {}", style("not configured").dim());
    }
    for (name, healthy) in orchestrator.health().await {
        let state = if healthy {
            style("ok").green()
        } else {
            style("unavailable").red()
        };
        println!("Backend {}: {}", name, state);
    }

    Ok(())
}

/// Write the default configuration to the config path
fn init_config(force: bool) -> Result<()> {
    let path = config_path();
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    save_config(&Config::default(), &path)?;
    println!("Wrote {}", style(path.display()).green());
    Ok(())
}
