use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use rbexec_core::config::load_config;
use rbexec_core::{CodeExecutionTool, CodeExecutor, ExecutionRequest, LocalCodeExecutor, Tool};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

#[derive(Parser, Debug)]
#[clap(name = "rbexec", author, version = "0.1.0", about = "Run Ruby snippets with optional gem dependencies")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(
        long,
        short,
        help = "Configuration file (defaults to ./rbexec.yaml when present)"
    )]
    config: Option<PathBuf>,

    #[clap(long, short, help = "Log level; overrides logging.level from the config file")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a snippet and print the JSON result
    Run {
        #[clap(long, conflicts_with = "file", help = "Ruby source to run")]
        code: Option<String>,

        #[clap(long, help = "Read Ruby source from a file (stdin when neither --code nor --file is given)")]
        file: Option<PathBuf>,

        #[clap(long = "package", short = 'p', help = "Gem to install before running (repeatable)")]
        packages: Vec<String>,

        #[clap(long, help = "Install gems into a throwaway directory instead of ~/.gem")]
        isolated: bool,
    },
    /// Invoke the code_exec_ruby tool with raw JSON arguments
    Call {
        #[clap(help = "JSON arguments, e.g. '{\"code\": \"puts 1\"}'")]
        arguments: String,
    },
    /// Print the tool metadata and input schema
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).await?;

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(config.logging.level.as_str())
        .parse()
        .unwrap_or(LevelFilter::Info);
    env_logger::Builder::new().filter_level(level).init();

    let executor = Arc::new(LocalCodeExecutor::new(config)?);

    match cli.command {
        Commands::Run {
            code,
            file,
            packages,
            isolated,
        } => {
            let code = read_source(code, file).await?;
            let request = ExecutionRequest::new(code)
                .with_packages(packages)
                .isolated(isolated);
            let result = executor.execute_code(&request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Call { arguments } => {
            let arguments: serde_json::Value =
                serde_json::from_str(&arguments).context("Tool arguments must be valid JSON")?;
            let tool = CodeExecutionTool::new(executor);
            println!("{}", tool.execute(arguments).await?);
        }
        Commands::Schema => {
            let tool = CodeExecutionTool::new(executor);
            println!("{}", serde_json::to_string_pretty(&tool.metadata())?);
        }
    }

    Ok(())
}

async fn read_source(code: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(code) = code {
        return Ok(code);
    }

    if let Some(file) = file {
        return tokio::fs::read_to_string(&file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()));
    }

    let mut code = String::new();
    tokio::io::stdin()
        .read_to_string(&mut code)
        .await
        .context("Failed to read Ruby source from stdin")?;
    if code.trim().is_empty() {
        bail!("No Ruby source given; use --code, --file, or pipe it on stdin");
    }
    Ok(code)
}
