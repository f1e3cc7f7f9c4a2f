use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::runtime::Runtime;

#[derive(Parser)]
#[command(name = "strand")]
#[command(about = "Strand - A cooperative async-task execution engine", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log filter (overrides config file and env vars)
    #[arg(long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a built-in program to completion and print its result
    Run {
        /// Program name: chain, catch, sleep, yield
        program: String,

        /// Numeric argument (call depth, sleep millis, or yield count)
        #[arg(default_value = "3")]
        n: u64,
    },

    /// Run the in-process benchmark
    Bench {
        /// Number of concurrent threads
        #[arg(long, default_value = "100")]
        threads: usize,

        /// Call-chain depth per thread
        #[arg(long, default_value = "10")]
        depth: u32,

        /// Timer suspensions per thread
        #[arg(long, default_value = "3")]
        suspensions: u32,

        /// Milliseconds each suspension sleeps
        #[arg(long, default_value = "1")]
        sleep_ms: u64,

        /// Benchmark timeout (e.g., "60s", "5m")
        #[arg(long)]
        duration: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

/// Run the CLI with provided arguments (for embedders that need to filter args)
pub async fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli).await
}

/// Internal function that handles CLI commands
async fn run_cli_with_args(cli: Cli) -> Result<()> {
    use crate::config::Config;
    use std::env;

    // Apply CLI overrides to environment before anything reads configuration
    if let Some(config_path) = &cli.config {
        env::set_var("STRAND_CONFIG_PATH", config_path);
    }
    if let Some(log) = &cli.log {
        env::set_var("STRAND_LOG__LEVEL", log);
    }

    // Eagerly initialize before executing any command
    // This ensures config errors are shown immediately, not after command output
    crate::init::InitBuilder::new().init()?;
    let config = Config::load()?;

    match cli.command {
        Commands::Run { program, n } => {
            use crate::executor::val_to_json;
            use crate::programs;

            let program_fn = match program.as_str() {
                "chain" => programs::chain(n as u32),
                "catch" => programs::catch_demo(),
                "sleep" => programs::sleepy(n),
                "yield" => programs::yielding(n as u32),
                _ => {
                    eprintln!(
                        "Unknown program: {}. Must be one of: chain, catch, sleep, yield",
                        program
                    );
                    std::process::exit(1);
                }
            };

            let runtime = Runtime::new(config);
            let outcome = runtime.execute(program_fn).await;
            runtime.shutdown();

            match outcome {
                Ok(value) => {
                    println!("{}", serde_json::to_string_pretty(&val_to_json(&value)?)?);
                }
                Err(err) => {
                    eprintln!("✗ Program failed: {}", err);
                    std::process::exit(1);
                }
            }
        }

        Commands::Bench {
            threads,
            depth,
            suspensions,
            sleep_ms,
            duration,
        } => {
            use crate::benchmark;

            let params = benchmark::BenchmarkParams {
                threads,
                depth,
                suspensions,
                sleep_ms,
                duration,
            };

            benchmark::run_benchmark(params).await?;
        }

        Commands::Config => {
            println!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
