use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use matx_cli::{OutputFormat, Report, build_session, cmd_ast, cmd_check, cmd_run, cmd_tokens, load_options, parse_env_pair};

#[derive(Parser, Debug)]
#[command(name = "matx")]
#[command(about = "Type-checked vector and matrix expressions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Explicit log level, overrides -v and -q
    #[arg(long = "log", value_enum, global = true)]
    log_level: Option<LogLevel>,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    /// Output format for results and diagnostics
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// JSON file with resource limits
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Set an `env` field, e.g. --env time=1.5
    #[arg(long = "env", value_name = "NAME=VALUE", value_parser = parse_env_pair, global = true)]
    env: Vec<(String, f64)>,

    /// JSON object of `env` field values
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a program and print its result
    Run { file: PathBuf },
    /// Analyze a program and print diagnostics
    Check { file: PathBuf },
    /// Print the token stream
    Tokens { file: PathBuf },
    /// Print the parsed statements
    Ast { file: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.verbose, cli.quiet, cli.log_level, cli.log_format) {
        eprintln!("error: {e:#}");
        return ExitCode::from(2);
    }

    match execute(&cli) {
        Ok(report) => {
            print!("{}", report.output);
            let _ = std::io::stdout().flush();
            if report.failed { ExitCode::from(1) } else { ExitCode::SUCCESS }
        }
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn execute(cli: &Cli) -> Result<Report> {
    let options = load_options(cli.config.as_deref())?;
    let session = build_session(options, cli.env_file.as_deref(), &cli.env)?;

    match &cli.command {
        Commands::Run { file } => cmd_run(&session, file, cli.format),
        Commands::Check { file } => cmd_check(&session, file, cli.format),
        Commands::Tokens { file } => cmd_tokens(&session, file, cli.format),
        Commands::Ast { file } => cmd_ast(&session, file, cli.format),
    }
}

fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_level: Option<LogLevel>,
    log_format: LogFormat,
) -> Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // stdout carries results; logs go to stderr
    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(formatter)
                .with(filter)
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(formatter.json())
                .with(filter)
                .try_init()?;
        }
    }

    Ok(())
}
