use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use srsmith::cli::commands::draft::DraftOptions;
use srsmith::cli::ui::Output;
use srsmith::drafting::ArtifactKind;
use srsmith::types::SrsError;

/// Exit code for a refused (rate-limited) call
const EXIT_BUSY: u8 = 2;

#[derive(Parser)]
#[command(name = "srsmith")]
#[command(
    version,
    about = "LLM-assisted drafting of SRS documents, plans, designs and diagrams"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file (overrides global/project layers)")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Draft an artifact with the configured LLM and print the validated JSON
    Draft {
        #[arg(value_enum)]
        artifact: ArtifactKind,
        #[arg(long, short, help = "Read the input from a file", conflicts_with = "text")]
        input: Option<PathBuf>,
        #[arg(long, short, help = "Inline input text")]
        text: Option<String>,
        #[arg(long, help = "Diagram kind: flowchart, sequence, class, state, er")]
        kind: Option<String>,
        #[arg(long, short, help = "Target language (code, translate, review)")]
        language: Option<String>,
        #[arg(long, help = "Source language (translate)")]
        from: Option<String>,
        #[arg(long, help = "SDLC model (plan)")]
        model: Option<String>,
        #[arg(long, help = "Edit instruction (edit)")]
        instruction: Option<String>,
    },

    /// Extract and repair JSON from a saved completion (offline)
    Extract {
        file: PathBuf,
        #[arg(long, short, help = "JSON Schema file to validate against")]
        schema: Option<PathBuf>,
    },

    /// Repair and check a Mermaid diagram (offline)
    Mermaid {
        file: PathBuf,
        #[arg(long, short, help = "Diagram kind: flowchart, sequence, class, state, er")]
        kind: Option<String>,
        #[arg(long, help = "Only check, do not repair")]
        check_only: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json, yaml"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Check that the AI service accepts the configured API key
    Check,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31msrsmith encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<SrsError>() {
            Some(err) => {
                Output::new().failure(err);
                if err.is_busy() {
                    ExitCode::from(EXIT_BUSY)
                } else {
                    ExitCode::FAILURE
                }
            }
            None => {
                eprintln!("\x1b[31mError:\x1b[0m {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    // stdout carries the JSON result; logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Draft {
            artifact,
            input,
            text,
            kind,
            language,
            from,
            model,
            instruction,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(srsmith::cli::commands::draft::run(DraftOptions {
                artifact,
                input,
                text,
                kind,
                language,
                from,
                model,
                instruction,
                config: cli.config,
            }))?;
        }
        Commands::Extract { file, schema } => {
            srsmith::cli::commands::extract::run(&file, schema.as_deref())?;
        }
        Commands::Mermaid {
            file,
            kind,
            check_only,
        } => {
            srsmith::cli::commands::mermaid::run(&file, kind.as_deref(), check_only)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                srsmith::cli::commands::config::show(global, &format, cli.config.as_deref())?;
            }
            ConfigAction::Path => {
                srsmith::cli::commands::config::path()?;
            }
            ConfigAction::Check => {
                let rt = Runtime::new()?;
                rt.block_on(srsmith::cli::commands::config::check(cli.config.as_deref()))?;
            }
            ConfigAction::Init { global, force } => {
                srsmith::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
