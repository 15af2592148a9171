use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use papyrus::config::DEFAULT_CONFIG_FILE;
use papyrus::{AgentError, Config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Index research papers and images, search them, and file unsorted papers", long_about = None)]
struct Cli {
    /// Configuration file (optional; defaults apply if missing)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a PDF paper and copy it into its topic directories
    #[command(name = "add_paper")]
    AddPaper {
        /// Path to the PDF
        paper_path: PathBuf,

        /// Comma-separated topics (default: unknown)
        #[arg(long, default_value = "")]
        topics: String,
    },

    /// Search indexed papers by free text
    #[command(name = "search_paper")]
    SearchPaper {
        /// Query text
        query: String,
    },

    /// Move every paper in unknown/ into the category of its nearest indexed paper
    #[command(name = "batch_classify")]
    BatchClassify,

    /// Search images by free text (indexes the image directory on first use)
    #[command(name = "search_image")]
    SearchImage {
        /// Query text
        query: String,
    },
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help().ok();
        println!();
        std::process::exit(1);
    };

    if let Err(err) = run(&cli.config, command) {
        match err.downcast_ref::<AgentError>() {
            Some(agent_err) if agent_err.is_user_input() => {
                println!("⚠️ {}", agent_err);
            }
            _ => {
                eprintln!("❌ {:#}", err);
                std::process::exit(1);
            }
        }
    }
}

fn run(config_path: &std::path::Path, command: Commands) -> Result<()> {
    let config = Config::load(config_path)?;
    config.layout().ensure()?;

    match command {
        Commands::AddPaper { paper_path, topics } => {
            commands::add_paper::execute(&config, &paper_path, &topics)?;
        }
        Commands::SearchPaper { query } => {
            commands::search_paper::execute(&config, &query)?;
        }
        Commands::BatchClassify => {
            commands::batch_classify::execute(&config)?;
        }
        Commands::SearchImage { query } => {
            commands::search_image::execute(&config, &query)?;
        }
    }

    Ok(())
}

/// Log to stderr, filtered by PAPYRUS_LOG (default: warn)
fn init_logging() {
    let filter = EnvFilter::try_from_env("PAPYRUS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subcommand_names() {
        let cli = Cli::try_parse_from(["papyrus", "add_paper", "a.pdf", "--topics", "ml,nlp"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::AddPaper { ref topics, .. }) if topics == "ml,nlp"
        ));
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));

        let cli = Cli::try_parse_from(["papyrus", "batch_classify", "--config", "alt.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::BatchClassify)));
        assert_eq!(cli.config, PathBuf::from("alt.toml"));

        let cli = Cli::try_parse_from(["papyrus"]).unwrap();
        assert!(cli.command.is_none());
    }
}
