//! Command-line interface for shelfmark.
//!
//! Runs the interactive menu shell by default, or a single request per
//! invocation through the subcommands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;

use crate::config::{self, ResolvedConfig};
use crate::core::{Catalog, CatalogStore, Request, Response, Session, TracingSink};

pub mod output;
pub mod shell;

pub use shell::Shell;

/// shelfmark - Single-user library catalog manager
#[derive(Parser, Debug)]
#[command(name = "shelfmark")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog file (overrides the configured path)
    #[arg(long, global = true, env = "SHELFMARK_CATALOG")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Interactive menu (default)
    Shell,

    /// Add a new item
    Add {
        /// Item title
        title: String,

        /// Item author
        author: String,

        /// Unique key (e.g. ISBN)
        key: String,
    },

    /// Issue an available item
    Issue {
        /// Item key
        key: String,
    },

    /// Return an issued item
    Return {
        /// Item key
        key: String,
    },

    /// List all items sorted by title
    List,

    /// Search titles (case-insensitive substring)
    Search {
        /// Part of the title
        text: String,
    },

    /// Show the item with an exact key
    Show {
        /// Item key
        key: String,
    },

    /// Show resolved configuration
    Config,
}

impl Commands {
    /// The session request this command maps to (None for commands that
    /// do not talk to the catalog directly)
    fn request(&self) -> Option<Request> {
        match self.clone() {
            Commands::Add { title, author, key } => Some(Request::AddItem { title, author, key }),
            Commands::Issue { key } => Some(Request::IssueItem { key }),
            Commands::Return { key } => Some(Request::ReturnItem { key }),
            Commands::List => Some(Request::ListAll),
            Commands::Search { text } => Some(Request::SearchByTitle { text }),
            Commands::Show { key } => Some(Request::SearchByKey { key }),
            Commands::Shell | Commands::Config => None,
        }
    }
}

impl Cli {
    /// Global configuration with the command-line catalog override applied
    pub fn resolve_config(&self) -> Result<ResolvedConfig> {
        Ok(config::config()?
            .clone()
            .with_catalog_override(self.catalog.clone()))
    }

    /// Execute the CLI command
    pub async fn execute(self, cfg: ResolvedConfig) -> Result<()> {
        let command = self.command.unwrap_or(Commands::Shell);

        if command == Commands::Config {
            show_config(&cfg);
            return Ok(());
        }

        let store = CatalogStore::new(&cfg.catalog);
        let _lock = store
            .lock()
            .with_context(|| format!("Failed to open catalog: {}", cfg.catalog.display()))?;
        let session = Session::new(Catalog::open(store, TracingSink::shared()).await);

        match command.request() {
            Some(request) => run_once(session, request).await,
            None => run_shell(session).await,
        }
    }
}

/// Interactive menu on stdin/stdout
async fn run_shell(session: Session) -> Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    let output = std::io::stdout();

    Shell::new(session, input, output.lock()).run().await?;
    Ok(())
}

/// Handle one request and print the outcome
async fn run_once(mut session: Session, request: Request) -> Result<()> {
    let listing = request == Request::ListAll;
    let response = session.handle(request).await?;

    match &response {
        Response::Items(items) if listing => println!("{}", output::describe_listing(items)),
        other => println!("{}", output::describe(other)),
    }

    if output::is_failure(&response) {
        anyhow::bail!("Request was not carried out");
    }

    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config(cfg: &ResolvedConfig) {
    println!("Shelfmark Configuration");
    println!("{}", "=".repeat(40));
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:     {}", cfg.home.display());
    println!("  Catalog:  {}", cfg.catalog.display());
    println!(
        "  Log file: {}",
        cfg.log_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(disabled)".to_string())
    );
    println!();
    println!("Log level: {}", cfg.log_level);
}
