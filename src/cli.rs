use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// fbimport - import Facebook Page events into the dashboard
#[derive(Debug, Parser)]
#[command(name = "fbimport")]
#[command(about = "Import Facebook Page events into the dashboard", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the config file (defaults to the per-user config dir)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Facebook page whose posts are scanned for events
    #[arg(long, short = 'p')]
    pub page: Option<String>,

    /// Log level filter (error, warn, info, debug, trace)
    #[arg(long = "log-level")]
    pub log_level: Option<String>,
}

/// Commands accepted at the interactive prompt.
#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
pub struct Prompt {
    #[command(subcommand)]
    pub command: PromptCommand,
}

#[derive(Debug, Subcommand)]
pub enum PromptCommand {
    /// Load the first page of candidate events
    Load,
    /// Load the next page of candidate events
    More,
    /// List candidate events
    #[command(alias = "ls")]
    List,
    /// Import a candidate event
    Import { fbid: String },
    /// Delete an imported event
    #[command(alias = "rm")]
    Delete { fbid: String },
    /// Refresh an imported event from Facebook
    Resync { fbid: String },
    /// Tag an event with a category
    Tag { fbid: String, category: u64 },
    /// Remove a category from an event
    Untag { fbid: String, category: u64 },
    /// Reload and list categories
    Categories,
    /// Include already imported events in listings
    ShowImported,
    /// Hide already imported events from listings
    HideImported,
    /// Show the full description of an event
    Expand { fbid: String },
    /// Truncate the description of an event again
    Collapse { fbid: String },
    /// Leave the prompt
    #[command(alias = "quit")]
    Exit,
}

impl Prompt {
    /// Parses one prompt line. `Ok(None)` for blank input.
    pub fn parse_line(line: &str) -> Result<Option<Self>, clap::Error> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return Ok(None);
        }
        Prompt::try_parse_from(words).map(Some)
    }
}
