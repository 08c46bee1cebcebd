//! CLI argument definitions using clap derive

use crate::store::{NewRecord, Priority, RecordPatch};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// todocache - task records with a cached dataset read path
///
/// Manages an in-memory list of todos and serves a large external
/// dataset through a cache-aside layer.
#[derive(Parser, Debug)]
#[command(name = "todocache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TODOCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "table")]
    pub format: OutputFormat,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Request(Request),

    /// Read requests line by line from stdin against one long-lived store
    Shell,

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Operations served by the resource service
#[derive(Subcommand, Debug, Clone)]
pub enum Request {
    /// List todos in insertion order
    List(ListArgs),

    /// Show one todo
    Get(IdArgs),

    /// Create a todo and print its id
    Create(CreateArgs),

    /// Update some fields of a todo
    Update(UpdateArgs),

    /// Delete a todo
    Delete(IdArgs),

    /// Fetch the external dataset through the cache
    Dataset(DatasetArgs),
}

/// Arguments for the list command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Only show the first N todos (0 or negative shows all)
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub limit: Option<i64>,
}

/// A todo id
#[derive(Parser, Debug, Clone)]
pub struct IdArgs {
    /// Todo id
    pub id: u64,
}

/// Arguments for the create command
#[derive(Parser, Debug, Clone)]
pub struct CreateArgs {
    /// Name (3 to 100 characters)
    pub name: String,

    /// Description
    pub description: String,

    /// Priority: high, medium or low
    #[arg(short, long, default_value = "low", value_parser = parse_priority)]
    pub priority: Priority,
}

impl CreateArgs {
    pub fn into_new_record(self) -> NewRecord {
        NewRecord::new(self.name, self.description).with_priority(self.priority)
    }
}

/// Arguments for the update command
#[derive(Parser, Debug, Clone)]
pub struct UpdateArgs {
    /// Todo id
    pub id: u64,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,

    /// New priority: high, medium or low
    #[arg(short, long, value_parser = parse_priority)]
    pub priority: Option<Priority>,
}

impl UpdateArgs {
    /// Split into the id and a patch holding only the flags that were given
    pub fn into_patch(self) -> (u64, RecordPatch) {
        (
            self.id,
            RecordPatch {
                name: self.name,
                description: self.description,
                priority: self.priority,
            },
        )
    }
}

/// Arguments for the dataset command
#[derive(Parser, Debug, Clone)]
pub struct DatasetArgs {
    /// Drop the cached copy first and fetch from the origin
    #[arg(long)]
    pub refresh: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cache.backend)
        key: String,
        /// Value to set
        value: String,
    },
}

/// One line typed into the shell
#[derive(Parser, Debug)]
#[command(name = "todocache", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

/// Commands accepted by the shell
#[derive(Subcommand, Debug)]
pub enum ShellCommand {
    #[command(flatten)]
    Request(Request),

    /// Show dataset cache counters
    Stats,

    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    s.parse::<Priority>().map_err(|e| e.to_string())
}

/// Split a shell line into words.
///
/// Whitespace separates words; single or double quotes group them and a
/// backslash escapes the next character outside single quotes.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('\''), c) => current.push(c),
            (_, '\\') => match chars.next() {
                Some(next) => {
                    current.push(next);
                    in_word = true;
                }
                None => return Err("trailing backslash".to_string()),
            },
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {} quote", q));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
