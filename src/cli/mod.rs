//! CLI argument definitions for `prefs`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// prefs - inspect and edit schema-driven preference records.
#[derive(Parser, Debug)]
#[command(name = "prefs")]
#[command(author, version, about = "Inspect and edit typed, inheritable preference records", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// KDL file declaring the preference schema
    #[arg(long, global = true, env = "PREFS_SCHEMA", default_value = "schema.kdl")]
    pub schema: PathBuf,

    /// Directory holding records.json.
    /// Defaults to the platform data directory.
    #[arg(long = "data-dir", global = true, env = "PREFS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Describe every group and preference in the schema
    Schema,

    /// Record management commands
    Record {
        #[command(subcommand)]
        command: RecordCommands,
    },

    /// Get the resolved value of one preference
    Get {
        /// Record name
        record: String,

        /// Preference key
        key: String,
    },

    /// Override a preference on a record
    ///
    /// VALUE is parsed as JSON when possible (`true`, `42`, `["a"]`);
    /// anything else is taken as a plain string.
    Set {
        /// Record name
        record: String,

        /// Preference key
        key: String,

        /// New value
        value: String,
    },

    /// Remove an override so the value is inherited again
    Reset {
        /// Record name
        record: String,

        /// Preference key
        key: String,
    },

    /// Show a record's preferences
    Show {
        /// Record name
        record: String,

        /// Include every key with its resolved value and inheritance flag
        #[arg(long)]
        full: bool,
    },
}

/// Record subcommands
#[derive(Subcommand, Debug)]
pub enum RecordCommands {
    /// Create a new, empty record
    Create {
        /// Record name
        name: String,

        /// Dotted relationship path to the parent record (e.g. business.chain)
        #[arg(long = "inherits-from")]
        inherits_from: Option<String>,

        /// Related record, as RELATION=RECORD (repeatable)
        #[arg(long = "relation", value_parser = parse_relation)]
        relations: Vec<(String, String)>,
    },

    /// Point a relation of a record at another record
    Link {
        /// Record name
        name: String,

        /// Relation name
        relation: String,

        /// Target record name
        target: String,
    },

    /// List all records
    List,

    /// Remove a record
    Remove {
        /// Record name
        name: String,
    },
}

fn parse_relation(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((relation, target)) if !relation.is_empty() && !target.is_empty() => {
            Ok((relation.to_string(), target.to_string()))
        }
        _ => Err(format!("expected RELATION=RECORD, got '{}'", s)),
    }
}
