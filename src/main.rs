//! prefs - inspect and edit schema-driven preference records.

use clap::Parser;
use serial_preferences::cli::{Cli, Commands, RecordCommands};
use serial_preferences::commands::{self, Output};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let human = cli.human_readable;

    if let Err(e) = run_command(cli) {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Log to stderr so JSON on stdout stays parseable. Filter comes from `PREFS_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("PREFS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Data directory precedence: --data-dir flag > PREFS_DATA_DIR > platform default.
fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf, serial_preferences::Error> {
    match explicit {
        Some(dir) => Ok(dir),
        None => commands::default_data_dir(),
    }
}

fn run_command(cli: Cli) -> Result<(), serial_preferences::Error> {
    let human = cli.human_readable;

    if let Commands::Schema = cli.command {
        let result = commands::schema_describe(&cli.schema)?;
        output(&result, human);
        return Ok(());
    }

    let data_dir = resolve_data_dir(cli.data_dir)?;
    tracing::debug!(schema = %cli.schema.display(), data_dir = %data_dir.display(), "opening storage");
    let mut storage = commands::open_storage(&cli.schema, &data_dir)?;

    match cli.command {
        Commands::Schema => {}
        Commands::Record { command } => match command {
            RecordCommands::Create {
                name,
                inherits_from,
                relations,
            } => {
                let result = commands::record_create(&mut storage, &name, inherits_from, relations)?;
                output(&result, human);
            }
            RecordCommands::Link {
                name,
                relation,
                target,
            } => {
                let result = commands::record_link(&mut storage, &name, &relation, &target)?;
                output(&result, human);
            }
            RecordCommands::List => {
                let result = commands::record_list(&storage)?;
                output(&result, human);
            }
            RecordCommands::Remove { name } => {
                let result = commands::record_remove(&mut storage, &name)?;
                output(&result, human);
            }
        },
        Commands::Get { record, key } => {
            let result = commands::pref_get(&storage, &record, &key)?;
            output(&result, human);
        }
        Commands::Set { record, key, value } => {
            let result = commands::pref_set(&mut storage, &record, &key, &value)?;
            output(&result, human);
        }
        Commands::Reset { record, key } => {
            let result = commands::pref_reset(&mut storage, &record, &key)?;
            output(&result, human);
        }
        Commands::Show { record, full } => {
            let result = commands::record_show(&storage, &record, full)?;
            output(&result, human);
        }
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
