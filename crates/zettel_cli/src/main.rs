//! Command line front end for the zettel store.
//!
//! # Responsibility
//! - Map subcommands onto `zettel_api` use-cases and print JSON results.
//! - Read note bodies from stdin where a command takes one.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use zettel_api::{ApiError, DeleteRequest, InboundMail, ListRequest, SaveRequest, ZettelApi};
use zettel_core::{init_from_config, ZettelConfig};

/// zettel - tag-line driven personal notes
#[derive(Parser)]
#[command(name = "zettel")]
#[command(about = "Personal zettelkasten notes with trailing tag lines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List notes filtered by text and tags
    List {
        /// Substring matched against note bodies
        #[arg(short, long, default_value = "")]
        search: String,
        /// Tag query, e.g. "work home +urgent" or "<none>"
        #[arg(short, long, default_value = "")]
        tags: String,
        /// Include the content of this note in the output
        #[arg(long)]
        preselect: Option<i64>,
        /// Most recently modified first
        #[arg(long)]
        newest_first: bool,
    },
    /// List tags in use with their note counts
    Tags,
    /// Print the raw text and rendered HTML of a note
    Show { id: i64 },
    /// Create a note; the body is read from stdin when --stdin is given
    New {
        #[arg(long)]
        stdin: bool,
    },
    /// Replace a note body with stdin
    Save { id: i64 },
    /// Delete a note
    Delete { id: i64 },
    /// Create a note from a mail body on stdin
    Mail {
        /// Recipient address; its local part must be the shared secret
        recipient: String,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        let exit_code = match err.downcast_ref::<ApiError>() {
            Some(ApiError::StorageFailure) | None => 2,
            Some(_) => 1,
        };
        std::process::exit(exit_code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ZettelConfig::from_env().context("Failed to read configuration")?;
    init_from_config(&config)
        .map_err(anyhow::Error::msg)
        .context("Failed to initialize logging")?;
    let api = ZettelApi::from_config(&config);

    match cli.command {
        Commands::List {
            search,
            tags,
            preselect,
            newest_first,
        } => print_json(&api.list_notes(&ListRequest {
            search,
            tag_query: tags,
            preselect_id: preselect,
            newest_first,
        })?),
        Commands::Tags => print_json(&api.list_tags()?),
        Commands::Show { id } => print_json(&api.fetch_note(id)?),
        Commands::New { stdin } => {
            let body = if stdin { Some(read_stdin()?) } else { None };
            print_json(&api.create_note(body.as_deref())?)
        }
        Commands::Save { id } => {
            let body = read_stdin()?;
            print_json(&api.save_note(&SaveRequest { id, body })?)
        }
        Commands::Delete { id } => print_json(&api.delete_note(&DeleteRequest { id })?),
        Commands::Mail { recipient } => {
            let body = read_stdin()?;
            print_json(&api.inbound_mail(&InboundMail { recipient, body })?)
        }
    }
}

fn read_stdin() -> Result<String> {
    let mut body = String::new();
    std::io::stdin()
        .read_to_string(&mut body)
        .context("Failed to read note body from stdin")?;
    Ok(body)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
