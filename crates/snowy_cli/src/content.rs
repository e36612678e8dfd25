//! `snowy content` subcommand: store and fetch content blobs.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::json;
use snowy_core::{Content, ContentStore, DocumentRepository, StoreService};

use crate::{parse_address, print_json};

/// Arguments for `snowy content`.
#[derive(Args, Debug)]
pub struct ContentArgs {
    #[command(subcommand)]
    pub command: ContentCommand,
}

#[derive(Subcommand, Debug)]
pub enum ContentCommand {
    /// Store a file and print its content address.
    Put {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// MIME type recorded with the blob.
        #[arg(long, default_value = "")]
        content_type: String,
        /// Expected address; the put fails unless the bytes hash to it.
        #[arg(long, value_name = "ADDRESS")]
        address: Option<String>,
    },

    /// Fetch a blob by address.
    Get {
        #[arg(value_name = "ADDRESS")]
        address: String,
        /// Write the bytes to FILE and print metadata instead of raw bytes.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

/// Execute the content subcommand.
pub fn run_content<C, R>(
    args: &ContentArgs,
    store: &StoreService<C, R>,
    out: &mut dyn Write,
) -> Result<()>
where
    C: ContentStore,
    R: DocumentRepository,
{
    match &args.command {
        ContentCommand::Put {
            file,
            content_type,
            address,
        } => cmd_put(store, file, content_type, address.as_deref(), out),
        ContentCommand::Get { address, out: path } => {
            cmd_get(store, address, path.as_deref(), out)
        }
    }
}

fn cmd_put<C, R>(
    store: &StoreService<C, R>,
    file: &Path,
    content_type: &str,
    claimed: Option<&str>,
    out: &mut dyn Write,
) -> Result<()>
where
    C: ContentStore,
    R: DocumentRepository,
{
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read file: {}", file.display()))?;

    let stored = match claimed {
        Some(raw) => store.put_content_verified(bytes, content_type, &parse_address(raw)?)?,
        None => store.put_content(bytes, content_type)?,
    };
    print_json(out, &metadata(&stored))
}

fn cmd_get<C, R>(
    store: &StoreService<C, R>,
    address: &str,
    path: Option<&Path>,
    out: &mut dyn Write,
) -> Result<()>
where
    C: ContentStore,
    R: DocumentRepository,
{
    let content = store.get_content(&parse_address(address)?)?;
    match path {
        Some(path) => {
            std::fs::write(path, &content.bytes)
                .with_context(|| format!("failed to write file: {}", path.display()))?;
            print_json(out, &metadata(&content))
        }
        None => {
            out.write_all(&content.bytes)?;
            Ok(())
        }
    }
}

fn metadata(content: &Content) -> serde_json::Value {
    json!({
        "address": content.address,
        "content_type": content.content_type,
        "size": content.size,
    })
}
