//! Operator CLI over the Snowy core.
//!
//! # Responsibility
//! - Parse arguments (clap) and hand them to the core store service.
//! - Render results as pretty JSON on the supplied writer.
//!
//! Handlers are generic over the store backends so they run unchanged
//! against the in-memory store in tests.

pub mod content;
pub mod doc;

use anyhow::{Context, Result};
use serde_json::Value;
use snowy_core::{ContentAddress, DocumentId, Query};
use std::io::Write;

/// Writes `value` as pretty JSON followed by a newline.
pub fn print_json(out: &mut dyn Write, value: &Value) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to render JSON output")?;
    writeln!(out)?;
    Ok(())
}

pub(crate) fn parse_address(raw: &str) -> Result<ContentAddress> {
    ContentAddress::parse(raw).with_context(|| format!("invalid content address `{raw}`"))
}

pub(crate) fn parse_resource_id(raw: &str) -> Result<DocumentId> {
    DocumentId::parse_str(raw).with_context(|| format!("invalid resource id `{raw}`"))
}

pub(crate) fn query_from_tags(tags: &[String]) -> Query {
    Query::with_tags(tags.iter().cloned())
}
