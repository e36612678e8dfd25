//! `snowy doc` subcommand: document lifecycle and tag queries.

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;
use snowy_core::{ContentStore, DocumentDraft, DocumentRepository, StoreService};

use crate::{parse_address, parse_resource_id, print_json, query_from_tags};

/// Arguments for `snowy doc`.
#[derive(Args, Debug)]
pub struct DocArgs {
    #[command(subcommand)]
    pub command: DocCommand,
}

/// Metadata shared by `insert` and `append`.
#[derive(Args, Debug)]
pub struct DraftArgs {
    #[arg(long)]
    pub author: String,
    #[arg(long)]
    pub name: String,
    /// Tag to attach; repeat for several.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
    /// Address of previously stored content for the new revision.
    #[arg(long, value_name = "ADDRESS")]
    pub content_address: Option<String>,
}

impl DraftArgs {
    fn to_draft(&self) -> Result<DocumentDraft> {
        let draft = DocumentDraft::new(self.author.clone(), self.name.clone())
            .with_tags(self.tags.iter().cloned());
        Ok(match self.content_address.as_deref() {
            Some(raw) => draft.with_content(parse_address(raw)?),
            None => draft,
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum DocCommand {
    /// Create a document with revision 0.
    Insert(DraftArgs),

    /// Append a revision to a live document.
    Append {
        #[arg(value_name = "RESOURCE_ID")]
        resource_id: String,
        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Fetch one live document, optionally requiring tags.
    Get {
        #[arg(value_name = "RESOURCE_ID")]
        resource_id: String,
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },

    /// List an author's live documents carrying every given tag.
    List {
        #[arg(long)]
        author: String,
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },

    /// Soft-delete a document.
    Delete {
        #[arg(value_name = "RESOURCE_ID")]
        resource_id: String,
    },

    /// Show every revision, including those of deleted documents.
    History {
        #[arg(value_name = "RESOURCE_ID")]
        resource_id: String,
    },
}

/// Execute the doc subcommand.
pub fn run_doc<C, R>(args: &DocArgs, store: &StoreService<C, R>, out: &mut dyn Write) -> Result<()>
where
    C: ContentStore,
    R: DocumentRepository,
{
    let value = match &args.command {
        DocCommand::Insert(draft) => json!(store.insert_document(draft.to_draft()?)?),
        DocCommand::Append { resource_id, draft } => json!(store.append_document(
            parse_resource_id(resource_id)?,
            draft.to_draft()?
        )?),
        DocCommand::Get { resource_id, tags } => json!(store.get_document(
            parse_resource_id(resource_id)?,
            &query_from_tags(tags)
        )?),
        DocCommand::List { author, tags } => {
            json!(store.get_documents(author, &query_from_tags(tags))?)
        }
        DocCommand::Delete { resource_id } => {
            let resource_id = parse_resource_id(resource_id)?;
            store.delete_document(resource_id)?;
            json!({ "resource_id": resource_id, "deleted": true })
        }
        DocCommand::History { resource_id } => {
            json!(store.document_history(parse_resource_id(resource_id)?)?)
        }
    };
    print_json(out, &value)
}
