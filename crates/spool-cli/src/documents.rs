//! ドキュメント処理パイプライン
//!
//! 1 つのドキュメントにつき Print → Save → Convert の 3 コマンドを積む。
//! 各コマンドは後続を生まない（Outcome::done）。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use spool_core::{
    AppBuilder, Command, CommandContext, CommandError, CommandId, CommandStore, Handler, Outcome,
    RegistryError, SubmitError, submit,
};
use tracing::debug;

use crate::transcript::Transcript;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintDocument {
    pub document: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDocument {
    pub document: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertDocument {
    pub document: String,
}

impl Command for PrintDocument {
    const KIND: &'static str = "documents.print.v1";
}

impl Command for SaveDocument {
    const KIND: &'static str = "documents.save.v1";
}

impl Command for ConvertDocument {
    const KIND: &'static str = "documents.convert.v1";
}

pub const KINDS: [&str; 3] = [PrintDocument::KIND, SaveDocument::KIND, ConvertDocument::KIND];

/// Performs the document actions. Output goes to the transcript.
#[derive(Debug, Clone)]
pub struct DocumentDesk {
    transcript: Transcript,
}

impl DocumentDesk {
    pub fn new(transcript: Transcript) -> Self {
        Self { transcript }
    }

    fn perform(&self, ctx: &CommandContext, verb: &str, document: &str) -> Result<Outcome, CommandError> {
        if document.trim().is_empty() {
            return Err(CommandError::work_failed(format!(
                "{verb}: document name is empty"
            )));
        }
        debug!(command_id = %ctx.id(), kind = %ctx.kind(), document, "document action");
        self.transcript.say(format!("{verb} document '{document}'."));
        Ok(Outcome::done())
    }
}

#[async_trait]
impl Handler<PrintDocument> for DocumentDesk {
    async fn handle(
        &self,
        ctx: &CommandContext,
        command: PrintDocument,
    ) -> Result<Outcome, CommandError> {
        self.perform(ctx, "Printing", &command.document)
    }
}

#[async_trait]
impl Handler<SaveDocument> for DocumentDesk {
    async fn handle(
        &self,
        ctx: &CommandContext,
        command: SaveDocument,
    ) -> Result<Outcome, CommandError> {
        self.perform(ctx, "Saving", &command.document)
    }
}

#[async_trait]
impl Handler<ConvertDocument> for DocumentDesk {
    async fn handle(
        &self,
        ctx: &CommandContext,
        command: ConvertDocument,
    ) -> Result<Outcome, CommandError> {
        self.perform(ctx, "Converting", &command.document)
    }
}

pub fn register(builder: AppBuilder, desk: DocumentDesk) -> Result<AppBuilder, RegistryError> {
    builder
        .register::<PrintDocument, _>(desk.clone())?
        .register::<SaveDocument, _>(desk.clone())?
        .register::<ConvertDocument, _>(desk)
}

/// Enqueue print, save and convert for one document, in that order.
pub async fn enqueue(
    store: &dyn CommandStore,
    document: &str,
) -> Result<Vec<CommandId>, SubmitError> {
    let document = document.to_string();
    Ok(vec![
        submit(store, &PrintDocument { document: document.clone() }).await?,
        submit(store, &SaveDocument { document: document.clone() }).await?,
        submit(store, &ConvertDocument { document }).await?,
    ])
}
