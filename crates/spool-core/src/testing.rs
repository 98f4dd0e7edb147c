//! Command types and a recording handler shared by the unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Outcome;
use crate::error::CommandError;
use crate::typed::{Command, CommandContext, Handler};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Print {
    pub document: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Save {
    pub document: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Convert {
    pub document: String,
}

macro_rules! document_command {
    ($ty:ident, $kind:literal) => {
        impl $ty {
            pub fn new(document: &str) -> Self {
                Self {
                    document: document.to_string(),
                }
            }
        }

        impl Command for $ty {
            const KIND: &'static str = $kind;
        }
    };
}

document_command!(Print, "test.documents.print.v1");
document_command!(Save, "test.documents.save.v1");
document_command!(Convert, "test.documents.convert.v1");

/// Discovers `items` detail commands when executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage {
    pub items: u32,
}

impl Command for ListPage {
    const KIND: &'static str = "test.scrape.list.v1";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detail {
    pub n: u32,
}

impl Command for Detail {
    const KIND: &'static str = "test.scrape.detail.v1";
}

/// Always fails with `WorkFailed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broken {
    pub reason: String,
}

impl Command for Broken {
    const KIND: &'static str = "test.broken.v1";
}

/// Execution log shared between a test and its handlers.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct Recorder {
    journal: Journal,
}

impl Recorder {
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

#[async_trait]
impl Handler<Print> for Recorder {
    async fn handle(&self, _ctx: &CommandContext, cmd: Print) -> Result<Outcome, CommandError> {
        self.journal.record(format!("print:{}", cmd.document));
        Ok(Outcome::done())
    }
}

#[async_trait]
impl Handler<Save> for Recorder {
    async fn handle(&self, _ctx: &CommandContext, cmd: Save) -> Result<Outcome, CommandError> {
        self.journal.record(format!("save:{}", cmd.document));
        Ok(Outcome::done())
    }
}

#[async_trait]
impl Handler<Convert> for Recorder {
    async fn handle(&self, _ctx: &CommandContext, cmd: Convert) -> Result<Outcome, CommandError> {
        self.journal.record(format!("convert:{}", cmd.document));
        Ok(Outcome::done())
    }
}

#[async_trait]
impl Handler<ListPage> for Recorder {
    async fn handle(&self, _ctx: &CommandContext, cmd: ListPage) -> Result<Outcome, CommandError> {
        self.journal.record(format!("list:{}", cmd.items));
        let mut outcome = Outcome::done();
        for n in 1..=cmd.items {
            outcome = outcome.enqueue(&Detail { n })?;
        }
        Ok(outcome)
    }
}

#[async_trait]
impl Handler<Detail> for Recorder {
    async fn handle(&self, _ctx: &CommandContext, cmd: Detail) -> Result<Outcome, CommandError> {
        self.journal.record(format!("detail:{}", cmd.n));
        Ok(Outcome::done())
    }
}

#[async_trait]
impl Handler<Broken> for Recorder {
    async fn handle(&self, _ctx: &CommandContext, cmd: Broken) -> Result<Outcome, CommandError> {
        self.journal.record(format!("broken:{}", cmd.reason));
        Err(CommandError::work_failed(cmd.reason))
    }
}
