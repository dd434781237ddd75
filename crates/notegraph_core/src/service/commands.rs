//! Host command table.
//!
//! # Responsibility
//! - Name every user-invokable command with a stable id.
//! - Dispatch commands onto [`SyncCoordinator`] operations.

use crate::model::document::DocumentKind;
use crate::service::sync_coordinator::{
    ReloadReport, ShowOptions, ShowOutcome, SyncCoordinator, SyncError,
};
use log::debug;

/// User-invokable commands registered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphCommand {
    ShowNotes,
    ShowSchemas,
    SyncNotes,
    SyncSchemas,
    ReloadAll,
    SyncStore,
}

/// Result of one executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    Shown(ShowOutcome),
    Reloaded(ReloadReport),
    Synced,
}

impl GraphCommand {
    pub const ALL: [GraphCommand; 6] = [
        GraphCommand::ShowNotes,
        GraphCommand::ShowSchemas,
        GraphCommand::SyncNotes,
        GraphCommand::SyncSchemas,
        GraphCommand::ReloadAll,
        GraphCommand::SyncStore,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::ShowNotes => "notegraph.showNoteGraph",
            Self::ShowSchemas => "notegraph.showSchemaGraph",
            Self::SyncNotes => "notegraph.syncNoteGraph",
            Self::SyncSchemas => "notegraph.syncSchemaGraph",
            Self::ReloadAll => "notegraph.reloadGraphs",
            Self::SyncStore => "notegraph.syncStore",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.id() == id)
    }

    /// Kind and options for show-style commands.
    fn show_target(self) -> Option<(DocumentKind, ShowOptions)> {
        match self {
            Self::ShowNotes => Some((DocumentKind::Note, ShowOptions::default())),
            Self::ShowSchemas => Some((DocumentKind::Schema, ShowOptions::default())),
            Self::SyncNotes => Some((DocumentKind::Note, ShowOptions::synced())),
            Self::SyncSchemas => Some((DocumentKind::Schema, ShowOptions::synced())),
            Self::ReloadAll | Self::SyncStore => None,
        }
    }
}

impl SyncCoordinator {
    /// Runs one host command.
    pub async fn execute(&self, command: GraphCommand) -> Result<CommandOutput, SyncError> {
        debug!(
            "event=command_execute module=service status=start command={}",
            command.id()
        );
        if let Some((kind, opts)) = command.show_target() {
            return self.show_or_reload(kind, opts).await.map(CommandOutput::Shown);
        }
        match command {
            GraphCommand::ReloadAll => Ok(CommandOutput::Reloaded(self.reload_all().await)),
            _ => self.sync_store().await.map(|()| CommandOutput::Synced),
        }
    }
}
