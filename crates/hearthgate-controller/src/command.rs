//! Remote command mailbox.
//!
//! Transports (MQTT, the local HTTP API) decode commands at their edge and
//! [`submit`](CommandMailbox::submit) them here. The mailbox keeps at most
//! one pending command per [`CommandSlot`]; a newer command for the same
//! slot replaces the older one, whose submitter (if waiting) is told it was
//! [`Superseded`](CommandRejection::Superseded). At the top of each tick the
//! coordinator takes everything pending, in slot order, and applies it.

use hearthgate_protocol::{CommandSlot, ProtocolError, RemoteCommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

/// Why a command was not applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandRejection {
    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    #[error("Light channel {channel} is in auto mode")]
    ModeConflict { channel: u8 },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Superseded by a newer command")]
    Superseded,

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl From<ProtocolError> for CommandRejection {
    fn from(error: ProtocolError) -> Self {
        match error {
            ProtocolError::UnknownTarget(target) => CommandRejection::UnknownTarget(target),
            ProtocolError::UnknownAction { device, action } => {
                CommandRejection::Unsupported(format!("{device}.{action}"))
            }
            other => CommandRejection::InvalidValue(other.to_string()),
        }
    }
}

/// Successful application of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandAck {
    pub status: &'static str,
}

impl CommandAck {
    pub const fn new(status: &'static str) -> Self {
        Self { status }
    }
}

pub type CommandReply = Result<CommandAck, CommandRejection>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    Mqtt,
    LocalApi,
    Simulator,
}

#[derive(Debug)]
pub struct PendingCommand {
    pub id: Uuid,
    pub command: RemoteCommand,
    pub source: CommandSource,
    reply: Option<oneshot::Sender<CommandReply>>,
}

impl PendingCommand {
    /// Resolve the command. The submitter may have stopped waiting; that is
    /// not an error.
    pub fn complete(mut self, reply: CommandReply) {
        if let Some(tx) = self.reply.take() {
            let _ = tx.send(reply);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandMailbox {
    slots: Arc<Mutex<BTreeMap<CommandSlot, PendingCommand>>>,
}

impl CommandMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, BTreeMap<CommandSlot, PendingCommand>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a command nobody waits on.
    pub fn submit(&self, command: RemoteCommand, source: CommandSource) -> Uuid {
        self.insert(command, source, None)
    }

    /// Queue a command and get a receiver for its outcome.
    pub fn submit_with_reply(
        &self,
        command: RemoteCommand,
        source: CommandSource,
    ) -> (Uuid, oneshot::Receiver<CommandReply>) {
        let (tx, rx) = oneshot::channel();
        (self.insert(command, source, Some(tx)), rx)
    }

    fn insert(
        &self,
        command: RemoteCommand,
        source: CommandSource,
        reply: Option<oneshot::Sender<CommandReply>>,
    ) -> Uuid {
        let pending = PendingCommand {
            id: Uuid::new_v4(),
            command,
            source,
            reply,
        };
        let id = pending.id;

        let displaced = self.slots().insert(command.slot(), pending);
        if let Some(old) = displaced {
            debug!(command = %old.command, id = %old.id, "Pending command superseded");
            old.complete(Err(CommandRejection::Superseded));
        }
        id
    }

    /// Take every pending command, in slot order, leaving the mailbox empty.
    pub fn take_all(&self) -> Vec<PendingCommand> {
        std::mem::take(&mut *self.slots()).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }
}
