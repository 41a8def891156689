//! One task per session: utterances queue up and run one turn at a time.

use super::cognitive_loop::CognitiveLoop;
use super::context::Turn;
use super::turn::{RuntimeStatus, TurnOutcome, Utterance};
use crate::memory::MemoryStats;
use crate::{AideError, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

enum SessionCommand {
    Process {
        utterance: Utterance,
        reply: oneshot::Sender<TurnOutcome>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<Turn>>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
    Stats {
        reply: oneshot::Sender<MemoryStats>,
    },
    Status {
        reply: oneshot::Sender<RuntimeStatus>,
    },
}

/// Runs a [`CognitiveLoop`] on its own task
pub struct Session;

impl Session {
    /// Spawn the session task with the default queue depth
    pub fn spawn(cognitive_loop: CognitiveLoop) -> SessionHandle {
        Self::spawn_with_capacity(cognitive_loop, 32).0
    }

    /// Spawn with an explicit queue depth, also returning the task handle
    pub fn spawn_with_capacity(
        mut cognitive_loop: CognitiveLoop,
        queue: usize,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<SessionCommand>(queue.max(1));

        let task = tokio::spawn(async move {
            info!(target: "session", "Session started");
            while let Some(cmd) = rx.recv().await {
                match cmd {
                    SessionCommand::Process { utterance, reply } => {
                        let outcome = cognitive_loop.process(utterance).await;
                        if reply.send(outcome).is_err() {
                            debug!(target: "session", "Submitter went away before the reply");
                        }
                    }
                    SessionCommand::Snapshot { reply } => {
                        let _ = reply.send(cognitive_loop.context().snapshot());
                    }
                    SessionCommand::Clear { reply } => {
                        cognitive_loop.clear_history();
                        let _ = reply.send(());
                    }
                    SessionCommand::Stats { reply } => {
                        let _ = reply.send(cognitive_loop.memory_stats().await);
                    }
                    SessionCommand::Status { reply } => {
                        let _ = reply.send(cognitive_loop.status().await);
                    }
                }
            }
            info!(target: "session", "Session closed");
        });

        (SessionHandle { tx }, task)
    }
}

/// Cloneable handle for submitting work to a session
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| AideError::Session("session task has stopped".into()))?;
        rx.await
            .map_err(|_| AideError::Session("session dropped the request".into()))
    }

    /// Queue an utterance and wait for its turn to finish
    pub async fn submit(&self, utterance: impl Into<Utterance>) -> Result<TurnOutcome> {
        let utterance = utterance.into();
        self.request(|reply| SessionCommand::Process { utterance, reply })
            .await
    }

    /// Copy of the conversation context, taken between turns
    pub async fn snapshot(&self) -> Result<Vec<Turn>> {
        self.request(|reply| SessionCommand::Snapshot { reply }).await
    }

    pub async fn clear_history(&self) -> Result<()> {
        self.request(|reply| SessionCommand::Clear { reply }).await
    }

    pub async fn memory_stats(&self) -> Result<MemoryStats> {
        self.request(|reply| SessionCommand::Stats { reply }).await
    }

    pub async fn status(&self) -> Result<RuntimeStatus> {
        self.request(|reply| SessionCommand::Status { reply }).await
    }
}
