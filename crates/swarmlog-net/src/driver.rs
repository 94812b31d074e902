//! The coordinator task.
//!
//! [`NetworkSession::run`] owns the session and serializes everything that
//! can mutate it: reactive source changes, bridged log events and commands
//! from [`NetworkHandle`](crate::NetworkHandle)s. Each input is handled to
//! completion before the next is taken.

use tokio::task::JoinHandle;

use crate::error::{NetworkError, Result};
use crate::handle::Command;
use crate::session::NetworkSession;
use crate::sources::Sources;

impl NetworkSession {
    /// Run the coordinator until it is shut down.
    ///
    /// Applies the current value of each source, then reacts to every change.
    /// Exits on [`Command::Shutdown`] or once every handle is dropped, stopping
    /// the network on the way out.
    pub async fn run(mut self, mut sources: Sources) -> Result<()> {
        let mut commands = self.commands.take().ok_or(NetworkError::DriverClosed)?;

        // Identity first, so the initial user is recorded while offline.
        let username = sources.identity.borrow_and_update().clone();
        if let Err(e) = self.on_identity_changed(username).await {
            tracing::warn!(error = %e, "network stop on initial identity failed");
        }
        let node = sources.transport.borrow_and_update().clone();
        self.on_transport_changed(node);
        let session = sources.log_session.borrow_and_update().clone();
        self.on_log_session_changed(session);

        let mut transport_open = true;
        let mut log_open = true;
        let mut identity_open = true;

        loop {
            tokio::select! {
                biased;

                Some(bridged) = self.mailbox_rx.recv() => {
                    self.dispatch(bridged);
                }
                changed = sources.identity.changed(), if identity_open => match changed {
                    Ok(()) => {
                        let username = sources.identity.borrow_and_update().clone();
                        if let Err(e) = self.on_identity_changed(username).await {
                            tracing::warn!(error = %e, "network stop on identity change failed");
                        }
                    }
                    Err(_) => identity_open = false,
                },
                changed = sources.transport.changed(), if transport_open => match changed {
                    Ok(()) => {
                        let node = sources.transport.borrow_and_update().clone();
                        self.on_transport_changed(node);
                    }
                    Err(_) => transport_open = false,
                },
                changed = sources.log_session.changed(), if log_open => match changed {
                    Ok(()) => {
                        let session = sources.log_session.borrow_and_update().clone();
                        self.on_log_session_changed(session);
                    }
                    Err(_) => log_open = false,
                },
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
            }
        }

        tracing::info!("network driver exiting");
        self.stop().await
    }

    /// Spawn [`run`](Self::run) on the current tokio runtime.
    pub fn spawn(self, sources: Sources) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run(sources))
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Join { channel, reply } => {
                let _ = reply.send(self.join_channel(&channel).await);
            }
            Command::Leave { channel, reply } => {
                let _ = reply.send(self.leave_channel(&channel).await);
            }
            Command::Remove { channel } => {
                self.remove_channel(channel.as_str());
            }
            Command::Stop { reply } => {
                let _ = reply.send(self.stop().await);
            }
            Command::Status { reply } => {
                let _ = reply.send(self.status());
            }
            Command::Shutdown => {}
        }
    }
}
