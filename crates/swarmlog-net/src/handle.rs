//! Command channel into a running coordinator.
//!
//! The coordinator is a single-owner task. Everything outside it talks to it
//! through a [`NetworkHandle`], which queues a [`Command`] and, where the
//! caller needs an answer, waits on a oneshot reply.

use swarmlog_core::ChannelName;
use tokio::sync::{mpsc, oneshot};

use crate::error::{NetworkError, Result};
use crate::status::NetworkStatus;

/// Requests accepted by the coordinator task.
#[derive(Debug)]
pub enum Command {
    Join {
        channel: ChannelName,
        reply: oneshot::Sender<Result<()>>,
    },
    Leave {
        channel: ChannelName,
        reply: oneshot::Sender<Result<()>>,
    },
    Remove {
        channel: ChannelName,
    },
    Stop {
        reply: oneshot::Sender<Result<()>>,
    },
    Status {
        reply: oneshot::Sender<NetworkStatus>,
    },
    /// Stop the network and end the task.
    Shutdown,
}

/// Cloneable handle to a coordinator task.
#[derive(Debug, Clone)]
pub struct NetworkHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl NetworkHandle {
    pub(crate) fn new(commands: mpsc::UnboundedSender<Command>) -> Self {
        Self { commands }
    }

    /// Request to join a channel. See `NetworkSession::join_channel`.
    pub async fn join(&self, channel: impl Into<ChannelName>) -> Result<()> {
        let channel = channel.into();
        self.request(|reply| Command::Join { channel, reply }).await?
    }

    /// Request to leave a channel. See `NetworkSession::leave_channel`.
    pub async fn leave(&self, channel: impl Into<ChannelName>) -> Result<()> {
        let channel = channel.into();
        self.request(|reply| Command::Leave { channel, reply }).await?
    }

    /// Drop a channel from the registry without asking the log session.
    pub fn remove(&self, channel: impl Into<ChannelName>) -> Result<()> {
        self.send(Command::Remove {
            channel: channel.into(),
        })
    }

    /// Stop the network and wait for shutdown to finish.
    pub async fn stop(&self) -> Result<()> {
        self.request(|reply| Command::Stop { reply }).await?
    }

    /// Snapshot of the coordinator state.
    pub async fn status(&self) -> Result<NetworkStatus> {
        self.request(|reply| Command::Status { reply }).await
    }

    /// Ask the task to stop the network and exit.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// Whether the coordinator task is still accepting commands.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    pub(crate) fn downgrade(&self) -> NetworkLink {
        NetworkLink {
            commands: self.commands.downgrade(),
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| NetworkError::DriverClosed)
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(make(tx))?;
        rx.await.map_err(|_| NetworkError::DriverClosed)
    }
}

/// Non-owning back-reference from a channel session to its coordinator.
///
/// Holding a link does not keep the coordinator's command channel open.
#[derive(Debug, Clone)]
pub struct NetworkLink {
    commands: mpsc::WeakUnboundedSender<Command>,
}

impl NetworkLink {
    /// A strong handle, if the coordinator is still reachable.
    pub fn upgrade(&self) -> Option<NetworkHandle> {
        self.commands.upgrade().map(NetworkHandle::new)
    }
}
