//! Background delivery of property commands.
//!
//! Deal completion must mark the property as sold, but the property lives in the same
//! document store as the deal while being owned by another part of the system. The deal engine
//! therefore only queues a [`PropertyCommand`] and returns. A worker task drains the queue and
//! applies each command through a [`PropertyDirectory`].
//!
//! ```text
//!  DealEngine                          Worker task
//! ┌───────────────────────┐         ┌─────────────────────────────┐
//! │ PropertySyncHandle    │         │ PropertyDirectory           │
//! │                       │         │                             │
//! │ mpsc::Sender::try_send┼─────────┼──> mpsc::Receiver::recv     │
//! └───────────────────────┘         └─────────────────────────────┘
//! ```
//!
//! Dispatch never waits: a full queue is reported to the caller as
//! [`PropertySyncError::Full`]. Failures on the worker side are logged and dropped, the deal
//! that produced the command stays committed either way.

pub mod msg;

mod error;

pub use self::error::PropertySyncWorkerError;

use core::num::NonZeroUsize;

use std::sync::Arc;

use realty_domain::property::PropertyCommand;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};

use self::{error::Result, msg::PropertySyncMsg};
use crate::port::{PropertyDirectory, PropertySync, PropertySyncError};

/// Sending side of the property sync queue.
#[derive(Debug, Clone)]
pub struct PropertySyncHandle {
    sender: mpsc::Sender<PropertySyncMsg>,
}

/// The running worker task.
#[derive(Debug)]
pub struct PropertySyncWorker {
    sender: mpsc::Sender<PropertySyncMsg>,
    handle: JoinHandle<()>,
}

/// Spawns the property sync worker on the current tokio runtime.
///
/// The queue holds at most `capacity` pending commands.
///
/// # Panics
///
/// Panics if called outside of a tokio runtime.
#[tracing::instrument(skip_all, fields(capacity = capacity.get()))]
pub fn spawn(
    directory: Arc<dyn PropertyDirectory>,
    capacity: NonZeroUsize,
) -> (PropertySyncHandle, PropertySyncWorker) {
    let (sender, receiver) = mpsc::channel(capacity.get());

    let handle = tokio::spawn(run_property_sync(receiver, directory));

    (PropertySyncHandle { sender: sender.clone() }, PropertySyncWorker { sender, handle })
}

impl PropertySync for PropertySyncHandle {
    fn dispatch(&self, command: PropertyCommand) -> core::result::Result<(), PropertySyncError> {
        self.sender.try_send(PropertySyncMsg::Apply(command)).map_err(|e| match e {
            TrySendError::Full(_) => PropertySyncError::Full,
            TrySendError::Closed(_) => PropertySyncError::Closed,
        })
    }
}

impl PropertySyncWorker {
    /// Stops the worker once every command queued before this call has been applied.
    pub async fn shutdown(self) -> Result<()> {
        self.sender
            .send(PropertySyncMsg::Shutdown)
            .await
            .map_err(|_| PropertySyncWorkerError::Sender)?;

        self.handle.await?;

        Ok(())
    }
}

#[tracing::instrument(skip_all)]
async fn run_property_sync(
    mut receiver: mpsc::Receiver<PropertySyncMsg>,
    directory: Arc<dyn PropertyDirectory>,
) {
    while let Some(msg) = receiver.recv().await {
        match msg {
            PropertySyncMsg::Shutdown => {
                tracing::info!("received shutdown msg, stopping property sync");
                break;
            },
            PropertySyncMsg::Apply(command) => handle_command(directory.as_ref(), command).await,
        }
    }

    tracing::info!("property sync stopped");
}

#[tracing::instrument(skip_all, fields(property_id = %command.property_id()))]
async fn handle_command(directory: &dyn PropertyDirectory, command: PropertyCommand) {
    let status = command.target_status();

    match directory.set_status(command.property_id(), status).await {
        Ok(true) => tracing::debug!("property status set to {status}"),
        Ok(false) => tracing::warn!("property not found, status {status} not applied"),
        Err(e) => tracing::error!("failed to set property status to {status}: {e}"),
    }
}
