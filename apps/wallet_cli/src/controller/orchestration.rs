//! Command orchestration from shell input to the backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub const QUEUE_FULL_STATUS: &str = "Backend is busy with another command; please retry";
pub const DISCONNECTED_STATUS: &str =
    "Backend command processor disconnected (possible startup/runtime failure); restart the shell";

/// Queues `cmd` without blocking. A command arriving while the queue is full is dropped
/// and `status` says so.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> bool {
    let cmd_name = cmd.name();

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued shell->backend command");
            true
        }
        Err(TrySendError::Full(_)) => {
            tracing::debug!(command = cmd_name, "dropped command; backend queue full");
            *status = QUEUE_FULL_STATUS.to_string();
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = DISCONNECTED_STATUS.to_string();
            false
        }
    }
}
