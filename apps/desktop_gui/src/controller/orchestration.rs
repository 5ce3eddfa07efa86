//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = match &cmd {
        BackendCommand::LoadGroups => "load_groups",
        BackendCommand::OpenItem { .. } => "open_item",
        BackendCommand::OpenAll { .. } => "open_all",
        BackendCommand::RemoveDuplicates { .. } => "remove_duplicates",
        BackendCommand::DeleteGroup { .. } => "delete_group",
        BackendCommand::DeleteItem { .. } => "delete_item",
        BackendCommand::RenameGroup { .. } => "rename_group",
        BackendCommand::RenameItem { .. } => "rename_item",
        BackendCommand::TogglePinned { .. } => "toggle_pinned",
        BackendCommand::ToggleTodo { .. } => "toggle_todo",
        BackendCommand::ToggleLock { .. } => "toggle_lock",
        BackendCommand::PinToTop { .. } => "pin_to_top",
        BackendCommand::MoveGroup { .. } => "move_group",
        BackendCommand::CreateFolder { .. } => "create_folder",
        BackendCommand::ShareGroup { .. } => "share_group",
        BackendCommand::CopyGroup { .. } => "copy_group",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
        }
    }
}
