//! Backend worker: owns the tokio runtime, the store client, and the bulk
//! orchestrator, executes queued commands, and reports back as UI events.
//!
//! Commands run one at a time; a command awaiting a dialog resolution
//! parks here until the presenter settles the slot on the UI thread.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use arboard::Clipboard;
use client_core::{
    ClipboardAccess, DialogQueue, GroupActions, HttpTabGroupStore, LinkOpener, ProgressSurface,
    SystemLinkOpener, TabGroupStore,
};
use crossbeam_channel::{Receiver, Sender};
use shared::domain::{GroupId, ItemId, TabGroup, TabGroupItem};
use tracing::{error, info, warn};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{classify_service_failure, UiError, UiErrorContext, UiEvent};

pub struct BackendConfig {
    pub server_url: String,
    pub open_dispatch_delay: Duration,
}

/// Clipboard capability backed by the system clipboard.
struct ArboardClipboard;

impl ClipboardAccess for ArboardClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        let mut clipboard = Clipboard::new().map_err(anyhow::Error::new)?;
        clipboard
            .set_text(text.to_string())
            .map_err(anyhow::Error::new)?;
        Ok(())
    }
}

/// Progress surface that forwards bulk-open progress to the UI event
/// queue; the in-app progress panel renders from these events.
struct EventProgressSurface {
    ui_tx: Sender<UiEvent>,
}

impl ProgressSurface for EventProgressSurface {
    fn bulk_open_started(&self, total: usize) {
        let _ = self.ui_tx.try_send(UiEvent::BulkOpenStarted { total });
    }

    fn link_dispatched(&self, index: usize, url: &str, opened: bool) {
        let _ = self.ui_tx.try_send(UiEvent::BulkOpenProgress {
            index,
            url: url.to_string(),
            opened,
        });
    }

    fn bulk_open_finished(&self, report: &client_core::BulkOpenReport) {
        let _ = self.ui_tx.try_send(UiEvent::BulkOpenFinished(*report));
    }
}

pub fn launch(
    config: BackendConfig,
    dialogs: Arc<DialogQueue>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run_worker(config, dialogs, cmd_rx, ui_tx));
    });
}

async fn run_worker(
    config: BackendConfig,
    dialogs: Arc<DialogQueue>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    let store: Arc<dyn TabGroupStore> = Arc::new(HttpTabGroupStore::new(&config.server_url));
    let opener: Arc<dyn LinkOpener> = Arc::new(SystemLinkOpener);
    let actions = GroupActions::new(
        Arc::clone(&dialogs),
        Arc::clone(&store),
        Arc::clone(&opener),
        Arc::new(ArboardClipboard),
    )
    .with_progress(Arc::new(EventProgressSurface {
        ui_tx: ui_tx.clone(),
    }))
    .with_open_dispatch_delay(config.open_dispatch_delay);

    // Worker-side mirror of the loaded groups; command payloads carry ids
    // and are resolved against it.
    let mut groups: Vec<TabGroup> = Vec::new();

    info!(server_url = %config.server_url, "backend worker ready");
    let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));
    load_groups(store.as_ref(), &ui_tx, &mut groups).await;

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::LoadGroups => {
                load_groups(store.as_ref(), &ui_tx, &mut groups).await;
            }
            BackendCommand::OpenItem { group_id, item_id } => {
                let Some(item) = find_item(&groups, group_id, item_id).cloned() else {
                    report_stale_group(&ui_tx);
                    continue;
                };
                match opener.open(&item.url) {
                    Some(_) => {
                        let _ = ui_tx.try_send(UiEvent::Info(format!("Opening {}", item.title)));
                    }
                    None => {
                        let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                            UiErrorContext::General,
                            format!("the browser blocked opening {}", item.url),
                        )));
                    }
                }
            }
            BackendCommand::OpenAll { group_id } => {
                let Some(group) = find_group(&groups, group_id).cloned() else {
                    report_stale_group(&ui_tx);
                    continue;
                };
                actions.open_all(&group.items).await;
            }
            BackendCommand::RemoveDuplicates { group_id } => {
                let Some(group) = find_group(&groups, group_id).cloned() else {
                    report_stale_group(&ui_tx);
                    continue;
                };
                if let Some(outcome) = actions.remove_duplicates(&group).await {
                    if let Some(cached) = find_group_mut(&mut groups, group_id) {
                        cached
                            .items
                            .retain(|item| !outcome.removed.contains(&item.id));
                    }
                    let _ = ui_tx.try_send(UiEvent::DuplicatesRemoved {
                        group_id,
                        removed: outcome.removed,
                        report: outcome.report,
                    });
                }
            }
            BackendCommand::DeleteGroup { group_id } => {
                let Some(group) = find_group(&groups, group_id).cloned() else {
                    report_stale_group(&ui_tx);
                    continue;
                };
                if actions.delete_group(&group).await {
                    groups.retain(|g| g.id != group_id);
                    let _ = ui_tx.try_send(UiEvent::GroupDeleted { group_id });
                }
            }
            BackendCommand::DeleteItem { group_id, item_id } => {
                let Some(item) = find_item(&groups, group_id, item_id).cloned() else {
                    report_stale_group(&ui_tx);
                    continue;
                };
                if actions.delete_item(&item).await {
                    if let Some(cached) = find_group_mut(&mut groups, group_id) {
                        cached.items.retain(|i| i.id != item_id);
                    }
                    let _ = ui_tx.try_send(UiEvent::ItemDeleted { group_id, item_id });
                }
            }
            BackendCommand::RenameGroup { group_id, title } => {
                let Some(group) = find_group(&groups, group_id).cloned() else {
                    report_stale_group(&ui_tx);
                    continue;
                };
                if actions.rename_group(&group, &title).await {
                    let title = title.trim().to_string();
                    if let Some(cached) = find_group_mut(&mut groups, group_id) {
                        cached.title = title.clone();
                    }
                    let _ = ui_tx.try_send(UiEvent::GroupRenamed { group_id, title });
                }
            }
            BackendCommand::RenameItem {
                group_id,
                item_id,
                title,
            } => {
                let Some(item) = find_item(&groups, group_id, item_id).cloned() else {
                    report_stale_group(&ui_tx);
                    continue;
                };
                if actions.rename_item(&item, &title).await {
                    let title = title.trim().to_string();
                    if let Some(cached) = find_item_mut(&mut groups, group_id, item_id) {
                        cached.title = title.clone();
                    }
                    let _ = ui_tx.try_send(UiEvent::ItemRenamed {
                        group_id,
                        item_id,
                        title,
                    });
                }
            }
            BackendCommand::TogglePinned { group_id, item_id } => {
                let Some(item) = find_item(&groups, group_id, item_id).cloned() else {
                    report_stale_group(&ui_tx);
                    continue;
                };
                if let Some(is_pinned) = actions.toggle_pinned(&item).await {
                    if let Some(cached) = find_item_mut(&mut groups, group_id, item_id) {
                        cached.is_pinned = is_pinned;
                    }
                    let _ = ui_tx.try_send(UiEvent::ItemPinnedChanged {
                        group_id,
                        item_id,
                        is_pinned,
                    });
                }
            }
            BackendCommand::ToggleTodo { group_id, item_id } => {
                let Some(item) = find_item(&groups, group_id, item_id).cloned() else {
                    report_stale_group(&ui_tx);
                    continue;
                };
                if let Some(is_todo) = actions.toggle_todo(&item).await {
                    if let Some(cached) = find_item_mut(&mut groups, group_id, item_id) {
                        cached.is_todo = is_todo;
                    }
                    let _ = ui_tx.try_send(UiEvent::ItemTodoChanged {
                        group_id,
                        item_id,
                        is_todo,
                    });
                }
            }
            BackendCommand::ToggleLock { group_id } => {
                let Some(group) = find_group(&groups, group_id).cloned() else {
                    report_stale_group(&ui_tx);
                    continue;
                };
                if let Some(is_locked) = actions.toggle_lock(&group).await {
                    if let Some(cached) = find_group_mut(&mut groups, group_id) {
                        cached.is_locked = is_locked;
                    }
                    let _ = ui_tx.try_send(UiEvent::GroupLockChanged {
                        group_id,
                        is_locked,
                    });
                }
            }
            BackendCommand::PinToTop { group_id } => {
                let Some(group) = find_group(&groups, group_id).cloned() else {
                    report_stale_group(&ui_tx);
                    continue;
                };
                if actions.pin_to_top(&group).await {
                    if let Some(cached) = find_group_mut(&mut groups, group_id) {
                        cached.position = -1;
                    }
                    let _ = ui_tx.try_send(UiEvent::GroupPinnedToTop { group_id });
                }
            }
            BackendCommand::MoveGroup {
                group_id,
                target_id,
            } => {
                let (Some(group), Some(target)) = (
                    find_group(&groups, group_id).cloned(),
                    find_group(&groups, target_id).cloned(),
                ) else {
                    report_stale_group(&ui_tx);
                    continue;
                };
                if actions.move_group(&group, target_id, &target.title).await {
                    if let Some(cached) = find_group_mut(&mut groups, group_id) {
                        cached.parent_id = Some(target_id);
                    }
                    let _ = ui_tx.try_send(UiEvent::GroupMoved {
                        group_id,
                        target_id,
                    });
                }
            }
            BackendCommand::CreateFolder { parent_id } => {
                if let Some(folder) = actions.create_folder(parent_id).await {
                    groups.push(folder.clone());
                    let _ = ui_tx.try_send(UiEvent::FolderCreated(folder));
                }
            }
            BackendCommand::ShareGroup { group_id } => {
                let Some(group) = find_group(&groups, group_id).cloned() else {
                    report_stale_group(&ui_tx);
                    continue;
                };
                if let Some(share_url) = actions.share_group(&group).await {
                    let _ = ui_tx.try_send(UiEvent::ShareCreated {
                        group_id,
                        share_url,
                    });
                }
            }
            BackendCommand::CopyGroup { group_id } => {
                let Some(group) = find_group(&groups, group_id).cloned() else {
                    report_stale_group(&ui_tx);
                    continue;
                };
                actions.copy_group_to_clipboard(&group).await;
            }
        }
    }
}

async fn load_groups(store: &dyn TabGroupStore, ui_tx: &Sender<UiEvent>, cache: &mut Vec<TabGroup>) {
    match store.list_groups().await {
        Ok(groups) => {
            *cache = groups.clone();
            let _ = ui_tx.try_send(UiEvent::GroupsLoaded(groups));
        }
        Err(err) => {
            warn!(error = %err, "failed to load tab groups");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::LoadGroups,
                classify_service_failure(&err.to_string()),
            )));
        }
    }
}

fn find_group(groups: &[TabGroup], id: GroupId) -> Option<&TabGroup> {
    groups.iter().find(|group| group.id == id)
}

fn find_group_mut(groups: &mut [TabGroup], id: GroupId) -> Option<&mut TabGroup> {
    groups.iter_mut().find(|group| group.id == id)
}

fn find_item(groups: &[TabGroup], group_id: GroupId, item_id: ItemId) -> Option<&TabGroupItem> {
    find_group(groups, group_id)?
        .items
        .iter()
        .find(|item| item.id == item_id)
}

fn find_item_mut(
    groups: &mut [TabGroup],
    group_id: GroupId,
    item_id: ItemId,
) -> Option<&mut TabGroupItem> {
    find_group_mut(groups, group_id)?
        .items
        .iter_mut()
        .find(|item| item.id == item_id)
}

fn report_stale_group(ui_tx: &Sender<UiEvent>) {
    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
        UiErrorContext::Mutation,
        "tab group is no longer loaded; reload and retry",
    )));
}
