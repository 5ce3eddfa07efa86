//! Bulk and single-item group actions, confirmation-gated through the
//! dialog queue.
//!
//! Every method is a hard catch boundary: per-item failures are logged and
//! folded into the run's report, store failures surface as error alerts,
//! and nothing propagates an `Err` out of a run. Callers learn whether a
//! mutation happened from the return value and update local state only
//! then.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use shared::{
    domain::{GroupId, ItemId, TabGroup, TabGroupItem},
    protocol::{CreateShareRequest, UpdateTabGroupItemRequest, UpdateTabGroupRequest},
};
use tokio::time::sleep;
use tracing::warn;
use url::Url;

use crate::dialogs::{AlertSpec, ConfirmSpec, DialogKind, DialogQueue};
use crate::{ClipboardAccess, LinkOpener, NoopProgressSurface, ProgressSurface, TabGroupStore};

/// Opening more links than this in one run asks the user first.
pub const BULK_OPEN_CONFIRM_THRESHOLD: usize = 5;

/// Pause between open dispatches; rapid-fire window creation trips
/// popup-blocker heuristics.
pub const DEFAULT_OPEN_DISPATCH_DELAY: Duration = Duration::from_millis(20);

pub const SHARE_EXPIRY_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOpenReport {
    pub total: usize,
    pub opened: usize,
    pub blocked: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkDeleteReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Outcome of a duplicate-removal run: the aggregate report plus the ids
/// that were actually deleted, for local state updates.
#[derive(Debug, Clone)]
pub struct DuplicateRemoval {
    pub report: BulkDeleteReport,
    pub removed: Vec<ItemId>,
}

pub struct GroupActions {
    dialogs: Arc<DialogQueue>,
    store: Arc<dyn TabGroupStore>,
    opener: Arc<dyn LinkOpener>,
    clipboard: Arc<dyn ClipboardAccess>,
    progress: Arc<dyn ProgressSurface>,
    open_dispatch_delay: Duration,
}

impl GroupActions {
    pub fn new(
        dialogs: Arc<DialogQueue>,
        store: Arc<dyn TabGroupStore>,
        opener: Arc<dyn LinkOpener>,
        clipboard: Arc<dyn ClipboardAccess>,
    ) -> Self {
        Self {
            dialogs,
            store,
            opener,
            clipboard,
            progress: Arc::new(NoopProgressSurface),
            open_dispatch_delay: DEFAULT_OPEN_DISPATCH_DELAY,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSurface>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_open_dispatch_delay(mut self, delay: Duration) -> Self {
        self.open_dispatch_delay = delay;
        self
    }

    /// Opens every item in list order, throttled, classifying each attempt
    /// as opened or blocked. Asks for confirmation above the threshold.
    /// Returns `None` when there was nothing to do or the user declined.
    pub async fn open_all(&self, items: &[TabGroupItem]) -> Option<BulkOpenReport> {
        if items.is_empty() {
            self.dialogs.info("No tabs to open", None).await;
            return None;
        }
        if items.len() > BULK_OPEN_CONFIRM_THRESHOLD {
            let accepted = self
                .dialogs
                .confirm(ConfirmSpec {
                    title: Some("Open multiple tabs".to_string()),
                    message: format!("Open {} tabs?", items.len()),
                    kind: Some(DialogKind::Warning),
                    ..ConfirmSpec::default()
                })
                .await;
            if !accepted {
                return None;
            }
        }

        self.progress.bulk_open_started(items.len());
        let mut report = BulkOpenReport {
            total: items.len(),
            opened: 0,
            blocked: 0,
        };
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                sleep(self.open_dispatch_delay).await;
            }
            let opened = self.opener.open(&item.url).is_some();
            if opened {
                report.opened += 1;
            } else {
                warn!(url = %item.url, "open attempt blocked");
                report.blocked += 1;
            }
            self.progress.link_dispatched(index, &item.url, opened);
        }
        self.progress.bulk_open_finished(&report);

        if report.blocked > 0 {
            self.dialogs
                .warning(
                    format!(
                        "Opened {} of {} tabs; {} were blocked by the browser",
                        report.opened, report.total, report.blocked
                    ),
                    None,
                )
                .await;
        } else {
            self.dialogs
                .success(format!("Opened {} tabs", report.opened), None)
                .await;
        }
        Some(report)
    }

    /// Deletes every later occurrence of an already-seen URL. Deletions run
    /// concurrently and fail independently; successful ones are never
    /// rolled back.
    pub async fn remove_duplicates(&self, group: &TabGroup) -> Option<DuplicateRemoval> {
        let duplicates = duplicate_items(&group.items);
        if duplicates.is_empty() {
            self.dialogs.info("No duplicates found", None).await;
            return None;
        }

        let accepted = self
            .dialogs
            .confirm(ConfirmSpec {
                title: Some("Remove duplicates".to_string()),
                message: format!(
                    "Found {} duplicate {}. Remove {}?",
                    duplicates.len(),
                    if duplicates.len() == 1 { "tab" } else { "tabs" },
                    if duplicates.len() == 1 { "it" } else { "them" },
                ),
                kind: Some(DialogKind::Warning),
                ..ConfirmSpec::default()
            })
            .await;
        if !accepted {
            return None;
        }

        let results = join_all(duplicates.iter().map(|id| {
            let store = Arc::clone(&self.store);
            let id = *id;
            async move { (id, store.delete_item(id).await) }
        }))
        .await;

        let mut removed = Vec::new();
        let mut failed = 0;
        for (id, result) in results {
            match result {
                Ok(()) => removed.push(id),
                Err(err) => {
                    failed += 1;
                    warn!(item = %id, error = %err, "duplicate deletion failed");
                }
            }
        }
        let report = BulkDeleteReport {
            total: duplicates.len(),
            succeeded: removed.len(),
            failed,
        };

        if report.failed > 0 {
            self.dialogs
                .warning(
                    format!(
                        "Removed {} duplicates; {} could not be deleted",
                        report.succeeded, report.failed
                    ),
                    None,
                )
                .await;
        } else {
            self.dialogs
                .success(format!("Removed {} duplicates", report.succeeded), None)
                .await;
        }
        Some(DuplicateRemoval { report, removed })
    }

    /// Confirmation, then a single delete. Returns whether the group was
    /// deleted (declining counts as not deleted, not as an error).
    pub async fn delete_group(&self, group: &TabGroup) -> bool {
        let accepted = self
            .dialogs
            .confirm(ConfirmSpec {
                title: Some("Delete tab group".to_string()),
                message: format!(
                    "Delete \"{}\"? It will be moved to the trash.",
                    group.title
                ),
                kind: Some(DialogKind::Warning),
                ..ConfirmSpec::default()
            })
            .await;
        if !accepted {
            return false;
        }
        match self.store.delete_group(group.id).await {
            Ok(()) => true,
            Err(err) => {
                warn!(group = %group.id, error = %err, "failed to delete tab group");
                self.dialogs
                    .error("Failed to delete the tab group; please retry", None)
                    .await;
                false
            }
        }
    }

    pub async fn delete_item(&self, item: &TabGroupItem) -> bool {
        let accepted = self
            .dialogs
            .confirm(ConfirmSpec {
                title: Some("Delete tab".to_string()),
                message: format!("Delete \"{}\"? This cannot be undone.", item.title),
                kind: Some(DialogKind::Warning),
                ..ConfirmSpec::default()
            })
            .await;
        if !accepted {
            return false;
        }
        match self.store.delete_item(item.id).await {
            Ok(()) => true,
            Err(err) => {
                warn!(item = %item.id, error = %err, "failed to delete tab");
                self.dialogs
                    .error("Failed to delete the tab; please retry", None)
                    .await;
                false
            }
        }
    }

    /// Confirmation, then a single reparenting update.
    pub async fn move_group(&self, group: &TabGroup, target: GroupId, target_title: &str) -> bool {
        let accepted = self
            .dialogs
            .confirm(ConfirmSpec {
                title: Some("Move tab group".to_string()),
                message: format!("Move \"{}\" into \"{}\"?", group.title, target_title),
                kind: Some(DialogKind::Warning),
                ..ConfirmSpec::default()
            })
            .await;
        if !accepted {
            return false;
        }
        match self
            .store
            .update_group(group.id, UpdateTabGroupRequest::parent(target))
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(group = %group.id, error = %err, "failed to move tab group");
                self.dialogs
                    .error("Failed to move the tab group; please retry", None)
                    .await;
                false
            }
        }
    }

    pub async fn rename_group(&self, group: &TabGroup, new_title: &str) -> bool {
        let title = new_title.trim();
        if title.is_empty() {
            self.dialogs.error("Title cannot be empty", None).await;
            return false;
        }
        match self
            .store
            .update_group(group.id, UpdateTabGroupRequest::title(title))
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(group = %group.id, error = %err, "failed to rename tab group");
                self.dialogs
                    .error("Failed to rename the tab group; please retry", None)
                    .await;
                false
            }
        }
    }

    pub async fn rename_item(&self, item: &TabGroupItem, new_title: &str) -> bool {
        let title = new_title.trim();
        if title.is_empty() {
            self.dialogs.error("Title cannot be empty", None).await;
            return false;
        }
        match self
            .store
            .update_item(item.id, UpdateTabGroupItemRequest::title(title))
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(item = %item.id, error = %err, "failed to rename tab");
                self.dialogs
                    .error("Failed to rename the tab; please retry", None)
                    .await;
                false
            }
        }
    }

    /// Returns the new pinned state on success.
    pub async fn toggle_pinned(&self, item: &TabGroupItem) -> Option<bool> {
        let pinned = !item.is_pinned;
        match self
            .store
            .update_item(item.id, UpdateTabGroupItemRequest::pinned(pinned))
            .await
        {
            Ok(()) => Some(pinned),
            Err(err) => {
                warn!(item = %item.id, error = %err, "failed to toggle pin");
                self.dialogs
                    .error("Failed to update the tab; please retry", None)
                    .await;
                None
            }
        }
    }

    pub async fn toggle_todo(&self, item: &TabGroupItem) -> Option<bool> {
        let todo = !item.is_todo;
        match self
            .store
            .update_item(item.id, UpdateTabGroupItemRequest::todo(todo))
            .await
        {
            Ok(()) => Some(todo),
            Err(err) => {
                warn!(item = %item.id, error = %err, "failed to toggle todo");
                self.dialogs
                    .error("Failed to update the tab; please retry", None)
                    .await;
                None
            }
        }
    }

    /// Returns the new locked state on success.
    pub async fn toggle_lock(&self, group: &TabGroup) -> Option<bool> {
        let locked = !group.is_locked;
        match self
            .store
            .update_group(group.id, UpdateTabGroupRequest::locked(locked))
            .await
        {
            Ok(()) => Some(locked),
            Err(err) => {
                warn!(group = %group.id, error = %err, "failed to toggle lock");
                self.dialogs
                    .error("Failed to update the tab group; please retry", None)
                    .await;
                None
            }
        }
    }

    /// Sorts the group ahead of its siblings.
    pub async fn pin_to_top(&self, group: &TabGroup) -> bool {
        match self
            .store
            .update_group(group.id, UpdateTabGroupRequest::position(-1))
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(group = %group.id, error = %err, "failed to pin tab group to top");
                self.dialogs
                    .error("Failed to pin the tab group; please retry", None)
                    .await;
                false
            }
        }
    }

    pub async fn create_folder(&self, parent_id: Option<GroupId>) -> Option<TabGroup> {
        match self.store.create_folder("New folder", parent_id).await {
            Ok(folder) => Some(folder),
            Err(err) => {
                warn!(error = %err, "failed to create folder");
                self.dialogs
                    .error("Failed to create the folder; please retry", None)
                    .await;
                None
            }
        }
    }

    /// Creates a public share link. Clipboard copy is best-effort: its
    /// failure downgrades the alert but never fails the share.
    pub async fn share_group(&self, group: &TabGroup) -> Option<String> {
        let link = match self
            .store
            .create_share(
                group.id,
                CreateShareRequest {
                    is_public: true,
                    expires_in_days: SHARE_EXPIRY_DAYS,
                },
            )
            .await
        {
            Ok(link) => link,
            Err(err) => {
                warn!(group = %group.id, error = %err, "failed to create share link");
                self.dialogs
                    .error("Failed to create the share link; please retry", None)
                    .await;
                return None;
            }
        };

        match self.clipboard.set_text(&link.share_url) {
            Ok(()) => {
                self.dialogs
                    .alert(AlertSpec {
                        title: Some("Share link created".to_string()),
                        message: format!(
                            "The share link was copied to the clipboard:\n\n{}\n\nValid for {} days.",
                            link.share_url, link.expires_in_days
                        ),
                        kind: Some(DialogKind::Success),
                        confirm_label: None,
                    })
                    .await;
            }
            Err(err) => {
                warn!(error = %err, "share link clipboard copy failed");
                self.dialogs
                    .alert(AlertSpec {
                        title: Some("Share link created".to_string()),
                        message: format!(
                            "Share link:\n\n{}\n\nValid for {} days. Copying to the clipboard failed; copy it manually.",
                            link.share_url, link.expires_in_days
                        ),
                        kind: Some(DialogKind::Warning),
                        confirm_label: None,
                    })
                    .await;
            }
        }
        Some(link.share_url)
    }

    /// Copies "title\nurl" paragraphs for every item in the group.
    pub async fn copy_group_to_clipboard(&self, group: &TabGroup) -> bool {
        if group.items.is_empty() {
            self.dialogs.info("This group has no tabs", None).await;
            return false;
        }
        let text = group
            .items
            .iter()
            .map(|item| format!("{}\n{}", item.title, item.url))
            .collect::<Vec<_>>()
            .join("\n\n");
        match self.clipboard.set_text(&text) {
            Ok(()) => {
                self.dialogs.success("Copied to clipboard", None).await;
                true
            }
            Err(err) => {
                warn!(error = %err, "group clipboard copy failed");
                self.dialogs.error("Failed to copy to the clipboard", None).await;
                false
            }
        }
    }
}

/// Later occurrences of an already-seen URL, in list order. The first
/// occurrence always survives.
pub(crate) fn duplicate_items(items: &[TabGroupItem]) -> Vec<ItemId> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for item in items {
        if !seen.insert(normalize_url(&item.url)) {
            duplicates.push(item.id);
        }
    }
    duplicates
}

/// Canonical form used for duplicate matching; unparseable URLs compare by
/// their trimmed text.
pub(crate) fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) => url.to_string(),
        Err(_) => trimmed.to_string(),
    }
}
