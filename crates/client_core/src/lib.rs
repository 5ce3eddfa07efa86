//! Client-side core for the tab-group manager: the dialog request queue,
//! the bulk action orchestrator, and the capability seams they run against.
//!
//! The UI layer supplies real implementations of the capability traits
//! (store, link opener, clipboard, progress surface); every trait also has
//! a `Missing*`/no-op fallback so the core composes without a live
//! environment.

use std::process::Command;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{GroupId, ItemId, ShareLink, TabGroup},
    protocol::{CreateShareRequest, UpdateTabGroupItemRequest, UpdateTabGroupRequest},
};
use tracing::warn;

pub mod actions;
pub mod dialogs;
pub mod http;

pub use actions::{
    BulkDeleteReport, BulkOpenReport, DuplicateRemoval, GroupActions,
    BULK_OPEN_CONFIRM_THRESHOLD, DEFAULT_OPEN_DISPATCH_DELAY, SHARE_EXPIRY_DAYS,
};
pub use dialogs::{AlertSpec, AlertView, ConfirmSpec, ConfirmView, DialogKind, DialogQueue};
pub use http::HttpTabGroupStore;

/// Remote tab-group store consumed by the orchestrator. Mutations are
/// issued one call per operation; callers update local state only after a
/// call returns Ok.
#[async_trait]
pub trait TabGroupStore: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<TabGroup>>;
    async fn update_group(&self, id: GroupId, patch: UpdateTabGroupRequest) -> Result<()>;
    async fn delete_group(&self, id: GroupId) -> Result<()>;
    async fn update_item(&self, id: ItemId, patch: UpdateTabGroupItemRequest) -> Result<()>;
    async fn delete_item(&self, id: ItemId) -> Result<()>;
    async fn create_share(&self, id: GroupId, request: CreateShareRequest) -> Result<ShareLink>;
    async fn create_folder(&self, title: &str, parent_id: Option<GroupId>) -> Result<TabGroup>;
}

pub struct MissingTabGroupStore;

#[async_trait]
impl TabGroupStore for MissingTabGroupStore {
    async fn list_groups(&self) -> Result<Vec<TabGroup>> {
        Err(anyhow!("tab-group store is unavailable"))
    }

    async fn update_group(&self, id: GroupId, _patch: UpdateTabGroupRequest) -> Result<()> {
        Err(anyhow!("tab-group store is unavailable for group {id}"))
    }

    async fn delete_group(&self, id: GroupId) -> Result<()> {
        Err(anyhow!("tab-group store is unavailable for group {id}"))
    }

    async fn update_item(&self, id: ItemId, _patch: UpdateTabGroupItemRequest) -> Result<()> {
        Err(anyhow!("tab-group store is unavailable for item {id}"))
    }

    async fn delete_item(&self, id: ItemId) -> Result<()> {
        Err(anyhow!("tab-group store is unavailable for item {id}"))
    }

    async fn create_share(&self, id: GroupId, _request: CreateShareRequest) -> Result<ShareLink> {
        Err(anyhow!("tab-group store is unavailable for group {id}"))
    }

    async fn create_folder(&self, _title: &str, _parent_id: Option<GroupId>) -> Result<TabGroup> {
        Err(anyhow!("tab-group store is unavailable"))
    }
}

/// Handle for a successfully dispatched open attempt. An opener returning
/// `None` means the attempt was blocked (popup blocker, missing browser).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabHandle {
    pub process_id: Option<u32>,
}

pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str) -> Option<TabHandle>;
}

/// Opens links through the platform browser launcher.
pub struct SystemLinkOpener;

impl LinkOpener for SystemLinkOpener {
    fn open(&self, url: &str) -> Option<TabHandle> {
        #[cfg(target_os = "windows")]
        let spawned = Command::new("cmd").args(["/C", "start", "", url]).spawn();
        #[cfg(target_os = "macos")]
        let spawned = Command::new("open").arg(url).spawn();
        #[cfg(all(unix, not(target_os = "macos")))]
        let spawned = Command::new("xdg-open").arg(url).spawn();

        match spawned {
            Ok(child) => Some(TabHandle {
                process_id: Some(child.id()),
            }),
            Err(err) => {
                warn!(url, error = %err, "failed to hand link to the system browser");
                None
            }
        }
    }
}

pub trait ClipboardAccess: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;
}

pub struct MissingClipboard;

impl ClipboardAccess for MissingClipboard {
    fn set_text(&self, _text: &str) -> Result<()> {
        Err(anyhow!("clipboard is unavailable"))
    }
}

/// Presentation surface the orchestrator notifies during a bulk open. The
/// orchestrator never owns or awaits it.
pub trait ProgressSurface: Send + Sync {
    fn bulk_open_started(&self, total: usize);
    fn link_dispatched(&self, index: usize, url: &str, opened: bool);
    fn bulk_open_finished(&self, report: &BulkOpenReport);
}

pub struct NoopProgressSurface;

impl ProgressSurface for NoopProgressSurface {
    fn bulk_open_started(&self, _total: usize) {}

    fn link_dispatched(&self, _index: usize, _url: &str, _opened: bool) {}

    fn bulk_open_finished(&self, _report: &BulkOpenReport) {}
}

#[cfg(test)]
mod tests;
