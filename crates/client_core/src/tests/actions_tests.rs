use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{GroupId, ItemId, ShareId, ShareLink, TabGroup, TabGroupItem},
    protocol::{CreateShareRequest, UpdateTabGroupItemRequest, UpdateTabGroupRequest},
};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::actions::{GroupActions, BULK_OPEN_CONFIRM_THRESHOLD};
use crate::dialogs::{AlertView, ConfirmView, DialogKind, DialogQueue};
use crate::{ClipboardAccess, LinkOpener, TabGroupStore, TabHandle};

#[derive(Default)]
struct RecordingStore {
    deleted_items: Mutex<Vec<ItemId>>,
    deleted_groups: Mutex<Vec<GroupId>>,
    group_patches: Mutex<Vec<(GroupId, UpdateTabGroupRequest)>>,
    item_patches: Mutex<Vec<(ItemId, UpdateTabGroupItemRequest)>>,
    failing_item_deletes: HashSet<ItemId>,
    fail_mutations: bool,
    share: Option<ShareLink>,
}

impl RecordingStore {
    fn with_failing_item_deletes(mut self, ids: impl IntoIterator<Item = ItemId>) -> Self {
        self.failing_item_deletes = ids.into_iter().collect();
        self
    }

    fn with_share(mut self, share_url: &str) -> Self {
        self.share = Some(ShareLink {
            share_id: ShareId::generate(),
            share_url: share_url.to_string(),
            expires_in_days: 30,
        });
        self
    }

    fn failing() -> Self {
        Self {
            fail_mutations: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl TabGroupStore for RecordingStore {
    async fn list_groups(&self) -> Result<Vec<TabGroup>> {
        Ok(Vec::new())
    }

    async fn update_group(&self, id: GroupId, patch: UpdateTabGroupRequest) -> Result<()> {
        if self.fail_mutations {
            return Err(anyhow!("update rejected"));
        }
        self.group_patches.lock().unwrap().push((id, patch));
        Ok(())
    }

    async fn delete_group(&self, id: GroupId) -> Result<()> {
        if self.fail_mutations {
            return Err(anyhow!("delete rejected"));
        }
        self.deleted_groups.lock().unwrap().push(id);
        Ok(())
    }

    async fn update_item(&self, id: ItemId, patch: UpdateTabGroupItemRequest) -> Result<()> {
        if self.fail_mutations {
            return Err(anyhow!("update rejected"));
        }
        self.item_patches.lock().unwrap().push((id, patch));
        Ok(())
    }

    async fn delete_item(&self, id: ItemId) -> Result<()> {
        if self.fail_mutations || self.failing_item_deletes.contains(&id) {
            return Err(anyhow!("delete rejected for item {id}"));
        }
        self.deleted_items.lock().unwrap().push(id);
        Ok(())
    }

    async fn create_share(&self, _id: GroupId, _request: CreateShareRequest) -> Result<ShareLink> {
        self.share
            .clone()
            .ok_or_else(|| anyhow!("share creation rejected"))
    }

    async fn create_folder(&self, title: &str, parent_id: Option<GroupId>) -> Result<TabGroup> {
        if self.fail_mutations {
            return Err(anyhow!("folder creation rejected"));
        }
        Ok(group_with_items(title, Vec::new()).with_parent(parent_id))
    }
}

#[derive(Default)]
struct RecordingOpener {
    opened: Mutex<Vec<(String, Instant)>>,
    blocked_urls: HashSet<String>,
}

impl RecordingOpener {
    fn with_blocked_urls(urls: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            blocked_urls: urls.into_iter().map(str::to_string).collect(),
        }
    }

    fn dispatched(&self) -> Vec<(String, Instant)> {
        self.opened.lock().unwrap().clone()
    }
}

impl LinkOpener for RecordingOpener {
    fn open(&self, url: &str) -> Option<TabHandle> {
        self.opened
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));
        if self.blocked_urls.contains(url) {
            None
        } else {
            Some(TabHandle { process_id: None })
        }
    }
}

#[derive(Default)]
struct TestClipboard {
    texts: Mutex<Vec<String>>,
    fail: bool,
}

impl TestClipboard {
    fn failing() -> Self {
        Self {
            texts: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

impl ClipboardAccess for TestClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        if self.fail {
            return Err(anyhow!("clipboard rejected"));
        }
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Background "user" that accepts or declines every confirmation and
/// acknowledges every alert, recording what it saw.
struct DialogDriver {
    confirms: Arc<Mutex<Vec<ConfirmView>>>,
    alerts: Arc<Mutex<Vec<AlertView>>>,
    handle: JoinHandle<()>,
}

impl DialogDriver {
    fn spawn(queue: Arc<DialogQueue>, accept: bool) -> Self {
        let confirms = Arc::new(Mutex::new(Vec::new()));
        let alerts = Arc::new(Mutex::new(Vec::new()));
        let handle = tokio::spawn({
            let confirms = Arc::clone(&confirms);
            let alerts = Arc::clone(&alerts);
            async move {
                loop {
                    if let Some(view) = queue.confirm_view() {
                        confirms.lock().unwrap().push(view);
                        queue.resolve_confirm(accept);
                    }
                    if let Some(view) = queue.alert_view() {
                        alerts.lock().unwrap().push(view);
                        queue.resolve_alert();
                    }
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        });
        Self {
            confirms,
            alerts,
            handle,
        }
    }

    fn seen_confirms(&self) -> Vec<ConfirmView> {
        self.confirms.lock().unwrap().clone()
    }

    fn seen_alerts(&self) -> Vec<AlertView> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Drop for DialogDriver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn item(title: &str, url: &str) -> TabGroupItem {
    TabGroupItem {
        id: ItemId::generate(),
        title: title.to_string(),
        url: url.to_string(),
        is_pinned: false,
        is_todo: false,
    }
}

fn group_with_items(title: &str, items: Vec<TabGroupItem>) -> TabGroup {
    TabGroup {
        id: GroupId::generate(),
        title: title.to_string(),
        parent_id: None,
        position: 0,
        is_folder: false,
        is_locked: false,
        tags: Vec::new(),
        created_at: chrono::Utc::now(),
        items,
    }
}

trait WithParent {
    fn with_parent(self, parent_id: Option<GroupId>) -> Self;
}

impl WithParent for TabGroup {
    fn with_parent(mut self, parent_id: Option<GroupId>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

struct Fixture {
    queue: Arc<DialogQueue>,
    store: Arc<RecordingStore>,
    opener: Arc<RecordingOpener>,
    clipboard: Arc<TestClipboard>,
    actions: GroupActions,
}

fn fixture(store: RecordingStore, opener: RecordingOpener, clipboard: TestClipboard) -> Fixture {
    let queue = Arc::new(DialogQueue::new());
    let store = Arc::new(store);
    let opener = Arc::new(opener);
    let clipboard = Arc::new(clipboard);
    let actions = GroupActions::new(
        Arc::clone(&queue),
        Arc::clone(&store) as Arc<dyn TabGroupStore>,
        Arc::clone(&opener) as Arc<dyn LinkOpener>,
        Arc::clone(&clipboard) as Arc<dyn ClipboardAccess>,
    );
    Fixture {
        queue,
        store,
        opener,
        clipboard,
        actions,
    }
}

#[tokio::test(start_paused = true)]
async fn bulk_open_below_threshold_skips_confirmation() {
    let fx = fixture(
        RecordingStore::default(),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    // A declining driver would veto any confirmation; the run must not ask.
    let driver = DialogDriver::spawn(Arc::clone(&fx.queue), false);

    let items = vec![
        item("a", "https://a.example/"),
        item("b", "https://b.example/"),
        item("c", "https://c.example/"),
    ];
    let report = fx.actions.open_all(&items).await.expect("report expected");

    assert_eq!(report.total, 3);
    assert_eq!(report.opened, 3);
    assert_eq!(report.blocked, 0);
    assert!(driver.seen_confirms().is_empty());
    assert_eq!(fx.opener.dispatched().len(), 3);
    assert_eq!(driver.seen_alerts().len(), 1);
    assert_eq!(driver.seen_alerts()[0].kind, DialogKind::Success);
}

#[tokio::test(start_paused = true)]
async fn bulk_open_above_threshold_confirms_then_dispatches_in_order() {
    let fx = fixture(
        RecordingStore::default(),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    let driver = DialogDriver::spawn(Arc::clone(&fx.queue), true);

    let items: Vec<_> = (0..8)
        .map(|i| item(&format!("tab {i}"), &format!("https://site{i}.example/")))
        .collect();
    assert!(items.len() > BULK_OPEN_CONFIRM_THRESHOLD);

    let report = fx.actions.open_all(&items).await.expect("report expected");
    assert_eq!((report.total, report.opened, report.blocked), (8, 8, 0));
    assert_eq!(driver.seen_confirms().len(), 1);
    assert!(driver.seen_confirms()[0].message.contains("8"));

    let dispatched = fx.opener.dispatched();
    assert_eq!(dispatched.len(), 8);
    for (index, (url, _)) in dispatched.iter().enumerate() {
        assert_eq!(*url, format!("https://site{index}.example/"));
    }
    // The configured inter-dispatch delay separates consecutive attempts.
    for pair in dispatched.windows(2) {
        assert_eq!(pair[1].1 - pair[0].1, Duration::from_millis(20));
    }
}

#[tokio::test(start_paused = true)]
async fn bulk_open_decline_dispatches_nothing() {
    let fx = fixture(
        RecordingStore::default(),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    let driver = DialogDriver::spawn(Arc::clone(&fx.queue), false);

    let items: Vec<_> = (0..8)
        .map(|i| item(&format!("tab {i}"), &format!("https://site{i}.example/")))
        .collect();
    let report = fx.actions.open_all(&items).await;

    assert!(report.is_none());
    assert!(fx.opener.dispatched().is_empty());
    assert_eq!(driver.seen_confirms().len(), 1);
    assert!(driver.seen_alerts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn bulk_open_counts_blocked_attempts_without_aborting() {
    let fx = fixture(
        RecordingStore::default(),
        RecordingOpener::with_blocked_urls(["https://site2.example/", "https://site5.example/"]),
        TestClipboard::default(),
    );
    let driver = DialogDriver::spawn(Arc::clone(&fx.queue), true);

    let items: Vec<_> = (0..8)
        .map(|i| item(&format!("tab {i}"), &format!("https://site{i}.example/")))
        .collect();
    let report = fx.actions.open_all(&items).await.expect("report expected");

    assert_eq!((report.total, report.opened, report.blocked), (8, 6, 2));
    // Blocked attempts never stop the remaining dispatches.
    assert_eq!(fx.opener.dispatched().len(), 8);
    let summary = driver.seen_alerts().last().cloned().expect("summary alert");
    assert_eq!(summary.kind, DialogKind::Warning);
    assert!(summary.message.contains("2"));
}

#[tokio::test(start_paused = true)]
async fn bulk_open_with_no_items_only_informs() {
    let fx = fixture(
        RecordingStore::default(),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    let driver = DialogDriver::spawn(Arc::clone(&fx.queue), true);

    assert!(fx.actions.open_all(&[]).await.is_none());
    assert!(fx.opener.dispatched().is_empty());
    assert_eq!(driver.seen_alerts().len(), 1);
    assert_eq!(driver.seen_alerts()[0].kind, DialogKind::Info);
}

#[tokio::test(start_paused = true)]
async fn duplicate_removal_keeps_first_occurrence() {
    let fx = fixture(
        RecordingStore::default(),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    let driver = DialogDriver::spawn(Arc::clone(&fx.queue), true);

    let first = item("a", "https://a.example/");
    let second = item("b", "https://b.example/");
    let duplicate = item("a again", "https://a.example/");
    let duplicate_id = duplicate.id;
    let group = group_with_items("links", vec![first, second, duplicate]);

    let outcome = fx
        .actions
        .remove_duplicates(&group)
        .await
        .expect("outcome expected");

    assert_eq!(driver.seen_confirms().len(), 1);
    assert!(driver.seen_confirms()[0].message.contains("1 duplicate"));
    assert_eq!(fx.store.deleted_items.lock().unwrap().as_slice(), &[duplicate_id]);
    assert_eq!(outcome.report.total, 1);
    assert_eq!(outcome.report.succeeded, 1);
    assert_eq!(outcome.report.failed, 0);
    assert_eq!(outcome.removed, vec![duplicate_id]);
}

#[tokio::test(start_paused = true)]
async fn duplicate_removal_with_no_duplicates_stops_early() {
    let fx = fixture(
        RecordingStore::default(),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    let driver = DialogDriver::spawn(Arc::clone(&fx.queue), true);

    let group = group_with_items(
        "links",
        vec![item("a", "https://a.example/"), item("b", "https://b.example/")],
    );
    assert!(fx.actions.remove_duplicates(&group).await.is_none());
    assert!(driver.seen_confirms().is_empty());
    assert!(fx.store.deleted_items.lock().unwrap().is_empty());
    assert_eq!(driver.seen_alerts()[0].kind, DialogKind::Info);
}

#[tokio::test(start_paused = true)]
async fn duplicate_removal_tolerates_partial_failure() {
    let mut items = vec![item("origin", "https://dup.example/")];
    items.extend((0..8).map(|i| item(&format!("dup {i}"), "https://dup.example/")));
    let failing = [items[2].id, items[5].id];
    let group = group_with_items("links", items);

    let fx = fixture(
        RecordingStore::default().with_failing_item_deletes(failing),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    let driver = DialogDriver::spawn(Arc::clone(&fx.queue), true);

    let outcome = fx
        .actions
        .remove_duplicates(&group)
        .await
        .expect("outcome expected");

    assert_eq!(outcome.report.total, 8);
    assert_eq!(outcome.report.succeeded, 6);
    assert_eq!(outcome.report.failed, 2);
    assert_eq!(outcome.removed.len(), 6);
    assert!(!outcome.removed.contains(&failing[0]));
    assert!(!outcome.removed.contains(&failing[1]));
    let summary = driver.seen_alerts().last().cloned().expect("summary alert");
    assert_eq!(summary.kind, DialogKind::Warning);
}

#[tokio::test(start_paused = true)]
async fn duplicate_removal_decline_deletes_nothing() {
    let group = group_with_items(
        "links",
        vec![
            item("a", "https://a.example/"),
            item("a again", "https://a.example/"),
        ],
    );
    let fx = fixture(
        RecordingStore::default(),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    let driver = DialogDriver::spawn(Arc::clone(&fx.queue), false);

    assert!(fx.actions.remove_duplicates(&group).await.is_none());
    assert_eq!(driver.seen_confirms().len(), 1);
    assert!(fx.store.deleted_items.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn delete_group_requires_acceptance() {
    let group = group_with_items("work", Vec::new());

    let fx = fixture(
        RecordingStore::default(),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    let driver = DialogDriver::spawn(Arc::clone(&fx.queue), false);
    assert!(!fx.actions.delete_group(&group).await);
    assert!(fx.store.deleted_groups.lock().unwrap().is_empty());
    assert_eq!(driver.seen_confirms().len(), 1);
    drop(driver);

    let fx = fixture(
        RecordingStore::default(),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    let _driver = DialogDriver::spawn(Arc::clone(&fx.queue), true);
    assert!(fx.actions.delete_group(&group).await);
    assert_eq!(fx.store.deleted_groups.lock().unwrap().as_slice(), &[group.id]);
}

#[tokio::test(start_paused = true)]
async fn failed_deletion_surfaces_an_error_alert() {
    let group = group_with_items("work", Vec::new());
    let fx = fixture(
        RecordingStore::failing(),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    let driver = DialogDriver::spawn(Arc::clone(&fx.queue), true);

    assert!(!fx.actions.delete_group(&group).await);
    let alert = driver.seen_alerts().last().cloned().expect("error alert");
    assert_eq!(alert.kind, DialogKind::Error);
    assert_eq!(alert.title, "Operation failed");
}

#[tokio::test(start_paused = true)]
async fn rename_rejects_blank_titles_before_the_store() {
    let group = group_with_items("work", Vec::new());
    let fx = fixture(
        RecordingStore::default(),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    let driver = DialogDriver::spawn(Arc::clone(&fx.queue), true);

    assert!(!fx.actions.rename_group(&group, "   ").await);
    assert!(fx.store.group_patches.lock().unwrap().is_empty());
    assert_eq!(driver.seen_alerts()[0].kind, DialogKind::Error);

    assert!(fx.actions.rename_group(&group, "  renamed  ").await);
    let patches = fx.store.group_patches.lock().unwrap();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].1.title.as_deref(), Some("renamed"));
}

#[tokio::test(start_paused = true)]
async fn toggle_lock_flips_the_current_state() {
    let mut group = group_with_items("work", Vec::new());
    group.is_locked = true;
    let fx = fixture(
        RecordingStore::default(),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    let _driver = DialogDriver::spawn(Arc::clone(&fx.queue), true);

    assert_eq!(fx.actions.toggle_lock(&group).await, Some(false));
    let patches = fx.store.group_patches.lock().unwrap();
    assert_eq!(patches[0].1.is_locked, Some(false));
}

#[tokio::test(start_paused = true)]
async fn share_copies_link_and_reports_success() {
    let group = group_with_items("work", Vec::new());
    let fx = fixture(
        RecordingStore::default().with_share("https://marks.example/s/abc"),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    let driver = DialogDriver::spawn(Arc::clone(&fx.queue), true);

    let url = fx.actions.share_group(&group).await;
    assert_eq!(url.as_deref(), Some("https://marks.example/s/abc"));
    assert_eq!(
        fx.clipboard.texts.lock().unwrap().as_slice(),
        &["https://marks.example/s/abc".to_string()]
    );
    let alert = driver.seen_alerts().last().cloned().expect("share alert");
    assert_eq!(alert.kind, DialogKind::Success);
    assert!(alert.message.contains("https://marks.example/s/abc"));
}

#[tokio::test(start_paused = true)]
async fn share_degrades_when_the_clipboard_fails() {
    let group = group_with_items("work", Vec::new());
    let fx = fixture(
        RecordingStore::default().with_share("https://marks.example/s/abc"),
        RecordingOpener::default(),
        TestClipboard::failing(),
    );
    let driver = DialogDriver::spawn(Arc::clone(&fx.queue), true);

    // Clipboard failure never fails the share itself.
    let url = fx.actions.share_group(&group).await;
    assert_eq!(url.as_deref(), Some("https://marks.example/s/abc"));
    let alert = driver.seen_alerts().last().cloned().expect("share alert");
    assert_eq!(alert.kind, DialogKind::Warning);
    assert!(alert.message.contains("https://marks.example/s/abc"));
}

#[tokio::test(start_paused = true)]
async fn copy_group_formats_title_url_paragraphs() {
    let group = group_with_items(
        "work",
        vec![
            item("Docs", "https://docs.example/"),
            item("Mail", "https://mail.example/"),
        ],
    );
    let fx = fixture(
        RecordingStore::default(),
        RecordingOpener::default(),
        TestClipboard::default(),
    );
    let _driver = DialogDriver::spawn(Arc::clone(&fx.queue), true);

    assert!(fx.actions.copy_group_to_clipboard(&group).await);
    assert_eq!(
        fx.clipboard.texts.lock().unwrap().as_slice(),
        &["Docs\nhttps://docs.example/\n\nMail\nhttps://mail.example/".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn missing_capabilities_surface_error_alerts() {
    let queue = Arc::new(DialogQueue::new());
    let actions = GroupActions::new(
        Arc::clone(&queue),
        Arc::new(crate::MissingTabGroupStore),
        Arc::new(RecordingOpener::default()),
        Arc::new(crate::MissingClipboard),
    );
    let driver = DialogDriver::spawn(Arc::clone(&queue), true);

    let group = group_with_items("work", vec![item("Docs", "https://docs.example/")]);
    assert!(!actions.delete_group(&group).await);
    assert!(!actions.copy_group_to_clipboard(&group).await);

    let alerts = driver.seen_alerts();
    assert_eq!(alerts.len(), 2);
    assert!(alerts.iter().all(|alert| alert.kind == DialogKind::Error));
}

#[test]
fn url_normalization_treats_equivalent_urls_as_duplicates() {
    use crate::actions::duplicate_items;

    let first = item("a", "https://a.example");
    let second = item("a slash", "https://a.example/");
    let third = item("a spaced", "  https://a.example/  ");
    let expected = vec![second.id, third.id];
    assert_eq!(duplicate_items(&[first, second, third]), expected);

    let odd_one = item("not a url", "not a url");
    let odd_two = item("not a url again", " not a url ");
    let expected = vec![odd_two.id];
    assert_eq!(duplicate_items(&[odd_one, odd_two]), expected);
}
