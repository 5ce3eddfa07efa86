//! Global dialog request queue: two single-flight slots (confirmation and
//! alert) that turn a future user click into a resolvable future.
//!
//! A raise installs a pending request carrying a oneshot sender and returns
//! the matching receiver wrapped as a future; the presenter resolves the
//! slot from the UI thread. Every raised request settles exactly once:
//! either through `resolve_confirm`/`resolve_alert`, or by displacement
//! when a newer request overwrites the slot.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Warning,
    Error,
    Success,
}

/// Parameters for [`DialogQueue::confirm`]. Unset fields fall back to the
/// confirmation defaults (title "Confirm", warning kind, "OK"/"Cancel").
#[derive(Debug, Clone, Default)]
pub struct ConfirmSpec {
    pub title: Option<String>,
    pub message: String,
    pub kind: Option<DialogKind>,
    pub confirm_label: Option<String>,
    pub cancel_label: Option<String>,
}

/// Parameters for [`DialogQueue::alert`]. Unset fields fall back to the
/// alert defaults (title "Notice", info kind, "OK").
#[derive(Debug, Clone, Default)]
pub struct AlertSpec {
    pub title: Option<String>,
    pub message: String,
    pub kind: Option<DialogKind>,
    pub confirm_label: Option<String>,
}

/// Displayable fields of a pending confirmation, cloned out for rendering.
#[derive(Debug, Clone)]
pub struct ConfirmView {
    pub title: String,
    pub message: String,
    pub kind: DialogKind,
    pub confirm_label: String,
    pub cancel_label: String,
}

#[derive(Debug, Clone)]
pub struct AlertView {
    pub title: String,
    pub message: String,
    pub kind: DialogKind,
    pub confirm_label: String,
}

struct PendingConfirm {
    view: ConfirmView,
    tx: oneshot::Sender<bool>,
}

struct PendingAlert {
    view: AlertView,
    tx: oneshot::Sender<()>,
}

/// The two request slots plus an optional repaint hook. Constructed once in
/// `main` and shared (`Arc`) between the backend worker and the presenter.
#[derive(Default)]
pub struct DialogQueue {
    confirm: Mutex<Option<PendingConfirm>>,
    alert: Mutex<Option<PendingAlert>>,
    notifier: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DialogQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook invoked on every raise, so a renderer polling the
    /// slots can wake up before the next user interaction.
    pub fn set_notifier(&self, notifier: impl Fn() + Send + Sync + 'static) {
        *lock(&self.notifier) = Some(Box::new(notifier));
    }

    fn notify(&self) {
        if let Some(notifier) = lock(&self.notifier).as_ref() {
            notifier();
        }
    }

    /// Raises a confirmation request and returns a future resolving to the
    /// user's decision. A confirmation already pending is settled to
    /// `false` before the new one is installed, so no caller waits forever.
    pub fn confirm(&self, spec: ConfirmSpec) -> impl Future<Output = bool> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        let view = ConfirmView {
            title: spec.title.unwrap_or_else(|| "Confirm".to_string()),
            message: spec.message,
            kind: spec.kind.unwrap_or(DialogKind::Warning),
            confirm_label: spec.confirm_label.unwrap_or_else(|| "OK".to_string()),
            cancel_label: spec.cancel_label.unwrap_or_else(|| "Cancel".to_string()),
        };
        let displaced = lock(&self.confirm).replace(PendingConfirm { view, tx });
        if let Some(previous) = displaced {
            debug!("pending confirmation displaced by a newer request");
            let _ = previous.tx.send(false);
        }
        self.notify();
        // A dropped sender settles negatively rather than erroring.
        async move { rx.await.unwrap_or(false) }
    }

    /// Raises an alert request; the future resolves when the user
    /// acknowledges it. Displacement settles a pending alert immediately.
    pub fn alert(&self, spec: AlertSpec) -> impl Future<Output = ()> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        let view = AlertView {
            title: spec.title.unwrap_or_else(|| "Notice".to_string()),
            message: spec.message,
            kind: spec.kind.unwrap_or(DialogKind::Info),
            confirm_label: spec.confirm_label.unwrap_or_else(|| "OK".to_string()),
        };
        let displaced = lock(&self.alert).replace(PendingAlert { view, tx });
        if let Some(previous) = displaced {
            debug!("pending alert displaced by a newer request");
            let _ = previous.tx.send(());
        }
        self.notify();
        async move {
            let _ = rx.await;
        }
    }

    /// Settles the pending confirmation with `result` and empties the slot.
    /// No-op when the slot is empty, which absorbs duplicate UI events.
    pub fn resolve_confirm(&self, result: bool) {
        match lock(&self.confirm).take() {
            Some(pending) => {
                let _ = pending.tx.send(result);
            }
            None => debug!("confirm resolution ignored; slot already empty"),
        }
    }

    pub fn resolve_alert(&self) {
        match lock(&self.alert).take() {
            Some(pending) => {
                let _ = pending.tx.send(());
            }
            None => debug!("alert resolution ignored; slot already empty"),
        }
    }

    pub fn confirm_view(&self) -> Option<ConfirmView> {
        lock(&self.confirm).as_ref().map(|pending| pending.view.clone())
    }

    pub fn alert_view(&self) -> Option<AlertView> {
        lock(&self.alert).as_ref().map(|pending| pending.view.clone())
    }

    pub fn info(
        &self,
        message: impl Into<String>,
        title: Option<&str>,
    ) -> impl Future<Output = ()> + Send + 'static {
        self.alert_with_kind(message.into(), title, DialogKind::Info, "Notice")
    }

    pub fn warning(
        &self,
        message: impl Into<String>,
        title: Option<&str>,
    ) -> impl Future<Output = ()> + Send + 'static {
        self.alert_with_kind(message.into(), title, DialogKind::Warning, "Notice")
    }

    pub fn error(
        &self,
        message: impl Into<String>,
        title: Option<&str>,
    ) -> impl Future<Output = ()> + Send + 'static {
        self.alert_with_kind(message.into(), title, DialogKind::Error, "Operation failed")
    }

    pub fn success(
        &self,
        message: impl Into<String>,
        title: Option<&str>,
    ) -> impl Future<Output = ()> + Send + 'static {
        self.alert_with_kind(message.into(), title, DialogKind::Success, "Success")
    }

    fn alert_with_kind(
        &self,
        message: String,
        title: Option<&str>,
        kind: DialogKind,
        default_title: &str,
    ) -> impl Future<Output = ()> + Send + 'static {
        self.alert(AlertSpec {
            title: Some(title.unwrap_or(default_title).to_string()),
            message,
            kind: Some(kind),
            confirm_label: None,
        })
    }
}
