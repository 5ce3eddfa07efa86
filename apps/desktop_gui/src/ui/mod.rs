//! UI layer for the desktop GUI: app shell and dialog presenter.

pub mod app;
pub mod dialogs;

pub use app::{DesktopGuiApp, StartupConfig};
