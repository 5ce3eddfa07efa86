//! Desktop GUI for the tab-group manager.
//!
//! Wiring: one explicitly constructed dialog queue shared between the
//! backend worker (which raises requests) and the UI (which resolves
//! them); bounded channels carry commands down and events back up.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use client_core::DialogQueue;
use crossbeam_channel::bounded;
use eframe::egui;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use backend_bridge::runtime::{self, BackendConfig};
use controller::events::UiEvent;
use ui::app::{PersistedDesktopSettings, SETTINGS_STORAGE_KEY};
use ui::{DesktopGuiApp, StartupConfig};

#[derive(Parser)]
#[command(name = "desktop_gui", about = "Tab-group manager desktop client")]
struct Args {
    /// Base URL of the tab-group service.
    #[arg(long, default_value = "http://127.0.0.1:8460")]
    server_url: String,

    /// Milliseconds between bulk-open dispatches.
    #[arg(long, default_value_t = 20)]
    open_delay_ms: u64,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let dialogs = Arc::new(DialogQueue::new());
    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    runtime::launch(
        BackendConfig {
            server_url: args.server_url.clone(),
            open_dispatch_delay: Duration::from_millis(args.open_delay_ms),
        },
        Arc::clone(&dialogs),
        cmd_rx,
        ui_tx,
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Tab Groups")
            .with_inner_size([1180.0, 760.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Tab Groups",
        options,
        Box::new(move |cc| {
            let persisted = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedDesktopSettings>(&text).ok())
            });
            Ok(Box::new(DesktopGuiApp::bootstrap(
                cmd_tx,
                ui_rx,
                dialogs,
                StartupConfig {
                    server_url: args.server_url,
                },
                persisted,
            )))
        }),
    )
}
