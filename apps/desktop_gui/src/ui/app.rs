//! App shell: group sidebar, item list, bulk-open progress panel, and the
//! dialog host. Local collections mutate only on success events from the
//! backend worker.

use std::fs;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use client_core::{BulkOpenReport, DialogQueue};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};
use shared::domain::{GroupId, ItemId, TabGroup};
use tracing::warn;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::dialogs;

pub const SETTINGS_STORAGE_KEY: &str = "desktop_gui_settings";

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PersistedDesktopSettings {
    pub sidebar_width: f32,
}

impl Default for PersistedDesktopSettings {
    fn default() -> Self {
        Self {
            sidebar_width: 280.0,
        }
    }
}

pub struct StartupConfig {
    pub server_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenameTarget {
    Group(GroupId),
    Item(GroupId, ItemId),
}

struct RenameBuffer {
    target: RenameTarget,
    text: String,
    focused: bool,
}

struct BulkOpenPanel {
    total: usize,
    rows: Vec<(String, bool)>,
    report: Option<BulkOpenReport>,
}

#[derive(Clone)]
struct GroupRow {
    id: GroupId,
    title: String,
    is_folder: bool,
    is_locked: bool,
    item_count: usize,
    position: i64,
}

impl From<&TabGroup> for GroupRow {
    fn from(group: &TabGroup) -> Self {
        Self {
            id: group.id,
            title: group.title.clone(),
            is_folder: group.is_folder,
            is_locked: group.is_locked,
            item_count: group.item_count(),
            position: group.position,
        }
    }
}

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    dialogs: Arc<DialogQueue>,

    server_url: String,
    groups: Vec<TabGroup>,
    selected_group: Option<GroupId>,
    status: String,
    rename: Option<RenameBuffer>,
    bulk_open: Option<BulkOpenPanel>,

    sidebar_width: f32,
    notifier_installed: bool,
}

impl DesktopGuiApp {
    pub fn bootstrap(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        dialogs: Arc<DialogQueue>,
        startup: StartupConfig,
        persisted: Option<PersistedDesktopSettings>,
    ) -> Self {
        let settings = persisted.unwrap_or_default();
        Self {
            cmd_tx,
            ui_rx,
            dialogs,
            server_url: startup.server_url,
            groups: Vec::new(),
            selected_group: None,
            status: "Starting...".to_string(),
            rename: None,
            bulk_open: None,
            sidebar_width: settings.sidebar_width,
            notifier_installed: false,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::GroupsLoaded(groups) => {
                    self.status = format!("Loaded {} tab groups", groups.len());
                    if let Some(selected) = self.selected_group {
                        if !groups.iter().any(|group| group.id == selected) {
                            self.selected_group = None;
                        }
                    }
                    self.groups = groups;
                }
                UiEvent::GroupDeleted { group_id } => {
                    self.groups.retain(|group| group.id != group_id);
                    if self.selected_group == Some(group_id) {
                        self.selected_group = None;
                    }
                    self.status = "Tab group moved to the trash".to_string();
                }
                UiEvent::ItemDeleted { group_id, item_id } => {
                    if let Some(group) = self.group_mut(group_id) {
                        group.items.retain(|item| item.id != item_id);
                    }
                    self.status = "Tab deleted".to_string();
                }
                UiEvent::GroupRenamed { group_id, title } => {
                    if let Some(group) = self.group_mut(group_id) {
                        group.title = title;
                    }
                    self.status = "Tab group renamed".to_string();
                }
                UiEvent::ItemRenamed {
                    group_id,
                    item_id,
                    title,
                } => {
                    if let Some(item) = self.item_mut(group_id, item_id) {
                        item.title = title;
                    }
                    self.status = "Tab renamed".to_string();
                }
                UiEvent::ItemPinnedChanged {
                    group_id,
                    item_id,
                    is_pinned,
                } => {
                    if let Some(item) = self.item_mut(group_id, item_id) {
                        item.is_pinned = is_pinned;
                    }
                    self.status = if is_pinned { "Pinned" } else { "Unpinned" }.to_string();
                }
                UiEvent::ItemTodoChanged {
                    group_id,
                    item_id,
                    is_todo,
                } => {
                    if let Some(item) = self.item_mut(group_id, item_id) {
                        item.is_todo = is_todo;
                    }
                    self.status = if is_todo {
                        "Marked as todo"
                    } else {
                        "Todo cleared"
                    }
                    .to_string();
                }
                UiEvent::GroupLockChanged {
                    group_id,
                    is_locked,
                } => {
                    if let Some(group) = self.group_mut(group_id) {
                        group.is_locked = is_locked;
                    }
                    self.status = if is_locked {
                        "Tab group locked"
                    } else {
                        "Tab group unlocked"
                    }
                    .to_string();
                }
                UiEvent::GroupPinnedToTop { group_id } => {
                    if let Some(group) = self.group_mut(group_id) {
                        group.position = -1;
                    }
                    self.status = "Pinned to top".to_string();
                }
                UiEvent::GroupMoved {
                    group_id,
                    target_id,
                } => {
                    if let Some(group) = self.group_mut(group_id) {
                        group.parent_id = Some(target_id);
                    }
                    self.status = "Tab group moved".to_string();
                }
                UiEvent::FolderCreated(folder) => {
                    self.status = format!("Created \"{}\"", folder.title);
                    self.groups.push(folder);
                }
                UiEvent::DuplicatesRemoved {
                    group_id,
                    removed,
                    report,
                } => {
                    if let Some(group) = self.group_mut(group_id) {
                        group.items.retain(|item| !removed.contains(&item.id));
                    }
                    self.status = format!(
                        "Removed {} duplicates ({} failed)",
                        report.succeeded, report.failed
                    );
                }
                UiEvent::BulkOpenStarted { total } => {
                    self.bulk_open = Some(BulkOpenPanel {
                        total,
                        rows: Vec::new(),
                        report: None,
                    });
                }
                UiEvent::BulkOpenProgress { url, opened, .. } => {
                    if let Some(panel) = self.bulk_open.as_mut() {
                        panel.rows.push((url, opened));
                    }
                }
                UiEvent::BulkOpenFinished(report) => {
                    if let Some(panel) = self.bulk_open.as_mut() {
                        panel.report = Some(report);
                    }
                    self.status = format!(
                        "Opened {} of {} tabs ({} blocked)",
                        report.opened, report.total, report.blocked
                    );
                }
                UiEvent::ShareCreated { share_url, .. } => {
                    self.status = format!("Share link created: {share_url}");
                }
                UiEvent::Error(err) => {
                    warn!(context = ?err.context(), category = ?err.category(), "backend error: {}", err.message());
                    self.status = if err.requires_reauth() {
                        format!("Sign-in required: {}", err.message())
                    } else {
                        format!("Error: {}", err.message())
                    };
                }
            }
        }
    }

    fn group_mut(&mut self, group_id: GroupId) -> Option<&mut TabGroup> {
        self.groups.iter_mut().find(|group| group.id == group_id)
    }

    fn item_mut(
        &mut self,
        group_id: GroupId,
        item_id: ItemId,
    ) -> Option<&mut shared::domain::TabGroupItem> {
        self.group_mut(group_id)?
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        let mut reload = false;
        let mut new_folder = false;
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Tab Groups");
                ui.separator();
                ui.label(&self.server_url);
                if ui.button("Reload").clicked() {
                    reload = true;
                }
                if ui.button("New folder").clicked() {
                    new_folder = true;
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(&self.status);
                });
            });
        });
        if reload {
            self.dispatch(BackendCommand::LoadGroups);
        }
        if new_folder {
            self.dispatch(BackendCommand::CreateFolder { parent_id: None });
        }
    }

    fn show_group_sidebar(&mut self, ui: &mut egui::Ui) {
        let mut rows: Vec<GroupRow> = self.groups.iter().map(GroupRow::from).collect();
        rows.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        });
        let folders: Vec<(GroupId, String)> = rows
            .iter()
            .filter(|row| row.is_folder)
            .map(|row| (row.id, row.title.clone()))
            .collect();

        let mut commands: Vec<BackendCommand> = Vec::new();
        let mut begin_rename: Option<RenameBuffer> = None;
        let mut export_group: Option<GroupId> = None;
        let mut cancel_rename = false;

        egui::ScrollArea::vertical().show(ui, |ui| {
            for row in &rows {
                if self.rename.as_ref().map(|buffer| buffer.target)
                    == Some(RenameTarget::Group(row.id))
                {
                    let mut submitted = false;
                    if let Some(buffer) = self.rename.as_mut() {
                        let response = ui.text_edit_singleline(&mut buffer.text);
                        if !buffer.focused {
                            response.request_focus();
                            buffer.focused = true;
                        }
                        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                            submitted = true;
                        }
                        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                            cancel_rename = true;
                        }
                    }
                    if submitted {
                        if let Some(buffer) = self.rename.take() {
                            commands.push(BackendCommand::RenameGroup {
                                group_id: row.id,
                                title: buffer.text,
                            });
                        }
                    }
                    continue;
                }

                let mut label = String::new();
                if row.is_folder {
                    label.push_str("📁 ");
                }
                if row.is_locked {
                    label.push_str("🔒 ");
                }
                label.push_str(&row.title);
                if !row.is_folder {
                    label.push_str(&format!(" ({})", row.item_count));
                }

                let selected = self.selected_group == Some(row.id);
                let response = ui.selectable_label(selected, label);
                if response.clicked() {
                    self.selected_group = Some(row.id);
                }
                response.context_menu(|ui| {
                    if !row.is_folder {
                        if ui.button("Open all tabs").clicked() {
                            commands.push(BackendCommand::OpenAll { group_id: row.id });
                            ui.close();
                        }
                        if ui.button("Remove duplicates").clicked() {
                            commands.push(BackendCommand::RemoveDuplicates { group_id: row.id });
                            ui.close();
                        }
                        if ui.button("Share...").clicked() {
                            commands.push(BackendCommand::ShareGroup { group_id: row.id });
                            ui.close();
                        }
                        if ui.button("Copy to clipboard").clicked() {
                            commands.push(BackendCommand::CopyGroup { group_id: row.id });
                            ui.close();
                        }
                        if ui.button("Export as Markdown...").clicked() {
                            export_group = Some(row.id);
                            ui.close();
                        }
                        ui.separator();
                    }
                    if ui.button("Rename").clicked() {
                        begin_rename = Some(RenameBuffer {
                            target: RenameTarget::Group(row.id),
                            text: row.title.clone(),
                            focused: false,
                        });
                        ui.close();
                    }
                    if ui.button("Pin to top").clicked() {
                        commands.push(BackendCommand::PinToTop { group_id: row.id });
                        ui.close();
                    }
                    let lock_label = if row.is_locked { "Unlock" } else { "Lock" };
                    if ui.button(lock_label).clicked() {
                        commands.push(BackendCommand::ToggleLock { group_id: row.id });
                        ui.close();
                    }
                    if !folders.is_empty() && !row.is_folder {
                        ui.menu_button("Move to", |ui| {
                            for (folder_id, folder_title) in &folders {
                                if ui.button(folder_title).clicked() {
                                    commands.push(BackendCommand::MoveGroup {
                                        group_id: row.id,
                                        target_id: *folder_id,
                                    });
                                    ui.close();
                                }
                            }
                        });
                    }
                    if row.is_folder {
                        if ui.button("New folder inside").clicked() {
                            commands.push(BackendCommand::CreateFolder {
                                parent_id: Some(row.id),
                            });
                            ui.close();
                        }
                    }
                    ui.separator();
                    if ui.button("Delete").clicked() {
                        commands.push(BackendCommand::DeleteGroup { group_id: row.id });
                        ui.close();
                    }
                });
            }
        });

        if cancel_rename {
            self.rename = None;
        }
        if let Some(buffer) = begin_rename {
            self.rename = Some(buffer);
        }
        if let Some(group_id) = export_group {
            self.export_group_markdown(group_id);
        }
        for cmd in commands {
            self.dispatch(cmd);
        }
    }

    fn show_items_panel(&mut self, ui: &mut egui::Ui) {
        let Some(group_id) = self.selected_group else {
            ui.centered_and_justified(|ui| {
                ui.label("Select a tab group");
            });
            return;
        };
        let Some(group) = self
            .groups
            .iter()
            .find(|group| group.id == group_id)
            .cloned()
        else {
            return;
        };

        let mut commands: Vec<BackendCommand> = Vec::new();
        let mut begin_rename: Option<RenameBuffer> = None;
        let mut cancel_rename = false;

        ui.horizontal(|ui| {
            ui.heading(&group.title);
            ui.label(format!("{} tabs", group.items.len()));
            if !group.tags.is_empty() {
                ui.label(format!("tags: {}", group.tags.join(", ")));
            }
            ui.label(format_created_at(group.created_at));
        });
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            for item in &group.items {
                ui.horizontal(|ui| {
                    let pin = if item.is_pinned { "★" } else { "☆" };
                    if ui.small_button(pin).on_hover_text("Pin").clicked() {
                        commands.push(BackendCommand::TogglePinned {
                            group_id,
                            item_id: item.id,
                        });
                    }
                    let todo = if item.is_todo { "☑" } else { "☐" };
                    if ui.small_button(todo).on_hover_text("Todo").clicked() {
                        commands.push(BackendCommand::ToggleTodo {
                            group_id,
                            item_id: item.id,
                        });
                    }

                    if self.rename.as_ref().map(|buffer| buffer.target)
                        == Some(RenameTarget::Item(group_id, item.id))
                    {
                        let mut submitted = false;
                        if let Some(buffer) = self.rename.as_mut() {
                            let response = ui.text_edit_singleline(&mut buffer.text);
                            if !buffer.focused {
                                response.request_focus();
                                buffer.focused = true;
                            }
                            if response.lost_focus()
                                && ui.input(|i| i.key_pressed(egui::Key::Enter))
                            {
                                submitted = true;
                            }
                            if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                                cancel_rename = true;
                            }
                        }
                        if submitted {
                            if let Some(buffer) = self.rename.take() {
                                commands.push(BackendCommand::RenameItem {
                                    group_id,
                                    item_id: item.id,
                                    title: buffer.text,
                                });
                            }
                        }
                        return;
                    }

                    let response =
                        ui.selectable_label(false, format!("{} — {}", item.title, item.url));
                    if response.double_clicked() {
                        commands.push(BackendCommand::OpenItem {
                            group_id,
                            item_id: item.id,
                        });
                    }
                    response.context_menu(|ui| {
                        if ui.button("Open").clicked() {
                            commands.push(BackendCommand::OpenItem {
                                group_id,
                                item_id: item.id,
                            });
                            ui.close();
                        }
                        if ui.button("Rename").clicked() {
                            begin_rename = Some(RenameBuffer {
                                target: RenameTarget::Item(group_id, item.id),
                                text: item.title.clone(),
                                focused: false,
                            });
                            ui.close();
                        }
                        ui.separator();
                        if ui.button("Delete").clicked() {
                            commands.push(BackendCommand::DeleteItem {
                                group_id,
                                item_id: item.id,
                            });
                            ui.close();
                        }
                    });
                });
            }
        });

        if cancel_rename {
            self.rename = None;
        }
        if let Some(buffer) = begin_rename {
            self.rename = Some(buffer);
        }
        for cmd in commands {
            self.dispatch(cmd);
        }
    }

    fn show_bulk_open_panel(&mut self, ctx: &egui::Context) {
        let Some(panel) = &self.bulk_open else {
            return;
        };
        let mut close = false;
        egui::Window::new("Opening tabs")
            .id(egui::Id::new("bulk_open_panel"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::RIGHT_TOP, [-16.0, 48.0])
            .show(ctx, |ui| {
                ui.label(format!("{} / {}", panel.rows.len(), panel.total));
                egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                    for (index, (url, opened)) in panel.rows.iter().enumerate() {
                        let color = if *opened {
                            egui::Color32::from_rgb(88, 184, 108)
                        } else {
                            egui::Color32::from_rgb(222, 84, 84)
                        };
                        ui.colored_label(color, format!("{}. {}", index + 1, url));
                    }
                });
                if let Some(report) = panel.report {
                    ui.separator();
                    ui.label(format!(
                        "Opened {}, blocked {}",
                        report.opened, report.blocked
                    ));
                    if ui.button("Close").clicked() {
                        close = true;
                    }
                }
            });
        if close {
            self.bulk_open = None;
        }
    }

    fn export_group_markdown(&mut self, group_id: GroupId) {
        let Some(group) = self.groups.iter().find(|group| group.id == group_id) else {
            return;
        };
        let markdown = render_group_markdown(group);
        let mut dialog = rfd::FileDialog::new().set_file_name(format!("{}.md", group.title));
        if let Some(dir) = dirs::download_dir() {
            dialog = dialog.set_directory(dir);
        }
        if let Some(path) = dialog.save_file() {
            match fs::write(&path, markdown) {
                Ok(()) => self.status = format!("Exported to {}", path.display()),
                Err(err) => {
                    warn!(error = %err, "markdown export failed");
                    self.status = "Export failed; please retry".to_string();
                }
            }
        }
    }
}

fn format_created_at(created_at: DateTime<Utc>) -> String {
    created_at.format("created %Y-%m-%d %H:%M UTC").to_string()
}

fn render_group_markdown(group: &TabGroup) -> String {
    let mut markdown = format!("# {}\n\n", group.title);
    markdown.push_str(&format!(
        "Created: {}\n",
        group.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    markdown.push_str(&format!("Tabs: {}\n\n", group.items.len()));
    if !group.tags.is_empty() {
        markdown.push_str(&format!("Tags: {}\n\n", group.tags.join(", ")));
    }
    markdown.push_str("---\n\n");
    for (index, item) in group.items.iter().enumerate() {
        markdown.push_str(&format!("{}. [{}]({})\n", index + 1, item.title, item.url));
        if item.is_pinned {
            markdown.push_str("   - pinned\n");
        }
        if item.is_todo {
            markdown.push_str("   - todo\n");
        }
        markdown.push('\n');
    }
    markdown
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.notifier_installed {
            let repaint_ctx = ctx.clone();
            self.dialogs.set_notifier(move || repaint_ctx.request_repaint());
            self.notifier_installed = true;
        }

        self.process_ui_events();
        self.show_top_bar(ctx);

        let sidebar = egui::SidePanel::left("group_sidebar")
            .default_width(self.sidebar_width)
            .show(ctx, |ui| {
                self.show_group_sidebar(ui);
            });
        self.sidebar_width = sidebar.response.rect.width();

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_items_panel(ui);
        });

        self.show_bulk_open_panel(ctx);
        dialogs::show_dialogs(ctx, &self.dialogs);

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedDesktopSettings {
            sidebar_width: self.sidebar_width,
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}
