//! Backend commands queued from UI to backend worker.

use shared::domain::{GroupId, ItemId};

pub enum BackendCommand {
    LoadGroups,
    OpenItem {
        group_id: GroupId,
        item_id: ItemId,
    },
    OpenAll {
        group_id: GroupId,
    },
    RemoveDuplicates {
        group_id: GroupId,
    },
    DeleteGroup {
        group_id: GroupId,
    },
    DeleteItem {
        group_id: GroupId,
        item_id: ItemId,
    },
    RenameGroup {
        group_id: GroupId,
        title: String,
    },
    RenameItem {
        group_id: GroupId,
        item_id: ItemId,
        title: String,
    },
    TogglePinned {
        group_id: GroupId,
        item_id: ItemId,
    },
    ToggleTodo {
        group_id: GroupId,
        item_id: ItemId,
    },
    ToggleLock {
        group_id: GroupId,
    },
    PinToTop {
        group_id: GroupId,
    },
    MoveGroup {
        group_id: GroupId,
        target_id: GroupId,
    },
    CreateFolder {
        parent_id: Option<GroupId>,
    },
    ShareGroup {
        group_id: GroupId,
    },
    CopyGroup {
        group_id: GroupId,
    },
}
