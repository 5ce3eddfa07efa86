use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(GroupId);
id_newtype!(ItemId);
id_newtype!(ShareId);

/// A saved group of tabs. Folders are groups that hold other groups
/// instead of items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabGroup {
    pub id: GroupId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<GroupId>,
    pub position: i64,
    pub is_folder: bool,
    pub is_locked: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<TabGroupItem>,
}

impl TabGroup {
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabGroupItem {
    pub id: ItemId,
    pub title: String,
    pub url: String,
    pub is_pinned: bool,
    pub is_todo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareLink {
    pub share_id: ShareId,
    pub share_url: String,
    pub expires_in_days: u32,
}
