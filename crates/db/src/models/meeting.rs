use bson::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Zero means unlimited.
    #[serde(default)]
    pub capacity: u32,
    pub beginning_time: DateTime,
    pub end_time: DateTime,
    pub created_at: DateTime,
}

impl Meeting {
    pub const COLLECTION: &'static str = "meetings";

    pub fn is_unlimited(&self) -> bool {
        self.capacity == 0
    }
}
