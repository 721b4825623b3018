use serde::{Deserialize, Serialize};

/// Identity record keyed by the token subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: Option<String>,
}

impl User {
    pub const COLLECTION: &'static str = "users";
}
