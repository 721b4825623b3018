use async_trait::async_trait;
use bson::doc;
use burrow_db::models::{MemberStatus, Membership};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};
use crate::store::MembershipStore;

pub struct MembershipDao {
    pub base: BaseDao<Membership>,
}

impl MembershipDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Membership::COLLECTION),
        }
    }
}

#[async_trait]
impl MembershipStore for MembershipDao {
    async fn get(&self, meeting_id: &str, user_id: &str) -> DaoResult<Option<Membership>> {
        self.base
            .find_one(doc! { "meeting_id": meeting_id, "user_id": user_id })
            .await
    }

    async fn upsert(&self, membership: &Membership) -> DaoResult<()> {
        let filter = doc! {
            "meeting_id": membership.meeting_id.as_str(),
            "user_id": membership.user_id.as_str(),
        };
        // Drop the local _id so a replacement never tries to rewrite it.
        let mut row = membership.clone();
        row.id = None;
        self.base.upsert_one(filter, &row).await
    }

    async fn list_by_meeting(&self, meeting_id: &str) -> DaoResult<Vec<Membership>> {
        self.base
            .find_many(
                doc! { "meeting_id": meeting_id },
                Some(doc! { "joined_at": 1 }),
            )
            .await
    }

    async fn count_by_status(&self, meeting_id: &str, status: MemberStatus) -> DaoResult<u64> {
        self.base
            .count(doc! { "meeting_id": meeting_id, "status": status.as_str() })
            .await
    }
}
