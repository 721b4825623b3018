use async_trait::async_trait;
use bson::doc;
use burrow_db::models::{Meeting, Membership};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};
use crate::store::MeetingStore;

pub struct MeetingDao {
    pub base: BaseDao<Meeting>,
    pub members: BaseDao<Membership>,
}

impl MeetingDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Meeting::COLLECTION),
            members: BaseDao::new(db, Membership::COLLECTION),
        }
    }
}

#[async_trait]
impl MeetingStore for MeetingDao {
    async fn get(&self, meeting_id: &str) -> DaoResult<Option<Meeting>> {
        self.base.find_one(doc! { "_id": meeting_id }).await
    }

    // Two writes, not a transaction: a standalone mongod has no sessions.
    async fn insert(&self, meeting: &Meeting, host: &Membership) -> DaoResult<()> {
        self.base.insert_one(meeting).await?;
        self.members.insert_one(host).await
    }
}
