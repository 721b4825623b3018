use async_trait::async_trait;
use bson::doc;
use burrow_db::models::User;
use mongodb::Database;

use super::base::{BaseDao, DaoResult};
use crate::store::UserDirectory;

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }
}

#[async_trait]
impl UserDirectory for UserDao {
    async fn find_many(&self, user_ids: &[String]) -> DaoResult<Vec<User>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.base
            .find_many(doc! { "_id": { "$in": user_ids.to_vec() } }, None)
            .await
    }
}
