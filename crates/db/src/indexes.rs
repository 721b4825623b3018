use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{ChatMessage, Meeting, Membership};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Meetings
    create_indexes(
        db,
        Meeting::COLLECTION,
        vec![
            index(bson::doc! { "owner_id": 1 }),
            index(bson::doc! { "beginning_time": 1 }),
        ],
    )
    .await?;

    // Memberships: one row per (meeting, user), waitlist ordered by joined_at
    create_indexes(
        db,
        Membership::COLLECTION,
        vec![
            index_unique(bson::doc! { "meeting_id": 1, "user_id": 1 }),
            index(bson::doc! { "meeting_id": 1, "status": 1, "joined_at": -1 }),
            index(bson::doc! { "user_id": 1, "status": 1 }),
        ],
    )
    .await?;

    // Chat messages
    create_indexes(
        db,
        ChatMessage::COLLECTION,
        vec![index(bson::doc! { "meeting_id": 1, "date": -1 })],
    )
    .await?;

    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    let coll = db.collection::<bson::Document>(collection);
    match coll.create_indexes(indexes.clone()).await {
        Ok(_) => {
            info!(collection, "Indexes created");
            Ok(())
        }
        Err(e) => {
            // IndexKeySpecsConflict (code 86): same name, different options.
            if let mongodb::error::ErrorKind::Command(ref cmd_err) = *e.kind {
                if cmd_err.code == 86 {
                    tracing::warn!(
                        collection,
                        "Index conflict detected, dropping conflicting indexes and retrying"
                    );
                    coll.drop_indexes().await?;
                    coll.create_indexes(indexes).await?;
                    info!(collection, "Indexes recreated after conflict resolution");
                    return Ok(());
                }
            }
            Err(e)
        }
    }
}
