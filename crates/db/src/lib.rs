pub mod indexes;
pub mod models;

use burrow_config::DatabaseSettings;
use mongodb::{Client, Database};
use tracing::info;

/// Connects to MongoDB and makes sure the collections carry their indexes.
pub async fn connect(settings: &DatabaseSettings) -> Result<Database, mongodb::error::Error> {
    let client = Client::with_uri_str(&settings.url).await?;
    let db = client.database(&settings.name);
    info!(database = %settings.name, "Connected to MongoDB");

    indexes::ensure_indexes(&db).await?;
    Ok(db)
}
