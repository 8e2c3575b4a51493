use sqlx::SqlitePool;
use tracing::info;

use crate::error::Error;
use crate::models::{Community, CommunityProfile};
use crate::repositories::{placeholders, BIND_LIMIT};

// Input data for creating or updating a community profile
#[derive(Debug, Clone, serde::Deserialize)]
pub struct UpsertCommunityData {
    pub id: String,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
}

/// Inserts a community, or updates its profile in place if the id already
/// exists.
pub async fn upsert_community(
    pool: &SqlitePool,
    data: UpsertCommunityData,
) -> Result<Community, Error> {
    // execute the write to completion, then read the row back; RETURNING
    // through a row fetch can stop stepping before the DML finishes
    sqlx::query(
        "INSERT INTO communities (id, username, name, image, bio)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (id) DO UPDATE SET
             username = excluded.username,
             name = excluded.name,
             image = excluded.image,
             bio = excluded.bio",
    )
    .bind(&data.id)
    .bind(&data.username)
    .bind(&data.name)
    .bind(&data.image)
    .bind(&data.bio)
    .execute(pool)
    .await?;

    let community = sqlx::query_as::<_, Community>(
        "SELECT id, username, name, image, bio FROM communities WHERE id = ?",
    )
    .bind(&data.id)
    .fetch_one(pool)
    .await?;

    info!(community_id = %community.id, "upserted community");
    Ok(community)
}

/// Fetches a single community by id.
pub async fn get_community_by_id(
    pool: &SqlitePool,
    community_id: &str,
) -> Result<Option<Community>, Error> {
    let community = sqlx::query_as::<_, Community>(
        "SELECT id, username, name, image, bio FROM communities WHERE id = ?",
    )
    .bind(community_id)
    .fetch_optional(pool)
    .await?;
    Ok(community)
}

/// Fetches lightweight profiles for a set of community ids.
pub async fn fetch_communities_by_ids(
    pool: &SqlitePool,
    ids: &[String],
) -> Result<Vec<CommunityProfile>, Error> {
    let mut profiles = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(BIND_LIMIT) {
        let sql = format!(
            "SELECT id, name, username, image FROM communities WHERE id IN ({})",
            placeholders(chunk.len())
        );
        let mut query = sqlx::query_as::<_, CommunityProfile>(&sql);
        for id in chunk {
            query = query.bind(id);
        }
        profiles.extend(query.fetch_all(pool).await?);
    }
    Ok(profiles)
}

/// The echoes posted into a community, oldest first. This is the derived
/// replacement for a stored community-posts list.
pub async fn community_echo_ids(
    pool: &SqlitePool,
    community_id: &str,
) -> Result<Vec<String>, Error> {
    get_community_by_id(pool, community_id)
        .await?
        .ok_or_else(|| Error::not_found("community", community_id))?;

    let ids = sqlx::query_scalar::<_, String>(
        "SELECT id FROM echoes WHERE community_id = ? ORDER BY rowid ASC",
    )
    .bind(community_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
