use sqlx::SqlitePool;
use tracing::info;

use crate::error::Error;
use crate::models::{User, UserProfile};
use crate::repositories::{placeholders, BIND_LIMIT};
use crate::utils::PageParams;

// Input data for creating or updating a user profile
#[derive(Debug, Clone, serde::Deserialize)]
pub struct UpsertUserData {
    pub id: String,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
}

/// Inserts a user profile, or updates it in place if the id already exists.
pub async fn upsert_user(pool: &SqlitePool, data: UpsertUserData) -> Result<User, Error> {
    // execute the write to completion, then read the row back; RETURNING
    // through a row fetch can stop stepping before the DML finishes
    sqlx::query(
        "INSERT INTO users (id, username, name, image, bio)
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

    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, name, image, bio FROM users WHERE id = ?",
    )
    .bind(&data.id)
    .fetch_one(pool)
    .await?;

    info!(user_id = %user.id, "upserted user");
    Ok(user)
}

/// Fetches a single user by id.
pub async fn get_user_by_id(pool: &SqlitePool, user_id: &str) -> Result<Option<User>, Error> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, name, image, bio FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Fetches lightweight profiles for a set of user ids. Ids that do not
/// resolve are simply absent from the result.
pub async fn fetch_users_by_ids(
    pool: &SqlitePool,
    ids: &[String],
) -> Result<Vec<UserProfile>, Error> {
    let mut profiles = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(BIND_LIMIT) {
        let sql = format!(
            "SELECT id, name, username, image FROM users WHERE id IN ({})",
            placeholders(chunk.len())
        );
        let mut query = sqlx::query_as::<_, UserProfile>(&sql);
        for id in chunk {
            query = query.bind(id);
        }
        profiles.extend(query.fetch_all(pool).await?);
    }
    Ok(profiles)
}

/// Case-insensitive username/name search with paging, newest profiles
/// first. Returns the matching page and whether more matches exist beyond
/// it.
pub async fn search_users(
    pool: &SqlitePool,
    search: &str,
    params: PageParams,
) -> Result<(Vec<User>, bool), Error> {
    let pattern = format!(
        "%{}%",
        search
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    );

    // newest first; rowid is assigned at insert and survives profile updates
    let users = sqlx::query_as::<_, User>(
        "SELECT id, username, name, image, bio
         FROM users
         WHERE username LIKE ? ESCAPE '\\' OR name LIKE ? ESCAPE '\\'
         ORDER BY rowid DESC
         LIMIT ? OFFSET ?",
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users
         WHERE username LIKE ? ESCAPE '\\' OR name LIKE ? ESCAPE '\\'",
    )
    .bind(&pattern)
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let has_more = total > params.offset() + users.len() as i64;
    Ok((users, has_more))
}

/// The echoes a user has authored, oldest first. This is the derived
/// replacement for a stored authored-posts list.
pub async fn authored_echo_ids(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>, Error> {
    get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;

    let ids = sqlx::query_scalar::<_, String>(
        "SELECT id FROM echoes WHERE author_id = ? ORDER BY rowid ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// The echoes a user has reacted to, in reaction insertion order. This is
/// the derived replacement for a stored reacted-posts list.
pub async fn reacted_echo_ids(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>, Error> {
    get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;

    let ids = sqlx::query_scalar::<_, String>(
        "SELECT echo_id FROM reactions WHERE user_id = ? ORDER BY id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
