//! Reaction toggling and the aggregation queries a feed or detail page
//! renders reaction state from.

use chrono::Utc;
use futures::future::{try_join, try_join_all};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::Error;
use crate::models::{ReactionState, ReactionsData, UserProfile};

/// Toggles a user's reaction on an echo: removes it if present, adds it
/// otherwise. The check and the write run in one transaction, and the
/// unique index on (echo_id, user_id) rules out a double insert, so
/// concurrent toggles serialize instead of drifting. Returns the state the
/// reaction is in afterwards.
pub async fn toggle_reaction(
    pool: &SqlitePool,
    echo_id: &str,
    user_id: &str,
) -> Result<ReactionState, Error> {
    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, String>("SELECT id FROM echoes WHERE id = ?")
        .bind(echo_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::not_found("echo", echo_id))?;
    sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM reactions WHERE echo_id = ? AND user_id = ?")
            .bind(echo_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

    let state = match existing {
        Some(id) => {
            sqlx::query("DELETE FROM reactions WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            ReactionState::Absent
        }
        None => {
            sqlx::query(
                "INSERT INTO reactions (echo_id, user_id, created_at) VALUES (?, ?, ?)",
            )
            .bind(echo_id)
            .bind(user_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
            ReactionState::Present
        }
    };
    tx.commit().await?;

    info!(echo_id = %echo_id, user_id = %user_id, ?state, "toggled reaction");
    Ok(state)
}

/// True iff the user has a reaction on the echo.
pub async fn is_reacted_by(
    pool: &SqlitePool,
    echo_id: &str,
    user_id: &str,
) -> Result<bool, Error> {
    ensure_echo_exists(pool, echo_id).await?;

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM reactions WHERE echo_id = ? AND user_id = ?")
            .bind(echo_id)
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// The users who reacted to an echo, in reaction insertion order.
pub async fn reacted_users(pool: &SqlitePool, echo_id: &str) -> Result<Vec<UserProfile>, Error> {
    ensure_echo_exists(pool, echo_id).await?;

    let users = sqlx::query_as::<_, UserProfile>(
        "SELECT u.id, u.name, u.username, u.image
         FROM reactions r
         JOIN users u ON u.id = r.user_id
         WHERE r.echo_id = ?
         ORDER BY r.id ASC",
    )
    .bind(echo_id)
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Computes reacted-user lists and the viewer's reaction flag for an
/// optional parent echo plus every listed echo, all awaited concurrently.
/// The per-echo vectors are aligned positionally with `echo_ids`. Any
/// failure fails the whole call; there is no partial result.
pub async fn reactions_data(
    pool: &SqlitePool,
    viewer_id: &str,
    echo_ids: &[String],
    parent_id: Option<&str>,
) -> Result<ReactionsData, Error> {
    let parent = async {
        match parent_id {
            Some(parent_id) => {
                try_join(
                    reacted_users(pool, parent_id),
                    is_reacted_by(pool, parent_id, viewer_id),
                )
                .await
            }
            None => Ok((Vec::new(), false)),
        }
    };

    let per_echo = try_join_all(echo_ids.iter().map(|echo_id| async move {
        try_join(
            reacted_users(pool, echo_id),
            is_reacted_by(pool, echo_id, viewer_id),
        )
        .await
    }));

    let ((parent_reacted_users, parent_reacted_by_viewer), rows) =
        try_join(parent, per_echo).await?;

    let mut reacted_users_per_echo = Vec::with_capacity(rows.len());
    let mut reacted_by_viewer = Vec::with_capacity(rows.len());
    for (users, viewer_reacted) in rows {
        reacted_users_per_echo.push(users);
        reacted_by_viewer.push(viewer_reacted);
    }

    Ok(ReactionsData {
        parent_reacted_users,
        parent_reacted_by_viewer,
        reacted_users: reacted_users_per_echo,
        reacted_by_viewer,
    })
}

async fn ensure_echo_exists(pool: &SqlitePool, echo_id: &str) -> Result<(), Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM echoes WHERE id = ?")
        .bind(echo_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::not_found("echo", echo_id))?;
    Ok(())
}
