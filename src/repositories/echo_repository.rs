use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Error;
use crate::models::{CommentNode, CommunityProfile, Echo, FeedPage, PopulatedEcho, UserProfile};
use crate::repositories::{community_repository, placeholders, user_repository, BIND_LIMIT};
use crate::utils::PageParams;

// Input data for creating a new top-level echo
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateEchoData {
    pub text: String,
    pub author_id: String,
    pub community_id: Option<String>,
}

// Input data for creating a comment; the parent id comes from the caller
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateCommentData {
    pub text: String,
    pub author_id: String,
}

/// Inserts a new top-level echo. The author and, when supplied, the
/// community must resolve before anything is written.
pub async fn create_echo(pool: &SqlitePool, data: CreateEchoData) -> Result<Echo, Error> {
    let author = user_repository::get_user_by_id(pool, &data.author_id)
        .await?
        .ok_or_else(|| Error::not_found("user", &data.author_id))?;

    let community_id = match &data.community_id {
        Some(id) => {
            community_repository::get_community_by_id(pool, id)
                .await?
                .ok_or_else(|| Error::not_found("community", id))?;
            Some(id.clone())
        }
        None => None,
    };

    let echo = Echo {
        id: Uuid::new_v4().to_string(),
        text: data.text,
        author_id: author.id,
        community_id,
        parent_id: None,
        created_at: Utc::now(),
    };
    insert_echo(pool, &echo).await?;

    info!(echo_id = %echo.id, author_id = %echo.author_id, "created echo");
    Ok(echo)
}

/// Inserts a comment under an existing echo.
pub async fn create_comment(
    pool: &SqlitePool,
    parent_id: &str,
    data: CreateCommentData,
) -> Result<Echo, Error> {
    let parent = get_echo_by_id(pool, parent_id)
        .await?
        .ok_or_else(|| Error::not_found("echo", parent_id))?;
    let author = user_repository::get_user_by_id(pool, &data.author_id)
        .await?
        .ok_or_else(|| Error::not_found("user", &data.author_id))?;

    let echo = Echo {
        id: Uuid::new_v4().to_string(),
        text: data.text,
        author_id: author.id,
        community_id: None,
        parent_id: Some(parent.id),
        created_at: Utc::now(),
    };
    insert_echo(pool, &echo).await?;

    info!(echo_id = %echo.id, parent_id = %parent_id, "created comment");
    Ok(echo)
}

async fn insert_echo(pool: &SqlitePool, echo: &Echo) -> Result<(), Error> {
    sqlx::query(
        "INSERT INTO echoes (id, text, author_id, community_id, parent_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&echo.id)
    .bind(&echo.text)
    .bind(&echo.author_id)
    .bind(&echo.community_id)
    .bind(&echo.parent_id)
    .bind(echo.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Replaces an echo's text in place, leaving every relation untouched.
pub async fn update_echo_text(
    pool: &SqlitePool,
    echo_id: &str,
    text: &str,
) -> Result<Echo, Error> {
    // execute the write to completion, then read the row back; RETURNING
    // through a row fetch can stop stepping before the DML finishes
    let result = sqlx::query("UPDATE echoes SET text = ? WHERE id = ?")
        .bind(text)
        .bind(echo_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found("echo", echo_id));
    }

    let updated = get_echo_by_id(pool, echo_id)
        .await?
        .ok_or_else(|| Error::not_found("echo", echo_id))?;

    info!(echo_id = %updated.id, "updated echo text");
    Ok(updated)
}

/// Fetches a single echo row by id.
pub async fn get_echo_by_id(pool: &SqlitePool, echo_id: &str) -> Result<Option<Echo>, Error> {
    let echo = sqlx::query_as::<_, Echo>(
        "SELECT id, text, author_id, community_id, parent_id, created_at
         FROM echoes WHERE id = ?",
    )
    .bind(echo_id)
    .fetch_optional(pool)
    .await?;
    Ok(echo)
}

/// Deletes an echo together with its full comment subtree and every
/// reaction on it. Returns the number of echoes removed.
pub async fn delete_echo(pool: &SqlitePool, echo_id: &str) -> Result<u64, Error> {
    get_echo_by_id(pool, echo_id)
        .await?
        .ok_or_else(|| Error::not_found("echo", echo_id))?;

    // Explicit worklist over the parent_id index; comment trees can be
    // arbitrarily deep, so no recursion.
    let mut subtree: Vec<String> = vec![echo_id.to_owned()];
    let mut frontier: Vec<String> = vec![echo_id.to_owned()];
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for chunk in frontier.chunks(BIND_LIMIT) {
            let sql = format!(
                "SELECT id FROM echoes WHERE parent_id IN ({})",
                placeholders(chunk.len())
            );
            let mut query = sqlx::query_scalar::<_, String>(&sql);
            for id in chunk {
                query = query.bind(id);
            }
            next.extend(query.fetch_all(pool).await?);
        }
        subtree.extend(next.iter().cloned());
        frontier = next;
    }

    let mut tx = pool.begin().await?;
    for chunk in subtree.chunks(BIND_LIMIT) {
        let ph = placeholders(chunk.len());

        let sql = format!("DELETE FROM reactions WHERE echo_id IN ({ph})");
        let mut query = sqlx::query(&sql);
        for id in chunk {
            query = query.bind(id);
        }
        query.execute(&mut *tx).await?;

        let sql = format!("DELETE FROM echoes WHERE id IN ({ph})");
        let mut query = sqlx::query(&sql);
        for id in chunk {
            query = query.bind(id);
        }
        query.execute(&mut *tx).await?;
    }
    tx.commit().await?;

    info!(echo_id = %echo_id, deleted = subtree.len(), "deleted echo subtree");
    Ok(subtree.len() as u64)
}

/// Fetches an echo with author, community and two levels of comments
/// resolved, each comment with its author profile.
pub async fn fetch_echo_detail(pool: &SqlitePool, echo_id: &str) -> Result<PopulatedEcho, Error> {
    let echo = get_echo_by_id(pool, echo_id)
        .await?
        .ok_or_else(|| Error::not_found("echo", echo_id))?;

    let children = children_of(pool, std::slice::from_ref(&echo.id)).await?;
    let child_ids: Vec<String> = children.iter().map(|c| c.id.clone()).collect();
    let grandchildren = children_of(pool, &child_ids).await?;

    let mut author_ids: Vec<String> = vec![echo.author_id.clone()];
    author_ids.extend(children.iter().map(|c| c.author_id.clone()));
    author_ids.extend(grandchildren.iter().map(|c| c.author_id.clone()));
    let authors = profile_map(pool, &author_ids).await?;

    let community = match &echo.community_id {
        Some(id) => community_repository::fetch_communities_by_ids(
            pool,
            std::slice::from_ref(id),
        )
        .await?
        .into_iter()
        .next(),
        None => None,
    };

    let mut by_parent: HashMap<String, Vec<CommentNode>> = HashMap::new();
    for grandchild in grandchildren {
        let author = author_of(&authors, &grandchild.author_id)?;
        if let Some(parent) = grandchild.parent_id.clone() {
            by_parent.entry(parent).or_default().push(CommentNode {
                echo: grandchild,
                author,
                children: Vec::new(),
            });
        }
    }

    let mut nodes = Vec::with_capacity(children.len());
    for child in children {
        let author = author_of(&authors, &child.author_id)?;
        let grand_nodes = by_parent.remove(&child.id).unwrap_or_default();
        nodes.push(CommentNode {
            echo: child,
            author,
            children: grand_nodes,
        });
    }

    let author = author_of(&authors, &echo.author_id)?;
    Ok(PopulatedEcho {
        echo,
        author,
        community,
        children: nodes,
    })
}

/// Fetches one page of top-level echoes, newest first, each populated with
/// author, community and one level of comments with their authors.
pub async fn fetch_feed(pool: &SqlitePool, params: PageParams) -> Result<FeedPage, Error> {
    let roots = sqlx::query_as::<_, Echo>(
        "SELECT id, text, author_id, community_id, parent_id, created_at
         FROM echoes
         WHERE parent_id IS NULL
         ORDER BY created_at DESC, rowid DESC
         LIMIT ? OFFSET ?",
    )
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM echoes WHERE parent_id IS NULL")
        .fetch_one(pool)
        .await?;

    let root_ids: Vec<String> = roots.iter().map(|e| e.id.clone()).collect();
    let children = children_of(pool, &root_ids).await?;

    let mut author_ids: Vec<String> = roots.iter().map(|e| e.author_id.clone()).collect();
    author_ids.extend(children.iter().map(|c| c.author_id.clone()));
    let authors = profile_map(pool, &author_ids).await?;

    let community_ids: Vec<String> = roots
        .iter()
        .filter_map(|e| e.community_id.clone())
        .collect();
    let communities: HashMap<String, CommunityProfile> =
        community_repository::fetch_communities_by_ids(pool, &community_ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

    let mut by_parent: HashMap<String, Vec<CommentNode>> = HashMap::new();
    for child in children {
        let author = author_of(&authors, &child.author_id)?;
        if let Some(parent) = child.parent_id.clone() {
            by_parent.entry(parent).or_default().push(CommentNode {
                echo: child,
                author,
                children: Vec::new(),
            });
        }
    }

    let returned = roots.len() as i64;
    let mut echoes = Vec::with_capacity(roots.len());
    for root in roots {
        let author = author_of(&authors, &root.author_id)?;
        let community = root
            .community_id
            .as_ref()
            .and_then(|id| communities.get(id).cloned());
        let children = by_parent.remove(&root.id).unwrap_or_default();
        echoes.push(PopulatedEcho {
            echo: root,
            author,
            community,
            children,
        });
    }

    let has_more = total > params.offset() + returned;
    debug!(
        page = params.page(),
        returned, has_more, "fetched feed page"
    );
    Ok(FeedPage { echoes, has_more })
}

/// The echoes a user has authored, newest first (profile tab listing).
pub async fn fetch_echoes_by_author(
    pool: &SqlitePool,
    author_id: &str,
) -> Result<Vec<Echo>, Error> {
    user_repository::get_user_by_id(pool, author_id)
        .await?
        .ok_or_else(|| Error::not_found("user", author_id))?;

    let echoes = sqlx::query_as::<_, Echo>(
        "SELECT id, text, author_id, community_id, parent_id, created_at
         FROM echoes
         WHERE author_id = ?
         ORDER BY created_at DESC, rowid DESC",
    )
    .bind(author_id)
    .fetch_all(pool)
    .await?;
    Ok(echoes)
}

/// The echoes posted into a community, newest first (community tab listing).
pub async fn fetch_echoes_by_community(
    pool: &SqlitePool,
    community_id: &str,
) -> Result<Vec<Echo>, Error> {
    community_repository::get_community_by_id(pool, community_id)
        .await?
        .ok_or_else(|| Error::not_found("community", community_id))?;

    let echoes = sqlx::query_as::<_, Echo>(
        "SELECT id, text, author_id, community_id, parent_id, created_at
         FROM echoes
         WHERE community_id = ?
         ORDER BY created_at DESC, rowid DESC",
    )
    .bind(community_id)
    .fetch_all(pool)
    .await?;
    Ok(echoes)
}

/// One comment level for a set of parents, oldest first.
async fn children_of(pool: &SqlitePool, parent_ids: &[String]) -> Result<Vec<Echo>, Error> {
    let mut children = Vec::new();
    for chunk in parent_ids.chunks(BIND_LIMIT) {
        let sql = format!(
            "SELECT id, text, author_id, community_id, parent_id, created_at
             FROM echoes
             WHERE parent_id IN ({})
             ORDER BY created_at ASC, rowid ASC",
            placeholders(chunk.len())
        );
        let mut query = sqlx::query_as::<_, Echo>(&sql);
        for id in chunk {
            query = query.bind(id);
        }
        children.extend(query.fetch_all(pool).await?);
    }
    Ok(children)
}

async fn profile_map(
    pool: &SqlitePool,
    ids: &[String],
) -> Result<HashMap<String, UserProfile>, Error> {
    let profiles = user_repository::fetch_users_by_ids(pool, ids).await?;
    Ok(profiles.into_iter().map(|p| (p.id.clone(), p)).collect())
}

fn author_of(
    profiles: &HashMap<String, UserProfile>,
    user_id: &str,
) -> Result<UserProfile, Error> {
    profiles
        .get(user_id)
        .cloned()
        .ok_or_else(|| Error::not_found("user", user_id))
}
