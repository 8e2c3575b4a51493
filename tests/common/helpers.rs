//! Shared helper functions for integration tests
#![allow(dead_code)]

use echoes_db::models::{Community, Echo, User};
use echoes_db::repositories::community_repository::{self, UpsertCommunityData};
use echoes_db::repositories::echo_repository::{self, CreateCommentData, CreateEchoData};
use echoes_db::repositories::user_repository::{self, UpsertUserData};
use sqlx::SqlitePool;

pub async fn create_test_user(pool: &SqlitePool, id: &str) -> User {
    user_repository::upsert_user(
        pool,
        UpsertUserData {
            id: id.to_string(),
            username: format!("{id}_handle"),
            name: format!("{id} name"),
            image: None,
            bio: None,
        },
    )
    .await
    .expect("create test user")
}

pub async fn create_test_community(pool: &SqlitePool, id: &str) -> Community {
    community_repository::upsert_community(
        pool,
        UpsertCommunityData {
            id: id.to_string(),
            username: format!("{id}_handle"),
            name: format!("{id} name"),
            image: None,
            bio: None,
        },
    )
    .await
    .expect("create test community")
}

pub async fn create_test_echo(pool: &SqlitePool, author_id: &str, text: &str) -> Echo {
    echo_repository::create_echo(
        pool,
        CreateEchoData {
            text: text.to_string(),
            author_id: author_id.to_string(),
            community_id: None,
        },
    )
    .await
    .expect("create test echo")
}

pub async fn create_test_echo_in_community(
    pool: &SqlitePool,
    author_id: &str,
    community_id: &str,
    text: &str,
) -> Echo {
    echo_repository::create_echo(
        pool,
        CreateEchoData {
            text: text.to_string(),
            author_id: author_id.to_string(),
            community_id: Some(community_id.to_string()),
        },
    )
    .await
    .expect("create test echo in community")
}

pub async fn create_test_comment(
    pool: &SqlitePool,
    parent_id: &str,
    author_id: &str,
    text: &str,
) -> Echo {
    echo_repository::create_comment(
        pool,
        parent_id,
        CreateCommentData {
            text: text.to_string(),
            author_id: author_id.to_string(),
        },
    )
    .await
    .expect("create test comment")
}
