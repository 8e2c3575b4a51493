// tests/users_api.rs

mod common;

use echoes_db::repositories::community_repository::{self, UpsertCommunityData};
use echoes_db::repositories::user_repository::{self, UpsertUserData};
use echoes_db::utils::PageParams;
use sqlx::SqlitePool;

use common::helpers::{create_test_echo, create_test_user};

#[sqlx::test]
async fn upsert_updates_a_profile_in_place(pool: SqlitePool) -> anyhow::Result<()> {
    create_test_user(&pool, "alice").await;

    let updated = user_repository::upsert_user(
        &pool,
        UpsertUserData {
            id: "alice".to_string(),
            username: "alice_renamed".to_string(),
            name: "Alice".to_string(),
            image: Some("https://example.com/alice.png".to_string()),
            bio: Some("hi".to_string()),
        },
    )
    .await?;
    assert_eq!(updated.username, "alice_renamed");

    let fetched = user_repository::get_user_by_id(&pool, "alice")
        .await?
        .expect("user present");
    assert_eq!(fetched.username, "alice_renamed");
    assert_eq!(fetched.image.as_deref(), Some("https://example.com/alice.png"));

    Ok(())
}

#[sqlx::test]
async fn every_upsert_is_visible_to_the_next_read(pool: SqlitePool) -> anyhow::Result<()> {
    for n in 0..300 {
        let username = format!("alice_{n}");
        let upserted = user_repository::upsert_user(
            &pool,
            UpsertUserData {
                id: "alice".to_string(),
                username: username.clone(),
                name: "Alice".to_string(),
                image: None,
                bio: None,
            },
        )
        .await?;
        assert_eq!(upserted.username, username);

        let fetched = user_repository::get_user_by_id(&pool, "alice")
            .await?
            .unwrap_or_else(|| panic!("upsert {n} not visible afterwards"));
        assert_eq!(fetched.username, username);
    }

    Ok(())
}

#[sqlx::test]
async fn every_community_upsert_is_visible_to_the_next_read(
    pool: SqlitePool,
) -> anyhow::Result<()> {
    for n in 0..100 {
        let name = format!("Rustaceans v{n}");
        community_repository::upsert_community(
            &pool,
            UpsertCommunityData {
                id: "rustaceans".to_string(),
                username: "rustaceans".to_string(),
                name: name.clone(),
                image: None,
                bio: None,
            },
        )
        .await?;

        let fetched = community_repository::get_community_by_id(&pool, "rustaceans")
            .await?
            .unwrap_or_else(|| panic!("upsert {n} not visible afterwards"));
        assert_eq!(fetched.name, name);
    }

    Ok(())
}

#[sqlx::test]
async fn search_matches_username_and_name_with_paging(pool: SqlitePool) -> anyhow::Result<()> {
    for n in 0..3 {
        user_repository::upsert_user(
            &pool,
            UpsertUserData {
                id: format!("u{n}"),
                username: format!("rustacean_{n}"),
                name: format!("Person {n}"),
                image: None,
                bio: None,
            },
        )
        .await?;
    }
    create_test_user(&pool, "unrelated").await;

    let (matches, has_more) =
        user_repository::search_users(&pool, "RUSTACEAN", PageParams::new(1, 2)).await?;
    let ids: Vec<&str> = matches.iter().map(|u| u.id.as_str()).collect();
    // newest profiles first
    assert_eq!(ids, vec!["u2", "u1"]);
    assert!(has_more);

    let (rest, has_more) =
        user_repository::search_users(&pool, "RUSTACEAN", PageParams::new(2, 2)).await?;
    let ids: Vec<&str> = rest.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["u0"]);
    assert!(!has_more);

    // a LIKE wildcard in the query is treated literally
    let (none, _) = user_repository::search_users(&pool, "%", PageParams::default()).await?;
    assert!(none.is_empty());

    Ok(())
}

#[sqlx::test]
async fn fetch_users_by_ids_skips_unknown_ids(pool: SqlitePool) -> anyhow::Result<()> {
    let alice = create_test_user(&pool, "alice").await;

    let profiles = user_repository::fetch_users_by_ids(
        &pool,
        &[alice.id.clone(), "no-such-user".to_string()],
    )
    .await?;
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].id, alice.id);

    Ok(())
}

#[sqlx::test]
async fn derived_lists_require_an_existing_owner(pool: SqlitePool) -> anyhow::Result<()> {
    let err = user_repository::authored_echo_ids(&pool, "no-such-user")
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = community_repository::community_echo_ids(&pool, "no-such-community")
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    Ok(())
}

#[sqlx::test]
async fn community_upsert_and_profiles(pool: SqlitePool) -> anyhow::Result<()> {
    community_repository::upsert_community(
        &pool,
        UpsertCommunityData {
            id: "rustaceans".to_string(),
            username: "rustaceans".to_string(),
            name: "Rustaceans".to_string(),
            image: None,
            bio: None,
        },
    )
    .await?;

    let profiles = community_repository::fetch_communities_by_ids(
        &pool,
        &["rustaceans".to_string(), "no-such".to_string()],
    )
    .await?;
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].name, "Rustaceans");

    Ok(())
}

#[tokio::test]
async fn store_connects_migrates_and_serves_operations() -> anyhow::Result<()> {
    let config = echoes_db::Config {
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
    };
    let store = echoes_db::Store::connect(&config).await?;

    let author = create_test_user(store.pool(), "alice").await;
    let viewer = create_test_user(store.pool(), "bob").await;
    let echo = create_test_echo(store.pool(), &author.id, "hello").await;

    store.toggle_reaction(&echo.id, &viewer.id).await?;
    let detail = store.fetch_echo_detail(&echo.id).await?;
    assert_eq!(detail.author.id, author.id);

    let data = store
        .reactions_data(&viewer.id, &[echo.id.clone()], None)
        .await?;
    assert_eq!(data.reacted_by_viewer, vec![true]);

    let deleted = store.delete_echo(&echo.id).await?;
    assert_eq!(deleted, 1);

    Ok(())
}
