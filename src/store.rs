use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::Config;
use crate::error::Error;
use crate::models::{
    Echo, FeedPage, PopulatedEcho, ReactionState, ReactionsData, UserProfile,
};
use crate::reactions;
use crate::repositories::echo_repository::{
    self, CreateCommentData, CreateEchoData,
};
use crate::utils::PageParams;

/// The one explicit handle to the store. Owns the pool, runs migrations at
/// connect time; every operation goes through it (or through the
/// repository functions with `pool()`).
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!().run(&pool).await?;

        info!(database_url = %config.database_url, "store connected");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn create_echo(&self, data: CreateEchoData) -> Result<Echo, Error> {
        echo_repository::create_echo(&self.pool, data).await
    }

    pub async fn create_comment(
        &self,
        parent_id: &str,
        data: CreateCommentData,
    ) -> Result<Echo, Error> {
        echo_repository::create_comment(&self.pool, parent_id, data).await
    }

    pub async fn update_echo_text(&self, echo_id: &str, text: &str) -> Result<Echo, Error> {
        echo_repository::update_echo_text(&self.pool, echo_id, text).await
    }

    pub async fn delete_echo(&self, echo_id: &str) -> Result<u64, Error> {
        echo_repository::delete_echo(&self.pool, echo_id).await
    }

    pub async fn fetch_echo_detail(&self, echo_id: &str) -> Result<PopulatedEcho, Error> {
        echo_repository::fetch_echo_detail(&self.pool, echo_id).await
    }

    pub async fn fetch_feed(&self, params: PageParams) -> Result<FeedPage, Error> {
        echo_repository::fetch_feed(&self.pool, params).await
    }

    pub async fn toggle_reaction(
        &self,
        echo_id: &str,
        user_id: &str,
    ) -> Result<ReactionState, Error> {
        reactions::toggle_reaction(&self.pool, echo_id, user_id).await
    }

    pub async fn is_reacted_by(&self, echo_id: &str, user_id: &str) -> Result<bool, Error> {
        reactions::is_reacted_by(&self.pool, echo_id, user_id).await
    }

    pub async fn reacted_users(&self, echo_id: &str) -> Result<Vec<UserProfile>, Error> {
        reactions::reacted_users(&self.pool, echo_id).await
    }

    pub async fn reactions_data(
        &self,
        viewer_id: &str,
        echo_ids: &[String],
        parent_id: Option<&str>,
    ) -> Result<ReactionsData, Error> {
        reactions::reactions_data(&self.pool, viewer_id, echo_ids, parent_id).await
    }
}
