use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::identity::CallerIdentity;
use crate::application::repos::{RepoError, UsersRepo};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn ensure_user(&self, identity: &CallerIdentity) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, avatar_url, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&identity.id)
        .bind(&identity.name)
        .bind(&identity.avatar_url)
        .bind(OffsetDateTime::now_utc())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
