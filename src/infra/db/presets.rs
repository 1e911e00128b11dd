use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::repos::{
    CreatePresetParams, LikeToggle, OwnerStats, PresetsRepo, PresetsWriteRepo, RepoError,
};
use crate::domain::entities::{PresetListItem, PresetRecord};
use crate::domain::packages::PackageList;
use crate::domain::types::PresetSort;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct PresetRow {
    id: String,
    title: String,
    packages: String,
    trends_url: String,
    owner_id: String,
    likes_count: i64,
    created_at: OffsetDateTime,
}

impl TryFrom<PresetRow> for PresetRecord {
    type Error = RepoError;

    fn try_from(row: PresetRow) -> Result<Self, Self::Error> {
        let packages = PackageList::from_stored(&row.packages)
            .map_err(|err| RepoError::Integrity {
                message: err.to_string(),
            })?;
        Ok(Self {
            id: row.id,
            title: row.title,
            packages,
            trends_url: row.trends_url,
            owner_id: row.owner_id,
            likes_count: row.likes_count,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PresetListRow {
    id: String,
    title: String,
    packages: String,
    trends_url: String,
    likes_count: i64,
    created_at: OffsetDateTime,
    owner_name: Option<String>,
    owner_avatar: Option<String>,
    liked: Option<bool>,
}

impl TryFrom<PresetListRow> for PresetListItem {
    type Error = RepoError;

    fn try_from(row: PresetListRow) -> Result<Self, Self::Error> {
        let packages = PackageList::from_stored(&row.packages)
            .map_err(|err| RepoError::Integrity {
                message: err.to_string(),
            })?;
        Ok(Self {
            id: row.id,
            title: row.title,
            packages,
            trends_url: row.trends_url,
            likes_count: row.likes_count,
            created_at: row.created_at,
            owner_name: row.owner_name,
            owner_avatar: row.owner_avatar,
            liked: row.liked,
        })
    }
}

#[async_trait]
impl PresetsRepo for PostgresRepositories {
    async fn list_presets(
        &self,
        sort: PresetSort,
        limit: u32,
        offset: u32,
        viewer: Option<&str>,
    ) -> Result<Vec<PresetListItem>, RepoError> {
        let limit = limit.clamp(1, 100) as i64;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT p.id, p.title, p.packages, p.trends_url, p.likes_count, p.created_at, \
                    u.name AS owner_name, u.avatar_url AS owner_avatar, ",
        );
        if let Some(viewer) = viewer {
            qb.push("EXISTS(SELECT 1 FROM likes l WHERE l.preset_id = p.id AND l.user_id = ");
            qb.push_bind(viewer);
            qb.push(") AS liked ");
        } else {
            qb.push("NULL::boolean AS liked ");
        }
        qb.push("FROM presets p LEFT JOIN users u ON u.id = p.owner_id ");
        match sort {
            PresetSort::Likes => qb.push("ORDER BY p.likes_count DESC, p.created_at DESC "),
            PresetSort::Newest => qb.push("ORDER BY p.created_at DESC "),
        };
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset as i64);

        let rows = qb
            .build_query_as::<PresetListRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(PresetListItem::try_from).collect()
    }

    async fn find_preset(&self, slug: &str) -> Result<Option<PresetRecord>, RepoError> {
        let row = sqlx::query_as::<_, PresetRow>(
            r#"
            SELECT id, title, packages, trends_url, owner_id, likes_count, created_at
            FROM presets
            WHERE id = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(PresetRecord::try_from).transpose()
    }

    async fn like_state(&self, user_id: &str, preset_id: &str) -> Result<LikeToggle, RepoError> {
        let likes_count: Option<i64> =
            sqlx::query_scalar("SELECT likes_count FROM presets WHERE id = $1")
                .bind(preset_id)
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        let Some(likes_count) = likes_count else {
            return Err(RepoError::NotFound);
        };

        let liked: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM likes WHERE user_id = $1 AND preset_id = $2")
                .bind(user_id)
                .bind(preset_id)
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(LikeToggle {
            liked: liked.is_some(),
            likes_count,
        })
    }

    async fn count_likes(&self, preset_id: &str) -> Result<i64, RepoError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE preset_id = $1")
            .bind(preset_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn owner_stats(&self, owner_id: &str) -> Result<OwnerStats, RepoError> {
        let (presets_count, total_likes): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(likes_count), 0)::BIGINT
            FROM presets
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(OwnerStats {
            presets_count,
            total_likes,
        })
    }
}

#[async_trait]
impl PresetsWriteRepo for PostgresRepositories {
    async fn create_preset(&self, params: CreatePresetParams) -> Result<PresetRecord, RepoError> {
        let CreatePresetParams {
            id,
            title,
            packages,
            trends_url,
            owner_id,
        } = params;

        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, PresetRow>(
            r#"
            INSERT INTO presets (id, title, packages, trends_url, owner_id, likes_count, created_at)
            VALUES ($1, $2, $3, $4, $5, 0, $6)
            RETURNING id, title, packages, trends_url, owner_id, likes_count, created_at
            "#,
        )
        .bind(&id)
        .bind(&title)
        .bind(packages.to_stored())
        .bind(&trends_url)
        .bind(&owner_id)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        PresetRecord::try_from(row)
    }

    async fn toggle_like(&self, user_id: &str, preset_id: &str) -> Result<LikeToggle, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        // Lock the preset row for the whole flip so concurrent toggles on
        // the same preset serialize and the counter update pairs with
        // exactly one row mutation.
        let locked: Option<i64> =
            sqlx::query_scalar("SELECT likes_count FROM presets WHERE id = $1 FOR UPDATE")
                .bind(preset_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        if locked.is_none() {
            return Err(RepoError::NotFound);
        }

        let existing: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM likes WHERE user_id = $1 AND preset_id = $2")
                .bind(user_id)
                .bind(preset_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

        let (liked, likes_count) = if existing.is_some() {
            sqlx::query("DELETE FROM likes WHERE user_id = $1 AND preset_id = $2")
                .bind(user_id)
                .bind(preset_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            let count: i64 = sqlx::query_scalar(
                "UPDATE presets SET likes_count = likes_count - 1 WHERE id = $1 RETURNING likes_count",
            )
            .bind(preset_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
            (false, count)
        } else {
            sqlx::query("INSERT INTO likes (user_id, preset_id, created_at) VALUES ($1, $2, $3)")
                .bind(user_id)
                .bind(preset_id)
                .bind(OffsetDateTime::now_utc())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            let count: i64 = sqlx::query_scalar(
                "UPDATE presets SET likes_count = likes_count + 1 WHERE id = $1 RETURNING likes_count",
            )
            .bind(preset_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
            (true, count)
        };

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(LikeToggle { liked, likes_count })
    }
}
