use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::repos::{
    PackagesRepo, PackagesWriteRepo, RepoError, UpsertPackageParams,
};
use crate::domain::entities::PackageRecord;

use super::{PostgresRepositories, map_sqlx_error};

const MAX_RELATED_PACKAGES: u32 = 50;

#[derive(sqlx::FromRow)]
struct PackageRow {
    id: String,
    description: Option<String>,
    weekly_downloads: i64,
    repository: Option<String>,
    homepage: Option<String>,
    last_refreshed_at: OffsetDateTime,
    created_at: OffsetDateTime,
}

impl From<PackageRow> for PackageRecord {
    fn from(row: PackageRow) -> Self {
        Self {
            id: row.id,
            description: row.description,
            weekly_downloads: row.weekly_downloads,
            repository: row.repository,
            homepage: row.homepage,
            last_refreshed_at: row.last_refreshed_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PackagesRepo for PostgresRepositories {
    async fn find_package(&self, id: &str) -> Result<Option<PackageRecord>, RepoError> {
        let row = sqlx::query_as::<_, PackageRow>(
            r#"
            SELECT id, description, weekly_downloads, repository, homepage,
                   last_refreshed_at, created_at
            FROM packages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PackageRecord::from))
    }

    async fn list_packages_by_tags(
        &self,
        tag_ids: &[String],
        exclude: Option<&str>,
        limit: u32,
    ) -> Result<Vec<PackageRecord>, RepoError> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit.clamp(1, MAX_RELATED_PACKAGES) as i64;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT DISTINCT p.id, p.description, p.weekly_downloads, p.repository, \
                    p.homepage, p.last_refreshed_at, p.created_at \
             FROM packages p \
             INNER JOIN package_tags pt ON pt.package_id = p.id \
             WHERE pt.tag_id = ANY(",
        );
        qb.push_bind(tag_ids.to_vec());
        qb.push(")");
        if let Some(exclude) = exclude {
            qb.push(" AND p.id <> ");
            qb.push_bind(exclude);
        }
        qb.push(" ORDER BY p.weekly_downloads DESC, p.id ");
        qb.push(" LIMIT ");
        qb.push_bind(limit);

        let rows = qb
            .build_query_as::<PackageRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PackageRecord::from).collect())
    }
}

#[async_trait]
impl PackagesWriteRepo for PostgresRepositories {
    async fn upsert_package(&self, params: UpsertPackageParams) -> Result<PackageRecord, RepoError> {
        let UpsertPackageParams {
            id,
            description,
            weekly_downloads,
            repository,
            homepage,
        } = params;

        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, PackageRow>(
            r#"
            INSERT INTO packages (
                id, description, weekly_downloads, repository, homepage,
                last_refreshed_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (id) DO UPDATE
            SET description = EXCLUDED.description,
                weekly_downloads = EXCLUDED.weekly_downloads,
                repository = EXCLUDED.repository,
                homepage = EXCLUDED.homepage,
                last_refreshed_at = EXCLUDED.last_refreshed_at
            RETURNING id, description, weekly_downloads, repository, homepage,
                      last_refreshed_at, created_at
            "#,
        )
        .bind(&id)
        .bind(&description)
        .bind(weekly_downloads)
        .bind(&repository)
        .bind(&homepage)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PackageRecord::from(row))
    }

    async fn replace_package_tags(
        &self,
        package_id: &str,
        tag_ids: &[String],
    ) -> Result<Vec<String>, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let exists: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM packages WHERE id = $1 FOR UPDATE")
                .bind(package_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        if exists.is_none() {
            return Err(RepoError::NotFound);
        }

        let previous: Vec<String> =
            sqlx::query_scalar("DELETE FROM package_tags WHERE package_id = $1 RETURNING tag_id")
                .bind(package_id)
                .fetch_all(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

        let now = OffsetDateTime::now_utc();
        for tag_id in tag_ids {
            sqlx::query(
                r#"
                INSERT INTO package_tags (package_id, tag_id, created_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (package_id, tag_id) DO NOTHING
                "#,
            )
            .bind(package_id)
            .bind(tag_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(previous)
    }
}
