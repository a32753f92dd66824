//! # Data Source Repository
//!
//! Tenant-scoped CRUD for the scrape adapter's source catalog, plus the
//! bookkeeping update recorded after each page fetch.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::models::data_source::{
    ActiveModel as DataSourceActiveModel, Column, Entity as DataSource, Model as DataSourceModel,
};

/// Input for registering a new scrape source.
#[derive(Debug, Clone)]
pub struct NewDataSource {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub is_active: bool,
}

/// Partial update applied to an existing scrape source.
#[derive(Debug, Clone, Default)]
pub struct DataSourceChanges {
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Repository for DataSource database operations
pub struct DataSourceRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DataSourceRepository<'a> {
    /// Create a new DataSourceRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Every source registered for the tenant, in creation order.
    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<DataSourceModel>, DbErr> {
        DataSource::find()
            .filter(Column::TenantId.eq(tenant_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(self.db)
            .await
    }

    /// Sources the scrape adapter should fetch, in creation order.
    pub async fn list_active(&self, tenant_id: Uuid) -> Result<Vec<DataSourceModel>, DbErr> {
        DataSource::find()
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::IsActive.eq(true))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(self.db)
            .await
    }

    /// Fetch one source, scoped to the tenant.
    pub async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<DataSourceModel>, DbErr> {
        DataSource::find()
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::Id.eq(id))
            .one(self.db)
            .await
    }

    /// Register a new scrape source for the tenant.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        source: NewDataSource,
    ) -> Result<DataSourceModel, DbErr> {
        let now = Utc::now();
        DataSourceActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(source.name),
            url: Set(source.url),
            description: Set(source.description),
            is_active: Set(source.is_active),
            scrape_count: Set(0),
            last_scraped_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(self.db)
        .await
    }

    /// Apply a partial update. Returns `None` when the source does not
    /// exist for this tenant.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: DataSourceChanges,
    ) -> Result<Option<DataSourceModel>, DbErr> {
        let Some(existing) = self.find_by_id(tenant_id, id).await? else {
            return Ok(None);
        };

        let mut model = existing.into_active_model();
        if let Some(name) = changes.name {
            model.name = Set(name);
        }
        if let Some(url) = changes.url {
            model.url = Set(url);
        }
        if let Some(description) = changes.description {
            model.description = Set(Some(description));
        }
        if let Some(is_active) = changes.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Utc::now().into());

        Ok(Some(model.update(self.db).await?))
    }

    /// Delete a source. Returns whether a row was removed.
    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, DbErr> {
        let result = DataSource::delete_many()
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::Id.eq(id))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Bump the scrape counter and stamp the fetch time after a page visit.
    pub async fn record_scrape(&self, id: Uuid) -> Result<(), DbErr> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        DataSource::update_many()
            .col_expr(Column::ScrapeCount, Expr::col(Column::ScrapeCount).add(1))
            .col_expr(Column::LastScrapedAt, Expr::value(now))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(self.db)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tenant;
    use migration::Migrator;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    async fn setup() -> (DatabaseConnection, Uuid) {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect test db");
        Migrator::up(&db, None).await.expect("run migrations");

        let tenant_id = Uuid::new_v4();
        tenant::ActiveModel {
            id: Set(tenant_id),
            name: Set("Test Tenant".to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&db)
        .await
        .unwrap();

        (db, tenant_id)
    }

    fn bbc_sport() -> NewDataSource {
        NewDataSource {
            name: "BBC Sport".to_string(),
            url: "https://www.bbc.co.uk/sport".to_string(),
            description: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_scoped_to_tenant() {
        let (db, tenant_id) = setup().await;
        let repo = DataSourceRepository::new(&db);

        let created = repo.create(tenant_id, bbc_sport()).await.unwrap();
        assert_eq!(created.name, "BBC Sport");
        assert_eq!(created.scrape_count, 0);

        let listed = repo.list(tenant_id).await.unwrap();
        assert_eq!(listed.len(), 1);

        let other_tenant = Uuid::new_v4();
        assert!(repo.list(other_tenant).await.unwrap().is_empty());
        assert!(
            repo.find_by_id(other_tenant, created.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_list_active_excludes_disabled_sources() {
        let (db, tenant_id) = setup().await;
        let repo = DataSourceRepository::new(&db);

        let source = repo.create(tenant_id, bbc_sport()).await.unwrap();
        assert_eq!(repo.list_active(tenant_id).await.unwrap().len(), 1);

        let updated = repo
            .update(
                tenant_id,
                source.id,
                DataSourceChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(!updated.is_active);
        assert!(repo.list_active(tenant_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_source_returns_none() {
        let (db, tenant_id) = setup().await;
        let repo = DataSourceRepository::new(&db);

        let missing = repo
            .update(tenant_id, Uuid::new_v4(), DataSourceChanges::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_record_scrape_bumps_counter_and_timestamp() {
        let (db, tenant_id) = setup().await;
        let repo = DataSourceRepository::new(&db);

        let source = repo.create(tenant_id, bbc_sport()).await.unwrap();
        repo.record_scrape(source.id).await.unwrap();
        repo.record_scrape(source.id).await.unwrap();

        let reloaded = repo
            .find_by_id(tenant_id, source.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.scrape_count, 2);
        assert!(reloaded.last_scraped_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let (db, tenant_id) = setup().await;
        let repo = DataSourceRepository::new(&db);

        let source = repo.create(tenant_id, bbc_sport()).await.unwrap();
        assert!(repo.delete(tenant_id, source.id).await.unwrap());
        assert!(!repo.delete(tenant_id, source.id).await.unwrap());
        assert!(repo.list(tenant_id).await.unwrap().is_empty());
    }
}
