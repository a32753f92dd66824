//! # Tenant Repository
//!
//! Lookup methods for tenants. Tenants are provisioned out of band; the
//! ingestion service only ever reads them.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::models::tenant::{Column, Entity as Tenant, Model as TenantModel};

/// Repository for Tenant database operations
pub struct TenantRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TenantRepository<'a> {
    /// Create a new TenantRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetch a tenant by id.
    pub async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<TenantModel>, DbErr> {
        Tenant::find_by_id(tenant_id).one(self.db).await
    }

    /// All tenants, oldest first. The scheduler sweeps these in order.
    pub async fn list(&self) -> Result<Vec<TenantModel>, DbErr> {
        Tenant::find()
            .order_by_asc(Column::CreatedAt)
            .all(self.db)
            .await
    }

    /// Whether a tenant with this id exists.
    pub async fn exists(&self, tenant_id: Uuid) -> Result<bool, DbErr> {
        Ok(Tenant::find()
            .filter(Column::Id.eq(tenant_id))
            .one(self.db)
            .await?
            .is_some())
    }
}
