//! # Channel Repository
//!
//! Tenant-scoped access to broadcast channels. Ordering is stable
//! (creation order) because the resolver's first-active fallback and
//! tie-breaking both lean on list position.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::models::channel::{Column, Entity as Channel, Model as ChannelModel};

/// Repository for Channel database operations
pub struct ChannelRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ChannelRepository<'a> {
    /// Create a new ChannelRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Active channels for the tenant, in creation order.
    pub async fn list_active(&self, tenant_id: Uuid) -> Result<Vec<ChannelModel>, DbErr> {
        Channel::find()
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::IsActive.eq(true))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(self.db)
            .await
    }

    /// Every channel for the tenant, active or not, in creation order.
    pub async fn list_all(&self, tenant_id: Uuid) -> Result<Vec<ChannelModel>, DbErr> {
        Channel::find()
            .filter(Column::TenantId.eq(tenant_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(self.db)
            .await
    }
}
