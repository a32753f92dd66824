//! Channel entity model
//!
//! This module contains the SeaORM entity model for the channels table:
//! the tenant's configured broadcasters, consumed read-only by the
//! ingestion pipeline when resolving free-text channel names.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Channel entity representing a tenant's broadcaster
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "channels")]
pub struct Model {
    /// Unique identifier for the channel (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tenant identifier for multi-tenancy
    pub tenant_id: Uuid,

    /// Free-text broadcaster name (e.g. "Sky Sports Main Event")
    pub name: String,

    /// Whether the channel participates in resolution and fallback
    pub is_active: bool,

    /// Timestamp when the channel was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the channel was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
