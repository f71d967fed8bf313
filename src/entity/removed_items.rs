use sea_orm::entity::prelude::*;

/// One row per item a user excluded from a cart entry. The bag itself is
/// never touched; exclusion is scoped to the entry.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "removed_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub cart_entry_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cart_entries::Entity",
        from = "Column::CartEntryId",
        to = "super::cart_entries::Column::Id"
    )]
    CartEntries,
}

impl Related<super::cart_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
