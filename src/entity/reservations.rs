use sea_orm::entity::prelude::*;

/// Soft-deleted via `canceled_at`; rows are never removed. The partial
/// unique index over (user_id, establishment_id, reserved_day) on active
/// rows backs the exclusivity rule, and the unique index on cart_entry_id
/// keeps the entry-to-reservation link 1:1 forever.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub cart_entry_id: Uuid,
    pub bag_id: Uuid,
    pub establishment_id: Uuid,
    pub reserved_day: Date,
    pub created_at: DateTimeWithTimeZone,
    pub canceled_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::cart_entries::Entity",
        from = "Column::CartEntryId",
        to = "super::cart_entries::Column::Id"
    )]
    CartEntries,
    #[sea_orm(
        belongs_to = "super::bags::Entity",
        from = "Column::BagId",
        to = "super::bags::Column::Id"
    )]
    Bags,
    #[sea_orm(
        belongs_to = "super::establishments::Entity",
        from = "Column::EstablishmentId",
        to = "super::establishments::Column::Id"
    )]
    Establishments,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::cart_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartEntries.def()
    }
}

impl Related<super::bags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bags.def()
    }
}

impl Related<super::establishments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Establishments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
