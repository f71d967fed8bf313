use sea_orm::entity::prelude::*;

/// `establishment_id` and `pickup_day` are denormalized from the bag so the
/// partial unique index on live entries can enforce the
/// one-bag-per-establishment-per-day rule in Postgres.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cart_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub bag_id: Uuid,
    pub establishment_id: Uuid,
    pub pickup_day: Date,
    /// Set when a reservation consumes the entry; consumed entries leave the
    /// cart projection but stay on disk for the reservation link.
    pub reserved_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
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
        belongs_to = "super::bags::Entity",
        from = "Column::BagId",
        to = "super::bags::Column::Id"
    )]
    Bags,
    #[sea_orm(has_many = "super::removed_items::Entity")]
    RemovedItems,
    #[sea_orm(has_many = "super::reservations::Entity")]
    Reservations,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::bags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bags.def()
    }
}

impl Related<super::removed_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RemovedItems.def()
    }
}

impl Related<super::reservations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
