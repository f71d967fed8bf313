use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub establishment_id: Uuid,
    /// "regular" or "surprise"; see `models::BagKind`.
    pub kind: String,
    pub size: String,
    pub tags: Vec<String>,
    pub price: i64,
    pub pickup_start: DateTimeWithTimeZone,
    pub pickup_end: DateTimeWithTimeZone,
    pub available: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::establishments::Entity",
        from = "Column::EstablishmentId",
        to = "super::establishments::Column::Id"
    )]
    Establishments,
    #[sea_orm(has_many = "super::bag_items::Entity")]
    BagItems,
    #[sea_orm(has_many = "super::cart_entries::Entity")]
    CartEntries,
    #[sea_orm(has_many = "super::reservations::Entity")]
    Reservations,
}

impl Related<super::establishments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Establishments.def()
    }
}

impl Related<super::bag_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BagItems.def()
    }
}

impl Related<super::cart_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartEntries.def()
    }
}

impl Related<super::reservations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
