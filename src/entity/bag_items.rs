use sea_orm::entity::prelude::*;

/// Item ids are establishment-assigned and unique per bag, hence the
/// composite key.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bag_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub bag_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: i32,
    pub name: String,
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bags::Entity",
        from = "Column::BagId",
        to = "super::bags::Column::Id"
    )]
    Bags,
}

impl Related<super::bags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
