use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::CartEntry;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddBagRequest {
    pub bag_id: Uuid,
}

/// An absent array deserializes to empty and is rejected the same way.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PersonalizeRequest {
    #[serde(default)]
    pub removed_item_ids: Vec<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartEntry>,
}
