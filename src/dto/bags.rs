use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Bag, BagKind};

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewBagItem {
    pub id: i32,
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBagRequest {
    pub establishment_id: Uuid,
    pub kind: BagKind,
    pub size: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price: i64,
    pub pickup_start: DateTime<Utc>,
    pub pickup_end: DateTime<Utc>,
    pub items: Vec<NewBagItem>,
}

/// Administrative update; kind and contents are fixed once published so
/// personalization state can never dangle.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBagRequest {
    pub size: Option<String>,
    pub tags: Option<Vec<String>>,
    pub price: Option<i64>,
    pub pickup_start: Option<DateTime<Utc>>,
    pub pickup_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAvailabilityRequest {
    pub available: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BagList {
    pub items: Vec<Bag>,
}
