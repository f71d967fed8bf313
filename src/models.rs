use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BagKind {
    /// Contents are known up front and partially removable by the buyer.
    Regular,
    /// Contents stay hidden until pickup; never personalizable.
    Surprise,
}

impl BagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BagKind::Regular => "regular",
            BagKind::Surprise => "surprise",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "regular" => Some(BagKind::Regular),
            "surprise" => Some(BagKind::Surprise),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BagItem {
    /// Unique within the bag, assigned by the establishment at publish time.
    pub id: i32,
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Bag {
    pub id: Uuid,
    pub establishment_id: Uuid,
    pub kind: BagKind,
    pub size: String,
    pub tags: Vec<String>,
    pub price: i64,
    pub pickup_start: DateTime<Utc>,
    pub pickup_end: DateTime<Utc>,
    pub available: bool,
    pub items: Vec<BagItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bag: Bag,
    pub removed_item_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    /// Terminal; a canceled reservation never becomes active again.
    Canceled,
}

impl ReservationStatus {
    pub fn from_canceled_at(canceled_at: Option<DateTime<Utc>>) -> Self {
        if canceled_at.is_some() {
            ReservationStatus::Canceled
        } else {
            ReservationStatus::Active
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cart_entry_id: Uuid,
    pub bag_id: Uuid,
    pub establishment_id: Uuid,
    /// Calendar day (UTC) the reservation was created; the unit of the
    /// one-active-reservation-per-establishment rule.
    pub reserved_day: NaiveDate,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bag_kind_round_trips_db_strings() {
        assert_eq!(BagKind::parse("regular"), Some(BagKind::Regular));
        assert_eq!(BagKind::parse("surprise"), Some(BagKind::Surprise));
        assert_eq!(BagKind::parse("mystery"), None);
        assert_eq!(BagKind::parse(BagKind::Regular.as_str()), Some(BagKind::Regular));
    }

    #[test]
    fn status_derives_from_cancellation_timestamp() {
        assert_eq!(
            ReservationStatus::from_canceled_at(None),
            ReservationStatus::Active
        );
        assert_eq!(
            ReservationStatus::from_canceled_at(Some(Utc::now())),
            ReservationStatus::Canceled
        );
    }
}
