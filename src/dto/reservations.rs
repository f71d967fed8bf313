use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Reservation;

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationList {
    pub items: Vec<Reservation>,
}

/// Preview of the establishment/day exclusivity rule, so clients can warn
/// before committing a reservation batch.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConstraintCheckQuery {
    pub establishment_id: Uuid,
    pub day: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConstraintCheck {
    /// True when the user already holds an active reservation for the
    /// establishment on that day.
    pub held: bool,
}
