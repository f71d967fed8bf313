use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

#[derive(Debug, Clone, Copy)]
pub enum AuditAction {
    UserRegister,
    UserLogin,
    BagPublish,
    BagUpdate,
    BagAvailability,
    CartAdd,
    CartRemove,
    CartPersonalize,
    ReservationCreate,
    ReservationCancel,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserRegister => "user_register",
            AuditAction::UserLogin => "user_login",
            AuditAction::BagPublish => "bag_publish",
            AuditAction::BagUpdate => "bag_update",
            AuditAction::BagAvailability => "bag_availability",
            AuditAction::CartAdd => "cart_add",
            AuditAction::CartRemove => "cart_remove",
            AuditAction::CartPersonalize => "cart_personalize",
            AuditAction::ReservationCreate => "reservation_create",
            AuditAction::ReservationCancel => "reservation_cancel",
        }
    }

    fn resource(&self) -> &'static str {
        match self {
            AuditAction::UserRegister | AuditAction::UserLogin => "users",
            AuditAction::BagPublish | AuditAction::BagUpdate | AuditAction::BagAvailability => {
                "bags"
            }
            AuditAction::CartAdd | AuditAction::CartRemove | AuditAction::CartPersonalize => {
                "cart_entries"
            }
            AuditAction::ReservationCreate | AuditAction::ReservationCancel => "reservations",
        }
    }
}

pub async fn log_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: AuditAction,
    metadata: Option<Value>,
) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(action.as_str())
    .bind(action.resource())
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}
