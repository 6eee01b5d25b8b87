use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::EntitySchema;
use crate::error::ApiError;
use crate::store::Record;

pub static USERS: EntitySchema = EntitySchema {
    name: "users",
    required: &["name", "email", "password_hash"],
    optional: &[
        "active",
        "activation_key",
        "password_reset_key",
        "description",
        "profile_image_url",
        "category",
        "mvp",
        "following",
    ],
    owner_field: "id",
};

/// The only fields a profile update may touch. Email and password have
/// their own operations; everything else is dropped.
pub const PROFILE_FIELDS: &[&str] = &[
    "name",
    "description",
    "profile_image_url",
    "category",
    "mvp",
];

/// Account lifecycle state. `Active` is terminal; there is no reversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationState {
    #[default]
    Pending,
    Active,
}

/// Typed view over a stored user record. The password hash and one-time
/// keys deserialize from the store but never serialize back to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(default)]
    pub active: ActivationState,
    #[serde(default, skip_serializing)]
    pub activation_key: Option<String>,
    #[serde(default, skip_serializing)]
    pub password_reset_key: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mvp: Option<bool>,
    #[serde(default)]
    pub following: Vec<Uuid>,
}

impl User {
    pub fn from_record(record: Record) -> Result<Self, ApiError> {
        serde_json::from_value(serde_json::Value::Object(record))
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("malformed user record: {e}")))
    }
}
