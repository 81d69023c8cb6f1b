use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A restaurant as returned by `GET /restaurants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    // The server stores whatever the creating client sent, so keep this
    // as an opaque string rather than guessing at a timestamp format
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Payload for `POST /restaurants`.
#[derive(Debug, Clone, Serialize)]
pub struct NewRestaurant {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl NewRestaurant {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            phone: phone.into(),
            created_at: Utc::now(),
        }
    }
}

/// Partial update for `PUT /restaurants/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestaurantUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}
