use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reservation lifecycle state as stored by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    /// A status value this client version does not recognize.
    Unknown,
}

impl ReservationStatus {
    /// Parse a status string, tolerating casing and spelling variants.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "pending" => ReservationStatus::Pending,
            "confirmed" => ReservationStatus::Confirmed,
            "cancelled" | "canceled" => ReservationStatus::Cancelled,
            _ => ReservationStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationStatus::Pending => write!(f, "Pending"),
            ReservationStatus::Confirmed => write!(f, "Confirmed"),
            ReservationStatus::Cancelled => write!(f, "Cancelled"),
            ReservationStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

impl Serialize for ReservationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReservationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ReservationStatus::parse(&s))
    }
}

/// A reservation as returned by `GET /reservations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub user_id: i64,
    pub restaurant_id: String,
    #[serde(with = "wire_datetime")]
    pub reservation_datetime: NaiveDateTime,
    pub guests: u32,
    pub status: ReservationStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Payload for `POST /reservations`.
#[derive(Debug, Clone, Serialize)]
pub struct NewReservation {
    pub user_id: i64,
    pub restaurant_id: String,
    #[serde(with = "wire_datetime")]
    pub reservation_datetime: NaiveDateTime,
    pub guests: u32,
    pub status: ReservationStatus,
    #[serde(with = "wire_datetime")]
    pub created_at: NaiveDateTime,
}

impl NewReservation {
    /// New pending reservation, stamped with the current time.
    pub fn new(
        user_id: i64,
        restaurant_id: impl Into<String>,
        reservation_datetime: NaiveDateTime,
        guests: u32,
    ) -> Self {
        Self {
            user_id,
            restaurant_id: restaurant_id.into(),
            reservation_datetime,
            guests,
            status: ReservationStatus::Pending,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// Partial update for `PUT /reservations/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReservationUpdate {
    #[serde(
        with = "wire_datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub reservation_datetime: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guests: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReservationStatus>,
}

/// The reservation endpoints use `YYYY-MM-DD HH:MM:SS` timestamps rather
/// than RFC 3339.
mod wire_datetime {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        // Some clients send the ISO "T" separator, with or without seconds
        NaiveDateTime::parse_from_str(s, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::Serializer;

        pub fn serialize<S: Serializer>(
            dt: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => super::serialize(dt, serializer),
                None => serializer.serialize_none(),
            }
        }
    }
}
