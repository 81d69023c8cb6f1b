use serde::{Deserialize, Serialize};

/// A catalog entry as returned by `GET /books`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub published_year: i32,
    pub genre: String,
}

/// Payload for `POST /books`. The server assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub published_year: i32,
    pub genre: String,
}

/// Partial update for `PUT /books/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BookUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}
