//! API client for the DineBook REST resources.
//!
//! This module provides the `ApiClient` struct for making requests against
//! the book, restaurant and reservation endpoints. List and detail reads
//! are public; create, update and delete require a bearer token taken
//! from the session manager.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{parse_json, Error, Result};
use crate::models::{
    Book, BookUpdate, NewBook, NewReservation, NewRestaurant, Reservation, ReservationUpdate,
    Restaurant, RestaurantUpdate,
};

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Build the `limit`/`offset` query, mirroring the server defaults:
/// no `limit` means "all", `offset` is only sent when non-zero.
fn pagination_query(limit: Option<u32>, offset: u32) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(limit) = limit {
        query.push(("limit", limit.to_string()));
    }
    if offset > 0 {
        query.push(("offset", offset.to_string()));
    }
    query
}

/// API client for the DineBook service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests.
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Drop the bearer token, e.g. after logout.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Create a new ApiClient with the given token, sharing the connection
    /// pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and parse the JSON response, mapping non-success
    /// statuses through the error taxonomy with a per-operation default
    /// message.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        default_error: &str,
    ) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::from_status(status, &body, default_error));
        }
        parse_json(&body, default_error)
    }

    /// Like `execute`, for endpoints whose response body is not used.
    async fn execute_no_body(&self, request: RequestBuilder, default_error: &str) -> Result<()> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_status(status, &body, default_error));
        }
        Ok(())
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        default_error: &str,
    ) -> Result<T> {
        debug!(path, "GET");
        let request = self.apply_auth(self.client.get(self.url(path)).query(query));
        self.execute(request, default_error).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        default_error: &str,
    ) -> Result<T> {
        debug!(path, "POST");
        let request = self.apply_auth(self.client.post(self.url(path)).json(body));
        self.execute(request, default_error).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        default_error: &str,
    ) -> Result<T> {
        debug!(path, "PUT");
        let request = self.apply_auth(self.client.put(self.url(path)).json(body));
        self.execute(request, default_error).await
    }

    async fn delete(&self, path: &str, default_error: &str) -> Result<()> {
        debug!(path, "DELETE");
        let request = self.apply_auth(self.client.delete(self.url(path)));
        self.execute_no_body(request, default_error).await
    }

    // ===== Books =====

    /// Fetch books, optionally paginated.
    pub async fn list_books(&self, limit: Option<u32>, offset: u32) -> Result<Vec<Book>> {
        self.get(
            "/books",
            &pagination_query(limit, offset),
            "Failed to fetch books",
        )
        .await
    }

    pub async fn get_book(&self, id: &str) -> Result<Book> {
        self.get(&format!("/books/{}", id), &[], "Book not found")
            .await
    }

    pub async fn create_book(&self, book: &NewBook) -> Result<Book> {
        self.post("/books", book, "Failed to create book").await
    }

    pub async fn update_book(&self, id: &str, update: &BookUpdate) -> Result<Book> {
        self.put(&format!("/books/{}", id), update, "Failed to update book")
            .await
    }

    pub async fn delete_book(&self, id: &str) -> Result<()> {
        self.delete(&format!("/books/{}", id), "Failed to delete book")
            .await
    }

    // ===== Restaurants =====

    /// Fetch restaurants, optionally paginated.
    pub async fn list_restaurants(
        &self,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Vec<Restaurant>> {
        self.get(
            "/restaurants",
            &pagination_query(limit, offset),
            "Failed to fetch restaurants",
        )
        .await
    }

    pub async fn get_restaurant(&self, id: &str) -> Result<Restaurant> {
        self.get(&format!("/restaurants/{}", id), &[], "Restaurant not found")
            .await
    }

    pub async fn create_restaurant(&self, restaurant: &NewRestaurant) -> Result<Restaurant> {
        self.post("/restaurants", restaurant, "Failed to create restaurant")
            .await
    }

    pub async fn update_restaurant(
        &self,
        id: &str,
        update: &RestaurantUpdate,
    ) -> Result<Restaurant> {
        self.put(
            &format!("/restaurants/{}", id),
            update,
            "Failed to update restaurant",
        )
        .await
    }

    pub async fn delete_restaurant(&self, id: &str) -> Result<()> {
        self.delete(&format!("/restaurants/{}", id), "Failed to delete restaurant")
            .await
    }

    // ===== Reservations =====

    /// Fetch reservations, optionally paginated.
    pub async fn list_reservations(
        &self,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Vec<Reservation>> {
        self.get(
            "/reservations",
            &pagination_query(limit, offset),
            "Failed to fetch reservations",
        )
        .await
    }

    pub async fn get_reservation(&self, id: &str) -> Result<Reservation> {
        self.get(
            &format!("/reservations/{}", id),
            &[],
            "Reservation not found",
        )
        .await
    }

    pub async fn create_reservation(&self, reservation: &NewReservation) -> Result<Reservation> {
        self.post("/reservations", reservation, "Failed to create reservation")
            .await
    }

    pub async fn update_reservation(
        &self,
        id: &str,
        update: &ReservationUpdate,
    ) -> Result<Reservation> {
        self.put(
            &format!("/reservations/{}", id),
            update,
            "Failed to update reservation",
        )
        .await
    }

    pub async fn delete_reservation(&self, id: &str) -> Result<()> {
        self.delete(
            &format!("/reservations/{}", id),
            "Failed to delete reservation",
        )
        .await
    }

    /// Fetch all reservations for a restaurant.
    pub async fn reservations_for_restaurant(
        &self,
        restaurant_id: &str,
    ) -> Result<Vec<Reservation>> {
        self.get(
            &format!("/reservations/restaurant/{}", restaurant_id),
            &[],
            "Failed to fetch restaurant reservations",
        )
        .await
    }

    /// Fetch all reservations made by a user.
    pub async fn reservations_for_user(&self, user_id: i64) -> Result<Vec<Reservation>> {
        self.get(
            &format!("/reservations/user/{}", user_id),
            &[],
            "Failed to fetch user reservations",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_query() {
        assert!(pagination_query(None, 0).is_empty());
        assert_eq!(
            pagination_query(Some(20), 0),
            vec![("limit", "20".to_string())]
        );
        assert_eq!(
            pagination_query(Some(20), 40),
            vec![("limit", "20".to_string()), ("offset", "40".to_string())]
        );
        // Offset without limit is still valid
        assert_eq!(
            pagination_query(None, 10),
            vec![("offset", "10".to_string())]
        );
    }

    #[test]
    fn test_with_token_keeps_base_url() {
        let client = ApiClient::new("http://localhost:3000").unwrap();
        let authed = client.with_token("tok2".to_string());
        assert_eq!(authed.base_url, "http://localhost:3000");
        assert_eq!(authed.token.as_deref(), Some("tok2"));
        assert!(client.token.is_none());
    }
}
