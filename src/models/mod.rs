//! Data models for DineBook entities.
//!
//! This module contains the data structures exchanged with the DineBook
//! REST API:
//!
//! - `Book`: catalog entries
//! - `Restaurant`: restaurant listings
//! - `Reservation`: table reservations with status tracking
//!
//! Each entity has a `New*` payload for creation and a `*Update` payload
//! for partial updates (absent fields are left unchanged by the server).

pub mod book;
pub mod reservation;
pub mod restaurant;

pub use book::{Book, BookUpdate, NewBook};
pub use reservation::{NewReservation, Reservation, ReservationStatus, ReservationUpdate};
pub use restaurant::{NewRestaurant, Restaurant, RestaurantUpdate};
