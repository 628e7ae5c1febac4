//! Domain types and DTOs
//!
//! These types define the data structures for E-Mall entities.

pub mod addresses;
pub mod admin;
pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod locations;
pub mod onboarding;
pub mod reviews;
pub mod sellers;
pub mod users;
