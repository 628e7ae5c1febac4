//! E-Mall World marketplace backend and client SDK.
//!
//! The service half (`app`, `routes`, `auth`, `db`) serves the REST API; the
//! `client` module is a typed SDK for the same API. `wizard` and
//! `validation` are shared by both.

pub mod api;
pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod validation;
pub mod wizard;
