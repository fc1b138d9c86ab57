//! Enrollment API Library
//!
//! Resolves a user's enrollment together with its postal address, and creates
//! or updates both after validating the CEP against ViaCEP.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `db`: Database connection, pool management and migrations.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Database rows, write payloads and response projections.
//! - `postal_client`: ViaCEP client.
//! - `repositories`: Enrollment and address persistence.
//! - `router`: Axum router assembly.
//! - `services`: Enrollment service.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod postal_client;
pub mod repositories;
pub mod router;
pub mod services;
