//! # Storefront server
//! This crate hosts the HTTP server for the storefront. It is responsible for:
//! * Taking checkouts from the storefront front end, saving the order and asking SonicPesa to push a USSD payment
//!   prompt to the buyer's phone.
//! * Listening for SonicPesa payment callbacks and reconciling them against the transaction ledger.
//! * Periodically cancelling orders that were never paid.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/checkout`: Places an order and starts the mobile-money charge.
//! * `/webhook/sonicpesa`: The callback route for SonicPesa payment results.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
