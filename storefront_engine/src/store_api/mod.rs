//! # Storefront engine public API
//!
//! The `store_api` module exposes the programmatic API for the checkout and payment reconciliation flows.
//!
//! * [`checkout_api`] turns a buyer's cart into a pending order and asks the payment provider to prompt the buyer's
//!   phone for payment.
//! * [`reconciliation_api`] applies the provider's asynchronous payment callbacks to the ledger, exactly once.
//! * [`expiry_api`] sweeps up orders that were abandoned before a payment ever settled.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits it needs, along with
//! the event producers for any hooks that should hear about state changes.
//!
//! ```rust,ignore
//! use storefront_engine::{events::EventProducers, ReconciliationApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/storefront.db", 5).await?;
//! let api = ReconciliationApi::new(db, EventProducers::default());
//! let outcome = api.reconcile(PaymentResult::new("XYZ123", "SUCCESS")).await?;
//! ```
pub mod checkout_api;
pub mod checkout_objects;
pub mod errors;
pub mod expiry_api;
pub mod reconciliation_api;
