//! Storefront Engine
//!
//! The storefront engine holds the core logic for selling through a mobile-money (USSD push) payment provider. A
//! checkout saves a pending order and asks the provider to prompt the buyer's phone for payment. The provider reports
//! the outcome later through a callback, which the engine reconciles against the order exactly once.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`] and [`mod@traits`]). SQLite is the supported backend. The data
//!    types stored in the database are defined in the [`mod@db_types`] module and are public.
//! 2. The public API ([`mod@store_api`]): [`CheckoutApi`], [`ReconciliationApi`] and [`ExpiryApi`]. The API is
//!    provider-agnostic; payment providers plug in by implementing [`PaymentProvider`].
//!
//! The engine also emits events when orders are placed, payments settle and abandoned orders expire. A simple hook
//! system ([`mod@events`]) lets you subscribe to them and perform custom actions.
pub mod db_types;
pub mod events;
pub mod helpers;
#[cfg(feature = "sqlite")]
pub mod sqlite;
mod store_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use store_api::{
    checkout_api::CheckoutApi,
    checkout_objects,
    errors::ReconciliationError,
    expiry_api::ExpiryApi,
    reconciliation_api::ReconciliationApi,
};
pub use traits::{
    LedgerQueries,
    PaymentDispatch,
    PaymentProvider,
    PaymentProviderError,
    PaymentRequest,
    ReconciliationOutcome,
    StoreError,
    StorefrontDatabase,
};
