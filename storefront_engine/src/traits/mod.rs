//! # Backend and provider contracts
//!
//! This module defines the interfaces that storage backends and payment providers implement in order to be driven by
//! the storefront engine.
//!
//! * [`StorefrontDatabase`] defines the state transitions of the checkout and reconciliation flows. Every method is a
//!   single atomic unit of work.
//! * [`LedgerQueries`] provides read-only access to customers, orders, order lines and the transaction ledger.
//! * [`PaymentProvider`] is the seam to the mobile-money provider that pushes payment prompts to buyers' phones.
mod data_objects;
mod ledger_queries;
mod payment_provider;
mod storefront_database;

pub use data_objects::{ExpiredOrder, PendingOrder, ReconciliationOutcome};
pub use ledger_queries::LedgerQueries;
pub use payment_provider::{PaymentDispatch, PaymentProvider, PaymentProviderError, PaymentRequest};
pub use storefront_database::{StoreError, StorefrontDatabase};
