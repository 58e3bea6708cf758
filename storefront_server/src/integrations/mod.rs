//! Glue between the storefront engine and the outside world.
//!
//! * [`sonicpesa`] adapts the SonicPesa REST client to the engine's [`PaymentProvider`] contract, and converts
//!   SonicPesa's callbacks into engine payment results.
//! * [`audit_log`] subscribes to engine events and writes an audit trail to the log.
//!
//! [`PaymentProvider`]: storefront_engine::PaymentProvider
pub mod audit_log;
pub mod sonicpesa;
