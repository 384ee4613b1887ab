//! Postgres persistence for the symbol store. One [`Store`] wraps a
//! single connection pool; [`Store::migrate`] applies the schema under
//! `migrations/`.

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::Store;
