//! SQL parsing, split by dialect since T-SQL and Postgres diverge on
//! batch separators, quoting, and builtins even though the bulk of DDL
//! and `INSERT ... SELECT` lineage detection is shared.

pub(crate) mod common;
mod postgres;
mod tsql;

pub mod router;

pub use postgres::PostgresParser;
pub use tsql::TSqlParser;
