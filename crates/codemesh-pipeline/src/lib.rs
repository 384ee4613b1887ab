//! Orchestrates one project's `IndexRun` through the stages:
//! materialize -> enumerate -> parse -> resolve -> lineage -> embed ->
//! graph sync -> analytics. `ingest::Orchestrator` is the entry point;
//! `resolve`, `lineage`, and `analytics` are the pure pieces it drives,
//! kept free-standing so they can be unit-tested without a database.

pub mod analytics;
pub mod error;
pub mod ingest;
pub mod lineage;
pub mod queue;
pub mod resolve;

pub use error::PipelineError;
pub use ingest::{LocalDirMaterializer, Materializer, Orchestrator, OrchestratorConfig};
pub use queue::{IngestJob, InMemoryQueue, JobQueue, JobType};
