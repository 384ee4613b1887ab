//! Shared data model, error taxonomy, and in-process graph projection
//! used by every other crate in the workspace.

pub mod cancellation;
pub mod enums;
pub mod error;
pub mod graph;
pub mod ids;
pub mod impact;
pub mod model;
pub mod principal;
pub mod retry;

pub use cancellation::Cancellation;
pub use error::{CoreError, ErrorBody, ErrorCode, ErrorDetail};
pub use graph::{GraphMirror, GraphMirrorRegistry, LineagePath, MirrorEdge, MirrorNode};
pub use principal::Principal;
