// Application layer - use cases and orchestration
// The aggregator and consultant ledger are pure; the service wires them to
// the document store.

pub mod aggregator;
pub mod consultants;
pub mod error;
pub mod reporting;
pub mod service;

pub use aggregator::*;
pub use consultants::*;
pub use error::*;
pub use reporting::*;
pub use service::*;
