mod document;
mod expense;
mod money;
mod order;
mod payout;
mod sort;
mod timestamp;
mod window;

pub use document::*;
pub use expense::*;
pub use money::*;
pub use order::*;
pub use payout::*;
pub use sort::*;
pub use timestamp::{normalize_timestamp, parse_timestamp_str, resolve_local};
pub use window::*;
