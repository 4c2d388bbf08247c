pub mod client;
pub mod types;

pub use client::{SummaryLookup, WikipediaClient};
pub use types::{LookupError, LookupErrorKind, Summary, AMBIGUOUS_MESSAGE, NOT_FOUND_MESSAGE};
