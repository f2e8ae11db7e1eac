pub mod record;

pub use record::{Filter, ParseError, RiskRecord, SortKey, Status};
