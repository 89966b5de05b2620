pub mod request;
pub mod rules;

pub use request::FilterRequest;
pub use rules::{filter, FilterCondition, PredicateSet, RangeCondition};
