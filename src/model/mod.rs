// File: ./src/model/mod.rs
// Aggregates the split model files
pub mod adapter;
pub mod item;
pub mod parser;
pub mod weekday;

pub use item::{Eventual, Exception, Occurrence, OccurrenceSource, Regular, WeekdaySpec};
pub use weekday::{IsoWeekday, UnresolvedWeekday, WeekdayResolution, resolve_weekday};
