pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod expand;
pub mod model;
pub mod schedule;
pub mod storage;

pub use error::{Error, Result};
