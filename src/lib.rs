pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod logging;
pub mod sweep;
pub mod thumbs;

pub use config::AppConfig;
pub use db::IdentifierSet;
pub use error::Error;
pub use sweep::{OutputMode, RunSummary, SweepOptions};
