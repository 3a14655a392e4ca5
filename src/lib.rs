pub mod config;
pub mod dates;
pub mod error;
pub mod runtime;
pub mod sources;
pub mod types;
pub mod urls;
