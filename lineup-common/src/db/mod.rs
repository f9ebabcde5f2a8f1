//! Database bootstrap, row models and reference-data inserts

pub mod catalog;
pub mod init;
pub mod models;

pub use init::*;
pub use models::*;
