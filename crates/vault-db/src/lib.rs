//! Vault DB Library
//!
//! Repositories over SQLite (sqlx) plus the embedded migrations.

pub mod db;

pub use db::{connect, FileRepository, MIGRATOR};
