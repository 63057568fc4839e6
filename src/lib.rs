// Library root: re-exports all modules so integration tests and the binary
// can access the crate's public API.

pub mod app;
pub mod board;
pub mod config;
pub mod db;
pub mod entries;
pub mod error;
pub mod presets;
pub mod protocol;
pub mod resolver;
pub mod wiki;
