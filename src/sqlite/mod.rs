//! Bundled `SQLite` driver built on rusqlite.
//!
//! - config: connection options and their mapping from [`Credentials`](crate::Credentials)
//! - params: conversion and binding of statement parameters
//! - query: result extraction
//! - schema: the `list tables` / `describe table` commands over the `SQLite` catalogue

mod config;
mod connection;
mod params;
mod query;
mod schema;

pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use connection::SqliteConnection;
pub use params::row_value_to_sqlite_value;
