//! Asynchronous helpers for use with Tokio.

pub mod io;
