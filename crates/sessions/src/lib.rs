//! Per-user extraction settings.
//!
//! Each user gets a [`Session`] holding the field index and delimiter used for
//! their uploads. Sessions live in memory for the lifetime of the process and
//! are created with defaults on first access.

pub mod error;
pub mod session;
pub mod store;

pub use {
    error::{Error, InvalidArgument, Result},
    session::{Session, parse_field_index},
    store::{SessionStore, UserId},
};
