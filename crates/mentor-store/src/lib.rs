//! `mentor-store` — SQLite persistence for users and their productivity
//! artifacts.
//!
//! The scheduler reads everything through a scoped [`store::Session`] and
//! writes only derived todos (the materializers). The surrounding CRUD bot
//! owns the rest of the schema.

pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use store::{Session, Store};
