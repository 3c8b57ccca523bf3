//! Lagerfield content backend.
//!
//! Typed JSON documents over Redis, the HTTP API served by `lagerfield-server`,
//! and the image migration run by `migrate-images`.

extern crate self as lagerfield;

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod id;
pub mod keys;
pub mod media;
pub mod migration;
pub mod models;
pub mod repository;
pub mod store;
pub mod types;
pub mod validators;

pub use config::AppConfig;
pub use errors::*;
pub use lagerfield_macros::Document;
pub use repository::Repo;
pub use store::{DocumentStore, MemoryStore, RedisStore};
pub use types::{Document, DocumentDescriptor, FieldDescriptor, FieldType, ValidationRule};
