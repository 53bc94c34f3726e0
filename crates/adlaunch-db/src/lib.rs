//! Persistence layer: store traits and their Postgres repositories.

pub mod db;
pub mod traits;

pub use db::{BrandRepository, DraftRepository};
pub use traits::{BrandStore, DraftStore};
