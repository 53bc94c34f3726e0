//! Database repositories for data access layer
//!
//! Postgres implementations of the store traits. Repositories are `Clone`
//! structs holding a `PgPool`; queries are dynamic SQLx so builds never need
//! a live database.

mod brand;
mod draft;

pub use brand::BrandRepository;
pub use draft::DraftRepository;
