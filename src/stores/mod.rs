// Data access layer over the relational store
pub mod catalog_store;
pub mod user_store;

pub use catalog_store::{CatalogStore, OverrideEntry};
pub use user_store::{NewUser, UserStore};
