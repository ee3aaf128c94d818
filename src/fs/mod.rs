//! Filesystem side of the server: resource resolution and listing pages.

pub mod listing;
pub mod resolver;
