//! Core data models for the media library.
//!
//! These entities represent media items, albums, and the ordered
//! album/media junction. They map cleanly to database tables via
//! `sqlx::FromRow` and serialize naturally as JSON via `serde`.

pub mod album;
pub mod media_item;
pub mod membership;
