//! Service layer: blob storage, thumbnailing, upload orchestration, and the
//! media/album catalogs. Handlers delegate here and never own logic.

pub mod album_catalog;
pub mod blob_store;
pub mod error;
pub mod media_catalog;
pub mod thumbnailer;
pub mod upload;

#[cfg(test)]
pub(crate) mod testutil;
