pub mod encoder;
pub mod metadata_store;
