pub mod prepare;
pub mod summary;
