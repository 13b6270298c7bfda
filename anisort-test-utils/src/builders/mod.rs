//! Builders for test data

mod files;
mod lookup;
mod reply;

pub use files::{write_sample, write_sample_with};
pub use lookup::{LocalFileBuilder, LookupBuilder};
pub use reply::FileReplyBuilder;
