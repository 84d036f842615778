//! Utility types shared across the pipeline.

pub mod charset;

pub use charset::Charset;
