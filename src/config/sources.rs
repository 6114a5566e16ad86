//! Configuration sources, applied in this order by the loader.

pub mod environment;
pub mod global_file;
pub mod workspace_file;
