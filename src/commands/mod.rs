pub mod import;
pub mod jobs;
pub mod migrate;
