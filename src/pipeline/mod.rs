//! Scan, decode, reshape and load: the migration pipeline shared by every
//! entity job.

mod job;
mod loader;
mod scanner;

#[cfg(test)]
mod tests;

pub use job::{JobSummary, MigrationJob};
pub use loader::{ItemFailure, MAX_BATCH_WINDOW};
pub use scanner::sniff_page_format;
