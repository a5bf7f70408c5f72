use serde::Serialize;

use crate::pipeline::ItemFailure;

#[derive(Debug, Clone, Serialize)]
pub struct MigrationPaths {
    pub db_path: String,
    pub manifest_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationCollections {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationCounts {
    pub pages: usize,
    pub wire_pages: usize,
    pub plain_pages: usize,
    pub records_scanned: usize,
    pub records_queued: usize,
    pub items_submitted: usize,
    pub items_written: usize,
    pub items_failed: usize,
    pub batch_windows: usize,
    pub replaced_in_window: usize,
    pub translation_calls: usize,
    pub translation_failures: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub entity: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub failed_state: Option<String>,
    pub failure_reason: Option<String>,
    pub translator: String,
    pub batch_window: usize,
    pub collections: MigrationCollections,
    pub paths: MigrationPaths,
    pub counts: MigrationCounts,
    pub item_failures: Vec<ItemFailure>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobListing {
    pub entity: String,
    pub source_collection: String,
    pub destination_collection: String,
    pub key_attributes: Vec<String>,
    pub base_language: Option<String>,
    pub target_language: Option<String>,
    pub numbers_as_text: bool,
}
