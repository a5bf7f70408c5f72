use serde::Serialize;
use tracing::{debug, info, warn};

use crate::entities::{EntityKind, EntityRules, transform};
use crate::store::{CollectionClient, CollectionFault, PageFormat};
use crate::translate::TranslationGateway;
use crate::util::now_utc_string;
use crate::wire::{Record, record_to_json};

use super::loader::{BatchWriter, LoadReport, record_key};
use super::scanner::{PagedScanner, decode_page};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    NotStarted,
    Scanning,
    Decoding,
    Transforming,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Scanning => "scanning",
            Self::Decoding => "decoding",
            Self::Transforming => "transforming",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Counters observable while a job runs and after it fails.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct JobProgress {
    pub pages: usize,
    pub records_scanned: usize,
    pub records_queued: usize,
    pub wire_pages: usize,
    pub plain_pages: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub entity: EntityKind,
    pub source_collection: String,
    pub destination_collection: String,
    pub state: JobState,
    pub started_at: String,
    pub finished_at: String,
    pub progress: JobProgress,
    pub load: LoadReport,
    pub translation_calls: usize,
    pub translation_failures: usize,
}

/// One entity migration: scan the source, decode, reshape and load each
/// record before the next one is pulled.
pub struct MigrationJob<'a> {
    rules: &'static EntityRules,
    source: &'a mut dyn CollectionClient,
    destination: &'a mut dyn CollectionClient,
    gateway: TranslationGateway<'a>,
    window_size: usize,
    state: JobState,
    failed_in: Option<JobState>,
    progress: JobProgress,
    load: LoadReport,
}

impl<'a> MigrationJob<'a> {
    pub fn new(
        rules: &'static EntityRules,
        source: &'a mut dyn CollectionClient,
        destination: &'a mut dyn CollectionClient,
        gateway: TranslationGateway<'a>,
        window_size: usize,
    ) -> Self {
        Self {
            rules,
            source,
            destination,
            gateway,
            window_size,
            state: JobState::NotStarted,
            failed_in: None,
            progress: JobProgress::default(),
            load: LoadReport::default(),
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Stage that was active when the job failed.
    pub fn failed_in(&self) -> Option<JobState> {
        self.failed_in
    }

    pub fn progress(&self) -> JobProgress {
        self.progress
    }

    /// Destination outcome so far. After a fault this covers the records
    /// that were queued before it and flushed on the way out.
    pub fn load_report(&self) -> &LoadReport {
        &self.load
    }

    pub fn gateway(&self) -> &TranslationGateway<'a> {
        &self.gateway
    }

    pub fn run(&mut self) -> Result<JobSummary, CollectionFault> {
        let started_at = now_utc_string();
        match self.migrate() {
            Ok(()) => {
                self.state = JobState::Completed;
                let summary = JobSummary {
                    entity: self.rules.kind,
                    source_collection: self.source.name().to_string(),
                    destination_collection: self.destination.name().to_string(),
                    state: self.state,
                    started_at,
                    finished_at: now_utc_string(),
                    progress: self.progress,
                    load: self.load.clone(),
                    translation_calls: self.gateway.calls(),
                    translation_failures: self.gateway.failures(),
                };
                info!(
                    entity = self.rules.kind.as_str(),
                    pages = summary.progress.pages,
                    scanned = summary.progress.records_scanned,
                    written = summary.load.written,
                    failed = summary.load.failures.len(),
                    translation_failures = summary.translation_failures,
                    "migration completed"
                );
                Ok(summary)
            }
            Err(err) => {
                let failed_in = self.state;
                self.failed_in = Some(failed_in);
                self.state = JobState::Failed;
                warn!(
                    entity = self.rules.kind.as_str(),
                    state = failed_in.as_str(),
                    written = self.load.written,
                    failed = self.load.failures.len(),
                    error = %err,
                    "migration failed"
                );
                Err(err)
            }
        }
    }

    fn migrate(&mut self) -> Result<(), CollectionFault> {
        let rules = self.rules;
        let mut scanner = PagedScanner::new(&mut *self.source);
        let mut writer = BatchWriter::new(
            &mut *self.destination,
            rules.key_attributes,
            self.window_size,
        );

        let outcome = 'pages: loop {
            self.state = JobState::Scanning;
            let page = match scanner.next_page() {
                Ok(Some(page)) => page,
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            };

            self.state = JobState::Decoding;
            let (format, records) = decode_page(page);
            self.progress.pages += 1;
            match format {
                PageFormat::Wire => self.progress.wire_pages += 1,
                PageFormat::Plain => self.progress.plain_pages += 1,
            }

            self.state = JobState::Transforming;
            for record in records {
                self.progress.records_scanned += 1;
                if self.progress.records_scanned == 1 {
                    debug!(
                        format = format.as_str(),
                        record = %record_to_json(&record),
                        "example decoded record"
                    );
                }

                let target = transform(rules, &record, &self.gateway);
                if let Err(err) = writer.put(&target) {
                    break 'pages Err(err);
                }
                self.progress.records_queued += 1;

                info!(
                    entity = rules.kind.as_str(),
                    ordinal = self.progress.records_queued,
                    key = %record_key(&target, rules.key_attributes).unwrap_or_default(),
                    detail = %progress_detail(&target, rules.progress_fields),
                    "migrated record"
                );
            }
        };

        // Records queued before a fault are still submitted.
        let flushed = writer.flush();
        if let (Err(_), Err(flush_err)) = (&outcome, &flushed) {
            warn!(error = %flush_err, "failed to flush queued records after a fault");
        }
        self.load = writer.into_report();
        outcome.and(flushed)
    }
}

fn progress_detail(record: &Record, fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| {
            let value = record
                .get(*field)
                .and_then(|value| value.as_text_lenient())
                .unwrap_or_default();
            format!("{field}={value}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}
