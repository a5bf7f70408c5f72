use serde::Serialize;
use tracing::{debug, warn};

use crate::store::{CollectionClient, CollectionFault, ItemAck};
use crate::wire::{RawRecord, Record, encode_record};

/// Largest number of items the destination accepts in one batch write.
pub const MAX_BATCH_WINDOW: usize = 25;

const MISSING_KEY: &str = "<missing key>";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ItemFailure {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub submitted: usize,
    pub written: usize,
    pub windows: usize,
    /// Records superseded by a later record with the same key in one window.
    pub replaced_in_window: usize,
    pub failures: Vec<ItemFailure>,
}

struct PendingItem {
    key: Option<String>,
    item: RawRecord,
}

/// Submits target records to the destination in bounded windows.
///
/// Pending items are flushed when a window fills, on [`BatchWriter::finish`],
/// and when the writer is dropped early, so a record queued before an error
/// still reaches the destination.
pub struct BatchWriter<'a> {
    client: &'a mut dyn CollectionClient,
    key_attributes: &'a [&'a str],
    window_size: usize,
    pending: Vec<PendingItem>,
    report: LoadReport,
}

impl<'a> BatchWriter<'a> {
    pub fn new(
        client: &'a mut dyn CollectionClient,
        key_attributes: &'a [&'a str],
        window_size: usize,
    ) -> Self {
        let window_size = window_size.clamp(1, MAX_BATCH_WINDOW);
        Self {
            client,
            key_attributes,
            window_size,
            pending: Vec::with_capacity(window_size),
            report: LoadReport::default(),
        }
    }

    /// Queue one record. A record whose key is already pending in the
    /// current window replaces the earlier one.
    pub fn put(&mut self, record: &Record) -> Result<(), CollectionFault> {
        let key = record_key(record, self.key_attributes);
        let item = PendingItem {
            item: encode_record(record),
            key,
        };

        let duplicate = item.key.as_ref().and_then(|key| {
            self.pending
                .iter()
                .position(|pending| pending.key.as_ref() == Some(key))
        });
        match duplicate {
            Some(index) => {
                debug!(key = ?item.key, "replacing pending item with the same key");
                self.pending[index] = item;
                self.report.replaced_in_window += 1;
            }
            None => self.pending.push(item),
        }

        if self.pending.len() >= self.window_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Submit whatever is pending as one window.
    pub fn flush(&mut self) -> Result<(), CollectionFault> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let window = std::mem::take(&mut self.pending);
        let items = window
            .iter()
            .map(|pending| pending.item.clone())
            .collect::<Vec<_>>();
        self.report.windows += 1;
        self.report.submitted += window.len();

        let acks = self.client.batch_write(&items)?;

        for (index, pending) in window.into_iter().enumerate() {
            let key = pending.key.unwrap_or_else(|| MISSING_KEY.to_string());
            match acks.get(index) {
                Some(ItemAck::Written) => self.report.written += 1,
                Some(ItemAck::Rejected(reason)) => {
                    warn!(key = %key, reason = %reason, "destination rejected item");
                    self.report.failures.push(ItemFailure {
                        key,
                        reason: reason.clone(),
                    });
                }
                None => {
                    warn!(key = %key, "destination returned no acknowledgement");
                    self.report.failures.push(ItemFailure {
                        key,
                        reason: "no acknowledgement returned".to_string(),
                    });
                }
            }
        }

        debug!(
            collection = %self.client.name(),
            window = self.report.windows,
            written = self.report.written,
            "batch window submitted"
        );
        Ok(())
    }

    pub fn finish(mut self) -> Result<LoadReport, CollectionFault> {
        self.flush()?;
        Ok(self.into_report())
    }

    /// Give up the writer and keep what it reported. Items still pending are
    /// flushed by `Drop`, after the report is taken.
    pub fn into_report(mut self) -> LoadReport {
        std::mem::take(&mut self.report)
    }
}

impl Drop for BatchWriter<'_> {
    fn drop(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let pending = self.pending.len();
        match self.flush() {
            Ok(()) => debug!(pending, "flushed pending items on early exit"),
            Err(err) => warn!(pending, error = %err, "failed to flush pending items on early exit"),
        }
    }
}

/// Destination key of a target record; composite keys are joined with `#`.
pub fn record_key(record: &Record, key_attributes: &[&str]) -> Option<String> {
    let parts = key_attributes
        .iter()
        .map(|attribute| {
            record
                .get(*attribute)
                .and_then(|value| value.as_text_lenient())
                .filter(|text| !text.is_empty())
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("#"))
}
