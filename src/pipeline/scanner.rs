use serde_json::Value;
use tracing::debug;

use crate::store::{CollectionClient, CollectionFault, PageFormat, ScanCursor, ScanPage};
use crate::wire::{RawRecord, Record, decode_record, is_wire_envelope};

/// Walks a collection page by page until the store stops returning a
/// continuation cursor.
pub struct PagedScanner<'a> {
    client: &'a mut dyn CollectionClient,
    cursor: Option<ScanCursor>,
    exhausted: bool,
    pages: usize,
}

impl<'a> PagedScanner<'a> {
    pub fn new(client: &'a mut dyn CollectionClient) -> Self {
        Self {
            client,
            cursor: None,
            exhausted: false,
            pages: 0,
        }
    }

    /// Next raw page, or `None` once the previous page carried no cursor.
    pub fn next_page(&mut self) -> Result<Option<ScanPage>, CollectionFault> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self.client.scan(self.cursor.as_ref())?;
        self.pages += 1;
        self.cursor = page.next_cursor.clone();
        self.exhausted = self.cursor.is_none();

        debug!(
            collection = %self.client.name(),
            page = self.pages,
            items = page.items.len(),
            "fetched scan page"
        );

        Ok(Some(page))
    }
}

/// Decode one page. Every row goes through the tagged-value decoder, which
/// classifies each attribute on its own and leaves plain values unchanged.
/// The reported format is the declared one, or the sniffed one otherwise.
pub fn decode_page(page: ScanPage) -> (PageFormat, Vec<Record>) {
    let format = page
        .format
        .unwrap_or_else(|| sniff_page_format(&page.items));
    let records = page.items.iter().map(decode_record).collect();
    (format, records)
}

/// A page is wire-encoded when the first attribute of its first item is an
/// envelope.
pub fn sniff_page_format(items: &[RawRecord]) -> PageFormat {
    let first_value: Option<&Value> = items.first().and_then(|item| item.values().next());
    match first_value {
        Some(value) if is_wire_envelope(value) => PageFormat::Wire,
        _ => PageFormat::Plain,
    }
}
