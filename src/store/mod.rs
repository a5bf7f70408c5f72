//! Collection client contract shared by every migration job.
//!
//! A collection is a paginated key/value table. The pipeline only needs two
//! calls: a cursor-driven `scan` and a per-item acknowledged `batch_write`.
//! Authentication, transport and retries belong to the client.

use regex::Regex;
use thiserror::Error;

use crate::wire::RawRecord;

mod sqlite;

pub use sqlite::{SqliteCollection, open_store};

/// Opaque continuation token handed back by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCursor(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFormat {
    /// Attributes are wrapped in single-key type envelopes.
    Wire,
    /// Attributes are already plain JSON.
    Plain,
}

impl PageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wire => "wire",
            Self::Plain => "plain",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "wire" => Some(Self::Wire),
            "plain" => Some(Self::Plain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanPage {
    pub items: Vec<RawRecord>,
    pub next_cursor: Option<ScanCursor>,
    /// Declared encoding of every item in the page, when the store knows it.
    pub format: Option<PageFormat>,
}

/// Per-item acknowledgement of a batch write, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemAck {
    Written,
    Rejected(String),
}

/// Collection-level failure. Fatal for the job that hits it.
#[derive(Debug, Error)]
pub enum CollectionFault {
    #[error("collection '{collection}' not found")]
    NotFound { collection: String },
    #[error("access to collection '{collection}' denied: {message}")]
    PermissionDenied { collection: String, message: String },
    #[error("collection '{collection}' is unavailable: {message}")]
    Unavailable { collection: String, message: String },
    #[error("invalid collection name '{0}': expected 3-255 characters of [A-Za-z0-9_.-]")]
    InvalidName(String),
    #[error("collection '{collection}' backend error: {message}")]
    Backend { collection: String, message: String },
}

pub trait CollectionClient {
    fn name(&self) -> &str;

    /// Fetch one page, starting after `cursor` when given.
    fn scan(&mut self, cursor: Option<&ScanCursor>) -> Result<ScanPage, CollectionFault>;

    /// Write `items`, returning exactly one acknowledgement per item.
    fn batch_write(&mut self, items: &[RawRecord]) -> Result<Vec<ItemAck>, CollectionFault>;
}

pub fn validate_collection_name(name: &str) -> Result<(), CollectionFault> {
    let pattern = Regex::new(r"^[A-Za-z0-9_.\-]{3,255}$").map_err(|err| CollectionFault::Backend {
        collection: name.to_string(),
        message: err.to_string(),
    })?;

    if pattern.is_match(name) {
        Ok(())
    } else {
        Err(CollectionFault::InvalidName(name.to_string()))
    }
}
