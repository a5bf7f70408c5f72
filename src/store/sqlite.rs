use std::path::Path;

use rusqlite::{Connection, ErrorCode, OpenFlags, params};
use tracing::debug;

use super::{
    CollectionClient, CollectionFault, ItemAck, PageFormat, ScanCursor, ScanPage,
    validate_collection_name,
};
use crate::wire::{RawRecord, key_text};

const DEFAULT_PAGE_SIZE: usize = 100;
const KEY_SEPARATOR: &str = "#";

/// A collection stored as one table of a local SQLite database.
///
/// Rows keep their body as JSON text together with the encoding they were
/// written in, so one store can hold both legacy wire rows and plain rows.
pub struct SqliteCollection {
    connection: Connection,
    name: String,
    key_attributes: Vec<String>,
    page_size: usize,
}

impl SqliteCollection {
    /// Attach to an existing collection.
    pub fn open(connection: Connection, name: &str) -> Result<Self, CollectionFault> {
        validate_collection_name(name)?;
        let exists: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |row| row.get(0),
            )
            .map_err(|err| classify(name, err))?;
        if exists == 0 {
            return Err(CollectionFault::NotFound {
                collection: name.to_string(),
            });
        }

        Ok(Self::attach(connection, name))
    }

    /// Attach to a collection, creating its table first when missing.
    pub fn create(connection: Connection, name: &str) -> Result<Self, CollectionFault> {
        validate_collection_name(name)?;
        connection
            .execute_batch(&format!(
                "
                CREATE TABLE IF NOT EXISTS \"{name}\" (
                  item_key TEXT PRIMARY KEY,
                  format TEXT NOT NULL,
                  body TEXT NOT NULL
                );
                "
            ))
            .map_err(|err| classify(name, err))?;

        Ok(Self::attach(connection, name))
    }

    fn attach(connection: Connection, name: &str) -> Self {
        Self {
            connection,
            name: name.to_string(),
            key_attributes: vec!["Identifier".to_string()],
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_key_attributes(mut self, key_attributes: &[&str]) -> Self {
        self.key_attributes = key_attributes.iter().map(|key| key.to_string()).collect();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn count(&self) -> Result<i64, CollectionFault> {
        self.connection
            .query_row(&format!("SELECT COUNT(*) FROM \"{}\"", self.name), [], |row| {
                row.get(0)
            })
            .map_err(|err| classify(&self.name, err))
    }

    /// Upsert rows by key inside one transaction, acknowledging each row.
    pub fn put_items(
        &mut self,
        items: &[RawRecord],
        format: PageFormat,
    ) -> Result<Vec<ItemAck>, CollectionFault> {
        let name = self.name.clone();
        let tx = self
            .connection
            .transaction()
            .map_err(|err| classify(&name, err))?;
        let mut acks = Vec::with_capacity(items.len());

        {
            let mut statement = tx
                .prepare(&format!(
                    "
                    INSERT INTO \"{name}\"(item_key, format, body)
                    VALUES(?1, ?2, ?3)
                    ON CONFLICT(item_key) DO UPDATE SET
                      format=excluded.format,
                      body=excluded.body
                    "
                ))
                .map_err(|err| classify(&name, err))?;

            for item in items {
                let Some(key) = item_key(&self.key_attributes, item) else {
                    acks.push(ItemAck::Rejected(format!(
                        "missing or empty key attribute ({})",
                        self.key_attributes.join(", ")
                    )));
                    continue;
                };

                let body = match serde_json::to_string(item) {
                    Ok(body) => body,
                    Err(err) => {
                        acks.push(ItemAck::Rejected(format!("unserializable item: {err}")));
                        continue;
                    }
                };

                match statement.execute(params![key, format.as_str(), body]) {
                    Ok(_) => acks.push(ItemAck::Written),
                    Err(err) => match classify(&name, err) {
                        CollectionFault::Backend { message, .. } => {
                            acks.push(ItemAck::Rejected(message));
                        }
                        fault => return Err(fault),
                    },
                }
            }
        }

        tx.commit().map_err(|err| classify(&name, err))?;
        Ok(acks)
    }
}

impl CollectionClient for SqliteCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan(&mut self, cursor: Option<&ScanCursor>) -> Result<ScanPage, CollectionFault> {
        let after = cursor.map(|cursor| cursor.0.as_str()).unwrap_or("");
        let lookahead = (self.page_size + 1) as i64;

        let mut statement = self
            .connection
            .prepare(&format!(
                "
                SELECT item_key, format, body
                FROM \"{}\"
                WHERE item_key > ?1
                ORDER BY item_key ASC
                LIMIT ?2
                ",
                self.name
            ))
            .map_err(|err| classify(&self.name, err))?;

        let mut rows = statement
            .query(params![after, lookahead])
            .map_err(|err| classify(&self.name, err))?;

        let mut keys = Vec::<String>::new();
        let mut formats = Vec::<String>::new();
        let mut items = Vec::<RawRecord>::new();
        while let Some(row) = rows.next().map_err(|err| classify(&self.name, err))? {
            let key: String = row.get(0).map_err(|err| classify(&self.name, err))?;
            let format: String = row.get(1).map_err(|err| classify(&self.name, err))?;
            let body: String = row.get(2).map_err(|err| classify(&self.name, err))?;
            let item: RawRecord =
                serde_json::from_str(&body).map_err(|err| CollectionFault::Backend {
                    collection: self.name.clone(),
                    message: format!("row {key} holds invalid JSON: {err}"),
                })?;
            keys.push(key);
            formats.push(format);
            items.push(item);
        }

        let next_cursor = if items.len() > self.page_size {
            items.truncate(self.page_size);
            formats.truncate(self.page_size);
            keys.truncate(self.page_size);
            keys.last().cloned().map(ScanCursor)
        } else {
            None
        };

        let format = match formats.split_first() {
            Some((first, rest)) if rest.iter().all(|format| format == first) => {
                PageFormat::parse(first)
            }
            _ => None,
        };

        debug!(
            collection = %self.name,
            items = items.len(),
            has_more = next_cursor.is_some(),
            "scanned page"
        );

        Ok(ScanPage {
            items,
            next_cursor,
            format,
        })
    }

    fn batch_write(&mut self, items: &[RawRecord]) -> Result<Vec<ItemAck>, CollectionFault> {
        self.put_items(items, PageFormat::Wire)
    }
}

/// Open a store database file for reading and writing collections.
pub fn open_store(path: &Path, create: bool) -> Result<Connection, CollectionFault> {
    let label = path.display().to_string();
    let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    if create {
        flags |= OpenFlags::SQLITE_OPEN_CREATE;
    }

    let connection =
        Connection::open_with_flags(path, flags).map_err(|err| classify(&label, err))?;
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .map_err(|err| classify(&label, err))?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .map_err(|err| classify(&label, err))?;
    Ok(connection)
}

fn item_key(key_attributes: &[String], item: &RawRecord) -> Option<String> {
    let parts = key_attributes
        .iter()
        .map(|attribute| item.get(attribute).and_then(key_text))
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join(KEY_SEPARATOR))
}

fn classify(collection: &str, err: rusqlite::Error) -> CollectionFault {
    let collection = collection.to_string();
    let message = err.to_string();

    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        match failure.code {
            ErrorCode::ReadOnly
            | ErrorCode::PermissionDenied
            | ErrorCode::AuthorizationForStatementDenied => {
                return CollectionFault::PermissionDenied {
                    collection,
                    message,
                };
            }
            ErrorCode::CannotOpen
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::NotADatabase => {
                return CollectionFault::Unavailable {
                    collection,
                    message,
                };
            }
            _ => {}
        }
    }

    if message.contains("no such table") {
        return CollectionFault::NotFound { collection };
    }

    CollectionFault::Backend {
        collection,
        message,
    }
}
