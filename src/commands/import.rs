use std::fs::File;
use std::io::{BufRead, BufReader};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::ImportArgs;
use crate::pipeline::sniff_page_format;
use crate::store::{ItemAck, PageFormat, SqliteCollection, open_store, validate_collection_name};
use crate::util::ensure_directory;
use crate::wire::RawRecord;

const IMPORT_BATCH_SIZE: usize = 500;

#[derive(Debug, Default)]
struct ImportCounts {
    lines: usize,
    imported: usize,
    rejected: usize,
    wire_items: usize,
    plain_items: usize,
}

pub fn run(args: ImportArgs) -> Result<()> {
    validate_collection_name(&args.collection).context("invalid collection")?;
    if args.key_attributes.is_empty() {
        bail!("at least one --key-attribute is required");
    }

    if let Some(parent) = args.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }

    let connection = open_store(&args.db_path, true)
        .with_context(|| format!("failed to open store {}", args.db_path.display()))?;
    let key_attributes = args
        .key_attributes
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>();
    let mut collection = SqliteCollection::create(connection, &args.collection)
        .context("failed to prepare collection")?
        .with_key_attributes(&key_attributes);

    let file = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let reader = BufReader::new(file);

    info!(
        input = %args.input.display(),
        collection = %args.collection,
        "starting import"
    );

    let mut counts = ImportCounts::default();
    let mut batch = Vec::<RawRecord>::new();
    let mut batch_format = PageFormat::Plain;

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.with_context(|| {
            format!("failed to read line {line_number} of {}", args.input.display())
        })?;
        if line.trim().is_empty() {
            continue;
        }
        counts.lines += 1;

        let item = parse_export_line(&line)
            .with_context(|| format!("invalid item on line {line_number}"))?;
        let format = sniff_page_format(std::slice::from_ref(&item));
        match format {
            PageFormat::Wire => counts.wire_items += 1,
            PageFormat::Plain => counts.plain_items += 1,
        }

        if format != batch_format && !batch.is_empty() {
            store_batch(&mut collection, &mut batch, batch_format, &mut counts)?;
        }
        batch_format = format;
        batch.push(item);

        if batch.len() >= IMPORT_BATCH_SIZE {
            store_batch(&mut collection, &mut batch, batch_format, &mut counts)?;
        }
    }
    store_batch(&mut collection, &mut batch, batch_format, &mut counts)?;

    let total = collection.count()?;
    info!(
        collection = %args.collection,
        lines = counts.lines,
        imported = counts.imported,
        rejected = counts.rejected,
        wire_items = counts.wire_items,
        plain_items = counts.plain_items,
        collection_total = total,
        "import completed"
    );

    Ok(())
}

fn store_batch(
    collection: &mut SqliteCollection,
    batch: &mut Vec<RawRecord>,
    format: PageFormat,
    counts: &mut ImportCounts,
) -> Result<()> {
    if batch.is_empty() {
        return Ok(());
    }

    let acks = collection
        .put_items(batch, format)
        .context("failed to write import batch")?;
    for ack in acks {
        match ack {
            ItemAck::Written => counts.imported += 1,
            ItemAck::Rejected(reason) => {
                counts.rejected += 1;
                warn!(reason = %reason, "skipped item");
            }
        }
    }
    batch.clear();
    Ok(())
}

/// One export line: either `{"Item": {...}}` as written by table exports, or
/// the item object itself.
fn parse_export_line(line: &str) -> Result<RawRecord> {
    let value: Value = serde_json::from_str(line).context("line is not valid JSON")?;
    let Value::Object(object) = value else {
        bail!("expected a JSON object");
    };

    if object.len() == 1 {
        if let Some(Value::Object(item)) = object.get("Item") {
            return Ok(item.clone());
        }
    }
    Ok(object)
}
