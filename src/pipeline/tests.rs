use rusqlite::Connection;
use serde_json::{Value, json};

use super::job::{JobState, MigrationJob};
use super::loader::{BatchWriter, ItemFailure, MAX_BATCH_WINDOW, record_key};
use super::scanner::sniff_page_format;
use crate::entities::EntityKind;
use crate::store::{
    CollectionClient, CollectionFault, ItemAck, PageFormat, ScanCursor, ScanPage, SqliteCollection,
};
use crate::translate::testing::UppercaseTranslator;
use crate::translate::{PassthroughTranslator, TranslationGateway};
use crate::wire::{PlainValue, RawRecord, Record, key_text};

fn raw(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture is not an object: {other}"),
    }
}

fn notification(identifier: &str) -> RawRecord {
    raw(json!({
        "Identifier": {"S": identifier},
        "Title": {"S": format!("title {identifier}")},
        "isActive": {"BOOL": true}
    }))
}

/// Serves a fixed list of pages; the cursor is the index of the next page.
struct FakeSource {
    pages: Vec<(Vec<RawRecord>, Option<PageFormat>)>,
    scans: Vec<Option<String>>,
    fail_on_page: Option<usize>,
}

impl FakeSource {
    fn new(pages: Vec<Vec<RawRecord>>) -> Self {
        Self {
            pages: pages.into_iter().map(|items| (items, None)).collect(),
            scans: Vec::new(),
            fail_on_page: None,
        }
    }
}

impl CollectionClient for FakeSource {
    fn name(&self) -> &str {
        "fake-source"
    }

    fn scan(&mut self, cursor: Option<&ScanCursor>) -> Result<ScanPage, CollectionFault> {
        self.scans.push(cursor.map(|cursor| cursor.0.clone()));
        let index = cursor
            .map(|cursor| cursor.0.parse::<usize>().expect("numeric cursor"))
            .unwrap_or(0);
        if self.fail_on_page == Some(index) {
            return Err(CollectionFault::PermissionDenied {
                collection: self.name().to_string(),
                message: "token expired".to_string(),
            });
        }

        let (items, format) = self.pages.get(index).cloned().unwrap_or_default();
        let next_cursor = (index + 1 < self.pages.len()).then(|| ScanCursor((index + 1).to_string()));
        Ok(ScanPage {
            items,
            next_cursor,
            format,
        })
    }

    fn batch_write(&mut self, _items: &[RawRecord]) -> Result<Vec<ItemAck>, CollectionFault> {
        unreachable!("source is never written")
    }
}

#[derive(Default)]
struct FakeDestination {
    written: Vec<RawRecord>,
    windows: Vec<usize>,
    reject: Vec<String>,
}

impl FakeDestination {
    fn written_keys(&self) -> Vec<String> {
        self.written
            .iter()
            .filter_map(|item| item.get("Identifier").and_then(key_text))
            .collect()
    }
}

impl CollectionClient for FakeDestination {
    fn name(&self) -> &str {
        "fake-destination"
    }

    fn scan(&mut self, _cursor: Option<&ScanCursor>) -> Result<ScanPage, CollectionFault> {
        unreachable!("destination is never scanned")
    }

    fn batch_write(&mut self, items: &[RawRecord]) -> Result<Vec<ItemAck>, CollectionFault> {
        self.windows.push(items.len());
        let acks = items
            .iter()
            .map(|item| {
                let key = item.get("Identifier").and_then(key_text).unwrap_or_default();
                if self.reject.contains(&key) {
                    ItemAck::Rejected("malformed key".to_string())
                } else {
                    self.written.push(item.clone());
                    ItemAck::Written
                }
            })
            .collect();
        Ok(acks)
    }
}

fn plain_record(identifier: &str, title: &str) -> Record {
    let mut record = Record::new();
    record.insert("Identifier".to_string(), PlainValue::text(identifier));
    record.insert("Title".to_string(), PlainValue::text(title));
    record
}

#[test]
fn pages_are_migrated_once_in_scan_order() {
    let mut source = FakeSource::new(vec![
        vec![notification("n1"), notification("n2")],
        vec![notification("n3"), notification("n4")],
        vec![notification("n5")],
    ]);
    let mut destination = FakeDestination::default();
    let translator = PassthroughTranslator;

    let summary = MigrationJob::new(
        EntityKind::Notification.rules(),
        &mut source,
        &mut destination,
        TranslationGateway::new(&translator),
        25,
    )
    .run()
    .expect("job completes");

    assert_eq!(summary.state, JobState::Completed);
    assert_eq!(summary.progress.pages, 3);
    assert_eq!(summary.progress.records_scanned, 5);
    assert_eq!(summary.load.written, 5);
    assert!(summary.load.failures.is_empty());
    assert_eq!(
        source.scans,
        vec![None, Some("1".to_string()), Some("2".to_string())]
    );
    assert_eq!(destination.written_keys(), vec!["n1", "n2", "n3", "n4", "n5"]);
    assert_eq!(destination.written[0].get("Lang_Code"), Some(&json!({"S": "EN"})));
    assert_eq!(destination.written[0].get("isActive"), Some(&json!({"BOOL": true})));
}

#[test]
fn each_page_is_sniffed_independently() {
    let mut source = FakeSource::new(vec![
        vec![notification("n1")],
        vec![raw(json!({"Identifier": "n2", "Title": "plain title"}))],
    ]);
    let mut destination = FakeDestination::default();
    let translator = PassthroughTranslator;

    let summary = MigrationJob::new(
        EntityKind::Notification.rules(),
        &mut source,
        &mut destination,
        TranslationGateway::new(&translator),
        25,
    )
    .run()
    .expect("job completes");

    assert_eq!(summary.progress.wire_pages, 1);
    assert_eq!(summary.progress.plain_pages, 1);
    assert_eq!(destination.written[0].get("Title"), Some(&json!({"S": "title n1"})));
    assert_eq!(destination.written[1].get("Title"), Some(&json!({"S": "plain title"})));
}

#[test]
fn declared_page_format_is_counted_but_rows_are_still_unwrapped() {
    let mut source = FakeSource::new(vec![]);
    source.pages.push((
        vec![raw(json!({"Identifier": "n1", "Title": {"S": "wrapped on a plain page"}}))],
        Some(PageFormat::Plain),
    ));
    let mut destination = FakeDestination::default();
    let translator = PassthroughTranslator;

    let summary = MigrationJob::new(
        EntityKind::Notification.rules(),
        &mut source,
        &mut destination,
        TranslationGateway::new(&translator),
        25,
    )
    .run()
    .expect("job completes");

    assert_eq!(summary.progress.plain_pages, 1);
    assert_eq!(summary.progress.wire_pages, 0);
    assert_eq!(
        destination.written[0].get("Title"),
        Some(&json!({"S": "wrapped on a plain page"}))
    );
}

#[test]
fn page_mixing_plain_wrapped_and_partially_wrapped_rows_is_fully_decoded() {
    let mut source = FakeSource::new(vec![vec![
        raw(json!({"Identifier": "n1", "Title": "plain"})),
        notification("n2"),
        raw(json!({"Identifier": "n3", "Title": {"S": "partially wrapped"}})),
    ]]);
    let mut destination = FakeDestination::default();
    let translator = PassthroughTranslator;

    let summary = MigrationJob::new(
        EntityKind::Notification.rules(),
        &mut source,
        &mut destination,
        TranslationGateway::new(&translator),
        25,
    )
    .run()
    .expect("job completes");

    assert_eq!(summary.progress.plain_pages, 1);
    assert_eq!(summary.load.written, 3);
    assert_eq!(destination.written_keys(), vec!["n1", "n2", "n3"]);
    let titles = destination
        .written
        .iter()
        .map(|item| item.get("Title").cloned())
        .collect::<Vec<_>>();
    assert_eq!(
        titles,
        vec![
            Some(json!({"S": "plain"})),
            Some(json!({"S": "title n2"})),
            Some(json!({"S": "partially wrapped"})),
        ]
    );
}

#[test]
fn rejected_item_does_not_stop_the_rest() {
    let mut source = FakeSource::new(vec![
        ["n1", "n2", "n3", "n4", "n5"]
            .into_iter()
            .map(notification)
            .collect(),
    ]);
    let mut destination = FakeDestination {
        reject: vec!["n3".to_string()],
        ..FakeDestination::default()
    };
    let translator = PassthroughTranslator;

    let summary = MigrationJob::new(
        EntityKind::Notification.rules(),
        &mut source,
        &mut destination,
        TranslationGateway::new(&translator),
        25,
    )
    .run()
    .expect("item rejections are not fatal");

    assert_eq!(summary.state, JobState::Completed);
    assert_eq!(summary.load.submitted, 5);
    assert_eq!(summary.load.written, 4);
    assert_eq!(
        summary.load.failures,
        vec![ItemFailure {
            key: "n3".to_string(),
            reason: "malformed key".to_string(),
        }]
    );
    assert_eq!(destination.written_keys(), vec!["n1", "n2", "n4", "n5"]);
}

#[test]
fn collection_fault_fails_the_job_after_flushing_queued_records() {
    let mut source = FakeSource::new(vec![
        vec![notification("n1"), notification("n2")],
        vec![notification("n3")],
    ]);
    source.fail_on_page = Some(1);
    let mut destination = FakeDestination {
        reject: vec!["n2".to_string()],
        ..FakeDestination::default()
    };
    let translator = PassthroughTranslator;

    let mut job = MigrationJob::new(
        EntityKind::Notification.rules(),
        &mut source,
        &mut destination,
        TranslationGateway::new(&translator),
        25,
    );
    let err = job.run().expect_err("permission denial is fatal");

    assert!(matches!(err, CollectionFault::PermissionDenied { .. }));
    assert!(err.to_string().contains("token expired"));
    assert_eq!(job.state(), JobState::Failed);
    assert_eq!(job.progress().records_queued, 2);
    let load = job.load_report();
    assert_eq!(load.submitted, 2);
    assert_eq!(load.written, 1);
    assert_eq!(load.windows, 1);
    assert_eq!(
        load.failures,
        vec![ItemFailure {
            key: "n2".to_string(),
            reason: "malformed key".to_string(),
        }]
    );
    drop(job);
    assert_eq!(destination.written_keys(), vec!["n1"]);
}

#[test]
fn windows_are_bounded_by_the_batch_limit() {
    let mut destination = FakeDestination::default();
    let mut writer = BatchWriter::new(&mut destination, &["Identifier"], 100);
    for index in 0..30 {
        writer
            .put(&plain_record(&format!("k{index:02}"), "t"))
            .expect("put");
    }
    let report = writer.finish().expect("finish");

    assert_eq!(report.windows, 2);
    assert_eq!(report.written, 30);
    assert_eq!(destination.windows, vec![MAX_BATCH_WINDOW, 5]);
}

#[test]
fn later_record_replaces_pending_one_with_same_key() {
    let mut destination = FakeDestination::default();
    let mut writer = BatchWriter::new(&mut destination, &["Identifier"], 25);
    writer.put(&plain_record("dup", "first")).expect("put");
    writer.put(&plain_record("other", "x")).expect("put");
    writer.put(&plain_record("dup", "second")).expect("put");
    let report = writer.finish().expect("finish");

    assert_eq!(report.replaced_in_window, 1);
    assert_eq!(report.submitted, 2);
    assert_eq!(destination.written_keys(), vec!["dup", "other"]);
    assert_eq!(destination.written[0].get("Title"), Some(&json!({"S": "second"})));
}

#[test]
fn dropping_the_writer_flushes_pending_records() {
    let mut destination = FakeDestination::default();
    {
        let mut writer = BatchWriter::new(&mut destination, &["Identifier"], 25);
        writer.put(&plain_record("a1", "t")).expect("put");
        writer.put(&plain_record("a2", "t")).expect("put");
    }

    assert_eq!(destination.windows, vec![2]);
    assert_eq!(destination.written_keys(), vec!["a1", "a2"]);
}

#[test]
fn composite_keys_join_attributes() {
    let mut record = Record::new();
    record.insert("user_id".to_string(), PlainValue::text("u1"));
    record.insert(
        "timestamp".to_string(),
        PlainValue::from_json(&json!(1700000000)),
    );

    let metric = EntityKind::Metric.rules();
    assert_eq!(
        record_key(&record, metric.key_attributes),
        Some("u1#1700000000".to_string())
    );

    record.insert("user_id".to_string(), PlainValue::text(""));
    assert_eq!(record_key(&record, metric.key_attributes), None);
}

#[test]
fn sniffing_looks_at_the_first_field_of_the_first_item() {
    assert_eq!(sniff_page_format(&[notification("n1")]), PageFormat::Wire);
    assert_eq!(
        sniff_page_format(&[raw(json!({"Identifier": "n1", "Title": {"S": "x"}}))]),
        PageFormat::Plain
    );
    assert_eq!(sniff_page_format(&[]), PageFormat::Plain);
}

#[test]
fn course_migrates_between_sqlite_collections() {
    let mut source = SqliteCollection::create(
        Connection::open_in_memory().expect("memory db"),
        "dev-languageApp-spanishCourse",
    )
    .expect("source table")
    .with_page_size(2);
    let acks = source
        .put_items(
            &[
                raw(json!({
                    "Identifier": {"S": "c1"},
                    "City": {"S": "Madrid"},
                    "Description": {"S": "hello"},
                    "Images": {"L": [{"M": {"URL": {"S": "u1"}}}]}
                })),
                raw(json!({"Identifier": {"S": "c2"}, "Description": {"S": "bye"}})),
                raw(json!({"Identifier": {"S": "c3"}})),
            ],
            PageFormat::Wire,
        )
        .expect("seed source");
    assert!(acks.iter().all(|ack| *ack == ItemAck::Written));

    let mut destination = SqliteCollection::create(
        Connection::open_in_memory().expect("memory db"),
        "juno-middleware-languageApp-ChatterBoxCourses",
    )
    .expect("destination table");
    let translator = UppercaseTranslator;

    let summary = MigrationJob::new(
        EntityKind::Course.rules(),
        &mut source,
        &mut destination,
        TranslationGateway::new(&translator),
        25,
    )
    .run()
    .expect("job completes");

    assert_eq!(summary.progress.pages, 2);
    assert_eq!(summary.load.written, 3);
    assert_eq!(summary.translation_calls, 2);
    assert_eq!(destination.count().expect("count"), 3);

    let page = destination.scan(None).expect("scan destination");
    assert_eq!(page.format, Some(PageFormat::Wire));
    let first = &page.items[0];
    assert_eq!(first.get("Identifier"), Some(&json!({"S": "c1"})));
    assert_eq!(first.get("Base_Lang_Description"), Some(&json!({"S": "HELLO"})));
    assert_eq!(first.get("Target_Lang_Description"), Some(&json!({"S": "hello"})));
    assert_eq!(first.get("Images"), Some(&json!({"S": "[{\"URL\":\"u1\"}]"})));
    assert_eq!(page.items[2].get("Base_Lang_Description"), Some(&json!({"S": ""})));
}
