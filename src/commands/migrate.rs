use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::{MigrateArgs, TranslatorBackend};
use crate::model::{MigrationCollections, MigrationCounts, MigrationPaths, MigrationRunManifest};
use crate::pipeline::{JobSummary, MAX_BATCH_WINDOW, MigrationJob};
use crate::store::{SqliteCollection, open_store, validate_collection_name};
use crate::translate::{
    LibreTranslateClient, PassthroughTranslator, TranslationGateway, Translator,
};
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

pub fn run(args: MigrateArgs) -> Result<()> {
    let rules = args.entity.rules();
    let source_name = args
        .source_collection
        .clone()
        .unwrap_or_else(|| rules.source_collection.to_string());
    let destination_name = args
        .destination_collection
        .clone()
        .unwrap_or_else(|| rules.destination_collection.to_string());

    validate_collection_name(&source_name).context("invalid source collection")?;
    validate_collection_name(&destination_name).context("invalid destination collection")?;
    if args.page_size == 0 {
        bail!("--page-size must be at least 1");
    }
    if args.batch_window == 0 || args.batch_window > MAX_BATCH_WINDOW {
        warn!(
            requested = args.batch_window,
            limit = MAX_BATCH_WINDOW,
            "batch window outside the destination limit, clamping"
        );
    }

    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("migrate-{}-{}", args.entity.as_str(), utc_compact_string(started_ts));
    ensure_directory(&args.manifest_dir)?;
    let manifest_path = args.manifest_dir.join(format!(
        "migration_{}_{}.json",
        args.entity.as_str(),
        utc_compact_string(started_ts)
    ));

    info!(
        run_id = %run_id,
        entity = args.entity.as_str(),
        source = %source_name,
        destination = %destination_name,
        translator = args.translator.as_str(),
        "starting migration"
    );

    let mut source = SqliteCollection::open(open_source_store(&args.db_path)?, &source_name)
        .context("failed to attach source collection")?
        .with_key_attributes(rules.key_attributes)
        .with_page_size(args.page_size);

    let destination_connection = open_store(&args.db_path, false)
        .with_context(|| format!("failed to open store {}", args.db_path.display()))?;
    let destination = if args.create_destination {
        SqliteCollection::create(destination_connection, &destination_name)
    } else {
        SqliteCollection::open(destination_connection, &destination_name)
    };
    let mut destination = destination
        .context("failed to attach destination collection")?
        .with_key_attributes(rules.key_attributes);

    let mut notes = Vec::new();
    if !rules.translates() && args.translator != TranslatorBackend::Off {
        notes.push(format!(
            "{} records carry no translated fields; translator unused",
            args.entity.as_str()
        ));
    }

    let passthrough = PassthroughTranslator;
    let libre;
    let translator: &dyn Translator = match args.translator {
        TranslatorBackend::Off => &passthrough,
        TranslatorBackend::Libre => {
            libre = LibreTranslateClient::new(
                &args.translate_url,
                args.translate_api_key.clone(),
                Duration::from_secs(args.translate_timeout_secs),
            )
            .context("failed to build translation client")?;
            info!(endpoint = %libre.endpoint(), "using LibreTranslate backend");
            &libre
        }
    };

    let mut job = MigrationJob::new(
        rules,
        &mut source,
        &mut destination,
        TranslationGateway::new(translator),
        args.batch_window,
    );
    let outcome = job.run();

    let mut manifest = MigrationRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        entity: args.entity.as_str().to_string(),
        status: job.state().as_str().to_string(),
        started_at,
        updated_at: now_utc_string(),
        failed_state: None,
        failure_reason: None,
        translator: args.translator.as_str().to_string(),
        batch_window: args.batch_window.clamp(1, MAX_BATCH_WINDOW),
        collections: MigrationCollections {
            source: source_name,
            destination: destination_name,
        },
        paths: MigrationPaths {
            db_path: args.db_path.display().to_string(),
            manifest_path: manifest_path.display().to_string(),
        },
        counts: MigrationCounts::default(),
        item_failures: Vec::new(),
        notes,
    };

    match &outcome {
        Ok(summary) => {
            manifest.counts = completed_counts(summary);
            manifest.item_failures = summary.load.failures.clone();
        }
        Err(err) => {
            let progress = job.progress();
            let load = job.load_report();
            manifest.failure_reason = Some(err.to_string());
            manifest.failed_state = job.failed_in().map(|state| state.as_str().to_string());
            manifest.counts = MigrationCounts {
                pages: progress.pages,
                wire_pages: progress.wire_pages,
                plain_pages: progress.plain_pages,
                records_scanned: progress.records_scanned,
                records_queued: progress.records_queued,
                items_submitted: load.submitted,
                items_written: load.written,
                items_failed: load.failures.len(),
                batch_windows: load.windows,
                replaced_in_window: load.replaced_in_window,
                translation_calls: job.gateway().calls(),
                translation_failures: job.gateway().failures(),
            };
            manifest.item_failures = load.failures.clone();
        }
    }
    drop(job);

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote migration manifest");

    let summary = outcome
        .with_context(|| format!("{} migration failed", args.entity.as_str()))?;
    if !summary.load.failures.is_empty() {
        warn!(
            failed = summary.load.failures.len(),
            keys = %failed_keys(&summary),
            "some records were not written"
        );
    }
    info!(
        run_id = %run_id,
        written = summary.load.written,
        failed = summary.load.failures.len(),
        "migration finished"
    );

    Ok(())
}

fn open_source_store(path: &Path) -> Result<rusqlite::Connection> {
    if !path.exists() {
        bail!("store database does not exist: {}", path.display());
    }
    open_store(path, false).with_context(|| format!("failed to open store {}", path.display()))
}

fn completed_counts(summary: &JobSummary) -> MigrationCounts {
    MigrationCounts {
        pages: summary.progress.pages,
        wire_pages: summary.progress.wire_pages,
        plain_pages: summary.progress.plain_pages,
        records_scanned: summary.progress.records_scanned,
        records_queued: summary.progress.records_queued,
        items_submitted: summary.load.submitted,
        items_written: summary.load.written,
        items_failed: summary.load.failures.len(),
        batch_windows: summary.load.windows,
        replaced_in_window: summary.load.replaced_in_window,
        translation_calls: summary.translation_calls,
        translation_failures: summary.translation_failures,
    }
}

fn failed_keys(summary: &JobSummary) -> String {
    summary
        .load
        .failures
        .iter()
        .map(|failure| failure.key.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
