use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::cli::JobsArgs;
use crate::entities::{EntityKind, NumericPolicy};
use crate::model::JobListing;

pub fn run(args: JobsArgs) -> Result<()> {
    let listings = EntityKind::ALL.into_iter().map(listing).collect::<Vec<_>>();

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &listings)
            .context("failed to serialize job listing")?;
        writeln!(output)?;
    } else {
        for job in &listings {
            let languages = match (&job.base_language, &job.target_language) {
                (Some(base), Some(target)) => format!("{base}->{target}"),
                _ => "-".to_string(),
            };
            writeln!(
                output,
                "{:<13} {} -> {} key={} languages={}{}",
                job.entity,
                job.source_collection,
                job.destination_collection,
                job.key_attributes.join("+"),
                languages,
                if job.numbers_as_text { " numbers=text" } else { "" },
            )?;
        }
    }
    output.flush()?;
    Ok(())
}

fn listing(kind: EntityKind) -> JobListing {
    let rules = kind.rules();
    JobListing {
        entity: kind.as_str().to_string(),
        source_collection: rules.source_collection.to_string(),
        destination_collection: rules.destination_collection.to_string(),
        key_attributes: rules.key_attributes.iter().map(|key| key.to_string()).collect(),
        base_language: rules.languages.map(|pair| pair.base.code().to_string()),
        target_language: rules.languages.map(|pair| pair.target.code().to_string()),
        numbers_as_text: rules.numbers == NumericPolicy::AsText,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_reports_collections_keys_and_languages() {
        let metric = listing(EntityKind::Metric);
        assert_eq!(metric.source_collection, "dev-languageApp-userActions");
        assert_eq!(metric.destination_collection, "userActions");
        assert_eq!(metric.key_attributes, vec!["user_id", "timestamp"]);
        assert_eq!(metric.base_language, None);

        let course = listing(EntityKind::Course);
        assert_eq!(course.base_language.as_deref(), Some("en"));
        assert_eq!(course.target_language.as_deref(), Some("es"));

        assert!(listing(EntityKind::User).numbers_as_text);
    }
}
