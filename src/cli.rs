use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::entities::EntityKind;
use crate::pipeline::MAX_BATCH_WINDOW;

#[derive(Parser, Debug)]
#[command(
    name = "tablemig",
    version,
    about = "Language-app table migrations between key/value collections"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Migrate every record of one entity into its destination collection.
    Migrate(MigrateArgs),
    /// Load a JSON-lines table export into a store collection.
    Import(ImportArgs),
    /// List the entity jobs and their default collections.
    Jobs(JobsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    #[arg(long, value_enum)]
    pub entity: EntityKind,

    #[arg(long, default_value = ".cache/tablemig/store.sqlite")]
    pub db_path: PathBuf,

    /// Defaults to the entity's legacy table.
    #[arg(long)]
    pub source_collection: Option<String>,

    /// Defaults to the entity's new table.
    #[arg(long)]
    pub destination_collection: Option<String>,

    #[arg(long, default_value_t = false)]
    pub create_destination: bool,

    #[arg(long, default_value_t = 100)]
    pub page_size: usize,

    #[arg(long, default_value_t = MAX_BATCH_WINDOW)]
    pub batch_window: usize,

    #[arg(long, value_enum, default_value_t = TranslatorBackend::Off)]
    pub translator: TranslatorBackend,

    #[arg(long, env = "TABLEMIG_TRANSLATE_URL", default_value = "http://127.0.0.1:5000")]
    pub translate_url: String,

    #[arg(long, env = "TABLEMIG_TRANSLATE_API_KEY", hide_env_values = true)]
    pub translate_api_key: Option<String>,

    #[arg(long, default_value_t = 30)]
    pub translate_timeout_secs: u64,

    #[arg(long, default_value = ".cache/tablemig/manifests")]
    pub manifest_dir: PathBuf,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum TranslatorBackend {
    Off,
    Libre,
}

impl TranslatorBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Libre => "libre",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[arg(long, default_value = ".cache/tablemig/store.sqlite")]
    pub db_path: PathBuf,

    #[arg(long)]
    pub collection: String,

    /// JSON lines, one `{"Item": {...}}` object or bare item per line.
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long = "key-attribute", default_value = "Identifier")]
    pub key_attributes: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct JobsArgs {
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
