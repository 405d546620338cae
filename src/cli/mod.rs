use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "structrans")]
#[command(author, version, about = "Structure-preserving translator for CSV columns and XML documents", long_about = None)]
pub struct Cli {
    /// Config file to use instead of the one in the user config directory
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate columns of a CSV file into new suffixed columns
    Csv(CsvArgs),

    /// Translate the text content of an XML document
    Xml(XmlArgs),

    /// Translate every CSV and XML file in a directory
    Batch(BatchArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct LanguageArgs {
    /// Source language code (da, nl, nl-be, en, fr, de, it, no, es, sv)
    #[arg(short, long)]
    pub source: Option<String>,

    /// Target language code
    #[arg(short, long)]
    pub target: Option<String>,

    /// Glossary file (header source;target;keep_case or original;translation)
    #[arg(short, long)]
    pub glossary: Option<PathBuf>,

    /// Backend order, overriding the config (e.g. libretranslate,google)
    #[arg(long, value_delimiter = ',')]
    pub services: Option<Vec<String>>,
}

#[derive(Parser, Debug)]
pub struct CsvArgs {
    /// Input CSV file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Columns to translate (comma separated)
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub columns: Vec<String>,

    /// Field delimiter: auto, comma or semicolon
    #[arg(short, long, default_value = "auto")]
    pub delimiter: String,

    /// Suffix for translated columns (defaults to _[TARGET])
    #[arg(long)]
    pub suffix: Option<String>,

    /// Output file (defaults to "<name> - <Language>.csv" next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub languages: LanguageArgs,
}

#[derive(Parser, Debug)]
pub struct XmlArgs {
    /// Input XML file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file (defaults to "<name> - <Language>.xml" next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub languages: LanguageArgs,
}

#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// Directory containing CSV and XML files
    #[arg(required = true)]
    pub input: PathBuf,

    /// Process subdirectories recursively
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Columns to translate in CSV files; CSV files are skipped when empty
    #[arg(short, long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Field delimiter for CSV files: auto, comma or semicolon
    #[arg(short, long, default_value = "auto")]
    pub delimiter: String,

    /// Suffix for translated columns (defaults to _[TARGET])
    #[arg(long)]
    pub suffix: Option<String>,

    /// Output directory (defaults to next to each input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub languages: LanguageArgs,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., translation.delay_ms)
        key: String,
        /// Value to set
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show config file path
    Path,

    /// Edit config file with default editor
    Edit,
}
