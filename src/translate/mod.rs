pub mod backend;
pub mod chain;
pub mod deepl;
pub mod glossary;
pub mod google;
pub mod libre;
pub mod markup;
pub mod text;

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

use crate::cli::{BatchArgs, CsvArgs, LanguageArgs, XmlArgs};
use crate::config::{Config, Settings};
use crate::lang::LanguagePair;
use crate::pipeline::csv::{CsvPipeline, detect_delimiter};
use crate::pipeline::xml::XmlPipeline;
use crate::pipeline::{TranslationOutcome, default_output_path};
use backend::Backend;
use chain::BackendChain;
use deepl::DeepL;
use glossary::Glossary;
use google::GoogleTranslate;
use libre::{LibreTranslate, LibreTranslateConfig};
use text::TextTranslator;

pub const KNOWN_BACKENDS: [&str; 3] = ["google", "deepl", "libretranslate"];

/// Build one backend by its configured name. Unknown names are skipped.
pub fn create_backend(
    name: &str,
    config: &Config,
    languages: LanguagePair,
) -> Result<Option<Box<dyn Backend>>> {
    let services = &config.services;
    let timeout = Duration::from_secs(services.request_timeout_secs.max(1));

    let backend: Box<dyn Backend> = match name.trim().to_lowercase().as_str() {
        "google" => Box::new(GoogleTranslate::new(languages, timeout)?),
        "deepl" => Box::new(DeepL::new(config.deepl_api_key(), languages, timeout)?),
        "libretranslate" => {
            let self_hosted_url = services
                .libretranslate_selfhost_enabled
                .then(|| services.libretranslate_selfhost_url.clone());
            let libre_config = LibreTranslateConfig {
                url: services.libretranslate_url.clone(),
                api_key: config.libretranslate_api_key(),
                self_hosted_url,
                timeout,
            };
            Box::new(LibreTranslate::new(libre_config, languages)?)
        }
        other => {
            tracing::warn!("Unknown backend in service order: {}", other);
            return Ok(None);
        }
    };

    Ok(Some(backend))
}

pub fn build_chain(config: &Config, languages: LanguagePair, order: &[String]) -> Result<BackendChain> {
    let mut backends = Vec::with_capacity(order.len());
    for name in order {
        if let Some(backend) = create_backend(name, config, languages)? {
            backends.push(backend);
        }
    }

    let settings = config.settings();
    let chain = if config.services.libretranslate_selfhost_enabled {
        let timeout = Duration::from_secs(config.services.libretranslate_selfhost_timeout_secs);
        BackendChain::with_self_hosted_probe(backends, &settings, timeout)
    } else {
        BackendChain::new(backends, &settings)
    };

    if chain.is_empty() {
        anyhow::bail!(
            "No translation backend is available (order: {})",
            order.join(", ")
        );
    }

    tracing::info!("Backend order: {}", chain.names().join(" -> "));
    Ok(chain)
}

/// CLI path wins over the config entry; no glossary at all is fine.
pub fn load_glossary(explicit: Option<&Path>, config: &Config) -> Result<Glossary> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| config.translation.glossary.as_ref().map(PathBuf::from));

    match path {
        Some(path) => Glossary::load(&path)
            .with_context(|| format!("Failed to load glossary {}", path.display())),
        None => Ok(Glossary::new()),
    }
}

/// Everything one command run needs, built once and shared by every file.
pub struct Session {
    pub languages: LanguagePair,
    pub settings: Settings,
    pub translator: Arc<TextTranslator>,
}

impl Session {
    pub fn from_args(args: &LanguageArgs, config: &Config) -> Result<Self> {
        let source = args
            .source
            .as_deref()
            .unwrap_or(&config.translation.default_source);
        let target = args
            .target
            .as_deref()
            .unwrap_or(&config.translation.default_target);
        let languages = LanguagePair::parse(source, target)?;

        let order = args
            .services
            .clone()
            .unwrap_or_else(|| config.services.order.clone());

        let glossary = load_glossary(args.glossary.as_deref(), config)?;
        let chain = build_chain(config, languages, &order)?;

        Ok(Self {
            languages,
            settings: config.settings(),
            translator: Arc::new(TextTranslator::new(chain, glossary)),
        })
    }

    pub fn csv_pipeline(&self) -> CsvPipeline {
        CsvPipeline::new(self.translator.clone(), self.settings.clone())
    }

    pub fn xml_pipeline(&self) -> XmlPipeline {
        XmlPipeline::new(self.translator.clone(), self.settings.clone())
    }
}

/// `auto`, a name (`comma`, `semicolon`, `tab`) or a single ASCII character.
pub fn parse_delimiter(value: &str, input: &Path) -> Result<u8> {
    let delimiter = match value {
        "auto" => detect_delimiter(input),
        "comma" => b',',
        "semicolon" => b';',
        "tab" | "\\t" => b'\t',
        s if s.len() == 1 && s.is_ascii() => s.as_bytes()[0],
        other => anyhow::bail!("Invalid delimiter: {}", other),
    };
    Ok(delimiter)
}

pub fn run_csv(args: CsvArgs, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_with(config_path)?;
    let input = &args.input;
    if !input.is_file() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let session = Session::from_args(&args.languages, &config)?;
    let delimiter = parse_delimiter(&args.delimiter, input)?;
    let suffix = args
        .suffix
        .clone()
        .unwrap_or_else(|| session.languages.target.column_suffix());
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input, session.languages.target));

    println!(
        "{}",
        format!("[CSV] {} ({})", input.display(), session.languages).green()
    );
    println!(
        "  Columns: {}  Delimiter: {:?}  Suffix: {}",
        args.columns.join(", "),
        delimiter as char,
        suffix
    );

    let characters = session
        .csv_pipeline()
        .try_translate_table(input, &output, &args.columns, &suffix, delimiter)
        .with_context(|| format!("Failed to translate {}", input.display()))?;

    println!(
        "{}",
        format!(
            "[OK] Translated {} characters -> {}",
            characters,
            output.display()
        )
        .green()
    );

    Ok(())
}

pub fn run_xml(args: XmlArgs, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_with(config_path)?;
    let input = &args.input;
    if !input.is_file() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let session = Session::from_args(&args.languages, &config)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input, session.languages.target));

    println!(
        "{}",
        format!("[XML] {} ({})", input.display(), session.languages).green()
    );

    let characters = session
        .xml_pipeline()
        .try_translate_xml(input, &output)
        .with_context(|| format!("Failed to translate {}", input.display()))?;

    println!(
        "{}",
        format!(
            "[OK] Translated {} characters -> {}",
            characters,
            output.display()
        )
        .green()
    );

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Csv,
    Xml,
}

fn file_kind(path: &Path) -> Option<FileKind> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "csv" => Some(FileKind::Csv),
        "xml" => Some(FileKind::Xml),
        _ => None,
    }
}

/// Files written by an earlier run (`name - Danish.csv`) are not inputs.
fn is_previous_output(path: &Path, languages: LanguagePair) -> bool {
    let marker = format!(" - {}", languages.target.display_name());
    path.file_stem()
        .map(|stem| stem.to_string_lossy().ends_with(&marker))
        .unwrap_or(false)
}

pub fn run_batch(args: BatchArgs, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_with(config_path)?;
    let dir = &args.input;
    if !dir.is_dir() {
        anyhow::bail!("Input directory does not exist: {}", dir.display());
    }

    let session = Session::from_args(&args.languages, &config)?;

    let walker = if args.recursive {
        WalkDir::new(dir)
    } else {
        WalkDir::new(dir).max_depth(1)
    };

    let files: Vec<(PathBuf, FileKind)> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| file_kind(e.path()).map(|kind| (e.path().to_path_buf(), kind)))
        .filter(|(path, _)| !is_previous_output(path, session.languages))
        .collect();

    if files.is_empty() {
        println!("{}", "[WARN] No CSV or XML files found".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "[Batch] Found {} file(s) ({})",
            files.len(),
            session.languages
        )
        .green()
    );

    let suffix = args
        .suffix
        .clone()
        .unwrap_or_else(|| session.languages.target.column_suffix());
    let csv_pipeline = session.csv_pipeline();
    let xml_pipeline = session.xml_pipeline();

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut succeeded = 0;
    let mut characters = 0;

    for (path, kind) in &files {
        pb.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );

        let default_output = default_output_path(path, session.languages.target);
        let output = match &args.output {
            Some(base) => {
                let rel = default_output.strip_prefix(dir).unwrap_or(&default_output);
                base.join(rel)
            }
            None => default_output,
        };

        let outcome = match kind {
            FileKind::Csv if args.columns.is_empty() => {
                pb.suspend(|| {
                    println!(
                        "{}",
                        format!("[SKIP] {} (no --columns given)", path.display()).yellow()
                    );
                });
                pb.inc(1);
                continue;
            }
            FileKind::Csv => {
                let delimiter = parse_delimiter(&args.delimiter, path)?;
                csv_pipeline.translate_table(path, &output, &args.columns, &suffix, delimiter)
            }
            FileKind::Xml => xml_pipeline.translate_xml(path, &output),
        };

        report(&pb, path, &output, outcome);
        if outcome.success {
            succeeded += 1;
            characters += outcome.characters_translated;
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    let summary = format!(
        "[OK] {}/{} file(s) translated, {} characters",
        succeeded,
        files.len(),
        characters
    );
    if succeeded == files.len() {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.yellow());
    }

    Ok(())
}

fn report(pb: &ProgressBar, input: &Path, output: &Path, outcome: TranslationOutcome) {
    pb.suspend(|| {
        if outcome.success {
            println!("  {} -> {}", input.display(), output.display());
        } else {
            eprintln!(
                "{}",
                format!("[ERROR] Failed to translate {}", input.display()).red()
            );
        }
    });
}
