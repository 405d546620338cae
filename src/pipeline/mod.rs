//! File-level pipelines (CSV columns, XML documents)

pub mod csv;
pub mod xml;

use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::lang::LanguageCode;

/// What every pipeline run reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TranslationOutcome {
    pub success: bool,
    /// Characters of source text that went through translation
    pub characters_translated: usize,
}

impl TranslationOutcome {
    pub fn succeeded(characters_translated: usize) -> Self {
        Self {
            success: true,
            characters_translated,
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }

    pub(crate) fn from_result(input: &Path, result: Result<usize, PipelineError>) -> Self {
        match result {
            Ok(chars) => {
                tracing::info!(
                    "Translated {} ({} characters)",
                    input.display(),
                    chars
                );
                Self::succeeded(chars)
            }
            Err(e) => {
                tracing::error!("Failed to translate {}: {}", input.display(), e);
                Self::failed()
            }
        }
    }
}

/// `docs/products.csv` -> `docs/products - Danish.csv`
pub fn default_output_path(input: &Path, target: LanguageCode) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    let file_name = match input.extension() {
        Some(ext) => format!("{} - {}.{}", stem, target.display_name(), ext.to_string_lossy()),
        None => format!("{} - {}", stem, target.display_name()),
    };

    input.with_file_name(file_name)
}
