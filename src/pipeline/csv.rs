//! CSV column pipeline
//!
//! Every cell is read and written as its literal string, so codes such as
//! `0042` or `7131526` and empty cells come back exactly as they went in.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::config::Settings;
use crate::error::PipelineError;
use crate::translate::text::{TextTranslator, is_translatable};

use super::TranslationOutcome;

pub struct CsvPipeline {
    translator: Arc<TextTranslator>,
    settings: Settings,
}

impl CsvPipeline {
    pub fn new(translator: Arc<TextTranslator>, settings: Settings) -> Self {
        Self {
            translator,
            settings,
        }
    }

    /// Translate `columns` of `input` into new `{column}{suffix}` columns
    /// written to `output`.
    pub fn translate_table(
        &self,
        input: &Path,
        output: &Path,
        columns: &[String],
        suffix: &str,
        delimiter: u8,
    ) -> TranslationOutcome {
        TranslationOutcome::from_result(
            input,
            self.try_translate_table(input, output, columns, suffix, delimiter),
        )
    }

    /// Returns the number of source characters translated. Nothing is
    /// written when a requested column is missing.
    pub fn try_translate_table(
        &self,
        input: &Path,
        output: &Path,
        columns: &[String],
        suffix: &str,
        delimiter: u8,
    ) -> Result<usize, PipelineError> {
        let mut reader = ::csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(input)?;

        let headers = reader.headers()?.clone();
        let column_indices = resolve_columns(&headers, columns)?;

        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()?;

        // Extra fields would push the appended columns out of line with the header.
        if let Some((row, record)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() > headers.len())
        {
            return Err(PipelineError::Parse {
                kind: "CSV",
                message: format!(
                    "row {} has {} fields, header has {}",
                    row + 2,
                    record.len(),
                    headers.len()
                ),
            });
        }

        tracing::info!(
            "Translating {} column(s) across {} rows of {}",
            columns.len(),
            records.len(),
            input.display()
        );

        let mut translated_columns = Vec::with_capacity(columns.len());
        let mut characters = 0;
        for (name, &idx) in columns.iter().zip(&column_indices) {
            let cells: Vec<&str> = records.iter().map(|r| r.get(idx).unwrap_or("")).collect();
            let (values, chars) = self.translate_column(name, &cells);
            translated_columns.push(values);
            characters += chars;
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = ::csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(output)?;

        let mut header_row: Vec<String> = headers.iter().map(str::to_string).collect();
        header_row.extend(columns.iter().map(|c| format!("{}{}", c, suffix)));
        writer.write_record(&header_row)?;

        for (row_idx, record) in records.iter().enumerate() {
            let mut row: Vec<&str> = record.iter().collect();
            // Short rows are padded so appended columns line up with the header.
            while row.len() < headers.len() {
                row.push("");
            }
            row.extend(translated_columns.iter().map(|col| col[row_idx].as_str()));
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(characters)
    }

    fn translate_column(&self, column: &str, cells: &[&str]) -> (Vec<String>, usize) {
        let total = cells.len();
        let interval = self.settings.progress_interval.max(1);
        let done = AtomicUsize::new(0);

        let translate_cell = |cell: &&str| -> (String, usize) {
            let result = match self.translator.try_translate_text(cell) {
                Ok(translated) => {
                    let chars = if is_translatable(cell) {
                        cell.chars().count()
                    } else {
                        0
                    };
                    (translated, chars)
                }
                Err(e) => {
                    tracing::warn!("Keeping original cell in column {}: {}", column, e);
                    (cell.to_string(), 0)
                }
            };

            let count = done.fetch_add(1, Ordering::Relaxed) + 1;
            if count % interval == 0 || count == total {
                tracing::info!("{}: {}/{} rows", column, count, total);
            }
            result
        };

        let results: Vec<(String, usize)> = if total > self.settings.multithreading_threshold {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.settings.csv_max_workers)
                .build()
            {
                Ok(pool) => pool.install(|| cells.par_iter().map(translate_cell).collect()),
                Err(e) => {
                    tracing::warn!("Could not start worker pool ({}), translating sequentially", e);
                    cells.iter().map(translate_cell).collect()
                }
            }
        } else {
            cells.iter().map(translate_cell).collect()
        };

        let characters = results.iter().map(|(_, chars)| chars).sum();
        (results.into_iter().map(|(text, _)| text).collect(), characters)
    }
}

fn resolve_columns(
    headers: &::csv::StringRecord,
    columns: &[String],
) -> Result<Vec<usize>, PipelineError> {
    let mut indices = Vec::with_capacity(columns.len());
    let mut missing = Vec::new();

    for column in columns {
        match headers.iter().position(|h| h == column) {
            Some(idx) => indices.push(idx),
            None => missing.push(column.clone()),
        }
    }

    if missing.is_empty() {
        Ok(indices)
    } else {
        Err(PipelineError::MissingColumns(missing))
    }
}

/// Pick `,` or `;` by counting both in the first five lines; comma wins ties
/// and unreadable files.
pub fn detect_delimiter(path: &Path) -> u8 {
    let Ok(content) = fs::read_to_string(path) else {
        return b',';
    };

    let sample: Vec<&str> = content.lines().take(5).collect();
    let commas: usize = sample.iter().map(|l| l.matches(',').count()).sum();
    let semicolons: usize = sample.iter().map(|l| l.matches(';').count()).sum();

    if semicolons > commas { b';' } else { b',' }
}
