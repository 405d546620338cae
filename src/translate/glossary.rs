//! Glossary support for consistent term translation

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct GlossaryEntry {
    /// Term as written in the glossary file
    pub source_term: String,
    /// Lowercased `source_term`, the lookup key
    pub match_key: String,
    pub target_term: String,
    pub keep_case: bool,
    pattern: Regex,
}

impl GlossaryEntry {
    fn new(source: &str, target: &str, keep_case: bool) -> Option<Self> {
        let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(source))).ok()?;
        Some(Self {
            source_term: source.to_string(),
            match_key: source.to_lowercase(),
            target_term: target.to_string(),
            keep_case,
            pattern,
        })
    }

    fn replacement(&self, matched: &str) -> String {
        if self.keep_case {
            self.target_term.clone()
        } else {
            preserve_case(matched, &self.target_term)
        }
    }
}

/// Column positions named by the header line.
#[derive(Debug, Clone, Copy)]
struct Layout {
    width: usize,
    source: usize,
    target: usize,
    keep_case: Option<usize>,
}

impl Layout {
    /// `source;target[;keep_case]`, or the older `original;translation` where
    /// every term mirrors case.
    fn from_header(header: &str) -> Option<Self> {
        let names: Vec<String> = header
            .trim_start_matches('\u{feff}')
            .split(';')
            .map(|name| name.trim().to_lowercase())
            .collect();
        let position = |name: &str| names.iter().position(|n| n == name);

        if let (Some(source), Some(target)) = (position("source"), position("target")) {
            return Some(Self {
                width: names.len(),
                source,
                target,
                keep_case: position("keep_case"),
            });
        }
        if let (Some(source), Some(target)) = (position("original"), position("translation")) {
            return Some(Self {
                width: names.len(),
                source,
                target,
                keep_case: None,
            });
        }
        None
    }

    fn parse_line<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str, bool)> {
        let parts: Vec<&str> = line.split(';').map(str::trim).collect();
        if parts.len() != self.width {
            return None;
        }

        let (source, target) = (parts[self.source], parts[self.target]);
        if source.is_empty() || target.is_empty() {
            return None;
        }
        let keep_case = self
            .keep_case
            .is_some_and(|idx| parts[idx].eq_ignore_ascii_case("true"));
        Some((source, target, keep_case))
    }
}

/// Ordered term table. Entries keep the position of the first line that
/// introduced their key; later lines for the same key overwrite the value.
#[derive(Debug, Clone, Default)]
pub struct Glossary {
    entries: Vec<GlossaryEntry>,
    index: HashMap<String, usize>,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context("Failed to read glossary file")?;
        let glossary = Self::parse(&content);

        if glossary.is_empty() {
            tracing::info!("Glossary {} contains no valid entries", path.display());
        } else {
            tracing::info!("Loaded {} terms from {}", glossary.len(), path.display());
        }

        Ok(glossary)
    }

    /// Parse semicolon separated lines. The first line that is not blank or a
    /// `#` comment is the header and decides which columns are read.
    pub fn parse(content: &str) -> Self {
        let mut glossary = Self::new();
        let mut layout: Option<Layout> = None;

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some(columns) = layout else {
                match Layout::from_header(line) {
                    Some(found) => layout = Some(found),
                    None => {
                        tracing::warn!(
                            "Glossary header must name source;target[;keep_case] or original;translation: {}",
                            line
                        );
                        return glossary;
                    }
                }
                continue;
            };

            match columns.parse_line(line) {
                Some((source, target, keep_case)) => glossary.add(source, target, keep_case),
                None => {
                    tracing::warn!(
                        "Glossary line {} has wrong format (expected {} fields): {}",
                        line_num + 1,
                        columns.width,
                        line
                    );
                }
            }
        }

        glossary
    }

    pub fn add(&mut self, source: &str, target: &str, keep_case: bool) {
        let Some(entry) = GlossaryEntry::new(source, target, keep_case) else {
            tracing::warn!("Could not build a pattern for glossary term: {}", source);
            return;
        };

        match self.index.get(&entry.match_key) {
            Some(&idx) => self.entries[idx] = entry,
            None => {
                self.index.insert(entry.match_key.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<&GlossaryEntry> {
        self.index
            .get(&term.to_lowercase())
            .map(|&idx| &self.entries[idx])
    }

    pub fn entries(&self) -> impl Iterator<Item = &GlossaryEntry> {
        self.entries.iter()
    }

    /// Replace every whole-word, case-insensitive occurrence of each term.
    pub fn apply(&self, text: &str) -> String {
        if self.entries.is_empty() || text.trim().is_empty() {
            return text.to_string();
        }

        let mut result = text.to_string();
        for entry in &self.entries {
            let replaced = entry
                .pattern
                .replace_all(&result, |caps: &Captures| entry.replacement(&caps[0]));
            result = replaced.into_owned();
        }
        result
    }
}

/// Carry the case pattern of `original` over to `replacement`.
pub fn preserve_case(original: &str, replacement: &str) -> String {
    if is_upper(original) {
        replacement.to_uppercase()
    } else if is_lower(original) {
        replacement.to_lowercase()
    } else if is_title(original) {
        capitalize(replacement)
    } else {
        replacement.to_string()
    }
}

fn is_upper(s: &str) -> bool {
    let mut cased = false;
    for c in s.chars() {
        if c.is_lowercase() {
            return false;
        }
        cased |= c.is_uppercase();
    }
    cased
}

fn is_lower(s: &str) -> bool {
    let mut cased = false;
    for c in s.chars() {
        if c.is_uppercase() {
            return false;
        }
        cased |= c.is_lowercase();
    }
    cased
}

// Every word starts with an uppercase letter followed only by lowercase ones.
fn is_title(s: &str) -> bool {
    let mut cased = false;
    let mut prev_cased = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if prev_cased {
                return false;
            }
            prev_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !prev_cased {
                return false;
            }
            prev_cased = true;
            cased = true;
        } else {
            prev_cased = false;
        }
    }
    cased
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glossary(content: &str) -> Glossary {
        Glossary::parse(&format!("source;target;keep_case\n{}", content))
    }

    #[test]
    fn test_empty_glossary_is_noop() {
        let g = Glossary::new();
        for text in ["", "   ", "Hello kit", "AJAX and <b>html</b>"] {
            assert_eq!(g.apply(text), text);
        }
    }

    #[test]
    fn test_case_preservation() {
        let g = glossary("ajax;api;false");
        assert_eq!(g.apply("AJAX"), "API");
        assert_eq!(g.apply("Ajax"), "Api");
        assert_eq!(g.apply("ajax"), "api");
        assert_eq!(g.apply("aJaX"), "api");
    }

    #[test]
    fn test_keep_case() {
        let g = glossary("kit;KIT;true");
        assert_eq!(g.apply("kit"), "KIT");
        assert_eq!(g.apply("Kit"), "KIT");
        assert_eq!(g.apply("KIT"), "KIT");
        assert_eq!(g.apply("This is a kit for you"), "This is a KIT for you");
    }

    #[test]
    fn test_whole_words_only() {
        let g = glossary("kit;KIT;true");
        assert_eq!(g.apply("kitchen toolkit"), "kitchen toolkit");
        assert_eq!(g.apply("kit, kit."), "KIT, KIT.");
    }

    #[test]
    fn test_parse_skips_header_comments_and_malformed() {
        let g = Glossary::parse(
            "source;target;keep_case\n# comment\n\nmicare;Micare;true\nbroken line\na;b;c;d\n;x;true\n",
        );
        assert_eq!(g.len(), 1);
        let entry = g.get("MICARE").unwrap();
        assert_eq!(entry.target_term, "Micare");
        assert!(entry.keep_case);
    }

    #[test]
    fn test_original_translation_header() {
        let g = Glossary::parse("original;translation\nAjax;Api\n# old list\nmicare;Micare\nbad;line;here\n");
        assert_eq!(g.len(), 2);
        assert!(!g.get("ajax").unwrap().keep_case);
        assert_eq!(g.apply("AJAX and ajax"), "API and api");
        assert_eq!(g.apply("use micare"), "use micare");
    }

    #[test]
    fn test_header_names_pick_columns() {
        let g = Glossary::parse("keep_case;target;source\ntrue;KIT;kit\n");
        assert_eq!(g.apply("a kit"), "a KIT");

        let g = Glossary::parse("source;target\nkit;set\n");
        assert!(!g.get("kit").unwrap().keep_case);
        assert_eq!(g.apply("Kit"), "Set");
    }

    #[test]
    fn test_unknown_header_loads_nothing() {
        let g = Glossary::parse("from;to\nkit;KIT\n");
        assert!(g.is_empty());
    }

    #[test]
    fn test_later_lines_overwrite_in_place() {
        let g = glossary("foo;one;false\nbar;two;false\nFOO;three;TRUE\n");
        assert_eq!(g.len(), 2);
        let keys: Vec<_> = g.entries().map(|e| e.match_key.as_str()).collect();
        assert_eq!(keys, vec!["foo", "bar"]);
        let foo = g.get("foo").unwrap();
        assert_eq!(foo.target_term, "three");
        assert_eq!(foo.source_term, "FOO");
        assert!(foo.keep_case);
    }

    #[test]
    fn test_terms_with_regex_metacharacters() {
        let g = glossary("v1.0;v2.0;true");
        assert_eq!(g.apply("release v1.0 now"), "release v2.0 now");
        assert_eq!(g.apply("release v1x0 now"), "release v1x0 now");
    }

    #[test]
    fn test_preserve_case_title_words() {
        assert_eq!(preserve_case("Surface Care", "overflade pleje"), "Overflade pleje");
        assert_eq!(preserve_case("x", "y"), "y");
    }
}
