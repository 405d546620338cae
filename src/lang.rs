//! Supported languages and language pairs

use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageCode {
    Danish,
    Dutch,
    Flemish,
    English,
    French,
    German,
    Italian,
    Norwegian,
    Spanish,
    Swedish,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 10] = [
        Self::Danish,
        Self::Dutch,
        Self::Flemish,
        Self::English,
        Self::French,
        Self::German,
        Self::Italian,
        Self::Norwegian,
        Self::Spanish,
        Self::Swedish,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Danish => "da",
            Self::Dutch => "nl",
            Self::Flemish => "nl-be",
            Self::English => "en",
            Self::French => "fr",
            Self::German => "de",
            Self::Italian => "it",
            Self::Norwegian => "no",
            Self::Spanish => "es",
            Self::Swedish => "sv",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Danish => "Danish",
            Self::Dutch => "Dutch (Netherlands)",
            Self::Flemish => "Dutch (Flemish)",
            Self::English => "English",
            Self::French => "French",
            Self::German => "German",
            Self::Italian => "Italian",
            Self::Norwegian => "Norwegian (Bokmål)",
            Self::Spanish => "Spanish",
            Self::Swedish => "Swedish",
        }
    }

    /// Default suffix for translated CSV columns, e.g. `_[NL-BE]`.
    pub fn column_suffix(&self) -> String {
        format!("_[{}]", self.code().to_uppercase())
    }

    /// Whether a URL path segment names a locale (`/en/...`, `/nb/...`).
    pub fn is_path_segment(segment: &str) -> bool {
        let lower = segment.to_lowercase();
        lower == "nb" || Self::ALL.iter().any(|c| c.code() == lower)
    }
}

impl FromStr for LanguageCode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.code() == lower)
            .ok_or_else(|| PipelineError::UnsupportedLanguage(s.to_string()))
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: LanguageCode,
    pub target: LanguageCode,
}

impl LanguagePair {
    pub fn new(source: LanguageCode, target: LanguageCode) -> Self {
        if source == target {
            tracing::warn!("Source and target language are both {}", source);
        }
        Self { source, target }
    }

    pub fn parse(source: &str, target: &str) -> Result<Self, PipelineError> {
        Ok(Self::new(source.parse()?, target.parse()?))
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.source.display_name(),
            self.target.display_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!("da".parse::<LanguageCode>().unwrap(), LanguageCode::Danish);
        assert_eq!("NL-BE".parse::<LanguageCode>().unwrap(), LanguageCode::Flemish);
        assert_eq!("nl_be".parse::<LanguageCode>().unwrap(), LanguageCode::Flemish);
        assert!("ja".parse::<LanguageCode>().is_err());
    }

    #[test]
    fn test_pair_rejects_unsupported() {
        assert!(LanguagePair::parse("en", "da").is_ok());
        let err = LanguagePair::parse("en", "xx").unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedLanguage(code) if code == "xx"));
    }

    #[test]
    fn test_column_suffix() {
        assert_eq!(LanguageCode::Flemish.column_suffix(), "_[NL-BE]");
        assert_eq!(LanguageCode::Swedish.column_suffix(), "_[SV]");
    }

    #[test]
    fn test_path_segment() {
        assert!(LanguageCode::is_path_segment("EN"));
        assert!(LanguageCode::is_path_segment("nb"));
        assert!(!LanguageCode::is_path_segment("products"));
    }
}
