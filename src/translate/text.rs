//! Plain-text translation unit

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PipelineError;
use crate::lang::LanguageCode;

use super::chain::BackendChain;
use super::glossary::Glossary;
use super::markup::{self, split_padding};

static NUMERIC_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\s\-.,()]+$").expect("valid regex"));

/// Glossary and backend chain bundled behind one `translate_text` call.
///
/// Read-only after construction, so a single instance is shared by every
/// worker of a pipeline.
pub struct TextTranslator {
    chain: BackendChain,
    glossary: Glossary,
}

impl TextTranslator {
    pub fn new(chain: BackendChain, glossary: Glossary) -> Self {
        Self { chain, glossary }
    }

    pub fn chain(&self) -> &BackendChain {
        &self.chain
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    /// Translate `text`, returning it unchanged when nothing could be done.
    pub fn translate_text(&self, text: &str) -> String {
        match self.try_translate_text(text) {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!("Keeping original text after markup failure: {}", e);
                text.to_string()
            }
        }
    }

    /// Like [`TextTranslator::translate_text`], but reports markup failures so
    /// callers can account for the item as untranslated.
    pub fn try_translate_text(&self, text: &str) -> Result<String, PipelineError> {
        if !is_translatable(text) {
            return Ok(text.to_string());
        }

        let (lead, core, trail) = split_padding(text);
        let translated = if markup::is_html(core) {
            // Glossary runs per leaf so terms never touch tag names or attributes.
            markup::translate_markup(core, |leaf| self.translate_leaf(leaf))?
        } else {
            self.translate_plain(core)
        };

        Ok(format!("{}{}{}", lead, translated, trail))
    }

    /// Translate a localized path such as `/da/produkter/pleje`, keeping the
    /// language prefix. `None` when `text` is not a localized path.
    pub fn translate_localized_path(&self, text: &str) -> Option<String> {
        let (prefix, rest) = split_localized_path(text)?;
        if !is_translatable(rest) {
            return Some(text.to_string());
        }
        Some(format!("{}{}", prefix, self.translate_plain(rest)))
    }

    fn translate_leaf(&self, leaf: &str) -> String {
        if is_numeric_like(leaf) {
            return leaf.to_string();
        }
        self.translate_plain(leaf)
    }

    fn translate_plain(&self, text: &str) -> String {
        let prepared = self.glossary.apply(text);
        let translated = self.chain.translate_with_fallback(&prepared);
        self.glossary.apply(&translated)
    }
}

/// Whether `text` is worth a backend round-trip at all.
pub fn is_translatable(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.chars().count() > 1 && !is_numeric_like(trimmed)
}

/// Codes, prices, phone numbers and the like.
pub fn is_numeric_like(text: &str) -> bool {
    NUMERIC_LIKE.is_match(text)
}

/// Split `/xx/rest` into `("/xx/", "rest")` when `xx` is a known language code.
pub fn split_localized_path(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix('/')?;
    let (segment, _) = rest.split_once('/')?;
    if !LanguageCode::is_path_segment(segment) {
        return None;
    }
    let prefix_len = segment.len() + 2;
    Some((&text[..prefix_len], &text[prefix_len..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::translate::backend::Backend;
    use crate::translate::backend::testing::{AlwaysFails, Identity, Tagged, Uppercase};
    use std::sync::Arc;

    fn translator(backend: Box<dyn Backend>, glossary: Glossary) -> TextTranslator {
        TextTranslator::new(
            BackendChain::new(vec![backend], &Settings::immediate()),
            glossary,
        )
    }

    fn kit_glossary() -> Glossary {
        Glossary::parse("source;target;keep_case\nkit;KIT;true\n")
    }

    #[test]
    fn test_trivial_input_untouched() {
        let t = translator(Box::new(Uppercase), Glossary::new());
        for text in ["", "   ", "a", " x ", "7131526", "12,50 (3)", "+-"] {
            assert_eq!(t.translate_text(text), text);
        }
    }

    #[test]
    fn test_glossary_applied_after_backend() {
        struct Lowercase;
        impl Backend for Lowercase {
            fn name(&self) -> &str {
                "lowercase"
            }
            fn translate(&self, text: &str) -> Result<String, crate::error::BackendError> {
                Ok(text.to_lowercase())
            }
        }

        let t = translator(Box::new(Lowercase), kit_glossary());
        assert_eq!(t.translate_text("This is a kit for you"), "this is a KIT for you");
    }

    #[test]
    fn test_outer_whitespace_kept() {
        let t = translator(Box::new(Uppercase), Glossary::new());
        assert_eq!(t.translate_text("  hello world\n"), "  HELLO WORLD\n");
    }

    #[test]
    fn test_markup_routed_to_segmenter() {
        let t = translator(Box::new(Uppercase), kit_glossary());
        assert_eq!(
            t.translate_text("<p class=\"kit\">a kit here</p>"),
            "<p class=\"kit\">A KIT HERE</p>"
        );
    }

    #[test]
    fn test_identity_markup_is_lossless() {
        let t = translator(Box::new(Identity), Glossary::new());
        let input = "Use micare<strong>Surface maintenance</strong>For best results.";
        assert_eq!(t.translate_text(input), input);
    }

    #[test]
    fn test_failing_backend_returns_original() {
        let t = translator(Box::new(AlwaysFails::new("down")), Glossary::new());
        assert_eq!(t.translate_text("hello"), "hello");
    }

    #[test]
    fn test_localized_path_split() {
        assert_eq!(split_localized_path("/da/pleje/gulve"), Some(("/da/", "pleje/gulve")));
        assert_eq!(split_localized_path("/NB/x"), Some(("/NB/", "x")));
        assert_eq!(split_localized_path("/products/x"), None);
        assert_eq!(split_localized_path("da/x"), None);
        assert_eq!(split_localized_path("/da"), None);
    }

    #[test]
    fn test_localized_path_translates_remainder_only() {
        let tagged = Arc::new(Tagged::new("t"));

        struct Shared(Arc<Tagged>);
        impl Backend for Shared {
            fn name(&self) -> &str {
                self.0.name()
            }
            fn translate(&self, text: &str) -> Result<String, crate::error::BackendError> {
                self.0.translate(text)
            }
        }

        let t = translator(Box::new(Shared(tagged.clone())), Glossary::new());
        assert_eq!(
            t.translate_localized_path("/en/floor-care").as_deref(),
            Some("/en/t:floor-care")
        );
        assert_eq!(t.translate_localized_path("/en/").as_deref(), Some("/en/"));
        assert_eq!(t.translate_localized_path("/shop/floor-care"), None);
        assert_eq!(tagged.seen(), vec!["floor-care"]);
    }
}
