//! XML document pipeline

pub mod tree;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::error::PipelineError;
use crate::translate::markup::split_padding;
use crate::translate::text::{TextTranslator, is_translatable};

use super::TranslationOutcome;
use tree::{Document, Element, Node, XmlWriter};

/// Element name whose text holds a site path rather than prose.
const URL_TAG: &str = "url";

pub struct XmlPipeline {
    translator: Arc<TextTranslator>,
    settings: Settings,
}

#[derive(Debug, Default)]
struct WalkStats {
    characters: usize,
    translated: usize,
    kept: usize,
}

impl XmlPipeline {
    pub fn new(translator: Arc<TextTranslator>, settings: Settings) -> Self {
        Self {
            translator,
            settings,
        }
    }

    pub fn translate_xml(&self, input: &Path, output: &Path) -> TranslationOutcome {
        TranslationOutcome::from_result(input, self.try_translate_xml(input, output))
    }

    /// Returns the number of source characters translated. A document that
    /// does not parse produces no output file.
    pub fn try_translate_xml(&self, input: &Path, output: &Path) -> Result<usize, PipelineError> {
        let content = fs::read_to_string(input)?;
        let (translated, characters) = self.translate_document(&content)?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, translated)?;

        Ok(characters)
    }

    /// Translate an in-memory document, returning the serialized result and
    /// the number of source characters translated.
    pub fn translate_document(&self, xml: &str) -> Result<(String, usize), PipelineError> {
        let mut doc: Document = tree::parse(xml)?;

        let mut stats = WalkStats::default();
        self.walk(&mut doc.root, &mut stats);

        tracing::info!(
            "XML elements: {} translated, {} kept original",
            stats.translated,
            stats.kept
        );

        let is_container = |name: &str| self.settings.is_html_container(name);
        let output = XmlWriter::new(&is_container).write(&doc);
        Ok((output, stats.characters))
    }

    fn walk(&self, element: &mut Element, stats: &mut WalkStats) {
        if element.is_ignored() {
            tracing::debug!("Skipping ignored element <{}>", element.name);
            return;
        }

        element.text = self.translate_content(&element.name, &element.text, stats);

        for node in element.children.iter_mut() {
            match node {
                // The tail belongs to the ignored child and stays as written.
                Node::Element(child) if child.is_ignored() => {
                    tracing::debug!("Skipping ignored element <{}>", child.name);
                }
                Node::Element(child) => {
                    self.walk(child, stats);
                    child.tail = self.translate_content(&element.name, &child.tail, stats);
                }
                Node::Comment { tail, .. } => {
                    *tail = self.translate_content(&element.name, tail, stats);
                }
            }
        }
    }

    fn translate_content(&self, container: &str, text: &str, stats: &mut WalkStats) -> String {
        if !is_translatable(text) {
            return text.to_string();
        }

        let (lead, core, trail) = split_padding(text);

        if let Some(translated) = self.translator.translate_localized_path(core) {
            stats.characters += core.chars().count();
            stats.translated += 1;
            return format!("{}{}{}", lead, translated, trail);
        }

        if container.eq_ignore_ascii_case(URL_TAG) {
            tracing::debug!("Leaving non-localized URL untouched: {}", core);
            return text.to_string();
        }

        match self.translator.try_translate_text(core) {
            Ok(translated) => {
                stats.characters += core.chars().count();
                stats.translated += 1;
                format!("{}{}{}", lead, translated, trail)
            }
            Err(e) => {
                tracing::warn!("Keeping original text of <{}>: {}", container, e);
                stats.kept += 1;
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::backend::Backend;
    use crate::translate::backend::testing::Uppercase;
    use crate::translate::chain::BackendChain;
    use crate::translate::glossary::Glossary;
    use tempfile::TempDir;

    fn pipeline(backend: Box<dyn Backend>) -> XmlPipeline {
        let settings = Settings::immediate();
        let chain = BackendChain::new(vec![backend], &settings);
        XmlPipeline::new(
            Arc::new(TextTranslator::new(chain, Glossary::new())),
            settings,
        )
    }

    fn translate(xml: &str) -> String {
        pipeline(Box::new(Uppercase)).translate_document(xml).unwrap().0
    }

    #[test]
    fn test_ignored_subtree_untouched() {
        let out = translate(
            r#"<Items><Item Ignore="True"><Name>keep me</Name></Item><Item><Name>change me</Name></Item></Items>"#,
        );
        assert!(out.contains(r#"<Item Ignore="True">"#));
        assert!(out.contains("<Name>keep me</Name>"));
        assert!(out.contains("<Name>CHANGE ME</Name>"));
    }

    #[test]
    fn test_tail_of_ignored_element_untouched() {
        let out = translate(r#"<p>intro <code ignore="true">let x</code> after text <b>bold one</b> end</p>"#);
        assert!(out.contains(
            r#"<p>INTRO <code ignore="true">let x</code> after text <b>BOLD ONE</b> END</p>"#
        ));

        let out = translate(r#"<r><a ignore="true">keep</a>tail text here</r>"#);
        assert!(out.contains(r#"<r><a ignore="true">keep</a>tail text here</r>"#));
    }

    #[test]
    fn test_url_handling() {
        let out = translate("<r><Url>/da/floor-care</Url><Url>/shop/floor-care</Url><Link>/en/about-us</Link></r>");
        assert!(out.contains("<Url>/da/FLOOR-CARE</Url>"));
        assert!(out.contains("<Url>/shop/floor-care</Url>"));
        assert!(out.contains("<Link>/en/ABOUT-US</Link>"));
    }

    #[test]
    fn test_cdata_markup_translated_and_rewrapped() {
        let out = translate("<r><Description><![CDATA[<p>Nice <b>floor</b></p>]]></Description></r>");
        assert!(out.contains("<Description><![CDATA[<p>NICE <b>FLOOR</b></p>]]></Description>"));
    }

    #[test]
    fn test_escaped_markup_comes_back_as_cdata() {
        let out = translate("<r><Content>&lt;p&gt;Hello there&lt;/p&gt;</Content></r>");
        assert!(out.contains("<Content><![CDATA[<p>HELLO THERE</p>]]></Content>"));
    }

    #[test]
    fn test_character_count_and_numbers() {
        let (out, chars) = pipeline(Box::new(Uppercase))
            .translate_document("<r><Sku>0042</Sku><Name>Mop</Name><Price>12,50</Price></r>")
            .unwrap();
        assert_eq!(chars, 3);
        assert!(out.contains("<Sku>0042</Sku>"));
        assert!(out.contains("<Name>MOP</Name>"));
        assert!(out.contains("<Price>12,50</Price>"));
    }

    #[test]
    fn test_parse_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("broken.xml");
        let output = dir.path().join("out.xml");
        fs::write(&input, "<r><a></r>").unwrap();

        let outcome = pipeline(Box::new(Uppercase)).translate_xml(&input, &output);
        assert!(!outcome.success);
        assert!(!output.exists());
    }
}
