//! Google Translate web endpoint adapter (no API key)

use std::time::Duration;

use anyhow::{Context, Result};

use crate::error::BackendError;
use crate::lang::{LanguageCode, LanguagePair};

use super::backend::Backend;

const ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

pub struct GoogleTranslate {
    client: reqwest::blocking::Client,
    source: &'static str,
    target: &'static str,
}

impl GoogleTranslate {
    pub fn new(languages: LanguagePair, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            source: Self::normalize_lang(languages.source),
            target: Self::normalize_lang(languages.target),
        })
    }

    fn normalize_lang(lang: LanguageCode) -> &'static str {
        match lang {
            LanguageCode::Flemish => "nl",
            other => other.code(),
        }
    }

    fn request_url(&self, text: &str) -> String {
        format!(
            "{}?client=gtx&sl={}&tl={}&dt=t&q={}",
            ENDPOINT,
            self.source,
            self.target,
            urlencoding::encode(text)
        )
    }
}

/// The endpoint answers with nested arrays; the first element holds one
/// `[translated, original, ...]` entry per sentence.
fn parse_response(body: &str) -> Result<String, BackendError> {
    let parsed: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

    let Some(sentences) = parsed.get(0).and_then(|v| v.as_array()) else {
        return Err(BackendError::MalformedResponse(
            "missing sentence array".to_string(),
        ));
    };

    let mut result = String::new();
    for item in sentences {
        if let Some(translated) = item.get(0).and_then(|v| v.as_str()) {
            result.push_str(translated);
        }
    }

    if result.is_empty() {
        return Err(BackendError::EmptyResult);
    }

    Ok(result)
}

impl Backend for GoogleTranslate {
    fn name(&self) -> &str {
        "google"
    }

    fn translate(&self, text: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .get(self.request_url(text))
            .header("User-Agent", "Mozilla/5.0")
            .send()?;

        match response.status().as_u16() {
            429 => return Err(BackendError::RateLimited),
            403 => return Err(BackendError::Forbidden),
            status if !(200..300).contains(&status) => {
                let body = response.text().unwrap_or_default();
                return Err(BackendError::Http { status, body });
            }
            _ => {}
        }

        let body = response.text()?;
        parse_response(&body)
    }
}
