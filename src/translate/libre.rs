//! LibreTranslate REST adapter

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::lang::{LanguageCode, LanguagePair};

use super::backend::Backend;

#[derive(Debug, Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LibreResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LibreTranslateConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub self_hosted_url: Option<String>,
    pub timeout: Duration,
}

pub struct LibreTranslate {
    config: LibreTranslateConfig,
    client: reqwest::blocking::Client,
    source: &'static str,
    target: &'static str,
    endpoint: String,
    self_hosted: bool,
}

impl LibreTranslate {
    pub fn new(config: LibreTranslateConfig, languages: LanguagePair) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            endpoint: config.url.clone(),
            config,
            client,
            source: Self::normalize_lang(languages.source),
            target: Self::normalize_lang(languages.target),
            self_hosted: false,
        })
    }

    fn normalize_lang(lang: LanguageCode) -> &'static str {
        match lang {
            LanguageCode::Flemish => "nl",
            LanguageCode::Norwegian => "nb",
            other => other.code(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// A self-hosted instance answers its landing page with 200 and a body
    /// that mentions the translate API.
    fn probe(&self, url: &str, timeout: Duration) -> bool {
        let base = health_url(url);
        tracing::debug!("Probing self-hosted LibreTranslate at {}", base);

        let response = match self.client.get(&base).timeout(timeout).send() {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Self-hosted LibreTranslate not reachable: {}", e);
                return false;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            return false;
        }

        response
            .text()
            .map(|body| body.to_lowercase().contains("translate"))
            .unwrap_or(false)
    }
}

/// `http://host:5000/translate` -> `http://host:5000`
fn health_url(url: &str) -> String {
    url.trim_end_matches('/')
        .trim_end_matches("/translate")
        .to_string()
}

impl Backend for LibreTranslate {
    fn name(&self) -> &str {
        "libretranslate"
    }

    fn translate(&self, text: &str) -> Result<String, BackendError> {
        // The key only applies to the public service.
        let api_key = if self.self_hosted {
            None
        } else {
            self.config.api_key.as_deref().filter(|k| !k.is_empty())
        };

        let request = LibreRequest {
            q: text,
            source: self.source,
            target: self.target,
            format: "text",
            api_key,
        };

        let response = self.client.post(&self.endpoint).json(&request).send()?;

        match response.status().as_u16() {
            429 => return Err(BackendError::RateLimited),
            403 => return Err(BackendError::Forbidden),
            status if !(200..300).contains(&status) => {
                let body = response.text().unwrap_or_default();
                return Err(BackendError::Http { status, body });
            }
            _ => {}
        }

        let body: LibreResponse = response.json()?;
        match (body.translated_text, body.error) {
            (Some(text), _) if !text.trim().is_empty() => Ok(text),
            (_, Some(error)) => Err(BackendError::MalformedResponse(error)),
            _ => Err(BackendError::EmptyResult),
        }
    }

    fn prefer_self_hosted(&mut self, timeout: Duration) -> bool {
        let Some(url) = self.config.self_hosted_url.clone() else {
            return false;
        };

        if self.probe(&url, timeout) {
            tracing::info!("Using self-hosted LibreTranslate at {}", url);
            self.endpoint = url;
            self.self_hosted = true;
            true
        } else {
            false
        }
    }
}
