//! DeepL REST adapter

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::BackendError;
use crate::lang::{LanguageCode, LanguagePair};

use super::backend::Backend;

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

pub struct DeepL {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    source: &'static str,
    target: &'static str,
}

impl DeepL {
    pub fn new(api_key: Option<String>, languages: LanguagePair, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            source: Self::normalize_source(languages.source),
            target: Self::normalize_target(languages.target),
        })
    }

    fn normalize_source(lang: LanguageCode) -> &'static str {
        match lang {
            LanguageCode::Danish => "DA",
            LanguageCode::Dutch | LanguageCode::Flemish => "NL",
            LanguageCode::English => "EN",
            LanguageCode::French => "FR",
            LanguageCode::German => "DE",
            LanguageCode::Italian => "IT",
            LanguageCode::Norwegian => "NB",
            LanguageCode::Spanish => "ES",
            LanguageCode::Swedish => "SV",
        }
    }

    fn normalize_target(lang: LanguageCode) -> &'static str {
        match lang {
            LanguageCode::English => "EN-GB",
            other => Self::normalize_source(other),
        }
    }

    /// Free-tier keys end in `:fx` and use a separate host.
    fn endpoint(api_key: &str) -> &'static str {
        if api_key.ends_with(":fx") {
            "https://api-free.deepl.com/v2/translate"
        } else {
            "https://api.deepl.com/v2/translate"
        }
    }
}

impl Backend for DeepL {
    fn name(&self) -> &str {
        "deepl"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn translate(&self, text: &str) -> Result<String, BackendError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(BackendError::MissingApiKey("deepl"))?;

        let form_params = [
            ("text", text),
            ("source_lang", self.source),
            ("target_lang", self.target),
        ];

        let response = self
            .client
            .post(Self::endpoint(api_key))
            .header("Authorization", format!("DeepL-Auth-Key {}", api_key))
            .form(&form_params)
            .send()?;

        match response.status().as_u16() {
            429 | 456 => return Err(BackendError::RateLimited),
            403 => return Err(BackendError::Forbidden),
            status if !(200..300).contains(&status) => {
                let body = response.text().unwrap_or_default();
                return Err(BackendError::Http { status, body });
            }
            _ => {}
        }

        let result: DeepLResponse = response.json()?;
        result
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or(BackendError::EmptyResult)
    }
}
