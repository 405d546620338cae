//! Config command handlers

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use super::Config;
use crate::cli::{ConfigAction, ConfigArgs};
use crate::lang::LanguageCode;
use crate::translate::KNOWN_BACKENDS;

pub fn run(args: ConfigArgs, explicit: Option<&Path>) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(explicit),
        ConfigAction::Init { force } => init_config(explicit, force),
        ConfigAction::Set { key, value } => set_config(explicit, &key, &value),
        ConfigAction::Get { key } => get_config(explicit, &key),
        ConfigAction::Path => show_path(explicit),
        ConfigAction::Edit => edit_config(explicit),
    }
}

fn show_config(explicit: Option<&Path>) -> Result<()> {
    let config = Config::load_with(explicit)?;
    let content = toml::to_string_pretty(&config)?;

    println!("{}", "[Config]".green());
    println!("{}", content);

    Ok(())
}

fn init_config(explicit: Option<&Path>, force: bool) -> Result<()> {
    let path = Config::resolve_path(explicit)?;

    if path.exists() && !force {
        println!(
            "{}",
            format!("Config file already exists: {}", path.display()).yellow()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    Config::default().save_to(&path)?;

    println!("{}", "[Config] Initialized".green());
    println!("  Created: {}", path.display());
    println!();
    println!("Set a DeepL key or a LibreTranslate endpoint with:");
    println!("  structrans config set services.deepl_api_key <KEY>");

    Ok(())
}

fn set_config(explicit: Option<&Path>, key: &str, value: &str) -> Result<()> {
    let path = Config::resolve_path(explicit)?;
    let mut config = Config::load_from(&path)?;

    set_value(&mut config, key, value)?;

    config.save_to(&path)?;
    println!("{}", format!("[Config] Set {} = {}", key, value).green());

    Ok(())
}

fn get_config(explicit: Option<&Path>, key: &str) -> Result<()> {
    let config = Config::load_with(explicit)?;

    match get_value(&config, key)? {
        Some(v) => println!("{} = {}", key, v),
        None => println!("{} = (not set)", key),
    }

    Ok(())
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parsed<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .context(format!("Invalid value for {}: {}", key, value))
}

pub fn set_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let translation = &mut config.translation;
    let services = &mut config.services;

    match parts.as_slice() {
        ["translation", "delay_ms"] => translation.delay_ms = parsed(key, value)?,
        ["translation", "max_retries"] => translation.max_retries = parsed(key, value)?,
        ["translation", "retry_base_delay_ms"] => {
            translation.retry_base_delay_ms = parsed(key, value)?
        }
        ["translation", "csv_max_workers"] => translation.csv_max_workers = parsed(key, value)?,
        ["translation", "multithreading_threshold"] => {
            translation.multithreading_threshold = parsed(key, value)?
        }
        ["translation", "progress_interval"] => {
            translation.progress_interval = parsed(key, value)?
        }
        ["translation", "html_container_tags"] => translation.html_container_tags = list(value),
        ["translation", "glossary"] => translation.glossary = optional(value),
        ["translation", "default_source"] => {
            value.parse::<LanguageCode>()?;
            translation.default_source = value.to_string();
        }
        ["translation", "default_target"] => {
            value.parse::<LanguageCode>()?;
            translation.default_target = value.to_string();
        }
        ["services", "order"] => {
            let order = list(value);
            if let Some(unknown) = order.iter().find(|s| !KNOWN_BACKENDS.contains(&s.as_str())) {
                anyhow::bail!(
                    "Unknown backend: {} (expected one of {})",
                    unknown,
                    KNOWN_BACKENDS.join(", ")
                );
            }
            services.order = order;
        }
        ["services", "libretranslate_url"] => services.libretranslate_url = value.to_string(),
        ["services", "libretranslate_api_key"] => {
            services.libretranslate_api_key = optional(value)
        }
        ["services", "libretranslate_selfhost_enabled"] => {
            services.libretranslate_selfhost_enabled = parsed(key, value)?
        }
        ["services", "libretranslate_selfhost_url"] => {
            services.libretranslate_selfhost_url = value.to_string()
        }
        ["services", "libretranslate_selfhost_timeout_secs"] => {
            services.libretranslate_selfhost_timeout_secs = parsed(key, value)?
        }
        ["services", "deepl_api_key"] => services.deepl_api_key = optional(value),
        ["services", "request_timeout_secs"] => {
            services.request_timeout_secs = parsed(key, value)?
        }
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    }

    Ok(())
}

pub fn get_value(config: &Config, key: &str) -> Result<Option<String>> {
    let parts: Vec<&str> = key.split('.').collect();
    let translation = &config.translation;
    let services = &config.services;

    let value = match parts.as_slice() {
        ["translation", "delay_ms"] => Some(translation.delay_ms.to_string()),
        ["translation", "max_retries"] => Some(translation.max_retries.to_string()),
        ["translation", "retry_base_delay_ms"] => Some(translation.retry_base_delay_ms.to_string()),
        ["translation", "csv_max_workers"] => Some(translation.csv_max_workers.to_string()),
        ["translation", "multithreading_threshold"] => {
            Some(translation.multithreading_threshold.to_string())
        }
        ["translation", "progress_interval"] => Some(translation.progress_interval.to_string()),
        ["translation", "html_container_tags"] => Some(translation.html_container_tags.join(",")),
        ["translation", "glossary"] => translation.glossary.clone(),
        ["translation", "default_source"] => Some(translation.default_source.clone()),
        ["translation", "default_target"] => Some(translation.default_target.clone()),
        ["services", "order"] => Some(services.order.join(",")),
        ["services", "libretranslate_url"] => Some(services.libretranslate_url.clone()),
        ["services", "libretranslate_api_key"] => {
            services.libretranslate_api_key.as_deref().map(mask_key)
        }
        ["services", "libretranslate_selfhost_enabled"] => {
            Some(services.libretranslate_selfhost_enabled.to_string())
        }
        ["services", "libretranslate_selfhost_url"] => {
            Some(services.libretranslate_selfhost_url.clone())
        }
        ["services", "libretranslate_selfhost_timeout_secs"] => {
            Some(services.libretranslate_selfhost_timeout_secs.to_string())
        }
        ["services", "deepl_api_key"] => services.deepl_api_key.as_deref().map(mask_key),
        ["services", "request_timeout_secs"] => Some(services.request_timeout_secs.to_string()),
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    };

    Ok(value)
}

fn show_path(explicit: Option<&Path>) -> Result<()> {
    match Config::resolve_path(explicit) {
        Ok(path) => {
            println!("{}", path.display());
            if path.exists() {
                println!("{}", "(exists)".green());
            } else {
                println!("{}", "(not created)".yellow());
            }
        }
        Err(_) => {
            println!("{}", "Could not determine config path".red());
        }
    }
    Ok(())
}

fn edit_config(explicit: Option<&Path>) -> Result<()> {
    let path = Config::resolve_path(explicit)?;

    if !path.exists() {
        Config::default().save_to(&path)?;
        println!("{}", "[Config] Created default config".green());
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    println!("Opening config with: {}", editor);
    println!("Path: {}", path.display());

    std::process::Command::new(&editor)
        .arg(&path)
        .status()
        .context(format!("Failed to open editor: {}", editor))?;

    Ok(())
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
