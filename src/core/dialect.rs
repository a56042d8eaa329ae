// src/core/dialect.rs

use crate::{
    constants::KNOWN_MUSICFORMATS_SERVICES,
    models::{DialectConfig, DialectsConfig},
};
use std::collections::BTreeMap;

/// The per-front-end variation point of the interpreter.
///
/// Every scripting front end shares one interpreter; only the name used in
/// diagnostics, the services it knows about and the default service differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    pub name: String,
    pub known_services: Vec<String>,
    pub default_service: Option<String>,
    pub select_option: String,
}

impl Dialect {
    pub fn from_config(name: &str, config: &DialectConfig) -> Self {
        Self {
            name: name.to_string(),
            known_services: config.known_services.clone(),
            default_service: config.default_service.clone(),
            select_option: config.select_option.clone(),
        }
    }

    pub fn is_known_service(&self, service: &str) -> bool {
        self.known_services.iter().any(|known| known == service)
    }

    /// One of the built-in dialects, by name.
    pub fn builtin(name: &str) -> Option<Self> {
        builtin_dialects()
            .dialects
            .get(name)
            .map(|config| Self::from_config(name, config))
    }
}

/// The dialects known without any configuration file.
pub fn builtin_dialects() -> DialectsConfig {
    let services: Vec<String> = KNOWN_MUSICFORMATS_SERVICES
        .iter()
        .map(|s| s.to_string())
        .collect();

    let dialect = |description: &str, default_service: Option<&str>| DialectConfig {
        description: Some(description.to_string()),
        default_service: default_service.map(str::to_string),
        known_services: services.clone(),
        select_option: "--select, -s".to_string(),
    };

    let mut dialects = BTreeMap::new();
    dialects.insert(
        "mfsl".to_string(),
        dialect("MusicFormats scripting language", None),
    );
    dialects.insert(
        "ischeme".to_string(),
        dialect("Interactive MusicFormats scheme", None),
    );
    dialects.insert(
        "mffind".to_string(),
        dialect("Find scripts over MusicFormats scores", Some("xml2ly")),
    );
    dialects.insert(
        "stringfilter".to_string(),
        dialect("String filter scripts", Some("xml2xml")),
    );
    DialectsConfig { dialects }
}
