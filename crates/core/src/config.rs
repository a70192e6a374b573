//! Project configuration file model.
//!
//! The engine reads a single optional configuration file per project,
//! conventionally named `vercel.json`. Only the keys relevant to service
//! resolution are modeled; everything else is carried opaquely. Maps use
//! `BTreeMap` so iteration order, and therefore resolution output, is
//! deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Conventional name of the project configuration file.
pub const CONFIG_FILE: &str = "vercel.json";

/// Kind of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    #[default]
    Web,
    Worker,
    Cron,
}

/// One entry of `experimentalServices` as written by the user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(rename = "type", default)]
    pub service_type: ServiceType,
    pub workspace: Option<String>,
    pub entrypoint: Option<String>,
    pub framework: Option<String>,
    pub builder: Option<String>,
    pub runtime: Option<String>,
    pub route_prefix: Option<String>,
    pub schedule: Option<String>,
    pub topic: Option<String>,
    pub consumer: Option<String>,
    pub memory: Option<u32>,
    pub max_duration: Option<u32>,
    pub include_files: Option<Vec<String>>,
    pub exclude_files: Option<Vec<String>>,
    pub build_command: Option<String>,
    pub install_command: Option<String>,
}

/// Parsed project configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub experimental_services: Option<BTreeMap<String, ServiceConfig>>,

    // Legacy keys, only inspected to reject their combination with the
    // service pipeline; their contents stay opaque here.
    pub builds: Option<serde_json::Value>,
    pub functions: Option<serde_json::Value>,

    #[serde(flatten)]
    pub rest: BTreeMap<String, serde_json::Value>,
}

impl ProjectConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn has_services(&self) -> bool {
        self.experimental_services
            .as_ref()
            .map(|services| !services.is_empty())
            .unwrap_or(false)
    }
}
