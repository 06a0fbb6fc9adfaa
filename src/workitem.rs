//! Run inputs from an orchestrator's work item.
//!
//! A work item is a JSON file carrying `search_phrase` and `months`, either at
//! the top level or under a `variables` object:
//!
//! ```json
//! { "variables": { "search_phrase": "israel war iran", "months": "2" } }
//! ```
//!
//! Values present in the work item override the command line; anything
//! missing falls back to it.

use crate::cli::Cli;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkItemVariables {
    #[serde(default)]
    pub search_phrase: Option<String>,
    #[serde(default)]
    pub months: Option<Months>,
}

/// Orchestrators often send numbers as strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Months {
    Number(u32),
    Text(String),
}

impl Months {
    fn value(&self) -> Option<u32> {
        match self {
            Months::Number(n) => Some(*n),
            Months::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// The search inputs a run actually uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInput {
    pub search_phrase: String,
    pub months: u32,
}

pub fn parse_work_item(raw: &str) -> Result<WorkItemVariables, ConfigError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let variables = value.get("variables").cloned().unwrap_or(value);
    Ok(serde_json::from_value(variables)?)
}

#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_work_item(path: &Path) -> Result<WorkItemVariables, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let variables = parse_work_item(&raw)?;
    info!(?variables, "Loaded work item");
    Ok(variables)
}

/// Combine work-item variables with command-line values.
pub fn merge(variables: WorkItemVariables, search_phrase: &str, months: u32) -> RunInput {
    RunInput {
        search_phrase: variables
            .search_phrase
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| search_phrase.to_string()),
        months: variables.months.and_then(|m| m.value()).unwrap_or(months),
    }
}

/// Resolve the run's inputs from the CLI and the optional work item.
pub fn resolve_input(cli: &Cli) -> Result<RunInput, ConfigError> {
    let variables = match &cli.work_item {
        Some(path) => load_work_item(path)?,
        None => WorkItemVariables::default(),
    };
    Ok(merge(variables, &cli.search_phrase, cli.months))
}
