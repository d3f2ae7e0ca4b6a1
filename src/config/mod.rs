use crate::client::ClientOptions;
use crate::error::{AslError, Result};
use crate::query::PredicateExpr;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How search results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Raw,
}

impl std::str::FromStr for OutputFormat {
    type Err = AslError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "raw" => Ok(OutputFormat::Raw),
            other => Err(AslError::ConfigValidation(format!(
                "Invalid format: {}. Must be one of: table, json, raw",
                other
            ))),
        }
    }
}

/// A saved search: client settings, predicates and output preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Client identity (empty selects the process default)
    #[serde(default)]
    pub ident: String,

    /// Client facility (empty selects the default)
    #[serde(default)]
    pub facility: String,

    /// Client option names: stderr, no_delay, no_remote
    #[serde(default)]
    pub options: Vec<String>,

    /// JSON fixture to search instead of the system log
    #[serde(default)]
    pub fixture: Option<PathBuf>,

    /// Predicate expressions, all of which must match
    #[serde(default)]
    pub predicates: Vec<String>,

    /// Compare every predicate case-insensitively
    #[serde(default)]
    pub ignore_case: bool,

    /// Maximum number of records to print
    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default)]
    pub format: OutputFormat,
}

fn default_limit() -> usize {
    100
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            ident: String::new(),
            facility: String::new(),
            options: Vec::new(),
            fixture: None,
            predicates: Vec::new(),
            ignore_case: false,
            limit: default_limit(),
            format: OutputFormat::default(),
        }
    }
}

impl SearchConfig {
    /// Load a search configuration from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<SearchConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AslError::Config(format!("Failed to read config file: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let mut config = match extension {
            "toml" => Self::parse_toml(&contents)?,
            "json" => Self::parse_json(&contents)?,
            _ => {
                return Err(AslError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.expand_env_vars();
        config.validate()?;

        Ok(config)
    }

    fn parse_toml(contents: &str) -> Result<SearchConfig> {
        toml::from_str(contents)
            .map_err(|e| AslError::InvalidConfig(format!("Failed to parse TOML: {}", e)))
    }

    fn parse_json(contents: &str) -> Result<SearchConfig> {
        serde_json::from_str(contents)
            .map_err(|e| AslError::InvalidConfig(format!("Failed to parse JSON: {}", e)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.client_options()?;
        self.predicate_exprs()?;

        if self.limit == 0 {
            return Err(AslError::ConfigValidation(
                "limit must be at least 1".to_string(),
            ));
        }

        if let Some(ref fixture) = self.fixture {
            if fixture.as_os_str().is_empty() {
                return Err(AslError::MissingConfigField("fixture".to_string()));
            }
            if !fixture.is_file() {
                return Err(AslError::ConfigValidation(format!(
                    "Fixture file does not exist: {}",
                    fixture.display()
                )));
            }
        }

        Ok(())
    }

    /// Combined client option flags
    pub fn client_options(&self) -> Result<ClientOptions> {
        self.options
            .iter()
            .try_fold(ClientOptions::empty(), |acc, name| {
                ClientOptions::from_name(name)
                    .map(|flag| acc | flag)
                    .ok_or_else(|| {
                        AslError::ConfigValidation(format!(
                            "Invalid option: {}. Must be one of: stderr, no_delay, no_remote",
                            name
                        ))
                    })
            })
    }

    /// Parsed predicates, case-folded when `ignore_case` is set
    pub fn predicate_exprs(&self) -> Result<Vec<PredicateExpr>> {
        self.predicates
            .iter()
            .map(|text| {
                let expr: PredicateExpr = text.parse()?;
                Ok(if self.ignore_case {
                    expr.with_casefold()
                } else {
                    expr
                })
            })
            .collect()
    }

    /// Expand environment variables in path fields
    fn expand_env_vars(&mut self) {
        if let Some(ref fixture) = self.fixture {
            self.fixture = Some(Self::expand_env_in_path(fixture));
        }
    }

    /// Expand environment variables in a string
    fn expand_env_in_string(s: &str) -> String {
        let mut result = s.to_string();

        // Handle $VAR and ${VAR} syntax
        for (key, value) in std::env::vars() {
            result = result.replace(&format!("${{{}}}", key), &value);
            result = result.replace(&format!("${}", key), &value);
        }

        result
    }

    fn expand_env_in_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        PathBuf::from(Self::expand_env_in_string(&path_str))
    }
}
