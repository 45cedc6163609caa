//! Logic for loading configuration in to an object model
use std::str::FromStr;

use displaydoc::Display;
use schemars::JsonSchema;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

const DEFAULT_PATH_DELIMITER: &str = ".";

// The RECURSION_LIMIT is chosen to be:
//   < # expected to cause stack overflow &&
//   > # expected in a legitimate query
const DEFAULT_RECURSION_LIMIT: usize = 512;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// {message}: {error}
    InvalidConfiguration {
        message: &'static str,
        error: String,
    },
    /// could not deserialize configuration: {0}
    DeserializeConfigError(serde_yaml::Error),
}

/// The configuration for the resolver.
///
/// Can be created through `serde::Deserialize` from various formats,
/// or inline in Rust code with [`Configuration::builder`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Delimiter used when rendering occurrence paths and flattened relation
    /// paths. Both must agree for `has_relation` lookups to work.
    #[serde(default = "default_path_delimiter")]
    pub(crate) path_delimiter: String,

    /// Maximum depth the executor descends into a requested field tree.
    #[serde(default = "default_recursion_limit")]
    pub(crate) recursion_limit: usize,
}

fn default_path_delimiter() -> String {
    DEFAULT_PATH_DELIMITER.to_string()
}

fn default_recursion_limit() -> usize {
    DEFAULT_RECURSION_LIMIT
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            path_delimiter: default_path_delimiter(),
            recursion_limit: default_recursion_limit(),
        }
    }
}

#[buildstructor::buildstructor]
impl Configuration {
    #[builder]
    pub fn new(
        path_delimiter: Option<String>,
        recursion_limit: Option<usize>,
    ) -> Result<Self, ConfigurationError> {
        let configuration = Self {
            path_delimiter: path_delimiter.unwrap_or_else(default_path_delimiter),
            recursion_limit: recursion_limit.unwrap_or_else(default_recursion_limit),
        };
        configuration.validate()
    }

    pub fn path_delimiter(&self) -> &str {
        &self.path_delimiter
    }

    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// The JSON schema of the configuration file.
    pub fn json_schema() -> RootSchema {
        schemars::schema_for!(Configuration)
    }

    pub(crate) fn validate(self) -> Result<Self, ConfigurationError> {
        if self.path_delimiter.is_empty() {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "path_delimiter must not be empty",
                error: "an empty delimiter cannot separate path segments".to_string(),
            });
        }
        if self.recursion_limit == 0 {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "recursion_limit must be positive",
                error: "a limit of 0 rejects every root field".to_string(),
            });
        }
        Ok(self)
    }
}

/// Parse configuration from a YAML string.
impl FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let configuration: Configuration =
            serde_yaml::from_str(s).map_err(ConfigurationError::DeserializeConfigError)?;
        configuration.validate()
    }
}
