use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("{token} is not in the format 'manifest:aar'.")]
    MalformedToken { token: String },

    #[error("more than one sdk version configured: {versions:?}")]
    AmbiguousSdk { versions: Vec<u32> },

    #[error(
        "Supplying an AndroidManifest.xml with an absolute path is deprecated. Use a label instead: {known:?}."
    )]
    DeprecatedManifestPath { known: Vec<String> },

    #[error("{name} is not specified")]
    MissingSetting { name: String },

    #[error("invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
}

impl ConfigurationError {
    pub fn malformed_token(token: impl Into<String>) -> Self {
        Self::MalformedToken {
            token: token.into(),
        }
    }

    pub fn missing_setting(name: impl Into<String>) -> Self {
        Self::MissingSetting { name: name.into() }
    }

    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}
