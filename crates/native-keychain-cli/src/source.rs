//! Where `set` reads the secret from
//!
//! - `env://VAR_NAME` - environment variable
//! - `file:///path/to/file` or a bare path (`/`, `./`, `../`) - file content
//! - `base64://DATA` - base64-encoded literal
//! - anything else - the literal value

use std::path::PathBuf;
use std::str::FromStr;

use base64::Engine;
use thiserror::Error;

/// Errors from parsing or reading a value source
#[derive(Debug, Error)]
pub enum ValueSourceError {
    #[error("Invalid value source '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Environment variable '{var}' not set")]
    EnvNotSet { var: String },

    #[error("Failed to read file '{path}': {message}")]
    File { path: PathBuf, message: String },

    #[error("base64 error: {0}")]
    Decode(String),
}

impl ValueSourceError {
    fn invalid_uri(uri: &str, reason: &str) -> Self {
        Self::InvalidUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Secret value reference given on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSource {
    Literal(String),
    Env { var_name: String },
    File { path: PathBuf },
    Base64 { data: String },
}

impl ValueSource {
    /// Source name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ValueSource::Literal(_) => "literal",
            ValueSource::Env { .. } => "env",
            ValueSource::File { .. } => "file",
            ValueSource::Base64 { .. } => "base64",
        }
    }

    /// Read the secret. A single trailing newline is dropped from file content.
    pub fn read(&self) -> Result<String, ValueSourceError> {
        match self {
            ValueSource::Literal(value) => Ok(value.clone()),

            ValueSource::Env { var_name } => {
                std::env::var(var_name).map_err(|_| ValueSourceError::EnvNotSet {
                    var: var_name.clone(),
                })
            }

            ValueSource::File { path } => {
                let content =
                    std::fs::read_to_string(path).map_err(|e| ValueSourceError::File {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                let trimmed = content
                    .strip_suffix('\n')
                    .map(|s| s.strip_suffix('\r').unwrap_or(s))
                    .unwrap_or(&content);
                Ok(trimmed.to_string())
            }

            ValueSource::Base64 { data } => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(data)
                    .map_err(|e| ValueSourceError::Decode(format!("decode error: {}", e)))?;
                String::from_utf8(bytes)
                    .map_err(|e| ValueSourceError::Decode(format!("invalid UTF-8: {}", e)))
            }
        }
    }
}

impl FromStr for ValueSource {
    type Err = ValueSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(var_name) = s.strip_prefix("env://") {
            if var_name.is_empty() {
                return Err(ValueSourceError::invalid_uri(
                    s,
                    "env source must specify a variable name",
                ));
            }
            Ok(ValueSource::Env {
                var_name: var_name.to_string(),
            })
        } else if let Some(path) = s.strip_prefix("file://") {
            if path.is_empty() {
                return Err(ValueSourceError::invalid_uri(
                    s,
                    "file source must specify a path",
                ));
            }
            Ok(ValueSource::File {
                path: PathBuf::from(path),
            })
        } else if let Some(data) = s.strip_prefix("base64://") {
            Ok(ValueSource::Base64 {
                data: data.to_string(),
            })
        } else if looks_like_file_path(s) {
            Ok(ValueSource::File {
                path: PathBuf::from(s),
            })
        } else {
            Ok(ValueSource::Literal(s.to_string()))
        }
    }
}

fn looks_like_file_path(s: &str) -> bool {
    s.starts_with('/') || s.starts_with("./") || s.starts_with("../")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_sources() {
        assert_eq!(
            "env://API_TOKEN".parse::<ValueSource>().unwrap(),
            ValueSource::Env {
                var_name: "API_TOKEN".to_string()
            }
        );
        assert_eq!(
            "file:///run/secrets/token".parse::<ValueSource>().unwrap(),
            ValueSource::File {
                path: PathBuf::from("/run/secrets/token")
            }
        );
        assert_eq!(
            "./token.txt".parse::<ValueSource>().unwrap(),
            ValueSource::File {
                path: PathBuf::from("./token.txt")
            }
        );
        assert_eq!(
            "s3cr3t".parse::<ValueSource>().unwrap(),
            ValueSource::Literal("s3cr3t".to_string())
        );
        assert_eq!(
            "".parse::<ValueSource>().unwrap(),
            ValueSource::Literal(String::new())
        );
    }

    #[test]
    fn test_invalid_sources() {
        assert!("env://".parse::<ValueSource>().is_err());
        assert!("file://".parse::<ValueSource>().is_err());
    }

    #[test]
    fn test_read_env() {
        std::env::set_var("NATIVE_KEYCHAIN_TEST_SOURCE", "env-value");
        let source: ValueSource = "env://NATIVE_KEYCHAIN_TEST_SOURCE".parse().unwrap();
        assert_eq!(source.read().unwrap(), "env-value");
        std::env::remove_var("NATIVE_KEYCHAIN_TEST_SOURCE");

        let missing: ValueSource = "env://DEFINITELY_NOT_SET_12345".parse().unwrap();
        assert!(matches!(
            missing.read(),
            Err(ValueSourceError::EnvNotSet { .. })
        ));
    }

    #[test]
    fn test_read_file_drops_trailing_newline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "file-value").unwrap();

        let source = ValueSource::File {
            path: file.path().to_path_buf(),
        };
        assert_eq!(source.read().unwrap(), "file-value");
    }

    #[test]
    fn test_read_missing_file() {
        let source = ValueSource::File {
            path: PathBuf::from("/definitely/not/a/real/path/12345"),
        };
        assert!(matches!(source.read(), Err(ValueSourceError::File { .. })));
    }

    #[test]
    fn test_read_base64() {
        // "Hello World" in base64
        let source: ValueSource = "base64://SGVsbG8gV29ybGQ=".parse().unwrap();
        assert_eq!(source.read().unwrap(), "Hello World");

        let invalid: ValueSource = "base64://not-valid-base64!!!".parse().unwrap();
        assert!(matches!(invalid.read(), Err(ValueSourceError::Decode(_))));
    }
}
