//! CS-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, CsError>;

/// Top-level error type for coldsign.
#[derive(Debug, Error)]
pub enum CsError {
    #[error("[CS-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[CS-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[CS-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[CS-2001] no removable media present")]
    NoRemovableMedia,

    #[error("[CS-2002] no trusted device could be mounted")]
    NoTrustedDevice,

    #[error("[CS-2003] permission denied while mounting {device}")]
    MountPermissionDenied { device: String },

    #[error("[CS-2004] device enumeration failure: {details}")]
    Enumeration { details: String },

    #[error("[CS-3001] unable to read transaction {path}: {details}")]
    FileRead { path: PathBuf, details: String },

    #[error("[CS-3002] external signer unavailable at {tool}: {details}")]
    ToolUnavailable { tool: PathBuf, details: String },

    #[error("[CS-3003] output already exists: {path}")]
    WriteCollision { path: PathBuf },

    #[error("[CS-3101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[CS-3102] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[CS-3201] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[CS-3202] background worker busy with another task")]
    WorkerBusy,

    #[error("[CS-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl CsError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "CS-1001",
            Self::MissingConfig { .. } => "CS-1002",
            Self::ConfigParse { .. } => "CS-1003",
            Self::NoRemovableMedia => "CS-2001",
            Self::NoTrustedDevice => "CS-2002",
            Self::MountPermissionDenied { .. } => "CS-2003",
            Self::Enumeration { .. } => "CS-2004",
            Self::FileRead { .. } => "CS-3001",
            Self::ToolUnavailable { .. } => "CS-3002",
            Self::WriteCollision { .. } => "CS-3003",
            Self::Serialization { .. } => "CS-3101",
            Self::Io { .. } => "CS-3102",
            Self::ChannelClosed { .. } => "CS-3201",
            Self::WorkerBusy => "CS-3202",
            Self::Runtime { .. } => "CS-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    ///
    /// The workflow never retries on its own; this only informs the CLI.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::ChannelClosed { .. }
                | Self::WorkerBusy
                | Self::Enumeration { .. }
                | Self::Runtime { .. }
        )
    }

    /// Headline shown on the first display row when this error ends a flow.
    ///
    /// The headline keyword also selects the backlight colour.
    #[must_use]
    pub const fn headline(&self) -> &'static str {
        match self {
            Self::NoRemovableMedia | Self::NoTrustedDevice => "Please note",
            Self::MountPermissionDenied { .. } => "Warning",
            _ => "Error",
        }
    }

    /// Human-readable text for the scrolling message row.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoRemovableMedia => "No USB stick seems to be plugged in.".to_string(),
            Self::NoTrustedDevice => "Could not mount any device because no USB stick is in \
                                      the list of trusted devices."
                .to_string(),
            Self::MountPermissionDenied { device } => {
                format!("Permission denied while mounting {device}.")
            }
            Self::FileRead { path, details } => {
                format!(
                    "Unable to read transaction file. Path: {}. {details}",
                    path.display()
                )
            }
            Self::ToolUnavailable { tool, .. } => {
                format!("Could not start electrum. Path: {}", tool.display())
            }
            Self::WriteCollision { path } => {
                format!("Signed file already exists: {}", path.display())
            }
            other => other.to_string(),
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for CsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for CsError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for CsError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<CsError> {
        vec![
            CsError::InvalidConfig {
                details: String::new(),
            },
            CsError::MissingConfig {
                path: PathBuf::new(),
            },
            CsError::ConfigParse {
                context: "",
                details: String::new(),
            },
            CsError::NoRemovableMedia,
            CsError::NoTrustedDevice,
            CsError::MountPermissionDenied {
                device: String::new(),
            },
            CsError::Enumeration {
                details: String::new(),
            },
            CsError::FileRead {
                path: PathBuf::new(),
                details: String::new(),
            },
            CsError::ToolUnavailable {
                tool: PathBuf::new(),
                details: String::new(),
            },
            CsError::WriteCollision {
                path: PathBuf::new(),
            },
            CsError::Serialization {
                context: "",
                details: String::new(),
            },
            CsError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            CsError::ChannelClosed { component: "" },
            CsError::WorkerBusy,
            CsError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let codes: Vec<&str> = all_variants().iter().map(CsError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn display_includes_code() {
        for err in all_variants() {
            let msg = err.to_string();
            assert!(
                msg.contains(err.code()),
                "display should contain error code: {msg}"
            );
        }
    }

    #[test]
    fn headlines_pick_status_tone() {
        assert_eq!(CsError::NoRemovableMedia.headline(), "Please note");
        assert_eq!(CsError::NoTrustedDevice.headline(), "Please note");
        assert_eq!(
            CsError::MountPermissionDenied {
                device: "/dev/sdb1".to_string()
            }
            .headline(),
            "Warning"
        );
        assert_eq!(
            CsError::WriteCollision {
                path: PathBuf::from("/x")
            }
            .headline(),
            "Error"
        );
    }

    #[test]
    fn user_messages_name_the_failure() {
        assert_eq!(
            CsError::NoRemovableMedia.user_message(),
            "No USB stick seems to be plugged in."
        );
        let msg = CsError::ToolUnavailable {
            tool: PathBuf::from("/usr/bin/electrum"),
            details: "not found".to_string(),
        }
        .user_message();
        assert!(msg.contains("/usr/bin/electrum"));
    }

    #[test]
    fn workflow_failures_are_not_retryable() {
        assert!(!CsError::NoRemovableMedia.is_retryable());
        assert!(!CsError::NoTrustedDevice.is_retryable());
        assert!(
            !CsError::WriteCollision {
                path: PathBuf::new()
            }
            .is_retryable()
        );
        assert!(CsError::WorkerBusy.is_retryable());
    }

    #[test]
    fn io_convenience_constructor() {
        let err = CsError::io(
            "/tmp/test.txn",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "CS-3102");
        assert!(err.to_string().contains("/tmp/test.txn"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: CsError = json_err.into();
        assert_eq!(err.code(), "CS-3101");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: CsError = toml_err.into();
        assert_eq!(err.code(), "CS-1003");
    }
}
