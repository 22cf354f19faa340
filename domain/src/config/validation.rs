//! Structured configuration issues.
//!
//! Config validation never stops at the first problem: it returns every
//! issue found, each with a severity. Callers abort on any
//! [`Severity::Error`] and log warnings.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// Neither `[[workers]]` nor `topology_file` is configured.
    NoWorkers,
    /// A worker entry has an unknown role string.
    UnknownRole,
    /// A timeout is zero.
    ZeroTimeout,
    /// The title timeout is longer than the request timeout.
    TitleTimeoutTooLong,
    /// The health poll interval is zero.
    ZeroPollInterval,
    /// The offline multiplier is below 1, so every worker looks offline.
    LowOfflineMultiplier,
    /// The progress channel capacity is zero.
    ZeroChannelCapacity,
    /// Both `[[workers]]` and `topology_file` are set; the file is ignored.
    TopologyFileIgnored,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}
