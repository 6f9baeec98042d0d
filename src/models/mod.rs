use serde::Serialize;
use std::fmt;

/// Interface names are plain strings, unique within one configuration snapshot
pub type InterfaceName = String;

/// Which side of a commit a check runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckMode {
    PreCommit,
    PostCommit,
}

impl CheckMode {
    /// Datastore the mode reads interfaces from
    pub fn datastore(self) -> Datastore {
        match self {
            CheckMode::PreCommit => Datastore::Candidate,
            CheckMode::PostCommit => Datastore::Running,
        }
    }

    /// Prefix used in results file names
    pub fn file_prefix(self) -> &'static str {
        match self {
            CheckMode::PreCommit => "pre",
            CheckMode::PostCommit => "post",
        }
    }

    /// Whether a non-compliant interface blocks the caller
    pub fn aborts_on_failure(self) -> bool {
        matches!(self, CheckMode::PreCommit)
    }
}

impl fmt::Display for CheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckMode::PreCommit => write!(f, "pre-commit"),
            CheckMode::PostCommit => write!(f, "post-commit"),
        }
    }
}

/// Configuration datastore on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Datastore {
    Running,
    Candidate,
}

impl fmt::Display for Datastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datastore::Running => write!(f, "running"),
            Datastore::Candidate => write!(f, "candidate"),
        }
    }
}

/// ComplianceReport partitions interface names into compliant and non-compliant,
/// both sorted ascending
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ComplianceReport {
    pub compliant: Vec<InterfaceName>,
    pub non_compliant: Vec<InterfaceName>,
}

impl ComplianceReport {
    pub fn passed(&self) -> usize {
        self.compliant.len()
    }

    pub fn failed(&self) -> usize {
        self.non_compliant.len()
    }

    pub fn total(&self) -> usize {
        self.passed() + self.failed()
    }

    pub fn is_compliant(&self) -> bool {
        self.non_compliant.is_empty()
    }
}

/// Result of checking one configuration snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// The snapshot had no interface entries at all
    NoInterfaces,
    Checked(ComplianceReport),
}

impl CheckOutcome {
    /// Names that failed the check, empty when nothing was checked
    pub fn failed_interfaces(&self) -> &[InterfaceName] {
        match self {
            CheckOutcome::NoInterfaces => &[],
            CheckOutcome::Checked(report) => &report.non_compliant,
        }
    }
}

/// Whether the rendered report made it to storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportPersistence {
    Persisted { location: String },
    NotPersisted { location: String, reason: String },
}

impl ReportPersistence {
    pub fn is_persisted(&self) -> bool {
        matches!(self, ReportPersistence::Persisted { .. })
    }
}

/// Summary of a completed run that did not abort
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mode: CheckMode,
    pub outcome: CheckOutcome,
    pub persistence: ReportPersistence,
}
