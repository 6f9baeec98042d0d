use chrono::NaiveDateTime;

use crate::compliance::{self, NamingPolicy};
use crate::models::{CheckMode, CheckOutcome, Datastore, InterfaceName, RunSummary};
use crate::report::{self, ResultsStore};
use crate::session::{DeviceSession, SessionError};

/// GateError is why a run did not complete normally
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Pre-commit found interfaces that break the naming rules
    CommitAborted { failed: Vec<InterfaceName> },
    /// The configuration could not be read from the device
    Session(SessionError),
}

impl std::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateError::CommitAborted { failed } => {
                write!(f, "Non-compliant interfaces detected: {}", failed.join(", "))
            }
            GateError::Session(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GateError {}

impl From<SessionError> for GateError {
    fn from(e: SessionError) -> Self {
        GateError::Session(e)
    }
}

/// Everything one check needs besides the mode
pub struct Gate<'a> {
    pub session: &'a dyn DeviceSession,
    pub store: &'a dyn ResultsStore,
    pub policy: &'a dyn NamingPolicy,
    pub path: &'a str,
}

impl Gate<'_> {
    /// Fetch, check, report, and in pre-commit mode refuse on any failure.
    /// Post-commit only reports.
    pub async fn run(&self, mode: CheckMode, at: NaiveDateTime) -> Result<RunSummary, GateError> {
        let datastore = mode.datastore();
        tracing::info!("Starting {} check of {} ({})", mode, self.path, datastore);

        let fetched = match datastore {
            Datastore::Running => self.session.running(self.path).await,
            Datastore::Candidate => self.session.candidate(self.path).await,
        };
        let config = match fetched {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to read {} configuration: {}", datastore, e);
                return Err(e.into());
            }
        };

        let outcome = compliance::check(&config.interfaces, self.policy);
        let lines = report::render(mode, &outcome, &at);
        let text = report::to_text(&lines);
        let file_name = report::results_file_name(mode, &at);

        let persistence = match mode {
            CheckMode::PreCommit => {
                let persisted = report::persist(self.store, &file_name, &text).await;
                report::emit(&lines);
                persisted
            }
            CheckMode::PostCommit => {
                report::emit(&lines);
                report::persist(self.store, &file_name, &text).await
            }
        };

        match &outcome {
            CheckOutcome::NoInterfaces => {
                tracing::info!("No interfaces found in {} configuration", datastore);
            }
            CheckOutcome::Checked(r) => {
                tracing::info!("{} interfaces checked: {} passed, {} failed", r.total(), r.passed(), r.failed());
            }
        }

        let failed = outcome.failed_interfaces();
        if !failed.is_empty() {
            if mode.aborts_on_failure() {
                tracing::error!("Aborting commit: {} non-compliant interfaces", failed.len());
                return Err(GateError::CommitAborted {
                    failed: failed.to_vec(),
                });
            }
            tracing::warn!("Committed configuration has {} non-compliant interfaces", failed.len());
        }

        Ok(RunSummary {
            mode,
            outcome,
            persistence,
        })
    }
}
