use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Timelike};
use std::path::PathBuf;

use crate::models::{CheckMode, CheckOutcome, ComplianceReport, ReportPersistence};

const RULE_WIDTH: usize = 70;

fn heavy_rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn light_rule() -> String {
    "-".repeat(RULE_WIDTH)
}

/// Timestamp as printed inside the report body. The fraction is left out
/// when the microseconds are exactly zero.
pub fn display_timestamp(at: &NaiveDateTime) -> String {
    if at.nanosecond() / 1_000 == 0 {
        at.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        at.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

/// Results file name, e.g. "pre-commit-results_20261016_090503.txt"
pub fn results_file_name(mode: CheckMode, at: &NaiveDateTime) -> String {
    format!(
        "{}-commit-results_{}.txt",
        mode.file_prefix(),
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Render the report lines for a mode. A line may start with "\n" to leave a
/// blank line before it.
pub fn render(mode: CheckMode, outcome: &CheckOutcome, at: &NaiveDateTime) -> Vec<String> {
    let mut out = Vec::new();
    out.push(format!("\n{}", heavy_rule()));
    match mode {
        CheckMode::PreCommit => out.push("PRE-COMMIT INTERFACE NAMING VALIDATION".to_string()),
        CheckMode::PostCommit => {
            out.push("SUCCESS: All configuration changes have been applied successfully!".to_string())
        }
    }
    out.push(heavy_rule());
    out.push(format!("Timestamp: {}", display_timestamp(at)));
    if mode == CheckMode::PostCommit {
        out.push("Committed configuration is now active on the router.".to_string());
    }

    match (mode, outcome) {
        (CheckMode::PreCommit, CheckOutcome::Checked(report)) => render_validation(&mut out, report),
        (CheckMode::PostCommit, CheckOutcome::Checked(report)) => render_summary(&mut out, report),
        (CheckMode::PreCommit, CheckOutcome::NoInterfaces) => {
            out.push("\nNo interfaces found in candidate configuration.".to_string())
        }
        (CheckMode::PostCommit, CheckOutcome::NoInterfaces) => {
            out.push("\nNo interfaces found in configuration.".to_string())
        }
    }

    out.push(format!("\n{}\n", heavy_rule()));
    out
}

fn render_validation(out: &mut Vec<String>, report: &ComplianceReport) {
    out.push("\nInterface Validation Details:".to_string());
    out.push(light_rule());
    for (name, passed) in tagged(report) {
        let tag = if passed { "PASS" } else { "FAIL" };
        out.push(format!("  [{}] {}", tag, name));
    }
    out.push(light_rule());
    out.push(format!("Total interfaces: {}", report.total()));
    out.push(format!("Passed: {}", report.passed()));
    out.push(format!("Failed: {}", report.failed()));

    if report.is_compliant() {
        out.push("\nSUCCESS: All interfaces comply with naming convention.".to_string());
    } else {
        out.push("\nERROR: Non-compliant interfaces detected:".to_string());
        for name in &report.non_compliant {
            out.push(format!("  - {}", name));
        }
        out.push("\nCOMMIT ABORTED: Fix interface naming convention before committing.".to_string());
    }
}

fn render_summary(out: &mut Vec<String>, report: &ComplianceReport) {
    out.push("\nInterface Summary (Naming Convention Compliance):".to_string());
    out.push(light_rule());
    for (name, passed) in tagged(report) {
        let tag = if passed { "OK" } else { "FAIL" };
        out.push(format!("  [{}] {}", tag, name));
    }
    out.push(light_rule());
    out.push(format!("Total compliant interfaces: {}", report.passed()));
    out.push(format!("Total non-compliant interfaces: {}", report.failed()));
}

/// All interfaces in one sorted sequence, tagged with their verdict
fn tagged(report: &ComplianceReport) -> Vec<(&str, bool)> {
    let mut all: Vec<(&str, bool)> = report
        .compliant
        .iter()
        .map(|n| (n.as_str(), true))
        .chain(report.non_compliant.iter().map(|n| (n.as_str(), false)))
        .collect();
    all.sort_by(|a, b| a.0.cmp(b.0));
    all
}

/// Join report lines into the text written to storage
pub fn to_text(lines: &[String]) -> String {
    let mut text = String::new();
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
    text
}

/// Print the report to stdout
pub fn emit(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

/// ResultsStore is somewhere a rendered report can be written
#[async_trait::async_trait]
pub trait ResultsStore: Send + Sync {
    /// Where a file of this name ends up, for logs and summaries
    fn location(&self, file_name: &str) -> String;

    async fn write(&self, file_name: &str, contents: &str) -> Result<()>;
}

/// LocalDir writes reports into a directory on this host
pub struct LocalDir {
    dir: PathBuf,
}

impl LocalDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl ResultsStore for LocalDir {
    fn location(&self, file_name: &str) -> String {
        self.dir.join(file_name).display().to_string()
    }

    async fn write(&self, file_name: &str, contents: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create results dir {}", self.dir.display()))?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Best-effort write. A failure is logged and reported, never raised.
pub async fn persist(store: &dyn ResultsStore, file_name: &str, contents: &str) -> ReportPersistence {
    let location = store.location(file_name);
    match store.write(file_name, contents).await {
        Ok(()) => {
            tracing::info!("Report written to {}", location);
            ReportPersistence::Persisted { location }
        }
        Err(e) => {
            tracing::warn!("Report not persisted to {}: {:#}", location, e);
            ReportPersistence::NotPersisted {
                location,
                reason: format!("{:#}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_micro_opt(9, 5, 3, 250_000)
            .unwrap()
    }

    fn mixed() -> CheckOutcome {
        CheckOutcome::Checked(ComplianceReport {
            compliant: vec!["loopback1".into(), "system0".into(), "to_core1".into()],
            non_compliant: vec!["WAN1".into(), "eth0".into()],
        })
    }

    fn clean() -> CheckOutcome {
        CheckOutcome::Checked(ComplianceReport {
            compliant: vec!["system".into(), "to_pe1".into()],
            non_compliant: vec![],
        })
    }

    #[test]
    fn test_results_file_name() {
        assert_eq!(
            results_file_name(CheckMode::PreCommit, &at()),
            "pre-commit-results_20261016_090503.txt"
        );
        assert_eq!(
            results_file_name(CheckMode::PostCommit, &at()),
            "post-commit-results_20261016_090503.txt"
        );
    }

    #[test]
    fn test_display_timestamp() {
        assert_eq!(display_timestamp(&at()), "2026-10-16 09:05:03.250000");
    }

    #[test]
    fn test_display_timestamp_whole_second() {
        let whole = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, 5, 3)
            .unwrap();
        assert_eq!(display_timestamp(&whole), "2026-10-16 09:05:03");

        let sub_micro = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_nano_opt(9, 5, 3, 999)
            .unwrap();
        assert_eq!(display_timestamp(&sub_micro), "2026-10-16 09:05:03");
    }

    #[test]
    fn test_pre_commit_with_failures() {
        let lines = render(CheckMode::PreCommit, &mixed(), &at());
        let rule = "=".repeat(70);
        let dash = "-".repeat(70);

        let expected = vec![
            format!("\n{}", rule),
            "PRE-COMMIT INTERFACE NAMING VALIDATION".to_string(),
            rule.clone(),
            "Timestamp: 2026-10-16 09:05:03.250000".to_string(),
            "\nInterface Validation Details:".to_string(),
            dash.clone(),
            "  [FAIL] WAN1".to_string(),
            "  [FAIL] eth0".to_string(),
            "  [PASS] loopback1".to_string(),
            "  [PASS] system0".to_string(),
            "  [PASS] to_core1".to_string(),
            dash,
            "Total interfaces: 5".to_string(),
            "Passed: 3".to_string(),
            "Failed: 2".to_string(),
            "\nERROR: Non-compliant interfaces detected:".to_string(),
            "  - WAN1".to_string(),
            "  - eth0".to_string(),
            "\nCOMMIT ABORTED: Fix interface naming convention before committing.".to_string(),
            format!("\n{}\n", rule),
        ];
        assert_eq!(lines, expected);
    }

    #[test]
    fn test_pre_commit_clean() {
        let lines = render(CheckMode::PreCommit, &clean(), &at());
        assert!(lines.contains(&"\nSUCCESS: All interfaces comply with naming convention.".to_string()));
        assert!(!lines.iter().any(|l| l.contains("COMMIT ABORTED")));
        assert!(!lines.iter().any(|l| l.contains("[FAIL]")));
    }

    #[test]
    fn test_post_commit_summary() {
        let lines = render(CheckMode::PostCommit, &mixed(), &at());

        assert_eq!(lines[1], "SUCCESS: All configuration changes have been applied successfully!");
        assert_eq!(lines[4], "Committed configuration is now active on the router.");
        assert_eq!(lines[5], "\nInterface Summary (Naming Convention Compliance):");
        assert_eq!(lines[7], "  [FAIL] WAN1");
        assert_eq!(lines[9], "  [OK] loopback1");
        assert!(lines.contains(&"Total compliant interfaces: 3".to_string()));
        assert!(lines.contains(&"Total non-compliant interfaces: 2".to_string()));
        assert!(!lines.iter().any(|l| l.contains("COMMIT ABORTED") || l.contains("[PASS]")));
    }

    #[test]
    fn test_no_interfaces_has_no_counts() {
        let pre = render(CheckMode::PreCommit, &CheckOutcome::NoInterfaces, &at());
        assert!(pre.contains(&"\nNo interfaces found in candidate configuration.".to_string()));
        assert!(!pre.iter().any(|l| l.starts_with("Total") || l.starts_with("Passed")));

        let post = render(CheckMode::PostCommit, &CheckOutcome::NoInterfaces, &at());
        assert!(post.contains(&"\nNo interfaces found in configuration.".to_string()));
        assert!(!post.iter().any(|l| l.starts_with("Total")));
    }

    #[test]
    fn test_to_text() {
        let lines = vec!["\nA".to_string(), "B".to_string()];
        assert_eq!(to_text(&lines), "\nA\nB\n");
    }

    #[tokio::test]
    async fn test_persist_local_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDir::new(dir.path().join("results"));

        let outcome = persist(&store, "pre-commit-results_x.txt", "body\n").await;
        assert!(outcome.is_persisted());

        let written = std::fs::read_to_string(dir.path().join("results/pre-commit-results_x.txt")).unwrap();
        assert_eq!(written, "body\n");
    }

    #[tokio::test]
    async fn test_persist_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the results directory should be
        let blocker = dir.path().join("results");
        std::fs::write(&blocker, "").unwrap();
        let store = LocalDir::new(&blocker);

        match persist(&store, "post-commit-results_x.txt", "body\n").await {
            ReportPersistence::NotPersisted { location, reason } => {
                assert!(location.ends_with("post-commit-results_x.txt"));
                assert!(!reason.is_empty());
            }
            other => panic!("expected NotPersisted, got {:?}", other),
        }
    }
}
