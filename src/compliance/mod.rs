use std::collections::BTreeMap;

use crate::models::{CheckOutcome, ComplianceReport, InterfaceName};

/// Prefixes an interface name may start with unless overridden
pub const DEFAULT_ALLOWED_PREFIXES: &[&str] = &["to_", "system", "loopback", "lo"];

/// NamingPolicy decides whether a single interface name is acceptable
pub trait NamingPolicy: Send + Sync {
    fn allows(&self, name: &str) -> bool;

    /// Human-readable summary of the rule, used in logs
    fn describe(&self) -> String {
        "custom naming policy".to_string()
    }
}

impl<F> NamingPolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn allows(&self, name: &str) -> bool {
        self(name)
    }
}

/// PrefixPolicy accepts names starting with any of an ordered list of prefixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixPolicy {
    prefixes: Vec<String>,
}

impl PrefixPolicy {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for PrefixPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_PREFIXES.iter().copied())
    }
}

impl NamingPolicy for PrefixPolicy {
    fn allows(&self, name: &str) -> bool {
        self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    fn describe(&self) -> String {
        format!("allowed prefixes: {}", self.prefixes.join(", "))
    }
}

/// Partition interface names by policy. Metadata values are ignored.
///
/// An empty mapping is reported as `NoInterfaces` rather than an empty report.
pub fn check<V>(interfaces: &BTreeMap<InterfaceName, V>, policy: &dyn NamingPolicy) -> CheckOutcome {
    if interfaces.is_empty() {
        return CheckOutcome::NoInterfaces;
    }

    // BTreeMap keys iterate in ascending byte order
    let mut report = ComplianceReport::default();
    for name in interfaces.keys() {
        if policy.allows(name) {
            report.compliant.push(name.clone());
        } else {
            report.non_compliant.push(name.clone());
        }
    }

    tracing::debug!(
        "Checked {} interfaces ({}): {} passed, {} failed",
        report.total(),
        policy.describe(),
        report.passed(),
        report.failed()
    );

    CheckOutcome::Checked(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn interfaces(names: &[&str]) -> BTreeMap<InterfaceName, ()> {
        names.iter().map(|n| (n.to_string(), ())).collect()
    }

    fn checked(outcome: CheckOutcome) -> ComplianceReport {
        match outcome {
            CheckOutcome::Checked(report) => report,
            CheckOutcome::NoInterfaces => panic!("expected a checked report"),
        }
    }

    #[test]
    fn test_mixed_names() {
        let ifaces = interfaces(&["to_core1", "eth0", "loopback1", "system0", "WAN1"]);
        let report = checked(check(&ifaces, &PrefixPolicy::default()));

        assert_eq!(report.compliant, vec!["loopback1", "system0", "to_core1"]);
        assert_eq!(report.non_compliant, vec!["WAN1", "eth0"]);
        assert_eq!(report.total(), 5);
        assert_eq!(report.passed(), 3);
        assert_eq!(report.failed(), 2);
    }

    #[test]
    fn test_empty_mapping_is_no_interfaces() {
        let ifaces = interfaces(&[]);
        assert_eq!(check(&ifaces, &PrefixPolicy::default()), CheckOutcome::NoInterfaces);
    }

    #[test]
    fn test_partition_covers_input() {
        let names = [
            "lo0", "lag-1", "to_pe2", "system", "1/1/c1/1", "Loopback0", "", "to", "systemx", "ge-0/0/0",
        ];
        let ifaces = interfaces(&names);
        let report = checked(check(&ifaces, &PrefixPolicy::default()));

        let compliant: BTreeSet<_> = report.compliant.iter().cloned().collect();
        let non_compliant: BTreeSet<_> = report.non_compliant.iter().cloned().collect();
        let input: BTreeSet<_> = names.iter().map(|n| n.to_string()).collect();

        assert!(compliant.is_disjoint(&non_compliant));
        assert_eq!(&compliant | &non_compliant, input);
        assert_eq!(report.total(), input.len());
    }

    #[test]
    fn test_prefix_rules() {
        let policy = PrefixPolicy::default();
        assert!(policy.allows("to_core1"));
        assert!(policy.allows("system"));
        assert!(policy.allows("loopback42"));
        assert!(policy.allows("lo"));
        // "lo" is a plain prefix, not a whole-word match
        assert!(policy.allows("lo0"));
        assert!(policy.allows("logical-1"));
        assert!(!policy.allows("lag-1"));
        assert!(!policy.allows("to"));
        assert!(!policy.allows("Loopback0"));
        assert!(!policy.allows("eth0"));
        assert!(!policy.allows(""));
    }

    #[test]
    fn test_output_is_sorted() {
        let ifaces = interfaces(&["to_z", "to_a", "zz", "aa", "to_M"]);
        let report = checked(check(&ifaces, &PrefixPolicy::default()));

        assert_eq!(report.compliant, vec!["to_M", "to_a", "to_z"]);
        assert_eq!(report.non_compliant, vec!["aa", "zz"]);
    }

    #[test]
    fn test_closure_policy() {
        let ifaces = interfaces(&["uplink-1", "eth0"]);
        let policy = |name: &str| name.starts_with("uplink-");
        let report = checked(check(&ifaces, &policy));

        assert_eq!(report.compliant, vec!["uplink-1"]);
        assert_eq!(report.non_compliant, vec!["eth0"]);
    }

    #[test]
    fn test_empty_prefix_list_rejects_everything() {
        let ifaces = interfaces(&["system", "to_core"]);
        let policy = PrefixPolicy::new(Vec::<String>::new());
        let report = checked(check(&ifaces, &policy));

        assert!(report.compliant.is_empty());
        assert_eq!(report.failed(), 2);
    }
}
