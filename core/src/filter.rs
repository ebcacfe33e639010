//! Ignore-rule evaluation and system-process classification.
//!
//! Ignore rules are opaque user-supplied strings. A rule is interpreted
//! per-evaluation, in this precedence:
//!
//! 1. empty rule: skipped
//! 2. slash-delimited `/pattern/`: regex
//! 3. contains `^`, `$` or `.*`: regex
//! 4. otherwise: exact string equality
//!
//! Each form is tested against three fields of a record: its port as a
//! string, its command name, and its raw address. A malformed regex makes
//! that one rule inert; it never aborts evaluation of the remaining rules.

use regex::Regex;
use tracing::debug;

use crate::record::PortRecord;

/// OS-internal service processes, hidden when system ports are toggled
/// off and grouped separately by the presentation layer. A command name
/// matches by case-insensitive equality or prefix, which covers suffixed
/// variants of the same daemon (e.g. `mDNSResponderHelper`).
const SYSTEM_PROCESSES: &[&str] = &[
    "rapportd",
    "mDNSResponder",
    "AirPlayXPCHelper",
    "sharingd",
    "bluetoothd",
    "apsd",
    "controlcenter",
    "WiFiAgent",
    "trustd",
    "locationd",
    "identityservicesd",
    "nsurlsessiond",
    "cloudd",
    "bird",
    "coreaudiod",
    "WindowServer",
    "loginwindow",
    "launchd",
    "kernel_task",
    "systemstats",
    "syslogd",
    "UserEventAgent",
    "cfprefsd",
    "distnoted",
    "notifyd",
    "securityd",
    "coreservicesd",
    "powerd",
    "diskarbitrationd",
    "configd",
    "CoreLocationAgent",
    "commerce",
    "akd",
    "AMPLibraryAgent",
    "amsengagementd",
    "amsaccountsd",
    "remindd",
    "CalendarAgent",
    "ContactsAgent",
    "photoanalysisd",
    "photolibraryd",
    "cloudphotod",
    "MusicLibrary",
    "TVLibrary",
    "parsec-fbf",
    "gamecontrollerd",
    "RemoteDesktop",
    "ScreensharingAgent",
    "universalaccessd",
    "AirPlayUIAgent",
    "CoreServicesUIAgent",
];

/// Evaluate one rule against a record.
pub fn rule_matches(record: &PortRecord, rule: &str) -> bool {
    if rule.is_empty() {
        return false;
    }

    let port = record.port.to_string();
    let fields = [port.as_str(), record.command.as_str(), record.raw_address.as_str()];

    let pattern = if rule.len() >= 2 && rule.starts_with('/') && rule.ends_with('/') {
        Some(&rule[1..rule.len() - 1])
    } else if rule.starts_with('^') || rule.ends_with('$') || rule.contains(".*") {
        Some(rule)
    } else {
        None
    };

    match pattern {
        Some(pattern) => match Regex::new(pattern) {
            Ok(re) => fields.iter().any(|f| re.is_match(f)),
            Err(e) => {
                // User-supplied patterns are untrusted input; a bad one is
                // inert rather than fatal.
                debug!(rule, error = %e, "ignoring malformed rule");
                false
            }
        },
        None => fields.contains(&rule),
    }
}

/// True if any rule matches the record (logical OR across rules).
pub fn is_ignored(record: &PortRecord, rules: &[String]) -> bool {
    rules.iter().any(|rule| rule_matches(record, rule))
}

/// Classify a command name as an OS-internal service.
pub fn is_system_process(command: &str) -> bool {
    if command.is_empty() {
        return false;
    }
    let lower = command.to_lowercase();
    SYSTEM_PROCESSES.iter().any(|proc| {
        let proc = proc.to_lowercase();
        lower == proc || lower.starts_with(&proc)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Protocol;

    fn record(port: u16, command: &str) -> PortRecord {
        PortRecord::host(
            port,
            Protocol::Tcp,
            1000,
            Some(command.to_string()),
            format!("127.0.0.1:{}", port),
            None,
        )
    }

    #[test]
    fn test_literal_port_rule() {
        let rec = record(8080, "myapp");
        assert!(rule_matches(&rec, "8080"));
        assert!(!rule_matches(&rec, "8081"));
    }

    #[test]
    fn test_literal_command_rule() {
        let rec = record(8080, "myapp");
        assert!(rule_matches(&rec, "myapp"));
        // Literal rules are equality, not substring.
        assert!(!rule_matches(&rec, "myap"));
    }

    #[test]
    fn test_slash_delimited_regex() {
        let rec = record(3042, "myapp");
        assert!(rule_matches(&rec, r"/^30\d\d$/"));
        assert!(!rule_matches(&record(2999, "myapp"), r"/^30\d\d$/"));
        assert!(!rule_matches(&record(3100, "myapp"), r"/^30\d\d$/"));
    }

    #[test]
    fn test_anchor_heuristic_regex() {
        let rec = record(9999, "com.apple.WebKit");
        assert!(rule_matches(&rec, "^com\\.apple\\."));
        assert!(rule_matches(&rec, "com.*WebKit"));
        assert!(rule_matches(&record(5173, "vite"), "^5173$"));
    }

    #[test]
    fn test_malformed_regex_is_inert() {
        let rec = record(8080, "myapp");
        assert!(!rule_matches(&rec, "/([unbalanced/"));
        // Following rules still evaluate.
        let rules = vec!["/([unbalanced/".to_string(), "8080".to_string()];
        assert!(is_ignored(&rec, &rules));
    }

    #[test]
    fn test_empty_rule_skipped() {
        let rec = record(8080, "myapp");
        assert!(!rule_matches(&rec, ""));
        assert!(!is_ignored(&rec, &[String::new()]));
    }

    #[test]
    fn test_raw_address_field() {
        let rec = record(8080, "myapp");
        assert!(rule_matches(&rec, "127.0.0.1:8080"));
    }

    #[test]
    fn test_or_across_rules() {
        let rec = record(8080, "myapp");
        let rules = vec!["1234".to_string(), "myapp".to_string()];
        assert!(is_ignored(&rec, &rules));
        assert!(!is_ignored(&rec, &["1234".to_string()]));
    }

    #[test]
    fn test_system_classification() {
        assert!(is_system_process("mDNSResponder"));
        // Prefix match covers helper/suffixed variants.
        assert!(is_system_process("mDNSResponderHelper"));
        assert!(is_system_process("LAUNCHD"));
        assert!(!is_system_process("nginx"));
        assert!(!is_system_process(""));
    }
}
