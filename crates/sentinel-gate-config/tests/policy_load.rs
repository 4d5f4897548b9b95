// crates/sentinel-gate-config/tests/policy_load.rs
// ============================================================================
// Module: Policy Loader Tests
// Description: Compile success paths and all-or-nothing rejection paths.
// Purpose: Validate that only fully valid policy files become rule sets.
// Dependencies: sentinel-gate-config, sentinel-gate-core, tempfile
// ============================================================================

//! ## Overview
//! Exercises [`sentinel_gate_config::PolicyLoader`]: a complete valid policy
//! compiles with the expected rule shapes, while unknown operators, unknown
//! actions, invalid regexes, bad globs, value-type mismatches, and duplicate
//! rule ids each reject the whole file.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io::Write;
use std::time::Duration;

use sentinel_gate_config::DEFAULT_APPROVAL_TIMEOUT;
use sentinel_gate_config::PolicyLoadError;
use sentinel_gate_config::PolicyLoader;
use sentinel_gate_core::Action;
use sentinel_gate_core::MatchMode;
use sentinel_gate_core::RuleId;

// ============================================================================
// SECTION: Helper Functions
// ============================================================================

fn loader() -> PolicyLoader {
    PolicyLoader::default()
}

// ============================================================================
// SECTION: Valid Policies
// ============================================================================

#[test]
fn full_policy_compiles_in_declaration_order() {
    let policy = r#"
rules:
  - id: sql-no-limit
    description: Prevent mass data exfiltration
    target_tool: "query_*"
    target_argument: query
    conditions:
      - operator: missing_limit
    action:
      block:
        reason: Prevent mass data exfiltration
  - id: watch-writes
    target_tool: write_file
    target_argument: path
    match: any
    conditions:
      - operator: contains
        value: /etc/
      - operator: contains
        value: /root/
        ignore_case: true
    action: log
  - id: escalate-deletes
    target_tool: delete_file
    target_argument: path
    action:
      allow_with_approval:
        timeout_secs: 120
        approvers: [oncall]
"#;
    let rules = loader().parse(policy).unwrap();
    assert_eq!(rules.len(), 3);
    assert_eq!(rules.rules[0].id, RuleId::new("sql-no-limit"));
    assert_eq!(rules.rules[1].match_mode, MatchMode::Any);
    assert_eq!(rules.rules[2].action, Action::AllowWithApproval {
        timeout: Duration::from_secs(120),
        approvers: vec!["oncall".to_owned()],
    });
}

#[test]
fn empty_document_compiles_to_allow_all() {
    assert!(loader().parse("rules: []").unwrap().is_empty());
}

#[test]
fn match_mode_defaults_to_all() {
    let policy = r#"
rules:
  - id: r1
    target_tool: tool
    target_argument: arg
    action: allow
"#;
    let rules = loader().parse(policy).unwrap();
    assert_eq!(rules.rules[0].match_mode, MatchMode::All);
    assert!(rules.rules[0].conditions.is_empty());
}

#[test]
fn missing_approval_timeout_takes_loader_default() {
    let policy = r#"
rules:
  - id: r1
    target_tool: tool
    target_argument: arg
    action:
      allow_with_approval: {}
"#;
    let rules = loader().parse(policy).unwrap();
    let Action::AllowWithApproval {
        timeout,
        ref approvers,
    } = rules.rules[0].action
    else {
        panic!("expected approval action");
    };
    assert_eq!(timeout, DEFAULT_APPROVAL_TIMEOUT);
    assert!(approvers.is_empty());
}

#[test]
fn custom_loader_default_applies() {
    let policy = r#"
rules:
  - id: r1
    target_tool: tool
    target_argument: arg
    action:
      allow_with_approval: {}
"#;
    let rules = PolicyLoader::new(Duration::from_secs(42)).parse(policy).unwrap();
    assert_eq!(rules.rules[0].action, Action::AllowWithApproval {
        timeout: Duration::from_secs(42),
        approvers: vec![],
    });
}

#[test]
fn regex_condition_compiles_with_ignore_case() {
    let policy = r#"
rules:
  - id: r1
    target_tool: "*"
    target_argument: query
    conditions:
      - operator: regex
        value: 'drop\s+table'
        ignore_case: true
    action:
      block: {}
"#;
    assert_eq!(loader().parse(policy).unwrap().len(), 1);
}

#[test]
fn load_file_reads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "rules:\n  - id: r1\n    target_tool: tool\n    target_argument: arg\n    action: allow"
    )
    .unwrap();
    let rules = loader().load_file(file.path()).unwrap();
    assert_eq!(rules.len(), 1);
}

#[test]
fn load_file_missing_path_is_io_error() {
    let error = loader().load_file(std::path::Path::new("/nonexistent/policy.yaml")).unwrap_err();
    assert!(matches!(error, PolicyLoadError::Io { .. }));
}

// ============================================================================
// SECTION: Rejection Paths
// ============================================================================

#[test]
fn unknown_operator_is_rejected_at_parse() {
    let policy = r#"
rules:
  - id: r1
    target_tool: tool
    target_argument: arg
    conditions:
      - operator: sounds_like
        value: x
    action: allow
"#;
    assert!(matches!(loader().parse(policy).unwrap_err(), PolicyLoadError::Parse { .. }));
}

#[test]
fn unknown_action_is_rejected_at_parse() {
    let policy = r#"
rules:
  - id: r1
    target_tool: tool
    target_argument: arg
    action: quarantine
"#;
    assert!(matches!(loader().parse(policy).unwrap_err(), PolicyLoadError::Parse { .. }));
}

#[test]
fn unknown_rule_field_is_rejected_at_parse() {
    let policy = r#"
rules:
  - id: r1
    target_tool: tool
    target_argument: arg
    severity: high
    action: allow
"#;
    assert!(matches!(loader().parse(policy).unwrap_err(), PolicyLoadError::Parse { .. }));
}

#[test]
fn invalid_regex_rejects_the_whole_file() {
    let policy = r#"
rules:
  - id: good-rule
    target_tool: tool
    target_argument: arg
    action: allow
  - id: bad-regex
    target_tool: tool
    target_argument: arg
    conditions:
      - operator: regex
        value: '[unclosed('
    action: allow
"#;
    let error = loader().parse(policy).unwrap_err();
    let PolicyLoadError::InvalidRegex {
        rule, ..
    } = error
    else {
        panic!("expected invalid-regex error, got {error}");
    };
    assert_eq!(rule, "bad-regex");
}

#[test]
fn invalid_tool_glob_is_rejected() {
    let policy = r#"
rules:
  - id: bad-glob
    target_tool: "query_[unclosed"
    target_argument: arg
    action: allow
"#;
    assert!(matches!(
        loader().parse(policy).unwrap_err(),
        PolicyLoadError::InvalidToolPattern { .. }
    ));
}

#[test]
fn duplicate_rule_ids_are_rejected() {
    let policy = r#"
rules:
  - id: twice
    target_tool: tool
    target_argument: arg
    action: allow
  - id: twice
    target_tool: other
    target_argument: arg
    action: log
"#;
    let error = loader().parse(policy).unwrap_err();
    let PolicyLoadError::DuplicateRuleId {
        id,
    } = error
    else {
        panic!("expected duplicate-id error, got {error}");
    };
    assert_eq!(id, "twice");
}

#[test]
fn string_operator_without_value_is_rejected() {
    let policy = r#"
rules:
  - id: r1
    target_tool: tool
    target_argument: arg
    conditions:
      - operator: contains
    action: allow
"#;
    assert!(matches!(
        loader().parse(policy).unwrap_err(),
        PolicyLoadError::InvalidCondition { .. }
    ));
}

#[test]
fn numeric_operator_with_string_value_is_rejected() {
    let policy = r#"
rules:
  - id: r1
    target_tool: tool
    target_argument: arg
    conditions:
      - operator: greater_than
        value: ten
    action: allow
"#;
    assert!(matches!(
        loader().parse(policy).unwrap_err(),
        PolicyLoadError::InvalidCondition { .. }
    ));
}

#[test]
fn missing_limit_with_value_is_rejected() {
    let policy = r#"
rules:
  - id: r1
    target_tool: tool
    target_argument: arg
    conditions:
      - operator: missing_limit
        value: anything
    action: allow
"#;
    assert!(matches!(
        loader().parse(policy).unwrap_err(),
        PolicyLoadError::InvalidCondition { .. }
    ));
}
