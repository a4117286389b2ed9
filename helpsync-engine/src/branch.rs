//! Automation branch naming.
//!
//! Branch names are derived deterministically so an upgrade target maps to
//! exactly one branch: `<prefix>--<target_branch>--<ref>`. Only names under
//! the prefix are ours; everything else on the origin remote is never
//! touched.

use helpsync_core::types::Sha;

/// `<prefix>--<target_branch>--<ref>`
pub fn automation_branch_name(prefix: &str, target_branch: &str, latest: &Sha) -> String {
    format!("{prefix}--{target_branch}--{latest}")
}

/// Whether `name` was created by this automation.
pub fn is_automation_branch(prefix: &str, name: &str) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with("--"))
}
