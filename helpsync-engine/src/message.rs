//! Commit subject and body construction.

use helpsync_core::types::Sha;

/// Commit subject (and PR title): the fixed prefix plus the abbreviated ref.
pub fn commit_subject(commit_prefix: &str, latest: &Sha) -> String {
    format!("{commit_prefix}{latest}")
}

/// Full commit message: subject, then one `Closes #N` line per superseded
/// pull request. Duplicates collapse to the first occurrence so the order
/// stays the branch discovery order.
pub fn commit_message(subject: &str, superseded: &[u64]) -> String {
    let mut seen = Vec::new();
    for number in superseded {
        if !seen.contains(number) {
            seen.push(*number);
        }
    }

    if seen.is_empty() {
        return subject.to_string();
    }

    let closes: Vec<String> = seen.iter().map(|n| format!("Closes #{n}")).collect();
    format!("{subject}\n\n{}", closes.join("\n"))
}
