//! Reconciliation behavior against recording fakes.
//!
//! The git fake records every operation in order; the hosting fake serves
//! canned pull requests and records mutations. Between them every decision
//! the engine makes is observable without touching a network or a git binary.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use helpsync_core::types::{PrState, PullRequest, Sha};
use helpsync_core::SyncConfig;
use helpsync_engine::{reconcile, ReconcileOutcome, UpgradeTarget};
use helpsync_git::{GitError, GitOptions, Refspec, WorkingCopy};
use helpsync_github::{GithubError, Hosting, PullRequestQuery};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Git fake
// ---------------------------------------------------------------------------

struct FakeGit {
    dir: TempDir,
    ops: Vec<String>,
    branches: Vec<String>,
    tracked_file: String,
    tracked_contents: String,
    commits: Vec<String>,
    fail_deletes: bool,
}

impl FakeGit {
    fn new(branches: &[&str], tracked_file: &str, tracked_contents: &str) -> Self {
        Self {
            dir: TempDir::new().expect("workdir"),
            ops: Vec::new(),
            branches: branches.iter().map(|s| s.to_string()).collect(),
            tracked_file: tracked_file.to_string(),
            tracked_contents: tracked_contents.to_string(),
            commits: Vec::new(),
            fail_deletes: false,
        }
    }

    fn op_index(&self, needle: &str) -> Option<usize> {
        self.ops.iter().position(|op| op.contains(needle))
    }
}

impl WorkingCopy for FakeGit {
    fn init(&mut self, _options: &GitOptions) -> Result<(), GitError> {
        self.ops.push("init".to_string());
        Ok(())
    }

    fn add_remote(&mut self, name: &str, url: &str) -> Result<(), GitError> {
        self.ops.push(format!("remote add {name} {url}"));
        Ok(())
    }

    fn config(&mut self, key: &str, _value: &str) -> Result<(), GitError> {
        self.ops.push(format!("config {key}"));
        Ok(())
    }

    fn fetch(
        &mut self,
        remote: &str,
        branch: Option<&str>,
        options: &GitOptions,
    ) -> Result<(), GitError> {
        let branch = branch.unwrap_or("");
        self.ops
            .push(format!("fetch {remote} {branch} {}", options.to_args().join(" ")));
        Ok(())
    }

    fn checkout(&mut self, target: &str, options: &GitOptions) -> Result<(), GitError> {
        self.ops
            .push(format!("checkout {target} {}", options.to_args().join(" ")));
        // Materialize the tree the engine is about to mutate.
        std::fs::write(self.dir.path().join(&self.tracked_file), &self.tracked_contents)
            .expect("write tracked file");
        Ok(())
    }

    fn commit(&mut self, message: &str, _options: &GitOptions) -> Result<(), GitError> {
        self.ops.push("commit".to_string());
        self.commits.push(message.to_string());
        Ok(())
    }

    fn push(
        &mut self,
        remote: &str,
        refspec: &Refspec,
        options: &GitOptions,
    ) -> Result<(), GitError> {
        let local = refspec.local.clone().unwrap_or_default();
        let args = options.to_args().join(" ");
        if self.fail_deletes && args.contains("--delete") {
            return Err(GitError::Command {
                args: format!("push {args} {remote} {local}"),
                stderr: "remote rejected the deletion".to_string(),
            });
        }
        self.ops.push(format!("push {remote} {local} {args}"));
        Ok(())
    }

    fn remote_branches(&mut self, remote: &str) -> Result<Vec<String>, GitError> {
        self.ops.push(format!("remote_branches {remote}"));
        Ok(self.branches.clone())
    }

    fn current_branch(&mut self) -> Result<String, GitError> {
        Ok("main".to_string())
    }

    fn dir(&self) -> &Path {
        self.dir.path()
    }

    fn destroy(&mut self) -> Result<(), GitError> {
        self.ops.push("destroy".to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Hosting fake
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeHosting {
    /// Canned PRs per `owner:branch` head filter.
    prs_by_head: HashMap<String, Vec<PullRequest>>,
    created: Mutex<Vec<(String, String, String)>>,
    labeled: Mutex<Vec<(u64, Vec<String>)>>,
    comments: Mutex<Vec<(u64, String)>>,
    queried_heads: Mutex<Vec<String>>,
    fail_labels: bool,
    fail_comments: bool,
}

impl FakeHosting {
    fn with_prs(prs: &[(&str, PullRequest)]) -> Self {
        let mut by_head: HashMap<String, Vec<PullRequest>> = HashMap::new();
        for (head, pr) in prs {
            by_head.entry(head.to_string()).or_default().push(pr.clone());
        }
        Self {
            prs_by_head: by_head,
            ..Self::default()
        }
    }

    fn created(&self) -> Vec<(String, String, String)> {
        self.created.lock().expect("created lock").clone()
    }

    fn comments(&self) -> Vec<(u64, String)> {
        self.comments.lock().expect("comments lock").clone()
    }
}

impl Hosting for FakeHosting {
    fn file_contents(&self, _path: &str, _reference: &str) -> Result<String, GithubError> {
        unreachable!("the engine never reads files via the hosting client")
    }

    fn latest_sha(&self, _branch: &str) -> Result<Sha, GithubError> {
        unreachable!("the engine never queries branch tips")
    }

    fn affected_files(&self, _from: &Sha, _to: &Sha) -> Result<Vec<String>, GithubError> {
        unreachable!("the engine never diffs refs")
    }

    fn pull_requests(&self, query: &PullRequestQuery) -> Result<Vec<PullRequest>, GithubError> {
        let head = query.head.clone().unwrap_or_default();
        self.queried_heads.lock().expect("heads lock").push(head.clone());
        Ok(self.prs_by_head.get(&head).cloned().unwrap_or_default())
    }

    fn create_pull_request(
        &self,
        head: &str,
        base: &str,
        title: &str,
    ) -> Result<PullRequest, GithubError> {
        self.created
            .lock()
            .expect("created lock")
            .push((head.to_string(), base.to_string(), title.to_string()));
        Ok(PullRequest {
            number: 99,
            html_url: "https://github.com/your-org/docs-site/pull/99".to_string(),
            title: title.to_string(),
            state: PrState::Open,
            head_ref: head.split(':').next_back().unwrap_or(head).to_string(),
        })
    }

    fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), GithubError> {
        if self.fail_labels {
            return Err(GithubError::Body {
                url: "test://labels".to_string(),
                source: std::io::Error::other("label service down"),
            });
        }
        self.labeled
            .lock()
            .expect("labeled lock")
            .push((number, labels.to_vec()));
        Ok(())
    }

    fn comment(&self, number: u64, body: &str) -> Result<(), GithubError> {
        if self.fail_comments {
            return Err(GithubError::Body {
                url: "test://comments".to_string(),
                source: std::io::Error::other("comment service down"),
            });
        }
        self.comments
            .lock()
            .expect("comments lock")
            .push((number, body.to_string()));
        Ok(())
    }

    fn create_issue(&self, _title: &str, _body: &str) -> Result<u64, GithubError> {
        unreachable!("the engine never files issues")
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const TRACKED: &str =
    r#"{"scripts": {"generate-help-docs": "ts-node script/generate-help-docs.ts aaa1111"}}"#;

fn config() -> SyncConfig {
    let mut config = SyncConfig::starter();
    config.upstream = "your-org/docs-site".parse().expect("repo");
    config.origin = "docsbot/docs-site".parse().expect("repo");
    config.commit_prefix = "Upgrade help pages to ".to_string();
    config.branch_prefix = "automated-help-upgrade".to_string();
    config.labels = vec!["docs".to_string(), "automated".to_string()];
    config
}

fn open_pr(number: u64, head_ref: &str) -> PullRequest {
    let sha = head_ref.rsplit("--").next().unwrap_or(head_ref);
    PullRequest {
        number,
        html_url: format!("https://github.com/your-org/docs-site/pull/{number}"),
        title: format!("Upgrade help pages to {sha}"),
        state: PrState::Open,
        head_ref: head_ref.to_string(),
    }
}

fn titled_pr(number: u64, head_ref: &str, title: &str, state: PrState) -> PullRequest {
    PullRequest {
        number,
        html_url: format!("https://github.com/your-org/docs-site/pull/{number}"),
        title: title.to_string(),
        state,
        head_ref: head_ref.to_string(),
    }
}

fn target<'a>(current: &'a Sha, latest: &'a Sha) -> UpgradeTarget<'a> {
    UpgradeTarget {
        branch: "main",
        current,
        latest,
    }
}

// ---------------------------------------------------------------------------
// Behavior
// ---------------------------------------------------------------------------

#[test]
fn fresh_run_pushes_a_branch_and_opens_a_pull_request() {
    let current = Sha::from("aaa1111");
    let latest = Sha::from("bbb2222");
    let mut git = FakeGit::new(&["main"], "package.json", TRACKED);
    let hosting = FakeHosting::default();

    let outcome = reconcile(&mut git, &hosting, &config(), &target(&current, &latest), false)
        .expect("reconcile");

    match outcome {
        ReconcileOutcome::Submitted {
            pull_request,
            superseded,
            deleted_branches,
        } => {
            assert_eq!(pull_request.number, 99);
            assert!(superseded.is_empty());
            assert!(deleted_branches.is_empty());
        }
        other => panic!("expected Submitted, got {other:?}"),
    }

    let created = hosting.created();
    assert_eq!(
        created,
        vec![(
            "docsbot:automated-help-upgrade--main--bbb2222".to_string(),
            "main".to_string(),
            "Upgrade help pages to bbb2222".to_string(),
        )]
    );

    // The staged tree now records the new ref.
    let contents =
        std::fs::read_to_string(git.dir().join("package.json")).expect("tracked file");
    assert!(contents.contains("bbb2222"));
    assert!(!contents.contains("aaa1111"));

    // Publish order: shallow upstream fetch, branch, commit, unshallow, push.
    let fetch_upstream = git.op_index("fetch upstream main").expect("fetch upstream");
    let checkout = git.op_index("checkout upstream/main").expect("checkout");
    let commit = git.op_index("commit").expect("commit");
    let unshallow = git.op_index("--unshallow").expect("unshallow");
    let push = git.op_index("push origin automated-help-upgrade--main--bbb2222").expect("push");
    assert!(fetch_upstream < checkout && checkout < commit && commit < unshallow && unshallow < push);
    assert!(git.ops[push].contains("--force"));
}

#[test]
fn existing_open_pull_request_short_circuits() {
    let current = Sha::from("aaa1111");
    let latest = Sha::from("bbb2222");
    let branch = "automated-help-upgrade--main--bbb2222";
    let mut git = FakeGit::new(&["main", branch], "package.json", TRACKED);
    let hosting = FakeHosting::with_prs(&[(
        &format!("docsbot:{branch}"),
        open_pr(12, branch),
    )]);

    let outcome = reconcile(&mut git, &hosting, &config(), &target(&current, &latest), false)
        .expect("reconcile");

    match outcome {
        ReconcileOutcome::ExistingPullRequest {
            branch: reported,
            pull_requests,
        } => {
            assert_eq!(reported, branch);
            assert_eq!(pull_requests.len(), 1);
            assert_eq!(pull_requests[0].number, 12);
        }
        other => panic!("expected ExistingPullRequest, got {other:?}"),
    }

    assert!(hosting.created().is_empty(), "no second PR for the same ref");
    assert!(git.op_index("commit").is_none());
    assert!(git.op_index("push").is_none());
}

#[test]
fn stale_branches_are_cleaned_up_and_their_open_prs_superseded() {
    let current = Sha::from("aaa1111");
    let latest = Sha::from("ccc3333");
    let with_pr = "automated-help-upgrade--main--bbb2222";
    let without_pr = "automated-help-upgrade--main--0ld0000";
    let mut git = FakeGit::new(&["main", with_pr, without_pr], "package.json", TRACKED);
    let hosting = FakeHosting::with_prs(&[(
        &format!("docsbot:{with_pr}"),
        open_pr(10, with_pr),
    )]);

    let outcome = reconcile(&mut git, &hosting, &config(), &target(&current, &latest), false)
        .expect("reconcile");

    match outcome {
        ReconcileOutcome::Submitted {
            superseded,
            deleted_branches,
            ..
        } => {
            assert_eq!(superseded, vec![10]);
            assert_eq!(deleted_branches, vec![without_pr.to_string()]);
        }
        other => panic!("expected Submitted, got {other:?}"),
    }

    // Only the PR-less branch is deleted, and before any new work.
    let delete = git.op_index("--delete").expect("delete op");
    assert!(git.ops[delete].contains(without_pr));
    assert!(!git.ops.iter().any(|op| op.contains("--delete") && op.contains(with_pr)));
    let checkout = git.op_index("checkout").expect("checkout");
    assert!(delete < checkout, "cleanup must precede new work");

    // Commit body carries the supersede list.
    assert_eq!(git.commits.len(), 1);
    assert_eq!(
        git.commits[0],
        "Upgrade help pages to ccc3333\n\nCloses #10"
    );

    // The superseded PR is pointed at its replacement but never closed.
    assert_eq!(hosting.comments(), vec![(10, "Superseded by #99.".to_string())]);
}

#[test]
fn closes_lines_are_deduped_in_branch_discovery_order() {
    let current = Sha::from("aaa1111");
    let latest = Sha::from("ddd4444");
    let older = "automated-help-upgrade--main--bbb2222";
    let newer = "automated-help-upgrade--main--ccc3333";
    let mut git = FakeGit::new(&["main", older, newer], "package.json", TRACKED);
    let hosting = FakeHosting::with_prs(&[
        (&format!("docsbot:{older}"), open_pr(12, older)),
        (&format!("docsbot:{older}"), open_pr(7, older)),
        (&format!("docsbot:{newer}"), open_pr(12, newer)),
    ]);

    let outcome = reconcile(&mut git, &hosting, &config(), &target(&current, &latest), false)
        .expect("reconcile");

    assert_eq!(
        git.commits[0],
        "Upgrade help pages to ddd4444\n\nCloses #12\nCloses #7"
    );

    match outcome {
        ReconcileOutcome::Submitted { superseded, .. } => {
            assert_eq!(superseded, vec![12, 7]);
        }
        other => panic!("expected Submitted, got {other:?}"),
    }
    assert_eq!(hosting.comments().len(), 2);
}

#[test]
fn branches_with_only_irrelevant_or_closed_prs_are_obsolete() {
    let current = Sha::from("aaa1111");
    let latest = Sha::from("ccc3333");
    let foreign_title = "automated-help-upgrade--main--bbb2222";
    let closed_only = "automated-help-upgrade--main--0ld0000";
    let mut git = FakeGit::new(&["main", foreign_title, closed_only], "package.json", TRACKED);
    let hosting = FakeHosting::with_prs(&[
        (
            &format!("docsbot:{foreign_title}"),
            titled_pr(20, foreign_title, "Unrelated human PR", PrState::Open),
        ),
        (
            &format!("docsbot:{closed_only}"),
            titled_pr(
                21,
                closed_only,
                "Upgrade help pages to 0ld0000",
                PrState::Closed,
            ),
        ),
    ]);

    let outcome = reconcile(&mut git, &hosting, &config(), &target(&current, &latest), false)
        .expect("reconcile");

    match outcome {
        ReconcileOutcome::Submitted {
            superseded,
            deleted_branches,
            ..
        } => {
            let mut deleted = deleted_branches;
            deleted.sort();
            assert_eq!(
                deleted,
                vec![closed_only.to_string(), foreign_title.to_string()]
            );
            assert!(superseded.is_empty(), "irrelevant/closed PRs are not superseded");
        }
        other => panic!("expected Submitted, got {other:?}"),
    }
    assert!(hosting.comments().is_empty());
}

#[test]
fn non_automation_branches_are_never_touched_or_queried() {
    let current = Sha::from("aaa1111");
    let latest = Sha::from("bbb2222");
    let mut git = FakeGit::new(
        &["main", "release-v3", "automated-help-upgrades-lookalike"],
        "package.json",
        TRACKED,
    );
    let hosting = FakeHosting::default();

    reconcile(&mut git, &hosting, &config(), &target(&current, &latest), false)
        .expect("reconcile");

    assert!(hosting.queried_heads.lock().expect("heads lock").is_empty());
    assert!(git.op_index("--delete").is_none());
}

#[test]
fn label_failure_does_not_fail_the_run() {
    let current = Sha::from("aaa1111");
    let latest = Sha::from("bbb2222");
    let mut git = FakeGit::new(&["main"], "package.json", TRACKED);
    let hosting = FakeHosting {
        fail_labels: true,
        ..FakeHosting::default()
    };

    let outcome = reconcile(&mut git, &hosting, &config(), &target(&current, &latest), false)
        .expect("label failure must not abort");

    match outcome {
        ReconcileOutcome::Submitted { pull_request, .. } => {
            assert_eq!(pull_request.number, 99);
            assert!(!pull_request.html_url.is_empty());
        }
        other => panic!("expected Submitted, got {other:?}"),
    }
}

#[test]
fn comment_failure_does_not_fail_the_run() {
    let current = Sha::from("aaa1111");
    let latest = Sha::from("ccc3333");
    let stale = "automated-help-upgrade--main--bbb2222";
    let mut git = FakeGit::new(&["main", stale], "package.json", TRACKED);
    let hosting = FakeHosting {
        fail_comments: true,
        ..FakeHosting::with_prs(&[(&format!("docsbot:{stale}"), open_pr(10, stale))])
    };

    let outcome = reconcile(&mut git, &hosting, &config(), &target(&current, &latest), false)
        .expect("comment failure must not abort");
    assert!(matches!(outcome, ReconcileOutcome::Submitted { .. }));
}

#[test]
fn delete_failure_blocks_neither_other_deletes_nor_the_upgrade() {
    let current = Sha::from("aaa1111");
    let latest = Sha::from("ccc3333");
    let stale_a = "automated-help-upgrade--main--0ld0000";
    let stale_b = "automated-help-upgrade--main--0ld1111";
    let mut git = FakeGit::new(&["main", stale_a, stale_b], "package.json", TRACKED);
    git.fail_deletes = true;
    let hosting = FakeHosting::default();

    let outcome = reconcile(&mut git, &hosting, &config(), &target(&current, &latest), false)
        .expect("delete failures are best-effort");

    match outcome {
        ReconcileOutcome::Submitted {
            deleted_branches, ..
        } => assert!(deleted_branches.is_empty()),
        other => panic!("expected Submitted, got {other:?}"),
    }
    assert_eq!(hosting.created().len(), 1);
}

#[test]
fn dry_run_reports_without_mutating_anything() {
    let current = Sha::from("aaa1111");
    let latest = Sha::from("ccc3333");
    let with_pr = "automated-help-upgrade--main--bbb2222";
    let without_pr = "automated-help-upgrade--main--0ld0000";
    let mut git = FakeGit::new(&["main", with_pr, without_pr], "package.json", TRACKED);
    let hosting = FakeHosting::with_prs(&[(
        &format!("docsbot:{with_pr}"),
        open_pr(10, with_pr),
    )]);

    let outcome = reconcile(&mut git, &hosting, &config(), &target(&current, &latest), true)
        .expect("dry run");

    match outcome {
        ReconcileOutcome::DryRun {
            branch,
            would_supersede,
            would_delete,
        } => {
            assert_eq!(branch, "automated-help-upgrade--main--ccc3333");
            assert_eq!(would_supersede, vec![10]);
            assert_eq!(would_delete, vec![without_pr.to_string()]);
        }
        other => panic!("expected DryRun, got {other:?}"),
    }

    assert!(git.op_index("--delete").is_none());
    assert!(git.op_index("commit").is_none());
    assert!(git.op_index("push").is_none());
    assert!(hosting.created().is_empty());
    assert!(hosting.comments().is_empty());
}
