//! Blocking GitHub REST v3 client.
//!
//! One [`GithubClient`] is bound to one repository; the orchestrator builds a
//! second client when it needs to file failure issues against the tracker
//! repository. Calls either resolve or fail — retry policy belongs to the
//! caller.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use helpsync_core::types::{PrState, PullRequest, RepoId, Sha};

use crate::error::GithubError;

/// Production API endpoint; tests point [`GithubClient::with_api_base`] at a
/// local server instead.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = "helpsync";
const RAW_CONTENT: &str = "application/vnd.github.raw";
const JSON_CONTENT: &str = "application/vnd.github+json";

// ---------------------------------------------------------------------------
// Hosting trait
// ---------------------------------------------------------------------------

/// Hosting-provider operations consumed by the detector and the engine.
pub trait Hosting {
    /// Text of `path` at `reference`.
    fn file_contents(&self, path: &str, reference: &str) -> Result<String, GithubError>;

    /// Tip commit of `branch`.
    fn latest_sha(&self, branch: &str) -> Result<Sha, GithubError>;

    /// Paths changed between two refs.
    fn affected_files(&self, from: &Sha, to: &Sha) -> Result<Vec<String>, GithubError>;

    fn pull_requests(&self, query: &PullRequestQuery) -> Result<Vec<PullRequest>, GithubError>;

    fn create_pull_request(
        &self,
        head: &str,
        base: &str,
        title: &str,
    ) -> Result<PullRequest, GithubError>;

    fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), GithubError>;

    fn comment(&self, number: u64, body: &str) -> Result<(), GithubError>;

    /// Returns the created issue number.
    fn create_issue(&self, title: &str, body: &str) -> Result<u64, GithubError>;
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Filters for listing pull requests.
///
/// `state: None` asks the API for every state; callers that only want open
/// requests filter the result (the engine keeps the full records around to
/// classify branches).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestQuery {
    /// `owner:branch` head filter.
    pub head: Option<String>,
    /// Base branch filter.
    pub base: Option<String>,
    pub state: Option<PrState>,
}

impl PullRequestQuery {
    /// PRs whose head is `owner:branch`, any state.
    pub fn with_head(owner: &str, branch: &str) -> Self {
        Self {
            head: Some(format!("{owner}:{branch}")),
            ..Self::default()
        }
    }

    fn to_query_string(&self) -> String {
        let state = match self.state {
            Some(PrState::Open) => "open",
            Some(PrState::Closed) => "closed",
            None => "all",
        };
        let mut query = format!("state={state}&per_page=100");
        if let Some(head) = &self.head {
            query.push_str("&head=");
            query.push_str(head);
        }
        if let Some(base) = &self.base {
            query.push_str("&base=");
            query.push_str(base);
        }
        query
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CommitDto {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CompareDto {
    #[serde(default)]
    files: Vec<FileDto>,
}

#[derive(Debug, Deserialize)]
struct FileDto {
    filename: String,
}

#[derive(Debug, Deserialize)]
struct PullDto {
    number: u64,
    html_url: String,
    title: String,
    state: PrState,
    head: HeadDto,
}

#[derive(Debug, Deserialize)]
struct HeadDto {
    #[serde(rename = "ref")]
    branch: String,
}

#[derive(Debug, Deserialize)]
struct IssueDto {
    number: u64,
}

impl From<PullDto> for PullRequest {
    fn from(dto: PullDto) -> Self {
        PullRequest {
            number: dto.number,
            html_url: dto.html_url,
            title: dto.title,
            state: dto.state,
            head_ref: dto.head.branch,
        }
    }
}

fn parse<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, GithubError> {
    serde_json::from_str(body).map_err(|e| GithubError::Json {
        url: url.to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// GithubClient
// ---------------------------------------------------------------------------

/// [`Hosting`] implementation over `ureq`.
#[derive(Clone)]
pub struct GithubClient {
    agent: ureq::Agent,
    api_base: String,
    repo: RepoId,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(repo: RepoId, token: Option<String>) -> Self {
        Self::with_api_base(repo, token, DEFAULT_API_BASE)
    }

    /// Client against a non-default API base (test servers).
    pub fn with_api_base(repo: RepoId, token: Option<String>, api_base: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo,
            token,
        }
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// `<api_base>/repos/<owner>/<name>/<tail>`
    fn url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{tail}",
            self.api_base, self.repo.owner, self.repo.name
        )
    }

    fn request(&self, method: &str, url: &str, accept: &str) -> ureq::Request {
        let mut req = self
            .agent
            .request(method, url)
            .set("User-Agent", USER_AGENT)
            .set("Accept", accept);
        if let Some(token) = &self.token {
            req = req.set("Authorization", &format!("Bearer {token}"));
        }
        req
    }

    fn get(&self, url: &str, accept: &str) -> Result<String, GithubError> {
        tracing::debug!("GET {url}");
        let response = self
            .request("GET", url, accept)
            .call()
            .map_err(|e| GithubError::Request {
                url: url.to_string(),
                source: Box::new(e),
            })?;
        response.into_string().map_err(|e| GithubError::Body {
            url: url.to_string(),
            source: e,
        })
    }

    fn post(&self, url: &str, body: serde_json::Value) -> Result<String, GithubError> {
        tracing::debug!("POST {url}");
        let response = self
            .request("POST", url, JSON_CONTENT)
            .send_json(body)
            .map_err(|e| GithubError::Request {
                url: url.to_string(),
                source: Box::new(e),
            })?;
        response.into_string().map_err(|e| GithubError::Body {
            url: url.to_string(),
            source: e,
        })
    }
}

impl Hosting for GithubClient {
    fn file_contents(&self, path: &str, reference: &str) -> Result<String, GithubError> {
        let url = self.url(&format!("contents/{path}?ref={reference}"));
        self.get(&url, RAW_CONTENT)
    }

    fn latest_sha(&self, branch: &str) -> Result<Sha, GithubError> {
        let url = self.url(&format!("commits/{branch}"));
        let body = self.get(&url, JSON_CONTENT)?;
        let commit: CommitDto = parse(&url, &body)?;
        Ok(Sha::from(commit.sha))
    }

    fn affected_files(&self, from: &Sha, to: &Sha) -> Result<Vec<String>, GithubError> {
        let url = self.url(&format!("compare/{from}...{to}"));
        let body = self.get(&url, JSON_CONTENT)?;
        let compare: CompareDto = parse(&url, &body)?;
        Ok(compare.files.into_iter().map(|f| f.filename).collect())
    }

    fn pull_requests(&self, query: &PullRequestQuery) -> Result<Vec<PullRequest>, GithubError> {
        let url = self.url(&format!("pulls?{}", query.to_query_string()));
        let body = self.get(&url, JSON_CONTENT)?;
        let pulls: Vec<PullDto> = parse(&url, &body)?;
        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }

    fn create_pull_request(
        &self,
        head: &str,
        base: &str,
        title: &str,
    ) -> Result<PullRequest, GithubError> {
        let url = self.url("pulls");
        let body = self.post(
            &url,
            serde_json::json!({ "title": title, "head": head, "base": base }),
        )?;
        let pull: PullDto = parse(&url, &body)?;
        Ok(pull.into())
    }

    fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), GithubError> {
        let url = self.url(&format!("issues/{number}/labels"));
        self.post(&url, serde_json::json!({ "labels": labels }))?;
        Ok(())
    }

    fn comment(&self, number: u64, body: &str) -> Result<(), GithubError> {
        let url = self.url(&format!("issues/{number}/comments"));
        self.post(&url, serde_json::json!({ "body": body }))?;
        Ok(())
    }

    fn create_issue(&self, title: &str, body: &str) -> Result<u64, GithubError> {
        let url = self.url("issues");
        let response = self.post(&url, serde_json::json!({ "title": title, "body": body }))?;
        let issue: IssueDto = parse(&url, &response)?;
        Ok(issue.number)
    }
}
