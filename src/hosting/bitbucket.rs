use crate::domain::PullRequestSpec;
use crate::error::{ReleaseError, Result};
use crate::hosting::{CreatedPullRequest, PullRequestHost};
use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://api.bitbucket.org";

/// How requests to the Bitbucket API authenticate
#[derive(Clone, PartialEq, Eq)]
pub enum BitbucketAuth {
    Bearer(String),
    Basic { username: String, password: String },
}

impl std::fmt::Debug for BitbucketAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BitbucketAuth::Bearer(_) => f.write_str("Bearer(***)"),
            BitbucketAuth::Basic { username, .. } => {
                write!(f, "Basic {{ username: {:?}, password: *** }}", username)
            }
        }
    }
}

impl BitbucketAuth {
    /// Pick an authentication mode from the available credentials.
    ///
    /// An access token wins over username + app password.
    pub fn from_credentials(
        access_token: Option<String>,
        username: Option<String>,
        app_password: Option<String>,
    ) -> Result<Self> {
        match (access_token, username, app_password) {
            (Some(token), _, _) if !token.is_empty() => Ok(BitbucketAuth::Bearer(token)),
            (_, Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Ok(BitbucketAuth::Basic { username, password })
            }
            _ => Err(ReleaseError::missing_config(
                "Bitbucket authentication not configured: set BITBUCKET_ACCESS_TOKEN, or BITBUCKET_USERNAME and BITBUCKET_APP_PASSWORD",
            )),
        }
    }
}

#[derive(Serialize)]
struct BranchRef<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct BranchSelector<'a> {
    branch: BranchRef<'a>,
}

#[derive(Serialize)]
struct CreatePullRequestPayload<'a> {
    title: &'a str,
    description: &'a str,
    source: BranchSelector<'a>,
    destination: BranchSelector<'a>,
    close_source_branch: bool,
}

impl<'a> From<&'a PullRequestSpec> for CreatePullRequestPayload<'a> {
    fn from(spec: &'a PullRequestSpec) -> Self {
        CreatePullRequestPayload {
            title: &spec.title,
            description: &spec.description,
            source: BranchSelector {
                branch: BranchRef {
                    name: &spec.source_branch,
                },
            },
            destination: BranchSelector {
                branch: BranchRef {
                    name: &spec.destination_branch,
                },
            },
            close_source_branch: spec.close_source_branch,
        }
    }
}

#[derive(Deserialize)]
struct PullRequestResponse {
    id: Option<u64>,
    links: Option<PullRequestLinks>,
}

#[derive(Deserialize)]
struct PullRequestLinks {
    html: Option<Href>,
}

#[derive(Deserialize)]
struct Href {
    href: Option<String>,
}

/// Bitbucket Cloud REST client for pull request creation
pub struct BitbucketClient {
    client: Client,
    api_base: String,
    workspace: String,
    repo_slug: String,
    auth: BitbucketAuth,
}

impl BitbucketClient {
    pub fn new(
        api_base: impl Into<String>,
        workspace: impl Into<String>,
        repo_slug: impl Into<String>,
        auth: BitbucketAuth,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("git-release-flow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(BitbucketClient {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            workspace: workspace.into(),
            repo_slug: repo_slug.into(),
            auth,
        })
    }

    /// Endpoint that pull requests are POSTed to
    pub fn pull_requests_url(&self) -> String {
        format!(
            "{}/2.0/repositories/{}/{}/pullrequests",
            self.api_base, self.workspace, self.repo_slug
        )
    }
}

/// Turn an HTTP status and body into the adapter result.
///
/// Only 201 counts as success. An unparseable success body still succeeds,
/// just without id and URL.
fn interpret_response(status: u16, body: &str) -> Result<CreatedPullRequest> {
    if status != StatusCode::CREATED.as_u16() {
        return Err(ReleaseError::PullRequestRejected {
            status,
            body: body.to_string(),
        });
    }

    match serde_json::from_str::<PullRequestResponse>(body) {
        Ok(response) => Ok(CreatedPullRequest {
            id: response.id,
            url: response
                .links
                .and_then(|links| links.html)
                .and_then(|html| html.href),
        }),
        Err(e) => {
            warn!("could not parse pull request response: {}", e);
            Ok(CreatedPullRequest::default())
        }
    }
}

impl PullRequestHost for BitbucketClient {
    fn create_pull_request(&self, spec: &PullRequestSpec) -> Result<CreatedPullRequest> {
        let url = self.pull_requests_url();
        debug!("POST {} ({} -> {})", url, spec.source_branch, spec.destination_branch);

        let request = self
            .client
            .post(&url)
            .json(&CreatePullRequestPayload::from(spec));
        let request = match &self.auth {
            BitbucketAuth::Bearer(token) => request.bearer_auth(token),
            BitbucketAuth::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
        };

        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        interpret_response(status, &body)
    }
}
