//! Remote judging through a Judge0 API
//!
//! Submissions are posted with `wait=true` and base64-encoded fields, then the
//! result is fetched by token. Judge0 status ids are mapped onto the same
//! verdicts the local pipeline produces.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use crate::backend::ExecutionBackend;
use crate::config::Judge0Config;
use crate::process::Termination;
use crate::registry::LanguageRegistry;
use crate::runner::validate;
use crate::types::ExecutionRequest;
use crate::verdict::{Judgement, Verdict};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_millis(500);
const POLL_ATTEMPTS: usize = 20;

// Judge0 status ids
const STATUS_IN_QUEUE: u32 = 1;
const STATUS_PROCESSING: u32 = 2;
const STATUS_ACCEPTED: u32 = 3;
const STATUS_WRONG_ANSWER: u32 = 4;
const STATUS_TIME_LIMIT: u32 = 5;
const STATUS_COMPILATION_ERROR: u32 = 6;
const STATUS_RUNTIME_FIRST: u32 = 7;
const STATUS_RUNTIME_LAST: u32 = 12;

#[derive(Debug, Error)]
pub enum Judge0Error {
    #[error("judge0 request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("judge0 returned invalid base64 in '{field}': {source}")]
    Decode {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("submission {0} still pending after polling")]
    Pending(String),

    #[error("language '{0}' has no judge0_id configured")]
    NoLanguageId(String),
}

/// Body of `POST /submissions`
#[derive(Debug, Serialize)]
struct NewSubmission {
    source_code: String,
    language_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdin: Option<String>,
    cpu_time_limit: f64,
    memory_limit: u64,
}

#[derive(Debug, Deserialize)]
struct SubmissionToken {
    token: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Status {
    id: u32,
    #[serde(default)]
    description: String,
}

/// Body of `GET /submissions/{token}`
#[derive(Debug, Clone, Deserialize)]
struct Submission {
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    compile_output: Option<String>,
    status: Status,
    /// CPU seconds as a decimal string, e.g. "0.012"
    #[serde(default)]
    time: Option<String>,
}

/// Forwards submissions to a Judge0 instance
#[derive(Debug, Clone)]
pub struct Judge0Backend {
    client: reqwest::Client,
    config: Judge0Config,
    registry: LanguageRegistry,
}

impl Judge0Backend {
    pub fn new(config: Judge0Config, registry: LanguageRegistry) -> Result<Self, Judge0Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            config,
            registry,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.url.trim_end_matches('/'))
    }

    fn with_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = match self.config.api_key {
            Some(ref key) => request.header("X-RapidAPI-Key", key),
            None => request,
        };
        match self.config.host {
            Some(ref host) => request.header("X-RapidAPI-Host", host),
            None => request,
        }
    }

    #[instrument(skip(self, request))]
    async fn submit(&self, request: &ExecutionRequest, language_id: u32) -> Result<String, Judge0Error> {
        let body = new_submission(request, language_id, &self.config);
        let token: SubmissionToken = self
            .with_headers(
                self.client
                    .post(self.url("/submissions?base64_encoded=true&wait=true"))
                    .json(&body),
            )
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(token = %token.token, "submission accepted");
        Ok(token.token)
    }

    /// Fetch the result, polling while Judge0 still reports it queued
    #[instrument(skip(self))]
    async fn fetch(&self, token: &str) -> Result<Submission, Judge0Error> {
        let url = self.url(&format!("/submissions/{token}?base64_encoded=true"));
        for attempt in 0..POLL_ATTEMPTS {
            let submission: Submission = self
                .with_headers(self.client.get(&url))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            if !matches!(submission.status.id, STATUS_IN_QUEUE | STATUS_PROCESSING) {
                return Ok(submission);
            }

            debug!(attempt, "submission still pending");
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        Err(Judge0Error::Pending(token.to_owned()))
    }

    async fn judge_remote(&self, request: &ExecutionRequest, language_id: u32) -> Result<Judgement, Judge0Error> {
        let token = self.submit(request, language_id).await?;
        let submission = self.fetch(&token).await?;
        map_submission(&submission, self.config.cpu_time_limit)
    }
}

#[async_trait]
impl ExecutionBackend for Judge0Backend {
    fn name(&self) -> &'static str {
        "judge0"
    }

    fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    async fn judge(&self, request: ExecutionRequest) -> Judgement {
        let language = match validate(&request, &self.registry) {
            Ok(language) => language,
            Err(verdict) => return Judgement::early(verdict),
        };

        let Some(language_id) = language.judge0_id else {
            warn!(error = %Judge0Error::NoLanguageId(request.language.clone()), "cannot forward submission");
            return Judgement::early(Verdict::UnsupportedLanguage {
                language: request.language,
            });
        };

        match self.judge_remote(&request, language_id).await {
            Ok(judgement) => judgement,
            Err(e) => {
                error!(error = %e, "remote judging failed");
                Judgement::early(Verdict::SystemError)
            }
        }
    }
}

fn new_submission(request: &ExecutionRequest, language_id: u32, config: &Judge0Config) -> NewSubmission {
    NewSubmission {
        source_code: STANDARD.encode(&request.code),
        language_id,
        stdin: (!request.input.is_empty()).then(|| STANDARD.encode(&request.input)),
        cpu_time_limit: config.cpu_time_limit,
        memory_limit: config.memory_limit,
    }
}

/// Decode a base64 field; Judge0 wraps long values across lines
fn decode_field(field: &'static str, value: Option<&str>) -> Result<String, Judge0Error> {
    let Some(value) = value else {
        return Ok(String::new());
    };
    let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|source| Judge0Error::Decode { field, source })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn parse_time(time: Option<&str>) -> Duration {
    time.and_then(|t| t.trim().parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or_default()
}

/// "Runtime Error (SIGSEGV)" -> "SIGSEGV"
fn runtime_detail(description: &str) -> String {
    description
        .split_once('(')
        .and_then(|(_, rest)| rest.strip_suffix(')'))
        .unwrap_or(description)
        .to_owned()
}

fn map_submission(submission: &Submission, cpu_time_limit: f64) -> Result<Judgement, Judge0Error> {
    let time = parse_time(submission.time.as_deref());
    let status = &submission.status;

    let judgement = match status.id {
        STATUS_ACCEPTED | STATUS_WRONG_ANSWER => Judgement::new(
            Verdict::Success {
                stdout: decode_field("stdout", submission.stdout.as_deref())?,
            },
            time,
        ),
        STATUS_TIME_LIMIT => {
            let limit = Duration::try_from_secs_f64(cpu_time_limit).unwrap_or_default();
            Judgement::new(Verdict::TimeLimitExceeded { limit }, limit)
        }
        STATUS_COMPILATION_ERROR => Judgement::early(Verdict::CompileError {
            diagnostics: decode_field("compile_output", submission.compile_output.as_deref())?,
        }),
        STATUS_RUNTIME_FIRST..=STATUS_RUNTIME_LAST => Judgement::new(
            Verdict::RuntimeError {
                stderr: decode_field("stderr", submission.stderr.as_deref())?,
                termination: Termination::Reported(runtime_detail(&status.description)),
            },
            time,
        ),
        _ => {
            error!(status = status.id, description = %status.description, "judge0 reported a system fault");
            Judgement::early(Verdict::SystemError)
        }
    };
    Ok(judgement)
}
