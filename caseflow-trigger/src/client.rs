use std::thread::sleep;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use caseflow_core::config::JenkinsConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::best_effort::best_effort;
use crate::error::{from_ureq, read_body, TriggerError};
use crate::normalize::{normalize_url, queue_item_id};

/// Parameters of one build request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerRequest {
    pub script_paths: Vec<String>,
    pub marker: Option<String>,
}

impl TriggerRequest {
    /// Build a request from a comma-separated list of script paths.
    /// Blank entries are dropped.
    pub fn from_csv(scripts: &str, marker: Option<String>) -> Self {
        let script_paths = scripts
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            script_paths,
            marker: marker.filter(|m| !m.trim().is_empty()),
        }
    }

    fn form(&self) -> [(&'static str, String); 2] {
        [
            ("SCRIPT_PATHS", self.script_paths.join(",")),
            ("MARKER", self.marker.clone().unwrap_or_default()),
        ]
    }
}

/// A build as reported by Jenkins, URL already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildRef {
    pub number: u64,
    pub url: String,
}

/// Result of a successful trigger. Every enrichment field is `None` when
/// the corresponding lookup failed or was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerOutcome {
    pub status: u16,
    pub job: String,
    pub queue_url: Option<String>,
    pub queue_id: Option<u64>,
    pub build_url: Option<String>,
    pub build_number: Option<u64>,
    pub latest_build: Option<BuildRef>,
}

impl TriggerOutcome {
    fn bare(status: u16, job: &str) -> Self {
        Self {
            status,
            job: job.to_string(),
            queue_url: None,
            queue_id: None,
            build_url: None,
            build_number: None,
            latest_build: None,
        }
    }
}

/// Result of [`JenkinsClient::check_connection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Crumb {
    crumb_request_field: String,
    crumb: String,
}

#[derive(Debug, Deserialize)]
struct QueueItem {
    #[serde(default)]
    cancelled: bool,
    executable: Option<Executable>,
}

#[derive(Debug, Deserialize)]
struct Executable {
    number: Option<u64>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LastBuild {
    number: u64,
    url: String,
}

/// Blocking Jenkins client. One agent per client, every call bounded by the
/// configured timeout.
pub struct JenkinsClient {
    agent: ureq::Agent,
    base: String,
    job: String,
    auth: String,
    queue_poll_attempts: u32,
    queue_poll_interval: Duration,
}

impl JenkinsClient {
    /// Fails with [`TriggerError::Config`] when the base URL is invalid or
    /// no API token is configured. No network traffic happens here.
    pub fn from_config(config: &JenkinsConfig) -> Result<Self, TriggerError> {
        let base = config.base()?;
        let token = config.token()?;
        let auth = format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", config.user, token))
        );
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout())
            .redirects(0)
            .build();

        Ok(Self {
            agent,
            base,
            job: config.job.clone(),
            auth,
            queue_poll_attempts: config.queue_poll_attempts,
            queue_poll_interval: config.queue_poll_interval(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    /// Request one parameterized build of the configured job.
    ///
    /// `201` is success with best-effort queue and latest-build lookups.
    /// `200` is success without them. Any other status is
    /// [`TriggerError::Rejected`].
    pub fn trigger(&self, request: &TriggerRequest) -> Result<TriggerOutcome, TriggerError> {
        let crumb = best_effort("fetch crumb", || self.fetch_crumb());

        let url = format!("{}/job/{}/buildWithParameters", self.base, self.job);
        let mut post = self.agent.post(&url).set("Authorization", &self.auth);
        if let Some(crumb) = &crumb {
            post = post.set(&crumb.crumb_request_field, &crumb.crumb);
        }

        let form = request.form();
        let pairs: Vec<(&str, &str)> = form.iter().map(|(k, v)| (*k, v.as_str())).collect();
        tracing::info!(
            job = %self.job,
            scripts = request.script_paths.len(),
            marker = request.marker.as_deref().unwrap_or(""),
            "requesting build"
        );
        let response = post.send_form(&pairs).map_err(|e| from_ureq(&url, e))?;

        match response.status() {
            201 => {
                let location = response.header("Location").map(str::to_string);
                Ok(self.enrich(location))
            }
            200 => {
                tracing::info!(job = %self.job, "build accepted (200)");
                Ok(TriggerOutcome::bare(200, &self.job))
            }
            status => Err(TriggerError::Rejected {
                url,
                status,
                body: read_body(response),
            }),
        }
    }

    /// Authenticated `GET {base}/api/json`. Never fails; the verdict and a
    /// human-readable reason are in the returned status.
    pub fn check_connection(&self) -> ConnectionStatus {
        let url = format!("{}/api/json", self.base);
        match self.get(&url) {
            Ok(_) => ConnectionStatus {
                connected: true,
                message: "Jenkins connection successful".to_string(),
            },
            Err(TriggerError::Rejected { status, .. }) => ConnectionStatus {
                connected: false,
                message: format!("Connection failed: {status}"),
            },
            Err(err) => ConnectionStatus {
                connected: false,
                message: format!("Connection error: {err}"),
            },
        }
    }

    fn enrich(&self, location: Option<String>) -> TriggerOutcome {
        let mut outcome = TriggerOutcome::bare(201, &self.job);

        if let Some(location) = location {
            let queue_url = normalize_url(&location, &self.base);
            outcome.queue_id = queue_item_id(&queue_url);
            tracing::info!(queue = %queue_url, "build queued");

            if let Some(Some(executable)) =
                best_effort("poll queue item", || self.poll_queue(&queue_url))
            {
                outcome.build_number = executable.number;
                outcome.build_url = executable.url;
            }
            outcome.queue_url = Some(queue_url);
        } else {
            tracing::warn!("201 without Location header; queue item unknown");
        }

        outcome.latest_build = best_effort("fetch last build", || self.last_build());
        outcome
    }

    fn fetch_crumb(&self) -> Result<Crumb, TriggerError> {
        let url = format!("{}/crumbIssuer/api/json", self.base);
        self.get_json(&url)
    }

    /// Poll a queue item until it has an executable. `Ok(None)` when it is
    /// still waiting after the configured number of attempts.
    fn poll_queue(&self, queue_url: &str) -> Result<Option<Executable>, TriggerError> {
        let api = if queue_url.ends_with('/') {
            format!("{queue_url}api/json")
        } else {
            format!("{queue_url}/api/json")
        };

        for attempt in 1..=self.queue_poll_attempts {
            let item: QueueItem = self.get_json(&api)?;
            if item.cancelled {
                return Err(TriggerError::QueueCancelled {
                    url: queue_url.to_string(),
                });
            }
            if let Some(mut executable) = item.executable {
                if let Some(url) = executable.url.take() {
                    executable.url = Some(normalize_url(&url, &self.base));
                    return Ok(Some(executable));
                }
            }
            tracing::debug!(attempt, queue = %queue_url, "queue item not started yet");
            if attempt < self.queue_poll_attempts {
                sleep(self.queue_poll_interval);
            }
        }
        Ok(None)
    }

    fn last_build(&self) -> Result<BuildRef, TriggerError> {
        let url = format!("{}/job/{}/lastBuild/api/json", self.base, self.job);
        let build: LastBuild = self.get_json(&url)?;
        Ok(BuildRef {
            number: build.number,
            url: normalize_url(&build.url, &self.base),
        })
    }

    fn get(&self, url: &str) -> Result<ureq::Response, TriggerError> {
        tracing::debug!(url, "GET");
        self.agent
            .get(url)
            .set("Authorization", &self.auth)
            .call()
            .map_err(|e| from_ureq(url, e))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, TriggerError> {
        let response = self.get(url)?;
        response.into_json().map_err(|e| TriggerError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
