//! HTTP access to the health service.
//!
//! # Design
//! - [`HealthApi`] is the seam between dashboard state and the network; tests
//!   substitute scripted implementations.
//! - Every reply carries an optional rotated credential next to the outcome.
//!   Callers persist it to the shared [`crate::CredentialStore`] whether or
//!   not the request itself succeeded.
//! - A 401 triggers at most one retry, and only when a [`CredentialPrompt`]
//!   supplies a replacement. The replacement is reported as rotated only when
//!   the retry is not rejected as well.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use healthdeck_api_models::{
    ISSUES_PATH, IssuesResponse, MATRIX_PATH, MODELS_QUERY_PARAM, MatrixResponse,
    resolve_issue_path,
};
use reqwest::header::HeaderValue;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::error::{DashboardError, DashboardResult};

/// Header carrying the operator credential.
pub const HEADER_PASSWORD: &str = "x-webui-password";

/// Outcome of one logical request plus any credential rotated along the way.
#[derive(Debug)]
pub struct ApiReply<T> {
    /// Result of the request after any retry.
    pub outcome: DashboardResult<T>,
    /// Credential that replaced the rejected one, if rotation happened.
    pub rotated_credential: Option<String>,
}

impl<T> ApiReply<T> {
    /// Reply without a rotation.
    #[must_use]
    pub const fn plain(outcome: DashboardResult<T>) -> Self {
        Self {
            outcome,
            rotated_credential: None,
        }
    }
}

/// Source of a replacement credential after the service rejects the current one.
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    /// Return a replacement for `rejected`, or `None` to give up.
    async fn replacement(&self, rejected: Option<&str>) -> Option<String>;
}

/// Operations the dashboard needs from the health service.
#[async_trait]
pub trait HealthApi: Send + Sync {
    /// `GET /api/health/matrix?models=<models>`.
    async fn fetch_matrix(
        &self,
        models: &str,
        credential: Option<String>,
    ) -> ApiReply<MatrixResponse>;

    /// `GET /api/issues`.
    async fn fetch_issues(&self, credential: Option<String>) -> ApiReply<IssuesResponse>;

    /// `POST /api/issues/{id}/resolve`; the body is ignored.
    async fn resolve_issue(&self, id: &str, credential: Option<String>) -> ApiReply<()>;
}

/// [`HealthApi`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpHealthApi {
    client: Client,
    base_url: Url,
    prompt: Option<Arc<dyn CredentialPrompt>>,
}

impl fmt::Debug for HttpHealthApi {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpHealthApi")
            .field("base_url", &self.base_url.as_str())
            .field("prompt", &self.prompt.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpHealthApi {
    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(client: Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            prompt: None,
        }
    }

    /// Ask `prompt` for a replacement credential on 401 responses.
    #[must_use]
    pub fn with_prompt(mut self, prompt: Arc<dyn CredentialPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    fn endpoint(&self, operation: &'static str, path: &str) -> DashboardResult<Url> {
        self.base_url
            .join(path)
            .map_err(|source| DashboardError::InvalidUrl {
                operation,
                path: path.to_string(),
                source,
            })
    }

    async fn execute(
        &self,
        operation: &'static str,
        method: &Method,
        url: &Url,
        credential: Option<&str>,
    ) -> DashboardResult<Response> {
        let mut builder = self.client.request(method.clone(), url.clone());
        if let Some(credential) = credential {
            let value = HeaderValue::from_str(credential)
                .map_err(|_| DashboardError::InvalidCredential { operation })?;
            builder = builder.header(HEADER_PASSWORD, value);
        }
        debug!(operation, method = %method, url = %url, "sending request");
        builder.send().await.map_err(|source| DashboardError::Http {
            operation,
            url: url.to_string(),
            source,
        })
    }

    /// Send once, retrying a single time with a prompted credential on 401.
    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        url: &Url,
        credential: Option<String>,
    ) -> ApiReply<Response> {
        let response = match self
            .execute(operation, &method, url, credential.as_deref())
            .await
        {
            Ok(response) => response,
            Err(err) => return ApiReply::plain(Err(err)),
        };
        if response.status() != StatusCode::UNAUTHORIZED {
            return ApiReply::plain(Ok(response));
        }
        let Some(prompt) = &self.prompt else {
            return ApiReply::plain(Ok(response));
        };
        let Some(replacement) = prompt.replacement(credential.as_deref()).await else {
            return ApiReply::plain(Ok(response));
        };

        info!(operation, "credential rejected; retrying with replacement");
        let outcome = self
            .execute(operation, &method, url, Some(&replacement))
            .await;
        let accepted = outcome
            .as_ref()
            .is_ok_and(|response| response.status() != StatusCode::UNAUTHORIZED);
        if !accepted {
            debug!(operation, "replacement credential was not accepted");
        }
        ApiReply {
            outcome,
            rotated_credential: accepted.then_some(replacement),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: DashboardResult<Url>,
        credential: Option<String>,
    ) -> ApiReply<T> {
        let url = match url {
            Ok(url) => url,
            Err(err) => return ApiReply::plain(Err(err)),
        };
        let ApiReply {
            outcome,
            rotated_credential,
        } = self.send(operation, Method::GET, &url, credential).await;
        let outcome = match outcome {
            Ok(response) => decode(operation, &url, response).await,
            Err(err) => Err(err),
        };
        ApiReply {
            outcome,
            rotated_credential,
        }
    }
}

fn ensure_success(
    operation: &'static str,
    url: &Url,
    response: Response,
) -> DashboardResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(DashboardError::HttpStatus {
            operation,
            url: url.to_string(),
            status,
        })
    }
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    url: &Url,
    response: Response,
) -> DashboardResult<T> {
    ensure_success(operation, url, response)?
        .json::<T>()
        .await
        .map_err(|source| DashboardError::Decode {
            operation,
            url: url.to_string(),
            source,
        })
}

#[async_trait]
impl HealthApi for HttpHealthApi {
    async fn fetch_matrix(
        &self,
        models: &str,
        credential: Option<String>,
    ) -> ApiReply<MatrixResponse> {
        const OPERATION: &str = "matrix.load";
        let url = self.endpoint(OPERATION, MATRIX_PATH).map(|mut url| {
            url.query_pairs_mut().append_pair(MODELS_QUERY_PARAM, models);
            url
        });
        self.get_json(OPERATION, url, credential).await
    }

    async fn fetch_issues(&self, credential: Option<String>) -> ApiReply<IssuesResponse> {
        const OPERATION: &str = "issues.load";
        let url = self.endpoint(OPERATION, ISSUES_PATH);
        self.get_json(OPERATION, url, credential).await
    }

    async fn resolve_issue(&self, id: &str, credential: Option<String>) -> ApiReply<()> {
        const OPERATION: &str = "issues.resolve";
        let url = match self.endpoint(OPERATION, &resolve_issue_path(id)) {
            Ok(url) => url,
            Err(err) => return ApiReply::plain(Err(err)),
        };
        let ApiReply {
            outcome,
            rotated_credential,
        } = self.send(OPERATION, Method::POST, &url, credential).await;
        ApiReply {
            outcome: outcome
                .and_then(|response| ensure_success(OPERATION, &url, response))
                .map(drop),
            rotated_credential,
        }
    }
}
