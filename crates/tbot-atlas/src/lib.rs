//! Directory service adapter.
//!
//! Talks to the Atlas REST API with a bot JWT. Only two calls are needed:
//! user lookup by id and tag expression resolution.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use tbot_core::{
    domain::{Distribution, User, UserId},
    errors::Error,
    ports::Directory,
    Result,
};

#[derive(Clone, Debug)]
pub struct AtlasClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ResultsPage<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

impl AtlasClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("atlas client build error: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json(resp: reqwest::Response, what: &str) -> Result<Value> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "atlas {what} failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }
        resp.json()
            .await
            .map_err(|e| Error::External(format!("atlas {what} json error: {e}")))
    }
}

fn id_filter(ids: &[UserId]) -> String {
    ids.iter().map(UserId::as_str).collect::<Vec<_>>().join(",")
}

fn parse_users(v: Value) -> Result<Vec<User>> {
    let page: ResultsPage<User> = serde_json::from_value(v)
        .map_err(|e| Error::External(format!("atlas user list malformed: {e}")))?;
    Ok(page.results)
}

fn parse_resolved(v: Value) -> Result<Distribution> {
    let page: ResultsPage<Distribution> = serde_json::from_value(v)
        .map_err(|e| Error::External(format!("atlas tag resolution malformed: {e}")))?;
    page.results
        .into_iter()
        .next()
        .ok_or_else(|| Error::External("atlas tag resolution returned no results".to_string()))
}

#[async_trait]
impl Directory for AtlasClient {
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = ids.len(), "atlas user lookup");

        let resp = self
            .http
            .get(self.url("/v1/directory/user/"))
            .header("Authorization", format!("JWT {}", self.token))
            .query(&[("id_in", id_filter(ids))])
            .send()
            .await
            .map_err(|e| Error::External(format!("atlas request error: {e}")))?;

        parse_users(Self::read_json(resp, "user lookup").await?)
    }

    async fn resolve_tags(&self, expression: &str) -> Result<Distribution> {
        debug!(expression, "atlas tag resolution");

        let resp = self
            .http
            .post(self.url("/v1/tag/resolve/"))
            .header("Authorization", format!("JWT {}", self.token))
            .json(&json!({ "expressions": [expression] }))
            .send()
            .await
            .map_err(|e| Error::External(format!("atlas request error: {e}")))?;

        parse_resolved(Self::read_json(resp, "tag resolution").await?)
    }
}
