use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub struct LabDeskClient {
    http: reqwest::Client,
    base_url: String,
}

impl LabDeskClient {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let resp = self
            .http
            .get(self.api_url(path))
            .query(query)
            .send()
            .await
            .context("Failed to connect to server")?;
        handle_response(resp).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let resp = self
            .http
            .post(self.api_url(path))
            .json(body)
            .send()
            .await
            .context("Failed to connect to server")?;
        handle_response(resp).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self
            .http
            .patch(self.api_url(path))
            .json(body)
            .send()
            .await
            .context("Failed to connect to server")?;
        handle_response(resp).await
    }

    /// Status code and body of a root-level probe such as `/healthz`.
    pub async fn probe(&self, path: &str) -> Result<(u16, String)> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to connect to server")?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok((status, body))
    }
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        anyhow::bail!("{}", describe_error(status, &body));
    }

    serde_json::from_str(&body).context("Failed to parse response JSON")
}

/// Renders an error response as one line, preferring field errors over the
/// plain `error` message.
pub fn describe_error(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(errors) = json.get("errors").and_then(|v| v.as_array()) {
            let msgs: Vec<String> = errors
                .iter()
                .filter_map(|e| {
                    let message = e.get("message").and_then(|m| m.as_str())?;
                    Some(match e.get("field").and_then(|f| f.as_str()) {
                        Some(field) if !field.is_empty() => format!("{field}: {message}"),
                        _ => message.to_string(),
                    })
                })
                .collect();
            if !msgs.is_empty() {
                return format!("HTTP {status}: {}", msgs.join("; "));
            }
        }
        if let Some(message) = json.get("error").and_then(|v| v.as_str()) {
            return format!("HTTP {status}: {message}");
        }
    }
    format!("HTTP {status}: {body}")
}
