//! Client for the stream output, via an obs-websocket HTTP bridge.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::RemoteError;

pub trait StreamClient {
    fn is_active(&mut self) -> Result<bool, RemoteError>;

    fn start(&mut self) -> Result<(), RemoteError>;

    fn stop(&mut self) -> Result<(), RemoteError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamStatus {
    output_active: bool,
}

pub struct HttpStreamClient {
    base_uri: String,
    client: Client,
}

impl HttpStreamClient {
    pub fn new(base_uri: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| RemoteError::Client { source })?;
        Ok(Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn call(&self, request: &str) -> Result<reqwest::blocking::Response, RemoteError> {
        let url = format!("{}/call/{}", self.base_uri, request);
        let response = self
            .client
            .post(&url)
            .json(&json!({}))
            .send()
            .map_err(|source| RemoteError::Http { url: url.clone(), source })?;
        if !response.status().is_success() {
            return Err(RemoteError::Status {
                url,
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}

impl StreamClient for HttpStreamClient {
    fn is_active(&mut self) -> Result<bool, RemoteError> {
        let url = format!("{}/call/GetStreamStatus", self.base_uri);
        let status: StreamStatus = self
            .call("GetStreamStatus")?
            .json()
            .map_err(|source| RemoteError::Http { url, source })?;
        Ok(status.output_active)
    }

    fn start(&mut self) -> Result<(), RemoteError> {
        self.call("StartStream").map(|_| ())
    }

    fn stop(&mut self) -> Result<(), RemoteError> {
        self.call("StopStream").map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_status_shape() {
        let status: StreamStatus =
            serde_json::from_str(r#"{ "outputActive": true, "outputDuration": 1200 }"#).unwrap();
        assert!(status.output_active);
    }
}
