//! Client for the remote controller that coordinates spectators.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::commands::{parse_commands, Command};
use super::RemoteError;
use crate::game::phase::GamePhase;
use crate::game::state::ServerInfo;

pub trait ControllerClient {
    /// Pending operator commands. The controller clears them once returned.
    fn get_commands(&mut self) -> Result<Vec<Command>, RemoteError>;

    /// Server the controller wants the spectator on, if any.
    fn get_join_server(&mut self) -> Result<Option<ServerInfo>, RemoteError>;

    fn post_current_server(&mut self, server: &ServerInfo) -> Result<(), RemoteError>;

    /// Reports a phase change, with the server that caused it where relevant.
    fn post_phase(&mut self, phase: GamePhase, server: Option<&ServerInfo>) -> Result<(), RemoteError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinServerResponse {
    ip: String,
    game_port: u16,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct ServerBody<'a> {
    ip: &'a str,
    port: u16,
    password: Option<&'a str>,
}

impl<'a> From<&'a ServerInfo> for ServerBody<'a> {
    fn from(server: &'a ServerInfo) -> Self {
        Self {
            ip: &server.ip,
            port: server.port,
            password: server.password.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PhaseBody<'a> {
    phase: GamePhase,
    server: Option<ServerBody<'a>>,
}

/// JSON-over-HTTP controller client.
pub struct HttpControllerClient {
    base_uri: String,
    client: Client,
}

impl HttpControllerClient {
    pub fn new(base_uri: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("auto-spectator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| RemoteError::Client { source })?;
        Ok(Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_uri, path)
    }

    fn get_json(&self, path: &str) -> Result<Value, RemoteError> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| RemoteError::Http { url: url.clone(), source })?;
        if !response.status().is_success() {
            return Err(RemoteError::Status {
                url,
                status: response.status().as_u16(),
            });
        }
        response
            .json()
            .map_err(|source| RemoteError::Http { url, source })
    }

    fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<(), RemoteError> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|source| RemoteError::Http { url: url.clone(), source })?;
        if !response.status().is_success() {
            return Err(RemoteError::Status {
                url,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

/// Interprets the join-server response; `null` or `{}` means no target.
fn parse_join_server(body: Value) -> Result<Option<ServerInfo>, serde_json::Error> {
    if body.is_null() || body.as_object().is_some_and(|map| map.is_empty()) {
        return Ok(None);
    }
    let join: JoinServerResponse = serde_json::from_value(body)?;
    Ok(Some(ServerInfo {
        ip: join.ip,
        port: join.game_port,
        password: join.password.filter(|p| !p.is_empty()),
    }))
}

impl ControllerClient for HttpControllerClient {
    fn get_commands(&mut self) -> Result<Vec<Command>, RemoteError> {
        let body = self.get_json("/commands")?;
        Ok(parse_commands(&body))
    }

    fn get_join_server(&mut self) -> Result<Option<ServerInfo>, RemoteError> {
        let body = self.get_json("/server/join")?;
        parse_join_server(body).map_err(|e| RemoteError::InvalidResponse {
            url: self.url("/server/join"),
            reason: e.to_string(),
        })
    }

    fn post_current_server(&mut self, server: &ServerInfo) -> Result<(), RemoteError> {
        self.post_json("/server/current", &ServerBody::from(server))
    }

    fn post_phase(&mut self, phase: GamePhase, server: Option<&ServerInfo>) -> Result<(), RemoteError> {
        let body = PhaseBody {
            phase,
            server: server.map(ServerBody::from),
        };
        self.post_json("/game/phase", &body)
    }
}
