//! HTTP client for the game backend.
//!
//! One agent with a cookie store carries the login session; every call goes
//! to the fixed base URL, sends/expects JSON, and fails with a generic
//! `API error: <status>` on any non-2xx response. No retries, no timeouts;
//! callers decide what a failure means.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use ureq::Agent;

use heardle_types::{
    GuessRequest, GuessResponse, Playlist, SkipRequest, SkipResponse, StartGameRequest,
    StartGameResponse, TokenResponse, TrackHit,
};

pub(crate) struct ApiClient {
    base: String,
    agent: Agent,
}

impl ApiClient {
    pub(crate) fn new(server: &str) -> Self {
        // Status handling is ours: read_json turns non-2xx into API errors.
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            base: server.trim_end_matches('/').to_string(),
            agent: Agent::new_with_config(config),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub(crate) fn playlists(&self) -> Result<Vec<Playlist>> {
        let resp = self
            .agent
            .get(&self.url("/api/playlists"))
            .call()
            .context("request /api/playlists")?;
        read_json(resp, "api/playlists")
    }

    pub(crate) fn search(&self, query: &str) -> Result<Vec<TrackHit>> {
        let url = format!(
            "{}/api/search?q={}",
            self.base,
            urlencoding::encode(query)
        );
        let resp = self.agent.get(&url).call().context("request /api/search")?;
        read_json(resp, "api/search")
    }

    pub(crate) fn start_game(&self, req: &StartGameRequest) -> Result<StartGameResponse> {
        let resp = self
            .agent
            .post(&self.url("/api/game/start"))
            .send_json(req)
            .context("request /api/game/start")?;
        read_json(resp, "api/game/start")
    }

    pub(crate) fn submit_guess(&self, req: &GuessRequest) -> Result<GuessResponse> {
        let resp = self
            .agent
            .post(&self.url("/api/game/guess"))
            .send_json(req)
            .context("request /api/game/guess")?;
        read_json(resp, "api/game/guess")
    }

    pub(crate) fn skip(&self, req: &SkipRequest) -> Result<SkipResponse> {
        let resp = self
            .agent
            .post(&self.url("/api/game/skip"))
            .send_json(req)
            .context("request /api/game/skip")?;
        read_json(resp, "api/game/skip")
    }

    pub(crate) fn token(&self) -> Result<TokenResponse> {
        let resp = self
            .agent
            .get(&self.url("/api/token"))
            .call()
            .context("request /api/token")?;
        read_json(resp, "api/token")
    }

    pub(crate) fn logout(&self) -> Result<()> {
        let resp = self
            .agent
            .post(&self.url("/api/logout"))
            .send_empty()
            .context("request /api/logout")?;
        if !resp.status().is_success() {
            return Err(anyhow!("API error: {}", resp.status().as_u16()));
        }
        Ok(())
    }

    /// Fetch an absolute URL (preview audio) into `dest`.
    pub(crate) fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let mut resp = self
            .agent
            .get(url)
            .call()
            .with_context(|| format!("fetch {url}"))?;
        if !resp.status().is_success() {
            return Err(anyhow!("API error: {}", resp.status().as_u16()));
        }
        let mut out = File::create(dest).with_context(|| format!("create {dest:?}"))?;
        io::copy(&mut resp.body_mut().as_reader(), &mut out)
            .with_context(|| format!("write {dest:?}"))?;
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(
    mut resp: ureq::http::Response<ureq::Body>,
    label: &str,
) -> Result<T> {
    if !resp.status().is_success() {
        return Err(anyhow!("API error: {}", resp.status().as_u16()));
    }
    let body = resp
        .body_mut()
        .read_to_string()
        .with_context(|| format!("read /{label} response body"))?;
    serde_json::from_str(&body).with_context(|| format!("decode /{label} response"))
}
