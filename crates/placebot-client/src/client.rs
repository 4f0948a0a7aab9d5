//! Authenticated agent sessions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use placebot_core::config::{EndpointsConfig, UserConfig};
use placebot_core::error::{PlacebotError, Result};
use placebot_core::types::{Color, Tile};

use crate::http::{decode_json, send_with_retry, wait_duration};
use crate::{Login, PlaceApi};

const LOGIN_PATH: &str = "/api/login/";
const TIME_PATH: &str = "/api/place/time.json";
const DRAW_PATH: &str = "/api/place/draw.json";
const PIXEL_PATH: &str = "/api/place/pixel.json";

#[derive(Debug, Default, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    json: LoginJson,
}

#[derive(Debug, Default, Deserialize)]
struct LoginJson {
    #[serde(default)]
    data: LoginData,
    #[serde(default)]
    errors: Vec<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoginData {
    #[serde(default)]
    errors: Vec<Vec<String>>,
    #[serde(default)]
    modhash: String,
}

#[derive(Debug, Deserialize)]
struct WaitResponse {
    #[serde(default)]
    wait_seconds: f64,
}

#[derive(Debug, Deserialize)]
struct DrawResponse {
    #[serde(default)]
    message: String,
    #[serde(default)]
    wait_seconds: f64,
}

/// Who last painted a cell, and when.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PixelInfo {
    #[serde(rename = "user_name", default)]
    pub username: String,
    #[serde(default)]
    pub timestamp: f64,
    pub x: i32,
    pub y: i32,
    pub color: Color,
}

/// A logged-in session for one user.
pub struct PlaceClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    modhash: String,
    retry_pause: Duration,
}

impl PlaceClient {
    /// Log in with form credentials and keep the session cookie and modhash.
    pub async fn login(endpoints: &EndpointsConfig, user: &str, pass: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(format!("{} {user}", endpoints.user_agent))
            .build()?;
        let base_url = endpoints.base_url.trim_end_matches('/').to_string();
        let retry_pause = Duration::from_millis(endpoints.retry_pause_ms);

        let request = http
            .post(format!("{base_url}{LOGIN_PATH}{user}"))
            .form(&[("user", user), ("passwd", pass), ("api_type", "json")]);
        let resp: LoginResponse = decode_json(send_with_retry(request, retry_pause).await?).await?;

        let json = resp.json;
        if let Some(err) = json.data.errors.first().or(json.errors.first()) {
            let reason = err.get(1).or(err.first()).cloned().unwrap_or_default();
            return Err(PlacebotError::Auth(format!("{user}: {reason}")));
        }
        if json.data.modhash.is_empty() {
            return Err(PlacebotError::Auth(format!("{user}: could not log in")));
        }

        debug!(user, "Session established");
        Ok(Self {
            http,
            base_url,
            user: user.to_string(),
            modhash: json.data.modhash,
            retry_pause,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{path}", self.base_url))
            .header("x-modhash", &self.modhash)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}{path}", self.base_url))
            .header("x-modhash", &self.modhash)
    }
}

#[async_trait]
impl PlaceApi for PlaceClient {
    async fn wait_time(&self) -> Result<Duration> {
        let resp = send_with_retry(self.get(TIME_PATH), self.retry_pause).await?;
        let body: WaitResponse = decode_json(resp).await?;
        Ok(wait_duration(body.wait_seconds))
    }

    async fn draw(&self, tile: Tile) -> Result<Duration> {
        let form = [
            ("x", tile.x.to_string()),
            ("y", tile.y.to_string()),
            ("color", tile.color.to_string()),
        ];
        let resp = send_with_retry(self.post(DRAW_PATH).form(&form), self.retry_pause).await?;
        let body: DrawResponse = decode_json(resp).await?;

        if !body.message.is_empty() {
            return Err(PlacebotError::Draw(body.message));
        }
        Ok(wait_duration(body.wait_seconds))
    }
}

/// Look up the last write to one cell. Needs no session.
pub async fn fetch_pixel(endpoints: &EndpointsConfig, x: i32, y: i32) -> Result<PixelInfo> {
    let http = reqwest::Client::builder()
        .user_agent(endpoints.user_agent.as_str())
        .build()?;
    let url = format!("{}{PIXEL_PATH}", endpoints.base_url.trim_end_matches('/'));
    let request = http.get(url).query(&[("x", x), ("y", y)]);
    let resp = send_with_retry(request, Duration::from_millis(endpoints.retry_pause_ms)).await?;
    decode_json(resp).await
}

/// [`Login`] backed by the HTTP API.
pub struct HttpLogin {
    endpoints: EndpointsConfig,
}

impl HttpLogin {
    pub fn new(endpoints: EndpointsConfig) -> Self {
        Self { endpoints }
    }
}

#[async_trait]
impl Login for HttpLogin {
    async fn login(&self, user: &UserConfig) -> Result<Arc<dyn PlaceApi>> {
        let pass = user
            .resolve_pass()
            .ok_or_else(|| PlacebotError::Auth(format!("{}: no password configured", user.user)))?;
        let client = PlaceClient::login(&self.endpoints, &user.user, &pass).await?;
        info!(user = %user.user, "Logged in");
        Ok(Arc::new(client))
    }
}
