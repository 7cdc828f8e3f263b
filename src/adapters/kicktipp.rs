//! Authenticated access to the prediction site.
//!
//! The session logs in once and then attaches the returned cookies to every
//! page request. Redirects are never followed: a redirect on a page fetch
//! usually means the session is not logged in, which is reported as a
//! non-200 status.

use reqwest::header::{COOKIE, REFERER, USER_AGENT};
use reqwest::{redirect, Client};
use tracing::{debug, info, warn};

use crate::config::SiteConfig;
use crate::error::{Result, TippError};
use crate::secrets::Secret;

/// Cookies handed out by the login endpoint
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionToken {
    cookies: Vec<(String, String)>,
}

impl SessionToken {
    pub fn new(cookies: Vec<(String, String)>) -> Self {
        Self { cookies }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn cookie_names(&self) -> impl Iterator<Item = &str> {
        self.cookies.iter().map(|(name, _)| name.as_str())
    }

    /// Value for a `Cookie` request header
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("cookies", &self.cookie_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Path of the "submit predictions" page for one match-day
pub fn prediction_list_path(season_id: &str, match_day: u32) -> String {
    format!("tippabgabe?tippsaisonId={}&spieltagIndex={}", season_id, match_day)
}

/// Path of the detail page for one match
pub fn match_detail_path(season_id: &str, match_id: &str) -> String {
    format!("spielinfo?tippsaisonId={}&tippspielId={}", season_id, match_id)
}

/// Logged-in session against one prediction group
pub struct SiteSession {
    http: Client,
    group_url: String,
    user_agent: String,
    token: SessionToken,
}

impl SiteSession {
    fn http_client() -> Result<Client> {
        Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| TippError::Internal(format!("Failed to create HTTP client: {}", e)))
    }

    /// Post the login form and keep whatever cookies come back.
    ///
    /// Only 4xx/5xx answers are treated as a failed login. The site answers a
    /// successful form post with a redirect, and a wrong password is not
    /// reliably distinguishable from the status alone.
    pub async fn login(
        config: &SiteConfig,
        username: Option<&Secret>,
        password: Option<&Secret>,
    ) -> Result<Self> {
        let http = Self::http_client()?;
        let url = config.login_url();

        let username = username.map(Secret::expose).unwrap_or_default();
        let password = password.map(Secret::expose).unwrap_or_default();
        if username.is_empty() || password.is_empty() {
            warn!("Site credentials incomplete; page fetches will likely fail");
        }

        debug!("Logging in at {}", url);
        let response = http
            .post(&url)
            .header(USER_AGENT, &config.user_agent)
            .form(&[("kennung", username), ("passwort", password)])
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(TippError::Auth(format!("Login rejected with HTTP {}", status.as_u16())));
        }

        let token = SessionToken::new(
            response
                .cookies()
                .map(|c| (c.name().to_string(), c.value().to_string()))
                .collect(),
        );

        if token.is_empty() {
            warn!("Login returned no cookies (HTTP {})", status.as_u16());
        } else {
            info!("Logged in to {} ({} cookies)", config.group_url(), token.cookies.len());
        }

        Ok(Self {
            http,
            group_url: config.group_url(),
            user_agent: config.user_agent.clone(),
            token,
        })
    }

    /// Build a session around an existing token
    pub fn with_token(config: &SiteConfig, token: SessionToken) -> Result<Self> {
        Ok(Self {
            http: Self::http_client()?,
            group_url: config.group_url(),
            user_agent: config.user_agent.clone(),
            token,
        })
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// GET `{base_url}/{group}/{path}` and return the raw body
    pub async fn fetch_text(&self, path: &str, referer: Option<&str>) -> Result<String> {
        let url = format!("{}/{}", self.group_url, path.trim_start_matches('/'));

        let mut request = self.http.get(&url).header(USER_AGENT, &self.user_agent);
        if !self.token.is_empty() {
            request = request.header(COOKIE, self.token.header_value());
        }
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.as_u16() != 200 {
            return Err(TippError::FetchStatus {
                status: status.as_u16(),
                url,
            });
        }

        debug!("Fetched {}", url);
        Ok(response.text().await?)
    }
}
