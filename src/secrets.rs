//! Credential resolution
//!
//! Secrets come from an ordered chain of providers. The first provider that
//! yields a usable value wins; empty values and the configured placeholder
//! count as "not set". A missing secret is never an error here, callers fail
//! later when they actually need the value.

use crate::config::AppConfig;
use std::collections::HashMap;
use std::fmt;
use std::process::{Command, Stdio};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret string, wiped from memory on drop and redacted in debug output
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// The values the predictor may need
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretId {
    SiteUsername,
    SitePassword,
    LlmApiKey,
    LlmBaseUrl,
}

impl SecretId {
    pub const ALL: [SecretId; 4] = [
        SecretId::SiteUsername,
        SecretId::SitePassword,
        SecretId::LlmApiKey,
        SecretId::LlmBaseUrl,
    ];
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretId::SiteUsername => write!(f, "site username"),
            SecretId::SitePassword => write!(f, "site password"),
            SecretId::LlmApiKey => write!(f, "LLM API key"),
            SecretId::LlmBaseUrl => write!(f, "LLM base URL"),
        }
    }
}

/// One source of secrets
pub trait SecretProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Look up a secret. Unavailable stores and absent entries both yield `None`.
    fn lookup(&self, id: SecretId) -> Option<Secret>;
}

/// Values given explicitly through configuration or command-line flags
#[derive(Default)]
pub struct StaticProvider {
    site_username: Option<String>,
    site_password: Option<String>,
    llm_api_key: Option<String>,
    llm_base_url: Option<String>,
}

impl StaticProvider {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            site_username: config.site.username.clone(),
            site_password: config.site.password.clone(),
            llm_api_key: config.llm.api_key.clone(),
            llm_base_url: config.llm.base_url.clone(),
        }
    }

    pub fn with(mut self, id: SecretId, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match id {
            SecretId::SiteUsername => self.site_username = value,
            SecretId::SitePassword => self.site_password = value,
            SecretId::LlmApiKey => self.llm_api_key = value,
            SecretId::LlmBaseUrl => self.llm_base_url = value,
        }
        self
    }
}

impl SecretProvider for StaticProvider {
    fn name(&self) -> &str {
        "config"
    }

    fn lookup(&self, id: SecretId) -> Option<Secret> {
        let value = match id {
            SecretId::SiteUsername => &self.site_username,
            SecretId::SitePassword => &self.site_password,
            SecretId::LlmApiKey => &self.llm_api_key,
            SecretId::LlmBaseUrl => &self.llm_base_url,
        };
        value.as_deref().map(Secret::new)
    }
}

/// Conventional environment variables
pub struct EnvProvider {
    vars: Option<HashMap<String, String>>,
}

impl EnvProvider {
    /// Reads `KICKTIPP_USER`, `KICKTIPP_PASSWORD`, `OPENAI_API_KEY`, `OPENAI_BASE_URL`
    pub fn standard() -> Self {
        Self { vars: None }
    }

    #[cfg(test)]
    fn from_vars(vars: &[(&str, &str)]) -> Self {
        Self {
            vars: Some(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()),
        }
    }

    fn var_name(id: SecretId) -> &'static str {
        match id {
            SecretId::SiteUsername => "KICKTIPP_USER",
            SecretId::SitePassword => "KICKTIPP_PASSWORD",
            SecretId::LlmApiKey => "OPENAI_API_KEY",
            SecretId::LlmBaseUrl => "OPENAI_BASE_URL",
        }
    }
}

impl SecretProvider for EnvProvider {
    fn name(&self) -> &str {
        "environment"
    }

    fn lookup(&self, id: SecretId) -> Option<Secret> {
        let name = Self::var_name(id);
        match &self.vars {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        }
        .map(Secret::new)
    }
}

/// External secret manager invoked as a subprocess.
///
/// The lookup key is appended as the last argument. The first line of stdout
/// is the password; a `login:` or `username:` line carries the username, the
/// layout `pass show` and similar tools print.
pub struct CommandProvider {
    program: String,
    args: Vec<String>,
    site_key: String,
    llm_key: String,
}

impl CommandProvider {
    /// `command` is split on whitespace into program and leading arguments
    pub fn new(command: &str, site_key: impl Into<String>, llm_key: impl Into<String>) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            site_key: site_key.into(),
            llm_key: llm_key.into(),
        })
    }

    fn run(&self, key: &str) -> Option<String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(key)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(out) if out.status.success() => Some(String::from_utf8_lossy(&out.stdout).into_owned()),
            Ok(out) => {
                debug!("Secret command '{}' exited with {}", self.program, out.status);
                None
            }
            Err(e) => {
                debug!("Secret command '{}' unavailable: {}", self.program, e);
                None
            }
        }
    }
}

impl SecretProvider for CommandProvider {
    fn name(&self) -> &str {
        "secret-command"
    }

    fn lookup(&self, id: SecretId) -> Option<Secret> {
        let (key, username) = match id {
            SecretId::SiteUsername => (&self.site_key, true),
            SecretId::SitePassword => (&self.site_key, false),
            SecretId::LlmApiKey => (&self.llm_key, false),
            SecretId::LlmBaseUrl => return None,
        };

        let mut stdout = self.run(key)?;
        let value = if username {
            parse_username(&stdout)
        } else {
            stdout.lines().next().map(|line| line.trim().to_string())
        };
        stdout.zeroize();
        value.map(Secret::new)
    }
}

fn parse_username(stdout: &str) -> Option<String> {
    stdout.lines().skip(1).find_map(|line| {
        let (label, value) = line.split_once(':')?;
        let label = label.trim().to_ascii_lowercase();
        (label == "login" || label == "username" || label == "user").then(|| value.trim().to_string())
    })
}

/// Ordered provider list; the first usable value wins
pub struct SecretChain {
    providers: Vec<Box<dyn SecretProvider>>,
    placeholder: String,
}

impl SecretChain {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            providers: Vec::new(),
            placeholder: placeholder.into(),
        }
    }

    pub fn with_provider(mut self, provider: impl SecretProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Config values, then environment, then the external secret manager if one is configured
    pub fn from_config(config: &AppConfig) -> Self {
        let mut chain = Self::new(config.secrets.placeholder.clone())
            .with_provider(StaticProvider::from_config(config))
            .with_provider(EnvProvider::standard());

        if let Some(command) = config.secrets.command.as_deref() {
            if let Some(provider) = CommandProvider::new(
                command,
                config.secrets.site_lookup_key.clone(),
                config.secrets.llm_lookup_key.clone(),
            ) {
                chain = chain.with_provider(provider);
            }
        }

        chain
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn resolve(&self, id: SecretId) -> Option<Secret> {
        for provider in &self.providers {
            if let Some(secret) = provider.lookup(id) {
                if self.is_usable(&secret) {
                    debug!("Resolved {} from {}", id, provider.name());
                    return Some(secret);
                }
            }
        }
        debug!("No provider supplied the {}", id);
        None
    }

    fn is_usable(&self, secret: &Secret) -> bool {
        let value = secret.expose().trim();
        !value.is_empty() && value != self.placeholder
    }
}

/// All secrets the predictor may need, each optional
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub site_username: Option<Secret>,
    pub site_password: Option<Secret>,
    pub llm_api_key: Option<Secret>,
    pub llm_base_url: Option<Secret>,
}

impl Credentials {
    pub fn resolve(chain: &SecretChain) -> Self {
        Self {
            site_username: chain.resolve(SecretId::SiteUsername),
            site_password: chain.resolve(SecretId::SitePassword),
            llm_api_key: chain.resolve(SecretId::LlmApiKey),
            llm_base_url: chain.resolve(SecretId::LlmBaseUrl),
        }
    }

    pub fn missing(&self) -> Vec<SecretId> {
        SecretId::ALL
            .into_iter()
            .filter(|id| {
                let value = match id {
                    SecretId::SiteUsername => &self.site_username,
                    SecretId::SitePassword => &self.site_password,
                    SecretId::LlmApiKey => &self.llm_api_key,
                    SecretId::LlmBaseUrl => &self.llm_base_url,
                };
                value.is_none()
            })
            .collect()
    }
}
