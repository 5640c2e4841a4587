use crate::session::{Session, SessionUser};

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the campaign backend, without a trailing slash.
    pub backend_url: String,
    pub access_token: Option<String>,
    pub organization_id: Option<String>,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not a valid URL: '{value}'")]
    InvalidUrl { name: &'static str, value: String },
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                 | Default    |
    /// |-------------------------|------------|
    /// | `OLIVE_BACKEND_URL`     | (required) |
    /// | `OLIVE_ACCESS_TOKEN`    | unset      |
    /// | `OLIVE_ORGANIZATION_ID` | unset      |
    /// | `OLIVE_USER_ID`         | unset      |
    /// | `OLIVE_USER_EMAIL`      | unset      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup. Blank values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let backend_url = var("OLIVE_BACKEND_URL").ok_or(ConfigError::Missing("OLIVE_BACKEND_URL"))?;
        if reqwest::Url::parse(&backend_url).is_err() {
            return Err(ConfigError::InvalidUrl {
                name: "OLIVE_BACKEND_URL",
                value: backend_url,
            });
        }

        Ok(Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            access_token: var("OLIVE_ACCESS_TOKEN"),
            organization_id: var("OLIVE_ORGANIZATION_ID"),
            user_id: var("OLIVE_USER_ID"),
            user_email: var("OLIVE_USER_EMAIL"),
        })
    }

    /// The session described by this configuration, if a token is set.
    pub fn session(&self) -> Option<Session> {
        let access_token = self.access_token.clone()?;
        Some(Session {
            user: SessionUser {
                id: self.user_id.clone().unwrap_or_default(),
                email: self.user_email.clone(),
                organization_id: self.organization_id.clone(),
            },
            access_token,
        })
    }
}
