//! Spreadsheet row sink backed by the Google Sheets v4 REST API.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::{ConfigError, ServiceAccountKey, SheetCredentials, SheetsConfig};
use crate::error::{RelayError, RelayResult};

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Destination for lead rows.
#[async_trait]
pub trait RowSink: Send + Sync {
    async fn append_row(&self, row: &[String]) -> RelayResult<()>;
}

/// Appends rows to columns `A:E` of one sheet, inserting new rows.
pub struct GoogleSheetsSink {
    client: reqwest::Client,
    append_url: Url,
    auth: SheetAuth,
}

enum SheetAuth {
    Static(String),
    ServiceAccount {
        key: ServiceAccountKey,
        signing_key: EncodingKey,
        cached: Mutex<Option<CachedToken>>,
    },
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Serialize)]
struct AppendBody<'a> {
    values: [&'a [String]; 1],
}

impl GoogleSheetsSink {
    pub fn new(config: &SheetsConfig, client: reqwest::Client) -> Result<Self, ConfigError> {
        let append_url = append_url(config)?;
        let auth = match &config.credentials {
            SheetCredentials::AccessToken(token) => SheetAuth::Static(token.clone()),
            SheetCredentials::ServiceAccount(key) => SheetAuth::ServiceAccount {
                signing_key: EncodingKey::from_rsa_pem(key.private_key.as_bytes())
                    .map_err(|e| ConfigError::Credentials(e.to_string()))?,
                key: key.clone(),
                cached: Mutex::new(None),
            },
        };
        Ok(Self {
            client,
            append_url,
            auth,
        })
    }

    pub fn append_url(&self) -> &Url {
        &self.append_url
    }

    // ---- private helpers ----

    async fn access_token(&self) -> RelayResult<String> {
        let (key, signing_key, cached) = match &self.auth {
            SheetAuth::Static(token) => return Ok(token.clone()),
            SheetAuth::ServiceAccount {
                key,
                signing_key,
                cached,
            } => (key, signing_key, cached),
        };

        let mut cached = cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref() {
            if token.expires_at > now + Duration::seconds(EXPIRY_MARGIN_SECS) {
                return Ok(token.access_token.clone());
            }
        }

        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: SHEETS_SCOPE,
            aud: &key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, signing_key)
            .map_err(|e| RelayError::Credentials(e.to_string()))?;

        let response = self
            .client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Credentials(format!(
                "token exchange failed with status code {status}: {body}"
            )));
        }
        let token: TokenResponse = response.json().await?;

        tracing::debug!(client_email = %key.client_email, expires_in = token.expires_in, "Obtained spreadsheet access token");
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: now + Duration::seconds(token.expires_in),
        });
        Ok(token.access_token)
    }
}

#[async_trait]
impl RowSink for GoogleSheetsSink {
    async fn append_row(&self, row: &[String]) -> RelayResult<()> {
        let token = self.access_token().await?;
        let response = self
            .client
            .post(self.append_url.clone())
            .bearer_auth(token)
            .json(&AppendBody { values: [row] })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Sheet { status, body });
        }
        Ok(())
    }
}

/// `{api}/v4/spreadsheets/{id}/values/{sheet}!A:E:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS`
fn append_url(config: &SheetsConfig) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::Invalid {
        name: "SHEETS_API_URL",
        value: config.api_url.clone(),
    };
    let range = format!("{}!A:E:append", config.sheet_name);
    let mut url = Url::parse(&config.api_url).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend([
            "v4",
            "spreadsheets",
            config.spreadsheet_id.as_str(),
            "values",
            range.as_str(),
        ]);
    url.query_pairs_mut()
        .append_pair("valueInputOption", "RAW")
        .append_pair("insertDataOption", "INSERT_ROWS");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_url: &str, sheet_name: &str) -> SheetsConfig {
        SheetsConfig {
            spreadsheet_id: "sheet-1".to_string(),
            sheet_name: sheet_name.to_string(),
            api_url: api_url.to_string(),
            credentials: SheetCredentials::AccessToken("tok".to_string()),
        }
    }

    #[test]
    fn append_url_targets_columns_a_to_e() {
        let url = append_url(&config("https://sheets.googleapis.com", "Sheet1")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-1/values/Sheet1!A:E:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS"
        );
    }

    #[test]
    fn sheet_names_are_escaped() {
        let url = append_url(&config("http://localhost:9000/", "June Leads")).unwrap();
        assert_eq!(url.path(), "/v4/spreadsheets/sheet-1/values/June%20Leads!A:E:append");
    }

    #[test]
    fn malformed_private_key_is_a_config_error() {
        let mut config = config("https://sheets.googleapis.com", "Sheet1");
        config.credentials = SheetCredentials::ServiceAccount(ServiceAccountKey {
            client_email: "relay@proj.iam.gserviceaccount.com".to_string(),
            private_key: "not a pem".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
        });
        assert!(matches!(
            GoogleSheetsSink::new(&config, reqwest::Client::new()),
            Err(ConfigError::Credentials(_))
        ));
    }
}
