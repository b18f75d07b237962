use std::env;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use kicad_parts_core::{Error, Result};

use crate::models::{CachedToken, DigikeyProduct, KeywordSearchRequest, KeywordSearchResponse, TokenResponse};

const TOKEN_URL: &str = "https://api.digikey.com/v1/oauth2/token";
const SEARCH_URL: &str = "https://api.digikey.com/products/v4/search";

/// How long before nominal expiry a token is treated as stale, in seconds
const EXPIRY_SKEW: i64 = 60;

/// Digikey Product Information v4 client with OAuth2 client-credentials
/// authentication. Tokens are cached in memory and in a JSON file in the
/// temp directory so repeated imports skip the token round trip.
pub struct DigikeyClient {
    client_id: Option<String>,
    client_secret: Option<String>,
    token: Option<String>,
    token_expires: i64,
    token_file: PathBuf,
}

impl DigikeyClient {
    pub fn from_env() -> Self {
        Self {
            client_id: env::var("DIGIKEY_CLIENT_ID").ok(),
            client_secret: env::var("DIGIKEY_CLIENT_SECRET").ok(),
            token: None,
            token_expires: 0,
            token_file: env::temp_dir().join("digikey_token.json"),
        }
    }

    /// Whether both credentials are configured
    pub fn available(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    /// Keyword search against the v4 Product Information API. Returns the
    /// first matching product, or None when the part is unknown to Digikey.
    pub fn search(&mut self, mpn: &str) -> Result<Option<DigikeyProduct>> {
        let token = self.token()?;
        let client_id = self.client_id.clone().unwrap_or_default();
        let response = ureq::post(&format!("{SEARCH_URL}/keyword"))
            .set("Authorization", &format!("Bearer {token}"))
            .set("X-DIGIKEY-Client-Id", &client_id)
            .set("X-DIGIKEY-Locale-Site", "US")
            .set("X-DIGIKEY-Locale-Language", "en")
            .set("X-DIGIKEY-Locale-Currency", "USD")
            .send_json(KeywordSearchRequest {
                keywords: mpn,
                limit: 1,
                offset: 0,
            });
        match response {
            Ok(response) => {
                let parsed: KeywordSearchResponse = response.into_json()?;
                Ok(parsed.products.into_iter().next())
            }
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(e) => Err(Error::Http(e.to_string())),
        }
    }

    fn token(&mut self) -> Result<String> {
        if let Some(token) = &self.token {
            if Utc::now().timestamp() < self.token_expires {
                return Ok(token.clone());
            }
        }
        if let Some(cached) = self.load_cached_token() {
            self.token = Some(cached.clone());
            return Ok(cached);
        }

        let (id, secret) = match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => (id.as_str(), secret.as_str()),
            _ => return Err(Error::Other("Digikey API credentials not set".into())),
        };
        let response = ureq::post(TOKEN_URL)
            .send_form(&[
                ("client_id", id),
                ("client_secret", secret),
                ("grant_type", "client_credentials"),
            ])
            .map_err(|e| Error::Http(e.to_string()))?;
        let grant: TokenResponse = response.into_json()?;
        let expires_in = grant.expires_in.unwrap_or(3600);

        // a failed cache write only costs the next run a token round trip
        let _ = self.save_token(&grant.access_token, expires_in);
        self.token_expires = Utc::now().timestamp() + expires_in - EXPIRY_SKEW;
        self.token = Some(grant.access_token.clone());
        Ok(grant.access_token)
    }

    fn load_cached_token(&self) -> Option<String> {
        let data = fs::read_to_string(&self.token_file).ok()?;
        let cached: CachedToken = serde_json::from_str(&data).ok()?;
        (Utc::now().timestamp() < cached.expires_at).then_some(cached.access_token)
    }

    fn save_token(&self, token: &str, expires_in: i64) -> Result<()> {
        let cached = CachedToken {
            access_token: token.to_string(),
            expires_at: Utc::now().timestamp() + expires_in - EXPIRY_SKEW,
        };
        fs::write(&self.token_file, serde_json::to_string(&cached)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.token_file, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}
