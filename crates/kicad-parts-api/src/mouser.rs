use std::env;

use kicad_parts_core::{Error, Result};

use crate::models::{MouserPart, MouserSearchRequest, MouserSearchResponse, SearchByPart};

const SEARCH_URL: &str = "https://api.mouser.com/api/v1/search/partnumber";

/// Mouser part-number search client
pub struct MouserClient {
    api_key: Option<String>,
}

impl MouserClient {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("MOUSER_API_KEY").ok(),
        }
    }

    pub fn available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Look a part up by manufacturer part number. Returns the first match,
    /// or None when Mouser does not carry it.
    pub fn search(&self, mpn: &str) -> Result<Option<MouserPart>> {
        let Some(key) = &self.api_key else {
            return Err(Error::Other("Mouser API key not set".into()));
        };
        let response = ureq::post(&format!("{SEARCH_URL}?apiKey={key}"))
            .send_json(MouserSearchRequest {
                search_by_part_request: SearchByPart {
                    mouser_part_number: mpn,
                },
            })
            .map_err(|e| Error::Http(e.to_string()))?;
        let parsed: MouserSearchResponse = response.into_json()?;
        Ok(parsed
            .search_results
            .map(|results| results.parts)
            .unwrap_or_default()
            .into_iter()
            .next())
    }
}

/// Mouser reports availability as free text like "8124 In Stock"; pull the
/// leading number out of it.
pub fn parse_stock(availability: &str) -> Option<u64> {
    let digits: String = availability
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
