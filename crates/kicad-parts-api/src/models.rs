//! Request and response models for the distributor APIs.

use serde::{Deserialize, Serialize};

/// OAuth2 token grant from Digikey
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: Option<i64>,
}

/// Token cached on disk between runs
#[derive(Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    /// Unix timestamp after which the token is stale
    pub expires_at: i64,
}

/// Body of a Digikey v4 keyword search
#[derive(Serialize)]
pub struct KeywordSearchRequest<'a> {
    #[serde(rename = "Keywords")]
    pub keywords: &'a str,
    #[serde(rename = "Limit")]
    pub limit: u32,
    #[serde(rename = "Offset")]
    pub offset: u32,
}

#[derive(Deserialize)]
pub struct KeywordSearchResponse {
    #[serde(rename = "Products", default)]
    pub products: Vec<DigikeyProduct>,
}

/// The Digikey v4 product fields the importer cares about
#[derive(Deserialize, Default)]
pub struct DigikeyProduct {
    #[serde(rename = "DigiKeyProductNumber")]
    pub product_number: Option<String>,
    #[serde(rename = "QuantityAvailable")]
    pub quantity_available: Option<u64>,
    #[serde(rename = "DatasheetUrl")]
    pub datasheet_url: Option<String>,
    #[serde(rename = "Manufacturer")]
    pub manufacturer: Option<DigikeyManufacturer>,
    #[serde(rename = "StandardPricing", default)]
    pub standard_pricing: Vec<PriceBreak>,
}

#[derive(Deserialize)]
pub struct DigikeyManufacturer {
    #[serde(rename = "Name")]
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct PriceBreak {
    #[serde(rename = "BreakQuantity")]
    pub break_quantity: Option<u64>,
    #[serde(rename = "UnitPrice")]
    pub unit_price: Option<f64>,
}

#[derive(Serialize)]
pub struct MouserSearchRequest<'a> {
    #[serde(rename = "SearchByPartRequest")]
    pub search_by_part_request: SearchByPart<'a>,
}

#[derive(Serialize)]
pub struct SearchByPart<'a> {
    #[serde(rename = "mouserPartNumber")]
    pub mouser_part_number: &'a str,
}

#[derive(Deserialize)]
pub struct MouserSearchResponse {
    #[serde(rename = "SearchResults")]
    pub search_results: Option<MouserSearchResults>,
}

#[derive(Deserialize)]
pub struct MouserSearchResults {
    #[serde(rename = "Parts", default)]
    pub parts: Vec<MouserPart>,
}

#[derive(Deserialize)]
pub struct MouserPart {
    #[serde(rename = "MouserPartNumber")]
    pub mouser_part_number: Option<String>,
    #[serde(rename = "Availability")]
    pub availability: Option<String>,
    #[serde(rename = "Manufacturer")]
    pub manufacturer: Option<String>,
}
