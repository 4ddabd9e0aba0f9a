//! Hosting deal's descriptive fields
//!
//! Read fresh on every send; nothing here is cached.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Deal fields forwarded to the assistant as ambient context
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealContext {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub asking_price: Option<f64>,
    #[serde(default)]
    pub deal_type: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub counterparty_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub deal_category: Option<String>,
}

impl DealContext {
    /// Look up a field by its snake_case template name
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "title" => self.title.clone(),
            "business_name" => self.business_name.clone(),
            "asking_price" => self.asking_price.map(format_price),
            "deal_type" => self.deal_type.clone(),
            "industry" => self.industry.clone(),
            "counterparty_name" => self.counterparty_name.clone(),
            "status" => self.status.clone(),
            "deal_category" => self.deal_category.clone(),
            _ => None,
        }
        .filter(|v| !v.trim().is_empty())
    }
}

/// Whole-unit price with thousands separators, e.g. `1,250,000`
#[allow(clippy::cast_possible_truncation)] // prices are far below i64::MAX
pub fn format_price(price: f64) -> String {
    let whole = price.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if whole < 0 {
        out.insert(0, '-');
    }
    out
}

#[derive(Debug, Error)]
pub enum DealSourceError {
    #[error("Deal not found: {0}")]
    NotFound(String),
    #[error("Deal request failed: {0}")]
    Request(String),
    #[error("Failed to read deals file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse deals: {0}")]
    Parse(#[from] serde_json::Error),
}

#[async_trait]
pub trait DealSource: Send + Sync {
    async fn fetch(&self, deal_id: &str) -> Result<DealContext, DealSourceError>;
}

#[async_trait]
impl<T: DealSource + ?Sized> DealSource for Arc<T> {
    async fn fetch(&self, deal_id: &str) -> Result<DealContext, DealSourceError> {
        (**self).fetch(deal_id).await
    }
}

// ============================================================================
// Static source
// ============================================================================

/// In-memory deals, optionally loaded from a JSON file of `{dealId: context}`
#[derive(Debug, Clone, Default)]
pub struct StaticDealSource {
    deals: HashMap<String, DealContext>,
}

impl StaticDealSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deal(mut self, deal_id: impl Into<String>, deal: DealContext) -> Self {
        self.deals.insert(deal_id.into(), deal);
        self
    }

    pub fn from_file(path: &Path) -> Result<Self, DealSourceError> {
        let raw = std::fs::read_to_string(path)?;
        let deals: HashMap<String, DealContext> = serde_json::from_str(&raw)?;
        tracing::info!(path = %path.display(), count = deals.len(), "Loaded static deals");
        Ok(Self { deals })
    }
}

#[async_trait]
impl DealSource for StaticDealSource {
    async fn fetch(&self, deal_id: &str) -> Result<DealContext, DealSourceError> {
        self.deals
            .get(deal_id)
            .cloned()
            .ok_or_else(|| DealSourceError::NotFound(deal_id.to_string()))
    }
}

// ============================================================================
// REST source
// ============================================================================

const DEAL_COLUMNS: &str =
    "title,business_name,asking_price,deal_type,industry,counterparty_name,status,deal_category";

/// Row shape of the `deals` table
#[derive(Debug, Deserialize)]
struct DealRow {
    title: Option<String>,
    business_name: Option<String>,
    asking_price: Option<f64>,
    deal_type: Option<String>,
    industry: Option<String>,
    counterparty_name: Option<String>,
    status: Option<String>,
    deal_category: Option<String>,
}

impl From<DealRow> for DealContext {
    fn from(row: DealRow) -> Self {
        Self {
            title: row.title,
            business_name: row.business_name,
            asking_price: row.asking_price,
            deal_type: row.deal_type,
            industry: row.industry,
            counterparty_name: row.counterparty_name,
            status: row.status,
            deal_category: row.deal_category,
        }
    }
}

/// Reads deal rows from the backend's REST endpoint
pub struct RestDealSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestDealSource {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, DealSourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| DealSourceError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/rest/v1/deals", self.base_url)
    }
}

#[async_trait]
impl DealSource for RestDealSource {
    async fn fetch(&self, deal_id: &str) -> Result<DealContext, DealSourceError> {
        let mut request = self
            .client
            .get(self.url())
            .query(&[("id", format!("eq.{deal_id}")), ("select", DEAL_COLUMNS.to_string())]);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DealSourceError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DealSourceError::Request(format!("HTTP {status}")));
        }

        let rows: Vec<DealRow> = response
            .json()
            .await
            .map_err(|e| DealSourceError::Request(format!("Invalid deal payload: {e}")))?;
        rows.into_iter()
            .next()
            .map(DealContext::from)
            .ok_or_else(|| DealSourceError::NotFound(deal_id.to_string()))
    }
}
