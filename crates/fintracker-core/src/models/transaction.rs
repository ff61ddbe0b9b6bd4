//! Ledger entries and the filters used to list them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::EntryType;

/// Default page size used by the API
const DEFAULT_PER_PAGE: u32 = 20;

/// Largest page size the API accepts
const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub category_id: i64,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: String,
}

impl Transaction {
    /// Amount with sign applied: expenses are negative
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            EntryType::Income => self.amount,
            EntryType::Expense => -self.amount,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionCreate {
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub category_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// List filters. Unset fields are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilters {
    pub kind: Option<EntryType>,
    pub category_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl TransactionFilters {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(kind) = self.kind {
            pairs.push(("type".to_string(), kind.as_str().to_string()));
        }
        if let Some(category_id) = self.category_id {
            pairs.push(("category_id".to_string(), category_id.to_string()));
        }
        if let Some(date_from) = self.date_from {
            pairs.push(("date_from".to_string(), date_from.to_string()));
        }
        if let Some(date_to) = self.date_to {
            pairs.push(("date_to".to_string(), date_to.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.max(1).to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push((
                "per_page".to_string(),
                per_page.clamp(1, MAX_PER_PAGE).to_string(),
            ));
        }
        pairs
    }
}

/// Paginated list envelope returned by `GET /transactions/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPage {
    pub data: Vec<Transaction>,
    pub total: u64,
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub total_pages: u32,
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl TransactionPage {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}
