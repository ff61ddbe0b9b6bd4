//! Dashboard aggregates. All figures are computed server-side.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::EntryType;

/// Optional reporting window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Period {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl Period {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(date_from) = self.date_from {
            pairs.push(("date_from".to_string(), date_from.to_string()));
        }
        if let Some(date_to) = self.date_to {
            pairs.push(("date_to".to_string(), date_to.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
    pub transaction_count: u64,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyItem {
    /// Month key such as "2026-02"
    pub month: String,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyResponse {
    pub data: Vec<MonthlyItem>,
    pub months_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpending {
    pub category_id: i64,
    pub category_name: String,
    pub icon: Option<String>,
    pub total: f64,
    pub percentage: f64,
    pub transaction_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByCategoryResponse {
    pub data: Vec<CategorySpending>,
    pub grand_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentTransaction {
    pub id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub category_name: String,
    pub category_icon: Option<String>,
    pub created_at: String,
}
