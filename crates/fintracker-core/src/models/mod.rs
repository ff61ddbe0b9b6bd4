//! Data models for the FinTracker API.
//!
//! This module contains the request and response types exchanged with the
//! API, including:
//!
//! - Auth types: `Identity`, `TokenResponse`, login/registration bodies
//! - `Category`: income/expense categories
//! - `Transaction`, `TransactionFilters`: ledger entries and list filters
//! - `Budget`, `BudgetSummaryItem`: monthly budgets and their progress
//! - Dashboard aggregates: `Summary`, `MonthlyResponse`, `ByCategoryResponse`

pub mod auth;
pub mod budget;
pub mod category;
pub mod dashboard;
pub mod transaction;

use serde::{Deserialize, Serialize};

pub use auth::{Identity, LoginRequest, RegisterRequest, TokenResponse};
pub use budget::{Budget, BudgetCreate, BudgetSummaryItem, BudgetUpdate};
pub use category::{Category, CategoryCreate, CategoryUpdate};
pub use dashboard::{
    ByCategoryResponse, CategorySpending, MonthlyItem, MonthlyResponse, Period,
    RecentTransaction, Summary,
};
pub use transaction::{
    Transaction, TransactionCreate, TransactionFilters, TransactionPage, TransactionUpdate,
};

/// Direction of money flow, shared by categories and transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Income,
    Expense,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Income => "income",
            EntryType::Expense => "expense",
        }
    }

    /// Parse from user input, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(EntryType::Income),
            "expense" => Some(EntryType::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}
