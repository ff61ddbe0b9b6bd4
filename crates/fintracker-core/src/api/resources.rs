//! Typed calls for transactions, categories, budgets and the dashboard.
//!
//! These only shape requests and decode responses; authorization and
//! renewal are handled by `ApiClient::send`. Business rejections (duplicate
//! category, category still in use, ...) come back unchanged as
//! `ApiError::Rejected`.

use chrono::{Datelike, NaiveDate};

use crate::models::{
    Budget, BudgetCreate, BudgetSummaryItem, BudgetUpdate, ByCategoryResponse, Category,
    CategoryCreate, CategoryUpdate, EntryType, MonthlyResponse, Period, RecentTransaction,
    Summary, Transaction, TransactionCreate, TransactionFilters, TransactionPage,
    TransactionUpdate,
};

use super::{ApiClient, ApiError, ApiRequest};

/// Months shown by the monthly chart unless asked otherwise
pub const DEFAULT_MONTHLY_MONTHS: u32 = 6;

/// Rows in the recent-activity list unless asked otherwise
pub const DEFAULT_RECENT_LIMIT: u32 = 10;

/// Budgets are keyed by the first day of their month
fn month_key(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

impl ApiClient {
    // ===== Categories =====

    pub async fn categories(&self, kind: Option<EntryType>) -> Result<Vec<Category>, ApiError> {
        let mut request = ApiRequest::get("/categories/");
        if let Some(kind) = kind {
            request = request.query("type", kind.as_str());
        }
        self.fetch(&request).await
    }

    pub async fn create_category(&self, category: &CategoryCreate) -> Result<Category, ApiError> {
        self.fetch(&ApiRequest::post("/categories/").json(category)?)
            .await
    }

    pub async fn update_category(
        &self,
        id: i64,
        update: &CategoryUpdate,
    ) -> Result<Category, ApiError> {
        self.fetch(&ApiRequest::put(format!("/categories/{}", id)).json(update)?)
            .await
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), ApiError> {
        self.execute(&ApiRequest::delete(format!("/categories/{}", id)))
            .await
    }

    // ===== Transactions =====

    pub async fn transactions(
        &self,
        filters: &TransactionFilters,
    ) -> Result<TransactionPage, ApiError> {
        let request = ApiRequest::get("/transactions/").query_pairs(filters.query_pairs());
        self.fetch(&request).await
    }

    pub async fn create_transaction(
        &self,
        transaction: &TransactionCreate,
    ) -> Result<Transaction, ApiError> {
        self.fetch(&ApiRequest::post("/transactions/").json(transaction)?)
            .await
    }

    pub async fn update_transaction(
        &self,
        id: &str,
        update: &TransactionUpdate,
    ) -> Result<Transaction, ApiError> {
        self.fetch(&ApiRequest::put(format!("/transactions/{}", id)).json(update)?)
            .await
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<(), ApiError> {
        self.execute(&ApiRequest::delete(format!("/transactions/{}", id)))
            .await
    }

    // ===== Budgets =====

    pub async fn budgets(&self, month: Option<NaiveDate>) -> Result<Vec<Budget>, ApiError> {
        let mut request = ApiRequest::get("/budgets/");
        if let Some(month) = month {
            request = request.query("month", month_key(month));
        }
        self.fetch(&request).await
    }

    pub async fn budget_summary(
        &self,
        month: NaiveDate,
    ) -> Result<Vec<BudgetSummaryItem>, ApiError> {
        let request = ApiRequest::get("/budgets/summary").query("month", month_key(month));
        self.fetch(&request).await
    }

    pub async fn create_budget(&self, budget: &BudgetCreate) -> Result<Budget, ApiError> {
        let budget = BudgetCreate {
            month: month_key(budget.month),
            ..budget.clone()
        };
        self.fetch(&ApiRequest::post("/budgets/").json(&budget)?)
            .await
    }

    pub async fn update_budget(&self, id: i64, update: &BudgetUpdate) -> Result<Budget, ApiError> {
        let update = BudgetUpdate {
            month: update.month.map(month_key),
            ..update.clone()
        };
        self.fetch(&ApiRequest::put(format!("/budgets/{}", id)).json(&update)?)
            .await
    }

    pub async fn delete_budget(&self, id: i64) -> Result<(), ApiError> {
        self.execute(&ApiRequest::delete(format!("/budgets/{}", id)))
            .await
    }

    // ===== Dashboard =====

    pub async fn dashboard_summary(&self, period: &Period) -> Result<Summary, ApiError> {
        let request = ApiRequest::get("/dashboard/summary").query_pairs(period.query_pairs());
        self.fetch(&request).await
    }

    pub async fn dashboard_monthly(&self, months: u32) -> Result<MonthlyResponse, ApiError> {
        let request = ApiRequest::get("/dashboard/monthly").query("months", months.max(1));
        self.fetch(&request).await
    }

    pub async fn dashboard_by_category(
        &self,
        kind: Option<EntryType>,
        period: &Period,
    ) -> Result<ByCategoryResponse, ApiError> {
        let mut request = ApiRequest::get("/dashboard/by-category");
        if let Some(kind) = kind {
            request = request.query("type", kind.as_str());
        }
        self.fetch(&request.query_pairs(period.query_pairs())).await
    }

    pub async fn recent_transactions(
        &self,
        limit: u32,
    ) -> Result<Vec<RecentTransaction>, ApiError> {
        let request = ApiRequest::get("/dashboard/recent").query("limit", limit.max(1));
        self.fetch(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_key_uses_first_day() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 17).unwrap();
        assert_eq!(month_key(date), NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
    }
}
