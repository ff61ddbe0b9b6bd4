use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Planned spending for one category in one month. `month` is the first
/// day of the month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub category_id: i64,
    pub amount: f64,
    pub month: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetCreate {
    pub category_id: i64,
    pub amount: f64,
    pub month: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BudgetUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<NaiveDate>,
}

/// Budget progress as computed by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummaryItem {
    pub id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub budgeted: f64,
    pub spent: f64,
    pub remaining: f64,
    pub month: NaiveDate,
}

impl BudgetSummaryItem {
    /// Share of the budget already spent, in percent
    pub fn percent_spent(&self) -> f64 {
        if self.budgeted <= 0.0 {
            return 0.0;
        }
        self.spent / self.budgeted * 100.0
    }

    pub fn is_over_budget(&self) -> bool {
        self.spent > self.budgeted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(budgeted: f64, spent: f64) -> BudgetSummaryItem {
        BudgetSummaryItem {
            id: 1,
            category_id: 2,
            category_name: "Food".to_string(),
            budgeted,
            spent,
            remaining: budgeted - spent,
            month: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        }
    }

    #[test]
    fn test_percent_spent() {
        assert_eq!(item(200.0, 50.0).percent_spent(), 25.0);
        assert_eq!(item(0.0, 50.0).percent_spent(), 0.0);
    }

    #[test]
    fn test_over_budget() {
        assert!(item(100.0, 120.0).is_over_budget());
        assert!(!item(100.0, 100.0).is_over_budget());
    }
}
