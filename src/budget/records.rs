use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{lenient, Amount};

/// Shared view over income and expense entries used by the aggregator.
pub trait LedgerEntry {
    /// Creation time in epoch milliseconds.
    fn timestamp(&self) -> i64;
    fn amount(&self) -> &Amount;
    /// Grouping label: the income source or the expense category.
    fn label(&self) -> &str;
}

/// One recorded income. Recurring incomes are zeroed by the refresher when a
/// new pay cycle begins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub source: String,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default, deserialize_with = "lenient::millis")]
    pub ts: i64,
    /// Weekday paid on, 0 = Sunday.
    #[serde(
        default,
        deserialize_with = "lenient::opt_day",
        skip_serializing_if = "Option::is_none"
    )]
    pub pay_day: Option<u32>,
    /// Day of month paid on, 1-31.
    #[serde(
        default,
        deserialize_with = "lenient::opt_day",
        skip_serializing_if = "Option::is_none"
    )]
    pub pay_date: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_refresh: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub freq: Option<String>,
}

impl IncomeRecord {
    pub fn new(source: impl Into<String>, amount: f64, ts: i64) -> Self {
        Self {
            id: new_record_id(),
            source: source.into(),
            amount: Amount::new(amount),
            ts,
            pay_day: None,
            pay_date: None,
            last_refresh: None,
            freq: None,
        }
    }

    pub fn with_pay_day(mut self, pay_day: u32) -> Self {
        self.pay_day = Some(pay_day);
        self
    }

    pub fn with_pay_date(mut self, pay_date: u32) -> Self {
        self.pay_date = Some(pay_date);
        self
    }

    pub fn with_last_refresh(mut self, last_refresh: i64) -> Self {
        self.last_refresh = Some(last_refresh);
        self
    }
}

impl LedgerEntry for IncomeRecord {
    fn timestamp(&self) -> i64 {
        self.ts
    }

    fn amount(&self) -> &Amount {
        &self.amount
    }

    fn label(&self) -> &str {
        &self.source
    }
}

/// One recorded spend against a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: String,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default, deserialize_with = "lenient::millis")]
    pub ts: i64,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub freq: Option<String>,
}

impl ExpenseRecord {
    pub fn new(category: impl Into<String>, amount: f64, ts: i64) -> Self {
        Self {
            id: new_record_id(),
            category: category.into(),
            amount: Amount::new(amount),
            ts,
            freq: None,
        }
    }
}

impl LedgerEntry for ExpenseRecord {
    fn timestamp(&self) -> i64 {
        self.ts
    }

    fn amount(&self) -> &Amount {
        &self.amount
    }

    fn label(&self) -> &str {
        &self.category
    }
}

pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}
