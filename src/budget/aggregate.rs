use std::collections::BTreeMap;

use chrono::TimeZone;

use super::{BudgetModel, LedgerEntry};
use crate::period::{is_in_range, Period};

pub const FALLBACK_LABEL: &str = "Other";

/// Records whose creation time falls inside `period`.
pub fn filter_by_period<'a, R, Tz>(records: &'a [R], period: &Period<Tz>) -> Vec<&'a R>
where
    R: LedgerEntry,
    Tz: TimeZone,
{
    records
        .iter()
        .filter(|record| is_in_range(record.timestamp(), period))
        .collect()
}

/// Sums amounts grouped by `key`. Empty keys are grouped under `"Other"`,
/// keys are trimmed, and non-finite amounts are left out.
pub fn sum_by_key<R, F>(records: &[&R], key: F) -> BTreeMap<String, f64>
where
    R: LedgerEntry,
    F: Fn(&R) -> &str,
{
    let mut totals = BTreeMap::new();
    for record in records {
        let raw = key(*record);
        let label = if raw.is_empty() { FALLBACK_LABEL } else { raw };
        let amount = record.amount();
        if !amount.is_finite() {
            continue;
        }
        *totals.entry(label.trim().to_string()).or_insert(0.0) += amount.value();
    }
    totals
}

/// Grouped by each record's own label (source or category).
pub fn sum_by_label<R: LedgerEntry>(records: &[&R]) -> BTreeMap<String, f64> {
    sum_by_key(records, |record| record.label())
}

/// Total of all amounts, counting non-finite amounts as zero.
pub fn sum_amounts<R: LedgerEntry>(records: &[&R]) -> f64 {
    records.iter().map(|record| record.amount().or_zero()).sum()
}

/// Left to spend before reaching `target`.
pub fn remaining(target: f64, total_spend: f64) -> f64 {
    (target - total_spend).max(0.0)
}

/// Spent beyond `target`.
pub fn over(target: f64, total_spend: f64) -> f64 {
    (total_spend - target).max(0.0)
}

/// Period view of a budget: grouped and total income and spend.
#[derive(Debug, Clone)]
pub struct BudgetSummary<Tz: TimeZone> {
    pub period: Period<Tz>,
    pub income_by_source: BTreeMap<String, f64>,
    pub spend_by_category: BTreeMap<String, f64>,
    pub total_income: f64,
    pub total_spend: f64,
    pub target: f64,
    pub remaining: f64,
    pub over: f64,
}

impl<Tz: TimeZone> BudgetSummary<Tz> {
    pub fn is_over_budget(&self) -> bool {
        self.over > 0.0
    }

    pub fn net(&self) -> f64 {
        self.total_income - self.total_spend
    }
}

pub fn summarize<Tz: TimeZone>(model: &BudgetModel, period: Period<Tz>) -> BudgetSummary<Tz> {
    let incomes = filter_by_period(&model.incomes, &period);
    let expenses = filter_by_period(&model.expenses, &period);
    let total_spend = sum_amounts(&expenses);
    let target = model.target();
    BudgetSummary {
        income_by_source: sum_by_label(&incomes),
        spend_by_category: sum_by_label(&expenses),
        total_income: sum_amounts(&incomes),
        total_spend,
        target,
        remaining: remaining(target, total_spend),
        over: over(target, total_spend),
        period,
    }
}
