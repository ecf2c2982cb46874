//! Budget records, the per-user budget document, and the computations over
//! it: period aggregation, pay-cycle refresh, and amount entry.

pub mod aggregate;
pub mod amount;
pub mod expression;
pub mod lenient;
pub mod model;
pub mod records;
pub mod refresh;
pub mod savings;

pub use aggregate::{
    filter_by_period, over, remaining, sum_amounts, sum_by_key, sum_by_label, summarize,
    BudgetSummary,
};
pub use amount::{apply_money_input, round_money, to_money, Amount};
pub use model::{BudgetModel, BudgetSettings, OnboardingAnswers};
pub use records::{ExpenseRecord, IncomeRecord, LedgerEntry};
pub use refresh::{apply_refresh, refresh_incomes, should_refresh};
pub use savings::{GoalField, SavingsGoal, SavingsModel};
