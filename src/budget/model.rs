use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{lenient, Amount, ExpenseRecord, IncomeRecord};
use crate::period::Schedule;

pub const DEFAULT_PAY_DAY: u32 = 5;
pub const DEFAULT_PAY_DATE: u32 = 1;

/// Per-user refresh preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSettings {
    #[serde(default = "default_true", deserialize_with = "lenient::flag")]
    pub auto_refresh: bool,
    /// Weekday used when an income has no pay day, 0 = Sunday.
    #[serde(default = "default_pay_day", deserialize_with = "lenient::day")]
    pub default_pay_day: u32,
    /// Day of month used when an income has no pay date.
    #[serde(default = "default_pay_date", deserialize_with = "lenient::day")]
    pub default_pay_date: u32,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            default_pay_day: DEFAULT_PAY_DAY,
            default_pay_date: DEFAULT_PAY_DATE,
        }
    }
}

/// Answers kept from the setup questionnaire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingAnswers {
    #[serde(default)]
    pub reason_primary: String,
    #[serde(default)]
    pub save_reason: String,
    #[serde(default)]
    pub target_date: String,
    #[serde(default, deserialize_with = "lenient::millis")]
    pub created_at: i64,
}

/// The per-user budget document.
///
/// The schedule is kept as the stored string: period computation and the
/// income refresher interpret unknown names differently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetModel {
    #[serde(default = "default_schedule_name", deserialize_with = "lenient::text")]
    pub schedule: String,
    #[serde(default, deserialize_with = "lenient::list")]
    pub incomes: Vec<IncomeRecord>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub expenses: Vec<ExpenseRecord>,
    #[serde(default)]
    pub target: Amount,
    #[serde(default)]
    pub settings: BudgetSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding: Option<OnboardingAnswers>,
}

impl Default for BudgetModel {
    fn default() -> Self {
        Self {
            schedule: default_schedule_name(),
            incomes: Vec::new(),
            expenses: Vec::new(),
            target: Amount::ZERO,
            settings: BudgetSettings::default(),
            onboarding: None,
        }
    }
}

impl BudgetModel {
    /// Schedule used for period boundaries.
    pub fn period_schedule(&self) -> Schedule {
        Schedule::from_name(Some(&self.schedule))
    }

    /// Schedule name as the refresher sees it: the stored name, or weekly
    /// when it is blank.
    pub fn refresh_schedule(&self) -> &str {
        if self.schedule.is_empty() {
            Schedule::Weekly.as_str()
        } else {
            &self.schedule
        }
    }

    /// Spending target, with unreadable values treated as zero.
    pub fn target(&self) -> f64 {
        self.target.or_zero()
    }

    pub fn income(&self, id: &str) -> Option<&IncomeRecord> {
        self.incomes.iter().find(|income| income.id == id)
    }

    pub fn expense(&self, id: &str) -> Option<&ExpenseRecord> {
        self.expenses.iter().find(|expense| expense.id == id)
    }

    /// Fields a freshly loaded document is missing: a blank or absent
    /// `schedule` becomes weekly and absent `settings` get the defaults.
    pub fn backfill_patch(raw: &Value) -> Map<String, Value> {
        let mut patch = Map::new();
        let schedule_missing = match raw.get("schedule") {
            Some(Value::String(name)) => name.is_empty(),
            Some(Value::Null) | None => true,
            Some(_) => false,
        };
        if schedule_missing {
            patch.insert(
                "schedule".into(),
                Value::String(Schedule::Weekly.as_str().into()),
            );
        }
        if matches!(raw.get("settings"), None | Some(Value::Null)) {
            patch.insert(
                "settings".into(),
                serde_json::to_value(BudgetSettings::default()).unwrap_or(Value::Null),
            );
        }
        patch
    }
}

fn default_schedule_name() -> String {
    Schedule::Weekly.as_str().to_string()
}

fn default_true() -> bool {
    true
}

fn default_pay_day() -> u32 {
    DEFAULT_PAY_DAY
}

fn default_pay_date() -> u32 {
    DEFAULT_PAY_DATE
}
