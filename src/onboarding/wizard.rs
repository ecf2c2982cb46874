use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::budget::{Amount, BudgetModel, ExpenseRecord, IncomeRecord, OnboardingAnswers};

/// Preset expense categories offered on the expenses step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpenseTemplate {
    pub key: &'static str,
    pub emoji: &'static str,
}

pub const EXPENSE_TEMPLATES: [ExpenseTemplate; 7] = [
    ExpenseTemplate { key: "Groceries", emoji: "🛒" },
    ExpenseTemplate { key: "Fuel", emoji: "⛽️" },
    ExpenseTemplate { key: "Transport", emoji: "🚌" },
    ExpenseTemplate { key: "Rent", emoji: "🏠" },
    ExpenseTemplate { key: "Subscriptions", emoji: "📺" },
    ExpenseTemplate { key: "Utilities", emoji: "💡" },
    ExpenseTemplate { key: "Phone/Internet", emoji: "📱" },
];

pub const FREQUENCIES: [&str; 5] = ["weekly", "fortnight", "monthly", "yearly", "custom"];

const DEFAULT_FREQUENCY: &str = "weekly";

pub const STEP_REASON: usize = 0;
pub const STEP_SAVE_REASON: usize = 1;
pub const STEP_TARGET_DATE: usize = 2;
pub const STEP_TARGET_AMOUNT: usize = 3;
pub const STEP_EXPENSES: usize = 4;
pub const STEP_INCOMES: usize = 5;
pub const STEP_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardReason {
    Save,
    Budget,
    Other,
}

impl WizardReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardReason::Save => "save",
            WizardReason::Budget => "budget",
            WizardReason::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardExpense {
    pub key: String,
    pub freq: String,
    /// Raw text as typed.
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardIncome {
    pub source: String,
    pub freq: String,
    pub amount: String,
}

/// Everything collected by the questionnaire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardAnswers {
    pub reason_primary: Option<WizardReason>,
    pub save_reason: String,
    pub target_date: String,
    pub target_amount: String,
    pub expenses: Vec<WizardExpense>,
    pub incomes: Vec<WizardIncome>,
}

impl WizardAnswers {
    /// Adds the template as a weekly expense, or removes it when present.
    pub fn toggle_template(&mut self, key: &str) {
        if self.expenses.iter().any(|e| e.key == key) {
            self.expenses.retain(|e| e.key != key);
        } else {
            self.expenses.push(WizardExpense {
                key: key.to_string(),
                freq: DEFAULT_FREQUENCY.to_string(),
                amount: String::new(),
            });
        }
    }

    pub fn update_expense(&mut self, key: &str, freq: Option<&str>, amount: Option<&str>) {
        for expense in self.expenses.iter_mut().filter(|e| e.key == key) {
            if let Some(freq) = freq {
                expense.freq = freq.to_string();
            }
            if let Some(amount) = amount {
                expense.amount = amount.to_string();
            }
        }
    }

    /// Returns false when the trimmed key is empty.
    pub fn add_custom_expense(&mut self, key: &str, freq: &str, amount: &str) -> bool {
        let key = key.trim();
        if key.is_empty() {
            return false;
        }
        self.expenses.push(WizardExpense {
            key: key.to_string(),
            freq: freq.to_string(),
            amount: amount.to_string(),
        });
        true
    }

    /// Returns false unless both the trimmed source and amount are given.
    /// The entry is stored as typed.
    pub fn add_income(&mut self, source: &str, freq: &str, amount: &str) -> bool {
        if source.trim().is_empty() || amount.trim().is_empty() {
            return false;
        }
        self.incomes.push(WizardIncome {
            source: source.to_string(),
            freq: freq.to_string(),
            amount: amount.to_string(),
        });
        true
    }

    pub fn remove_income(&mut self, index: usize) -> Option<WizardIncome> {
        (index < self.incomes.len()).then(|| self.incomes.remove(index))
    }

    pub fn wants_to_save(&self) -> bool {
        self.reason_primary == Some(WizardReason::Save)
    }

    /// Merge-patch for the budget document. New records are appended to the
    /// existing arrays; the target only changes when a positive amount was
    /// entered.
    pub fn budget_patch(&self, existing: &BudgetModel, now_millis: i64) -> Map<String, Value> {
        let entered_target = coerce(&self.target_amount);
        let target = if entered_target > 0.0 {
            entered_target
        } else {
            existing.target()
        };

        let mut expenses = existing.expenses.clone();
        expenses.extend(self.expenses.iter().filter(|e| !e.key.is_empty()).map(|e| {
            let mut record = ExpenseRecord::new(e.key.clone(), coerce(&e.amount), now_millis);
            record.freq = Some(e.freq.clone());
            record
        }));

        let mut incomes = existing.incomes.clone();
        incomes.extend(self.incomes.iter().filter(|i| !i.source.is_empty()).map(|i| {
            let mut record = IncomeRecord::new(i.source.clone(), coerce(&i.amount), now_millis)
                .with_last_refresh(now_millis);
            record.freq = Some(i.freq.clone());
            record
        }));

        let onboarding = OnboardingAnswers {
            reason_primary: self
                .reason_primary
                .map(|r| r.as_str().to_string())
                .unwrap_or_default(),
            save_reason: self.save_reason.clone(),
            target_date: self.target_date.clone(),
            created_at: now_millis,
        };

        let mut patch = Map::new();
        patch.insert("target".into(), Value::from(target));
        patch.insert("expenses".into(), to_json(&expenses));
        patch.insert("incomes".into(), to_json(&incomes));
        patch.insert("onboarding".into(), to_json(&onboarding));
        patch
    }
}

/// Step navigation over [`WizardAnswers`].
#[derive(Debug, Clone, Default)]
pub struct SetupWizard {
    step: usize,
    pub answers: WizardAnswers,
}

impl SetupWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn is_last_step(&self) -> bool {
        self.step == STEP_COUNT - 1
    }

    /// Only the reason and income steps gate progress.
    pub fn can_advance(&self) -> bool {
        match self.step {
            STEP_REASON => self.answers.reason_primary.is_some(),
            STEP_INCOMES => !self.answers.incomes.is_empty(),
            _ => true,
        }
    }

    pub fn next(&mut self) -> bool {
        if !self.can_advance() || self.is_last_step() {
            return false;
        }
        self.step += 1;
        true
    }

    pub fn back(&mut self) -> bool {
        if self.step == 0 {
            return false;
        }
        self.step -= 1;
        true
    }

    pub fn title(&self) -> &'static str {
        match self.step {
            STEP_REASON => "Why do you want to budget?",
            STEP_SAVE_REASON => "Why do you want to save?",
            STEP_TARGET_DATE => "When do you want to achieve your saving target?",
            STEP_TARGET_AMOUNT => "How much do you intend to save?",
            STEP_EXPENSES => "Tell us about your expenses",
            _ => "Tell us about your income",
        }
    }

    /// The answers, once the final step can be submitted.
    pub fn finish(&self) -> Option<&WizardAnswers> {
        (self.is_last_step() && self.can_advance()).then_some(&self.answers)
    }
}

fn coerce(raw: &str) -> f64 {
    Amount::from_json(&Value::String(raw.to_string())).or_zero()
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
