use serde::{Deserialize, Serialize};

use super::{apply_money_input, lenient, Amount};
use crate::errors::{FinanceError, Result};

/// A savings goal row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SavingsGoal {
    #[serde(default, deserialize_with = "lenient::text")]
    pub label: String,
    #[serde(default)]
    pub target: Amount,
    #[serde(default)]
    pub saved: Amount,
}

impl SavingsGoal {
    pub fn new(label: impl Into<String>, target: f64, saved: f64) -> Self {
        Self {
            label: label.into(),
            target: Amount::new(target),
            saved: Amount::new(saved),
        }
    }

    /// Still to save, never negative.
    pub fn remaining(&self) -> f64 {
        (self.target.or_zero() - self.saved.or_zero()).max(0.0)
    }
}

/// Editable cell of a goal row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalField {
    Label,
    Target,
    Saved,
}

impl GoalField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "label" => Some(GoalField::Label),
            "target" => Some(GoalField::Target),
            "saved" => Some(GoalField::Saved),
            _ => None,
        }
    }
}

/// The per-user savings document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SavingsModel {
    #[serde(default, deserialize_with = "lenient::list")]
    pub goals: Vec<SavingsGoal>,
}

impl SavingsModel {
    pub fn total_remaining(&self) -> f64 {
        self.goals.iter().map(SavingsGoal::remaining).sum()
    }

    /// `(label, remaining)` for every goal, in row order.
    pub fn remaining_by_goal(&self) -> Vec<(String, f64)> {
        self.goals
            .iter()
            .map(|goal| (goal.label.clone(), goal.remaining()))
            .collect()
    }

    /// Commits a cell edit. Label cells take the raw text; amount cells go
    /// through expression entry and keep the prior value when it fails.
    pub fn edit(&mut self, row: usize, field: GoalField, raw: &str) -> Result<()> {
        let goal = self
            .goals
            .get_mut(row)
            .ok_or_else(|| FinanceError::RecordNotFound(format!("savings row {row}")))?;
        match field {
            GoalField::Label => goal.label = raw.to_string(),
            GoalField::Target => {
                goal.target = Amount::new(apply_money_input(raw, goal.target.or_zero()))
            }
            GoalField::Saved => {
                goal.saved = Amount::new(apply_money_input(raw, goal.saved.or_zero()))
            }
        }
        Ok(())
    }

    pub fn add_row(&mut self) {
        self.goals.push(SavingsGoal::default());
    }

    pub fn remove_row(&mut self, row: usize) -> Result<SavingsGoal> {
        if row >= self.goals.len() {
            return Err(FinanceError::RecordNotFound(format!("savings row {row}")));
        }
        Ok(self.goals.remove(row))
    }
}
