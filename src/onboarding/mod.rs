//! First-run state: the guided tour, the budget nudge, and the setup
//! questionnaire.

pub mod wizard;

pub use wizard::{
    ExpenseTemplate, SetupWizard, WizardAnswers, WizardExpense, WizardIncome, WizardReason,
    EXPENSE_TEMPLATES, FREQUENCIES,
};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Onboarding progress stored at `users/<uid>/profile/setup`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetupProfile {
    #[serde(default)]
    pub has_done_tour: bool,
    #[serde(default)]
    pub has_done_budget_setup: bool,
    #[serde(default)]
    pub has_seen_budget_nudge: bool,
    #[serde(default)]
    pub tour_completed_as_new_user: bool,
    #[serde(default)]
    pub tour_skipped_as_new_user: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl SetupProfile {
    pub fn new(now_millis: i64) -> Self {
        Self {
            created_at: now_millis,
            updated_at: now_millis,
            ..Self::default()
        }
    }

    pub fn needs_tour(&self) -> bool {
        !self.has_done_tour
    }

    pub fn needs_budget_wizard(&self) -> bool {
        !self.has_done_budget_setup
    }

    /// The nudge is offered once, and only to users who went through the
    /// tour on first run rather than restarting it from help.
    pub fn should_show_budget_nudge(&self) -> bool {
        self.has_done_tour
            && !self.has_seen_budget_nudge
            && (self.tour_completed_as_new_user || self.tour_skipped_as_new_user)
    }
}

/// How the tour was left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourOutcome {
    Completed,
    Skipped,
}

/// Patch written when the tour ends. `forced` marks a tour restarted from
/// the help menu.
pub fn tour_finished_patch(outcome: TourOutcome, forced: bool, now_millis: i64) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert("hasDoneTour".into(), json!(true));
    match outcome {
        TourOutcome::Completed => {
            patch.insert("tourCompletedAt".into(), json!(now_millis));
            patch.insert("tourCompletedAsNewUser".into(), json!(!forced));
        }
        TourOutcome::Skipped => {
            patch.insert("tourSkippedAt".into(), json!(now_millis));
            patch.insert("tourSkippedAsNewUser".into(), json!(!forced));
        }
    }
    patch.insert("updatedAt".into(), json!(now_millis));
    patch
}

/// Patch written when the budget nudge is answered.
pub fn nudge_answered_patch(accepted: bool, now_millis: i64) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert("hasSeenBudgetNudge".into(), json!(true));
    let stamp = if accepted {
        "budgetClickedAt"
    } else {
        "budgetNudgeCancelledAt"
    };
    patch.insert(stamp.into(), json!(now_millis));
    patch.insert("updatedAt".into(), json!(now_millis));
    patch
}

pub fn budget_setup_done_patch(now_millis: i64) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert("hasDoneBudgetSetup".into(), json!(true));
    patch.insert("updatedAt".into(), json!(now_millis));
    patch
}

/// Clears every onboarding flag.
pub fn reset_patch(now_millis: i64) -> Map<String, Value> {
    let mut patch = Map::new();
    for flag in [
        "hasDoneTour",
        "hasDoneBudgetSetup",
        "hasSeenBudgetNudge",
        "tourCompletedAsNewUser",
        "tourSkippedAsNewUser",
    ] {
        patch.insert(flag.into(), json!(false));
    }
    patch.insert("updatedAt".into(), json!(now_millis));
    patch
}
