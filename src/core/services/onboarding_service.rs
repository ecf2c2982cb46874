use std::sync::Arc;

use tracing::info;

use crate::auth::setup_profile_path;
use crate::config::DevHooks;
use crate::core::Clock;
use crate::errors::FinanceError;
use crate::onboarding::{
    budget_setup_done_patch, nudge_answered_patch, reset_patch, tour_finished_patch, SetupProfile,
    TourOutcome,
};
use crate::store::{DocPatch, DocumentStore, UserDoc};

use super::ServiceResult;

/// First-run flags for one user.
pub struct OnboardingService {
    doc: UserDoc<SetupProfile>,
    clock: Arc<dyn Clock>,
    dev_hooks: DevHooks,
}

impl OnboardingService {
    pub fn open(
        store: Arc<dyn DocumentStore>,
        uid: Option<&str>,
        clock: Arc<dyn Clock>,
        dev_hooks: DevHooks,
    ) -> ServiceResult<Self> {
        let path = uid.map(setup_profile_path).transpose()?;
        let defaults = SetupProfile::new(clock.now_millis());
        Ok(Self {
            doc: UserDoc::open(store, path, defaults),
            clock,
            dev_hooks,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.doc.is_ready()
    }

    pub fn profile(&self) -> SetupProfile {
        self.doc.data_or_default()
    }

    pub fn needs_tour(&self) -> bool {
        self.doc.is_ready() && self.profile().needs_tour()
    }

    pub fn needs_budget_wizard(&self) -> bool {
        self.doc.is_ready() && self.profile().needs_budget_wizard()
    }

    pub fn should_show_budget_nudge(&self) -> bool {
        self.doc.is_ready() && self.profile().should_show_budget_nudge()
    }

    /// `forced` marks a tour restarted from help rather than shown on
    /// first run.
    pub fn complete_tour(&self, forced: bool) -> ServiceResult<()> {
        self.write(tour_finished_patch(TourOutcome::Completed, forced, self.clock.now_millis()))
    }

    pub fn skip_tour(&self, forced: bool) -> ServiceResult<()> {
        self.write(tour_finished_patch(TourOutcome::Skipped, forced, self.clock.now_millis()))
    }

    pub fn accept_nudge(&self) -> ServiceResult<()> {
        self.write(nudge_answered_patch(true, self.clock.now_millis()))
    }

    pub fn dismiss_nudge(&self) -> ServiceResult<()> {
        self.write(nudge_answered_patch(false, self.clock.now_millis()))
    }

    pub fn mark_budget_setup_done(&self) -> ServiceResult<()> {
        self.write(budget_setup_done_patch(self.clock.now_millis()))
    }

    /// Clears every onboarding flag. Only available with developer hooks.
    pub fn reset(&self) -> ServiceResult<()> {
        if !self.dev_hooks.enabled {
            return Err(FinanceError::DevHooksDisabled.into());
        }
        info!("onboarding flags reset");
        self.write(reset_patch(self.clock.now_millis()))
    }

    fn write(&self, patch: DocPatch) -> ServiceResult<()> {
        self.doc.update(patch)?;
        Ok(())
    }
}
