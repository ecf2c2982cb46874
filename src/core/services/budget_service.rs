use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use tracing::{info, warn};

use crate::auth::budget_model_path;
use crate::budget::{
    apply_money_input, refresh_incomes, summarize, to_money, Amount, BudgetModel, BudgetSettings,
    BudgetSummary, ExpenseRecord, IncomeRecord,
};
use crate::core::Clock;
use crate::onboarding::WizardAnswers;
use crate::period::{PeriodCalculator, Schedule};
use crate::store::{DocumentStore, UserDoc};

use super::{field_patch, OnboardingService, ServiceError, ServiceResult};

const MAX_PAY_DAY: u32 = 6;
const MAX_PAY_DATE: u32 = 31;

/// Budget document operations for one user.
///
/// Every mutation is a merge-patch of the touched top-level fields. After
/// opening and after each write the document is backfilled and recurring
/// incomes are refreshed against the clock.
pub struct BudgetService<Tz: TimeZone = Local> {
    doc: UserDoc<BudgetModel>,
    calendar: PeriodCalculator<Tz>,
    clock: Arc<dyn Clock>,
}

impl<Tz: TimeZone> BudgetService<Tz> {
    /// Connects and syncs. A failed sync is logged, not returned.
    pub fn open(
        store: Arc<dyn DocumentStore>,
        uid: Option<&str>,
        calendar: PeriodCalculator<Tz>,
        clock: Arc<dyn Clock>,
    ) -> ServiceResult<Self> {
        let service = Self::connect(store, uid, calendar, clock)?;
        if let Err(err) = service.sync() {
            warn!(error = %err, "budget sync on open failed");
        }
        Ok(service)
    }

    /// Opens the document without running [`sync`](Self::sync).
    pub fn connect(
        store: Arc<dyn DocumentStore>,
        uid: Option<&str>,
        calendar: PeriodCalculator<Tz>,
        clock: Arc<dyn Clock>,
    ) -> ServiceResult<Self> {
        let path = uid.map(budget_model_path).transpose()?;
        Ok(Self {
            doc: UserDoc::open(store, path, BudgetModel::default()),
            calendar,
            clock,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.doc.is_ready()
    }

    pub fn model(&self) -> BudgetModel {
        self.doc.data_or_default()
    }

    pub fn calendar(&self) -> &PeriodCalculator<Tz> {
        &self.calendar
    }

    pub fn now(&self) -> DateTime<Tz> {
        self.clock.now().with_timezone(self.calendar.timezone())
    }

    /// Backfills missing fields, then zeroes incomes whose pay cycle has
    /// rolled over. Writes only when something changed.
    pub fn sync(&self) -> ServiceResult<bool> {
        if self.doc.path().is_none() {
            return Ok(false);
        }
        let mut changed = false;
        if let Some(raw) = self.doc.raw() {
            let backfill = BudgetModel::backfill_patch(&raw);
            if !backfill.is_empty() {
                self.doc.update(backfill)?;
                changed = true;
            }
        }

        let model = self.model();
        let now = self.now();
        if let Some(incomes) =
            refresh_incomes(&model.incomes, model.refresh_schedule(), &model.settings, &now)
        {
            info!(schedule = %model.schedule, "recurring incomes refreshed");
            self.doc.update(field_patch("incomes", &incomes)?)?;
            changed = true;
        }
        Ok(changed)
    }

    /// Totals for the period holding `reference`, or the current one.
    pub fn summary(&self, reference: Option<&DateTime<Tz>>) -> BudgetSummary<Tz> {
        let model = self.model();
        let now = self.now();
        let reference = reference.unwrap_or(&now);
        let period = self.calendar.get_period(Some(model.schedule.as_str()), Some(reference));
        summarize(&model, period)
    }

    pub fn set_schedule(&self, name: &str) -> ServiceResult<Schedule> {
        let schedule: Schedule = name.parse()?;
        self.write("schedule", &schedule.as_str())?;
        Ok(schedule)
    }

    /// Merges `changes` into the stored settings.
    pub fn update_settings(&self, changes: SettingsUpdate) -> ServiceResult<BudgetSettings> {
        let mut settings = self.model().settings;
        if let Some(auto_refresh) = changes.auto_refresh {
            settings.auto_refresh = auto_refresh;
        }
        if let Some(pay_day) = changes.default_pay_day {
            settings.default_pay_day = check_pay_day(pay_day)?;
        }
        if let Some(pay_date) = changes.default_pay_date {
            settings.default_pay_date = check_pay_date(pay_date)?;
        }
        self.write("settings", &settings)?;
        Ok(settings)
    }

    /// Records a new recurring income stamped as refreshed now. Weekly and
    /// fortnightly budgets store a pay weekday, monthly budgets a pay date.
    pub fn add_income(
        &self,
        source: &str,
        amount: &str,
        pay_day: Option<u32>,
        pay_date: Option<u32>,
    ) -> ServiceResult<IncomeRecord> {
        let source = source.trim();
        if source.is_empty() {
            return Err(ServiceError::Invalid("Please enter a source of income.".into()));
        }
        let amount = positive_money(amount)?;
        let model = self.model();
        let now_millis = self.clock.now_millis();

        let mut income = IncomeRecord::new(source, amount, now_millis).with_last_refresh(now_millis);
        match Schedule::parse_exact(&model.schedule) {
            Some(schedule) if schedule.uses_pay_day() => {
                let day = pay_day.unwrap_or(model.settings.default_pay_day);
                income = income.with_pay_day(check_pay_day(day)?);
            }
            Some(schedule) if schedule.uses_pay_date() => {
                let date = pay_date.unwrap_or(model.settings.default_pay_date);
                income = income.with_pay_date(check_pay_date(date)?);
            }
            _ => {}
        }

        let mut incomes = model.incomes;
        incomes.push(income.clone());
        self.write("incomes", &incomes)?;
        Ok(income)
    }

    pub fn add_expense(&self, category: &str, amount: &str) -> ServiceResult<ExpenseRecord> {
        let category = category.trim();
        if category.is_empty() {
            return Err(ServiceError::Invalid("Please enter a spending category.".into()));
        }
        self.push_expense(category, positive_money(amount)?)
    }

    /// Adds a further spend to an existing category as its own entry.
    pub fn add_to_category(&self, category: &str, input: &str) -> ServiceResult<ExpenseRecord> {
        self.push_expense(category, positive_money(input)?)
    }

    pub fn set_target(&self, input: &str) -> ServiceResult<f64> {
        let target = to_money(input)
            .filter(|value| *value >= 0.0)
            .ok_or_else(|| ServiceError::Invalid("Enter a valid number (0 or more).".into()))?;
        self.write("target", &Amount::new(target))?;
        Ok(target)
    }

    /// Applies money entry (`+10`, `*2`, `45.5`) to an income amount. An
    /// entry that does not evaluate keeps the prior amount.
    pub fn edit_income_amount(&self, id: &str, input: &str) -> ServiceResult<f64> {
        let mut incomes = self.model().incomes;
        let income = incomes
            .iter_mut()
            .find(|income| income.id == id)
            .ok_or_else(|| not_found("income", id))?;
        let value = apply_money_input(input, income.amount.or_zero());
        income.amount = Amount::new(value);
        self.write("incomes", &incomes)?;
        Ok(value)
    }

    pub fn edit_expense_amount(&self, id: &str, input: &str) -> ServiceResult<f64> {
        let mut expenses = self.model().expenses;
        let expense = expenses
            .iter_mut()
            .find(|expense| expense.id == id)
            .ok_or_else(|| not_found("expense", id))?;
        let value = apply_money_input(input, expense.amount.or_zero());
        expense.amount = Amount::new(value);
        self.write("expenses", &expenses)?;
        Ok(value)
    }

    pub fn remove_income(&self, id: &str) -> ServiceResult<IncomeRecord> {
        let mut incomes = self.model().incomes;
        let index = incomes
            .iter()
            .position(|income| income.id == id)
            .ok_or_else(|| not_found("income", id))?;
        let removed = incomes.remove(index);
        self.write("incomes", &incomes)?;
        Ok(removed)
    }

    pub fn remove_expense(&self, id: &str) -> ServiceResult<ExpenseRecord> {
        let mut expenses = self.model().expenses;
        let index = expenses
            .iter()
            .position(|expense| expense.id == id)
            .ok_or_else(|| not_found("expense", id))?;
        let removed = expenses.remove(index);
        self.write("expenses", &expenses)?;
        Ok(removed)
    }

    /// Writes the questionnaire answers into the budget and marks setup as
    /// done on the user's profile.
    pub fn complete_wizard(
        &self,
        answers: &WizardAnswers,
        onboarding: &OnboardingService,
    ) -> ServiceResult<()> {
        let patch = answers.budget_patch(&self.model(), self.clock.now_millis());
        self.doc.update(patch)?;
        self.sync()?;
        onboarding.mark_budget_setup_done()?;
        info!(
            incomes = answers.incomes.len(),
            expenses = answers.expenses.len(),
            "budget questionnaire completed"
        );
        Ok(())
    }

    fn push_expense(&self, category: &str, amount: f64) -> ServiceResult<ExpenseRecord> {
        let expense = ExpenseRecord::new(category, amount, self.clock.now_millis());
        let mut expenses = self.model().expenses;
        expenses.push(expense.clone());
        self.write("expenses", &expenses)?;
        Ok(expense)
    }

    fn write<V: serde::Serialize>(&self, key: &str, value: &V) -> ServiceResult<()> {
        self.doc.update(field_patch(key, value)?)?;
        self.sync()?;
        Ok(())
    }
}

/// Partial settings change; `None` leaves a field as stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsUpdate {
    pub auto_refresh: Option<bool>,
    pub default_pay_day: Option<u32>,
    pub default_pay_date: Option<u32>,
}

fn positive_money(input: &str) -> ServiceResult<f64> {
    to_money(input)
        .filter(|value| *value > 0.0)
        .ok_or_else(|| ServiceError::Invalid("Please enter a valid amount greater than 0.".into()))
}

fn check_pay_day(day: u32) -> ServiceResult<u32> {
    if day > MAX_PAY_DAY {
        return Err(ServiceError::Invalid(format!(
            "Pay day must be 0 (Sunday) to 6 (Saturday), got {day}"
        )));
    }
    Ok(day)
}

fn check_pay_date(date: u32) -> ServiceResult<u32> {
    if !(1..=MAX_PAY_DATE).contains(&date) {
        return Err(ServiceError::Invalid(format!(
            "Pay date must be between 1 and 31, got {date}"
        )));
    }
    Ok(date)
}

fn not_found(kind: &str, id: &str) -> ServiceError {
    crate::errors::FinanceError::RecordNotFound(format!("{kind} {id}")).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DevHooks;
    use crate::core::FixedClock;
    use crate::store::{DocPath, MemoryStore};
    use chrono::{Duration, Utc};
    use serde_json::json;

    struct Fixture {
        store: Arc<MemoryStore>,
        clock: Arc<FixedClock>,
        budget: BudgetService<Utc>,
    }

    fn fixture() -> Fixture {
        // Friday 2025-03-07 09:00 UTC.
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 7, 9, 0, 0).unwrap()));
        let store = Arc::new(MemoryStore::new());
        let budget = BudgetService::open(
            store.clone(),
            Some("u1"),
            PeriodCalculator::with_timezone(Utc),
            clock.clone(),
        )
        .unwrap();
        Fixture {
            store,
            clock,
            budget,
        }
    }

    fn reopen(fx: &Fixture) -> BudgetService<Utc> {
        BudgetService::open(
            fx.store.clone(),
            Some("u1"),
            PeriodCalculator::with_timezone(Utc),
            fx.clock.clone(),
        )
        .unwrap()
    }

    #[test]
    fn open_creates_default_document() {
        let fx = fixture();
        assert!(fx.budget.is_ready());
        let stored = fx
            .store
            .read(&DocPath::parse("users/u1/budget/model").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(stored["schedule"], json!("weekly"));
        assert_eq!(stored["settings"]["autoRefresh"], json!(true));
    }

    #[test]
    fn open_backfills_legacy_documents() {
        let store = Arc::new(MemoryStore::new());
        let path = DocPath::parse("users/u1/budget/model").unwrap();
        store.put(&path, json!({"incomes": [], "expenses": [], "target": "50"})).unwrap();
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let budget =
            BudgetService::open(store.clone(), Some("u1"), PeriodCalculator::with_timezone(Utc), clock)
                .unwrap();
        let stored = store.read(&path).unwrap().unwrap();
        assert_eq!(stored["schedule"], json!("weekly"));
        assert_eq!(stored["settings"]["defaultPayDate"], json!(1));
        assert_eq!(budget.model().target(), 50.0);
    }

    #[test]
    fn add_income_validates_and_stamps() {
        let fx = fixture();
        assert!(fx.budget.add_income("  ", "100", None, None).is_err());
        assert!(fx.budget.add_income("Salary", "0", None, None).is_err());
        assert!(fx.budget.add_income("Salary", "abc", None, None).is_err());
        assert!(fx.budget.add_income("Salary", "10", Some(7), None).is_err());

        let income = fx.budget.add_income(" Salary ", "850.456", None, None).unwrap();
        assert_eq!(income.source, "Salary");
        assert_eq!(income.amount.value(), 850.46);
        assert_eq!(income.pay_day, Some(5));
        assert_eq!(income.pay_date, None);
        assert_eq!(income.last_refresh, Some(fx.clock.now_millis()));
        assert_eq!(fx.budget.model().incomes.len(), 1);
    }

    #[test]
    fn monthly_incomes_store_pay_date() {
        let fx = fixture();
        fx.budget.set_schedule("Monthly").unwrap();
        let income = fx.budget.add_income("Rent share", "300", Some(2), Some(15)).unwrap();
        assert_eq!(income.pay_day, None);
        assert_eq!(income.pay_date, Some(15));
        assert!(fx.budget.set_schedule("quarterly").is_err());
        assert_eq!(fx.budget.model().schedule, "monthly");
    }

    #[test]
    fn summary_groups_current_period() {
        let fx = fixture();
        fx.budget.add_income("Salary", "1000", None, None).unwrap();
        fx.budget.add_expense("Food", "40").unwrap();
        fx.budget.add_to_category("Food", "10.5").unwrap();
        fx.budget.add_expense("Fuel", "60").unwrap();
        fx.budget.set_target("100").unwrap();

        let summary = fx.budget.summary(None);
        assert_eq!(summary.period.key, "W:2025-03-03");
        assert_eq!(summary.total_income, 1000.0);
        assert_eq!(summary.spend_by_category["Food"], 50.5);
        assert_eq!(summary.total_spend, 110.5);
        assert_eq!(summary.remaining, 0.0);
        assert_eq!(summary.over, 10.5);

        let next_week = fx.budget.now() + Duration::days(7);
        assert_eq!(fx.budget.summary(Some(&next_week)).total_spend, 0.0);
    }

    #[test]
    fn set_target_rejects_negative() {
        let fx = fixture();
        assert!(fx.budget.set_target("-5").is_err());
        assert_eq!(fx.budget.set_target("0").unwrap(), 0.0);
    }

    #[test]
    fn edits_keep_prior_value_on_bad_input() {
        let fx = fixture();
        let expense = fx.budget.add_expense("Food", "20").unwrap();
        assert_eq!(fx.budget.edit_expense_amount(&expense.id, "+5").unwrap(), 25.0);
        assert_eq!(fx.budget.edit_expense_amount(&expense.id, "/0").unwrap(), 25.0);
        assert_eq!(fx.budget.edit_expense_amount(&expense.id, "*2").unwrap(), 50.0);
        assert!(fx.budget.edit_expense_amount("missing", "1").is_err());

        let income = fx.budget.add_income("Salary", "100", None, None).unwrap();
        assert_eq!(fx.budget.edit_income_amount(&income.id, "oops").unwrap(), 100.0);
    }

    #[test]
    fn remove_drops_only_the_named_record() {
        let fx = fixture();
        let first = fx.budget.add_expense("Food", "20").unwrap();
        fx.budget.add_expense("Fuel", "30").unwrap();
        fx.budget.remove_expense(&first.id).unwrap();
        let model = fx.budget.model();
        assert_eq!(model.expenses.len(), 1);
        assert_eq!(model.expenses[0].category, "Fuel");
        assert!(fx.budget.remove_income("nope").is_err());
    }

    #[test]
    fn reopening_after_a_week_refreshes_on_pay_day() {
        let fx = fixture();
        fx.budget.add_income("Salary", "850", None, None).unwrap();

        // Thursday: seven days not yet elapsed.
        fx.clock.advance(Duration::days(6));
        assert_eq!(reopen(&fx).model().incomes[0].amount.value(), 850.0);

        // Next Friday.
        fx.clock.advance(Duration::days(1));
        let reopened = reopen(&fx);
        let income = &reopened.model().incomes[0];
        assert_eq!(income.amount.value(), 0.0);
        assert_eq!(income.last_refresh, Some(fx.clock.now_millis()));
    }

    #[test]
    fn settings_merge_and_disable_refresh() {
        let fx = fixture();
        fx.budget.add_income("Salary", "850", None, None).unwrap();
        let settings = fx
            .budget
            .update_settings(SettingsUpdate {
                auto_refresh: Some(false),
                ..SettingsUpdate::default()
            })
            .unwrap();
        assert!(!settings.auto_refresh);
        assert_eq!(settings.default_pay_day, 5);

        fx.clock.advance(Duration::days(7));
        assert_eq!(reopen(&fx).model().incomes[0].amount.value(), 850.0);
    }

    #[test]
    fn wizard_appends_records_and_marks_setup() {
        let fx = fixture();
        fx.budget.add_expense("Existing", "5").unwrap();
        let onboarding = OnboardingService::open(
            fx.store.clone(),
            Some("u1"),
            fx.clock.clone(),
            DevHooks::disabled(),
        )
        .unwrap();

        let mut answers = WizardAnswers::default();
        answers.toggle_template("Groceries");
        answers.update_expense("Groceries", Some("weekly"), Some("120"));
        assert!(answers.add_income("Salary", "weekly", "900"));
        answers.target_amount = "250".into();

        fx.budget.complete_wizard(&answers, &onboarding).unwrap();
        let model = fx.budget.model();
        assert_eq!(model.expenses.len(), 2);
        assert_eq!(model.incomes.len(), 1);
        assert_eq!(model.target(), 250.0);
        assert!(model.onboarding.is_some());
        assert!(!onboarding.needs_budget_wizard());
    }

    #[test]
    fn signed_out_service_is_inert() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let budget = BudgetService::open(
            Arc::new(MemoryStore::new()),
            None,
            PeriodCalculator::with_timezone(Utc),
            clock,
        )
        .unwrap();
        assert!(!budget.is_ready());
        assert!(budget.add_expense("Food", "5").is_ok());
        assert!(budget.model().expenses.is_empty());
    }

    const OPENED_AT: i64 = 1_741_338_000_000;

    fn seeded(document: serde_json::Value) -> (Fixture, DocPath) {
        let fx = fixture();
        let path = DocPath::parse("users/u2/budget/model").unwrap();
        fx.store.put(&path, document).unwrap();
        let budget = BudgetService::open(
            fx.store.clone(),
            Some("u2"),
            PeriodCalculator::with_timezone(Utc),
            fx.clock.clone(),
        )
        .unwrap();
        (Fixture { budget, ..fx }, path)
    }

    #[test]
    fn loosely_typed_records_survive_a_write() {
        let (fx, path) = seeded(json!({
            "schedule": "weekly",
            "incomes": [{
                "id": "inc-1",
                "source": "Job",
                "amount": "900",
                "ts": OPENED_AT as f64,
                "payDay": "5"
            }],
            "expenses": [{"id": "exp-1", "category": "Rent", "amount": 500, "ts": OPENED_AT}]
        }));
        assert_eq!(fx.budget.model().expenses.len(), 1);

        fx.budget.add_expense("Food", "3").unwrap();
        let model = fx.budget.model();
        assert_eq!(model.expenses.len(), 2);
        assert_eq!(model.expenses[0].category, "Rent");
        assert_eq!(model.expenses[0].amount.value(), 500.0);
        assert_eq!(model.incomes[0].pay_day, Some(5));

        fx.budget.edit_income_amount("inc-1", "950").unwrap();
        let stored = fx.store.read(&path).unwrap().unwrap();
        assert_eq!(stored["expenses"][0]["id"], json!("exp-1"));
        assert_eq!(stored["incomes"][0]["payDay"], json!(5));
        assert_eq!(stored["incomes"][0]["amount"], json!(950.0));
    }

    #[test]
    fn untypable_documents_refuse_writes() {
        let original = json!({
            "schedule": "weekly",
            "incomes": "oops",
            "expenses": [{"id": "exp-1", "category": "Rent", "amount": 500, "ts": 0}]
        });
        let (fx, path) = seeded(original.clone());
        assert!(fx.budget.model().expenses.is_empty());

        let err = fx.budget.add_expense("Food", "3").unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Finance(crate::errors::FinanceError::UnreadableDocument { .. })
        ));
        assert!(fx.budget.set_target("10").is_err());
        assert_eq!(fx.store.read(&path).unwrap(), Some(original));
    }

    #[test]
    fn unreadable_amounts_are_kept_through_writes() {
        let (fx, path) = seeded(json!({
            "schedule": "weekly",
            "expenses": [
                {"id": "a", "category": "Food", "amount": 10, "ts": OPENED_AT},
                {"id": "b", "category": "food ", "amount": "bad", "ts": OPENED_AT}
            ]
        }));
        fx.budget.add_expense("Fuel", "1").unwrap();

        let stored = fx.store.read(&path).unwrap().unwrap();
        assert_eq!(stored["expenses"][1]["amount"], json!("bad"));
        assert_eq!(stored["expenses"].as_array().map(Vec::len), Some(3));

        let spend = fx.budget.summary(None).spend_by_category;
        assert!(!spend.contains_key("food"));
        assert_eq!(spend["Food"], 10.0);
        assert_eq!(spend["Fuel"], 1.0);
    }
}
