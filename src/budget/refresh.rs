//! Pay-cycle refresh of recurring incomes.
//!
//! When a new pay cycle starts the amount recorded for the previous cycle is
//! stale: the income is zeroed and stamped so the user re-enters it. The
//! decision is pure; [`refresh_incomes`] applies it to a whole list.

use chrono::{DateTime, Datelike, TimeZone};
use tracing::debug;

use super::{Amount, BudgetSettings, IncomeRecord};
use crate::period::Schedule;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Whether `income` has crossed into a new pay cycle at `now`.
///
/// Incomes never stamped with `last_refresh` are left alone, as is
/// everything when auto-refresh is off. `schedule` must be a canonical
/// name; any other value never refreshes. Calendar fields are read in
/// `now`'s time zone.
pub fn should_refresh<Tz: TimeZone>(
    income: &IncomeRecord,
    schedule: &str,
    settings: &BudgetSettings,
    now: &DateTime<Tz>,
) -> bool {
    if !settings.auto_refresh {
        return false;
    }
    let Some(last_millis) = income.last_refresh else {
        return false;
    };
    let Some(schedule) = Schedule::parse_exact(schedule) else {
        return false;
    };
    let Some(last) = now.timezone().timestamp_millis_opt(last_millis).single() else {
        return false;
    };

    match schedule {
        Schedule::Weekly => {
            let pay_day = income.pay_day.unwrap_or(settings.default_pay_day);
            whole_days_between(&last, now) >= 7 && now.weekday().num_days_from_sunday() == pay_day
        }
        Schedule::Fortnight => whole_days_between(&last, now) >= 14,
        // Only the month index is compared, so a refresh on the same month a
        // year later does not fire.
        Schedule::Monthly => {
            let pay_date = income.pay_date.unwrap_or(settings.default_pay_date);
            now.day() == pay_date && now.month() != last.month()
        }
        Schedule::Yearly => now.year() != last.year(),
    }
}

/// Zeroes the amount and stamps the refresh time. Identity and pay fields
/// are untouched.
pub fn apply_refresh(income: &mut IncomeRecord, now_millis: i64) {
    income.amount = Amount::ZERO;
    income.last_refresh = Some(now_millis);
}

/// Runs the refresher over every income. Returns the rewritten list only
/// when at least one income changed.
pub fn refresh_incomes<Tz: TimeZone>(
    incomes: &[IncomeRecord],
    schedule: &str,
    settings: &BudgetSettings,
    now: &DateTime<Tz>,
) -> Option<Vec<IncomeRecord>> {
    let now_millis = now.timestamp_millis();
    let mut changed = false;
    let updated = incomes
        .iter()
        .map(|income| {
            let mut income = income.clone();
            if should_refresh(&income, schedule, settings, now) {
                debug!(id = %income.id, source = %income.source, schedule, "income refreshed");
                apply_refresh(&mut income, now_millis);
                changed = true;
            }
            income
        })
        .collect();
    changed.then_some(updated)
}

fn whole_days_between<Tz: TimeZone>(from: &DateTime<Tz>, to: &DateTime<Tz>) -> i64 {
    (to.timestamp_millis() - from.timestamp_millis()).div_euclid(MILLIS_PER_DAY)
}
