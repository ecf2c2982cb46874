//! Budget period boundaries and membership tests.
//!
//! All boundaries are local-calendar midnights in the calculator's time zone.
//! With the default `Local` zone the result therefore depends on the host's
//! time zone setting; pass an explicit zone through
//! [`PeriodCalculator::with_timezone`] to pin it.

pub mod schedule;

pub use schedule::Schedule;

use chrono::{
    DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc,
};

const DST_SCAN_STEP_MINUTES: i64 = 15;
const DST_SCAN_LIMIT: usize = 4 * 24;

/// One budgeting cycle: `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Period<Tz: TimeZone = Local> {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    /// Schedule-prefixed start date, e.g. `W:2025-03-10`. Stable for every
    /// reference date inside the period.
    pub key: String,
    pub schedule: Schedule,
}

impl<Tz: TimeZone> Period<Tz> {
    /// Half-open membership test on epoch milliseconds.
    pub fn contains(&self, ts_millis: i64) -> bool {
        is_in_range(ts_millis, self)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Last calendar day that still belongs to the period.
    pub fn last_date(&self) -> NaiveDate {
        self.end.date_naive() - Duration::days(1)
    }

    pub fn length_days(&self) -> i64 {
        (self.end.date_naive() - self.start.date_naive()).num_days()
    }
}

/// Returns true iff `start <= ts < end`.
pub fn is_in_range<Tz: TimeZone>(ts_millis: i64, period: &Period<Tz>) -> bool {
    period.start.timestamp_millis() <= ts_millis && ts_millis < period.end.timestamp_millis()
}

/// Computes periods against a fixed time zone.
#[derive(Debug, Clone)]
pub struct PeriodCalculator<Tz: TimeZone = Local> {
    tz: Tz,
}

impl PeriodCalculator<Local> {
    /// Calculator using the host's local time zone.
    pub fn local() -> Self {
        Self { tz: Local }
    }
}

impl Default for PeriodCalculator<Local> {
    fn default() -> Self {
        Self::local()
    }
}

impl<Tz: TimeZone> PeriodCalculator<Tz> {
    pub fn with_timezone(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    /// Interprets epoch milliseconds in this calculator's zone.
    pub fn datetime_from_millis(&self, ts_millis: i64) -> Option<DateTime<Tz>> {
        self.tz.timestamp_millis_opt(ts_millis).single()
    }

    /// Resolves a stored schedule name and computes the period containing
    /// `reference` (now when omitted).
    pub fn get_period(&self, schedule: Option<&str>, reference: Option<&DateTime<Tz>>) -> Period<Tz> {
        let reference = match reference {
            Some(value) => value.clone(),
            None => self.now(),
        };
        self.period_for(Schedule::from_name(schedule), &reference)
    }

    /// The period of `schedule` containing `reference`.
    ///
    /// Fortnights start on the Monday of an odd ISO week. In a year with 53
    /// ISO weeks, week 53 and the following week 1 both start a fortnight,
    /// so the fortnight starting in week 53 overlaps the next one by a week
    /// (`F:2026-12-28` runs to 2027-01-11 while `F:2027-01-04` starts on
    /// 2027-01-04). Every other schedule tiles exactly.
    pub fn period_for(&self, schedule: Schedule, reference: &DateTime<Tz>) -> Period<Tz> {
        let day = reference.with_timezone(&self.tz).date_naive();
        let (start, end) = match schedule {
            Schedule::Weekly => {
                let start = monday_of(day);
                (start, start + Duration::days(7))
            }
            Schedule::Fortnight => {
                let monday = monday_of(day);
                let start = if week_number(monday) % 2 == 1 {
                    monday
                } else {
                    monday - Duration::days(7)
                };
                (start, start + Duration::days(14))
            }
            Schedule::Monthly => {
                let start = first_of_month(day.year(), day.month());
                let end = if day.month() == 12 {
                    first_of_month(day.year() + 1, 1)
                } else {
                    first_of_month(day.year(), day.month() + 1)
                };
                (start, end)
            }
            Schedule::Yearly => (
                first_of_month(day.year(), 1),
                first_of_month(day.year() + 1, 1),
            ),
        };

        Period {
            start: self.midnight(start),
            end: self.midnight(end),
            key: period_key(schedule, start),
            schedule,
        }
    }

    /// The period containing `period.end`. That period begins at
    /// `period.end`, except after a fortnight starting in ISO week 53, where
    /// it begins a week earlier.
    pub fn next_period(&self, period: &Period<Tz>) -> Period<Tz> {
        self.period_for(period.schedule, &period.end)
    }

    /// The period that ends where `period` begins.
    pub fn previous_period(&self, period: &Period<Tz>) -> Period<Tz> {
        let before = self.midnight(period.start.date_naive() - Duration::days(1));
        self.period_for(period.schedule, &before)
    }

    /// First instant of `date` in this zone. When midnight falls in a DST
    /// gap the first representable instant after it is used.
    pub fn midnight(&self, date: NaiveDate) -> DateTime<Tz> {
        let naive = date.and_time(NaiveTime::MIN);
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => {
                let mut candidate = naive;
                for _ in 0..DST_SCAN_LIMIT {
                    candidate += Duration::minutes(DST_SCAN_STEP_MINUTES);
                    if let Some(dt) = self.tz.from_local_datetime(&candidate).earliest() {
                        return dt;
                    }
                }
                self.tz.from_utc_datetime(&naive)
            }
        }
    }
}

/// Computes the period for `schedule` in the host's local zone.
pub fn get_period(schedule: &str, reference: Option<DateTime<Local>>) -> Period<Local> {
    PeriodCalculator::local().get_period(Some(schedule), reference.as_ref())
}

/// Monday-based, Thursday-anchored week number.
///
/// The date is shifted to the Thursday of its week and compared with the
/// first Thursday of that Thursday's year; whole elapsed weeks plus one.
pub fn week_number(date: NaiveDate) -> u32 {
    let from_monday = date.weekday().num_days_from_monday() as i64;
    let thursday = date - Duration::days(from_monday) + Duration::days(3);
    let jan_first = first_of_month(thursday.year(), 1);
    let to_thursday = (3 + 7 - jan_first.weekday().num_days_from_monday() as i64) % 7;
    let first_thursday = jan_first + Duration::days(to_thursday);
    let elapsed = (thursday - first_thursday).num_days();
    (elapsed.div_euclid(7) + 1) as u32
}

pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        first_of_month(year + 1, 1)
    } else {
        first_of_month(year, month + 1)
    };
    (next - Duration::days(1)).day()
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn period_key(schedule: Schedule, start: NaiveDate) -> String {
    format!("{}:{}", schedule.key_prefix(), start.format("%Y-%m-%d"))
}
