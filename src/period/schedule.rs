use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::FinanceError;

/// Budget cycle length. Governs period boundaries and pay-day semantics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    #[default]
    Weekly,
    Fortnight,
    Monthly,
    Yearly,
}

impl Schedule {
    pub const ALL: [Schedule; 4] = [
        Schedule::Weekly,
        Schedule::Fortnight,
        Schedule::Monthly,
        Schedule::Yearly,
    ];

    /// Resolves a stored schedule name for period computation.
    ///
    /// Matching is case-insensitive and accepts `fortnightly`. A missing or
    /// empty name means weekly; any other unknown name falls back to yearly.
    pub fn from_name(name: Option<&str>) -> Schedule {
        let raw = match name {
            Some(value) if !value.is_empty() => value.to_lowercase(),
            _ => return Schedule::Weekly,
        };
        match raw.as_str() {
            "weekly" => Schedule::Weekly,
            "fortnight" | "fortnightly" => Schedule::Fortnight,
            "monthly" => Schedule::Monthly,
            _ => Schedule::Yearly,
        }
    }

    /// Exact, case-sensitive match against the canonical names.
    ///
    /// The income refresher uses this: a schedule stored under any other
    /// spelling never triggers a refresh.
    pub fn parse_exact(name: &str) -> Option<Schedule> {
        Schedule::ALL.into_iter().find(|s| s.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Schedule::Weekly => "weekly",
            Schedule::Fortnight => "fortnight",
            Schedule::Monthly => "monthly",
            Schedule::Yearly => "yearly",
        }
    }

    /// Single-letter prefix used in period keys.
    pub fn key_prefix(&self) -> char {
        match self {
            Schedule::Weekly => 'W',
            Schedule::Fortnight => 'F',
            Schedule::Monthly => 'M',
            Schedule::Yearly => 'Y',
        }
    }

    /// Weekly and fortnightly incomes record a weekday they are paid on.
    pub fn uses_pay_day(&self) -> bool {
        matches!(self, Schedule::Weekly | Schedule::Fortnight)
    }

    /// Monthly incomes record a day of the month they are paid on.
    pub fn uses_pay_date(&self) -> bool {
        matches!(self, Schedule::Monthly)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Schedule::Weekly => "Weekly",
            Schedule::Fortnight => "Fortnightly",
            Schedule::Monthly => "Monthly",
            Schedule::Yearly => "Yearly",
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse for user input: trimmed, case-insensitive, `fortnightly`
/// accepted. Unknown names are rejected rather than defaulted.
impl FromStr for Schedule {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        if lowered == "fortnightly" {
            return Ok(Schedule::Fortnight);
        }
        Schedule::parse_exact(&lowered)
            .ok_or_else(|| FinanceError::InvalidInput(format!("unknown schedule `{}`", s.trim())))
    }
}
