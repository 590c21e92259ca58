//! Calendar age string for the profile card.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};

/// Whole years, months and days between two dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Age {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

/// Calendar difference from `birthday` to `today`; zero if `today` is earlier.
///
/// Month arithmetic clamps to the end of shorter months, so a Jan 31
/// birthday reaches its first month on the last day of February.
pub fn age_between(birthday: NaiveDate, today: NaiveDate) -> Age {
    if today <= birthday {
        return Age::default();
    }

    let mut months = (today.year() - birthday.year()) * 12 + today.month() as i32
        - birthday.month() as i32;
    let mut anchor = add_months(birthday, months);
    if anchor > today {
        months -= 1;
        anchor = add_months(birthday, months);
    }

    let months = months.max(0) as u32;
    Age {
        years: months / 12,
        months: months % 12,
        days: (today - anchor).num_days().max(0) as u32,
    }
}

fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    date.checked_add_months(Months::new(months.max(0) as u32))
        .unwrap_or(NaiveDate::MAX)
}

fn plural(value: u32, unit: &str) -> String {
    if value == 1 {
        format!("{} {}", value, unit)
    } else {
        format!("{} {}s", value, unit)
    }
}

impl Age {
    pub fn is_birthday(&self) -> bool {
        self.months == 0 && self.days == 0
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}{}",
            plural(self.years, "year"),
            plural(self.months, "month"),
            plural(self.days, "day"),
            if self.is_birthday() { " 🎂" } else { "" }
        )
    }
}
