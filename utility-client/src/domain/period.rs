//! Calendar periods named by the analytics operations (`YYYY-MM-DD`,
//! `YYYY-MM`, `YYYY`). All instants are UTC.

use std::{fmt, str::FromStr};

use time::{
    error::{Parse, ParseFromDescription},
    macros::format_description,
    Date, Month, OffsetDateTime,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("expected {expected}, got '{input}'")]
    Format { expected: &'static str, input: String },
    #[error("'{0}' is not a calendar date")]
    OutOfRange(String),
}

/// Checks the exact width first, then lets `time` parse `padded`, which is
/// `input` completed to a full `YYYY-MM-DD` date.
fn parse_calendar(input: &str, padded: &str, expected: &'static str) -> Result<Date, PeriodError> {
    if input.len() != expected.len() {
        return Err(PeriodError::Format { expected, input: input.to_string() });
    }
    Date::parse(padded, format_description!("[year]-[month]-[day]")).map_err(|e| match e {
        Parse::TryFromParsed(_)
        | Parse::ParseFromDescription(ParseFromDescription::InvalidComponent("month" | "day")) => {
            PeriodError::OutOfRange(input.to_string())
        }
        _ => PeriodError::Format { expected, input: input.to_string() },
    })
}

fn utc_midnight(date: Date) -> OffsetDateTime {
    date.midnight().assume_utc()
}

/// A single day, `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DayPeriod {
    date: Date,
}

impl DayPeriod {
    pub fn date(&self) -> Date {
        self.date
    }
}

impl FromStr for DayPeriod {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = parse_calendar(s, s, "YYYY-MM-DD")?;
        Ok(Self { date })
    }
}

impl fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.date.year(),
            u8::from(self.date.month()),
            self.date.day()
        )
    }
}

/// A calendar month, `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthPeriod {
    year: i32,
    month: Month,
}

impl MonthPeriod {
    pub fn new(year: i32, month: Month) -> Result<Self, PeriodError> {
        let period = Self { year, month };
        // Both ends of the window must be representable.
        period.start()?;
        period.end()?;
        Ok(period)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        self.month
    }

    /// First instant of the month.
    pub fn start(&self) -> Result<OffsetDateTime, PeriodError> {
        Date::from_calendar_date(self.year, self.month, 1)
            .map(utc_midnight)
            .map_err(|_| PeriodError::OutOfRange(self.to_string()))
    }

    /// First instant of the following month; the window is `[start, end)`.
    pub fn end(&self) -> Result<OffsetDateTime, PeriodError> {
        let (year, month) = match self.month {
            Month::December => (self.year + 1, Month::January),
            m => (self.year, m.next()),
        };
        Date::from_calendar_date(year, month, 1)
            .map(utc_midnight)
            .map_err(|_| PeriodError::OutOfRange(self.to_string()))
    }
}

impl FromStr for MonthPeriod {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let first = parse_calendar(s, &format!("{s}-01"), "YYYY-MM")?;
        Self::new(first.year(), first.month())
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

/// A calendar year, `YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearPeriod {
    year: i32,
}

impl YearPeriod {
    pub fn new(year: i32) -> Result<Self, PeriodError> {
        let period = Self { year };
        period.start()?;
        period.end()?;
        Ok(period)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn start(&self) -> Result<OffsetDateTime, PeriodError> {
        MonthPeriod { year: self.year, month: Month::January }.start()
    }

    pub fn end(&self) -> Result<OffsetDateTime, PeriodError> {
        MonthPeriod { year: self.year, month: Month::December }.end()
    }

    /// The twelve months of the year in calendar order.
    pub fn months(&self) -> impl Iterator<Item = MonthPeriod> {
        let year = self.year;
        (1u8..=12).filter_map(move |m| {
            Month::try_from(m).ok().map(|month| MonthPeriod { year, month })
        })
    }
}

impl FromStr for YearPeriod {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let first = parse_calendar(s, &format!("{s}-01-01"), "YYYY")?;
        Self::new(first.year())
    }
}

impl fmt::Display for YearPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year)
    }
}
