use std::{borrow::Cow, str::FromStr};

use schemars::JsonSchema;
use serde::Deserialize;
use utility_client::domain::{DayPeriod, MonthPeriod, PeriodError, YearPeriod};
use validator::Validate;

pub const MONTH_MESSAGE: &str = "Month must be in the format YYYY-MM";
pub const DATE_MESSAGE: &str = "Date must be in the format YYYY-MM-DD";
pub const YEAR_MESSAGE: &str = "Year must be in the format YYYY";

fn period_format<P: FromStr>(value: &str, message: &'static str) -> Result<(), validator::ValidationError> {
    match value.parse::<P>() {
        Ok(_) => Ok(()),
        Err(_) => {
            let mut error = validator::ValidationError::new("invalid_format");
            error.message = Some(Cow::Borrowed(message));
            Err(error)
        }
    }
}

fn month_format(value: &str) -> Result<(), validator::ValidationError> {
    period_format::<MonthPeriod>(value, MONTH_MESSAGE)
}

fn date_format(value: &str) -> Result<(), validator::ValidationError> {
    period_format::<DayPeriod>(value, DATE_MESSAGE)
}

fn year_format(value: &str) -> Result<(), validator::ValidationError> {
    period_format::<YearPeriod>(value, YEAR_MESSAGE)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate, JsonSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UtilityRequest {
    /// The ID of the utility
    #[validate(length(min = 24, max = 24, message = "Utility ID must be 24 characters long"))]
    pub utility_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate, JsonSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CustomersCountRequest {
    /// The ID of the utility
    #[validate(length(min = 24, max = 24, message = "Utility ID must be 24 characters long"))]
    pub utility_id: String,
    /// Whether to include all customers. If not provided, only active customers will be fetched.
    #[serde(default)]
    pub all_customers: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate, JsonSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UtilityMonthRequest {
    /// The ID of the utility
    #[validate(length(min = 24, max = 24, message = "Utility ID must be 24 characters long"))]
    pub utility_id: String,
    /// The month to summarise, YYYY-MM
    #[validate(custom(function = "month_format"))]
    #[schemars(regex(pattern = r"^\d{4}-\d{2}$"))]
    pub month: String,
}

impl UtilityMonthRequest {
    pub fn period(&self) -> Result<MonthPeriod, PeriodError> {
        self.month.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate, JsonSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UtilityDayRequest {
    /// The ID of the utility
    #[validate(length(min = 24, max = 24, message = "Utility ID must be 24 characters long"))]
    pub utility_id: String,
    /// The day to summarise, YYYY-MM-DD
    #[validate(custom(function = "date_format"))]
    #[schemars(regex(pattern = r"^\d{4}-\d{2}-\d{2}$"))]
    pub date: String,
}

impl UtilityDayRequest {
    pub fn period(&self) -> Result<DayPeriod, PeriodError> {
        self.date.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate, JsonSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UtilityYearRequest {
    /// The ID of the utility
    #[validate(length(min = 24, max = 24, message = "Utility ID must be 24 characters long"))]
    pub utility_id: String,
    /// The year to summarise, YYYY
    #[validate(custom(function = "year_format"))]
    #[schemars(regex(pattern = r"^\d{4}$"))]
    pub year: String,
}

impl UtilityYearRequest {
    pub fn period(&self) -> Result<YearPeriod, PeriodError> {
        self.year.parse()
    }
}
