use std::{fmt, str::FromStr};

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::contract::{
    CustomersCountRequest, UtilityDayRequest, UtilityMonthRequest, UtilityRequest,
    UtilityYearRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    GetUtilityInfo,
    GetCustomersCount,
    GetMonthlyPaymentTotals,
    GetYearlyPaymentTotals,
    GetDailyEnergySummary,
    GetMonthlyEnergySummary,
    GetYearlyEnergySummary,
}

impl ToolName {
    pub const ALL: [ToolName; 7] = [
        ToolName::GetCustomersCount,
        ToolName::GetMonthlyPaymentTotals,
        ToolName::GetUtilityInfo,
        ToolName::GetDailyEnergySummary,
        ToolName::GetMonthlyEnergySummary,
        ToolName::GetYearlyEnergySummary,
        ToolName::GetYearlyPaymentTotals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetUtilityInfo => "getUtilityInfo",
            Self::GetCustomersCount => "getCustomersCount",
            Self::GetMonthlyPaymentTotals => "getMonthlyPaymentTotals",
            Self::GetYearlyPaymentTotals => "getYearlyPaymentTotals",
            Self::GetDailyEnergySummary => "getDailyEnergySummary",
            Self::GetMonthlyEnergySummary => "getMonthlyEnergySummary",
            Self::GetYearlyEnergySummary => "getYearlyEnergySummary",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::GetUtilityInfo => "Get the profile of a given utility",
            Self::GetCustomersCount => "Get the number of customers for a given utility",
            Self::GetMonthlyPaymentTotals => "Get the monthly payment totals for a given utility",
            Self::GetYearlyPaymentTotals => {
                "Get payment totals for each month of a year for a given utility"
            }
            Self::GetDailyEnergySummary => {
                "Get energy consumption by customer type and by hour for one day"
            }
            Self::GetMonthlyEnergySummary => {
                "Get energy consumption by customer type and the top consumers for one month"
            }
            Self::GetYearlyEnergySummary => {
                "Get energy consumption per month and the top consumers for one year"
            }
        }
    }

    /// JSON Schema of the tool's arguments, derived from its request type.
    pub fn input_schema(&self) -> Value {
        match self {
            Self::GetUtilityInfo => schema_of::<UtilityRequest>(),
            Self::GetCustomersCount => schema_of::<CustomersCountRequest>(),
            Self::GetMonthlyPaymentTotals | Self::GetMonthlyEnergySummary => {
                schema_of::<UtilityMonthRequest>()
            }
            Self::GetDailyEnergySummary => schema_of::<UtilityDayRequest>(),
            Self::GetYearlyPaymentTotals | Self::GetYearlyEnergySummary => {
                schema_of::<UtilityYearRequest>()
            }
        }
    }
}

fn schema_of<T: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to encode input schema");
        Value::Null
    });
    // The Rust type name means nothing to a client.
    if let Value::Object(map) = &mut schema {
        map.remove("title");
    }
    schema
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown tool: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for ToolName {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTool(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

pub fn list_tools() -> Vec<ToolDescriptor> {
    ToolName::ALL
        .iter()
        .map(|t| ToolDescriptor {
            name: t.as_str(),
            description: t.description(),
            input_schema: t.input_schema(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_round_trip_and_unknown_names_fail() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
        let err = "getWeather".parse::<ToolName>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: getWeather");
    }

    #[test]
    fn schemas_are_closed_objects() {
        for tool in list_tools() {
            let schema = &tool.input_schema;
            assert_eq!(schema["type"], "object", "{}", tool.name);
            assert_eq!(schema["additionalProperties"], false, "{}", tool.name);
            assert_eq!(schema["properties"]["utilityId"]["minLength"], 24);
            assert_eq!(schema["properties"]["utilityId"]["maxLength"], 24);
            assert_eq!(schema["properties"]["utilityId"]["description"], "The ID of the utility");
            assert!(schema.get("title").is_none());
        }
    }

    #[test]
    fn all_customers_is_optional() {
        let schema = ToolName::GetCustomersCount.input_schema();
        assert_eq!(schema["required"], json!(["utilityId"]));
        assert_eq!(schema["properties"]["allCustomers"]["type"], "boolean");

        let schema = ToolName::GetMonthlyPaymentTotals.input_schema();
        assert_eq!(schema["required"], json!(["month", "utilityId"]));
    }

    #[test]
    fn period_fields_carry_their_pattern() {
        let month = ToolName::GetMonthlyEnergySummary.input_schema();
        assert_eq!(month["properties"]["month"]["pattern"], r"^\d{4}-\d{2}$");

        let day = ToolName::GetDailyEnergySummary.input_schema();
        assert_eq!(day["properties"]["date"]["pattern"], r"^\d{4}-\d{2}-\d{2}$");

        let year = ToolName::GetYearlyPaymentTotals.input_schema();
        assert_eq!(year["properties"]["year"]["type"], "string");
        assert_eq!(year["properties"]["year"]["pattern"], r"^\d{4}$");
    }
}
