use std::{sync::Arc, time::Instant};

use serde::Serialize;
use serde_json::{json, Value};
use utility_client::{
    db::{customer_queries, energy_queries, payment_queries, utility_queries},
    domain::UnrecognizedTypePolicy,
    AnalyticsStore, QueryError,
};

use super::catalog::{ToolName, UnknownTool};
use crate::contract::{
    parse_args, CustomersCountRequest, ResponseContract, UtilityDayRequest, UtilityMonthRequest,
    UtilityRequest, UtilityYearRequest, ValidationError,
};

#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    UnknownTool(#[from] UnknownTool),
    #[error("failed to serialize tool result: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ToolError {
    fn outcome(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Query(_) | Self::Serialize(_) => "execution_error",
            Self::UnknownTool(_) => "unknown_tool",
        }
    }

    fn payload(&self) -> Value {
        match self {
            Self::Validation(v) => json!({
                "error": "Validation error",
                "details": v.to_string(),
                "issues": v.issues,
            }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// Result of a `tools/call`. Tool failures are reported here with
/// `isError`, never as protocol errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<TextContent>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl CallToolResult {
    pub fn text(text: String) -> Self {
        Self { content: vec![TextContent { kind: "text", text }], is_error: false }
    }

    pub fn error(text: String) -> Self {
        Self { content: vec![TextContent { kind: "text", text }], is_error: true }
    }

    /// Concatenated text of every content item.
    pub fn joined_text(&self) -> String {
        self.content.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n")
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn render<T: Serialize + ResponseContract>(result: &T) -> Result<String, ToolError> {
    result.check()?;
    Ok(serde_json::to_string_pretty(result)?)
}

#[derive(Clone)]
pub struct ToolDispatcher {
    store: Arc<dyn AnalyticsStore>,
    policy: UnrecognizedTypePolicy,
}

impl ToolDispatcher {
    pub fn new(store: Arc<dyn AnalyticsStore>, policy: UnrecognizedTypePolicy) -> Self {
        Self { store, policy }
    }

    /// Validate, query, validate the result and serialize it. Every failure is
    /// folded into an error-flagged result.
    pub async fn call(&self, name: &str, args: Option<&Value>) -> CallToolResult {
        let started = Instant::now();
        let label = name.parse::<ToolName>().map(|t| t.as_str()).unwrap_or("unknown");
        let outcome = self.execute(name, args).await;

        metrics::histogram!("mcp_tool_call_duration_seconds", "tool" => label)
            .record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(text) => {
                metrics::counter!("mcp_tool_calls_total", "tool" => label, "outcome" => "success")
                    .increment(1);
                tracing::debug!(tool = name, "tool call succeeded");
                CallToolResult::text(text)
            }
            Err(e) => {
                metrics::counter!("mcp_tool_calls_total", "tool" => label, "outcome" => e.outcome())
                    .increment(1);
                match &e {
                    ToolError::Validation(v) => {
                        tracing::warn!(tool = name, details = %v, "tool validation error")
                    }
                    other => tracing::error!(tool = name, error = %other, "tool execution error"),
                }
                CallToolResult::error(pretty(&e.payload()))
            }
        }
    }

    async fn execute(&self, name: &str, args: Option<&Value>) -> Result<String, ToolError> {
        let store = self.store.as_ref();
        match name.parse::<ToolName>()? {
            ToolName::GetUtilityInfo => {
                let req: UtilityRequest = parse_args(args)?;
                render(&utility_queries::utility_info(store, &req.utility_id).await?)
            }
            ToolName::GetCustomersCount => {
                let req: CustomersCountRequest = parse_args(args)?;
                let count = customer_queries::customers_count(
                    store,
                    &req.utility_id,
                    req.all_customers,
                    self.policy,
                )
                .await?;
                render(&count)
            }
            ToolName::GetMonthlyPaymentTotals => {
                let req: UtilityMonthRequest = parse_args(args)?;
                let month = req.period().map_err(QueryError::from)?;
                render(&payment_queries::monthly_payment_totals(store, &req.utility_id, &month).await?)
            }
            ToolName::GetYearlyPaymentTotals => {
                let req: UtilityYearRequest = parse_args(args)?;
                let year = req.period().map_err(QueryError::from)?;
                render(&payment_queries::yearly_payment_totals(store, &req.utility_id, &year).await?)
            }
            ToolName::GetDailyEnergySummary => {
                let req: UtilityDayRequest = parse_args(args)?;
                let date = req.period().map_err(QueryError::from)?;
                let report =
                    energy_queries::daily_energy_summary(store, &req.utility_id, &date, self.policy)
                        .await?;
                render(&report)
            }
            ToolName::GetMonthlyEnergySummary => {
                let req: UtilityMonthRequest = parse_args(args)?;
                let month = req.period().map_err(QueryError::from)?;
                let report =
                    energy_queries::monthly_energy_summary(store, &req.utility_id, &month, self.policy)
                        .await?;
                render(&report)
            }
            ToolName::GetYearlyEnergySummary => {
                let req: UtilityYearRequest = parse_args(args)?;
                let year = req.period().map_err(QueryError::from)?;
                let report =
                    energy_queries::yearly_energy_summary(store, &req.utility_id, &year, self.policy)
                        .await?;
                render(&report)
            }
        }
    }
}
