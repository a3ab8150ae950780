//! Generator boundary and reply assembly
//!
//! The language-model generator hands the gateway a typed [`Intent`]; this
//! module turns it into a [`ChatReply`]. SQL from the generator is always
//! re-validated by the gateway, whatever the generator claims about it.

use crate::db::engine::Connector;
use crate::db::types::ResultSet;
use crate::error::GatewayResult;
use crate::forecast::{self, AugmentedResultSet};
use crate::gateway::Gateway;
use serde::{Deserialize, Serialize};

/// What the generator decided to do with a user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Intent {
    /// Run a query and show the table
    Query {
        sql: String,
        #[serde(default)]
        explanation: String,
    },
    /// Run a query and extend it with a forecast
    Forecast {
        sql: String,
        #[serde(default)]
        explanation: String,
        #[serde(default)]
        forecast_period: Option<usize>,
    },
    /// Plain conversational answer
    Text { message: String },
    /// Generator-side failure
    Error { message: String },
}

impl Intent {
    /// Parse the generator's JSON payload
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Assembled answer for the result consumer
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatReply {
    /// Explanation or message text
    pub message: String,
    /// SQL that was executed, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    /// Historical result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<ResultSet>,
    /// Result with the forecast column, when forecasting succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<AugmentedResultSet>,
    /// Why forecasting failed; the historical table is still returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_error: Option<String>,
    pub from_cache: bool,
    /// True for generator-reported errors
    pub is_error: bool,
}

/// Turn an intent into a reply
///
/// # Errors
/// Propagates `RejectedStatement` and `Engine` errors from the gateway.
/// Forecast failures are reported inside the reply instead.
pub async fn respond<C: Connector>(gateway: &Gateway<C>, intent: Intent) -> GatewayResult<ChatReply> {
    match intent {
        Intent::Text { message } => Ok(ChatReply {
            message,
            ..Default::default()
        }),
        Intent::Error { message } => Ok(ChatReply {
            message,
            is_error: true,
            ..Default::default()
        }),
        Intent::Query { sql, explanation } => {
            let outcome = gateway.execute(&sql, true).await?;
            Ok(ChatReply {
                message: explanation,
                sql: Some(sql),
                table: Some(outcome.result),
                from_cache: outcome.from_cache,
                ..Default::default()
            })
        }
        Intent::Forecast {
            sql,
            explanation,
            forecast_period,
        } => {
            let outcome = gateway.execute(&sql, true).await?;
            let horizon =
                forecast_period.unwrap_or(gateway.config().forecast.default_horizon);

            let (forecast, forecast_error) = match forecast::forecast_linear(&outcome.result, horizon)
                .and_then(|points| forecast::merge(&outcome.result, &points))
            {
                Ok(augmented) => (Some(augmented), None),
                Err(e) => {
                    tracing::debug!(error = %e, "Forecast skipped");
                    (None, Some(e.to_string()))
                }
            };

            Ok(ChatReply {
                message: explanation,
                sql: Some(sql),
                table: Some(outcome.result),
                forecast,
                forecast_error,
                from_cache: outcome.from_cache,
                is_error: false,
            })
        }
    }
}
