//! Reporting tools the model may call.

use crate::assistant::chat::ToolSpec;
use crate::error::AppError;
use crate::services::reports::ReportSource;
use serde_json::{json, Value};

/// The read-only tools exposed to the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportingTool {
    CoffeeSoldToday,
    RevenueToday,
    OrdersCountToday,
    ProductsByCategory,
}

impl ReportingTool {
    /// Wire name of the tool.
    pub fn name(&self) -> &'static str {
        match self {
            ReportingTool::CoffeeSoldToday => "get_coffee_sold_today",
            ReportingTool::RevenueToday => "get_revenue_today",
            ReportingTool::OrdersCountToday => "get_orders_count_today",
            ReportingTool::ProductsByCategory => "list_products_by_category",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "get_coffee_sold_today" => Some(ReportingTool::CoffeeSoldToday),
            "get_revenue_today" => Some(ReportingTool::RevenueToday),
            "get_orders_count_today" => Some(ReportingTool::OrdersCountToday),
            "list_products_by_category" => Some(ReportingTool::ProductsByCategory),
            _ => None,
        }
    }

    /// Run the tool against the report source and return its JSON payload.
    pub async fn dispatch(
        &self,
        reports: &dyn ReportSource,
        args: &Value,
    ) -> Result<Value, AppError> {
        match self {
            ReportingTool::CoffeeSoldToday => encode(&reports.coffee_sold_today().await?),
            ReportingTool::RevenueToday => encode(&reports.revenue_today().await?),
            ReportingTool::OrdersCountToday => encode(&reports.orders_count_today().await?),
            ReportingTool::ProductsByCategory => {
                let category = args
                    .get("category")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                encode(&reports.products_by_category(category).await?)
            }
        }
    }
}

fn encode<T: serde::Serialize>(payload: &T) -> Result<Value, AppError> {
    serde_json::to_value(payload).map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("Failed to encode tool payload: {}", e))
    })
}

/// Tool declarations in chat-completions function format.
pub fn catalog() -> Vec<ToolSpec> {
    let no_args = json!({ "type": "object", "properties": {}, "required": [] });

    vec![
        ToolSpec::function(
            "get_coffee_sold_today",
            "Returns how many coffee units were sold today.",
            no_args.clone(),
        ),
        ToolSpec::function(
            "get_revenue_today",
            "Returns total revenue today (completed orders only).",
            no_args.clone(),
        ),
        ToolSpec::function(
            "get_orders_count_today",
            "Returns number of completed orders today.",
            no_args,
        ),
        ToolSpec::function(
            "list_products_by_category",
            "Lists products for a given category (e.g. Coffee, Tea, Pastry).",
            json!({
                "type": "object",
                "properties": { "category": { "type": "string" } },
                "required": ["category"],
            }),
        ),
    ]
}
