use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::lenient;

/// A recorded variable expense.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(
        default,
        deserialize_with = "lenient::opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::date")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: String,
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::serialize_amount"
    )]
    pub amount: Decimal,
}

/// Payload of `addExpense`: an expense the server has not numbered yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewExpense {
    pub date: String,
    pub description: String,
    pub category: String,
    #[serde(serialize_with = "lenient::serialize_amount")]
    pub amount: Decimal,
}
