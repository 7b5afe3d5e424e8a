use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::lenient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedExpense {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::serialize_amount"
    )]
    pub amount: Decimal,
}

/// Budget for one period. Also the payload of `saveBudget`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(default, deserialize_with = "lenient::date")]
    pub period_start: String,     // YYYY-MM-DD
    #[serde(default, deserialize_with = "lenient::date")]
    pub period_end: String,
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::serialize_amount"
    )]
    pub income_total: Decimal,
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::serialize_amount"
    )]
    pub saving_goal: Decimal,
    #[serde(default, deserialize_with = "lenient::list")]
    pub fixed_expenses: Vec<FixedExpense>,
}

impl Budget {
    /// `None` when the rows add up past what a `Decimal` can hold.
    pub fn fixed_total(&self) -> Option<Decimal> {
        self.fixed_expenses
            .iter()
            .try_fold(Decimal::ZERO, |acc, f| acc.checked_add(f.amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_sheet_shaped_budget() {
        let raw = json!({
            "period_start": "2024-05-01T03:00:00.000Z",
            "period_end": "2024-05-31",
            "income_total": "350000",
            "saving_goal": 50000,
            "fixed_expenses": "[{\"name\":\"Rent\",\"amount\":120000}]"
        });
        let budget: Budget = serde_json::from_value(raw).unwrap();
        assert_eq!(budget.period_start, "2024-05-01");
        assert_eq!(budget.income_total, Decimal::from(350_000));
        assert_eq!(budget.fixed_expenses.len(), 1);
        assert_eq!(budget.fixed_total(), Some(Decimal::from(120_000)));
    }

    #[test]
    fn missing_fixed_expenses_decode_as_empty() {
        let budget: Budget = serde_json::from_value(json!({
            "period_start": "2024-05-01",
            "period_end": "2024-05-31",
            "income_total": 1000,
            "saving_goal": 100,
            "fixed_expenses": null
        }))
        .unwrap();
        assert!(budget.fixed_expenses.is_empty());
        assert_eq!(budget.fixed_total(), Some(Decimal::ZERO));
    }

    #[test]
    fn fixed_total_overflow_is_none() {
        let budget: Budget = serde_json::from_value(json!({
            "fixed_expenses": [
                { "name": "a", "amount": "79228162514264337593543950335" },
                { "name": "b", "amount": "79228162514264337593543950335" }
            ]
        }))
        .unwrap();
        assert_eq!(budget.fixed_total(), None);
    }

    #[test]
    fn amounts_serialize_as_numbers() {
        let budget = Budget {
            period_start: "2024-05-01".into(),
            period_end: "2024-05-31".into(),
            income_total: Decimal::from(1000),
            saving_goal: Decimal::new(2505, 1),
            fixed_expenses: vec![],
        };
        let value = serde_json::to_value(&budget).unwrap();
        assert_eq!(value["income_total"], json!(1000));
        assert_eq!(value["saving_goal"], json!(250.5));
    }
}
