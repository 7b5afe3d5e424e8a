//! Dashboard arithmetic over the small in-memory lists.

use rust_decimal::Decimal;

use crate::models::{Budget, Expense};

/// How many expenses the dashboard lists.
pub const RECENT_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub income: Decimal,
    pub fixed_total: Decimal,
    pub saving_goal: Decimal,
    pub expenses_total: Decimal,
    pub available: Decimal,
}

impl Summary {
    /// A missing budget counts as zero income, goal and fixed costs.
    /// `None` when the totals do not fit in a `Decimal`.
    pub fn compute(budget: Option<&Budget>, expenses: &[Expense]) -> Option<Self> {
        let income = budget.map_or(Decimal::ZERO, |b| b.income_total);
        let saving_goal = budget.map_or(Decimal::ZERO, |b| b.saving_goal);
        let fixed_total = match budget {
            Some(b) => b.fixed_total()?,
            None => Decimal::ZERO,
        };
        let expenses_total = expenses
            .iter()
            .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.amount))?;
        let available = income
            .checked_sub(saving_goal)?
            .checked_sub(fixed_total)?
            .checked_sub(expenses_total)?;

        Some(Self {
            income,
            fixed_total,
            saving_goal,
            expenses_total,
            available,
        })
    }

    pub fn highlights(&self) -> [(&'static str, Decimal); 4] {
        [
            ("Total income", self.income),
            ("Fixed expenses", self.fixed_total),
            ("Savings goal", self.saving_goal),
            ("Variable expenses", self.expenses_total),
        ]
    }
}

/// The last `n` recorded expenses, most recent first.
pub fn recent(expenses: &[Expense], n: usize) -> Vec<&Expense> {
    expenses.iter().rev().take(n).collect()
}

/// History order: newest date first; same-day entries keep their order.
pub fn by_date_desc(expenses: &[Expense]) -> Vec<&Expense> {
    let mut sorted: Vec<&Expense> = expenses.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}
