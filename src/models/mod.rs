pub mod budget;
pub mod expense;
pub mod lenient;
pub mod user;

pub use budget::{Budget, FixedExpense};
pub use expense::{Expense, NewExpense};
pub use user::{AuthResponse, User};
