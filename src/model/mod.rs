//! Types that represent the core data model: `Record`, `Amount` and `Category`.
mod amount;
mod category;
mod record;

pub use amount::{money, money_rounded, Amount, AmountError, MAX_AMOUNT};
pub use category::Category;
pub use record::{Record, Records, YearMonth, DATE_FORMAT, HEADERS};
