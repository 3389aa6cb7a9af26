//! Aggregations over a snapshot of records: totals, per-category sums, the pie chart view and
//! the monthly top-category table.
//!
//! Everything here is a pure function of its inputs. Nothing is persisted; a `Summary` is
//! recomputed from the store on every interaction.

use crate::model::{money_rounded, Category, Record, Records, YearMonth};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Fills in whichever bound is missing with the earliest or latest day present in `records`,
    /// or with `today` when there are no records.
    pub fn with_defaults(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        records: &Records,
        today: NaiveDate,
    ) -> Self {
        let (min, max) = records.day_bounds().unwrap_or((today, today));
        Self {
            from: from.unwrap_or(min),
            to: to.unwrap_or(max),
        }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Whether `day` falls within the range. Both ends are inclusive.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }
}

/// Returns the records whose timestamp falls on a day within `range`, in their original order.
/// A range whose `from` is after its `to` matches nothing.
pub fn filter_by_date_range(records: &Records, range: DateRange) -> Records {
    records
        .iter()
        .filter(|r| range.contains(r.day()))
        .cloned()
        .collect()
}

/// The sum of all amounts; zero for no records. Every amount is at most `MAX_AMOUNT`, which keeps
/// the sum of any realistic log far below `Decimal::MAX`.
pub fn total_amount<'a>(records: impl IntoIterator<Item = &'a Record>) -> Decimal {
    records.into_iter().map(|r| r.amount().value()).sum()
}

/// Sums amounts per category. Only categories that occur in `records` appear.
pub fn group_by_category<'a>(
    records: impl IntoIterator<Item = &'a Record>,
) -> BTreeMap<Category, Decimal> {
    let mut sums = BTreeMap::new();
    for r in records {
        *sums.entry(r.category()).or_insert(Decimal::ZERO) += r.amount().value();
    }
    sums
}

/// `category_sum` as a percentage of the sum of `all_sums`. Returns `None` when the total is
/// zero; the caller decides what to show instead.
pub fn percent_of_total<'a>(
    category_sum: Decimal,
    all_sums: impl IntoIterator<Item = &'a Decimal>,
) -> Option<Decimal> {
    let total: Decimal = all_sums.into_iter().copied().sum();
    if total.is_zero() {
        return None;
    }
    Some(category_sum / total * Decimal::ONE_HUNDRED)
}

/// One wedge of the category pie chart.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct PieSlice {
    pub category: Category,
    pub amount: Decimal,
    /// Unrounded share of the total, 0 to 100.
    pub percent: Decimal,
    /// The amount rounded to a whole number with the currency symbol, e.g. `₹130`.
    pub label: String,
}

/// The pie chart view of `records`, or `None` if there is nothing to chart.
pub fn pie_slices<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    currency: &str,
) -> Option<Vec<PieSlice>> {
    let sums = group_by_category(records);
    let mut slices = Vec::with_capacity(sums.len());
    for (&category, &amount) in &sums {
        let percent = percent_of_total(amount, sums.values())?;
        slices.push(PieSlice {
            category,
            amount,
            percent,
            label: money_rounded(amount, currency),
        });
    }
    if slices.is_empty() {
        None
    } else {
        Some(slices)
    }
}

/// The category with the largest spend in one month.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct MonthlyTop {
    pub month: YearMonth,
    pub category: Category,
    pub amount: Decimal,
}

/// For each month present, the category with the greatest summed amount, in month order.
///
/// When two categories tie within a month, the one whose name sorts first wins, so `Food` beats
/// `Fun` beats `Other` beats `Shopping` beats `Travel`.
pub fn monthly_top_category<'a>(
    records: impl IntoIterator<Item = &'a Record>,
) -> Vec<MonthlyTop> {
    let mut sums: BTreeMap<YearMonth, BTreeMap<Category, Decimal>> = BTreeMap::new();
    for r in records {
        *sums
            .entry(r.month())
            .or_default()
            .entry(r.category())
            .or_insert(Decimal::ZERO) += r.amount().value();
    }

    sums.into_iter()
        .filter_map(|(month, by_category)| {
            by_category
                .into_iter()
                .max_by(|(a_cat, a_sum), (b_cat, b_sum)| {
                    a_sum
                        .cmp(b_sum)
                        // Reversed so that the smaller name is the "greater" element on ties
                        .then_with(|| b_cat.name().cmp(a_cat.name()))
                })
                .map(|(category, amount)| MonthlyTop {
                    month,
                    category,
                    amount,
                })
        })
        .collect()
}

/// One row of the per-category breakdown.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: Decimal,
    /// `None` when the total is zero.
    pub percent: Option<Decimal>,
}

/// Everything the presentation layer needs for one dashboard render.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// The range actually applied, after defaults.
    pub range: DateRange,
    /// The filtered records, most recent first.
    pub records: Vec<Record>,
    pub total: Decimal,
    pub by_category: Vec<CategoryTotal>,
    /// `None` when there is nothing to chart.
    pub pie: Option<Vec<PieSlice>>,
    /// Computed over the whole store, not the filtered range. `None` when the store is empty.
    pub monthly_top: Option<Vec<MonthlyTop>>,
}

impl Summary {
    pub fn new(all: &Records, range: DateRange, currency: &str) -> Self {
        let filtered = filter_by_date_range(all, range);
        let sums = group_by_category(&filtered);
        let by_category = sums
            .iter()
            .map(|(&category, &amount)| CategoryTotal {
                category,
                amount,
                percent: percent_of_total(amount, sums.values()),
            })
            .collect();
        let monthly_top = if all.is_empty() {
            None
        } else {
            Some(monthly_top_category(all))
        };
        Self {
            range,
            total: total_amount(&filtered),
            by_category,
            pie: pie_slices(&filtered, currency),
            records: filtered.newest_first().cloned().collect(),
            monthly_top,
        }
    }
}
