use crate::model::{Amount, Category};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// The timestamp format used in the store, e.g. `2024-01-05 10:00`.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// The header row of every store file, in column order.
pub const HEADERS: [&str; 4] = [DATE_STR, AMOUNT_STR, CATEGORY_STR, NOTE_STR];

pub(crate) const DATE_STR: &str = "Date";
pub(crate) const AMOUNT_STR: &str = "Amount";
pub(crate) const CATEGORY_STR: &str = "Category";
pub(crate) const NOTE_STR: &str = "Note";

/// One logged expense. Records are never edited once written.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Record {
    #[serde(with = "minutes")]
    date: NaiveDateTime,
    amount: Amount,
    category: Category,
    #[serde(default)]
    note: String,
}

impl Record {
    /// Creates a record. Seconds and sub-seconds of `date` are dropped since the store only keeps
    /// minute precision.
    pub fn new(
        date: NaiveDateTime,
        amount: Amount,
        category: Category,
        note: impl Into<String>,
    ) -> Self {
        Self {
            date: truncate_to_minute(date),
            amount,
            category,
            note: note.into().trim().to_string(),
        }
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    /// The calendar day of the timestamp.
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::from(self.date.date())
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// The note, empty when none was given.
    pub fn note(&self) -> &str {
        &self.note
    }
}

fn truncate_to_minute(date: NaiveDateTime) -> NaiveDateTime {
    date.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(date)
}

/// An ordered sequence of records, in the order they were appended.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Records {
    data: Vec<Record>,
}

impl Records {
    pub fn new(data: Vec<Record>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[Record] {
        &self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.data.iter()
    }

    /// Most recent first, which is how records are displayed.
    pub fn newest_first(&self) -> impl Iterator<Item = &Record> {
        self.data.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn push(&mut self, record: Record) {
        self.data.push(record)
    }

    /// The earliest and latest calendar day present, or `None` if there are no records.
    pub fn day_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.data.iter().map(Record::day).min()?;
        let max = self.data.iter().map(Record::day).max()?;
        Some((min, max))
    }
}

impl FromIterator<Record> for Records {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Records {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

/// A calendar month, displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Serde adapter for `NaiveDateTime` stored with minute precision.
mod minutes {
    use super::DATE_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Older files may carry seconds; they are accepted and dropped.
    const DATE_FORMAT_SECONDS: &str = "%Y-%m-%d %H:%M:%S";

    pub(super) fn serialize<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, DATE_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, DATE_FORMAT_SECONDS))
            .map(super::truncate_to_minute)
            .map_err(|e| serde::de::Error::custom(format!("invalid date '{s}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_new_truncates_seconds_and_trims_note() {
        let date =
            NaiveDateTime::parse_from_str("2024-01-05 10:00:42", "%Y-%m-%d %H:%M:%S").unwrap();
        let record = Record::new(
            date,
            Amount::from_str("100").unwrap(),
            Category::Food,
            "  lunch ",
        );
        assert_eq!(record.date(), at("2024-01-05 10:00"));
        assert_eq!(record.note(), "lunch");
        assert_eq!(record.month().to_string(), "2024-01");
    }

    #[test]
    fn test_day_bounds() {
        let amount = Amount::from_str("1").unwrap();
        let records: Records = vec![
            Record::new(at("2024-03-02 09:00"), amount, Category::Fun, ""),
            Record::new(at("2024-01-31 23:59"), amount, Category::Fun, ""),
            Record::new(at("2024-02-10 12:00"), amount, Category::Fun, ""),
        ]
        .into_iter()
        .collect();
        let (min, max) = records.day_bounds().unwrap();
        assert_eq!(min, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(max, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert!(Records::default().day_bounds().is_none());
    }

    #[test]
    fn test_newest_first() {
        let amount = Amount::from_str("1").unwrap();
        let mut records = Records::default();
        records.push(Record::new(at("2024-01-01 00:00"), amount, Category::Food, "a"));
        records.push(Record::new(at("2024-01-02 00:00"), amount, Category::Food, "b"));
        let notes: Vec<&str> = records.newest_first().map(Record::note).collect();
        assert_eq!(notes, vec!["b", "a"]);
    }

    #[test]
    fn test_year_month_order_and_display() {
        let a = YearMonth::new(2023, 12);
        let b = YearMonth::new(2024, 1);
        assert!(a < b);
        assert_eq!(a.to_string(), "2023-12");
        assert_eq!(serde_json::to_string(&b).unwrap(), "\"2024-01\"");
    }
}
