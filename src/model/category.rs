use serde::{Deserialize, Serialize};

/// The fixed set of expense categories, in the order they are offered on the form.
///
/// The persisted form is the emoji label, e.g. `🍜 Food`. The bare name is also accepted when
/// parsing, in either capitalization, so both `Food` and `food` work.
#[derive(
    Default, Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub enum Category {
    #[default]
    #[serde(rename = "🍜 Food", alias = "Food", alias = "food")]
    Food,
    #[serde(rename = "💼 Shopping", alias = "Shopping", alias = "shopping")]
    Shopping,
    #[serde(rename = "🚕 Travel", alias = "Travel", alias = "travel")]
    Travel,
    #[serde(rename = "🎉 Fun", alias = "Fun", alias = "fun")]
    Fun,
    #[serde(rename = "📌 Other", alias = "Other", alias = "other")]
    Other,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

impl Category {
    /// Every category, in form order.
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Shopping,
        Category::Travel,
        Category::Fun,
        Category::Other,
    ];

    /// The name without the emoji, e.g. `Food`.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Shopping => "Shopping",
            Category::Travel => "Travel",
            Category::Fun => "Fun",
            Category::Other => "Other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display_is_emoji_label() {
        assert_eq!(Category::Food.to_string(), "🍜 Food");
        assert_eq!(Category::Other.to_string(), "📌 Other");
    }

    #[test]
    fn test_parse_label_and_names() {
        assert_eq!(Category::from_str("🚕 Travel").unwrap(), Category::Travel);
        assert_eq!(Category::from_str("Travel").unwrap(), Category::Travel);
        assert_eq!(Category::from_str("fun").unwrap(), Category::Fun);
        assert!(Category::from_str("Rent").is_err());
    }

    #[test]
    fn test_round_trip_all() {
        for c in Category::ALL {
            assert_eq!(Category::from_str(&c.to_string()).unwrap(), c);
        }
    }
}
