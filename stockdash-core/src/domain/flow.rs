//! Institutional net-flow records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::null_as_zero;

/// Institutional investor category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Foreign,
    Trust,
    Dealer,
    Other,
}

impl Category {
    /// The three named institutional categories, in display order.
    pub const INSTITUTIONS: [Category; 3] = [Category::Foreign, Category::Trust, Category::Dealer];

    fn name_patterns(&self) -> &'static [&'static str] {
        match self {
            Category::Foreign => &["外資", "Foreign"],
            Category::Trust => &["投信", "Investment_Trust"],
            Category::Dealer => &["自營商", "Dealer"],
            Category::Other => &[],
        }
    }

    /// Whether a backend institution name counts toward this category.
    ///
    /// Each category is matched on its own, so `Foreign_Dealer_Self` counts
    /// toward both Foreign and Dealer. Other takes the names no institution
    /// claims.
    pub fn matches_institution_name(&self, name: &str) -> bool {
        match self {
            Category::Other => !Category::INSTITUTIONS
                .iter()
                .any(|c| c.matches_institution_name(name)),
            _ => self.name_patterns().iter().any(|p| name.contains(p)),
        }
    }

    /// Primary category of a backend institution name: the first institution
    /// that matches, in display order.
    pub fn from_institution_name(name: &str) -> Self {
        Category::INSTITUTIONS
            .into_iter()
            .find(|c| c.matches_institution_name(name))
            .unwrap_or(Category::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Foreign => "foreign",
            Category::Trust => "trust",
            Category::Dealer => "dealer",
            Category::Other => "other",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "foreign" => Ok(Category::Foreign),
            "trust" => Ok(Category::Trust),
            "dealer" => Ok(Category::Dealer),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

/// One day's buy/sell totals for one category.
///
/// Records built from raw backend rows keep the institution `name`; category
/// membership is then decided by name, and `category` is the primary one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetFlowRecord {
    pub date: NaiveDate,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub buy: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub sell: f64,
}

impl NetFlowRecord {
    pub fn new(date: NaiveDate, category: Category, buy: f64, sell: f64) -> Self {
        Self {
            date,
            category,
            name: None,
            buy,
            sell,
        }
    }

    pub fn net(&self) -> f64 {
        self.buy - self.sell
    }

    /// Whether this record contributes to `category`'s daily net.
    pub fn counts_toward(&self, category: Category) -> bool {
        match &self.name {
            Some(name) => category.matches_institution_name(name),
            None => self.category == category,
        }
    }
}

/// Raw institutional row as the backend returns it (free-form `name`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionalRow {
    pub date: NaiveDate,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub buy: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub sell: f64,
}

impl From<InstitutionalRow> for NetFlowRecord {
    fn from(row: InstitutionalRow) -> Self {
        NetFlowRecord {
            date: row.date,
            category: Category::from_institution_name(&row.name),
            name: Some(row.name),
            buy: row.buy,
            sell: row.sell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_english_names() {
        assert_eq!(
            Category::from_institution_name("Foreign_Investor"),
            Category::Foreign
        );
        assert_eq!(
            Category::from_institution_name("Investment_Trust"),
            Category::Trust
        );
        assert_eq!(
            Category::from_institution_name("Dealer_self"),
            Category::Dealer
        );
        assert_eq!(
            Category::from_institution_name("Dealer_Hedging"),
            Category::Dealer
        );
    }

    #[test]
    fn classifies_chinese_names() {
        assert_eq!(Category::from_institution_name("外資及陸資"), Category::Foreign);
        assert_eq!(Category::from_institution_name("投信"), Category::Trust);
        assert_eq!(Category::from_institution_name("自營商(自行買賣)"), Category::Dealer);
    }

    #[test]
    fn overlapping_name_has_foreign_as_primary() {
        assert_eq!(
            Category::from_institution_name("Foreign_Dealer_Self"),
            Category::Foreign
        );
    }

    #[test]
    fn overlapping_name_matches_each_category() {
        for name in ["Foreign_Dealer_Self", "外資自營商"] {
            assert!(Category::Foreign.matches_institution_name(name));
            assert!(Category::Dealer.matches_institution_name(name));
            assert!(!Category::Trust.matches_institution_name(name));
            assert!(!Category::Other.matches_institution_name(name));
        }
        assert!(Category::Other.matches_institution_name("Margin"));
    }

    #[test]
    fn named_record_counts_toward_every_match() {
        let row = InstitutionalRow {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            name: "Foreign_Dealer_Self".into(),
            buy: 50.0,
            sell: 0.0,
        };
        let rec = NetFlowRecord::from(row);
        assert!(rec.counts_toward(Category::Foreign));
        assert!(rec.counts_toward(Category::Dealer));
        assert!(!rec.counts_toward(Category::Trust));

        let plain = NetFlowRecord::new(rec.date, Category::Foreign, 1.0, 0.0);
        assert!(plain.counts_toward(Category::Foreign));
        assert!(!plain.counts_toward(Category::Dealer));
    }

    #[test]
    fn unknown_name_is_other() {
        assert_eq!(Category::from_institution_name("Margin"), Category::Other);
        assert_eq!(Category::from_institution_name(""), Category::Other);
    }

    #[test]
    fn row_converts_with_net() {
        let json = r#"{"date":"2024-03-01","name":"Investment_Trust","buy":1200,"sell":null}"#;
        let row: InstitutionalRow = serde_json::from_str(json).unwrap();
        let rec = NetFlowRecord::from(row);
        assert_eq!(rec.category, Category::Trust);
        assert_eq!(rec.net(), 1200.0);
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Foreign".parse::<Category>(), Ok(Category::Foreign));
        assert!("aggregate".parse::<Category>().is_err());
    }
}
