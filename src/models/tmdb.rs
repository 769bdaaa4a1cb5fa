use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A single entry in a TMDB list response
///
/// Only the `id` is interpreted (for shown-item rotation); every other field
/// is carried through untouched so the proxy never strips upstream data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListItem {
    pub id: u64,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// A paginated TMDB list response, reduced to what rotation needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPage {
    #[serde(default)]
    pub results: Vec<ListItem>,
}

/// Content category for the trending endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingKind {
    All,
    Movie,
    Tv,
}

impl TrendingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendingKind::All => "all",
            TrendingKind::Movie => "movie",
            TrendingKind::Tv => "tv",
        }
    }
}

impl std::str::FromStr for TrendingKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TrendingKind::All),
            "movie" => Ok(TrendingKind::Movie),
            "tv" => Ok(TrendingKind::Tv),
            other => Err(AppError::InvalidInput(format!(
                "Invalid trending kind '{}', expected all, movie or tv",
                other
            ))),
        }
    }
}

/// Time window for the trending endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingWindow {
    Day,
    Week,
}

impl TrendingWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendingWindow::Day => "day",
            TrendingWindow::Week => "week",
        }
    }
}

impl std::str::FromStr for TrendingWindow {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(TrendingWindow::Day),
            "week" => Ok(TrendingWindow::Week),
            other => Err(AppError::InvalidInput(format!(
                "Invalid trending window '{}', expected day or week",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_item_roundtrips_unknown_fields() {
        let json = serde_json::json!({
            "id": 550,
            "title": "Fight Club",
            "vote_average": 8.4,
            "genre_ids": [18]
        });

        let item: ListItem = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(item.id, 550);
        assert_eq!(item.fields["title"], "Fight Club");

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back, json);
    }

    #[test]
    fn test_list_page_missing_results_defaults_empty() {
        let page: ListPage = serde_json::from_str("{}").unwrap();
        assert!(page.results.is_empty());
    }

    #[test]
    fn test_trending_kind_parse() {
        assert_eq!("movie".parse::<TrendingKind>().unwrap(), TrendingKind::Movie);
        assert!("podcast".parse::<TrendingKind>().is_err());
    }

    #[test]
    fn test_trending_window_parse() {
        assert_eq!("week".parse::<TrendingWindow>().unwrap(), TrendingWindow::Week);
        assert!("month".parse::<TrendingWindow>().is_err());
    }
}
