//! Filter selection for a listing feed.
//!
//! A [`FilterState`] maps listing-type-specific keys (`price_range`,
//! `subcategory_id`, `year_filter`, `brand_id`, `model_id`, ...) to values,
//! and always carries the two geo keys. Before any request the state is
//! reduced to [`CleanedFilters`], which never holds an empty value.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const GEO_KEYS: [&str; 2] = [LATITUDE, LONGITUDE];

/// A single filter value as the filter panel produces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FilterValue {
    #[default]
    Null,
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FilterValue {
    /// `true` for values that must never reach the server: null, `""`,
    /// empty lists and non-finite numbers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Null => true,
            FilterValue::Number(n) => !n.is_finite(),
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::List(items) => items.is_empty(),
        }
    }

    /// Renders the value as a query-string value. Lists are comma-joined.
    /// Returns `None` for empty values.
    #[must_use]
    pub fn to_query_value(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        match self {
            FilterValue::Null => None,
            // f64 Display drops the fractional part for integral values ("5", not "5.0").
            FilterValue::Number(n) => Some(n.to_string()),
            FilterValue::Text(s) => Some(s.clone()),
            FilterValue::List(items) => {
                let joined = items
                    .iter()
                    .filter(|s| !s.is_empty())
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(",");
                (!joined.is_empty()).then_some(joined)
            }
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<i64> for FilterValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        FilterValue::Number(value as f64)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        FilterValue::List(value)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FilterValue::Null, Into::into)
    }
}

/// Current filter selection. Always contains `latitude` and `longitude`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    entries: BTreeMap<String, FilterValue>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterState {
    #[must_use]
    pub fn new() -> Self {
        let entries = GEO_KEYS
            .iter()
            .map(|k| ((*k).to_owned(), FilterValue::Null))
            .collect();
        Self { entries }
    }

    /// Builds a state from default entries; geo keys are added when missing.
    pub fn with_defaults<I, K, V>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FilterValue>,
    {
        let mut state = Self::new();
        for (k, v) in defaults {
            state.entries.insert(k.into(), v.into());
        }
        state
    }

    #[must_use]
    pub fn is_geo_key(key: &str) -> bool {
        GEO_KEYS.contains(&key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.get(key)
    }

    /// Sets one key. Returns `true` when the stored value changed.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> bool {
        let key = key.into();
        let value = value.into();
        if self.entries.get(&key) == Some(&value) {
            return false;
        }
        self.entries.insert(key, value);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resets every non-geo key to its value in `defaults` (or removes it when
    /// `defaults` has no such key). Geo keys keep their current values.
    ///
    /// Returns the keys whose value changed.
    pub fn reset_to(&mut self, defaults: &FilterState) -> Vec<String> {
        let mut changed = Vec::new();

        let stale: Vec<String> = self
            .entries
            .keys()
            .filter(|k| !Self::is_geo_key(k) && !defaults.entries.contains_key(*k))
            .cloned()
            .collect();
        for key in stale {
            if let Some(old) = self.entries.remove(&key) {
                if !old.is_empty() {
                    changed.push(key);
                }
            }
        }

        for (key, value) in &defaults.entries {
            if Self::is_geo_key(key) {
                continue;
            }
            if self.set(key.clone(), value.clone()) {
                changed.push(key.clone());
            }
        }

        changed
    }

    /// Strips null, empty-string and empty-list values.
    #[must_use]
    pub fn cleaned(&self) -> CleanedFilters {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Filter entries ready for transmission: ordered `(key, value)` pairs with
/// no empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanedFilters {
    pairs: Vec<(String, String)>,
}

impl CleanedFilters {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the pairs, excluding geo keys.
    pub fn without_geo(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(k, _)| !FilterState::is_geo_key(k))
    }
}

impl<K: Into<String>> FromIterator<(K, FilterValue)> for CleanedFilters {
    fn from_iter<T: IntoIterator<Item = (K, FilterValue)>>(iter: T) -> Self {
        let pairs = iter
            .into_iter()
            .filter_map(|(k, v)| v.to_query_value().map(|value| (k.into(), value)))
            .collect();
        Self { pairs }
    }
}

impl fmt::Display for CleanedFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        f.write_str(&rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_has_geo_keys() {
        let state = FilterState::new();
        assert_eq!(state.get(LATITUDE), Some(&FilterValue::Null));
        assert_eq!(state.get(LONGITUDE), Some(&FilterValue::Null));
    }

    #[test]
    fn cleaned_strips_empty_values() {
        let mut state = FilterState::new();
        state.set("price_range", "");
        state.set("brand_id", FilterValue::Null);
        state.set("model_id", FilterValue::List(vec![]));
        state.set("subcategory_id", "12");
        state.set("year_filter", FilterValue::List(vec!["2019".into(), "2020".into()]));

        let cleaned = state.cleaned();
        let keys: Vec<&str> = cleaned.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["subcategory_id", "year_filter"]);
        assert_eq!(cleaned.get("year_filter"), Some("2019,2020"));
        for (_, v) in cleaned.iter() {
            assert!(!v.is_empty());
        }
    }

    #[test]
    fn without_geo_skips_coordinates() {
        let mut state = FilterState::new();
        state.set(LATITUDE, "9.93");
        state.set(LONGITUDE, "76.26");
        state.set("brand_id", "4");
        let cleaned = state.cleaned();
        assert_eq!(cleaned.iter().count(), 3);
        let rest: Vec<_> = cleaned.without_geo().collect();
        assert_eq!(rest, vec![("brand_id", "4")]);
    }

    #[test]
    fn cleaned_never_sends_geo_nulls() {
        let cleaned = FilterState::new().cleaned();
        assert!(cleaned.is_empty());
    }

    #[test]
    fn list_of_blank_strings_is_dropped() {
        let mut state = FilterState::new();
        state.set("brand_id", FilterValue::List(vec![String::new()]));
        assert!(state.cleaned().get("brand_id").is_none());
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(FilterValue::Number(2020.0).to_query_value().as_deref(), Some("2020"));
        assert_eq!(FilterValue::Number(12.5).to_query_value().as_deref(), Some("12.5"));
        assert!(FilterValue::Number(f64::NAN).to_query_value().is_none());
    }

    #[test]
    fn set_reports_change_only_when_value_differs() {
        let mut state = FilterState::new();
        assert!(state.set("price_range", "1000-5000"));
        assert!(!state.set("price_range", "1000-5000"));
        assert!(state.set("price_range", "500"));
    }

    #[test]
    fn reset_preserves_geo_keys() {
        let defaults = FilterState::with_defaults([("price_range", "")]);
        let mut state = defaults.clone();
        state.set(LATITUDE, 12.97);
        state.set(LONGITUDE, 77.59);
        state.set("price_range", "500");
        state.set("brand_id", "7");

        let mut changed = state.reset_to(&defaults);
        changed.sort();

        assert_eq!(changed, vec!["brand_id".to_string(), "price_range".to_string()]);
        assert_eq!(state.get("price_range"), Some(&FilterValue::Text(String::new())));
        assert!(state.get("brand_id").is_none());
        assert_eq!(state.get(LATITUDE), Some(&FilterValue::Number(12.97)));
        assert_eq!(state.get(LONGITUDE), Some(&FilterValue::Number(77.59)));
    }

    #[test]
    fn untagged_values_deserialize_from_json() {
        let values: Vec<FilterValue> =
            serde_json::from_str(r#"[null, 3, "abc", ["a", "b"]]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FilterValue::Null,
                FilterValue::Number(3.0),
                FilterValue::Text("abc".into()),
                FilterValue::List(vec!["a".into(), "b".into()]),
            ]
        );
    }

    #[test]
    fn display_renders_query_like_pairs() {
        let state = FilterState::with_defaults([("brand_id", "3"), ("price_range", "10-20")]);
        assert_eq!(state.cleaned().to_string(), "brand_id=3&price_range=10-20");
    }
}
