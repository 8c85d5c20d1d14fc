use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::filters::{FilterState, FilterValue};
use crate::ConfigError;

fn default_feed_path() -> String {
    "/filter".to_string()
}

fn default_filters() -> Vec<String> {
    ["price_range", "subcategory_id", "year_filter", "brand_id", "model_id"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// One browsable listing category (properties, cars, bikes, electronics, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub slug: String,
    pub name: String,
    pub category_id: i64,
    /// Value sent as `wishable_type` for listings of this category.
    pub wishable_type: String,
    #[serde(default = "default_feed_path")]
    pub feed_path: String,
    /// Fetch-triggering filter keys. Geo keys are never listed here.
    #[serde(default = "default_filters")]
    pub filters: Vec<String>,
}

impl CategoryConfig {
    /// Default filter selection for this category: every trigger key empty,
    /// plus the geo keys.
    #[must_use]
    pub fn default_filter_state(&self) -> FilterState {
        FilterState::with_defaults(
            self.filters
                .iter()
                .map(|k| (k.clone(), FilterValue::Text(String::new()))),
        )
    }

    /// Fixed query parameters sent with every feed request for this category.
    #[must_use]
    pub fn base_params(&self) -> Vec<(String, String)> {
        vec![("category_id".to_string(), self.category_id.to_string())]
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoriesFile {
    pub categories: Vec<CategoryConfig>,
}

impl CategoriesFile {
    #[must_use]
    pub fn find(&self, slug: &str) -> Option<&CategoryConfig> {
        self.categories
            .iter()
            .find(|c| c.slug.eq_ignore_ascii_case(slug))
    }
}

/// Load and validate the category catalogue from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoriesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CategoriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_categories(&content)
}

/// Parse and validate a category catalogue from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is invalid or fails validation.
pub fn parse_categories(content: &str) -> Result<CategoriesFile, ConfigError> {
    let file: CategoriesFile =
        serde_yaml::from_str(content).map_err(ConfigError::CategoriesFileParse)?;
    validate_categories(&file)?;
    Ok(file)
}

fn validate_categories(file: &CategoriesFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();
    let mut seen_ids = HashSet::new();

    for category in &file.categories {
        if category.slug.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category slug must be non-empty".to_string(),
            ));
        }

        if !seen_slugs.insert(category.slug.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category slug: '{}'",
                category.slug
            )));
        }

        if !seen_ids.insert(category.category_id) {
            return Err(ConfigError::Validation(format!(
                "duplicate category_id {} (category '{}')",
                category.category_id, category.slug
            )));
        }

        if category.wishable_type.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "category '{}' has an empty wishable_type",
                category.slug
            )));
        }

        if !category.feed_path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "category '{}' feed_path must start with '/'",
                category.slug
            )));
        }

        if let Some(geo) = category.filters.iter().find(|k| FilterState::is_geo_key(k)) {
            return Err(ConfigError::Validation(format!(
                "category '{}' lists geo key '{geo}' as a fetch-triggering filter",
                category.slug
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
categories:
  - slug: electronics
    name: Electronics
    category_id: 4
    wishable_type: electronics
  - slug: cars
    name: Cars
    category_id: 2
    wishable_type: car
    feed_path: /filter
    filters: [price_range, brand_id, model_id, year_filter]
";

    #[test]
    fn parses_sample_with_defaults() {
        let file = parse_categories(SAMPLE).expect("sample should parse");
        assert_eq!(file.categories.len(), 2);
        let electronics = file.find("Electronics").expect("lookup is case-insensitive");
        assert_eq!(electronics.feed_path, "/filter");
        assert_eq!(
            electronics.filters,
            vec!["price_range", "subcategory_id", "year_filter", "brand_id", "model_id"]
        );
        assert_eq!(
            electronics.base_params(),
            vec![("category_id".to_string(), "4".to_string())]
        );
    }

    #[test]
    fn default_filter_state_has_empty_triggers_and_geo() {
        let file = parse_categories(SAMPLE).unwrap();
        let state = file.find("cars").unwrap().default_filter_state();
        assert_eq!(state.get("brand_id"), Some(&FilterValue::Text(String::new())));
        assert!(state.get("latitude").is_some());
        assert!(state.cleaned().is_empty());
    }

    #[test]
    fn rejects_duplicate_slug() {
        let yaml = r"
categories:
  - { slug: cars, name: Cars, category_id: 1, wishable_type: car }
  - { slug: CARS, name: Cars again, category_id: 2, wishable_type: car }
";
        let err = parse_categories(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate category slug")));
    }

    #[test]
    fn rejects_duplicate_category_id() {
        let yaml = r"
categories:
  - { slug: cars, name: Cars, category_id: 1, wishable_type: car }
  - { slug: bikes, name: Bikes, category_id: 1, wishable_type: bike }
";
        let err = parse_categories(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate category_id")));
    }

    #[test]
    fn rejects_geo_trigger_key() {
        let yaml = r"
categories:
  - { slug: land, name: Land, category_id: 5, wishable_type: land, filters: [price_range, latitude] }
";
        let err = parse_categories(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("geo key")));
    }

    #[test]
    fn rejects_relative_feed_path() {
        let yaml = r"
categories:
  - { slug: land, name: Land, category_id: 5, wishable_type: land, feed_path: filter }
";
        assert!(matches!(
            parse_categories(yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_categories_reports_missing_file() {
        let err = load_categories(Path::new("/nonexistent/categories.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::CategoriesFileIo { .. }));
    }

    #[test]
    fn bundled_catalogue_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/categories.yaml");
        let file = load_categories(&path).expect("bundled catalogue should validate");
        assert!(file.find("electronics").is_some());
    }
}
