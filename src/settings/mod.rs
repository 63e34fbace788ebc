//! Settings Module
//!
//! Display preferences for the browser front end, persisted as a single JSON
//! record. Every key is validated on read: a missing or malformed value falls
//! back to its default instead of failing the whole record.

pub mod routes;
pub mod storage;

pub use routes::router;
pub use storage::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    #[default]
    Advanced,
    Comprehensive,
}

impl SearchDepth {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "basic" => Some(SearchDepth::Basic),
            "advanced" => Some(SearchDepth::Advanced),
            "comprehensive" => Some(SearchDepth::Comprehensive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl Theme {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "system" => Some(Theme::System),
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

/// User settings structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// Archive every completed session automatically
    pub auto_save: bool,
    /// Show source snippets in the results panel
    pub show_previews: bool,
    pub search_depth: SearchDepth,
    pub theme: Theme,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            auto_save: false,
            show_previews: true,
            search_depth: SearchDepth::Advanced,
            theme: Theme::System,
        }
    }
}

impl UserSettings {
    /// Build settings from an untrusted JSON value, key by key.
    pub fn from_value(value: &Value) -> Self {
        let defaults = Self::default();
        let Some(obj) = value.as_object() else {
            warn!("Settings record is not a JSON object, using defaults");
            return defaults;
        };

        let auto_save = match obj.get("autoSave") {
            None => defaults.auto_save,
            Some(v) => v.as_bool().unwrap_or_else(|| {
                warn!(value = %v, "Invalid autoSave setting, using default");
                defaults.auto_save
            }),
        };

        let show_previews = match obj.get("showPreviews") {
            None => defaults.show_previews,
            Some(v) => v.as_bool().unwrap_or_else(|| {
                warn!(value = %v, "Invalid showPreviews setting, using default");
                defaults.show_previews
            }),
        };

        let search_depth = match obj.get("searchDepth") {
            None => defaults.search_depth,
            Some(v) => v.as_str().and_then(SearchDepth::from_id).unwrap_or_else(|| {
                warn!(value = %v, "Invalid searchDepth setting, using default");
                defaults.search_depth
            }),
        };

        let theme = match obj.get("theme") {
            None => defaults.theme,
            Some(v) => v.as_str().and_then(Theme::from_id).unwrap_or_else(|| {
                warn!(value = %v, "Invalid theme setting, using default");
                defaults.theme
            }),
        };

        Self {
            auto_save,
            show_previews,
            search_depth,
            theme,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = UserSettings::default();
        assert!(!settings.auto_save);
        assert!(settings.show_previews);
        assert_eq!(settings.search_depth, SearchDepth::Advanced);
        assert_eq!(settings.theme, Theme::System);
    }

    #[test]
    fn test_reads_values_written_by_the_browser_ui() {
        let settings = UserSettings::from_value(&json!({
            "autoSave": true,
            "showPreviews": false,
            "searchDepth": "Comprehensive",
            "theme": "dark",
        }));
        assert_eq!(
            settings,
            UserSettings {
                auto_save: true,
                show_previews: false,
                search_depth: SearchDepth::Comprehensive,
                theme: Theme::Dark,
            }
        );
    }

    #[test]
    fn test_invalid_keys_fall_back_individually() {
        let settings = UserSettings::from_value(&json!({
            "autoSave": "yes",
            "showPreviews": false,
            "searchDepth": "deepest",
            "theme": 7,
        }));
        assert!(!settings.auto_save);
        assert!(!settings.show_previews);
        assert_eq!(settings.search_depth, SearchDepth::Advanced);
        assert_eq!(settings.theme, Theme::System);
    }

    #[test]
    fn test_non_object_is_all_defaults() {
        assert_eq!(UserSettings::from_value(&json!([1, 2])), UserSettings::default());
        assert_eq!(UserSettings::from_value(&Value::Null), UserSettings::default());
    }

    #[test]
    fn test_serializes_with_flat_camel_case_keys() {
        let value = serde_json::to_value(UserSettings::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "autoSave": false,
                "showPreviews": true,
                "searchDepth": "advanced",
                "theme": "system",
            })
        );
    }
}
