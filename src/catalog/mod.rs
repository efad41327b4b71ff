use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::parse_color;

const BUILTIN_GLASS_CATALOG: &str = include_str!("../../themes/glass.json");
const BUILTIN_SOLID_CATALOG: &str = include_str!("../../themes/solid.json");

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read theme catalog: {path}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse theme catalog")]
    Parse(#[from] serde_json::Error),
    #[error("theme `{key}` not found in {theme_type} catalog")]
    ThemeNotFound { key: String, theme_type: ThemeType },
    #[error("theme `{key}` has invalid {field}: {reason}")]
    InvalidTheme {
        key: String,
        field: String,
        reason: String,
    },
    #[error("catalog worker exited before delivering a result")]
    WorkerDisconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeType {
    #[default]
    Glass,
    Solid,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme type `{0}`; expected `glass` or `solid`")]
pub struct UnknownThemeType(pub String);

impl ThemeType {
    pub const ALL: [ThemeType; 2] = [ThemeType::Glass, ThemeType::Solid];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Glass => "glass",
            Self::Solid => "solid",
        }
    }

    /// Lenient parse for persisted or user-supplied values; anything
    /// unrecognized becomes the default type.
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_else(|err: UnknownThemeType| {
            tracing::warn!(%err, "falling back to default theme type");
            Self::default()
        })
    }
}

impl FromStr for ThemeType {
    type Err = UnknownThemeType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "glass" => Ok(Self::Glass),
            "solid" => Ok(Self::Solid),
            _ => Err(UnknownThemeType(value.to_string())),
        }
    }
}

impl fmt::Display for ThemeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translucent-card parameters, only meaningful for glass themes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlassSettings {
    pub background_gradient_from: String,
    pub background_gradient_via: String,
    pub background_gradient_to: String,
    pub card_opacity: f64,
    pub border_opacity: f64,
    pub hover_opacity: f64,
    #[serde(default)]
    pub blur_intensity: String,
}

/// Gradient panel used by both the sidebar and the dashboard header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelGradient {
    pub gradient_from: String,
    pub gradient_via: String,
    pub gradient_to: String,
    pub opacity: f64,
    pub text_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeDefinition {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub colors: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glass: Option<GlassSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar: Option<PanelGradient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_header: Option<PanelGradient>,
    /// Picker ordering only.
    #[serde(default)]
    pub order: i32,
    /// Logo palette for the picker preview; never resolved into variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<BTreeMap<String, String>>,
}

/// Theme keys end up in class names and attribute values, so only ASCII
/// letters, digits, `-` and `_` are accepted.
pub fn is_valid_theme_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl ThemeDefinition {
    /// Checks the key plus the glass and panel values that are emitted into
    /// style output. Solid themes never read glass values.
    pub fn validate(&self, theme_type: ThemeType) -> CatalogResult<()> {
        if !is_valid_theme_key(&self.key) {
            return Err(self.invalid("key", "expected ASCII letters, digits, `-` or `_`".into()));
        }
        if theme_type != ThemeType::Glass {
            return Ok(());
        }

        if let Some(glass) = &self.glass {
            self.check_opacity("glass.cardOpacity", glass.card_opacity)?;
            self.check_opacity("glass.borderOpacity", glass.border_opacity)?;
            self.check_opacity("glass.hoverOpacity", glass.hover_opacity)?;
            self.check_color("glass.backgroundGradientFrom", &glass.background_gradient_from)?;
            self.check_color("glass.backgroundGradientVia", &glass.background_gradient_via)?;
            self.check_color("glass.backgroundGradientTo", &glass.background_gradient_to)?;
        }

        let panels = [
            ("sidebar", self.sidebar.as_ref()),
            ("dashboardHeader", self.dashboard_header.as_ref()),
        ];
        for (section, panel) in panels {
            let Some(panel) = panel else {
                continue;
            };
            self.check_opacity(&format!("{section}.opacity"), panel.opacity)?;
            self.check_color(&format!("{section}.gradientFrom"), &panel.gradient_from)?;
            self.check_color(&format!("{section}.gradientVia"), &panel.gradient_via)?;
            self.check_color(&format!("{section}.gradientTo"), &panel.gradient_to)?;
            self.check_color(&format!("{section}.textColor"), &panel.text_color)?;
        }
        Ok(())
    }

    fn check_opacity(&self, field: &str, value: f64) -> CatalogResult<()> {
        if (0.0..=1.0).contains(&value) {
            return Ok(());
        }
        Err(self.invalid(field, format!("opacity {value} is outside 0..=1")))
    }

    fn check_color(&self, field: &str, value: &str) -> CatalogResult<()> {
        if parse_color(value).is_some() {
            return Ok(());
        }
        Err(self.invalid(field, format!("unrecognized color {value:?}")))
    }

    fn invalid(&self, field: &str, reason: String) -> CatalogError {
        CatalogError::InvalidTheme {
            key: self.key.clone(),
            field: field.to_string(),
            reason,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogThemes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub themes: BTreeMap<String, ThemeDefinition>,
}

/// Response shape of a catalog fetch: `{ "themes": { "themes": { key: def } } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub themes: CatalogThemes,
}

impl CatalogResponse {
    /// Parses and normalizes a response; any shape mismatch is an error.
    pub fn parse(serialized: &str) -> CatalogResult<Self> {
        let mut response: CatalogResponse = serde_json::from_str(serialized)?;
        for (key, definition) in response.themes.themes.iter_mut() {
            if definition.key.is_empty() {
                definition.key = key.clone();
            } else if definition.key != *key {
                tracing::warn!(
                    entry = key.as_str(),
                    declared = definition.key.as_str(),
                    "theme key differs from catalog entry; using entry key"
                );
                definition.key = key.clone();
            }
        }
        Ok(response)
    }

    pub fn lookup(&self, key: &str) -> Option<&ThemeDefinition> {
        self.themes.themes.get(key)
    }

    pub fn version(&self) -> Option<&str> {
        self.themes.version.as_deref()
    }
}

/// Where theme catalogs come from. Called from a worker thread during bootstrap.
pub trait CatalogSource: Send + Sync {
    fn fetch(&self, theme_type: ThemeType) -> CatalogResult<CatalogResponse>;
}

/// Catalogs compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl CatalogSource for BuiltinCatalog {
    fn fetch(&self, theme_type: ThemeType) -> CatalogResult<CatalogResponse> {
        let serialized = match theme_type {
            ThemeType::Glass => BUILTIN_GLASS_CATALOG,
            ThemeType::Solid => BUILTIN_SOLID_CATALOG,
        };
        CatalogResponse::parse(serialized)
    }
}

/// Catalog responses stored as `<dir>/glass.json` and `<dir>/solid.json`.
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    dir: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, theme_type: ThemeType) -> PathBuf {
        self.dir.join(format!("{}.json", theme_type.as_str()))
    }
}

impl CatalogSource for DirectoryCatalog {
    fn fetch(&self, theme_type: ThemeType) -> CatalogResult<CatalogResponse> {
        let path = self.path_for(theme_type);
        let serialized = fs::read_to_string(&path).map_err(|source| CatalogError::Read {
            path: path.clone(),
            source,
        })?;
        CatalogResponse::parse(&serialized)
    }
}

/// Both per-type catalogs held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeCatalog {
    glass: CatalogResponse,
    solid: CatalogResponse,
}

impl ThemeCatalog {
    pub fn new(glass: CatalogResponse, solid: CatalogResponse) -> Self {
        Self { glass, solid }
    }

    pub fn builtin() -> CatalogResult<Self> {
        Self::from_source(&BuiltinCatalog)
    }

    pub fn from_source(source: &dyn CatalogSource) -> CatalogResult<Self> {
        Ok(Self {
            glass: source.fetch(ThemeType::Glass)?,
            solid: source.fetch(ThemeType::Solid)?,
        })
    }

    pub fn response(&self, theme_type: ThemeType) -> &CatalogResponse {
        match theme_type {
            ThemeType::Glass => &self.glass,
            ThemeType::Solid => &self.solid,
        }
    }

    pub fn get(&self, key: &str, theme_type: ThemeType) -> Option<&ThemeDefinition> {
        self.response(theme_type).lookup(key)
    }

    /// Definitions in picker order: `order` ascending, then key.
    pub fn themes_for(&self, theme_type: ThemeType) -> Vec<&ThemeDefinition> {
        let mut themes: Vec<&ThemeDefinition> =
            self.response(theme_type).themes.themes.values().collect();
        themes.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.key.cmp(&b.key)));
        themes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"{
        "themes": {
            "version": "2024.1",
            "themes": {
                "sunset": {
                    "name": "Sunset",
                    "colors": { "primary": "#FF6B35" },
                    "order": 2
                },
                "dawn": {
                    "key": "morning",
                    "colors": { "primary": "#FFFFFF" },
                    "order": 2
                },
                "ocean": {
                    "colors": { "primary": "#0077BE" },
                    "order": 1
                }
            }
        }
    }"##;

    #[test]
    fn theme_type_parses_case_insensitively() {
        assert_eq!("glass".parse::<ThemeType>(), Ok(ThemeType::Glass));
        assert_eq!(" Solid ".parse::<ThemeType>(), Ok(ThemeType::Solid));
        assert!("matte".parse::<ThemeType>().is_err());
    }

    #[test]
    fn theme_type_unknown_values_default_to_glass() {
        assert_eq!(ThemeType::parse_or_default("matte"), ThemeType::Glass);
        assert_eq!(ThemeType::parse_or_default(""), ThemeType::Glass);
        assert_eq!(ThemeType::parse_or_default("solid"), ThemeType::Solid);
    }

    #[test]
    fn parse_fills_missing_keys_from_entries() {
        let response = CatalogResponse::parse(MINIMAL).unwrap();
        assert_eq!(response.version(), Some("2024.1"));
        assert_eq!(response.lookup("sunset").unwrap().key, "sunset");
        assert_eq!(response.lookup("dawn").unwrap().key, "dawn");
        assert!(response.lookup("morning").is_none());
    }

    #[test]
    fn parse_rejects_definition_without_colors() {
        let err = CatalogResponse::parse(r#"{"themes": {"themes": {"bare": {"name": "Bare"}}}}"#)
            .unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn parse_rejects_wrong_envelope() {
        let err = CatalogResponse::parse(r#"{"themes": {"sunset": {"colors": {}}}}"#).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn themes_for_sorts_by_order_then_key() {
        let response = CatalogResponse::parse(MINIMAL).unwrap();
        let catalog = ThemeCatalog::new(response, CatalogResponse::default());
        let keys: Vec<&str> = catalog
            .themes_for(ThemeType::Glass)
            .iter()
            .map(|theme| theme.key.as_str())
            .collect();
        assert_eq!(keys, vec!["ocean", "dawn", "sunset"]);
        assert!(catalog.themes_for(ThemeType::Solid).is_empty());
    }

    #[test]
    fn builtin_catalog_defines_default_theme_for_both_types() {
        let catalog = ThemeCatalog::builtin().unwrap();
        for theme_type in ThemeType::ALL {
            let celeste = catalog
                .get("celeste", theme_type)
                .expect("celeste should exist for every theme type");
            assert!(!celeste.colors.is_empty());
        }
    }

    #[test]
    fn builtin_solid_themes_carry_no_glass_parameters() {
        let catalog = ThemeCatalog::builtin().unwrap();
        for theme in catalog.themes_for(ThemeType::Solid) {
            assert!(theme.glass.is_none(), "{} has glass settings", theme.key);
            assert!(theme.sidebar.is_none(), "{} has sidebar settings", theme.key);
        }
    }

    fn glass_definition(patch: serde_json::Value) -> ThemeDefinition {
        let mut value = serde_json::json!({
            "key": "sunset",
            "colors": { "primary": "#FF6B35" },
            "glass": {
                "backgroundGradientFrom": "#FFEDD5",
                "backgroundGradientVia": "#FECACA",
                "backgroundGradientTo": "#FDE68A",
                "cardOpacity": 0.65,
                "borderOpacity": 0.25,
                "hoverOpacity": 0.8,
                "blurIntensity": "xl"
            },
            "sidebar": {
                "gradientFrom": "#7C2D12",
                "gradientVia": "#C2410C",
                "gradientTo": "#F97316",
                "opacity": 0.95,
                "textColor": "#FFF7ED"
            }
        });
        for (section, fields) in patch.as_object().unwrap() {
            for (field, v) in fields.as_object().unwrap() {
                value[section][field] = v.clone();
            }
        }
        serde_json::from_value(value).unwrap()
    }

    fn invalid_field(definition: &ThemeDefinition) -> String {
        match definition.validate(ThemeType::Glass).unwrap_err() {
            CatalogError::InvalidTheme { key, field, .. } => {
                assert_eq!(key, "sunset");
                field
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn validate_accepts_builtin_themes() {
        let catalog = ThemeCatalog::builtin().unwrap();
        for theme_type in ThemeType::ALL {
            for theme in catalog.themes_for(theme_type) {
                theme.validate(theme_type).unwrap();
            }
        }
        glass_definition(serde_json::json!({})).validate(ThemeType::Glass).unwrap();
    }

    #[test]
    fn validate_rejects_out_of_range_opacities() {
        let card = glass_definition(serde_json::json!({ "glass": { "cardOpacity": 7.5 } }));
        assert_eq!(invalid_field(&card), "glass.cardOpacity");

        let border = glass_definition(serde_json::json!({ "glass": { "borderOpacity": -3.0 } }));
        assert_eq!(invalid_field(&border), "glass.borderOpacity");

        let sidebar = glass_definition(serde_json::json!({ "sidebar": { "opacity": 1.01 } }));
        assert_eq!(invalid_field(&sidebar), "sidebar.opacity");
    }

    #[test]
    fn validate_rejects_unparsable_panel_and_gradient_colors() {
        let injected = glass_definition(serde_json::json!({
            "sidebar": { "textColor": "#fff; } body { display: none" }
        }));
        assert_eq!(invalid_field(&injected), "sidebar.textColor");

        let named = glass_definition(serde_json::json!({ "sidebar": { "textColor": "white" } }));
        assert_eq!(invalid_field(&named), "sidebar.textColor");

        let stop = glass_definition(serde_json::json!({ "sidebar": { "gradientVia": "" } }));
        assert_eq!(invalid_field(&stop), "sidebar.gradientVia");

        let background = glass_definition(serde_json::json!({
            "glass": { "backgroundGradientTo": "transparent" }
        }));
        assert_eq!(invalid_field(&background), "glass.backgroundGradientTo");
    }

    #[test]
    fn theme_key_validation() {
        assert!(is_valid_theme_key("celeste"));
        assert!(is_valid_theme_key("rose_garden-2"));
        assert!(!is_valid_theme_key(""));
        assert!(!is_valid_theme_key("a b"));
        assert!(!is_valid_theme_key("x\"y"));
    }

    #[test]
    fn validate_rejects_malformed_keys() {
        let mut definition = glass_definition(serde_json::json!({}));
        definition.key = "sun set".into();
        let err = definition.validate(ThemeType::Solid).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTheme { ref field, .. } if field == "key"));
    }

    #[test]
    fn validate_ignores_glass_values_for_solid_themes() {
        let definition = glass_definition(serde_json::json!({ "glass": { "cardOpacity": 7.5 } }));
        definition.validate(ThemeType::Solid).unwrap();
    }

    #[test]
    fn directory_catalog_reads_per_type_files() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("solid.json"), MINIMAL).unwrap();
        let source = DirectoryCatalog::new(root.path());

        let response = source.fetch(ThemeType::Solid).unwrap();
        assert!(response.lookup("sunset").is_some());

        let err = source.fetch(ThemeType::Glass).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }
}
