//! Flattens a theme definition into the CSS custom properties the applicator
//! writes onto the document root.

use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::{PanelGradient, ThemeCatalog, ThemeDefinition, ThemeType};
use crate::color::{parse_color, Rgb};

pub const DEFAULT_THEME_KEY: &str = "celeste";
const DEFAULT_BLUR: BlurIntensity = BlurIntensity::Md;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurIntensity {
    None,
    Sm,
    Md,
    Lg,
    Xl,
}

impl BlurIntensity {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "none" => Some(Self::None),
            "sm" => Some(Self::Sm),
            "md" => Some(Self::Md),
            "lg" => Some(Self::Lg),
            "xl" => Some(Self::Xl),
            _ => None,
        }
    }

    pub const fn px(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Sm => 8,
            Self::Md => 12,
            Self::Lg => 16,
            Self::Xl => 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Rgb(Rgb),
    Px(u16),
    Opacity(f64),
    Raw(String),
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb(rgb) => write!(f, "{rgb}"),
            Self::Px(px) => write!(f, "{px}px"),
            Self::Opacity(value) => write!(f, "{value}"),
            Self::Raw(value) => f.write_str(value),
        }
    }
}

/// Output of [`resolve`]: the effective theme plus its variables, keyed by
/// full property name (`--primary`, `--glass-blur`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyleSet {
    theme_key: String,
    theme_type: ThemeType,
    variables: BTreeMap<String, StyleValue>,
}

impl ResolvedStyleSet {
    fn empty(theme_key: &str, theme_type: ThemeType) -> Self {
        Self {
            theme_key: theme_key.to_string(),
            theme_type,
            variables: BTreeMap::new(),
        }
    }

    pub fn theme_key(&self) -> &str {
        &self.theme_key
    }

    pub fn theme_type(&self) -> ThemeType {
        self.theme_type
    }

    pub fn get(&self, name: &str) -> Option<&StyleValue> {
        self.variables.get(name)
    }

    /// The value as it would appear in CSS.
    pub fn css_value(&self, name: &str) -> Option<String> {
        self.get(name).map(ToString::to_string)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.variables
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    fn insert(&mut self, name: impl Into<String>, value: StyleValue) {
        self.variables.insert(name.into(), value);
    }

    fn insert_color(&mut self, name: impl Into<String>, raw: &str) {
        let name = name.into();
        let rgb = parse_color(raw).unwrap_or_else(|| {
            tracing::warn!(
                variable = name.as_str(),
                value = raw,
                "unparsable theme color; writing black"
            );
            Rgb::BLACK
        });
        self.insert(name, StyleValue::Rgb(rgb));
    }
}

/// Resolves `theme_key` against the catalog. Unknown keys resolve as
/// [`DEFAULT_THEME_KEY`]; this never fails.
pub fn resolve(catalog: &ThemeCatalog, theme_key: &str, theme_type: ThemeType) -> ResolvedStyleSet {
    if let Some(definition) = valid_definition(catalog, theme_key, theme_type) {
        return resolve_definition(definition, theme_type);
    }

    tracing::warn!(
        theme_key,
        %theme_type,
        fallback = DEFAULT_THEME_KEY,
        "theme not usable; resolving default theme"
    );
    match valid_definition(catalog, DEFAULT_THEME_KEY, theme_type) {
        Some(definition) => resolve_definition(definition, theme_type),
        None => {
            tracing::error!(%theme_type, "default theme missing from catalog");
            ResolvedStyleSet::empty(DEFAULT_THEME_KEY, theme_type)
        }
    }
}

fn valid_definition<'a>(
    catalog: &'a ThemeCatalog,
    theme_key: &str,
    theme_type: ThemeType,
) -> Option<&'a ThemeDefinition> {
    let definition = catalog.get(theme_key, theme_type)?;
    match definition.validate(theme_type) {
        Ok(()) => Some(definition),
        Err(err) => {
            tracing::warn!(%err, "skipping invalid theme definition");
            None
        }
    }
}

/// Resolves a single definition. Glass, sidebar and dashboard header
/// parameters are only read for glass themes.
pub fn resolve_definition(definition: &ThemeDefinition, theme_type: ThemeType) -> ResolvedStyleSet {
    let mut styles = ResolvedStyleSet::empty(&definition.key, theme_type);

    for (role, value) in &definition.colors {
        let Some(name) = role_variable_name(role) else {
            tracing::warn!(role = role.as_str(), "ignoring color role with invalid name");
            continue;
        };
        styles.insert_color(name, value);
    }

    if theme_type != ThemeType::Glass {
        return styles;
    }

    if let Some(glass) = &definition.glass {
        styles.insert(
            "--glass-blur",
            StyleValue::Px(blur_px(&glass.blur_intensity)),
        );
        styles.insert("--glass-bg-opacity", StyleValue::Opacity(glass.card_opacity));
        styles.insert(
            "--glass-border-opacity",
            StyleValue::Opacity(glass.border_opacity),
        );
        styles.insert(
            "--glass-hover-opacity",
            StyleValue::Opacity(glass.hover_opacity),
        );
        styles.insert_color("--gradient-from", &glass.background_gradient_from);
        styles.insert_color("--gradient-via", &glass.background_gradient_via);
        styles.insert_color("--gradient-to", &glass.background_gradient_to);
    }

    if let Some(sidebar) = &definition.sidebar {
        insert_panel(&mut styles, "--sidebar", sidebar);
        styles.insert_color("--sidebar-background", &sidebar.gradient_from);
        styles.insert_color("--sidebar-accent", &sidebar.gradient_via);
        styles.insert_color("--sidebar-foreground", &sidebar.text_color);
        styles.insert_color("--sidebar-primary", &sidebar.text_color);
        styles.insert_color("--sidebar-accent-foreground", &sidebar.text_color);
    }

    if let Some(header) = &definition.dashboard_header {
        insert_panel(&mut styles, "--dashboard-header", header);
        styles.insert_color("--dashboard-header-foreground", &header.text_color);
    }

    styles
}

fn insert_panel(styles: &mut ResolvedStyleSet, prefix: &str, panel: &PanelGradient) {
    styles.insert_color(format!("{prefix}-gradient-from"), &panel.gradient_from);
    styles.insert_color(format!("{prefix}-gradient-via"), &panel.gradient_via);
    styles.insert_color(format!("{prefix}-gradient-to"), &panel.gradient_to);
    styles.insert(
        format!("{prefix}-gradient-opacity"),
        StyleValue::Opacity(panel.opacity),
    );
    styles.insert(
        format!("{prefix}-text-color"),
        StyleValue::Raw(panel.text_color.trim().to_string()),
    );
}

/// Blur length for a catalog `blurIntensity`; unknown names get 12px.
pub fn blur_px(intensity: &str) -> u16 {
    BlurIntensity::from_name(intensity)
        .unwrap_or(DEFAULT_BLUR)
        .px()
}

/// `cardForeground` and `card-foreground` both become `--card-foreground`.
fn role_variable_name(role: &str) -> Option<String> {
    let role = role.trim();
    if role.is_empty()
        || !role
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }

    let mut name = String::with_capacity(role.len() + 4);
    name.push_str("--");
    for (index, c) in role.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if index > 0 && !name.ends_with('-') {
                name.push('-');
            }
            name.push(c.to_ascii_lowercase());
        } else if c == '_' {
            name.push('-');
        } else {
            name.push(c);
        }
    }
    Some(name)
}
