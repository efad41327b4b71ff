use crate::catalog::ThemeType;
use crate::document::StyleContext;
use crate::resolver::ResolvedStyleSet;

pub const THEME_ATTRIBUTE: &str = "data-theme";
pub const THEME_TYPE_ATTRIBUTE: &str = "data-theme-type";
pub const GRADIENT_CLASS_PREFIX: &str = "gradient-";

/// Legacy keys whose gradient class does not follow `gradient-<key>`.
const GRADIENT_CLASS_ALIASES: [(&str, &str); 2] = [
    ("emnight", "gradient-emerald"),
    ("rosegarden", "gradient-rose"),
];

pub fn gradient_class(theme_key: &str) -> String {
    GRADIENT_CLASS_ALIASES
        .iter()
        .find(|(key, _)| *key == theme_key)
        .map(|(_, class)| (*class).to_string())
        .unwrap_or_else(|| format!("{GRADIENT_CLASS_PREFIX}{theme_key}"))
}

/// Attributes and gradient class only. Needs no catalog data, so it can run
/// before the first frame.
pub fn apply_coarse(ctx: &mut StyleContext, theme_key: &str, theme_type: ThemeType) {
    ctx.set_attribute(THEME_TYPE_ATTRIBUTE, theme_type.as_str());
    ctx.set_attribute(THEME_ATTRIBUTE, theme_key);

    let removed = ctx.remove_classes_with_prefix(GRADIENT_CLASS_PREFIX);
    if theme_type == ThemeType::Glass {
        ctx.add_class(&gradient_class(theme_key));
    }
    tracing::debug!(
        theme_key,
        %theme_type,
        removed_classes = removed,
        "applied coarse theme styling"
    );
}

/// Full application: coarse styling plus every resolved variable. Variables
/// from a previously applied theme are dropped first.
pub fn apply(
    ctx: &mut StyleContext,
    styles: &ResolvedStyleSet,
    theme_key: &str,
    theme_type: ThemeType,
) {
    apply_coarse(ctx, theme_key, theme_type);

    ctx.clear_properties();
    for (name, value) in styles.iter() {
        ctx.set_property(name, &value.to_string());
    }
    tracing::debug!(
        theme_key,
        %theme_type,
        variables = styles.len(),
        "applied theme variables"
    );
}
