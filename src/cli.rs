use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::applicator::apply;
use crate::bootstrap::{RefinementOutcome, ThemeRuntime};
use crate::catalog::{
    is_valid_theme_key, BuiltinCatalog, CatalogError, CatalogSource, DirectoryCatalog,
    ThemeCatalog, ThemeType,
};
use crate::config::{load_app_config, AppConfig};
use crate::document::StyleContext;
use crate::error::AppResult;
use crate::persistence::{FileStorage, Selection, SelectionStore};
use crate::resolver::resolve;

/// Resolve, persist, and render dashboard themes.
#[derive(Parser, Debug, Clone)]
#[command(name = "campus-theme", version)]
pub struct Cli {
    /// Read catalogs from `<DIR>/glass.json` and `<DIR>/solid.json` instead of
    /// the built-in themes.
    #[arg(long, global = true, value_name = "DIR")]
    pub catalog_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the page-load bootstrap and print the resulting document root.
    Show,
    /// Print the `:root` stylesheet for a theme (defaults to the saved one).
    Css {
        #[arg(long)]
        theme: Option<String>,
        #[arg(long = "type", value_name = "TYPE")]
        theme_type: Option<ThemeType>,
    },
    /// List themes in picker order.
    List {
        #[arg(long = "type", value_name = "TYPE", default_value = "glass")]
        theme_type: ThemeType,
    },
    /// Save a theme selection and apply it.
    Set {
        theme: String,
        #[arg(long = "type", value_name = "TYPE", default_value = "glass")]
        theme_type: ThemeType,
    },
}

pub fn run(cli: Cli) -> AppResult<()> {
    let config = load_app_config();
    let source = catalog_source(cli.catalog_dir.as_ref(), &config);
    let store = SelectionStore::with_fallback(
        FileStorage::with_default_path()?,
        fallback_selection(&config),
    );

    match cli.command {
        Command::Show => {
            let mut runtime = ThemeRuntime::new(store, source);
            runtime.bootstrap();
            report_outcomes(&runtime.wait());
            print_context(runtime.context());
        }
        Command::Css { theme, theme_type } => {
            let saved = store.load();
            let theme_key = theme.unwrap_or(saved.theme_key);
            let theme_type = theme_type.unwrap_or(saved.theme_type);

            let catalog = ThemeCatalog::from_source(source.as_ref())?;
            let styles = resolve(&catalog, &theme_key, theme_type);
            let mut ctx = StyleContext::new();
            apply(&mut ctx, &styles, styles.theme_key(), theme_type);
            print!("{}", ctx.to_css());
        }
        Command::List { theme_type } => {
            let current = store.load();
            let catalog = ThemeCatalog::from_source(source.as_ref())?;
            for theme in catalog.themes_for(theme_type) {
                let selected = current.theme_type == theme_type && current.theme_key == theme.key;
                let marker = if selected { '*' } else { ' ' };
                println!(
                    "{marker} {:<12} {:<16} {}",
                    theme.key, theme.name, theme.description
                );
            }
        }
        Command::Set { theme, theme_type } => {
            let catalog = ThemeCatalog::from_source(source.as_ref())?;
            let Some(definition) = catalog.get(&theme, theme_type) else {
                return Err(CatalogError::ThemeNotFound {
                    key: theme,
                    theme_type,
                }
                .into());
            };
            definition.validate(theme_type)?;

            let mut runtime = ThemeRuntime::new(store, source);
            runtime.bootstrap();
            runtime.select_theme(Selection::new(theme, theme_type));
            report_outcomes(&runtime.wait());
            print_context(runtime.context());
        }
    }

    Ok(())
}

fn catalog_source(catalog_dir: Option<&PathBuf>, config: &AppConfig) -> Arc<dyn CatalogSource> {
    match catalog_dir.or(config.catalog_dir.as_ref()) {
        Some(dir) => {
            tracing::debug!(dir = %dir.display(), "using catalog directory");
            Arc::new(DirectoryCatalog::new(dir.clone()))
        }
        None => Arc::new(BuiltinCatalog),
    }
}

fn fallback_selection(config: &AppConfig) -> Selection {
    let default = Selection::default();
    Selection {
        theme_key: config
            .default_theme
            .as_deref()
            .map(str::trim)
            .filter(|key| is_valid_theme_key(key))
            .map_or(default.theme_key, str::to_string),
        theme_type: config.default_theme_type.unwrap_or(default.theme_type),
    }
}

fn report_outcomes(outcomes: &[RefinementOutcome]) {
    let failed = outcomes
        .iter()
        .filter(|outcome| **outcome == RefinementOutcome::Failed)
        .count();
    if failed > 0 {
        tracing::warn!(failed, "some theme refinements failed; showing coarse styling");
    }
}

fn print_context(ctx: &StyleContext) {
    println!("<html {}>", ctx.root_attributes());
    print!("{}", ctx.to_css());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_set_with_type() {
        let cli =
            Cli::try_parse_from(["campus-theme", "set", "midnight", "--type", "solid"]).unwrap();
        match cli.command {
            Command::Set { theme, theme_type } => {
                assert_eq!(theme, "midnight");
                assert_eq!(theme_type, ThemeType::Solid);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_unknown_theme_type() {
        assert!(Cli::try_parse_from(["campus-theme", "list", "--type", "matte"]).is_err());
    }

    #[test]
    fn fallback_selection_prefers_config_defaults() {
        let config = AppConfig {
            catalog_dir: None,
            default_theme: Some("sunset".into()),
            default_theme_type: Some(ThemeType::Solid),
        };
        assert_eq!(
            fallback_selection(&config),
            Selection::new("sunset", ThemeType::Solid)
        );
        assert_eq!(fallback_selection(&AppConfig::default()), Selection::default());

        let config = AppConfig {
            default_theme: Some("sun set".into()),
            ..AppConfig::default()
        };
        assert_eq!(fallback_selection(&config), Selection::default());
    }
}
