// used to read locale settings from a file and the environment
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};

use crate::error::{Result, StrataError};
use crate::locale::LocaleContext;

pub const ENV_PREFIX: &str = "STRATA";

/// Loads the locale state repositories start out with.
///
/// Keys are `locale`, `locales` and `locale_fallbacks`, any of them may be
/// left out. Environment variables override the file, e.g.
/// `STRATA_LOCALE=de`, `STRATA_LOCALES=en,de` or
/// `STRATA_LOCALE_FALLBACKS__FR=en`.
pub struct Settings;

impl Settings {
    /// Reads the optional settings file (format derived from its extension)
    /// and then the environment.
    pub fn load(path: Option<&str>) -> Result<LocaleContext> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        Self::build(builder.add_source(Self::environment()))
    }
    /// Reads settings from text in the given format, ignoring the environment.
    pub fn parse(content: &str, format: FileFormat) -> Result<LocaleContext> {
        Self::build(Config::builder().add_source(File::from_str(content, format)))
    }
    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("locales")
    }
    fn build(builder: ConfigBuilder<DefaultState>) -> Result<LocaleContext> {
        let locales: LocaleContext = builder.build()?.try_deserialize()?;
        if !locales.is_active(locales.locale()) {
            return Err(StrataError::Config(format!(
                "locale '{}' is not among the active locales [{}]",
                locales.locale(),
                locales.locales().join(", ")
            )));
        }
        Ok(locales)
    }
}
