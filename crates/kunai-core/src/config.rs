use anyhow::Result;
use config::{Config, ConfigBuilder, builder::DefaultState};
use serde::Deserialize;

use crate::types::{Encoding, ErrorPolicy, ValidatePolicy};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub import: ImportConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    pub format: Encoding,
    pub supersede: bool,
    /// 0 continues past failed objects, 1 aborts the run.
    pub errors: ErrorPolicy,
    /// 0 disables validation, 1 skips invalid objects, 2 aborts the run.
    pub validation: ValidatePolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub format: Encoding,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from environment variables and an optional `config.toml`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Self::from_builder(
            Self::defaults()?
                .add_source(
                    config::Environment::default()
                        .convert_case(config::Case::Snake)
                        .separator("_")
                        .ignore_empty(true)
                        .try_parsing(true),
                )
                .add_source(config::File::with_name("config.toml").required(false)),
        )
    }

    /// ## Summary
    /// Loads configuration from TOML text layered over the defaults.
    ///
    /// ## Errors
    /// Returns an error if the TOML is malformed or holds invalid values.
    pub fn from_toml(toml: &str) -> Result<Self> {
        Self::from_builder(
            Self::defaults()?.add_source(config::File::from_str(toml, config::FileFormat::Toml)),
        )
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("import.format", Encoding::PlainText.as_str())?
            .set_default("import.supersede", false)?
            .set_default("import.errors", i64::from(ErrorPolicy::default()))?
            .set_default("import.validation", i64::from(ValidatePolicy::default()))?
            .set_default("export.format", Encoding::PlainText.as_str())?
            .set_default("logging.level", "info")?)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        Ok(builder.build()?.try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn defaults_apply_without_sources() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.import.format, Encoding::PlainText);
        assert!(!settings.import.supersede);
        assert_eq!(settings.import.errors, ErrorPolicy::Abort);
        assert_eq!(settings.import.validation, ValidatePolicy::SkipOnIssue);
        assert_eq!(settings.export.format, Encoding::PlainText);
        assert_eq!(settings.logging.level, "info");
    }

    #[test_log::test]
    fn toml_overrides_defaults() {
        let settings = Settings::from_toml(
            r#"
            [import]
            format = "jcal"
            supersede = true
            errors = 0
            validation = 2

            [export]
            format = "xcal"
            "#,
        )
        .unwrap();

        assert_eq!(settings.import.format, Encoding::Json);
        assert!(settings.import.supersede);
        assert_eq!(settings.import.errors, ErrorPolicy::Continue);
        assert_eq!(settings.import.validation, ValidatePolicy::FailOnIssue);
        assert_eq!(settings.export.format, Encoding::Xml);
    }

    #[test]
    fn out_of_range_policy_is_rejected() {
        assert!(Settings::from_toml("[import]\nvalidation = 5\n").is_err());
        assert!(Settings::from_toml("[export]\nformat = \"vcard\"\n").is_err());
    }
}
