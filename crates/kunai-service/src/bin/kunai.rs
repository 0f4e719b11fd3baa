//! Imports a calendar file into an in-memory store and exports it again.
//!
//! Without an output file the export goes to stdout. Encodings default to
//! the file extensions (`.ics`, `.jcs`, `.xcs`, `.json`, `.xml`), then to the
//! configured formats; import policies default to the configuration.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use kunai_core::config::{Settings, load_config};
use kunai_core::error::CoreError;
use kunai_core::logging;
use kunai_core::options::{ExportOptions, ImportOptions};
use kunai_core::types::{Encoding, ErrorPolicy, ValidatePolicy};
use kunai_rfc::rfc::validation::CalendarValidator;
use kunai_service::calendar::export::{export_calendar, export_to_file, export_to_writer};
use kunai_service::calendar::import::import_calendar;
use kunai_service::store::MemoryStore;

const CALENDAR: &str = "default";

#[derive(Debug, Parser)]
#[command(name = "kunai")]
#[command(about = "Import a calendar file and export it again in any encoding")]
struct Cli {
    /// Calendar file to import
    input: PathBuf,

    /// Write the export here instead of stdout
    output: Option<PathBuf>,

    /// Input encoding (ical, jcal, xcal)
    #[arg(long)]
    from: Option<Encoding>,

    /// Export encoding (ical, jcal, xcal)
    #[arg(short, long)]
    format: Option<Encoding>,

    /// Replace objects whose UID is already stored
    #[arg(long)]
    supersede: bool,

    /// Failed objects: 0 records them and continues, 1 stops the run
    #[arg(long, value_parser = policy_code::<ErrorPolicy>)]
    errors: Option<ErrorPolicy>,

    /// Validation: 0 off, 1 skips objects with issues, 2 stops the run
    #[arg(long, value_parser = policy_code::<ValidatePolicy>)]
    validation: Option<ValidatePolicy>,
}

fn policy_code<T: TryFrom<i64, Error = CoreError>>(value: &str) -> anyhow::Result<T> {
    let code: i64 = value
        .parse()
        .with_context(|| format!("expected a numeric code, got {value}"))?;
    Ok(T::try_from(code)?)
}

fn encoding_of(path: &Path) -> Option<Encoding> {
    path.extension()?
        .to_str()
        .and_then(Encoding::from_file_extension)
}

impl Cli {
    fn import_options(&self, settings: &Settings) -> ImportOptions {
        let configured = ImportOptions::from(&settings.import);
        ImportOptions::new(
            self.from
                .or_else(|| encoding_of(&self.input))
                .unwrap_or(configured.format),
        )
        .with_supersede(self.supersede || configured.supersede)
        .with_error_policy(self.errors.unwrap_or(configured.error_policy))
        .with_validate_policy(self.validation.unwrap_or(configured.validate_policy))
    }

    fn export_options(&self, settings: &Settings) -> ExportOptions {
        let format = self
            .format
            .or_else(|| self.output.as_deref().and_then(encoding_of))
            .unwrap_or(settings.export.format);
        ExportOptions::new(format)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = logging::init();
    let settings = load_config()?;
    logging::apply(&filter, &settings.logging);
    tracing::debug!(config = ?settings, "Configuration loaded");

    let cli = Cli::parse();
    let import_options = cli.import_options(&settings);
    let export_options = cli.export_options(&settings);

    let mut source = std::fs::File::open(&cli.input)
        .with_context(|| format!("failed to open {}", cli.input.display()))?;
    let store = MemoryStore::new();
    let outcome = import_calendar(
        &mut source,
        import_options,
        &store,
        &CalendarValidator::new(),
        CALENDAR,
    )
    .await?;
    eprintln!("{}", serde_json::to_string(&outcome.summary())?);

    let exporter = export_calendar(&store, CALENDAR, &export_options);
    match &cli.output {
        Some(path) => {
            export_to_file(exporter, path).await?;
        }
        None => {
            export_to_writer(exporter, &mut tokio::io::stdout()).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::from_toml("[export]\nformat = \"jcal\"\n").unwrap()
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kunai").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn encodings_follow_file_extensions() {
        let cli = cli(&["in.xcs", "out.ics"]);
        assert_eq!(cli.import_options(&settings()).format, Encoding::Xml);
        assert_eq!(cli.export_options(&settings()).format, Encoding::PlainText);
    }

    #[test]
    fn flags_override_extensions_and_config() {
        let cli = cli(&[
            "in.ics",
            "out.ics",
            "--from",
            "jcal",
            "-f",
            "xcal",
            "--supersede",
            "--errors",
            "0",
            "--validation",
            "2",
        ]);
        let import = cli.import_options(&settings());
        assert_eq!(import.format, Encoding::Json);
        assert!(import.supersede);
        assert_eq!(import.error_policy, ErrorPolicy::Continue);
        assert_eq!(import.validate_policy, ValidatePolicy::FailOnIssue);
        assert_eq!(cli.export_options(&settings()).format, Encoding::Xml);
    }

    #[test]
    fn configuration_fills_the_gaps() {
        let cli = cli(&["calendar.txt"]);
        let import = cli.import_options(&settings());
        assert_eq!(import.format, Encoding::PlainText);
        assert_eq!(import.error_policy, ErrorPolicy::Abort);
        assert_eq!(cli.export_options(&settings()).format, Encoding::Json);
    }

    #[test]
    fn bad_codes_are_rejected() {
        let parse = |args: &[&str]| {
            Cli::try_parse_from(std::iter::once("kunai").chain(args.iter().copied()))
        };
        assert!(parse(&["in.ics", "--errors", "2"]).is_err());
        assert!(parse(&["in.ics", "--validation", "skip"]).is_err());
        assert!(parse(&["in.ics", "--format", "vcard"]).is_err());
    }
}
