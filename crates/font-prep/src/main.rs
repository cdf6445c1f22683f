//! Command-line interface of `font-prep`.
//!
//! Every command prints a single JSON document to stdout. Diagnostics go to stderr via
//! `env_logger` (controlled by `RUST_LOG`).

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use serde_json::{json, Value};

use font_prep::{
    plan, width_metrics, Classification, Classifier, Config, ConfigError, CoverageAnalyzer, Error,
    ErrorKind, Font, FontFile, FontMetadata, FontSubset, ParseError, RangeError, RangeParser,
    RangeSet,
};

/// Kind reported for errors not originating from the library.
const INTERNAL_ERROR_KIND: &str = "InternalError";

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML config file. Defaults to `$FONT_PREP_CONFIG`, then to built-in thresholds.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Pretty-print JSON output. `subset` and `metrics` pretty-print unless `--quiet` is set.
    #[arg(long, global = true)]
    pretty: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify a font as emoji, symbol, barcode or textual.
    Identify {
        /// Font file (TTF, OTF or WOFF2).
        font: PathBuf,
    },
    /// Report how much of a Unicode range a font covers.
    Coverage {
        /// Font file (TTF, OTF or WOFF2).
        font: PathBuf,
        /// Unicode range, e.g. `U+0000-00FF, U+0131`.
        range: String,
        /// Analyze non-textual fonts too.
        #[arg(long)]
        force: bool,
    },
    /// Subset a font to a Unicode range.
    Subset {
        /// Input font file.
        input: PathBuf,
        /// Output file; `.woff2` produces WOFF2, `.ttf` TrueType, anything else OpenType.
        output: PathBuf,
        /// Unicode range to keep.
        range: String,
        /// Replace name records (license, copyright, etc.) with an empty table.
        #[arg(long)]
        no_preserve_names: bool,
        /// Print compact JSON and only log errors.
        #[arg(long)]
        quiet: bool,
        /// Subset non-textual fonts too.
        #[arg(long)]
        force: bool,
    },
    /// Compute advance width statistics over a Unicode range.
    Metrics {
        /// Font file (TTF, OTF or WOFF2).
        font: PathBuf,
        /// Unicode range to measure.
        range: String,
        /// Print compact JSON and only log errors.
        #[arg(long)]
        quiet: bool,
    },
}

impl Command {
    fn is_quiet(&self) -> bool {
        matches!(
            self,
            Self::Subset { quiet: true, .. } | Self::Metrics { quiet: true, .. }
        )
    }
}

fn open_font(path: &Path) -> anyhow::Result<FontFile> {
    FontFile::open(path).with_context(|| format!("failed opening font {}", path.display()))
}

fn parse_range(config: &Config, spec: &str) -> anyhow::Result<RangeSet> {
    let mut parser = RangeParser::new(&config.cache);
    parser
        .parse(spec)
        .with_context(|| format!("invalid Unicode range `{spec}`"))
}

fn classify(config: &Config, font: &Font<'_>) -> anyhow::Result<Classification> {
    let classifier = Classifier::new(config.classifier.clone())?;
    let meta = FontMetadata::from_font(font).context("failed reading font metadata")?;
    let classification = classifier.classify(&meta)?;
    log::info!(
        "classified font as {:?} (geometry sampled: {})",
        classification.result,
        classification.geometry_sampled
    );
    Ok(classification)
}

/// Returns the `skipped` document if `font` is non-textual and processing isn't forced.
fn check_textual(config: &Config, font: &Font<'_>, force: bool) -> anyhow::Result<Option<Value>> {
    if force {
        return Ok(None);
    }
    let classification = classify(config, font)?;
    Ok(classification.result.is_non_textual().then(|| {
        json!({
            "skipped": true,
            "classification": classification.result,
        })
    }))
}

impl Cli {
    fn pretty_output(&self) -> bool {
        match &self.command {
            Command::Subset { quiet, .. } | Command::Metrics { quiet, .. } => self.pretty || !quiet,
            Command::Identify { .. } | Command::Coverage { .. } => self.pretty,
        }
    }

    fn run(&self) -> anyhow::Result<Value> {
        let config = Config::resolve(self.config.as_deref())?;
        match &self.command {
            Command::Identify { font } => {
                let file = open_font(font)?;
                let font = file.font()?;
                let classification = classify(&config, &font)?;
                Ok(serde_json::to_value(classification.result)?)
            }

            Command::Coverage {
                font: font_path,
                range,
                force,
            } => {
                let range = parse_range(&config, range)?;
                let file = open_font(font_path)?;
                let font = file.font()?;
                if let Some(skipped) = check_textual(&config, &font, *force)? {
                    return Ok(skipped);
                }
                let mut analyzer = CoverageAnalyzer::new(&config);
                let mut report = analyzer.analyze(font.char_map(), &range);
                report.font = Some(font_path.clone());
                Ok(serde_json::to_value(report)?)
            }

            Command::Subset {
                input,
                output,
                range,
                no_preserve_names,
                force,
                ..
            } => {
                let range = parse_range(&config, range)?;
                let file = open_font(input)?;
                let font = file.font()?;
                if let Some(skipped) = check_textual(&config, &font, *force)? {
                    return Ok(skipped);
                }
                let plan = plan(font.char_map(), &range, !no_preserve_names);
                let subset = FontSubset::new(&font, &plan).context("failed subsetting font")?;
                let report = subset.save(&range, output)?;
                Ok(serde_json::to_value(report)?)
            }

            Command::Metrics { font, range, .. } => {
                let range = parse_range(&config, range)?;
                let file = open_font(font)?;
                let font = file.font()?;
                let metrics = width_metrics(&font, &range)?;
                Ok(serde_json::to_value(metrics)?)
            }
        }
    }
}

fn error_kind(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<Error>() {
            return err.kind().as_str();
        } else if let Some(err) = cause.downcast_ref::<RangeError>() {
            return err.kind().as_str();
        } else if cause.is::<ParseError>() {
            return ErrorKind::FontAccessError.as_str();
        } else if cause.is::<ConfigError>() {
            return ErrorKind::ConfigError.as_str();
        }
    }
    INTERNAL_ERROR_KIND
}

fn error_document(err: &anyhow::Error) -> Value {
    json!({
        "error": {
            "kind": error_kind(err),
            "message": format!("{err:#}"),
        }
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.command.is_quiet() {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let (output, exit_code) = match cli.run() {
        Ok(output) => (output, ExitCode::SUCCESS),
        Err(err) => {
            log::debug!("command failed: {err:?}");
            (error_document(&err), ExitCode::FAILURE)
        }
    };
    if cli.pretty_output() {
        println!("{output:#}");
    } else {
        println!("{output}");
    }
    exit_code
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parsing_subset_args() {
        let cli = Cli::try_parse_from([
            "font-prep",
            "subset",
            "in.ttf",
            "out.woff2",
            "U+0000-00FF",
            "--no-preserve-names",
            "--quiet",
            "--config",
            "prep.toml",
        ])
        .unwrap();

        assert_eq!(cli.config.as_deref(), Some(Path::new("prep.toml")));
        assert!(cli.command.is_quiet());
        let Command::Subset {
            output,
            range,
            no_preserve_names,
            force,
            ..
        } = &cli.command
        else {
            panic!("unexpected command: {:?}", cli.command);
        };
        assert_eq!(output, Path::new("out.woff2"));
        assert_eq!(range, "U+0000-00FF");
        assert!(*no_preserve_names);
        assert!(!*force);
    }

    #[test]
    fn error_kinds_survive_context() {
        let err = RangeSet::parse("U+0050-0041").unwrap_err();
        let err = anyhow::Error::from(err).context("invalid Unicode range");
        assert_eq!(error_kind(&err), "RangeOrderError");

        let err = anyhow::Error::from(Error::ClassificationPrecondition("glyph sampler"));
        assert_eq!(error_kind(&err), "ClassificationPreconditionError");

        let err = FontFile::new(b"wOF2 but not really".to_vec()).unwrap_err();
        let err = anyhow::Error::from(err).context("failed reading font");
        assert_eq!(error_kind(&err), "FontAccessError");

        let err = anyhow::anyhow!("something else");
        assert_eq!(error_kind(&err), INTERNAL_ERROR_KIND);
    }

    #[test]
    fn error_document_layout() {
        let err = anyhow::Error::from(RangeSet::parse("U+XYZ").unwrap_err());
        let doc = error_document(&err);
        assert_eq!(doc["error"]["kind"], "MalformedRangeError");
        assert!(
            doc["error"]["message"].as_str().unwrap().contains("U+XYZ"),
            "{doc}"
        );
    }

    #[test]
    fn running_with_missing_font_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            OsStr::new("font-prep"),
            OsStr::new("identify"),
            dir.path().join("missing.ttf").as_os_str(),
        ])
        .unwrap();
        let err = cli.run().unwrap_err();
        assert_eq!(error_kind(&err), "FontAccessError");
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("prep.toml");
        std::fs::write(&config_path, "[classifier]\nbar_majority = 2.0\n").unwrap();
        let cli = Cli::try_parse_from([
            OsStr::new("font-prep"),
            OsStr::new("--config"),
            config_path.as_os_str(),
            OsStr::new("metrics"),
            OsStr::new("font.ttf"),
            "U+0041".as_ref(),
        ])
        .unwrap();
        let err = cli.run().unwrap_err();
        assert_eq!(error_kind(&err), "ConfigError");
    }

    #[test]
    fn invalid_range_is_reported_before_reading_font() {
        let dir = tempfile::tempdir().unwrap();
        let font_path = dir.path().join("missing.ttf");
        let output_path = dir.path().join("out.woff2");
        let samples = [
            ("U+ZZZZ", "MalformedRangeError"),
            ("U+0050-0041", "RangeOrderError"),
            ("U+110000", "RangeBoundsError"),
        ];
        for (range, expected_kind) in samples {
            let commands = [
                vec![OsStr::new("coverage"), font_path.as_os_str(), OsStr::new(range)],
                vec![
                    OsStr::new("subset"),
                    font_path.as_os_str(),
                    output_path.as_os_str(),
                    OsStr::new(range),
                ],
                vec![OsStr::new("metrics"), font_path.as_os_str(), OsStr::new(range)],
            ];
            for args in commands {
                let cli = Cli::try_parse_from([OsStr::new("font-prep")].into_iter().chain(args))
                    .unwrap();
                let err = cli.run().unwrap_err();
                assert_eq!(error_kind(&err), expected_kind, "{range}");
            }
        }
        assert!(!output_path.exists());
    }

    #[test]
    fn output_layout_by_command() {
        let parse = |args: &[&str]| {
            Cli::try_parse_from(std::iter::once("font-prep").chain(args.iter().copied())).unwrap()
        };
        assert!(!parse(&["identify", "font.ttf"]).pretty_output());
        assert!(parse(&["identify", "font.ttf", "--pretty"]).pretty_output());
        assert!(!parse(&["coverage", "font.ttf", "U+0041"]).pretty_output());
        assert!(parse(&["subset", "in.ttf", "out.ttf", "U+0041"]).pretty_output());
        assert!(!parse(&["subset", "in.ttf", "out.ttf", "U+0041", "--quiet"]).pretty_output());
        assert!(parse(&["metrics", "font.ttf", "U+0041"]).pretty_output());
        assert!(!parse(&["metrics", "font.ttf", "U+0041", "--quiet"]).pretty_output());
    }
}
