//! Binary entry point for phiscrub.
//!
//! Reads clinical text from a file or stdin and writes the de-identified
//! text (or the full structured result) to stdout.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use phiscrub::config::PhiscrubConfig;
use phiscrub::observability;
use phiscrub::{CustomPattern, PatientIdentity, PhiRedactor, PolicyOverrides, RedactionPolicy};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Phiscrub - de-identify clinical text.
#[derive(Parser)]
#[command(name = "phiscrub")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "PHISCRUB_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Redact PHI and print the result.
    Redact {
        #[command(flatten)]
        input: InputArgs,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Report how many entities of each type would be redacted.
    Scan {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Show the effective policy.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,

        #[command(flatten)]
        policy: PolicyArgs,
    },
}

/// Output formats for `redact`.
#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Redacted text only.
    Text,
    /// Redacted text and events as JSON.
    Json,
}

/// Input text and patient identity.
#[derive(Args)]
struct InputArgs {
    /// File to read; stdin when omitted or `-`.
    file: Option<PathBuf>,

    /// Patient first name.
    #[arg(long, requires = "last_name")]
    first_name: Option<String>,

    /// Patient last name.
    #[arg(long, requires = "first_name")]
    last_name: Option<String>,

    #[command(flatten)]
    policy: PolicyArgs,
}

/// Policy overrides from the command line.
#[derive(Args)]
struct PolicyArgs {
    /// Redact dates.
    #[arg(long)]
    dates: bool,

    /// Redact ZIP codes.
    #[arg(long)]
    address: bool,

    /// Do not redact the patient's name.
    #[arg(long)]
    no_names: bool,

    /// Do not redact phone numbers.
    #[arg(long)]
    no_phone: bool,

    /// Do not redact email addresses.
    #[arg(long)]
    no_email: bool,

    /// Do not redact SSNs.
    #[arg(long)]
    no_ssn: bool,

    /// Do not redact credit card numbers.
    #[arg(long)]
    no_credit_card: bool,

    /// Custom pattern as `REGEX=TAG`; repeatable, applied in order.
    #[arg(long = "custom", value_name = "REGEX=TAG")]
    custom: Vec<String>,
}

impl PolicyArgs {
    /// Converts flags into overrides; unset flags leave the field untouched.
    fn to_overrides(&self) -> Result<PolicyOverrides> {
        let mut overrides = PolicyOverrides::new();
        if self.dates {
            overrides = overrides.with_dates(true);
        }
        if self.address {
            overrides = overrides.with_address(true);
        }
        if self.no_names {
            overrides = overrides.with_names(false);
        }
        if self.no_phone {
            overrides = overrides.with_phone(false);
        }
        if self.no_email {
            overrides = overrides.with_email(false);
        }
        if self.no_ssn {
            overrides = overrides.with_ssn(false);
        }
        if self.no_credit_card {
            overrides = overrides.with_credit_card(false);
        }
        for spec in &self.custom {
            overrides = overrides.with_custom_pattern(CustomPattern::parse_assignment(spec)?);
        }
        Ok(overrides)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(Some(&config.logging), cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

fn run_command(config: PhiscrubConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Redact { input, format } => cmd_redact(config, input, format),
        Commands::Scan { input } => cmd_scan(config, input),
        Commands::Config { show, policy } => cmd_config(config, show, policy),
    }
}

/// Loads configuration.
fn load_config(path: Option<&Path>) -> Result<PhiscrubConfig> {
    if let Some(config_path) = path {
        return PhiscrubConfig::load_from_file(config_path)
            .with_context(|| format!("loading {}", config_path.display()));
    }
    Ok(PhiscrubConfig::load_default())
}

/// Resolves config plus command-line flags into a policy.
fn resolve_policy(config: PhiscrubConfig, policy: &PolicyArgs) -> Result<RedactionPolicy> {
    let config = config.with_policy_overrides(policy.to_overrides()?);
    Ok(config.resolve_policy()?)
}

/// Reads the input text from a file or stdin.
fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        },
    }
}

fn patient_identity(input: &InputArgs) -> Result<Option<PatientIdentity>> {
    match (&input.first_name, &input.last_name) {
        (Some(first), Some(last)) => Ok(Some(PatientIdentity::new(first, last)?)),
        _ => Ok(None),
    }
}

/// Redact command.
fn cmd_redact(config: PhiscrubConfig, input: InputArgs, format: OutputFormat) -> Result<()> {
    let redactor = PhiRedactor::new().with_audit(config.audit);
    let policy = resolve_policy(config, &input.policy)?;
    let identity = patient_identity(&input)?;
    let text = read_input(input.file.as_deref())?;

    let result = redactor.redact_with_policy(&text, identity.as_ref(), &policy);

    match format {
        OutputFormat::Text => print!("{}", result.redacted_text),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

/// Scan command.
fn cmd_scan(config: PhiscrubConfig, input: InputArgs) -> Result<()> {
    let redactor = PhiRedactor::new();
    let policy = resolve_policy(config, &input.policy)?;
    let identity = patient_identity(&input)?;
    let text = read_input(input.file.as_deref())?;

    let counts = redactor.detected_types(&text, identity.as_ref(), &policy);
    if counts.is_empty() {
        println!("No PHI detected.");
        return Ok(());
    }

    let total: usize = counts.values().sum();
    println!("Detected {total} PHI entities:");
    for (entity_type, count) in counts {
        println!("  {entity_type:<20} {count}");
    }
    Ok(())
}

/// Config command.
fn cmd_config(config: PhiscrubConfig, show: bool, policy: PolicyArgs) -> Result<()> {
    if !show {
        println!("Use --show to display the effective policy.");
        for path in PhiscrubConfig::default_paths() {
            println!("  config search path: {}", path.display());
        }
        return Ok(());
    }

    let audit = config.audit;
    let resolved = resolve_policy(config, &policy)?;
    let overrides = resolved.to_overrides();

    println!("Effective policy:");
    println!("  redact_names:       {}", resolved.redact_names);
    println!("  redact_dates:       {}", resolved.redact_dates);
    println!("  redact_phone:       {}", resolved.redact_phone);
    println!("  redact_email:       {}", resolved.redact_email);
    println!("  redact_ssn:         {}", resolved.redact_ssn);
    println!("  redact_address:     {}", resolved.redact_address);
    println!("  redact_credit_card: {}", resolved.redact_credit_card);
    println!("  audit:              {audit}");
    for pattern in overrides.custom_patterns.unwrap_or_default() {
        println!("  custom: {} -> {}", pattern.pattern, pattern.tag);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("phiscrub").chain(args.iter().copied())).unwrap()
    }

    fn redact_input(cli: Cli) -> InputArgs {
        let Commands::Redact { input, .. } = cli.command else {
            panic!("expected redact command");
        };
        input
    }

    #[test]
    fn test_flags_become_overrides() {
        let input = redact_input(parse(&[
            "redact",
            "--dates",
            "--no-phone",
            "--no-credit-card",
            "--custom",
            r"MRN-\d{6}=[REDACTED-MRN]",
            "--custom",
            "a=b=[EQ]",
            "notes.txt",
        ]));
        let overrides = input.policy.to_overrides().unwrap();

        assert_eq!(overrides.redact_dates, Some(true));
        assert_eq!(overrides.redact_phone, Some(false));
        assert_eq!(overrides.redact_credit_card, Some(false));
        assert_eq!(overrides.redact_ssn, None);
        assert_eq!(overrides.redact_address, None);
        assert_eq!(
            overrides.custom_patterns,
            Some(vec![
                CustomPattern::new(r"MRN-\d{6}", "[REDACTED-MRN]"),
                CustomPattern::new("a=b", "[EQ]"),
            ])
        );
        assert_eq!(input.file, Some(PathBuf::from("notes.txt")));
    }

    #[test]
    fn test_unset_flags_leave_overrides_empty() {
        let input = redact_input(parse(&["redact"]));
        assert_eq!(input.policy.to_overrides().unwrap(), PolicyOverrides::default());
        assert!(input.file.is_none());
    }

    #[test]
    fn test_custom_without_tag_rejected() {
        let input = redact_input(parse(&["redact", "--custom", "MRN-123"]));
        let err = input.policy.to_overrides().unwrap_err();
        assert!(err.to_string().contains("MRN-123"));
    }

    #[test]
    fn test_flags_layer_over_config_file() {
        let config =
            PhiscrubConfig::parse("[policy]\nredact_dates = false\nredact_ssn = false\n").unwrap();
        let input = redact_input(parse(&["redact", "--dates"]));

        let policy = resolve_policy(config, &input.policy).unwrap();
        assert!(policy.redact_dates);
        assert!(!policy.redact_ssn);
        assert!(policy.redact_phone);
    }

    #[test]
    fn test_malformed_custom_pattern_fails_command() {
        let cli = parse(&["redact", "--custom", "MRN-(\\d{6}=[REDACTED-MRN]", "notes.txt"]);

        let err = run_command(PhiscrubConfig::default(), cli.command).unwrap_err();
        assert!(format!("{err:#}").contains("invalid custom pattern 'MRN-(\\d{6}'"));
    }

    #[test]
    fn test_first_name_requires_last_name() {
        let result = Cli::try_parse_from(["phiscrub", "redact", "--first-name", "John"]);
        assert!(result.is_err());

        let input = redact_input(parse(&[
            "redact",
            "--first-name",
            " John ",
            "--last-name",
            "Smith",
        ]));
        let identity = patient_identity(&input).unwrap().unwrap();
        assert_eq!(identity.full_name(), "John Smith");
    }

    #[test]
    fn test_blank_name_rejected() {
        let input = redact_input(parse(&["redact", "--first-name", " ", "--last-name", "Smith"]));
        assert!(patient_identity(&input).is_err());
    }
}
