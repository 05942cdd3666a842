//! Library module for the envvar-validator binary.
//!
//! Argument parsing and command handlers live here so they can be exercised
//! without spawning a process. `main.rs` only parses, installs logging and
//! dispatches to [`execute`].
//!
//! # Security Guarantees
//! - Commands never print values of sensitive fields
//! - Reports go through the core crate's redacting exporters
//! - `setup` never overwrites existing files unless `--force` is given

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use envvar_validator_core::{
    EnvSource, EnvironmentType, EnvironmentValidator, Exporter, FrameworkPreset,
    FrameworkValidator, JsonExporter, Schema, SecurityScanner, ValidationReport,
    ValidationResult, ValidatorOptions, ValidatorRegistry, YamlExporter, logging,
    render_env_template,
};
use tracing::{debug, info};

/// File name of the schema written by `setup`.
pub const SCHEMA_FILE_NAME: &str = "env-schema.json";

/// File name of the template written by `setup`.
pub const TEMPLATE_FILE_NAME: &str = ".env.example";

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "envvar-validator")]
#[command(about = "Validate, scan and report on application environment variables")]
#[command(version)]
#[command(long_about = "
envvar-validator - schema-driven environment variable validation

Checks the process environment against a declarative schema:
- Type coercion for str, bool, int and list fields
- Built-in validators (URLs, ports, API keys, AWS and Stripe credentials, cron)
- Strict mode for undeclared variables
- Advisory security score

SECURITY FEATURES:
- Sensitive values are never printed or exported
- Passwords embedded in connection strings are masked

EXAMPLES:
  envvar-validator validate --schema env-schema.json
  envvar-validator validate --schema env.yaml --framework django --strict
  envvar-validator report --schema env-schema.json --output report.json
  envvar-validator setup --framework fastapi --dir ./config
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags accepted by every command.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate the process environment against a schema
    Validate(ValidateArgs),

    /// Write a redacted validation report
    Report(ReportArgs),

    /// Scan the whole environment for weak credentials
    Scan(ScanArgs),

    /// List the built-in validators
    ListValidators,

    /// Print a framework's recommended schema
    Template(TemplateArgs),

    /// Write a starter schema and .env.example for a framework
    Setup(SetupArgs),
}

/// Schema and validator options shared by `validate` and `report`.
#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Schema file (.yaml/.yml is read as YAML, anything else as JSON)
    #[arg(short, long, value_name = "FILE")]
    pub schema: PathBuf,

    /// Merge a framework's conventions into the schema
    #[arg(long, value_name = "FRAMEWORK")]
    pub framework: Option<FrameworkPreset>,

    /// Environment type (detected from ENVIRONMENT or APP_ENV if omitted)
    #[arg(short, long, value_name = "ENV")]
    pub environment: Option<EnvironmentType>,

    /// Report variables that are not declared in the schema
    #[arg(long)]
    pub strict: bool,

    /// Skip the advisory security score
    #[arg(long)]
    pub no_security_scan: bool,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Output file path (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Json)]
    pub format: ReportFormat,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Also compute the security score for this schema
    #[arg(short, long, value_name = "FILE")]
    pub schema: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Framework whose conventions to print
    #[arg(long, value_name = "FRAMEWORK")]
    pub framework: FrameworkPreset,

    /// Template format
    #[arg(short, long, value_enum, default_value_t = TemplateFormat::Json)]
    pub format: TemplateFormat,
}

#[derive(Debug, Args)]
pub struct SetupArgs {
    /// Framework whose conventions to write
    #[arg(long, value_name = "FRAMEWORK")]
    pub framework: FrameworkPreset,

    /// Target directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

/// Output formats for `validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// Output formats for `report`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Json,
    Yaml,
}

impl ReportFormat {
    fn exporter(self) -> Box<dyn Exporter> {
        match self {
            Self::Json => Box::new(JsonExporter),
            Self::Yaml => Box::new(YamlExporter),
        }
    }
}

/// Output formats for `template`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TemplateFormat {
    Json,
    Yaml,
    Env,
}

/// What a command printed and whether it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Text for stdout
    pub text: String,
    /// False when the process should exit non-zero
    pub success: bool,
}

impl CommandOutput {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
        }
    }
}

/// Reads a schema file, choosing the parser from its extension.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid schema.
pub async fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read schema file {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let schema = if is_yaml {
        Schema::from_yaml_str(&text)
    } else {
        Schema::from_json_str(&text)
    }
    .with_context(|| format!("Invalid schema in {}", path.display()))?;

    debug!("Loaded {} field(s) from {}", schema.len(), path.display());
    Ok(schema)
}

/// Builds a validator from `args`, reading variables from `source`.
///
/// # Errors
///
/// Returns an error if the schema cannot be loaded or is inconsistent.
pub async fn build_validator(
    args: &SchemaArgs,
    source: Arc<dyn EnvSource>,
) -> anyhow::Result<EnvironmentValidator> {
    let schema = load_schema(&args.schema).await?;

    let mut options = ValidatorOptions::new()
        .with_strict_mode(args.strict)
        .with_security_scanning(!args.no_security_scan);
    if let Some(environment) = args.environment {
        options = options.with_environment_type(environment);
    }

    let validator = match args.framework {
        Some(preset) => FrameworkValidator::new(preset, schema, options)?.into_inner(),
        None => EnvironmentValidator::with_options(schema, options)?,
    };
    Ok(validator.with_shared_source(source))
}

/// Executes the parsed command against `source`.
///
/// # Errors
///
/// Returns an error for unreadable or invalid input files and failed writes.
/// An invalid environment is not an error: it yields an unsuccessful
/// [`CommandOutput`]. With `--quiet`, successful commands produce no text.
pub async fn execute(cli: &Cli, source: Arc<dyn EnvSource>) -> anyhow::Result<CommandOutput> {
    let output = match &cli.command {
        Commands::Validate(args) => validate_command(args, source).await,
        Commands::Report(args) => report_command(args, source).await,
        Commands::Scan(args) => scan_command(args, source).await,
        Commands::ListValidators => Ok(CommandOutput::ok(list_validators())),
        Commands::Template(args) => template_command(args).map(CommandOutput::ok),
        Commands::Setup(args) => setup_command(args).await.map(CommandOutput::ok),
    }?;

    if cli.global.quiet && output.success {
        return Ok(CommandOutput::ok(String::new()));
    }
    Ok(output)
}

async fn validate_command(
    args: &ValidateArgs,
    source: Arc<dyn EnvSource>,
) -> anyhow::Result<CommandOutput> {
    let validator = build_validator(&args.schema, source).await?;
    let result = validator.validate();
    logging::audit_validation("cli_validate", &result);

    let text = match args.format {
        OutputFormat::Text => render_result(&result),
        OutputFormat::Json => render_report(&JsonExporter, &result, validator.schema())?,
        OutputFormat::Yaml => render_report(&YamlExporter, &result, validator.schema())?,
    };

    Ok(CommandOutput {
        text,
        success: result.is_valid,
    })
}

async fn report_command(
    args: &ReportArgs,
    source: Arc<dyn EnvSource>,
) -> anyhow::Result<CommandOutput> {
    let validator = build_validator(&args.schema, source).await?;
    let result = validator.validate();
    logging::audit_validation("cli_report", &result);

    let exporter = args.format.exporter();
    let rendered = render_report(exporter.as_ref(), &result, validator.schema())?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &rendered)
                .await
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            info!(
                "Wrote {} report to {}",
                exporter.format_name(),
                path.display()
            );
            Ok(CommandOutput {
                text: format!("Report written to {}\n", path.display()),
                success: result.is_valid,
            })
        }
        None => Ok(CommandOutput {
            text: rendered,
            success: result.is_valid,
        }),
    }
}

async fn scan_command(
    args: &ScanArgs,
    source: Arc<dyn EnvSource>,
) -> anyhow::Result<CommandOutput> {
    let issues = SecurityScanner::default().scan_environment(source.as_ref());
    info!("Security scan found {} issue(s)", issues.len());

    let mut text = String::new();
    if issues.is_empty() {
        text.push_str("No credential issues found\n");
    } else {
        let _ = writeln!(text, "Security issues ({}):", issues.len());
        for issue in &issues {
            let _ = writeln!(text, "  - {}: {}", issue.variable_name, issue.message);
        }
    }

    if let Some(path) = &args.schema {
        let schema = load_schema(path).await?;
        let validator = EnvironmentValidator::new(schema)?.with_shared_source(source);
        let result = validator.validate();
        if let Some(scan) = &result.metadata.security_scan {
            let _ = writeln!(text, "Security score: {}/100", scan.score);
            for issue in &scan.issues {
                let _ = writeln!(
                    text,
                    "  - {}: {} (-{})",
                    issue.variable_name, issue.message, issue.deduction
                );
            }
        }
    }

    Ok(CommandOutput::ok(text))
}

fn list_validators() -> String {
    let mut text = String::new();
    for descriptor in ValidatorRegistry::new().descriptors() {
        let _ = writeln!(text, "{:<24} {}", descriptor.name, descriptor.description);
    }
    text
}

fn template_command(args: &TemplateArgs) -> anyhow::Result<String> {
    let schema = args.framework.conventions();
    let text = match args.format {
        TemplateFormat::Json => {
            let mut json = schema.to_json_string()?;
            json.push('\n');
            json
        }
        TemplateFormat::Yaml => schema.to_yaml_string()?,
        TemplateFormat::Env => render_env_template(&schema),
    };
    Ok(text)
}

async fn setup_command(args: &SetupArgs) -> anyhow::Result<String> {
    let schema_path = args.dir.join(SCHEMA_FILE_NAME);
    let template_path = args.dir.join(TEMPLATE_FILE_NAME);

    if !args.force {
        for path in [&schema_path, &template_path] {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
        }
    }

    tokio::fs::create_dir_all(&args.dir)
        .await
        .with_context(|| format!("Failed to create directory {}", args.dir.display()))?;

    let schema = args.framework.conventions();
    let mut schema_json = schema.to_json_string()?;
    schema_json.push('\n');

    tokio::fs::write(&schema_path, schema_json)
        .await
        .with_context(|| format!("Failed to write to {}", schema_path.display()))?;
    tokio::fs::write(&template_path, render_env_template(&schema))
        .await
        .with_context(|| format!("Failed to write to {}", template_path.display()))?;

    info!("Set up {} conventions in {}", args.framework, args.dir.display());
    Ok(format!(
        "Created {} and {} for {}\n",
        schema_path.display(),
        template_path.display(),
        args.framework
    ))
}

fn render_report(
    exporter: &dyn Exporter,
    result: &ValidationResult,
    schema: &Schema,
) -> anyhow::Result<String> {
    let report = ValidationReport::from_result(result, schema);
    let mut text = exporter.export_report(&report)?;
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

/// Human-readable summary of a validation pass. Never includes values.
pub fn render_result(result: &ValidationResult) -> String {
    let mut text = String::new();
    let status = if result.is_valid { "PASSED" } else { "FAILED" };
    let metadata = &result.metadata;

    let _ = writeln!(text, "Environment validation {status}");
    let _ = writeln!(
        text,
        "Environment: {} | Validated: {}/{} | Time: {:.2} ms",
        metadata.environment_type,
        result.validated_values.len(),
        metadata.schema_variables,
        result.performance_metrics.validation_time * 1000.0
    );
    if let Some(framework) = &metadata.framework {
        let _ = writeln!(text, "Framework: {framework}");
    }
    if let Some(score) = result.security_score {
        let _ = writeln!(text, "Security score: {score}/100");
    }

    if !result.errors.is_empty() {
        let _ = writeln!(text, "Errors ({}):", result.errors.len());
        for issue in &result.errors {
            let _ = writeln!(text, "  - {issue}");
            if let Some(suggestion) = &issue.suggestion {
                let _ = writeln!(text, "    hint: {suggestion}");
            }
        }
    }
    if !result.warnings.is_empty() {
        let _ = writeln!(text, "Warnings ({}):", result.warnings.len());
        for issue in &result.warnings {
            let _ = writeln!(text, "  - {issue}");
        }
    }

    text
}
