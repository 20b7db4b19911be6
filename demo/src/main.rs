//! clinica Reference Clinic demo CLI
//!
//! Runs the reference clinic scenarios, and exposes the core operations over
//! JSON files for poking at real payloads.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- analysis-results
//!   cargo run -p demo -- classify --ranges ranges.json --value 112 --sex female --age 40
//!   cargo run -p demo -- normalize stored.json --visit visit-17 --patient pat-002
//!   cargo run -p demo -- render stored.json --service-order so-1 --status completed
//!   cargo run -p demo -- validate-patient patient.json
//!   cargo run -p demo -- schedule schedule.json
//!   cargo run -p demo -- --config clinica.toml run-all

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use clinica_config::ClinicConfig;
use clinica_contracts::{
    envelope::ResultContext,
    error::{ClinicaError, ClinicaResult},
    filled::FieldValue,
    schedule::WorkScheduleDto,
    status::{OwnerStatus, ServiceOrderStatus, VisitStatus},
    template::{PatientProfile, ReferenceRanges, Sex},
};
use clinica_core::{
    migrate::{detect_shape, normalize},
    range::{classify, range_text},
    schedule::ScheduleEditor,
    traits::Validator,
    Renderer,
};
use clinica_ref_clinic::scenarios::{analysis_results, legacy_migration, protocol_copy, staff_intake};
use clinica_validate::forms::{clinic_form_validator, employee_form_schema, patient_form_schema};

// ── CLI definition ────────────────────────────────────────────────────────────

/// clinica: template-driven clinical result capture.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "clinica reference clinic demo",
    long_about = "Runs clinica reference clinic scenarios showing result capture,\n\
                  range classification, legacy migration and form validation."
)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum SexArg {
    Male,
    Female,
}

impl From<SexArg> for Sex {
    fn from(arg: SexArg) -> Self {
        match arg {
            SexArg::Male => Sex::Male,
            SexArg::Female => Sex::Female,
        }
    }
}

#[derive(clap::Args)]
struct PatientArgs {
    #[arg(long, value_enum)]
    sex: Option<SexArg>,
    /// Age in full years.
    #[arg(long)]
    age: Option<u32>,
}

impl PatientArgs {
    fn profile(&self) -> PatientProfile {
        PatientProfile {
            sex: self.sex.map(Sex::from),
            age: self.age,
        }
    }
}

/// Owner status as given on the command line. Which values apply depends on
/// whether the owner is a visit or a service order.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusArg {
    Scheduled,
    Ordered,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

#[derive(clap::Args)]
struct OwnerArgs {
    #[arg(long, default_value = "pat-cli")]
    patient: String,
    /// Read the result as belonging to this visit.
    #[arg(long, conflicts_with = "service_order")]
    visit: Option<String>,
    /// Read the result as belonging to this service order (the default owner).
    #[arg(long)]
    service_order: Option<String>,
}

impl OwnerArgs {
    fn context(&self) -> ResultContext {
        match &self.visit {
            Some(visit) => ResultContext::for_visit(self.patient.clone(), visit.clone()),
            None => ResultContext::for_service_order(
                self.patient.clone(),
                self.service_order.clone().unwrap_or_else(|| "so-cli".to_string()),
            ),
        }
    }

    fn status(&self, arg: StatusArg) -> ClinicaResult<OwnerStatus> {
        let status = match (self.visit.is_some(), arg) {
            (true, StatusArg::Scheduled) => OwnerStatus::Visit(VisitStatus::Scheduled),
            (true, StatusArg::InProgress) => OwnerStatus::Visit(VisitStatus::InProgress),
            (true, StatusArg::Completed) => OwnerStatus::Visit(VisitStatus::Completed),
            (true, StatusArg::Cancelled) => OwnerStatus::Visit(VisitStatus::Cancelled),
            (true, StatusArg::NoShow) => OwnerStatus::Visit(VisitStatus::NoShow),
            (false, StatusArg::Ordered) => OwnerStatus::ServiceOrder(ServiceOrderStatus::Ordered),
            (false, StatusArg::InProgress) => OwnerStatus::ServiceOrder(ServiceOrderStatus::InProgress),
            (false, StatusArg::Completed) => OwnerStatus::ServiceOrder(ServiceOrderStatus::Completed),
            (false, StatusArg::Cancelled) => OwnerStatus::ServiceOrder(ServiceOrderStatus::Cancelled),
            (is_visit, other) => {
                return Err(ClinicaError::ValidationFailed {
                    reason: format!(
                        "status {:?} does not apply to a {}",
                        other,
                        if is_visit { "visit" } else { "service order" }
                    ),
                })
            }
        };
        Ok(status)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run all four reference scenarios in sequence.
    RunAll,
    /// Scenario 1: analysis results on a service order.
    AnalysisResults,
    /// Scenario 2: copy the previous visit's protocol.
    ProtocolCopy,
    /// Scenario 3: legacy result migration.
    LegacyMigration,
    /// Scenario 4: patient and employee intake forms.
    StaffIntake,
    /// Classify a value against a reference ranges JSON file.
    Classify {
        #[arg(long)]
        ranges: PathBuf,
        #[arg(long)]
        value: String,
        #[command(flatten)]
        patient: PatientArgs,
    },
    /// Normalize a stored result payload into a current envelope.
    Normalize {
        file: PathBuf,
        #[command(flatten)]
        owner: OwnerArgs,
    },
    /// Render a stored result payload as JSON.
    Render {
        file: PathBuf,
        #[command(flatten)]
        owner: OwnerArgs,
        #[command(flatten)]
        patient: PatientArgs,
        /// Status of the owning visit or service order. Terminal statuses
        /// render read-only.
        #[arg(long, value_enum, default_value_t = StatusArg::InProgress)]
        status: StatusArg,
    },
    /// Validate a patient form payload.
    ValidatePatient { file: PathBuf },
    /// Validate an employee form payload.
    ValidateEmployee { file: PathBuf },
    /// Validate a weekly work schedule and print its canonical form.
    Schedule { file: PathBuf },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(2);
        }
    };

    // RUST_LOG wins over the configured filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_target(false)
        .compact()
        .init();

    let result = match cli.command {
        Command::RunAll => {
            print_banner();
            run_all(&config)
        }
        Command::AnalysisResults => analysis_results::run_scenario(&config),
        Command::ProtocolCopy => protocol_copy::run_scenario(&config),
        Command::LegacyMigration => legacy_migration::run_scenario(&config),
        Command::StaffIntake => staff_intake::run_scenario(),
        Command::Classify {
            ranges,
            value,
            patient,
        } => run_classify(&config, &ranges, &value, &patient.profile()),
        Command::Normalize { file, owner } => run_normalize(&file, &owner.context()),
        Command::Render {
            file,
            owner,
            patient,
            status,
        } => owner
            .status(status)
            .and_then(|status| run_render(&config, &file, &owner.context(), status, &patient.profile())),
        Command::ValidatePatient { file } => run_validate(&file, FormKind::Patient),
        Command::ValidateEmployee { file } => run_validate(&file, FormKind::Employee),
        Command::Schedule { file } => run_schedule(&file),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> ClinicaResult<ClinicConfig> {
    match path {
        Some(path) => ClinicConfig::from_file(path),
        None => Ok(ClinicConfig::default()),
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all(config: &ClinicConfig) -> ClinicaResult<()> {
    analysis_results::run_scenario(config)?;
    protocol_copy::run_scenario(config)?;
    legacy_migration::run_scenario(config)?;
    staff_intake::run_scenario()?;
    println!("All scenarios completed successfully.");
    Ok(())
}

// ── File-driven commands ──────────────────────────────────────────────────────

fn read_json(path: &Path) -> ClinicaResult<Value> {
    let raw = std::fs::read_to_string(path).map_err(|e| ClinicaError::UnrecognizedPayload {
        reason: format!("failed to read '{}': {}", path.display(), e),
    })?;
    serde_json::from_str(&raw).map_err(|e| ClinicaError::UnrecognizedPayload {
        reason: format!("'{}' is not valid JSON: {}", path.display(), e),
    })
}

fn print_json(value: &impl serde::Serialize) -> ClinicaResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| ClinicaError::ContentParse {
        reason: format!("failed to encode output: {e}"),
    })?;
    println!("{text}");
    Ok(())
}

fn run_classify(
    config: &ClinicConfig,
    ranges_file: &Path,
    value: &str,
    patient: &PatientProfile,
) -> ClinicaResult<()> {
    let ranges: ReferenceRanges =
        serde_json::from_value(read_json(ranges_file)?).map_err(|e| ClinicaError::ContentParse {
            reason: format!("not a reference ranges object: {e}"),
        })?;
    let range = config.range_resolver().resolve_for(&ranges, patient);
    let status = classify(&FieldValue::Text(value.to_string()), range);
    debug!(?range, ?status, "classified value");
    println!("{:?}\t{}", status, range_text(range));
    Ok(())
}

fn run_normalize(file: &Path, ctx: &ResultContext) -> ClinicaResult<()> {
    let payload = read_json(file)?;
    debug!(shape = ?detect_shape(&payload), "normalizing payload");
    print_json(&normalize(&payload, ctx)?)
}

fn run_render(
    config: &ClinicConfig,
    file: &Path,
    ctx: &ResultContext,
    status: OwnerStatus,
    patient: &PatientProfile,
) -> ClinicaResult<()> {
    let envelope = normalize(&read_json(file)?, ctx)?;
    debug!(%status, "rendering stored result");
    let rendered = Renderer::for_envelope(&envelope)
        .with_resolver(config.range_resolver())
        .render_for_status(&envelope.filled_data, status, patient);
    print_json(&rendered)
}

enum FormKind {
    Patient,
    Employee,
}

fn run_validate(file: &Path, kind: FormKind) -> ClinicaResult<()> {
    let payload = read_json(file)?;
    let schema = match kind {
        FormKind::Patient => patient_form_schema(),
        FormKind::Employee => employee_form_schema(),
    };
    let report = clinic_form_validator().validate(&payload, &schema)?;
    print_json(&report)?;
    if !report.passed {
        return Err(ClinicaError::ValidationFailed {
            reason: format!("{} field(s) failed", report.failed_fields().len()),
        });
    }
    Ok(())
}

fn run_schedule(file: &Path) -> ClinicaResult<()> {
    let dto: WorkScheduleDto =
        serde_json::from_value(read_json(file)?).map_err(|e| ClinicaError::InvalidSchedule {
            reason: format!("not a weekly schedule: {e}"),
        })?;
    let canonical = ScheduleEditor::from_dto(&dto).build_validated()?;
    print_json(&canonical)
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("clinica: Template-driven Clinical Result Capture");
    println!("Reference Clinic Demo");
    println!("================================================");
    println!();
    println!("Every result travels as a self-describing envelope:");
    println!("  [1] templateContent snapshot: the form as it looked when filled");
    println!("  [2] filledData: values keyed by parameter/field id");
    println!("  [3] metadata: patient, owner and filledAt");
    println!("Legacy payloads are normalized on read; completed owners render read-only.");
    println!();
}

// ── Tests ─────────────────────────────────────────────────────────────────────
