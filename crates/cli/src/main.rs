use clap::{Parser, Subcommand};
use std::path::PathBuf;
use triage_core::{
    config::ruleset_from_env_values, Actor, CaseFilter, CaseId, CaseView, CoreConfig, RiskTier,
    Role, Ruleset, SubjectRef, TriageService,
};

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Symptom triage scoring and case review CLI")]
struct Cli {
    /// Directory holding the case journal. Without it, cases last only for this command.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Built-in ruleset version (v1, v2, v3)
    #[arg(long, global = true)]
    ruleset: Option<String>,
    /// YAML ruleset file; takes precedence over --ruleset
    #[arg(long, global = true)]
    ruleset_file: Option<String>,
    /// Reviewer id recorded against submissions and overrides
    #[arg(long = "as", global = true, default_value = "cli-operator")]
    operator: String,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score text without storing a case
    Score {
        text: String,
        #[arg(long)]
        location: Option<String>,
    },
    /// Print the active ruleset
    Ruleset {
        /// Print as YAML, suitable for --ruleset-file
        #[arg(long)]
        yaml: bool,
    },
    /// List built-in ruleset versions
    Rulesets,
    /// Score and store a case on behalf of a subject
    Submit {
        /// Subject reference
        subject_ref: String,
        /// Symptom description
        text: String,
        #[arg(long)]
        location: Option<String>,
    },
    /// List cases
    Cases {
        /// LOW, MODERATE or HIGH
        #[arg(long)]
        risk_tier: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        /// Only overridden (true) or non-overridden (false) cases
        #[arg(long)]
        overridden: Option<bool>,
    },
    /// Show one case with its explanation
    Show { case_id: String },
    /// Record a doctor override
    Override { case_id: String, risk_tier: String },
    /// List recorded overrides
    Overrides,
    /// Risk, location and override distributions
    Analytics,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'triage --help' for commands");
        return Ok(());
    };

    let ruleset = ruleset_from_env_values(cli.ruleset, cli.ruleset_file)?;
    let service = CoreConfig::new(cli.data_dir, ruleset)?.build_service()?;
    let operator = Actor::new(SubjectRef::new(&cli.operator)?, Role::Reviewer);
    run(command, &service, &operator)
}

/// Run a store-backed command as a reviewer.
fn run(
    command: Commands,
    service: &TriageService,
    operator: &Actor,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Score { text, location } => {
            let result = service.preview_score(operator, &text, location.as_deref())?;
            let e = &result.explanation;
            println!("Tier: {} (score {})", result.risk_tier, result.score);
            println!("Emergency: {}", result.emergency_flag);
            println!("Duration: {}", result.duration);
            println!("Symptoms: {}", e.detected_symptoms.join(", "));
            println!("Severity words: {}", e.detected_severity_words.join(", "));
            println!("Emergency phrases: {}", e.emergency_phrases.join(", "));
            println!(
                "Points: symptoms {}, severity {}, emergency {}",
                e.symptom_points, e.severity_points, e.emergency_points
            );
            println!("Ruleset: {}", e.ruleset_version);
        }
        Commands::Ruleset { yaml } => {
            let ruleset = service.ruleset(operator)?;
            if yaml {
                print!("{}", ruleset.to_yaml()?);
            } else {
                println!("Version: {} ({})", ruleset.version(), ruleset.provenance());
                println!(
                    "Thresholds: moderate {}, high {}",
                    ruleset.thresholds().moderate,
                    ruleset.thresholds().high
                );
                println!("Emergency bonus: {}", ruleset.emergency_bonus());
                for entry in ruleset.symptoms() {
                    println!("  symptom  {:>3}  {}", entry.weight, entry.phrase);
                }
                for entry in ruleset.severity_modifiers() {
                    println!("  severity {:>3}  {}", entry.weight, entry.phrase);
                }
                for phrase in ruleset.emergency_phrases() {
                    println!("  emergency      {}", phrase);
                }
            }
        }
        Commands::Rulesets => {
            for version in Ruleset::builtin_versions() {
                println!("{}", version);
            }
        }
        Commands::Submit {
            subject_ref,
            text,
            location,
        } => {
            let subject = SubjectRef::new(&subject_ref)?;
            let view =
                service.submit_case(operator, Some(subject), &text, location.as_deref())?;
            println!("Created case {} ({})", view.case_id, view.risk_tier);
            println!("Recommendation: {}", view.recommendation);
        }
        Commands::Cases {
            risk_tier,
            location,
            subject,
            overridden,
        } => {
            let filter = CaseFilter {
                risk_tier: risk_tier.as_deref().map(str::parse::<RiskTier>).transpose()?,
                location,
                subject: subject.map(SubjectRef::new).transpose()?,
                overridden,
            };
            let views = service.review_cases(operator, &filter)?;
            if views.is_empty() {
                println!("No cases found.");
            }
            for view in &views {
                print_case_line(view);
            }
        }
        Commands::Show { case_id } => {
            let view = service.get_case(operator, &CaseId::parse(&case_id)?)?;
            print_case_line(&view);
            if let Some(detail) = &view.detail {
                println!("Subject: {}", detail.subject_ref);
                println!("Text: {}", detail.raw_text);
                println!("Score: {}", detail.score_result.score);
                println!("Duration: {}", detail.score_result.duration);
                println!("Reasoning: {}", detail.score_result.explanation.reasoning);
                if let Some(tier) = detail.doctor_override {
                    println!("Doctor override: {}", tier);
                }
            }
        }
        Commands::Override { case_id, risk_tier } => {
            let id = CaseId::parse(&case_id)?;
            let ack = service.override_case(operator, &id, risk_tier.parse::<RiskTier>()?)?;
            match ack.previous_override {
                Some(previous) => println!(
                    "Override for {} changed from {} to {}",
                    ack.case_id, previous, ack.risk_tier
                ),
                None => println!("Override for {} set to {}", ack.case_id, ack.risk_tier),
            }
        }
        Commands::Overrides => {
            let records = service.override_history(operator)?;
            if records.is_empty() {
                println!("No overrides recorded.");
            }
            for record in records {
                println!(
                    "{}  {}  {} -> {}  by {}",
                    record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                    record.case_id,
                    record
                        .previous
                        .map_or_else(|| "-".to_string(), |t| t.to_string()),
                    record.tier,
                    record.reviewer
                );
            }
        }
        Commands::Analytics => {
            let summary = service.analytics(operator)?;
            println!("Total cases: {}", summary.total_cases);
            println!("By risk tier:");
            for (tier, count) in &summary.risk_distribution {
                println!("  {:<9} {}", tier.as_str(), count);
            }
            println!("By location:");
            for (location, count) in &summary.location_distribution {
                println!("  {:<9} {}", location, count);
            }
            if !summary.override_distribution.is_empty() {
                println!("Doctor overrides:");
                for (tier, count) in &summary.override_distribution {
                    println!("  {:<9} {}", tier.as_str(), count);
                }
            }
        }
    }

    Ok(())
}

fn print_case_line(view: &CaseView) {
    println!(
        "{}  {:<8}  {}  {}",
        view.case_id,
        view.risk_tier.as_str(),
        view.location,
        view.created_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    );
}
