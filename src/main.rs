use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use wellbeing_import::app::{auth_use_case, directory_use_case};
use wellbeing_import::app::{BatchSubmitter, BehaviorEntry, CheckinFilter, ImportSession, SessionSnapshot, StudentFilter};
use wellbeing_import::auth::{AuthContext, Role};
use wellbeing_import::config::Config;
use wellbeing_import::constants;
use wellbeing_import::infra::ReqwestHttp;
use wellbeing_import::logging;
use wellbeing_import::pipeline::export::write_credentials;
use wellbeing_import::pipeline::{ImportBatch, ImportPipeline, RecordSchema};
use wellbeing_import::types::{PasswordChange, TeacherRegistration};

#[derive(Parser)]
#[command(name = "wellbeing-import")]
#[command(about = "Bulk CSV imports for the school well-being tracking API")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = constants::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the saved session
    Logout,
    /// Show the signed-in identity
    Whoami,
    /// Change a password; no sign-in needed
    ChangePassword {
        #[arg(long)]
        username: String,
        #[arg(long)]
        old_password: String,
        #[arg(long)]
        new_password: String,
    },
    /// Provision another teacher account
    RegisterTeacher {
        #[arg(long)]
        username: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List students, optionally filtered
    Students {
        #[arg(long)]
        class: Option<String>,
        /// e.g. Xanh, Vàng, Đỏ
        #[arg(long)]
        risk: Option<String>,
        /// Part of a name or student id
        #[arg(long)]
        search: Option<String>,
    },
    /// List student check-ins, optionally filtered
    Checkins {
        #[arg(long)]
        class: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        sentiment: Option<String>,
    },
    /// Parse and validate a CSV file without submitting it
    Preview {
        #[arg(value_enum)]
        pipeline: PipelineArg,
        file: PathBuf,
    },
    /// Import daily behavior check-ins from CSV
    UploadBehavior { file: PathBuf },
    /// Create student accounts from a roster CSV and export their credentials
    CreateStudents {
        file: PathBuf,
        #[arg(long, default_value = constants::DEFAULT_CREDENTIALS_FILE)]
        credentials_out: PathBuf,
    },
    /// Record one behavior check-in
    RecordBehavior {
        #[arg(long)]
        student_id: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        absent: bool,
        #[arg(long, default_value_t = 10)]
        score: i64,
        #[arg(long, default_value = "")]
        note: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PipelineArg {
    Behavior,
    Roster,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config).context("Failed to load configuration")?;
    logging::init_logging(&config.logging.dir);

    let mut auth = AuthContext::load(&config.session.path).context("Failed to read saved session")?;

    match cli.command {
        Commands::Login { username, password } => {
            let http = ReqwestHttp::new(config.api.clone(), AuthContext::default());
            auth = auth_use_case::login(&http, &config.api.login_path, &username, &password).await?;
            auth.save(&config.session.path)?;
            println!("✅ Signed in as {} ({})", username, role_label(&auth));
        }
        Commands::Logout => {
            auth.clear(&config.session.path)?;
            println!("Signed out");
        }
        Commands::Whoami => {
            if auth.is_authenticated() {
                println!("role: {}", role_label(&auth));
                if let Some(id) = auth.student_id() {
                    println!("student_id: {}", id);
                }
            } else {
                println!("Not signed in");
            }
        }
        Commands::ChangePassword { username, old_password, new_password } => {
            let http = ReqwestHttp::new(config.api.clone(), AuthContext::default());
            let change = PasswordChange { username, old_password, new_password };
            let message = auth_use_case::change_password(&http, &config.api.change_password_path, &change).await?;
            println!("✅ {}", message);
        }
        Commands::RegisterTeacher { username, full_name, email, password } => {
            auth.require_role(Role::Teacher)?;
            let http = ReqwestHttp::new(config.api.clone(), auth.clone());
            let registration = TeacherRegistration { username, password, full_name, email };
            let message =
                auth_use_case::register_teacher(&http, &config.api.register_teacher_path, &registration).await?;
            println!("✅ {}", message);
        }
        Commands::Students { class, risk, search } => {
            auth.require_role(Role::Teacher)?;
            let http = ReqwestHttp::new(config.api.clone(), auth.clone());
            let filter = StudentFilter { class_id: class, risk_level: risk, search };
            let students = directory_use_case::list_students(&http, &config.api.students_path, &filter).await?;
            println!("👩‍🎓 {} students", students.len());
            for s in &students {
                println!(
                    "   {:<10} {:<28} {:<8} {}",
                    s.student_id,
                    s.full_name,
                    s.class_id,
                    s.risk_level.as_deref().unwrap_or("-")
                );
            }
        }
        Commands::Checkins { class, search, sentiment } => {
            auth.require_role(Role::Teacher)?;
            let http = ReqwestHttp::new(config.api.clone(), auth.clone());
            let filter = CheckinFilter { class_id: class, search, sentiment };
            let checkins = directory_use_case::list_checkins(&http, &config.api.checkins_path, &filter).await?;
            println!("📝 {} check-ins", checkins.len());
            for c in &checkins {
                println!(
                    "   {:<10} {:<28} {:<8} {:<10} {:<10} {}",
                    c.student_id,
                    c.student_name,
                    c.class_id,
                    c.mood_label(),
                    c.ai_sentiment.as_deref().unwrap_or("-"),
                    c.created_at.as_deref().unwrap_or("")
                );
                if let Some(feedback) = c.original_feedback.as_deref().filter(|f| !f.is_empty()) {
                    println!("      \"{}\"", feedback);
                }
                if let Some(path) = &c.file_path {
                    println!("      📎 {}", path);
                }
            }
        }
        Commands::Preview { pipeline, file } => {
            let pipeline = match pipeline {
                PipelineArg::Behavior => ImportPipeline::behavior_checkins(&config.api),
                PipelineArg::Roster => ImportPipeline::student_roster(&config.api),
            };
            let text = std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let batch = ImportBatch::from_text(&String::from_utf8_lossy(&text), &pipeline.schema);
            print_batch(&batch, &pipeline.schema);
        }
        Commands::UploadBehavior { file } => {
            auth.require_role(Role::Teacher)?;
            let session = new_session(ImportPipeline::behavior_checkins(&config.api), &config, &auth);
            run_import(&session, &file).await?;
            println!("✅ Upload complete, behavior records updated");
        }
        Commands::CreateStudents { file, credentials_out } => {
            auth.require_role(Role::Teacher)?;
            let session = new_session(ImportPipeline::student_roster(&config.api), &config, &auth);
            let snapshot = run_import(&session, &file).await?;
            let credentials = match snapshot.result.as_ref().and_then(|r| r.credentials()) {
                Some(credentials) => credentials,
                None => {
                    println!("✅ Roster accepted, but the server sent no credential list");
                    return Ok(());
                }
            };
            println!("✅ {} student accounts created", credentials.len());
            for c in credentials {
                println!("   {:<10} {:<28} {:<16} {}", c.student_id, c.full_name, c.username, c.password);
            }
            if !credentials.is_empty() {
                write_credentials(&credentials_out, credentials)?;
                println!("📥 Credentials written to {}", credentials_out.display());
            }
        }
        Commands::RecordBehavior { student_id, date, absent, score, note } => {
            auth.require_role(Role::Teacher)?;
            let entry = BehaviorEntry {
                student_id,
                check_date: date.unwrap_or_else(|| Local::now().date_naive()),
                attendance: !absent,
                discipline_score: score,
                teacher_note: note,
            };
            let http = Arc::new(ReqwestHttp::new(config.api.clone(), auth.clone()));
            BatchSubmitter::new(http)
                .submit_one(&entry.to_record(), &RecordSchema::behavior_checkin(), &config.api.behavior_single_path)
                .await?;
            println!("✅ Behavior recorded for {} on {}", entry.student_id, entry.check_date);
        }
    }
    Ok(())
}

fn role_label(auth: &AuthContext) -> String {
    auth.role().map(|r| r.to_string()).unwrap_or_else(|| "unknown".to_string())
}

fn new_session(pipeline: ImportPipeline, config: &Config, auth: &AuthContext) -> ImportSession {
    let http = Arc::new(ReqwestHttp::new(config.api.clone(), auth.clone()));
    ImportSession::new(pipeline, BatchSubmitter::new(http))
}

/// Load, preview and submit one file; returns the final session state.
#[tracing::instrument(skip(session), fields(session = %session.id(), pipeline = session.pipeline().name))]
async fn run_import(session: &ImportSession, file: &Path) -> Result<SessionSnapshot> {
    session
        .load_file(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let snapshot = session.snapshot();
    print_batch(&snapshot.batch, &session.pipeline().schema);
    if !snapshot.can_submit() {
        println!("   expected columns: {}", session.pipeline().schema.header_line());
        bail!(snapshot
            .error_message
            .unwrap_or_else(|| constants::MSG_NO_VALID_RECORDS.to_string()));
    }

    info!(records = snapshot.batch.len(), "submitting batch");
    println!("🔄 Submitting {} records...", snapshot.batch.len());
    if let Err(e) = session.confirm_submit().await {
        error!(error = %e, "submission failed");
        let message = session.snapshot().error_message.unwrap_or_else(|| e.to_string());
        if e.is_retryable() {
            println!("🔁 The batch was not stored; run the same command again to retry");
        }
        bail!("❌ {}", message);
    }
    Ok(session.snapshot())
}

fn print_batch(batch: &ImportBatch, schema: &RecordSchema) {
    let columns: Vec<&str> = schema.fields().iter().map(|f| f.name).collect();
    let preview = batch.preview(constants::PREVIEW_LIMIT);

    println!("\n📊 Preview ({} records)", batch.len());
    println!("   #  | {}", columns.join(" | "));
    for (i, record) in preview.records.iter().enumerate() {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| record.get(c).map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()))
            .collect();
        println!("   {:<2} | {}", i + 1, cells.join(" | "));
    }
    if preview.remaining > 0 {
        println!("   ... and {} more", preview.remaining);
    }

    if !batch.dropped().is_empty() {
        println!("\n⚠️  {} rows skipped:", batch.dropped().len());
        for rejection in batch.dropped() {
            let reasons: Vec<String> = rejection.violations.iter().map(ToString::to_string).collect();
            println!("   - line {}: {}", rejection.line, reasons.join(", "));
        }
    }
}
