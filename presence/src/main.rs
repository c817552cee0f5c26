//! `presence` - command-line front end for the congregation register.
//!
//! Visitors are registered once as members and then checked in for one of
//! the two weekly services, present or absent with a reason. The `member`
//! and `attendance` subcommands cover the admin dashboard: listing with
//! search and filters, edits and deletions. `login` checks admin
//! credentials against the store.
//!
//! The database location, sequence reclamation and log directory come from
//! [`config`]; global flags override them.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use presence_register::domain::{
    AttendanceChange, AttendanceFilter, AttendanceView, Member, MemberInput, NewAttendance,
    ValidationError,
};
use presence_register::{AuthError, Database, RegisterError, SequencePolicy, SqliteRegister};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

#[derive(Parser, Debug)]
#[command(name = "presence", about = "Congregation member and attendance register")]
struct Cli {
    /// Database file. Defaults to `data.db` in the data directory.
    #[arg(long, global = true, env = "PRESENCE_DB_PATH")]
    db: Option<PathBuf>,

    /// Keep AUTOINCREMENT counters untouched on delete.
    #[arg(long, global = true)]
    keep_sequences: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database, apply the schema and seed the default admin.
    Init,
    /// Register, list and edit members.
    Member {
        #[command(subcommand)]
        action: MemberAction,
    },
    /// Check in and manage attendance entries.
    Attendance {
        #[command(subcommand)]
        action: AttendanceAction,
    },
    /// Check admin credentials.
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "PRESENCE_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand, Debug)]
enum MemberAction {
    /// List members sorted by name.
    List {
        /// Keep members whose full name contains this text.
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Register a new member.
    Add(MemberFields),
    /// Replace a member's fields.
    Update {
        id: i64,
        #[command(flatten)]
        fields: MemberFields,
    },
    /// Delete a member and all their attendance.
    Delete { id: i64 },
    /// Look up a member by name, ignoring case.
    Find {
        nom: String,
        prenom: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct MemberFields {
    #[arg(long)]
    nom: String,
    #[arg(long)]
    prenom: String,
    #[arg(long)]
    numero: Option<String>,
    /// Date of birth as entered, e.g. 1990-01-31.
    #[arg(long, default_value = "")]
    date_de_naissance: String,
}

impl MemberFields {
    fn to_input(&self) -> MemberInput {
        let input = MemberInput::new(&self.nom, &self.prenom)
            .with_date_de_naissance(&self.date_de_naissance);
        match &self.numero {
            Some(numero) => input.with_numero(numero),
            None => input,
        }
    }
}

#[derive(Subcommand, Debug)]
enum AttendanceAction {
    /// List entries, newest first.
    List {
        /// Keep entries whose member name contains this text.
        #[arg(short, long)]
        name: Option<String>,
        /// Keep entries for this service (1 or 2).
        #[arg(short, long)]
        service: Option<i64>,
        #[arg(long)]
        json: bool,
    },
    /// Check a member in for a service.
    Record {
        #[command(flatten)]
        member: MemberRef,
        /// Service id: 1 for the first service, 2 for the second.
        #[arg(short, long)]
        service: i64,
        /// Date of the service. Defaults to today.
        #[arg(short, long)]
        date: Option<String>,
        #[command(flatten)]
        status: StatusFields,
    },
    /// Change the status and service of an entry.
    Update {
        id: i64,
        #[arg(short, long)]
        service: i64,
        #[command(flatten)]
        status: StatusFields,
    },
    /// Delete an entry.
    Delete { id: i64 },
}

/// A member given by id, or by name as on the check-in form.
#[derive(Args, Debug)]
struct MemberRef {
    #[arg(long, conflicts_with_all = ["nom", "prenom"], required_unless_present_all = ["nom", "prenom"])]
    member_id: Option<i64>,
    #[arg(long, requires = "prenom")]
    nom: Option<String>,
    #[arg(long, requires = "nom")]
    prenom: Option<String>,
}

#[derive(Args, Debug)]
struct StatusFields {
    /// Mark the member absent. Requires --reason.
    #[arg(long)]
    absent: bool,
    /// Reason for the absence.
    #[arg(long)]
    reason: Option<String>,
}

/// Failures reported to the person at the terminal.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Register(#[from] RegisterError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("no member named {nom} {prenom}")]
    UnknownMember { nom: String, prenom: String },
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    fn user_message(&self) -> String {
        match self {
            CliError::Validation(e) => e.user_message().to_string(),
            CliError::Register(e) => e.user_message(),
            CliError::Auth(e) => e.user_message(),
            CliError::UnknownMember { .. } => {
                "Membre introuvable, veuillez d'abord vous enregistrer".to_string()
            }
            CliError::Output(_) => "Une erreur est survenue, veuillez réessayer".to_string(),
        }
    }
}

/// Install the tracing subscriber: a daily rolling file when a log
/// directory is configured, stderr otherwise. The returned guard flushes
/// the file writer on drop.
fn init_logging(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_dir) = log_dir else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "presence");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter)
        .init();

    Ok(Some(guard))
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = init_logging(config::get_log_dir().as_deref())?;

    let db_path = cli.db.clone().unwrap_or_else(config::get_db_path);
    let sequences = if cli.keep_sequences {
        SequencePolicy::Keep
    } else {
        SequencePolicy::from_enabled(config::get_reclaim_sequences())
    };

    tracing::debug!(db = %db_path.display(), ?sequences, "Opening register");
    let db = match Database::open(&db_path).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, db = %db_path.display(), "Failed to open database");
            eprintln!("{}", e.user_message());
            return Ok(ExitCode::FAILURE);
        }
    };
    let register = SqliteRegister::sqlite(&db, sequences);

    let result = run(cli.command, &register, &db_path).await;
    db.close().await;

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(command: Commands, register: &SqliteRegister, db_path: &Path) -> Result<(), CliError> {
    match command {
        Commands::Init => {
            println!("Base de données prête : {}", db_path.display());
        }
        Commands::Member { action } => handle_member(action, register).await?,
        Commands::Attendance { action } => handle_attendance(action, register).await?,
        Commands::Login { username, password } => {
            let admin = register.login(&username, &password).await?;
            println!("Connecté en tant que {}", admin.username);
        }
    }
    Ok(())
}

async fn handle_member(action: MemberAction, register: &SqliteRegister) -> Result<(), CliError> {
    match action {
        MemberAction::List { search, json } => {
            let members = match search.as_deref() {
                Some(query) => register.search_members(query).await?,
                None => register.members().await?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&members)?);
            } else {
                for member in &members {
                    println!("{}", member_line(member));
                }
            }
        }
        MemberAction::Add(fields) => {
            let id = register.register_member(&fields.to_input()).await?;
            println!("Membre enregistré (id {id})");
        }
        MemberAction::Update { id, fields } => {
            register.update_member(id, &fields.to_input()).await?;
            println!("Membre {id} mis à jour");
        }
        MemberAction::Delete { id } => {
            register.delete_member(id).await?;
            println!("Membre {id} supprimé");
        }
        MemberAction::Find { nom, prenom, json } => {
            let member = register
                .find_member(&nom, &prenom)
                .await?
                .ok_or(CliError::UnknownMember { nom, prenom })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&member)?);
            } else {
                println!("{}", member_line(&member));
            }
        }
    }
    Ok(())
}

async fn handle_attendance(
    action: AttendanceAction,
    register: &SqliteRegister,
) -> Result<(), CliError> {
    match action {
        AttendanceAction::List {
            name,
            service,
            json,
        } => {
            let entries = register
                .attendance(&AttendanceFilter { name, service })
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in &entries {
                    println!("{}", attendance_line(entry));
                }
            }
        }
        AttendanceAction::Record {
            member,
            service,
            date,
            status,
        } => {
            let member_id = resolve_member(register, member).await?;
            let date = date.unwrap_or_else(today);
            let entry = NewAttendance::new(
                member_id,
                service,
                !status.absent,
                &date,
                status.reason.as_deref(),
            )?;
            let id = register.check_in(&entry).await?;
            println!("Présence enregistrée (id {id}) : {} le {date}", entry.service);
        }
        AttendanceAction::Update {
            id,
            service,
            status,
        } => {
            let change = AttendanceChange::new(!status.absent, service, status.reason.as_deref())?;
            register.update_attendance(id, &change).await?;
            println!("Présence {id} mise à jour");
        }
        AttendanceAction::Delete { id } => {
            register.delete_attendance(id).await?;
            println!("Présence {id} supprimée");
        }
    }
    Ok(())
}

async fn resolve_member(register: &SqliteRegister, member: MemberRef) -> Result<i64, CliError> {
    if let Some(id) = member.member_id {
        return Ok(id);
    }
    let nom = member.nom.unwrap_or_default();
    let prenom = member.prenom.unwrap_or_default();
    match register.find_member(&nom, &prenom).await? {
        Some(found) => Ok(found.id),
        None => Err(CliError::UnknownMember { nom, prenom }),
    }
}

fn member_line(member: &Member) -> String {
    format!(
        "{:>4}  {:<32}  {:<14}  {}",
        member.id,
        member.full_name(),
        member.numero.as_deref().unwrap_or("-"),
        member.date_de_naissance,
    )
}

fn attendance_line(entry: &AttendanceView) -> String {
    let mut line = format!(
        "{:>4}  {}  {:<10}  {:<32}  {:<14}  {}",
        entry.id,
        entry.date,
        entry.service_label,
        entry.full_name,
        entry.phone,
        entry.present_label,
    );
    if let Some(reason) = &entry.absence_reason {
        line.push_str(&format!(" ({reason})"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_member_add() {
        let cli = Cli::try_parse_from([
            "presence", "member", "add", "--nom", "Dupont", "--prenom", "Jean", "--numero",
            "0600000000",
        ])
        .unwrap();
        match cli.command {
            Commands::Member {
                action: MemberAction::Add(fields),
            } => {
                let input = fields.to_input();
                assert_eq!(input.nom, "Dupont");
                assert_eq!(input.numero.as_deref(), Some("0600000000"));
                assert_eq!(input.date_de_naissance, "");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_record_by_name_with_absence() {
        let cli = Cli::try_parse_from([
            "presence",
            "attendance",
            "record",
            "--nom",
            "Dupont",
            "--prenom",
            "Jean",
            "--service",
            "2",
            "--absent",
            "--reason",
            "malade",
        ])
        .unwrap();
        match cli.command {
            Commands::Attendance {
                action:
                    AttendanceAction::Record {
                        member,
                        service,
                        date,
                        status,
                    },
            } => {
                assert_eq!(member.member_id, None);
                assert_eq!(member.nom.as_deref(), Some("Dupont"));
                assert_eq!(service, 2);
                assert!(date.is_none());
                assert!(status.absent);
                assert_eq!(status.reason.as_deref(), Some("malade"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_record_needs_a_member() {
        let result =
            Cli::try_parse_from(["presence", "attendance", "record", "--service", "1"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from([
            "presence",
            "attendance",
            "record",
            "--member-id",
            "3",
            "--nom",
            "Dupont",
            "--prenom",
            "Jean",
            "--service",
            "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "presence",
            "member",
            "list",
            "--json",
            "--db",
            "/tmp/presence.db",
            "--keep-sequences",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/presence.db")));
        assert!(cli.keep_sequences);
    }

    #[test]
    fn test_today_is_iso_date() {
        let date = today();
        assert_eq!(date.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_ok());
    }

    #[test]
    fn test_unknown_member_message() {
        let err = CliError::UnknownMember {
            nom: "X".to_string(),
            prenom: "Y".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "Membre introuvable, veuillez d'abord vous enregistrer"
        );
    }

    #[tokio::test]
    async fn test_run_against_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.db");
        let db = Database::open(&path).await.unwrap();
        let register = SqliteRegister::sqlite(&db, SequencePolicy::Reclaim);

        let add = Cli::try_parse_from([
            "presence", "member", "add", "--nom", "Dupont", "--prenom", "Jean",
        ])
        .unwrap();
        run(add.command, &register, &path).await.unwrap();

        let record = Cli::try_parse_from([
            "presence",
            "attendance",
            "record",
            "--nom",
            "dupont",
            "--prenom",
            "JEAN",
            "--service",
            "1",
            "--date",
            "2024-01-07",
        ])
        .unwrap();
        run(record.command, &register, &path).await.unwrap();

        let again = Cli::try_parse_from([
            "presence",
            "attendance",
            "record",
            "--member-id",
            "1",
            "--service",
            "1",
            "--date",
            "2024-01-07",
        ])
        .unwrap();
        let err = run(again.command, &register, &path).await.unwrap_err();
        assert!(matches!(
            err,
            CliError::Register(RegisterError::DuplicateAttendance { .. })
        ));

        let absent_without_reason = Cli::try_parse_from([
            "presence",
            "attendance",
            "record",
            "--member-id",
            "1",
            "--service",
            "2",
            "--absent",
        ])
        .unwrap();
        let err = run(absent_without_reason.command, &register, &path)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::Validation(ValidationError::MissingAbsenceReason)
        ));

        db.close().await;
    }
}
