mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, EntryCommand, JournalCommand, RegisterArgs, ReminderCommand};
use innerblend_core::access::{CredentialError, CredentialStore};
use innerblend_core::db::Connection;
use innerblend_core::service::entry_service::{
    CreateEntryRequest, MoveEntryRequest, UpdateEntryRequest,
};
use innerblend_core::service::journal_service::{CreateJournalRequest, UpdateJournalRequest};
use innerblend_core::service::reminder_service::{CreateReminderRequest, UpdateReminderRequest};
use innerblend_core::service::user_service::RegisterRequest;
use innerblend_core::{
    init_logging_from_config, open_db, Actor, CoreConfig, EntryService, JournalService,
    ReminderService, ServiceError, SqliteEntryRepository, SqliteJournalRepository,
    SqliteReminderRepository, SqliteUserRepository, UserService,
};
use log::info;
use serde_json::{json, Value};
use std::process::ExitCode;

/// Passwords are checked for confirmation by the core and then dropped; the
/// command line host has no identity provider to hand them to.
struct NoIdentityProvider;

impl CredentialStore for NoIdentityProvider {
    fn set_password(&self, user_id: &str, _password: &str) -> Result<(), CredentialError> {
        info!(
            "event=credential_skip module=cli status=ok user_id={}",
            user_id
        );
        Ok(())
    }

    fn verify_password(&self, _user_id: &str, _password: &str) -> Result<bool, CredentialError> {
        Err(CredentialError(
            "no identity provider is configured for password checks".to_string(),
        ))
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ServiceError>() {
                Some(service_error) => {
                    let body = json!({
                        "error": service_error.code(),
                        "message": service_error.to_string(),
                    });
                    eprintln!("{body}");
                }
                None => eprintln!("innerblend: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CoreConfig::load(cli.config.as_deref()).context("loading config")?;
    if let Some(path) = cli.db {
        config.database.path = Some(path);
    }
    if let Some(level) = cli.log_level {
        config.logging.level = Some(level);
    }
    init_logging_from_config(&config)
        .map_err(anyhow::Error::msg)
        .context("starting logging")?;

    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let conn = open_db(&db_path).with_context(|| format!("opening {}", db_path.display()))?;
    let actor = Actor::from_claim(cli.user.as_deref());

    let output = match cli.command {
        Command::Register(args) => register(&conn, args)?,
        Command::Profile => {
            let users = UserService::new(SqliteUserRepository::try_new(&conn)?, NoIdentityProvider);
            serde_json::to_value(users.get_profile(&actor)?)?
        }
        Command::Journal(command) => journal(&conn, &actor, command)?,
        Command::Entry(command) => entry(&conn, &actor, command)?,
        Command::Tags => {
            let entries = EntryService::new(SqliteEntryRepository::try_new(&conn)?);
            serde_json::to_value(entries.list_tags(&actor)?)?
        }
        Command::Reminder(command) => reminder(&conn, &actor, command)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn register(conn: &Connection, args: RegisterArgs) -> Result<Value> {
    let users = UserService::new(SqliteUserRepository::try_new(conn)?, NoIdentityProvider);
    let username = args.username.unwrap_or_else(|| args.email.clone());
    let user = users.register(RegisterRequest {
        id: None,
        first_name: Some(args.first_name),
        last_name: Some(args.last_name),
        username: Some(username),
        email: Some(args.email),
        phone_number: args.phone_number,
        password: Some(args.password),
        confirm_password: Some(args.confirm_password),
    })?;
    Ok(serde_json::to_value(user)?)
}

fn journal(conn: &Connection, actor: &Actor, command: JournalCommand) -> Result<Value> {
    let journals = JournalService::new(SqliteJournalRepository::try_new(conn)?);
    let value = match command {
        JournalCommand::List => serde_json::to_value(journals.list_journals(actor)?)?,
        JournalCommand::Create { title, description } => {
            serde_json::to_value(journals.create_journal(
                actor,
                CreateJournalRequest {
                    title: Some(title),
                    description,
                },
            )?)?
        }
        JournalCommand::Update {
            journal_id,
            title,
            description,
        } => serde_json::to_value(journals.update_journal(
            actor,
            journal_id,
            UpdateJournalRequest { title, description },
        )?)?,
        JournalCommand::Delete { journal_id } => {
            serde_json::to_value(journals.delete_journal(actor, journal_id)?)?
        }
    };
    Ok(value)
}

fn entry(conn: &Connection, actor: &Actor, command: EntryCommand) -> Result<Value> {
    let entries = EntryService::new(SqliteEntryRepository::try_new(conn)?);
    let value = match command {
        EntryCommand::List { journal_id } => {
            serde_json::to_value(entries.list_entries(actor, journal_id)?)?
        }
        EntryCommand::Show { entry_id } => serde_json::to_value(entries.get_entry(actor, entry_id)?)?,
        EntryCommand::Create {
            journal_id,
            title,
            content,
            mood,
            location,
            tags,
        } => serde_json::to_value(entries.create_entry(
            actor,
            journal_id,
            CreateEntryRequest {
                title: Some(title),
                content: Some(content),
                mood,
                location,
                tags: Some(tags),
            },
        )?)?,
        EntryCommand::Update {
            entry_id,
            title,
            content,
            mood,
            location,
            tags,
            clear_tags,
        } => {
            // Updates re-specify the tag set; without flags keep the current one.
            let tags = if clear_tags {
                Vec::new()
            } else if tags.is_empty() {
                entries.get_entry(actor, entry_id)?.tags
            } else {
                tags
            };
            serde_json::to_value(entries.update_entry(
                actor,
                entry_id,
                UpdateEntryRequest {
                    title,
                    content,
                    mood,
                    location,
                    tags: Some(tags),
                },
            )?)?
        }
        EntryCommand::Move {
            entry_id,
            journal_id,
        } => serde_json::to_value(entries.move_entry(
            actor,
            MoveEntryRequest {
                entry_id,
                journal_id,
            },
        )?)?,
        EntryCommand::Delete { entry_id } => {
            serde_json::to_value(entries.delete_entry(actor, entry_id)?)?
        }
    };
    Ok(value)
}

fn reminder(conn: &Connection, actor: &Actor, command: ReminderCommand) -> Result<Value> {
    let reminders = ReminderService::new(SqliteReminderRepository::try_new(conn)?);
    let value = match command {
        ReminderCommand::List => serde_json::to_value(reminders.list_reminders(actor)?)?,
        ReminderCommand::Create {
            message,
            at,
            inactive,
        } => serde_json::to_value(reminders.create_reminder(
            actor,
            CreateReminderRequest {
                message: Some(message),
                remind_at: Some(at),
                is_active: Some(!inactive),
            },
        )?)?,
        ReminderCommand::Update {
            reminder_id,
            message,
            at,
            active,
        } => serde_json::to_value(reminders.update_reminder(
            actor,
            reminder_id,
            UpdateReminderRequest {
                message,
                remind_at: at,
                is_active: active,
            },
        )?)?,
        ReminderCommand::Delete { reminder_id } => {
            reminders.delete_reminder(actor, reminder_id)?;
            json!({ "deleted": reminder_id })
        }
    };
    Ok(value)
}
