use chrono::NaiveTime;
use clap::{Args, Parser, Subcommand};
use innerblend_core::model::entry::EntryId;
use innerblend_core::model::journal::JournalId;
use innerblend_core::model::reminder::ReminderId;
use std::path::PathBuf;

/// Personal journal core driven from the command line.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Config file (defaults to `{config_dir}/innerblend/config.toml`).
    #[arg(long, global = true, env = "INNERBLEND_CONFIG")]
    pub config: Option<PathBuf>,
    /// Database file; overrides `[database] path`.
    #[arg(long, global = true, env = "INNERBLEND_DB")]
    pub db: Option<PathBuf>,
    /// Log level (trace|debug|info|warn|error); overrides `[logging] level`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// Acting user id as issued by the identity provider.
    #[arg(long, global = true, env = "INNERBLEND_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a user profile; prints the new profile.
    Register(RegisterArgs),
    /// Show the acting user's profile.
    Profile,
    #[command(subcommand)]
    Journal(JournalCommand),
    #[command(subcommand)]
    Entry(EntryCommand),
    /// List the acting user's tag names.
    Tags,
    #[command(subcommand)]
    Reminder(ReminderCommand),
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    /// Defaults to the email address.
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone_number: Option<String>,
    #[arg(long, env = "INNERBLEND_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long, env = "INNERBLEND_CONFIRM_PASSWORD", hide_env_values = true)]
    pub confirm_password: String,
}

#[derive(Subcommand, Debug)]
pub enum JournalCommand {
    /// List journals, most recently modified first.
    List,
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change only the supplied fields.
    Update {
        journal_id: JournalId,
        #[arg(long)]
        title: Option<String>,
        /// An empty value clears the description.
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a journal with all of its entries.
    Delete { journal_id: JournalId },
}

#[derive(Subcommand, Debug)]
pub enum EntryCommand {
    /// List the entries of one journal, newest first.
    List { journal_id: JournalId },
    Show { entry_id: EntryId },
    Create {
        journal_id: JournalId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// e.g. `happy`, `very sad`; unknown values are ignored.
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Repeatable; names are trimmed and lower-cased.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Change only the supplied fields.
    Update {
        entry_id: EntryId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Replaces the whole tag set when given; otherwise tags are kept.
        #[arg(long = "tag", conflicts_with = "clear_tags")]
        tags: Vec<String>,
        /// Remove every tag from the entry.
        #[arg(long)]
        clear_tags: bool,
    },
    /// Move an entry into another journal.
    Move {
        entry_id: EntryId,
        journal_id: JournalId,
    },
    Delete { entry_id: EntryId },
}

#[derive(Subcommand, Debug)]
pub enum ReminderCommand {
    /// List reminders ordered by time of day.
    List,
    Create {
        #[arg(long)]
        message: String,
        /// `HH:MM` or `HH:MM:SS`.
        #[arg(long, value_parser = parse_time_of_day)]
        at: NaiveTime,
        #[arg(long)]
        inactive: bool,
    },
    Update {
        reminder_id: ReminderId,
        #[arg(long)]
        message: Option<String>,
        #[arg(long, value_parser = parse_time_of_day)]
        at: Option<NaiveTime>,
        #[arg(long)]
        active: Option<bool>,
    },
    Delete { reminder_id: ReminderId },
}

fn parse_time_of_day(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| format!("`{value}` is not a time of day (expected HH:MM or HH:MM:SS)"))
}

#[cfg(test)]
mod tests {
    use super::{parse_time_of_day, Cli, Command, EntryCommand};
    use chrono::NaiveTime;
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn about_text_is_a_plain_sentence() {
        let about = Cli::command()
            .get_about()
            .map(ToString::to_string)
            .unwrap_or_default();
        assert!(about.starts_with("Personal journal core"));
        assert!(!about.contains('\u{2014}'));
    }

    #[test]
    fn time_of_day_accepts_minutes_and_seconds() {
        assert_eq!(
            parse_time_of_day("07:30").unwrap(),
            NaiveTime::from_hms_opt(7, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time_of_day("21:05:09").unwrap(),
            NaiveTime::from_hms_opt(21, 5, 9).unwrap()
        );
        assert!(parse_time_of_day("25:00").is_err());
    }

    #[test]
    fn entry_create_collects_repeated_tags() {
        let cli = Cli::try_parse_from([
            "innerblend",
            "--user",
            "u-1",
            "entry",
            "create",
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "--title",
            "Day one",
            "--content",
            "Landed.",
            "--tag",
            "Work",
            "--tag",
            "rome",
        ])
        .unwrap();

        assert_eq!(cli.user.as_deref(), Some("u-1"));
        match cli.command {
            Command::Entry(EntryCommand::Create { tags, .. }) => {
                assert_eq!(tags, vec!["Work", "rome"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
