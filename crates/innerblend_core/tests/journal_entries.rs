use innerblend_core::access::{CredentialError, CredentialStore};
use innerblend_core::db::open_db_in_memory;
use innerblend_core::service::entry_service::{
    CreateEntryRequest, MoveEntryRequest, UpdateEntryRequest,
};
use innerblend_core::service::journal_service::{CreateJournalRequest, UpdateJournalRequest};
use innerblend_core::service::user_service::RegisterRequest;
use innerblend_core::{
    Actor, EntryService, JournalService, Mood, ServiceError, SqliteEntryRepository,
    SqliteJournalRepository, SqliteUserRepository, UserService,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

struct AcceptAll;

impl CredentialStore for AcceptAll {
    fn set_password(&self, _user_id: &str, _password: &str) -> Result<(), CredentialError> {
        Ok(())
    }

    fn verify_password(&self, _user_id: &str, _password: &str) -> Result<bool, CredentialError> {
        Ok(true)
    }
}

fn register(conn: &Connection, email: &str) -> Actor {
    let users = UserService::new(SqliteUserRepository::try_new(conn).unwrap(), AcceptAll);
    let user = users
        .register(RegisterRequest {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            username: Some(email.to_string()),
            email: Some(email.to_string()),
            password: Some("correct horse".to_string()),
            confirm_password: Some("correct horse".to_string()),
            ..Default::default()
        })
        .unwrap();
    Actor::user(&user.id)
}

fn journal_titled(conn: &Connection, actor: &Actor, title: &str) -> Uuid {
    let journals = JournalService::new(SqliteJournalRepository::try_new(conn).unwrap());
    journals
        .create_journal(
            actor,
            CreateJournalRequest {
                title: Some(title.to_string()),
                description: None,
            },
        )
        .unwrap()
        .journal
        .uuid
}

fn entry_request(title: &str, tags: &[&str]) -> CreateEntryRequest {
    CreateEntryRequest {
        title: Some(title.to_string()),
        content: Some("Landed late, walked to the hotel.".to_string()),
        tags: Some(tags.iter().map(|tag| tag.to_string()).collect()),
        ..Default::default()
    }
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[test]
fn travel_entry_collapses_tag_variants_into_one_tag() {
    let conn = open_db_in_memory().unwrap();
    let actor = register(&conn, "ada@example.com");
    let journal_id = journal_titled(&conn, &actor, "Travel");
    let entries = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());

    let entry = entries
        .create_entry(&actor, journal_id, entry_request("Day one", &["Work", " work ", "WORK"]))
        .unwrap();

    assert_eq!(entry.journal_id, journal_id);
    assert_eq!(entry.tags, vec!["work"]);
    assert_eq!(entries.list_tags(&actor).unwrap(), vec!["work"]);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM tags;"), 1);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM journal_entry_tags;"), 1);
}

#[test]
fn tags_are_reused_across_entries_and_kept_per_user() {
    let conn = open_db_in_memory().unwrap();
    let ada = register(&conn, "ada@example.com");
    let grace = register(&conn, "grace@example.com");
    let ada_journal = journal_titled(&conn, &ada, "Travel");
    let grace_journal = journal_titled(&conn, &grace, "Work log");
    let entries = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());

    entries
        .create_entry(&ada, ada_journal, entry_request("One", &["work", "rome"]))
        .unwrap();
    entries
        .create_entry(&ada, ada_journal, entry_request("Two", &["Work"]))
        .unwrap();
    entries
        .create_entry(&grace, grace_journal, entry_request("Standup", &["work"]))
        .unwrap();

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM tags;"), 3);
    assert_eq!(entries.list_tags(&ada).unwrap(), vec!["rome", "work"]);
    assert_eq!(entries.list_tags(&grace).unwrap(), vec!["work"]);
}

#[test]
fn updating_tags_replaces_links_and_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let actor = register(&conn, "ada@example.com");
    let journal_id = journal_titled(&conn, &actor, "Travel");
    let entries = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());
    let entry = entries
        .create_entry(&actor, journal_id, entry_request("Day one", &["work"]))
        .unwrap();

    let replace = || UpdateEntryRequest {
        tags: Some(vec!["Food".to_string(), "rome".to_string()]),
        ..Default::default()
    };
    let first = entries.update_entry(&actor, entry.entry_id, replace()).unwrap();
    let second = entries.update_entry(&actor, entry.entry_id, replace()).unwrap();

    assert_eq!(first.tags, vec!["food", "rome"]);
    assert_eq!(second.tags, first.tags);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM journal_entry_tags;"), 2);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM tags;"), 3);

    let cleared = entries
        .update_entry(
            &actor,
            entry.entry_id,
            UpdateEntryRequest {
                tags: Some(Vec::new()),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(cleared.tags.is_empty());
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM journal_entry_tags;"), 0);
}

#[test]
fn update_overwrites_only_supplied_fields() {
    let conn = open_db_in_memory().unwrap();
    let actor = register(&conn, "ada@example.com");
    let journal_id = journal_titled(&conn, &actor, "Travel");
    let entries = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());
    let created = entries
        .create_entry(
            &actor,
            journal_id,
            CreateEntryRequest {
                location: Some("Lisbon".to_string()),
                ..entry_request("Day one", &["work"])
            },
        )
        .unwrap();

    let updated = entries
        .update_entry(
            &actor,
            created.entry_id,
            UpdateEntryRequest {
                title: Some("  Day one, revised ".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.title, "Day one, revised");
    assert_eq!(updated.content, created.content);
    assert_eq!(updated.location.as_deref(), Some("Lisbon"));
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(updated.created_at, created.created_at);

    let cleared = entries
        .update_entry(
            &actor,
            created.entry_id,
            UpdateEntryRequest {
                location: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(cleared.location, None);
}

#[test]
fn update_without_a_tag_list_clears_the_tags() {
    let conn = open_db_in_memory().unwrap();
    let actor = register(&conn, "ada@example.com");
    let journal_id = journal_titled(&conn, &actor, "Travel");
    let entries = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());
    let created = entries
        .create_entry(&actor, journal_id, entry_request("Day one", &["work", "rome"]))
        .unwrap();

    let updated = entries
        .update_entry(
            &actor,
            created.entry_id,
            UpdateEntryRequest {
                content: Some("Rained all day.".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    assert!(updated.tags.is_empty());
    assert_eq!(updated.content, "Rained all day.");
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM journal_entry_tags;"), 0);
    assert_eq!(entries.list_tags(&actor).unwrap(), vec!["rome", "work"]);
}

#[test]
fn failed_tag_links_leave_no_partial_writes() {
    let conn = open_db_in_memory().unwrap();
    let actor = register(&conn, "ada@example.com");
    let journal_id = journal_titled(&conn, &actor, "Travel");
    let entries = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());
    let existing = entries
        .create_entry(&actor, journal_id, entry_request("Day one", &["work"]))
        .unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_tag_links
         BEFORE INSERT ON journal_entry_tags
         BEGIN
            SELECT RAISE(ABORT, 'tag links are read-only');
         END;",
    )
    .unwrap();

    let err = entries
        .create_entry(&actor, journal_id, entry_request("Day two", &["food"]))
        .unwrap_err();
    assert_eq!(err.code(), "persistence");
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM journal_entries;"), 1);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM tags;"), 1);

    let err = entries
        .update_entry(
            &actor,
            existing.entry_id,
            UpdateEntryRequest {
                title: Some("Day one, revised".to_string()),
                tags: Some(vec!["rome".to_string()]),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.code(), "persistence");
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM tags;"), 1);

    let unchanged = entries.get_entry(&actor, existing.entry_id).unwrap();
    assert_eq!(unchanged.title, "Day one");
    assert_eq!(unchanged.tags, vec!["work"]);
}

#[test]
fn blank_title_or_content_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let actor = register(&conn, "ada@example.com");
    let journal_id = journal_titled(&conn, &actor, "Travel");
    let entries = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());

    let err = entries
        .create_entry(&actor, journal_id, entry_request("   ", &[]))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = entries
        .create_entry(
            &actor,
            journal_id,
            CreateEntryRequest {
                content: None,
                ..entry_request("Day one", &[])
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let created = entries
        .create_entry(&actor, journal_id, entry_request("Day one", &[]))
        .unwrap();
    let err = entries
        .update_entry(
            &actor,
            created.entry_id,
            UpdateEntryRequest {
                content: Some("\n".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM journal_entries;"), 1);
}

#[test]
fn mood_is_parsed_leniently_and_unknown_text_is_ignored() {
    let conn = open_db_in_memory().unwrap();
    let actor = register(&conn, "ada@example.com");
    let journal_id = journal_titled(&conn, &actor, "Travel");
    let entries = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());

    let unknown = entries
        .create_entry(
            &actor,
            journal_id,
            CreateEntryRequest {
                mood: Some("ecstatic".to_string()),
                ..entry_request("No mood", &[])
            },
        )
        .unwrap();
    assert_eq!(unknown.mood, None);

    let created = entries
        .create_entry(
            &actor,
            journal_id,
            CreateEntryRequest {
                mood: Some(" Very Happy ".to_string()),
                ..entry_request("Good day", &[])
            },
        )
        .unwrap();
    assert_eq!(created.mood, Some(Mood::VeryHappy));

    let unchanged = entries
        .update_entry(
            &actor,
            created.entry_id,
            UpdateEntryRequest {
                mood: Some("ecstatic".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(unchanged.mood, Some(Mood::VeryHappy));

    let changed = entries
        .update_entry(
            &actor,
            created.entry_id,
            UpdateEntryRequest {
                mood: Some("SAD".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(changed.mood, Some(Mood::Sad));
}

#[test]
fn entries_are_listed_newest_first_per_journal() {
    let conn = open_db_in_memory().unwrap();
    let actor = register(&conn, "ada@example.com");
    let travel = journal_titled(&conn, &actor, "Travel");
    let work = journal_titled(&conn, &actor, "Work");
    let entries = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());

    let older = entries
        .create_entry(&actor, travel, entry_request("Older", &[]))
        .unwrap();
    let newer = entries
        .create_entry(&actor, travel, entry_request("Newer", &[]))
        .unwrap();
    entries
        .create_entry(&actor, work, entry_request("Elsewhere", &[]))
        .unwrap();
    conn.execute(
        "UPDATE journal_entries SET created_at = ?2 WHERE uuid = ?1;",
        params![older.entry_id.to_string(), 1_000_i64],
    )
    .unwrap();
    conn.execute(
        "UPDATE journal_entries SET created_at = ?2 WHERE uuid = ?1;",
        params![newer.entry_id.to_string(), 2_000_i64],
    )
    .unwrap();

    let listed: Vec<_> = entries
        .list_entries(&actor, travel)
        .unwrap()
        .into_iter()
        .map(|entry| entry.entry_id)
        .collect();
    assert_eq!(listed, vec![newer.entry_id, older.entry_id]);
}

#[test]
fn move_entry_changes_only_the_parent_journal() {
    let conn = open_db_in_memory().unwrap();
    let actor = register(&conn, "ada@example.com");
    let travel = journal_titled(&conn, &actor, "Travel");
    let work = journal_titled(&conn, &actor, "Work");
    let entries = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());
    let created = entries
        .create_entry(&actor, travel, entry_request("Day one", &["work"]))
        .unwrap();

    let moved = entries
        .move_entry(
            &actor,
            MoveEntryRequest {
                entry_id: created.entry_id,
                journal_id: work,
            },
        )
        .unwrap();

    assert_eq!(moved.journal_id, work);
    assert_eq!(moved.title, created.title);
    assert_eq!(moved.tags, created.tags);
    assert!(entries.list_entries(&actor, travel).unwrap().is_empty());
    assert_eq!(entries.list_entries(&actor, work).unwrap().len(), 1);
}

#[test]
fn journal_update_is_partial_and_rejects_blank_title() {
    let conn = open_db_in_memory().unwrap();
    let actor = register(&conn, "ada@example.com");
    let journals = JournalService::new(SqliteJournalRepository::try_new(&conn).unwrap());
    let created = journals
        .create_journal(
            &actor,
            CreateJournalRequest {
                title: Some("Travel".to_string()),
                description: Some("Trips abroad".to_string()),
            },
        )
        .unwrap();
    assert_eq!(created.owner.email, "ada@example.com");

    let updated = journals
        .update_journal(
            &actor,
            created.journal.uuid,
            UpdateJournalRequest {
                title: Some("Travel 2026".to_string()),
                description: None,
            },
        )
        .unwrap();
    assert_eq!(updated.title, "Travel 2026");
    assert_eq!(updated.description.as_deref(), Some("Trips abroad"));

    let err = journals
        .update_journal(
            &actor,
            created.journal.uuid,
            UpdateJournalRequest {
                title: Some("  ".to_string()),
                description: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(
        journals.get_journal(&actor, created.journal.uuid).unwrap().title,
        "Travel 2026"
    );
}

#[test]
fn journals_are_listed_most_recently_modified_first_with_entry_counts() {
    let conn = open_db_in_memory().unwrap();
    let actor = register(&conn, "ada@example.com");
    let travel = journal_titled(&conn, &actor, "Travel");
    let work = journal_titled(&conn, &actor, "Work");
    let entries = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());
    entries
        .create_entry(&actor, travel, entry_request("Day one", &[]))
        .unwrap();
    conn.execute(
        "UPDATE journals SET updated_at = ?2 WHERE uuid = ?1;",
        params![travel.to_string(), 5_000_i64],
    )
    .unwrap();
    conn.execute(
        "UPDATE journals SET updated_at = ?2 WHERE uuid = ?1;",
        params![work.to_string(), 1_000_i64],
    )
    .unwrap();

    let journals = JournalService::new(SqliteJournalRepository::try_new(&conn).unwrap());
    let listed = journals.list_journals(&actor).unwrap();

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].journal.uuid, travel);
    assert_eq!(listed[0].entry_count, 1);
    assert_eq!(listed[1].journal.uuid, work);
    assert_eq!(listed[1].entry_count, 0);
}

#[test]
fn deleting_a_journal_cascades_entries_and_links_but_keeps_tags() {
    let conn = open_db_in_memory().unwrap();
    let actor = register(&conn, "ada@example.com");
    let journal_id = journal_titled(&conn, &actor, "Travel");
    let entries = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());
    entries
        .create_entry(&actor, journal_id, entry_request("One", &["work"]))
        .unwrap();
    entries
        .create_entry(&actor, journal_id, entry_request("Two", &["rome"]))
        .unwrap();
    let other_journal = journal_titled(&conn, &actor, "Work");
    let survivor = entries
        .create_entry(&actor, other_journal, entry_request("Standup", &["work"]))
        .unwrap();

    let journals = JournalService::new(SqliteJournalRepository::try_new(&conn).unwrap());
    let deletion = journals.delete_journal(&actor, journal_id).unwrap();

    assert_eq!(deletion.deleted_entries, 2);
    assert!(deletion.orphaned_image_urls.is_empty());
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM journal_entries;"), 1);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM journal_entry_tags;"), 1);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM tags;"), 2);
    assert_eq!(
        entries.get_entry(&actor, survivor.entry_id).unwrap().tags,
        vec!["work"]
    );
    assert!(matches!(
        journals.get_journal(&actor, journal_id).unwrap_err(),
        ServiceError::NotFound { .. }
    ));
}

#[test]
fn deleting_an_entry_removes_links_but_keeps_tags() {
    let conn = open_db_in_memory().unwrap();
    let actor = register(&conn, "ada@example.com");
    let journal_id = journal_titled(&conn, &actor, "Travel");
    let entries = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());
    let entry = entries
        .create_entry(&actor, journal_id, entry_request("One", &["work", "rome"]))
        .unwrap();

    let deletion = entries.delete_entry(&actor, entry.entry_id).unwrap();

    assert_eq!(deletion.removed_tag_links, 2);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM journal_entries;"), 0);
    assert_eq!(entries.list_tags(&actor).unwrap(), vec!["rome", "work"]);
    assert!(matches!(
        entries.get_entry(&actor, entry.entry_id).unwrap_err(),
        ServiceError::NotFound { .. }
    ));
}
