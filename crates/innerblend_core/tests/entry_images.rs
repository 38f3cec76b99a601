use innerblend_core::db::open_db_in_memory;
use innerblend_core::model::user::UserProfile;
use innerblend_core::repo::user_repo::UserRepository;
use innerblend_core::service::entry_service::CreateEntryRequest;
use innerblend_core::service::journal_service::CreateJournalRequest;
use innerblend_core::{
    Actor, BlobStorage, EntryService, ImagePolicy, ImageService, ImageUpload, JournalService,
    ResourceKind, ServiceError, SqliteEntryRepository, SqliteImageRepository,
    SqliteJournalRepository, SqliteUserRepository, StorageError, UserService,
};
use rusqlite::Connection;
use std::cell::{Cell, RefCell};
use uuid::Uuid;

const MIB: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
enum StorageCall {
    Compress(String),
    Upload(String),
    Delete(String),
}

/// Records every call; URLs are `https://blobs.test/{n}/{file_name}` unless
/// `fixed_url` pins them.
#[derive(Default)]
struct RecordingStorage {
    calls: RefCell<Vec<StorageCall>>,
    uploads: Cell<usize>,
    fixed_url: Option<String>,
}

impl RecordingStorage {
    fn with_fixed_url(url: &str) -> Self {
        Self {
            fixed_url: Some(url.to_string()),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<StorageCall> {
        self.calls.borrow().clone()
    }
}

impl BlobStorage for RecordingStorage {
    fn upload(&self, _bytes: &[u8], file_name: &str) -> Result<String, StorageError> {
        self.calls
            .borrow_mut()
            .push(StorageCall::Upload(file_name.to_string()));
        let n = self.uploads.get() + 1;
        self.uploads.set(n);
        Ok(self
            .fixed_url
            .clone()
            .unwrap_or_else(|| format!("https://blobs.test/{n}/{file_name}")))
    }

    fn delete(&self, url: &str) -> Result<(), StorageError> {
        self.calls
            .borrow_mut()
            .push(StorageCall::Delete(url.to_string()));
        Ok(())
    }

    fn compress_and_resize(&self, image: &ImageUpload) -> Result<Vec<u8>, StorageError> {
        self.calls
            .borrow_mut()
            .push(StorageCall::Compress(image.file_name.clone()));
        Ok(image.bytes.iter().step_by(2).copied().collect())
    }
}

struct Fixture {
    conn: Connection,
    owner: Actor,
    stranger: Actor,
    journal_id: Uuid,
    entry_id: Uuid,
}

fn insert_profile(conn: &Connection, id: &str) -> Actor {
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(&UserProfile {
            id: id.to_string(),
            username: id.to_string(),
            email: format!("{id}@example.com"),
            first_name: "Test".to_string(),
            last_name: id.to_string(),
            phone_number: None,
            created_at: 1,
            updated_at: 1,
        })
        .unwrap();
    Actor::user(id)
}

fn fixture() -> Fixture {
    let conn = open_db_in_memory().unwrap();
    let owner = insert_profile(&conn, "owner");
    let stranger = insert_profile(&conn, "stranger");
    let (journal_id, entry_id) = {
        let journals = JournalService::new(SqliteJournalRepository::try_new(&conn).unwrap());
        let entries = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());
        let journal_id = journals
            .create_journal(
                &owner,
                CreateJournalRequest {
                    title: Some("Travel".to_string()),
                    description: None,
                },
            )
            .unwrap()
            .journal
            .uuid;
        let entry_id = entries
            .create_entry(
                &owner,
                journal_id,
                CreateEntryRequest {
                    title: Some("Beach".to_string()),
                    content: Some("Photos from the coast.".to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .entry_id;
        (journal_id, entry_id)
    };
    Fixture {
        conn,
        owner,
        stranger,
        journal_id,
        entry_id,
    }
}

fn png(name: &str, size: usize) -> ImageUpload {
    ImageUpload::new(name, "image/png", vec![7; size])
}

fn image_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM journal_entry_images;", [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn oversized_upload_is_rejected_before_any_storage_call() {
    let fx = fixture();
    let storage = RecordingStorage::default();
    let images = ImageService::new(
        SqliteImageRepository::try_new(&fx.conn).unwrap(),
        &storage,
        ImagePolicy::default(),
    );

    let err = images
        .attach_images(
            &fx.owner,
            fx.entry_id,
            &[png("small.png", 1024), png("huge.png", 6 * MIB)],
        )
        .unwrap_err();

    assert!(matches!(err, ServiceError::Validation(ref message) if message.contains("huge.png")));
    assert!(storage.calls().is_empty());
    assert_eq!(image_rows(&fx.conn), 0);
}

#[test]
fn unsupported_types_and_empty_batches_are_validation_errors() {
    let fx = fixture();
    let storage = RecordingStorage::default();
    let images = ImageService::new(
        SqliteImageRepository::try_new(&fx.conn).unwrap(),
        &storage,
        ImagePolicy::default(),
    );

    let gif = ImageUpload::new("anim.gif", "image/gif", vec![1; 16]);
    assert!(matches!(
        images.attach_images(&fx.owner, fx.entry_id, &[gif]).unwrap_err(),
        ServiceError::Validation(_)
    ));
    assert!(matches!(
        images.attach_images(&fx.owner, fx.entry_id, &[]).unwrap_err(),
        ServiceError::Validation(_)
    ));
    assert!(matches!(
        images.delete_images(&fx.owner, fx.entry_id, &[]).unwrap_err(),
        ServiceError::Validation(_)
    ));
    assert!(storage.calls().is_empty());
}

#[test]
fn attach_compresses_uploads_and_records_urls() {
    let fx = fixture();
    let storage = RecordingStorage::default();
    let images = ImageService::new(
        SqliteImageRepository::try_new(&fx.conn).unwrap(),
        &storage,
        ImagePolicy::default(),
    );

    let attached = images
        .attach_images(
            &fx.owner,
            fx.entry_id,
            &[
                png("a.png", 2048),
                ImageUpload::new("b.jpg", "IMAGE/JPEG; q=0.9", vec![3; 512]),
            ],
        )
        .unwrap();

    assert_eq!(attached.len(), 2);
    assert_eq!(
        storage.calls(),
        vec![
            StorageCall::Compress("a.png".to_string()),
            StorageCall::Upload("a.png".to_string()),
            StorageCall::Compress("b.jpg".to_string()),
            StorageCall::Upload("b.jpg".to_string()),
        ]
    );

    let entries = EntryService::new(SqliteEntryRepository::try_new(&fx.conn).unwrap());
    let record = entries.get_entry(&fx.owner, fx.entry_id).unwrap();
    assert_eq!(
        record.image_urls,
        vec!["https://blobs.test/1/a.png", "https://blobs.test/2/b.jpg"]
    );
}

#[test]
fn failed_insert_deletes_the_uploaded_blobs() {
    let fx = fixture();
    let storage = RecordingStorage::with_fixed_url("https://blobs.test/same.png");
    let images = ImageService::new(
        SqliteImageRepository::try_new(&fx.conn).unwrap(),
        &storage,
        ImagePolicy::default(),
    );

    let err = images
        .attach_images(
            &fx.owner,
            fx.entry_id,
            &[png("a.png", 64), png("b.png", 64)],
        )
        .unwrap_err();

    assert_eq!(err.code(), "persistence");
    let deletes = storage
        .calls()
        .into_iter()
        .filter(|call| matches!(call, StorageCall::Delete(_)))
        .count();
    assert_eq!(deletes, 2);
    assert_eq!(image_rows(&fx.conn), 0);
}

#[test]
fn replace_swaps_the_blob_and_keeps_the_image_row() {
    let fx = fixture();
    let storage = RecordingStorage::default();
    let images = ImageService::new(
        SqliteImageRepository::try_new(&fx.conn).unwrap(),
        &storage,
        ImagePolicy::default(),
    );
    let original = images
        .attach_images(&fx.owner, fx.entry_id, &[png("old.png", 64)])
        .unwrap()
        .remove(0);

    let replaced = images
        .replace_image(
            &fx.owner,
            fx.entry_id,
            &original.image_url,
            &png("new.png", 64),
        )
        .unwrap();

    assert_eq!(replaced.uuid, original.uuid);
    assert_eq!(replaced.image_url, "https://blobs.test/2/new.png");
    assert_eq!(
        storage.calls()[2..].to_vec(),
        vec![
            StorageCall::Delete(original.image_url.clone()),
            StorageCall::Compress("new.png".to_string()),
            StorageCall::Upload("new.png".to_string()),
        ]
    );
    let listed = images.list_images(&fx.owner, fx.entry_id).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].image_url, replaced.image_url);

    let err = images
        .replace_image(
            &fx.owner,
            fx.entry_id,
            "https://blobs.test/unknown.png",
            &png("other.png", 64),
        )
        .unwrap_err();
    match err {
        ServiceError::NotFound { resource, .. } => assert_eq!(resource, ResourceKind::Image),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn delete_removes_blobs_then_rows_and_skips_unknown_urls() {
    let fx = fixture();
    let storage = RecordingStorage::default();
    let images = ImageService::new(
        SqliteImageRepository::try_new(&fx.conn).unwrap(),
        &storage,
        ImagePolicy::default(),
    );
    let attached = images
        .attach_images(
            &fx.owner,
            fx.entry_id,
            &[png("a.png", 64), png("b.png", 64)],
        )
        .unwrap();

    let removed = images
        .delete_images(
            &fx.owner,
            fx.entry_id,
            &[
                attached[0].image_url.clone(),
                "https://blobs.test/elsewhere.png".to_string(),
            ],
        )
        .unwrap();

    assert_eq!(removed, 1);
    assert_eq!(
        storage.calls().last(),
        Some(&StorageCall::Delete(attached[0].image_url.clone()))
    );
    let remaining = images.list_images(&fx.owner, fx.entry_id).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].image_url, attached[1].image_url);
}

#[test]
fn strangers_cannot_touch_images() {
    let fx = fixture();
    let storage = RecordingStorage::default();
    let images = ImageService::new(
        SqliteImageRepository::try_new(&fx.conn).unwrap(),
        &storage,
        ImagePolicy::default(),
    );

    let err = images
        .attach_images(&fx.stranger, fx.entry_id, &[png("a.png", 64)])
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
    assert!(matches!(
        images.list_images(&fx.stranger, fx.entry_id).unwrap_err(),
        ServiceError::NotFound { .. }
    ));
    assert!(storage.calls().is_empty());
}

#[test]
fn deleting_entries_journals_and_accounts_reports_orphaned_urls() {
    let fx = fixture();
    let storage = RecordingStorage::default();
    let images = ImageService::new(
        SqliteImageRepository::try_new(&fx.conn).unwrap(),
        &storage,
        ImagePolicy::default(),
    );
    let entries = EntryService::new(SqliteEntryRepository::try_new(&fx.conn).unwrap());
    let journals = JournalService::new(SqliteJournalRepository::try_new(&fx.conn).unwrap());

    let first = images
        .attach_images(&fx.owner, fx.entry_id, &[png("a.png", 64)])
        .unwrap();
    let deletion = entries.delete_entry(&fx.owner, fx.entry_id).unwrap();
    assert_eq!(deletion.orphaned_image_urls, vec![first[0].image_url.clone()]);
    assert_eq!(image_rows(&fx.conn), 0);

    let second_entry = entries
        .create_entry(
            &fx.owner,
            fx.journal_id,
            CreateEntryRequest {
                title: Some("Harbour".to_string()),
                content: Some("More photos.".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
        .entry_id;
    let second = images
        .attach_images(&fx.owner, second_entry, &[png("b.png", 64)])
        .unwrap();
    let deletion = journals.delete_journal(&fx.owner, fx.journal_id).unwrap();
    assert_eq!(deletion.orphaned_image_urls, vec![second[0].image_url.clone()]);

    let journal_id = journals
        .create_journal(
            &fx.owner,
            CreateJournalRequest {
                title: Some("Again".to_string()),
                description: None,
            },
        )
        .unwrap()
        .journal
        .uuid;
    let third_entry = entries
        .create_entry(
            &fx.owner,
            journal_id,
            CreateEntryRequest {
                title: Some("Last".to_string()),
                content: Some("Final photo.".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
        .entry_id;
    let third = images
        .attach_images(&fx.owner, third_entry, &[png("c.png", 64)])
        .unwrap();
    let users = UserService::new(
        SqliteUserRepository::try_new(&fx.conn).unwrap(),
        NoCredentials,
    );
    let orphaned = users.delete_account(&fx.owner).unwrap();
    assert_eq!(orphaned, vec![third[0].image_url.clone()]);
    assert_eq!(image_rows(&fx.conn), 0);
}

struct NoCredentials;

impl innerblend_core::CredentialStore for NoCredentials {
    fn set_password(
        &self,
        _user_id: &str,
        _password: &str,
    ) -> Result<(), innerblend_core::CredentialError> {
        Ok(())
    }

    fn verify_password(
        &self,
        _user_id: &str,
        _password: &str,
    ) -> Result<bool, innerblend_core::CredentialError> {
        Ok(true)
    }
}
