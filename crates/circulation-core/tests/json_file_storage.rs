use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use circulation_core::{
    CirculationError, JsonFileStore, Library, LibraryConfig, LoadStatus, ManualClock, NewItem,
    StateStore,
};

struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be available")
            .as_nanos();
        let filename = format!("{}_{}_{}.json", prefix, std::process::id(), nanos);
        let path = std::env::temp_dir().join(filename);
        Self { path }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
}

#[test]
fn test_state_survives_reopen() {
    let temp = TempFile::new("circulation_reopen");

    let (item_id, member_id, due) = {
        let mut library = Library::open(JsonFileStore::new(&temp.path), clock())
            .expect("open should succeed");
        assert_eq!(library.load_status(), &LoadStatus::Fresh);

        let item = library
            .add_item(NewItem::new("Python Crash Course", "Eric Matthes", "978-1593279285").with_copies(3))
            .unwrap();
        let member = library
            .register_member("Alice Johnson", "alice@example.com")
            .unwrap();
        library.lend_default(member.id, item.id).unwrap();
        library.clock().advance(Duration::days(1));
        let other = library.add_item(NewItem::new("Clean Code", "Robert Martin", "978-0132350886")).unwrap();
        library.lend(member.id, other.id, 1).unwrap();
        library.clock().advance(Duration::days(3));
        library.return_item(member.id, other.id).unwrap();
        library.pay_fine(member.id, Decimal::new(50, 2)).unwrap();

        let due = library.loan_record(item.id).unwrap().due_date;
        (item.id, member.id, due)
    };

    let library = Library::open(JsonFileStore::new(&temp.path), clock())
        .expect("reopen should succeed");
    assert_eq!(library.load_status(), &LoadStatus::Restored);

    let item = library.item(item_id).unwrap();
    assert_eq!(item.available_copies, 2);
    assert_eq!(item.holders, vec![member_id]);

    let member = library.member(member_id).unwrap();
    assert_eq!(member.borrowed, vec![item_id]);
    assert_eq!(member.fine_balance, Decimal::new(150, 2));

    let record = library.loan_record(item_id).unwrap();
    assert_eq!(record.member_id, member_id);
    assert_eq!(record.due_date, due);

    assert_eq!(library.state().next_item_id, 3);
    assert_eq!(library.state().next_member_id, 2);
}

#[test]
fn test_round_trip_reproduces_equivalent_state() {
    let temp = TempFile::new("circulation_round_trip");
    let store = JsonFileStore::new(&temp.path);

    let mut library = Library::open(store.clone(), clock()).unwrap();
    let a = library.add_item(NewItem::new("A", "Auth", "1").with_copies(2)).unwrap();
    let b = library.add_item(NewItem::new("B", "Auth", "2")).unwrap();
    let m1 = library.register_member("One", "1@example.com").unwrap();
    let m2 = library.register_member("Two", "2@example.com").unwrap();
    library.lend(m1.id, a.id, 5).unwrap();
    library.lend(m2.id, a.id, 9).unwrap();
    library.lend(m2.id, b.id, 2).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.status, LoadStatus::Restored);
    assert_eq!(&reloaded.state, library.state());
}

#[test]
fn test_document_shape() {
    let temp = TempFile::new("circulation_shape");
    let mut library = Library::open(JsonFileStore::new(&temp.path), clock()).unwrap();
    let item = library.add_item(NewItem::new("Book A", "Auth", "ISBN1")).unwrap();
    let member = library.register_member("M", "m@example.com").unwrap();
    library.lend(member.id, item.id, 14).unwrap();

    let raw = fs::read_to_string(&temp.path).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(doc["next_item_id"], 2);
    assert_eq!(doc["next_member_id"], 2);
    assert_eq!(doc["items"]["1"]["title"], "Book A");
    assert_eq!(doc["items"]["1"]["available_copies"], 0);
    assert_eq!(doc["items"]["1"]["holders"], serde_json::json!([1]));
    assert_eq!(doc["members"]["1"]["borrowed"], serde_json::json!([1]));
    assert_eq!(doc["loan_records"]["1"]["member_id"], 1);

    let due = doc["loan_records"]["1"]["due_date"]
        .as_str()
        .expect("due date should be a string");
    let parsed = chrono::DateTime::parse_from_rfc3339(due).expect("due date should be ISO-8601");
    assert_eq!(
        parsed.with_timezone(&Utc),
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    );
}

#[test]
fn test_corrupt_file_degrades_to_empty_and_is_kept_aside() {
    let temp = TempFile::new("circulation_corrupt");
    fs::write(&temp.path, b"{\"items\": [1, 2, 3").unwrap();

    let mut library = Library::open(JsonFileStore::new(&temp.path), clock())
        .expect("corrupt data should not be fatal");

    assert!(library.state().is_empty());
    let quarantined = match library.load_status() {
        LoadStatus::Recovered { quarantined, .. } => quarantined.clone(),
        other => panic!("unexpected status: {:?}", other),
    };
    let quarantined = quarantined.expect("corrupt file should be moved aside");
    assert_eq!(fs::read(&quarantined).unwrap(), b"{\"items\": [1, 2, 3");

    // A new start writes a fresh document without touching the quarantined one.
    library.register_member("M", "m@example.com").unwrap();
    assert!(temp.path.exists());
    assert!(quarantined.exists());
    let _ = fs::remove_file(quarantined);
}

#[test]
fn test_inconsistent_document_is_rejected() {
    let temp = TempFile::new("circulation_inconsistent");
    let doc = serde_json::json!({
        "items": {
            "1": {
                "id": 1, "title": "T", "author": "A", "code": "C",
                "total_copies": 1, "available_copies": 0, "holders": [7]
            }
        },
        "members": {},
        "next_item_id": 2,
        "next_member_id": 1,
        "loan_records": {}
    });
    fs::write(&temp.path, serde_json::to_vec(&doc).unwrap()).unwrap();

    let library = Library::open(JsonFileStore::new(&temp.path), clock()).unwrap();

    assert!(library.load_status().is_data_loss());
    assert!(library.state().is_empty());
    if let LoadStatus::Recovered {
        quarantined: Some(path),
        ..
    } = library.load_status()
    {
        let _ = fs::remove_file(path);
    }
}

#[test]
fn test_save_into_missing_directory_creates_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("library.json");
    let mut library = Library::open(JsonFileStore::new(&path), clock()).unwrap();

    library.add_item(NewItem::new("T", "A", "C")).unwrap();

    assert!(path.exists());
}

#[test]
fn test_unwritable_location_reports_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where a directory is expected.
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"").unwrap();
    let path = blocker.join("library.json");

    let mut library = Library::open(JsonFileStore::new(&path), clock()).unwrap();
    assert_eq!(library.load_status(), &LoadStatus::Fresh);
    assert!(!library.load_status().is_data_loss());

    let result = library.register_member("M", "m@example.com");

    assert!(matches!(result, Err(CirculationError::Persistence(_))));
    assert_eq!(library.state().members.len(), 1);
    assert_eq!(fs::read(&blocker).unwrap(), b"");
}

#[test]
fn test_open_with_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = LibraryConfig {
        fine_per_day: Decimal::new(25, 2),
        default_loan_days: 21,
        ..LibraryConfig::default()
    }
    .with_data_path(dir.path().join("library.json"));

    let mut library = Library::open_with_config(&config).unwrap();
    let item = library.add_item(NewItem::new("T", "A", "C")).unwrap();
    let member = library.register_member("M", "m@example.com").unwrap();
    library.lend_default(member.id, item.id).unwrap();

    let record = library.loan_record(item.id).unwrap();
    let days = (record.due_date - Utc::now()).num_days();
    assert!((20..=21).contains(&days));
    assert_eq!(library.fee_policy().rate_per_day, Decimal::new(25, 2));
}
