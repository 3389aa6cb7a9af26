//! This module is responsible for reading and appending to the CSV store files.
//!
//! A store file is an append-only log of records with the header `Date,Amount,Category,Note`.
//! Every write for one store goes through that store's lock, so concurrent appends from the same
//! process are serialized and none are lost.

mod users;

pub use users::{Username, MAX_USERNAME_CHARS};

use crate::error::ErrorType;
use crate::model::{Record, Records, HEADERS};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, trace};
use users::Users;

/// The store file of the single-user variant.
pub const SHARED_STORE: &str = "data.csv";

/// Whose records are being addressed.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Owner {
    /// The one store of the single-user variant.
    Shared,
    /// A named user's store in the multi-user variant.
    User(Username),
}

impl Owner {
    /// The name offered for a CSV download of this owner's records.
    pub fn export_file_name(&self) -> String {
        match self {
            Owner::Shared => "expenses.csv".to_string(),
            Owner::User(name) => format!("{name}_expenses.csv"),
        }
    }
}

impl Display for Owner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Owner::Shared => f.write_str("shared"),
            Owner::User(name) => write!(f, "user '{name}'"),
        }
    }
}

/// Raised when a store file does not match the expected schema.
#[derive(Debug)]
pub struct SchemaError {
    path: PathBuf,
    detail: String,
}

impl SchemaError {
    fn new(path: &Path, detail: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.detail)
    }
}

impl std::error::Error for SchemaError {}

/// Chooses the public error type for a store failure: `Parse` when the file contents were at
/// fault, `Store` for everything else.
pub(crate) fn error_type(e: &anyhow::Error) -> ErrorType {
    if e.chain().any(|c| c.is::<SchemaError>()) {
        ErrorType::Parse
    } else {
        ErrorType::Store
    }
}

/// The part of a schema error that names the row and the problem but not the file.
pub(crate) fn schema_detail(e: &anyhow::Error) -> Option<&str> {
    e.chain()
        .find_map(|c| c.downcast_ref::<SchemaError>())
        .map(|s| s.detail.as_str())
}

/// Creates an empty store file holding only the header row, unless a file already exists.
pub async fn ensure_store(path: &Path) -> Result<()> {
    if tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("Unable to check for store file {}", path.display()))?
    {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        crate::utils::make_dir(parent).await?;
    }
    let header = format!("{}\n", HEADERS.join(","));
    crate::utils::write(path, header).await?;
    debug!("Created empty store at {}", path.display());
    Ok(())
}

/// Parses every record in the store file.
pub async fn load_all(path: &Path) -> Result<Records> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Unable to read store file {}", path.display()))?;
    parse(path, &bytes)
}

fn parse(path: &Path, bytes: &[u8]) -> Result<Records> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(bytes);
    let headers = rdr
        .headers()
        .map_err(|e| SchemaError::new(path, format!("unreadable header: {e}")))?
        .clone();
    check_headers(path, headers.iter())?;

    let mut records = Records::default();
    for (ix, result) in rdr.deserialize::<Record>().enumerate() {
        // Row 1 is the header
        let record =
            result.map_err(|e| SchemaError::new(path, format!("row {}: {e}", ix + 2)))?;
        records.push(record);
    }
    trace!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn check_headers<'a>(path: &Path, found: impl Iterator<Item = &'a str>) -> Result<()> {
    let found: Vec<&str> = found.collect();
    if found != HEADERS {
        return Err(SchemaError::new(
            path,
            format!(
                "expected columns '{}' but found '{}'",
                HEADERS.join(","),
                found.join(",")
            ),
        )
        .into());
    }
    Ok(())
}

/// Appends one record to the end of the store file.
///
/// The header is checked first and nothing is written if it does not match. If the file does not
/// end in a newline, e.g. after an interrupted write, one is added so the record starts its own
/// row.
pub async fn append(path: &Path, record: &Record) -> Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .read(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("Unable to open store file {}", path.display()))?;

    let mut first_line = String::new();
    BufReader::new(&mut file)
        .read_line(&mut first_line)
        .await
        .with_context(|| format!("Unable to read header of {}", path.display()))?;
    // Read through csv so that quoting and a leading BOM are handled the same as in `load_all`
    let mut header = csv::ReaderBuilder::new().from_reader(first_line.as_bytes());
    let found = header
        .headers()
        .map_err(|e| SchemaError::new(path, format!("unreadable header: {e}")))?;
    check_headers(path, found.iter())?;

    let mut row = Vec::new();
    if !ends_with_newline(&mut file).await? {
        row.push(b'\n');
    }
    row.extend(serialize_row(record)?);

    file.write_all(&row)
        .await
        .with_context(|| format!("Unable to append to {}", path.display()))?;
    file.flush()
        .await
        .with_context(|| format!("Unable to flush {}", path.display()))?;
    Ok(())
}

async fn ends_with_newline(file: &mut tokio::fs::File) -> Result<bool> {
    let len = file.metadata().await.context("Unable to stat store file")?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(std::io::SeekFrom::End(-1))
        .await
        .context("Unable to seek in store file")?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)
        .await
        .context("Unable to read store file")?;
    Ok(last[0] == b'\n')
}

fn serialize_row(record: &Record) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.serialize(record).context("Unable to serialize record")?;
    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to serialize record: {}", e.error()))
}

/// Renders records as CSV text with the header row, in the order given.
pub fn to_csv<'a>(records: impl IntoIterator<Item = &'a Record>) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    // Written explicitly so that an empty export still has a header
    wtr.write_record(HEADERS).context("Unable to write CSV header")?;
    for record in records {
        wtr.serialize(record).context("Unable to serialize record")?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to write CSV: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}

/// A handle on one store file. Clones share the same lock.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl Store {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads a snapshot of all records.
    pub async fn load_all(&self) -> Result<Records> {
        let _guard = self.lock.lock().await;
        load_all(&self.path).await
    }

    /// Appends `record`, holding the store's single-writer lock for the duration.
    pub async fn append(&self, record: &Record) -> Result<()> {
        let _guard = self.lock.lock().await;
        append(&self.path, record).await?;
        debug!("Appended record to {}", self.path.display());
        Ok(())
    }
}

/// Resolves owners to their store files and hands out `Store` handles. There should be one
/// `Stores` per process so that every handle on a file shares one lock.
#[derive(Debug, Clone)]
pub struct Stores {
    dir: PathBuf,
    users: Users,
    open: Arc<std::sync::Mutex<HashMap<PathBuf, Store>>>,
}

impl Stores {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let dir = data_dir.into();
        Self {
            users: Users::new(&dir),
            dir,
            open: Arc::new(std::sync::Mutex::new(HashMap::new())),
        }
    }

    /// Returns the store for `owner`, creating the file if this is its first use.
    pub async fn open(&self, owner: &Owner) -> Result<Store> {
        let path = self.path_for(owner).await?;
        let store = {
            let mut open = self
                .open
                .lock()
                .map_err(|_| anyhow::anyhow!("The store registry lock was poisoned"))?;
            open.entry(path.clone())
                .or_insert_with(|| Store {
                    path,
                    lock: Arc::new(Mutex::new(())),
                })
                .clone()
        };
        {
            let _guard = store.lock.lock().await;
            ensure_store(&store.path).await?;
        }
        Ok(store)
    }

    async fn path_for(&self, owner: &Owner) -> Result<PathBuf> {
        Ok(match owner {
            Owner::Shared => self.dir.join(SHARED_STORE),
            Owner::User(name) => {
                let key = self.users.key_for(name).await?;
                self.dir.join(format!("data_{key}.csv"))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, Category, DATE_FORMAT};
    use chrono::NaiveDateTime;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn record(date: &str, amount: &str, category: Category, note: &str) -> Record {
        Record::new(
            NaiveDateTime::parse_from_str(date, DATE_FORMAT).unwrap(),
            Amount::from_str(amount).unwrap(),
            category,
            note,
        )
    }

    #[tokio::test]
    async fn test_ensure_store_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data.csv");
        ensure_store(&path).await.unwrap();
        assert_eq!(
            tokio::fs::read_to_string(&path).await.unwrap(),
            "Date,Amount,Category,Note\n"
        );
        let r = record("2024-01-05 10:00", "100", Category::Food, "");
        append(&path, &r).await.unwrap();
        ensure_store(&path).await.unwrap();
        assert_eq!(load_all(&path).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_append_then_reload_keeps_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        ensure_store(&path).await.unwrap();
        let a = record("2024-01-05 10:00", "100", Category::Food, "");
        let b = record("2024-01-20 09:00", "50", Category::Travel, "train, return");
        append(&path, &a).await.unwrap();
        let before = load_all(&path).await.unwrap();
        append(&path, &b).await.unwrap();
        let after = load_all(&path).await.unwrap();

        let mut expected = before.clone();
        expected.push(b);
        assert_eq!(after, expected);
        assert_eq!(after.data()[1].note(), "train, return");
    }

    #[tokio::test]
    async fn test_file_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        ensure_store(&path).await.unwrap();
        append(&path, &record("2024-02-01 08:00", "30.50", Category::Fun, "film"))
            .await
            .unwrap();
        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(text, "Date,Amount,Category,Note\n2024-02-01 08:00,30.5,🎉 Fun,film\n");
    }

    #[tokio::test]
    async fn test_load_file_written_by_older_tool() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        let text = "Date,Amount,Category,Note\n\
                    2024-01-05 10:00,100,🍜 Food,\n\
                    2024-01-06 11:30,25.0,📌 Other,gift 🎁\n";
        tokio::fs::write(&path, text).await.unwrap();
        let records = load_all(&path).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.data()[0].note(), "");
        assert_eq!(records.data()[1].category(), Category::Other);
        assert_eq!(records.data()[1].amount().to_string(), "25");
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        tokio::fs::write(&path, "When,How much\n2024-01-01 00:00,3\n")
            .await
            .unwrap();
        let e = load_all(&path).await.unwrap_err();
        assert_eq!(error_type(&e), ErrorType::Parse);

        let r = record("2024-01-05 10:00", "100", Category::Food, "");
        let e = append(&path, &r).await.unwrap_err();
        assert_eq!(error_type(&e), ErrorType::Parse);
        assert_eq!(
            tokio::fs::read_to_string(&path).await.unwrap(),
            "When,How much\n2024-01-01 00:00,3\n"
        );
    }

    #[tokio::test]
    async fn test_malformed_row_names_the_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        let text = "Date,Amount,Category,Note\n\
                    2024-01-05 10:00,100,🍜 Food,\n\
                    2024-01-06 11:30,lots,🍜 Food,\n";
        tokio::fs::write(&path, text).await.unwrap();
        let e = load_all(&path).await.unwrap_err();
        assert_eq!(error_type(&e), ErrorType::Parse);
        assert!(e.to_string().contains("row 3"), "{e}");
    }

    #[tokio::test]
    async fn test_non_numeric_and_oversized_amounts_are_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        for amount in ["abc5", "\"1,2,3\"", "79228162514264337593543950335"] {
            let text = format!("Date,Amount,Category,Note\n2024-01-05 10:00,{amount},🍜 Food,\n");
            tokio::fs::write(&path, text).await.unwrap();
            let e = load_all(&path).await.unwrap_err();
            assert_eq!(error_type(&e), ErrorType::Parse, "{amount}");
            assert!(e.to_string().contains("row 2"), "{e}");
        }
    }

    #[tokio::test]
    async fn test_append_to_file_with_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        tokio::fs::write(
            &path,
            "\u{feff}Date,Amount,Category,Note\n2024-01-05 10:00,100,🍜 Food,\n",
        )
        .await
        .unwrap();
        append(&path, &record("2024-01-06 10:00", "5", Category::Fun, ""))
            .await
            .unwrap();
        let records = load_all(&path).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.data()[1].category(), Category::Fun);
    }

    #[tokio::test]
    async fn test_missing_file_is_store_error() {
        let dir = TempDir::new().unwrap();
        let e = load_all(&dir.path().join("nope.csv")).await.unwrap_err();
        assert_eq!(error_type(&e), ErrorType::Store);
    }

    #[tokio::test]
    async fn test_append_after_truncated_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        tokio::fs::write(&path, "Date,Amount,Category,Note\n2024-01-05 10:00,100,🍜 Food,")
            .await
            .unwrap();
        append(&path, &record("2024-01-06 10:00", "5", Category::Fun, ""))
            .await
            .unwrap();
        let records = load_all(&path).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_to_csv_has_header_when_empty() {
        assert_eq!(
            to_csv(Records::default().iter()).unwrap(),
            "Date,Amount,Category,Note\n"
        );
    }

    #[tokio::test]
    async fn test_stores_use_opaque_file_names() {
        let dir = TempDir::new().unwrap();
        let stores = Stores::new(dir.path());
        let shared = stores.open(&Owner::Shared).await.unwrap();
        assert_eq!(shared.path(), dir.path().join("data.csv"));

        let sneaky = Owner::User(Username::new("../outside").unwrap());
        let store = stores.open(&sneaky).await.unwrap();
        assert_eq!(store.path().parent().unwrap(), dir.path());
        let name = store.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("data_") && name.ends_with(".csv"));
        assert!(!name.contains("outside"));
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let stores = Stores::new(dir.path());
        let owner = Owner::User(Username::new("alice").unwrap());

        let mut tasks = Vec::new();
        for i in 1..=20 {
            let stores = stores.clone();
            let owner = owner.clone();
            tasks.push(tokio::spawn(async move {
                let store = stores.open(&owner).await.unwrap();
                let r = record("2024-01-05 10:00", &i.to_string(), Category::Food, "");
                store.append(&r).await.unwrap();
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        let store = stores.open(&owner).await.unwrap();
        let records = store.load_all().await.unwrap();
        assert_eq!(records.len(), 20);
    }
}
