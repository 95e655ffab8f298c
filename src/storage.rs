use std::fmt::{Display, Formatter};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use log::warn;

use crate::domain::{Journal, JournalHeader, LogRecord};

const LOGS_MARKER: &str = "\n=== LOGS ===\n";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    TomlDecode(toml::de::Error),
    TomlEncode(toml::ser::Error),
    JsonEncode(serde_json::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::TomlDecode(err) => write!(f, "failed to parse TOML header: {err}"),
            StorageError::TomlEncode(err) => write!(f, "failed to encode TOML header: {err}"),
            StorageError::JsonEncode(err) => write!(f, "failed to encode JSONL record: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

pub fn load_journal(path: &Path) -> Result<Journal, StorageError> {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Journal::new()),
        Err(err) => return Err(StorageError::Io(err)),
    };

    if raw.trim().is_empty() {
        return Ok(Journal::new());
    }

    let (header_blob, logs_blob) = if let Some((header, logs)) = raw.split_once(LOGS_MARKER) {
        (header, logs)
    } else {
        (raw.as_str(), "")
    };

    let header: JournalHeader = toml::from_str(header_blob).map_err(StorageError::TomlDecode)?;
    let mut journal = Journal {
        header,
        logs: Default::default(),
    };

    // A record that fails to parse degrades to "no log for that day"; the
    // dashboard must keep rendering from whatever is readable.
    for (line_number, line) in logs_blob.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LogRecord>(line) {
            Ok(record) => {
                journal.logs.insert(record.date, record);
            }
            Err(err) => {
                warn!(
                    "skipping malformed log record at {}:{}: {err}",
                    path.display(),
                    line_number + 1
                );
            }
        }
    }

    Ok(journal)
}

pub fn save_journal(path: &Path, journal: &Journal) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }
    }

    let header = toml::to_string_pretty(&journal.header).map_err(StorageError::TomlEncode)?;
    let mut file = fs::File::create(path).map_err(StorageError::Io)?;
    file.write_all(header.as_bytes()).map_err(StorageError::Io)?;
    file.write_all(LOGS_MARKER.as_bytes())
        .map_err(StorageError::Io)?;

    for record in journal.logs.values() {
        let line = serde_json::to_string(record).map_err(StorageError::JsonEncode)?;
        file.write_all(line.as_bytes()).map_err(StorageError::Io)?;
        file.write_all(b"\n").map_err(StorageError::Io)?;
    }

    Ok(())
}
