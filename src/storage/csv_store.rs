//! CSV file store
//!
//! Rows are comma separated and terminated by a bare carriage return. The
//! file is only ever opened in append mode for writing, and every append is
//! flushed and synced before returning.
//!
//! The watermark lives in a sidecar file (`<name>.watermark`) that is
//! replaced atomically after each append.

use crate::dedup::Fingerprint;
use crate::record::AnnouncementRecord;
use crate::storage::traits::Store;
use crate::{StorageError, StorageResult};
use csv::{ReaderBuilder, Terminator, WriterBuilder};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Column order of the output file
pub const HEADER: [&str; 3] = ["title", "link", "date"];

const ROW_TERMINATOR: u8 = b'\r';

/// Append-only CSV store backed by a single file
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Creates a store handle; nothing touches the filesystem until used
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar file holding the watermark fingerprint
    pub fn watermark_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".watermark");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> StorageError {
        StorageError::Csv {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// Current length of the file; zero when it does not exist
    fn current_len(&self) -> StorageResult<u64> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// True if the file is missing or has zero length
    fn is_blank(&self) -> StorageResult<bool> {
        Ok(self.current_len()? == 0)
    }

    /// Writes the rows, prefixed by the header when the file is blank
    ///
    /// On any failure the file is cut back to its previous length, so a
    /// retried append never leaves a partial or duplicated batch behind.
    fn write_rows(&self, records: &[AnnouncementRecord]) -> StorageResult<()> {
        let start = self.current_len()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        let written = self
            .write_into(&file, records, start == 0)
            .and_then(|()| file.sync_all().map_err(|e| self.io_error(e)));

        if let Err(e) = written {
            self.rollback(&file, start);
            return Err(e);
        }
        Ok(())
    }

    fn write_into<W: Write>(
        &self,
        out: W,
        records: &[AnnouncementRecord],
        with_header: bool,
    ) -> StorageResult<()> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(ROW_TERMINATOR))
            .from_writer(out);

        if with_header {
            writer
                .write_record(HEADER)
                .map_err(|e| self.csv_error(e))?;
        }

        for record in records {
            let date = record.date_string();
            writer
                .write_record([record.title.as_str(), record.link.as_str(), date.as_str()])
                .map_err(|e| self.csv_error(e))?;
        }

        writer.flush().map_err(|e| self.io_error(e))
    }

    /// Cuts the file back to `len` after a failed append
    fn rollback(&self, file: &File, len: u64) {
        match file.set_len(len).and_then(|()| file.sync_all()) {
            Ok(()) => tracing::debug!("Rolled {} back to {} bytes", self.path.display(), len),
            Err(e) => tracing::warn!(
                "Could not roll {} back to {} bytes, a retry may repeat rows: {}",
                self.path.display(),
                len,
                e
            ),
        }
    }

    /// Opens a reader positioned after a validated header
    ///
    /// Returns None for a missing or empty file.
    fn reader(&self) -> StorageResult<Option<csv::Reader<File>>> {
        if self.is_blank()? {
            return Ok(None);
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .terminator(Terminator::Any(ROW_TERMINATOR))
            .from_path(&self.path)
            .map_err(|e| self.csv_error(e))?;

        let headers = reader.headers().map_err(|e| self.csv_error(e))?;
        if headers.iter().ne(HEADER.iter().copied()) {
            return Err(StorageError::BadHeader {
                path: self.path.display().to_string(),
                found: headers.iter().collect::<Vec<_>>().join(","),
            });
        }

        Ok(Some(reader))
    }
}

impl Store for CsvStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn ensure_exists(&mut self) -> StorageResult<()> {
        if self.is_blank()? {
            tracing::info!("Creating store {}", self.path.display());
            self.write_rows(&[])
        } else {
            // Refuse to append to a file that is not one of ours
            self.reader().map(|_| ())
        }
    }

    fn append(&mut self, records: &[AnnouncementRecord]) -> StorageResult<()> {
        self.write_rows(records)
    }

    fn save_watermark(&mut self, fingerprint: &Fingerprint) -> StorageResult<()> {
        let target = self.watermark_path();
        let mut staging = target.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        let io_error = |source: std::io::Error| StorageError::Io {
            path: target.display().to_string(),
            source,
        };

        let mut file = File::create(&staging).map_err(io_error)?;
        file.write_all(fingerprint.as_str().as_bytes())
            .map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        fs::rename(&staging, &target).map_err(io_error)?;

        Ok(())
    }

    fn load_watermark(&self) -> StorageResult<Option<Fingerprint>> {
        let path = self.watermark_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        let fingerprint = Fingerprint::from_hex(&content);
        if fingerprint.is_none() {
            tracing::warn!("Ignoring unreadable watermark file {}", path.display());
        }
        Ok(fingerprint)
    }

    fn count_records(&self) -> StorageResult<u64> {
        let Some(mut reader) = self.reader()? else {
            return Ok(0);
        };

        let mut count = 0;
        for row in reader.records() {
            row.map_err(|e| self.csv_error(e))?;
            count += 1;
        }
        Ok(count)
    }
}
