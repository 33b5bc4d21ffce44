use std::fmt;
use std::path::Path;

use crate::committer::{self, CommitOptions, CommitSummary, Progress};
use crate::decoder::{read_upload, Upload};
use crate::error::{DecodeError, RejectReason, Result, RosterError};
use crate::mapper::{map_rows, MapContext};
use crate::preview::{PreviewState, SourceFile};
use crate::store::{SqliteStore, StudentStore};
use crate::validator::{validate, RequiredField};

// ---------------------------------------------------------------------------
// Status channel
// ---------------------------------------------------------------------------

/// User-facing events raised while importing a file.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    FileRejected(RejectReason),
    DecodeFailed(DecodeError),
    ValidationWarning { invalid: usize, total: usize },
    Progress(Progress),
    CommitSucceeded { imported: usize, total: usize },
    CommitFailed { message: String },
}

impl Notice {
    /// The notice for an error the pipeline can raise, if it has one.
    pub fn for_error(err: &RosterError) -> Option<Self> {
        match err {
            RosterError::FileRejected(reason) => Some(Self::FileRejected(reason.clone())),
            RosterError::Decode(e) => Some(Self::DecodeFailed(e.clone())),
            RosterError::Connection(_) | RosterError::BatchInsert { .. } => Some(Self::CommitFailed {
                message: err.to_string(),
            }),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::FileRejected(_) | Self::DecodeFailed(_) | Self::CommitFailed { .. }
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileRejected(reason) => write!(f, "File rejected ({}): {reason}", reason.code()),
            Self::DecodeFailed(e) => write!(f, "Failed to read spreadsheet: {e}"),
            Self::ValidationWarning { invalid, total } => {
                let labels: Vec<&str> = RequiredField::ALL.iter().map(|r| r.label()).collect();
                write!(
                    f,
                    "{invalid} of {total} row(s) are missing required fields ({})",
                    labels.join(", ")
                )
            }
            Self::Progress(p) => write!(
                f,
                "Batch {}: imported {} of {}",
                p.batch_index + 1,
                p.imported,
                p.total
            ),
            Self::CommitSucceeded { imported, total } => write!(f, "Imported {imported} of {total}"),
            Self::CommitFailed { message } => f.write_str(message),
        }
    }
}

// ---------------------------------------------------------------------------
// ImportSession
// ---------------------------------------------------------------------------

/// One import flow: decode → map → validate → preview → commit.
pub struct ImportSession {
    preview: PreviewState,
    ctx: MapContext,
    max_upload_bytes: u64,
}

impl ImportSession {
    pub fn new(ctx: MapContext, max_upload_bytes: u64) -> Self {
        Self {
            preview: PreviewState::new(),
            ctx,
            max_upload_bytes,
        }
    }

    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    /// Read, decode and validate `path` into the preview. The previous
    /// preview is cleared first, so a rejected or unreadable file leaves
    /// nothing to commit.
    pub fn load_file(&mut self, path: &Path, notify: &mut dyn FnMut(Notice)) -> Result<()> {
        self.preview.reset();
        match read_upload(path, self.max_upload_bytes) {
            Ok(upload) => {
                self.load_upload(upload, notify);
                Ok(())
            }
            Err(e) => {
                if let Some(notice) = Notice::for_error(&e) {
                    notify(notice);
                }
                Err(e)
            }
        }
    }

    pub fn load_upload(&mut self, upload: Upload, notify: &mut dyn FnMut(Notice)) {
        tracing::debug!(
            file = %upload.file_name,
            kind = ?upload.kind,
            bytes = upload.size,
            "previewing upload"
        );
        let validated = validate(map_rows(&upload.rows, &self.ctx));
        if !validated.is_clean() {
            notify(Notice::ValidationWarning {
                invalid: validated.invalid_indices.len(),
                total: validated.records.len(),
            });
        }
        let source = SourceFile {
            name: upload.file_name,
            checksum: upload.checksum,
        };
        self.preview.load(source, validated);
    }

    pub fn commit(
        &mut self,
        store: &mut dyn StudentStore,
        options: CommitOptions,
        notify: &mut dyn FnMut(Notice),
    ) -> Result<CommitSummary> {
        let result = committer::commit(&mut self.preview, store, options, |p| notify(Notice::Progress(p)));
        match &result {
            Ok(summary) => notify(Notice::CommitSucceeded {
                imported: summary.imported,
                total: summary.total,
            }),
            Err(e) => {
                if let Some(notice) = Notice::for_error(e) {
                    notify(notice);
                }
            }
        }
        result
    }

    /// Refuse a file whose checksum is already in the import log.
    pub fn ensure_not_imported(&self, store: &SqliteStore) -> Result<()> {
        if let Some(source) = self.preview.source() {
            if store.has_import(&source.checksum)? {
                return Err(RosterError::DuplicateImport {
                    file: source.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Commit into SQLite and record the file in the import log once every
    /// batch has landed.
    pub fn commit_and_record(
        &mut self,
        store: &mut SqliteStore,
        options: CommitOptions,
        notify: &mut dyn FnMut(Notice),
    ) -> Result<CommitSummary> {
        let source = self.preview.source().cloned().unwrap_or_default();
        let summary = self.commit(store, options, notify)?;
        store.record_import(&source, summary.imported)?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DEFAULT_MAX_UPLOAD_BYTES;
    use crate::listing::{SortDirection, SortField};
    use std::collections::BTreeSet;

    fn session() -> ImportSession {
        let today = chrono::NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
        ImportSession::new(MapContext::new(today), DEFAULT_MAX_UPLOAD_BYTES)
    }

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    const WITH_MISSING_ID: &str = "Student ID,Name,Grade,Section\n\
                                   2024-0001,Juan Dela Cruz,12,A\n\
                                   ,Maria Santos,11,B\n";

    #[test]
    fn test_missing_student_id_blocks_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "students.csv", WITH_MISSING_ID);
        let mut s = session();
        let mut notices = Vec::new();
        s.load_file(&path, &mut |n| notices.push(n)).unwrap();

        assert_eq!(s.preview().records().len(), 2);
        assert_eq!(s.preview().invalid_indices(), &BTreeSet::from([1]));
        assert!(!s.preview().can_commit());
        assert_eq!(notices, vec![Notice::ValidationWarning { invalid: 1, total: 2 }]);
        assert!(notices[0].to_string().starts_with("1 of 2 row(s)"));
    }

    #[test]
    fn test_fixed_reupload_commits_in_one_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open(&dir.path().join("t.db")).unwrap();
        let mut s = session();
        let mut notices = Vec::new();
        s.load_file(&write(&dir, "bad.csv", WITH_MISSING_ID), &mut |n| notices.push(n))
            .unwrap();

        let fixed = write(
            &dir,
            "fixed.csv",
            "Student ID,Name,Grade,Section\n2024-0002,Maria Santos,11,B\n",
        );
        s.load_file(&fixed, &mut |n| notices.push(n)).unwrap();
        assert!(s.preview().invalid_indices().is_empty());
        assert!(s.preview().can_commit());

        notices.clear();
        let summary = s
            .commit_and_record(&mut store, CommitOptions::default(), &mut |n| notices.push(n))
            .unwrap();
        assert_eq!(summary.batches, 1);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[1].to_string(), "Imported 1 of 1");
        assert!(s.preview().is_empty());

        let rows = store.query(SortField::StudentId, SortDirection::Asc).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].student_id, "2024-0002");
        assert_eq!(rows[0].academic_year, "2024-2025");
        assert_eq!(store.import_count().unwrap(), 1);
    }

    #[test]
    fn test_rejected_file_clears_previous_preview() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session();
        let mut notices = Vec::new();
        s.load_file(&write(&dir, "ok.csv", WITH_MISSING_ID), &mut |n| notices.push(n))
            .unwrap();
        notices.clear();

        let pdf = write(&dir, "roster.pdf", "%PDF-1.4");
        let err = s.load_file(&pdf, &mut |n| notices.push(n)).unwrap_err();
        assert!(matches!(err, RosterError::FileRejected(_)));
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_failure());
        assert!(notices[0].to_string().contains("file-invalid-type"));
        assert!(s.preview().is_empty());
        assert!(s.preview().source().is_none());
        assert!(!s.preview().can_commit());
    }

    #[test]
    fn test_undecodable_file_clears_previous_preview() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session();
        let good = write(
            &dir,
            "good.csv",
            "Student ID,Name,Grade,Section\n2024-0001,Juan Dela Cruz,12,A\n",
        );
        s.load_file(&good, &mut |_| {}).unwrap();
        assert!(s.preview().can_commit());

        let empty = write(&dir, "empty.csv", "Student ID,Name,Grade,Section\n");
        let err = s.load_file(&empty, &mut |_| {}).unwrap_err();
        assert!(matches!(err, RosterError::Decode(DecodeError::EmptySheet)));
        assert!(s.preview().is_empty());
        assert!(s.preview().source().is_none());
        assert!(!s.preview().can_commit());

        let mut store = SqliteStore::open(&dir.path().join("t.db")).unwrap();
        let err = s.commit(&mut store, CommitOptions::default(), &mut |_| {}).unwrap_err();
        assert!(matches!(err, RosterError::NothingToImport));
        assert_eq!(store.student_count().unwrap(), 0);
    }

    #[test]
    fn test_empty_file_raises_decode_notice() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session();
        let mut notices = Vec::new();
        let path = write(&dir, "empty.csv", "Student ID,Name,Grade,Section\n");
        assert!(s.load_file(&path, &mut |n| notices.push(n)).is_err());
        assert_eq!(notices, vec![Notice::DecodeFailed(DecodeError::EmptySheet)]);
    }

    #[test]
    fn test_duplicate_file_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open(&dir.path().join("t.db")).unwrap();
        let path = write(
            &dir,
            "students.csv",
            "Student ID,Name,Grade,Section\n2024-0001,Juan Dela Cruz,12,A\n",
        );
        let mut s = session();
        s.load_file(&path, &mut |_| {}).unwrap();
        s.ensure_not_imported(&store).unwrap();
        s.commit_and_record(&mut store, CommitOptions::default(), &mut |_| {})
            .unwrap();

        s.load_file(&path, &mut |_| {}).unwrap();
        let err = s.ensure_not_imported(&store).unwrap_err();
        assert!(matches!(err, RosterError::DuplicateImport { ref file } if file == "students.csv"));
    }

    #[test]
    fn test_retry_against_stored_id_reports_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open(&dir.path().join("t.db")).unwrap();
        let mut s = session();
        let body = "Student ID,Name,Grade,Section\n2024-0001,Juan Dela Cruz,12,A\n";
        s.load_file(&write(&dir, "a.csv", body), &mut |_| {}).unwrap();
        s.commit(&mut store, CommitOptions::default(), &mut |_| {}).unwrap();

        s.load_file(&write(&dir, "a.csv", body), &mut |_| {}).unwrap();
        let mut notices = Vec::new();
        let err = s
            .commit(&mut store, CommitOptions::default(), &mut |n| notices.push(n))
            .unwrap_err();
        assert!(matches!(err, RosterError::BatchInsert { batch_index: 0, imported: 0, total: 1, .. }));
        let message = err.to_string();
        assert!(message.contains("UNIQUE"));
        assert!(!message.contains("Could not reach"));
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_failure());
        assert_eq!(store.student_count().unwrap(), 1);
    }

    #[test]
    fn test_store_rejection_is_reported_with_detail() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open(&dir.path().join("t.db")).unwrap();
        let mut s = session();
        let body = "Student ID,Name,Grade,Section\n2024-0001,Juan Dela Cruz,12,A\n";
        s.load_file(&write(&dir, "a.csv", body), &mut |_| {}).unwrap();
        s.commit(&mut store, CommitOptions::default(), &mut |_| {}).unwrap();

        s.load_file(&write(&dir, "b.csv", body), &mut |_| {}).unwrap();
        let options = CommitOptions { probe: false, ..Default::default() };
        let mut notices = Vec::new();
        let err = s.commit(&mut store, options, &mut |n| notices.push(n)).unwrap_err();
        assert!(matches!(err, RosterError::BatchInsert { batch_index: 0, imported: 0, .. }));
        let last = notices.last().unwrap();
        assert!(last.is_failure());
        assert!(last.to_string().contains("UNIQUE"));
        assert!(s.preview().can_commit());
    }
}
