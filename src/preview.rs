use std::collections::BTreeSet;

use crate::error::{Result, RosterError};
use crate::models::StudentRecord;
use crate::validator::Validated;

/// Where the previewed records came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub checksum: String,
}

/// What would be imported, between decode and commit. Owned by a single
/// import session and never persisted.
#[derive(Debug, Default)]
pub struct PreviewState {
    source: Option<SourceFile>,
    records: Vec<StudentRecord>,
    invalid_indices: BTreeSet<usize>,
    committing: bool,
}

impl PreviewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole preview with a freshly validated file.
    pub fn load(&mut self, source: SourceFile, validated: Validated) {
        *self = Self {
            source: Some(source),
            records: validated.records,
            invalid_indices: validated.invalid_indices,
            committing: false,
        };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn source(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn invalid_indices(&self) -> &BTreeSet<usize> {
        &self.invalid_indices
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_committing(&self) -> bool {
        self.committing
    }

    pub fn can_commit(&self) -> bool {
        !self.is_committing() && !self.is_empty() && self.invalid_indices.is_empty()
    }

    /// Claim the preview for a commit. At most one commit may hold it.
    pub fn begin_commit(&mut self) -> Result<()> {
        if self.committing {
            return Err(RosterError::CommitInProgress);
        }
        if !self.invalid_indices.is_empty() {
            return Err(RosterError::CommitBlocked {
                invalid: self.invalid_indices.len(),
            });
        }
        if self.is_empty() {
            return Err(RosterError::NothingToImport);
        }
        self.committing = true;
        Ok(())
    }

    /// Release the commit claim. A full success clears the preview; a failure
    /// leaves the records loaded so the user can retry.
    pub fn finish_commit(&mut self, success: bool) {
        if success {
            self.reset();
        } else {
            self.committing = false;
        }
    }
}
