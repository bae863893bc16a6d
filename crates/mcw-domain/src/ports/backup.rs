//! Namespace archival port.

use async_trait::async_trait;

use crate::error::Result;
use crate::ops::{BackupDescriptor, RestoreReport};
use crate::value_objects::Namespace;

/// Archives and restores whole namespace subtrees.
///
/// Archives are tarballs of the namespace's table directories plus a
/// manifest (schema version, item counts, timestamp).
#[async_trait]
pub trait NamespaceArchiver: Send + Sync {
    /// Archive a namespace. Returns the archive descriptor.
    async fn backup_namespace(&self, namespace: &Namespace) -> Result<BackupDescriptor>;

    /// Replace a namespace's contents from an archive.
    async fn restore_namespace(&self, namespace: &Namespace, archive: &str)
        -> Result<RestoreReport>;

    /// Enumerate available archives, newest first.
    async fn list_backups(&self) -> Result<Vec<BackupDescriptor>>;
}
