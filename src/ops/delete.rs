//! Remove a leaf entry.

use tracing::instrument;

use crate::backend::Backend;
use crate::codec;
use crate::dn::Dn;
use crate::error::{Error, Result};

/// Delete the entry at `dn`.
///
/// First removes the sibling subtree directory (so a non-empty one aborts
/// the whole operation before anything is unlinked), then the entry file
/// itself. Acquires the exclusive side of the backend's gate.
#[instrument(skip(backend), fields(dn = %dn))]
pub fn delete(backend: &Backend, dn: &Dn) -> Result<()> {
    let _guard = backend.gate.write();

    let path = codec::encode(&backend.base_dir, &backend.suffix, dn);
    let (entry_file, subtree_dir) = codec::sibling_pair(&path);

    if let Err(err) = std::fs::remove_dir(&subtree_dir) {
        if let Some(mapped) = Error::from_rmdir(&subtree_dir, err) {
            return Err(mapped);
        }
    }

    std::fs::remove_file(&entry_file).map_err(|e| Error::from_unlink(&entry_file, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::entry::Entry;
    use crate::ops::{add, get_entry};
    use tempfile::TempDir;

    fn backend_with_suffix() -> (TempDir, Backend) {
        let dir = TempDir::new().unwrap();
        let config = Config::from_directory(dir.path().to_path_buf()).unwrap();
        let suffix = Dn::parse("dc=example,dc=com");
        let backend = Backend::open(config, suffix).unwrap();
        let mut entry = Entry::new("dc=example,dc=com".into(), Dn::parse("dc=example,dc=com"));
        entry.add_value("objectClass", "domain".into());
        entry.add_value("dc", "example".into());
        add(&backend, entry).unwrap();
        (dir, backend)
    }

    #[test]
    fn delete_leaf_entry_succeeds() {
        let (_dir, backend) = backend_with_suffix();
        let dn = Dn::parse("dc=example,dc=com");
        delete(&backend, &dn).unwrap();
        assert!(matches!(get_entry(&backend, &dn), Err(Error::NoSuchObject)));
    }

    #[test]
    fn delete_non_leaf_fails() {
        let (_dir, backend) = backend_with_suffix();
        let mut child = Entry::new("cn=alice,dc=example,dc=com".into(), Dn::parse("cn=alice,dc=example,dc=com"));
        child.add_value("objectClass", "person".into());
        child.add_value("cn", "alice".into());
        add(&backend, child).unwrap();

        let dn = Dn::parse("dc=example,dc=com");
        let result = delete(&backend, &dn);
        assert!(matches!(result, Err(Error::NotAllowedOnNonLeaf)));
    }

    #[test]
    fn delete_missing_entry_fails() {
        let (_dir, backend) = backend_with_suffix();
        let dn = Dn::parse("cn=nobody,dc=example,dc=com");
        assert!(matches!(delete(&backend, &dn), Err(Error::NoSuchObject)));
    }
}
