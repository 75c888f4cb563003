use crate::notes::NoteStore;
use crate::store::fs_backend::FsBackend;
use crate::store::kv::KvRepository;
use crate::store::FileRepository;
use std::path::PathBuf;
use tempfile::TempDir;

/// A file-backed store in a throwaway directory.
pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub store: NoteStore<FileRepository>,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let store = NoteStore::open(KvRepository::with_backend(FsBackend::new(root.clone())))
            .expect("failed to open store");
        Self {
            _temp_dir: temp_dir,
            store,
            root,
        }
    }

    /// Drops the in-memory state and loads everything back from disk,
    /// as a new session would.
    pub fn reopen(self) -> Self {
        let repo = self.store.into_repository();
        Self {
            _temp_dir: self._temp_dir,
            store: NoteStore::open(repo).expect("failed to reopen store"),
            root: self.root,
        }
    }
}
