use crate::artifacts::objects::entry_mode::EntryMode;
use bytes::Bytes;
use fake::rand;
use is_executable::IsExecutable;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 3] = [".hoard", ".", ".."];

/// The working copy: files as the user sees them on disk.
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn absolute(&self, file_path: &Path) -> PathBuf {
        self.path.join(file_path)
    }

    /// Express a user-supplied path relative to the workspace root.
    pub fn relativize(&self, file_path: &Path) -> anyhow::Result<PathBuf> {
        let absolute = if file_path.is_absolute() {
            file_path.to_path_buf()
        } else {
            std::env::current_dir()?.join(file_path)
        };
        let absolute = match absolute.canonicalize() {
            Ok(canonical) => canonical,
            // missing files keep their lexical form
            Err(_) => absolute,
        };

        absolute
            .strip_prefix(&self.path)
            .map(PathBuf::from)
            .map_err(|_| anyhow::anyhow!("{} is outside the repository", file_path.display()))
    }

    /// Lexical workspace-relative form of `file_path`.
    ///
    /// `.` components are dropped and `..` is resolved against the path
    /// itself. `None` when the path leaves the workspace, names the root
    /// itself or points into `.hoard`.
    pub fn normalize(&self, file_path: &Path) -> Option<PathBuf> {
        let relative = if file_path.is_absolute() {
            file_path.strip_prefix(&self.path).ok()?
        } else {
            file_path
        };

        let mut normalized = PathBuf::new();
        for component in relative.components() {
            match component {
                Component::CurDir => {}
                Component::Normal(part) => normalized.push(part),
                Component::ParentDir => {
                    if !normalized.pop() {
                        return None;
                    }
                }
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        match normalized.components().next() {
            None => None,
            Some(first) if first.as_os_str() == IGNORED_PATHS[0] => None,
            Some(_) => Some(normalized),
        }
    }

    /// Every regular file under `root` (default: the whole workspace), relative to the workspace.
    pub fn list_files(&self, root: Option<PathBuf>) -> anyhow::Result<Vec<PathBuf>> {
        let root = match root {
            Some(p) => std::fs::canonicalize(self.path.join(p))?,
            None => self.path.to_path_buf(),
        };

        if !root.exists() {
            anyhow::bail!("The specified path does not exist: {:?}", root);
        }

        let mut files = WalkDir::new(&root)
            .into_iter()
            .filter_entry(|entry| !Self::is_ignored(entry.path()))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(self.path.as_ref())
                    .ok()
                    .map(PathBuf::from)
            })
            .collect::<Vec<_>>();
        files.sort();

        Ok(files)
    }

    fn is_ignored(path: &Path) -> bool {
        path.file_name()
            .map(|name| IGNORED_PATHS.contains(&name.to_string_lossy().as_ref()))
            .unwrap_or(false)
    }

    pub fn exists(&self, file_path: &Path) -> bool {
        self.path.join(file_path).is_file()
    }

    pub fn read_file(&self, file_path: &Path) -> std::io::Result<Bytes> {
        std::fs::read(self.path.join(file_path)).map(Bytes::from)
    }

    /// Replace a file's content; readers see either the old or the new bytes.
    pub fn write_file(&self, file_path: &Path, content: &[u8]) -> std::io::Result<()> {
        let path = self.path.join(file_path);
        let dir = path
            .parent()
            .ok_or_else(|| std::io::Error::other("file path has no parent"))?;
        std::fs::create_dir_all(dir)?;

        let temp_path = dir.join(format!(".hoard-tmp-{}", rand::random::<u32>()));
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;

        std::fs::rename(&temp_path, &path)
    }

    pub fn file_mode(&self, file_path: &Path) -> EntryMode {
        if self.path.join(file_path).is_executable() {
            EntryMode::Executable
        } else {
            EntryMode::Regular
        }
    }
}
