use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

/// Resolves external tools by looking, in order, at a suggested directory,
/// the directory holding this program, the working directory and the PATH.
#[derive(Debug, Clone)]
pub struct BinaryLocator {
    program_dir: Option<PathBuf>,
    working_dir: PathBuf,
    search_path: Option<OsString>,
}

impl BinaryLocator {
    pub fn new(working_dir: PathBuf) -> Self {
        BinaryLocator {
            program_dir: env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf)),
            working_dir,
            search_path: env::var_os("PATH"),
        }
    }

    pub fn program_dir(mut self, program_dir: Option<PathBuf>) -> Self {
        self.program_dir = program_dir;
        self
    }

    pub fn search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    /// Returns `None` when no candidate exists anywhere; the caller decides
    /// whether that is fatal.
    pub fn locate(&self, suggested_dir: &str, binary_name: &str) -> Option<PathBuf> {
        let file_name = format!("{binary_name}{}", env::consts::EXE_SUFFIX);

        let mut candidates = Vec::with_capacity(3);
        if let Some(dir) = self.suggested_dir(suggested_dir) {
            candidates.push(dir);
        }
        if let Some(dir) = &self.program_dir {
            candidates.push(dir.clone());
        }
        candidates.push(self.working_dir.clone());

        for dir in candidates {
            let candidate = dir.join(&file_name);
            if candidate.is_file() {
                debug!("found {binary_name} at {candidate:?}");
                return Some(candidate);
            }
        }

        match which::which_in(binary_name, self.search_path.as_ref(), &self.working_dir) {
            Ok(path) => {
                debug!("found {binary_name} on the search path at {path:?}");
                Some(path)
            },
            Err(_) => None,
        }
    }

    fn suggested_dir(&self, suggested_dir: &str) -> Option<PathBuf> {
        let trimmed = suggested_dir.trim_end_matches(['/', '\\']);
        if trimmed.is_empty() {
            // "/" trims down to nothing but still names a directory
            return match suggested_dir.is_empty() {
                true => None,
                false => Some(PathBuf::from(suggested_dir)),
            };
        }

        let dir = PathBuf::from(trimmed);
        if dir.is_absolute() {
            return Some(dir);
        }

        match fs::canonicalize(self.working_dir.join(&dir)) {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                warn!("unable to resolve directory {dir:?} against {:?}: {err}", self.working_dir);
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn fake_binary(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(format!("{name}{}", env::consts::EXE_SUFFIX));
        File::create(&path).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        path
    }

    fn isolated_locator(working_dir: &Path) -> BinaryLocator {
        BinaryLocator::new(working_dir.to_path_buf())
            .program_dir(None)
            .search_path(None)
    }

    #[test]
    fn test_suggested_dir_wins_over_search_path() {
        let suggested = tempfile::tempdir().unwrap();
        let on_path = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        let expected = fake_binary(suggested.path(), "ffmpeg");
        fake_binary(on_path.path(), "ffmpeg");

        let locator = isolated_locator(cwd.path())
            .search_path(Some(on_path.path().as_os_str().to_owned()));
        let hint = format!("{}/", suggested.path().display());
        assert_eq!(locator.locate(&hint, "ffmpeg"), Some(expected));
    }

    #[test]
    fn test_relative_suggested_dir_resolves_against_working_dir() {
        let cwd = tempfile::tempdir().unwrap();
        fs::create_dir(cwd.path().join("tools")).unwrap();
        fake_binary(&cwd.path().join("tools"), "ffprobe");

        let found = isolated_locator(cwd.path()).locate("tools", "ffprobe").unwrap();
        assert_eq!(found, fs::canonicalize(cwd.path().join("tools")).unwrap().join(format!("ffprobe{}", env::consts::EXE_SUFFIX)));
    }

    #[test]
    fn test_unresolvable_suggested_dir_falls_back() {
        let cwd = tempfile::tempdir().unwrap();
        let expected = fake_binary(cwd.path(), "ffmpeg");

        assert_eq!(isolated_locator(cwd.path()).locate("does-not-exist", "ffmpeg"), Some(expected));
    }

    #[test]
    fn test_program_dir_before_working_dir() {
        let program = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        let expected = fake_binary(program.path(), "ffmpeg");
        fake_binary(cwd.path(), "ffmpeg");

        let locator = isolated_locator(cwd.path()).program_dir(Some(program.path().to_path_buf()));
        assert_eq!(locator.locate("", "ffmpeg"), Some(expected));
    }

    #[test]
    fn test_search_path_is_last_resort() {
        let on_path = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        fake_binary(on_path.path(), "ffprobe");

        let locator = isolated_locator(cwd.path())
            .search_path(Some(on_path.path().as_os_str().to_owned()));
        let found = locator.locate("", "ffprobe").unwrap();
        assert_eq!(found.parent().unwrap(), on_path.path());
    }

    #[test]
    fn test_missing_everywhere() {
        let cwd = tempfile::tempdir().unwrap();
        assert_eq!(isolated_locator(cwd.path()).locate("", "ffmpeg"), None);
    }
}
