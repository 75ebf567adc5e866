use std::path::{Path, PathBuf};
use tempfile::TempDir;

/**
A path inside a private temporary directory which is removed along with everything in it when the fixture is dropped.
Nothing is created at the path itself.
*/
pub struct Fixture {
    path: PathBuf,
    _tempdir: TempDir,
}

impl Fixture {
    pub fn blank(fixture_filename: &str) -> Self {
        let tempdir = tempfile::tempdir().expect("Couldn't create temp dir for fixture");
        let mut path = PathBuf::from(&tempdir.path());
        path.push(fixture_filename);

        Fixture { _tempdir: tempdir, path }
    }

    /// The temporary directory holding the fixture path.
    pub fn dir(&self) -> &Path
    {
        self._tempdir.path()
    }

    pub fn to_str(&self) -> &str
    {
        self.path.to_str().expect("Fixture path isn't valid UTF-8")
    }

    pub fn to_path(&self) -> &Path
    {
        self.path.as_path()
    }
}
