use chrono::{DateTime, TimeZone};
use log::{debug, trace/*, error, warn, info, log, Level*/};
use std::fs::{self, DirBuilder, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
#[cfg(target_family = "unix")]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};

use crate::environment::Environment;
use crate::error::{ExportError, Result};

/**
Name of a new backup file: `{sink_dir}/{ENV}-{YYYYmmdd-HHMMSS}.sql`

# Examples
```
use chrono::{TimeZone, Utc};
use dbexport::{environment::Environment, sink::sink_file_name};

let now = Utc.with_ymd_and_hms(2024, 3, 9, 17, 5, 1).unwrap();
let name = sink_file_name("data/backups/database", Environment::Live, &now);
assert_eq!(name.to_str().unwrap(), "data/backups/database/LIVE-20240309-170501.sql");
```
*/
pub fn sink_file_name<Tz: TimeZone>(sink_dir: &str, environment: Environment, now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display
{
    let mut path = PathBuf::from(sink_dir);
    path.push(format!("{}-{}.sql", environment, now.format("%Y%m%d-%H%M%S")));
    path
}

/**
Make sure the backup directory exists and we can write in it. It is created with setgid and open permissions when missing.
*/
pub fn prepare_sink_dir(dir: &Path) -> Result<()>
{
    if !dir.exists()
    {
        debug!("Creating sink dir {}", dir.display());
        DirBuilder::new().recursive(true).set_mode(0o2777).create(dir)?;
    }
    if !(dir.is_dir() && is_writable(dir))
    {
        return Err(ExportError::SinkUnwritable(dir.to_path_buf()));
    }
    Ok(())
}

/**
Touch the backup file if it isn't there yet, then make sure it is a regular file we can append to.
An existing file is left alone so an interrupted export can keep appending to it.
*/
pub fn prepare_sink_file(path: &Path) -> Result<()>
{
    if !path.exists()
    {
        OpenOptions::new().create(true).append(true).set_mode(0o777).open(path)?;
        // creation mode is masked by the umask
        #[cfg(target_family = "unix")]
        fs::set_permissions(path, fs::Permissions::from_mode(0o777))?;
    }
    if !(path.is_file() && is_writable(path))
    {
        return Err(ExportError::SinkUnwritable(path.to_path_buf()));
    }
    Ok(())
}

/**
Append text to the backup file, opening and closing it around the write.

# Errors
Empty text is refused, as is anything the filesystem refuses.
*/
pub fn append(path: &Path, text: &str) -> Result<()>
{
    trace!("Appending {} bytes to {}", text.len(), path.display());
    if text.is_empty()
    {
        return Err(ExportError::EmptyWrite(path.to_path_buf()));
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

pub fn file_size(path: &Path) -> Option<u64>
{
    fs::metadata(path).ok().map(|m| m.len())
}

#[cfg(target_family = "unix")]
fn is_writable(path: &Path) -> bool
{
    nix::unistd::access(path, nix::unistd::AccessFlags::W_OK).is_ok()
}

#[cfg(not(target_family = "unix"))]
fn is_writable(path: &Path) -> bool
{
    fs::metadata(path).map(|m| !m.permissions().readonly()).unwrap_or(false)
}

trait ModeSettable
{
    fn set_mode(&mut self, mode: u32) -> &mut Self;
}

impl ModeSettable for OpenOptions
{
    #[cfg(target_family = "unix")]
    fn set_mode(&mut self, mode: u32) -> &mut OpenOptions
    {
        self.mode(mode)
    }

    #[cfg(not(target_family = "unix"))]
    #[allow(unused)]
    fn set_mode(&mut self, mode: u32) -> &mut OpenOptions
    {
        self
    }
}

impl ModeSettable for DirBuilder
{
    #[cfg(target_family = "unix")]
    fn set_mode(&mut self, mode: u32) -> &mut DirBuilder
    {
        self.mode(mode)
    }

    #[cfg(not(target_family = "unix"))]
    #[allow(unused)]
    fn set_mode(&mut self, mode: u32) -> &mut DirBuilder
    {
        self
    }
}
