use log::{info/*, error, warn, debug, trace, log, Level*/};
use run_script::ScriptOptions;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
#[cfg(target_family = "unix")]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

use crate::error::{ExportError, Result};
use crate::settings::app_settings::{Mysql, Settings};
use crate::shell::{is_command_available, shell_and_log};
use crate::status::ExportStatus;

/**
Whether the export can use mysqldump.

# Errors
When `which` itself is missing, since then we can't tell.
*/
pub fn is_available(binary: &str) -> Result<bool>
{
    if !is_command_available("which")
    {
        return Err(ExportError::CommandUnavailable(String::from("which")));
    }
    Ok(is_command_available(binary))
}

/// Credentials file for mysqldump, so the password stays out of the command line and the command log.
pub fn mysqldump_cnf(mysql: &Mysql) -> String
{
    format!(
        "[mysqldump]\nuser={}\npassword={}\nhost={}\nport={}\n",
        option_value(mysql.effective_username()),
        option_value(mysql.effective_password()),
        option_value(&mysql.host),
        mysql.port
    )
}

/**
Quote a value for a MySQL option file. The quotes are only stripped from the ends, so quotes inside need no escaping,
but backslash starts an escape sequence.

# Examples
```
use dbexport::mysqldump::option_value;

assert_eq!(option_value(r#"a"b\c"#), r#""a"b\\c""#);
```
*/
pub fn option_value(value: &str) -> String
{
    let mut quoted = String::from("\"");
    for c in value.chars()
    {
        match c
        {
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{8}' => quoted.push_str("\\b"),
            other => quoted.push(other)
        }
    }
    quoted.push('"');
    quoted
}

/// Where the credentials file goes: next to the config file.
pub fn cnf_location(settings: &Settings) -> PathBuf
{
    match Path::new(&settings.startup.config_file).parent()
    {
        Some(dir) => dir.join("mysqldump.cnf"),
        None => PathBuf::from("mysqldump.cnf")
    }
}

/**
The shell command for the dump. With `pipe_to` the shell writes the dump to that file, otherwise it goes to stdout.

Binary columns are dumped as hex literals so the output is plain text, which the captured stdout has to be.
*/
pub fn dump_command(binary: &str, cnf: &Path, database: &str, pipe_to: Option<&Path>) -> String
{
    let mut cmd = format!(
        r#"{} --defaults-file={} --hex-blob {}"#,
        binary,
        enquote::enquote('"', &cnf.to_string_lossy()),
        enquote::enquote('"', database)
    );
    if let Some(sink) = pipe_to
    {
        cmd.push_str(&format!(" > {}", enquote::enquote('"', &sink.to_string_lossy())));
    }
    cmd
}

fn write_cnf(location: &Path, contents: &str) -> Result<()>
{
    if let Some(dir) = location.parent()
    {
        if !dir.as_os_str().is_empty() { fs::create_dir_all(dir)?; }
    }
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(target_family = "unix")]
    options.mode(0o600);
    let mut file = options.open(location)?;
    file.write_all(contents.as_bytes())?;
    // the mode above only applies to a new file
    #[cfg(target_family = "unix")]
    fs::set_permissions(location, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

/**
Dump the configured database into the sink file with mysqldump.

# Returns
The status matching mysqldump's exit code. Without piping, whatever mysqldump printed is written to the sink file
whatever the exit code, so a partial dump is kept for inspection.
*/
pub fn dump(settings: &Settings, sink_file: &Path) -> Result<ExportStatus>
{
    info!("Beginning mysqldump of {}", settings.mysql.database);

    let cnf = cnf_location(settings);
    write_cnf(&cnf, &mysqldump_cnf(&settings.mysql))?;

    let piping = settings.export.piping;
    let cmd = dump_command(&settings.export.mysqldump_binary, &cnf, &settings.mysql.database, if piping {Some(sink_file)} else {None});
    let (code, stdout) = shell_and_log(&cmd, &ScriptOptions::new(), "mysqldump", true, false)
        .ok_or_else(|| ExportError::CommandFailed{purpose: String::from("mysqldump")})?;

    if !piping
    {
        fs::write(sink_file, stdout)?;
    }

    info!("Completed mysqldump of {} with exit code {}", settings.mysql.database, code);
    Ok(ExportStatus::from_exit_code(code))
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::testing::fixtures::Fixture;

    /// A stand-in for mysqldump that prints its arguments and exits with the given code.
    fn fake_mysqldump(dir: &Path, exit_code: i32) -> String
    {
        let path = dir.join("fake_mysqldump");
        fs::write(&path, format!("#!/bin/sh\necho \"-- dumped $3\"\nexit {exit_code}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// Behaves like mysqldump on a table with a binary column: raw bytes unless asked for hex.
    fn fake_blob_mysqldump(dir: &Path) -> String
    {
        let path = dir.join("fake_blob_mysqldump");
        let script = "#!/bin/sh\n\
            case \"$*\" in\n\
            *--hex-blob*) echo \"INSERT INTO b VALUES (0xFFFE);\" ;;\n\
            *) printf \"INSERT INTO b VALUES ('\\377\\376');\\n\" ;;\n\
            esac\n";
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn settings_in(fixture: &Fixture, binary: String) -> Settings
    {
        let mut settings = Settings::default();
        settings.startup.config_file = fixture.dir().join("config.json").to_string_lossy().into_owned();
        settings.mysql.database = String::from("shop");
        settings.mysql.username = String::from("app");
        settings.mysql.password = String::from("p\"w");
        settings.export.mysqldump_binary = binary;
        settings
    }

    #[test]
    fn cnf_keeps_password_out_of_command()
    {
        let mut mysql = Settings::default().mysql;
        mysql.username = String::from("app");
        mysql.password = String::from("s3cr\"t");
        let cnf = mysqldump_cnf(&mysql);
        assert_eq!(cnf, "[mysqldump]\nuser=\"app\"\npassword=\"s3cr\"t\"\nhost=\"localhost\"\nport=3306\n");

        let cmd = dump_command("mysqldump", Path::new("/etc/dbexport/mysqldump.cnf"), "shop", None);
        assert_eq!(cmd, r#"mysqldump --defaults-file="/etc/dbexport/mysqldump.cnf" --hex-blob "shop""#);
        assert!(!cmd.contains("s3cr"));
    }

    #[test]
    fn piping_redirects_into_sink()
    {
        let cmd = dump_command("mysqldump", Path::new("my.cnf"), "shop", Some(Path::new("out/LIVE-1.sql")));
        assert!(cmd.ends_with(r#" > "out/LIVE-1.sql""#));
    }

    #[test]
    fn cnf_sits_next_to_config()
    {
        let mut settings = Settings::default();
        settings.startup.config_file = String::from("/etc/dbexport/config.json");
        assert_eq!(cnf_location(&settings), PathBuf::from("/etc/dbexport/mysqldump.cnf"));
    }

    #[test]
    fn captured_dump_is_written()
    {
        let fixture = Fixture::blank("dump.sql");
        let settings = settings_in(&fixture, fake_mysqldump(fixture.dir(), 0));
        let status = dump(&settings, fixture.to_path()).unwrap();
        assert_eq!(status, ExportStatus::Success);
        assert_eq!(fs::read_to_string(fixture.to_path()).unwrap(), "-- dumped shop\n");
        assert!(cnf_location(&settings).exists());
    }

    #[test]
    fn piped_dump_is_written_by_shell()
    {
        let fixture = Fixture::blank("dump.sql");
        let mut settings = settings_in(&fixture, fake_mysqldump(fixture.dir(), 0));
        settings.export.piping = true;
        dump(&settings, fixture.to_path()).unwrap();
        assert_eq!(fs::read_to_string(fixture.to_path()).unwrap(), "-- dumped shop\n");
    }

    #[test]
    fn option_values_escape_backslashes_only()
    {
        assert_eq!(option_value("plain"), "\"plain\"");
        assert_eq!(option_value("it's \"x\""), "\"it's \"x\"\"");
        assert_eq!(option_value("a\\b\nc"), "\"a\\\\b\\nc\"");
    }

    #[test]
    fn existing_cnf_is_made_private()
    {
        let fixture = Fixture::blank("mysqldump.cnf");
        fs::write(fixture.to_path(), "old").unwrap();
        fs::set_permissions(fixture.to_path(), fs::Permissions::from_mode(0o644)).unwrap();

        write_cnf(fixture.to_path(), "[mysqldump]\n").unwrap();
        assert_eq!(fs::read_to_string(fixture.to_path()).unwrap(), "[mysqldump]\n");
        assert_eq!(fs::metadata(fixture.to_path()).unwrap().permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn captured_binary_columns_survive()
    {
        let fixture = Fixture::blank("dump.sql");
        let settings = settings_in(&fixture, fake_blob_mysqldump(fixture.dir()));
        assert_eq!(dump(&settings, fixture.to_path()).unwrap(), ExportStatus::Success);

        let bytes = fs::read(fixture.to_path()).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "INSERT INTO b VALUES (0xFFFE);\n");
    }

    #[test]
    fn exit_code_becomes_status()
    {
        let fixture = Fixture::blank("dump.sql");
        let settings = settings_in(&fixture, fake_mysqldump(fixture.dir(), 5));
        assert_eq!(dump(&settings, fixture.to_path()).unwrap(), ExportStatus::OutOfDisk);
    }
}
