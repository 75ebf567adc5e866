use clap::Parser;
use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;

use crate::environment::Environment;
use crate::error::{ExportError, Result};
use crate::settings::settings_resolver::{ClapArgsType, SettingsType};
use crate::verbosity::Verbosity;

/**
The portion of the config needed immediately, before we can even do so much as display an error over HTTP.
*/
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Startup
{
    pub config_file: String,
    pub log_dir: String,
    pub sink_dir: String,
    pub listen_addr: String,
    /// DEV, QA, LIVE, or AUTO to detect it from the request path
    pub environment: String
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Mysql
{
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub superuser_username: String,
    pub superuser_password: String
}

impl Mysql
{
    /// The account used for the export: the superuser when one is configured, else the ordinary user.
    pub fn effective_username(&self) -> &str
    {
        if self.superuser_username.is_empty() { &self.username } else { &self.superuser_username }
    }

    /// Falls back to the ordinary password on its own, whatever the user name does.
    pub fn effective_password(&self) -> &str
    {
        if self.superuser_password.is_empty() { &self.password } else { &self.superuser_password }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Export
{
    pub drop_table: bool,
    pub piping: bool,
    pub mysqldump_binary: String,
    pub insert_batch_size: usize,
    pub debug: u8
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Action
{
    pub export: bool
}

/**
The main type storing all the configuration data.
*/
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Settings
{
    pub startup: Startup,
    pub mysql: Mysql,
    pub export: Export,
    pub action: Action
}

impl Default for Settings
{
    fn default() -> Self
    {
        Settings{
            startup: Startup
            {
                config_file:  String::from("/etc/dbexport/config.json"),
                log_dir:      String::from("/var/log/dbexport/"),
                sink_dir:     String::from("data/backups/database/"),
                listen_addr:  String::from("0.0.0.0:80"),
                environment:  String::from("AUTO")
            },
            mysql: Mysql
            {
                host:               String::from("localhost"),
                port:               3306,
                database:           String::from(""),
                username:           String::from(""),
                password:           String::from(""),
                superuser_username: String::from(""),
                superuser_password: String::from("")
            },
            export: Export
            {
                drop_table:        false,
                piping:            false,
                mysqldump_binary:  String::from("mysqldump"),
                insert_batch_size: 1,
                debug:             0
            },
            action: Action
            {
                export: false
            }
        }
    }
}

impl Settings
{
    /**
    Load the settings from the process command line, environment, config file and defaults.

    # Panics
    When the configuration can't be resolved. Nothing useful can happen without it, not even logging.
    */
    pub fn load() -> Settings
    {
        match Settings::load_from(std::env::args_os())
        {
            Ok(s) => s,
            Err(e) => panic!("Couldn't load config: {e}")
        }
    }

    pub fn load_from<I, T>(args: I) -> std::result::Result<Settings, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone
    {
        crate::settings::settings_resolver::load::<Settings, ClapArgs, I, T>(&Settings::default(), args)
    }

    /**
    Check everything the export can't do without.

    The password may legitimately be blank, everything else about the connection may not.
    */
    pub fn validate(&self) -> Result<()>
    {
        if self.mysql.host.is_empty() { return Err(ExportError::MissingSetting("mysql.host")); }
        if self.mysql.database.is_empty() { return Err(ExportError::MissingSetting("mysql.database")); }
        if self.mysql.effective_username().is_empty() { return Err(ExportError::MissingSetting("mysql.superuser_username")); }
        Ok(())
    }

    /// The configured environment, or None when it should be detected per request.
    pub fn fixed_environment(&self) -> Option<Environment>
    {
        self.startup.environment.parse().ok()
    }

    pub fn verbosity(&self) -> Verbosity
    {
        Verbosity::from_level(self.export.debug)
    }

    pub fn get_log_dir_path(&self) -> String { self.startup.log_dir.clone() }
}

impl SettingsType for Settings
{
    fn get_config_file_path(&self) -> String { self.startup.config_file.clone() }
}

#[derive(Parser, Serialize)]
#[command(author, version, about, long_about = None)]
struct ClapArgs {
    /** Config file -- will be created if it doesn't exist.                                Default: /etc/dbexport/config.json */ #[arg(short='c', long="config_file",        env="DBEXPORT_CONFIG_FILE"       )]  startup_config_file: Option<String>,
    /** Log directory -- will be created if it doesn't exist.                              Default: /var/log/dbexport/        */ #[arg(short='l', long="log_dir",            env="DBEXPORT_LOG_DIR"           )]  startup_log_dir: Option<String>,
    /** Directory the SQL backup files are written to.                                     Default: data/backups/database/    */ #[arg(short='s', long="sink_dir",           env="DBEXPORT_SINK_DIR"          )]  startup_sink_dir: Option<String>,
    /** ip:port for the web interface to listen on.                                        Default: 0.0.0.0:80                */ #[arg(short='w', long="listen_addr",        env="DBEXPORT_LISTEN_ADDR"       )]  startup_listen_addr: Option<String>,
    /** DEV, QA or LIVE. AUTO detects it from the request path (/dev/, /qa/, /remote/).    Default: AUTO                      */ #[arg(short='n', long="environment",        env="DBEXPORT_ENVIRONMENT"       )]  startup_environment: Option<String>,
    /** MySQL server host name.                                                            Default: localhost                 */ #[arg(short='H', long="mysql_host",         env="DBEXPORT_MYSQL_HOST"        )]  mysql_host: Option<String>,
    /** MySQL server port.                                                                 Default: 3306                      */ #[arg(short='P', long="mysql_port",         env="DBEXPORT_MYSQL_PORT"        )]  mysql_port: Option<u16>,
    /** Name of the database to export.                                                                                       */ #[arg(short='d', long="mysql_database",     env="DBEXPORT_MYSQL_DATABASE"    )]  mysql_database: Option<String>,
    /** MySQL user name.                                                                                                      */ #[arg(short='u', long="mysql_username",     env="DBEXPORT_MYSQL_USERNAME"    )]  mysql_username: Option<String>,
    /** MySQL password.                                                                                                       */ #[arg(short='p', long="mysql_password",     env="DBEXPORT_MYSQL_PASSWORD"    )]  mysql_password: Option<String>,
    /** MySQL user with lock table privilege for the export. When blank, the ordinary user is used.                           */ #[arg(short='U', long="superuser_username", env="DBEXPORT_SUPERUSER_USERNAME")]  mysql_superuser_username: Option<String>,
    /** Password of the export user.                                                                                          */ #[arg(short='W', long="superuser_password", env="DBEXPORT_SUPERUSER_PASSWORD")]  mysql_superuser_password: Option<String>,
    /** Emit DROP TABLE IF EXISTS before each table when mysqldump isn't available.                                           */ #[arg(short='D', long="drop_table",         env="DBEXPORT_DROP_TABLE"        )]  export_drop_table: bool,
    /** Let the shell redirect mysqldump output straight into the backup file.                                                */ #[arg(short='I', long="piping",             env="DBEXPORT_PIPING"            )]  export_piping: bool,
    /** Name or path of the mysqldump binary.                                              Default: mysqldump                 */ #[arg(short='m', long="mysqldump_binary",   env="DBEXPORT_MYSQLDUMP_BINARY"  )]  export_mysqldump_binary: Option<String>,
    /** Rows per INSERT statement when mysqldump isn't available.                          Default: 1                         */ #[arg(short='b', long="insert_batch_size",  env="DBEXPORT_INSERT_BATCH_SIZE" )]  export_insert_batch_size: Option<usize>,
    /** Verbosity: 0 quiet, 1 info, 2 verbose, 3 debug.                                    Default: 0                         */ #[arg(short='g', long="debug",              env="DBEXPORT_DEBUG"             )]  export_debug: Option<u8>,
    /** Export the database now.                                                                                              */ #[arg(short='E', long="export",             env="DBEXPORT_EXPORT"            )]  action_export: bool,
}

impl ClapArgsType for ClapArgs
{
    fn get_config_file_path(&self) -> Option<String> { self.startup_config_file.clone() }
}
