use clap::Parser;
use config::{ConfigError, Config, File, FileFormat};
use log::{info/*, warn, error, debug, trace, log, Level*/};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

pub trait SettingsType
{
    fn get_config_file_path(&self) -> String;
}

pub trait ClapArgsType
{
    fn get_config_file_path(&self) -> Option<String>;
}

/**
Load configuration from sources.

- Load config, merging values from all sources (cmd, env, file, defaults) with appropriate priority
- Return app config
- If config file is missing, write a new one with defaults.

# Arguments
* `default_settings` - The default settings as you'd like to see them in the default config file, and the lowest priority source.
* `args` - The command line, including the program name in the first position.

# Generics
* `SettingsGeneric` - The type of your root Settings struct, used both to supply defaults and return the finished results to you.
* `ClapArgsGeneric` - The type of your Clap::Args struct, used to specify the command line interface to your app (and env vars) so Clap knows what to do.
  Field names must be the settings path with the first `.` replaced by `_`, e.g. `mysql_host` overrides `mysql.host`.

# Errors
A ConfigError when the config file can't be parsed, or can't be created when missing, or when the merged result doesn't fit the Settings type.
Bad command line arguments are handled by clap, which prints usage and exits.
*/
pub fn load<SettingsGeneric, ClapArgsGeneric, I, T>(default_settings: &SettingsGeneric, args: I) -> Result<SettingsGeneric, ConfigError>
where
    SettingsGeneric: Serialize + DeserializeOwned + SettingsType,
    ClapArgsGeneric: Parser + Serialize + ClapArgsType,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone
{
    let serialized_default_config = serde_json::to_string_pretty(default_settings).map_err(|e| ConfigError::Foreign(Box::new(e)))?;

    // Load command-line arguments. For those unspecified, load environment variables.
    let cmd_args = ClapArgsGeneric::parse_from(args);

    let config_file_path = match cmd_args.get_config_file_path() {Some(s) => s, None => default_settings.get_config_file_path()};
    let config_file = PathBuf::from(&config_file_path);

    // missing config file: write out the defaults so the admin has something to edit
    if !config_file.exists()
    {
        if let Some(dir) = config_file.parent()
        {
            fs::create_dir_all(dir).map_err(|e| ConfigError::Foreign(Box::new(e)))?;
        }
        fs::write(&config_file, &serialized_default_config).map_err(|e| ConfigError::Foreign(Box::new(e)))?;
        info!("Wrote default config file to {}", config_file_path);
    }

    let mut file_config = Config::builder()
        .add_source(File::from_str(&serialized_default_config, FileFormat::Json))
        .add_source(File::new(&config_file_path, FileFormat::Json));

    // Pass the (command line args + env vars) to Config as overrides
    match serde_json::to_value(cmd_args).map_err(|e| ConfigError::Foreign(Box::new(e)))?
    {
        Value::Object(cmd) => {
            for (name, val) in cmd
            {
                let name_path = name.replacen('_', ".", 1);
                match val {
                    Value::Null => {},
                    Value::Bool(bool_val ) => {if bool_val { file_config = file_config.set_override(name_path, true)?;}},
                    Value::Number(num_val) => {if let Some(n) = num_val.as_i64() { file_config = file_config.set_override(name_path, n)?;}},
                    Value::String(str_val) => {              file_config = file_config.set_override(name_path, str_val)?; },
                    _ => {return Err(ConfigError::Message(format!("Invalid value for cmd arg {name}")));}
                }
            }
        },
        _ => {return Err(ConfigError::Message(String::from("Invalid serialization of cmd/env args")));}
    }

    file_config.build()?.try_deserialize()
}
