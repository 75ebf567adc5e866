use log::LevelFilter;
use serde::Serialize;

/**
How chatty an export should be, from the `debug` request parameter or the `export.debug` setting.
Values above the highest level are clamped to it.
*/
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity
{
    Quiet = 0,
    Info = 1,
    Verbose = 2,
    Debug = 3
}

impl Verbosity
{
    pub fn from_level(level: u8) -> Verbosity
    {
        match level
        {
            0 => Verbosity::Quiet,
            1 => Verbosity::Info,
            2 => Verbosity::Verbose,
            _ => Verbosity::Debug
        }
    }

    pub fn level_filter(&self) -> LevelFilter
    {
        match self
        {
            Verbosity::Quiet => LevelFilter::Warn,
            Verbosity::Info => LevelFilter::Info,
            Verbosity::Verbose => LevelFilter::Debug,
            Verbosity::Debug => LevelFilter::Trace
        }
    }
}
