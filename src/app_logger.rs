use std::fs;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::settings::app_settings::Settings;

/**
Setup logger so the standard log macros will work.

The console gets log lines on stderr, leaving stdout to the command line runner's report.
Output of external commands goes to its own files: `cmd.log` for the commands, `stdout.log` and `stderr.log` for what they printed.
The root level follows the configured verbosity, so a quiet setup only logs warnings and errors.

# Arguments
* `settings` - The app configuration

# Panics
This function makes every attempt to recover from minor issues, but any unrecoverable problem will result in a panic.
After all, the app can't log errors until this completes successfully.
Possible unrecoverables include filesystem errors.

# Undefined behavior
This should only be called once. Additional calls may result in issues with the underlying logger library.
*/
pub fn setup_logger(settings: &Settings)
{
    let level = root_level(settings);
    let log_dir_path = settings.get_log_dir_path();
    let log_dir_path = log_dir_path.trim_end_matches('/');
    fs::create_dir_all(log_dir_path).expect("Couldn't ensure existence of log dir");

    let appender_console      = ConsoleAppender::builder().target(Target::Stderr).build();
    let appender_main         = FileAppender::builder().encoder(Box::new(PatternEncoder::new("{d} [{P}:{I}] {l} - {m}{n}"))).build(format!("{log_dir_path}/main.log"  )).expect("Couldn't open main log file.");
    let appender_stdoutlogger = FileAppender::builder().encoder(Box::new(PatternEncoder::new("{d} [{P}:{I}] - {m}{n}"    ))).build(format!("{log_dir_path}/stdout.log")).expect("Couldn't open log file for stdout of external commands.");
    let appender_stderrlogger = FileAppender::builder().encoder(Box::new(PatternEncoder::new("{d} [{P}:{I}] - {m}{n}"    ))).build(format!("{log_dir_path}/stderr.log")).expect("Couldn't open log file for stderr of external commands.");
    let appender_cmdlogger    = FileAppender::builder().encoder(Box::new(PatternEncoder::new("{d} [{P}:{I}] - {m}{n}"    ))).build(format!("{log_dir_path}/cmd.log"   )).expect("Couldn't open log file for external commands.");
    let logger_setup = Config::builder()
        .appender(Appender::builder().build("console",      Box::new(appender_console)))
        .appender(Appender::builder().build("main",         Box::new(appender_main)))
        .appender(Appender::builder().build("stdoutlogger", Box::new(appender_stdoutlogger)))
        .appender(Appender::builder().build("stderrlogger", Box::new(appender_stderrlogger)))
        .appender(Appender::builder().build("cmdlogger",    Box::new(appender_cmdlogger)))
        .logger(Logger::builder().appender("stdoutlogger").additive(false).build("stdoutlog", LevelFilter::Info))
        .logger(Logger::builder().appender("stderrlogger").additive(false).build("stderrlog", LevelFilter::Info))
        .logger(Logger::builder().appender("cmdlogger"   ).additive(false).build("cmdlog",    LevelFilter::Info))
        .build(Root::builder().appender("console").appender("main").build(level))
        .expect("Couldn't build logger setup.");
    log4rs::init_config(logger_setup).expect("Couldn't initialize logger.");
}

/// Level of the console and main log, from the configured verbosity.
fn root_level(settings: &Settings) -> LevelFilter
{
    settings.verbosity().level_filter()
}
