use log::{info/*, error, warn, debug, trace, log, Level*/};

use crate::environment::Environment;
use crate::export::run_export;
use crate::ledger::LEDGER;
use crate::settings::app_settings::Settings;
use crate::status::Markup;

/**
Do the actions specified in the "action" section of the configuration once, then terminate.
This handles everything necessary when calling dbexport_manual on the command line.

Without a configured environment, it is detected from the working directory the same way the web interface detects it from the request path.
The command line isn't subject to the web interface's admin check: whoever can run it already has the config.

# Returns
The process exit code: 0 when there was nothing to do or the export succeeded, else the export status code.
*/
pub fn dispatch(settings: &Settings) -> i32
{
    if !settings.action.export
    {
        info!("No action requested. Use --export to export the database.");
        return 0;
    }

    let environment = settings.fixed_environment().unwrap_or_else(|| {
        let cwd = std::env::current_dir().map(|d| format!("{}/", d.display())).unwrap_or_default();
        Environment::detect(&cwd)
    });

    let mut ledger = match LEDGER.lock() {Ok(g) => g, Err(p) => p.into_inner()};
    let report = run_export(settings, environment, &mut ledger);

    for line in report.transcript.lines()
    {
        println!("{line}");
    }
    print!("{}", report.message(settings, Markup::Plain));
    if let Some(size) = report.file_size
    {
        println!("export::filesize {size}");
    }

    info!("dbexport completed all actions.");
    report.status.exit_code()
}
