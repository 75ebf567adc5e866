use actix_web::{web, web::Data, HttpRequest, HttpResponse, http::header, http::StatusCode};
use glob::glob;
use log::{error, warn/*, info, debug, trace, log, Level*/};
use serde::Deserialize;
use serde_json::json;
use std::sync::TryLockError;

use crate::environment::Environment;
use crate::export::{run_export, ExportReport};
use crate::ledger::LEDGER;
use crate::settings::app_settings::Settings;
use crate::status::{html_escape, Markup};
use crate::verbosity::Verbosity;

use super::{fieldset, html_construct, serde_to_string};

#[derive(Deserialize)]
pub struct ExportQuery
{
    pub debug: Option<u8>
}

fn html_response(status: StatusCode, html: String) -> HttpResponse
{
    HttpResponse::build(status)
        .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
        .body(html)
}

/**
Responds to requests for the main page at the domain root.

# Returns
HttpResponse containing the main page: what gets exported, the progress of any unfinished export, and the backups on disk.
*/
pub async fn index(settings: Data<Settings>) -> HttpResponse
{
    let target = json!({
        "host": settings.mysql.host,
        "port": settings.mysql.port,
        "database": settings.mysql.database,
        "username": settings.mysql.effective_username(),
        "sink_dir": settings.startup.sink_dir,
        "environment": settings.startup.environment,
    });

    let ledger = match LEDGER.try_lock()
    {
        Ok(guard) => serde_to_string(&*guard),
        Err(TryLockError::WouldBlock) => String::from("An export is running right now."),
        Err(TryLockError::Poisoned(p)) => serde_to_string(&*p.into_inner())
    };

    let backups = list_backups(&settings.startup.sink_dir).iter()
        .map(|(name, size)| format!("{} ({} bytes)", html_escape(name), size))
        .collect::<Vec<String>>()
        .join("\n");

    let body = format!("{}{}{}",
        fieldset("Database", &serde_to_string(target), true),
        fieldset("Unfinished export", &ledger, true),
        fieldset("Backups", &backups, true)
    );
    html_response(StatusCode::OK, html_construct("dbexport status", "", &body))
}

/**
Runs an export and reports how it went. Designed to be hit with e.g. wget.

Admin only: the environment, configured or detected from the request path, must be DEV.
The `debug` query parameter raises the verbosity of the page above the configured level.
*/
pub async fn export(req: HttpRequest, query: web::Query<ExportQuery>, settings: Data<Settings>) -> HttpResponse
{
    let environment = settings.fixed_environment().unwrap_or_else(|| Environment::detect(req.path()));
    if !environment.is_admin()
    {
        warn!("Refused export request for {} in environment {}", req.path(), environment);
        return html_response(StatusCode::FORBIDDEN, html_construct("Forbidden - dbexport", "", "You must be an admin to see this page."));
    }

    let verbosity = query.debug.map(Verbosity::from_level).unwrap_or_else(|| settings.verbosity());
    let job_settings = settings.get_ref().clone();
    let outcome = web::block(move || {
        let mut ledger = match LEDGER.try_lock()
        {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return None,
            Err(TryLockError::Poisoned(p)) => p.into_inner()
        };
        Some(run_export(&job_settings, environment, &mut ledger))
    }).await;

    match outcome
    {
        Ok(Some(report)) => {
            let status = if report.status.is_success() {StatusCode::OK} else {StatusCode::INTERNAL_SERVER_ERROR};
            html_response(status, html_construct("Export - dbexport", "", &export_body(&report, &settings, verbosity)))
        },
        Ok(None) => html_response(StatusCode::CONFLICT, html_construct("Busy - dbexport", "", "An export is already running, try again when it has finished.")),
        Err(e) => {
            error!("Export job couldn't run: {}", e);
            html_response(StatusCode::INTERNAL_SERVER_ERROR, html_construct("Error - dbexport", "", "The export couldn't be started."))
        }
    }
}

/// Page content for a finished export: the status message, plus progress and file size when verbose.
pub fn export_body(report: &ExportReport, settings: &Settings, verbosity: Verbosity) -> String
{
    let mut body = String::new();
    if verbosity >= Verbosity::Info
    {
        for line in report.transcript.lines()
        {
            body.push_str(&html_escape(line));
            body.push_str("<br/>\n");
        }
    }

    body.push_str(&report.message(settings, Markup::Html));

    if verbosity >= Verbosity::Info
    {
        body.push_str(&format!("export::filesize {}<br/>\n", report.file_size.unwrap_or(0)));
        body.push_str("WARNING: there may be a delay between running this script and the filesize updating; check before you panic!<br/>\n");
    }
    body
}

/// Backup files in the sink directory with their sizes, oldest name first.
fn list_backups(sink_dir: &str) -> Vec<(String, u64)>
{
    let glob_str = format!("{}/*.sql", sink_dir.trim_end_matches('/'));
    let matches = match glob(&glob_str)
    {
        Ok(v) => v,
        Err(e) =>
        {
            error!("Failed to process glob: {} -- Error: {}", glob_str, e);
            return vec!();
        }
    };
    let mut backups: Vec<(String, u64)> = matches.filter_map(Result::ok)
        .map(|path| {
            let size = crate::sink::file_size(&path).unwrap_or(0);
            (path.display().to_string(), size)
        })
        .collect();
    backups.sort();
    backups
}

/**
Responds to requests that don't match anything we have.

# Returns
HttpResponse indicating HTTP 404 Not Found.
*/
pub async fn notfound() -> HttpResponse
{
    let html = html_construct("Not Found - dbexport", "", "<h1>Not Found</h1><a href='/'>Return to Home</a>");
    html_response(StatusCode::NOT_FOUND, html)
}
