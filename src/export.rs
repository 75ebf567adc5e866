use chrono::Local;
use log::{error, info/*, warn, debug, trace, log, Level*/};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::crawl::{self, CrawlOptions, DumpSource, MysqlSource};
use crate::environment::Environment;
use crate::error::Result;
use crate::ledger::ExportLedger;
use crate::mysqldump;
use crate::settings::app_settings::{Mysql, Settings};
use crate::sink::{self, sink_file_name};
use crate::status::{ExportStatus, Markup, MessageContext};
use crate::transcript::Transcript;

/**
Everything there is to say about one export attempt.
*/
#[derive(Serialize, Clone, Debug)]
pub struct ExportReport
{
    pub status: ExportStatus,
    pub sink: PathBuf,
    pub transcript: Transcript,
    pub file_size: Option<u64>
}

impl ExportReport
{
    pub fn message(&self, settings: &Settings, markup: Markup) -> String
    {
        let sink = self.sink.to_string_lossy();
        let ctx = MessageContext{
            database: &settings.mysql.database,
            sink: &sink,
            username: settings.mysql.effective_username(),
            host: &settings.mysql.host,
            sink_exists: self.sink.is_file()
        };
        self.status.message(&ctx, markup)
    }
}

/**
Export the configured database to a new backup file, or carry on with the one an interrupted crawl left behind.

mysqldump is used when available, otherwise the database is crawled over a direct connection.

# Returns
The report. Failures don't escape: they are logged, added to the transcript, and reported as the generic error status.
*/
pub fn run_export(settings: &Settings, environment: Environment, ledger: &mut ExportLedger) -> ExportReport
{
    run_export_with(settings, environment, ledger, |mysql| Ok(Box::new(MysqlSource::connect(mysql)?)))
}

/// As [`run_export`], with the database connection for the crawl supplied by `connect`.
pub fn run_export_with<F>(settings: &Settings, environment: Environment, ledger: &mut ExportLedger, connect: F) -> ExportReport
where
    F: FnOnce(&Mysql) -> Result<Box<dyn DumpSource>>
{
    info!("Beginning export of database {} ({})", settings.mysql.database, environment);
    let mut transcript = Transcript::default();
    let sink_file = ledger.sink_or_insert(sink_file_name(&settings.startup.sink_dir, environment, &Local::now()));

    let status = match export_to(settings, &sink_file, ledger, &mut transcript, connect)
    {
        Ok(s) => s,
        Err(e) => {
            error!("Export of database {} to {} failed: {}", settings.mysql.database, sink_file.display(), e);
            transcript.info(e.to_string());
            ExportStatus::Error
        }
    };

    // only a crawl that got somewhere is worth resuming into the same file
    if status.is_success() || ledger.tables.is_empty()
    {
        ledger.reset();
    }

    info!("Completed export of database {} with status {:?}", settings.mysql.database, status);
    ExportReport{status, file_size: sink::file_size(&sink_file), sink: sink_file, transcript}
}

fn export_to<F>(settings: &Settings, sink_file: &Path, ledger: &mut ExportLedger, transcript: &mut Transcript, connect: F) -> Result<ExportStatus>
where
    F: FnOnce(&Mysql) -> Result<Box<dyn DumpSource>>
{
    settings.validate()?;
    sink::prepare_sink_dir(sink_file.parent().unwrap_or_else(|| Path::new(".")))?;

    let binary = &settings.export.mysqldump_binary;
    if !binary.is_empty() && mysqldump::is_available(binary)?
    {
        transcript.info("Exporting with mysqldump...");
        return mysqldump::dump(settings, sink_file);
    }

    transcript.info("Connecting to database...");
    let mut source = connect(&settings.mysql)?;
    transcript.info("Connected");

    let options = CrawlOptions{drop_table: settings.export.drop_table, insert_batch_size: settings.export.insert_batch_size};
    crawl::export_database_to_file(source.as_mut(), ledger, sink_file, options, transcript)?;
    Ok(ExportStatus::Success)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::crawl::tests::FakeSource;
    use crate::error::ExportError;
    use crate::testing::fixtures::Fixture;
    use std::fs;

    fn crawl_settings(sink_dir: &Fixture) -> Settings
    {
        let mut settings = Settings::default();
        settings.startup.sink_dir = sink_dir.to_str().to_string();
        settings.mysql.database = String::from("shop");
        settings.mysql.username = String::from("app");
        settings.export.mysqldump_binary = String::new();
        settings
    }

    #[test]
    fn crawl_export_succeeds_and_clears_ledger()
    {
        let sink_dir = Fixture::blank("backups/database");
        let settings = crawl_settings(&sink_dir);
        let mut ledger = ExportLedger::default();

        let report = run_export_with(&settings, Environment::Dev, &mut ledger, |_| Ok(Box::new(FakeSource::shop())));

        assert_eq!(report.status, ExportStatus::Success);
        assert!(report.sink.starts_with(sink_dir.to_path()));
        assert!(report.sink.file_name().unwrap().to_str().unwrap().starts_with("DEV-"));
        assert!(report.file_size.unwrap() > 0);
        assert!(fs::read_to_string(&report.sink).unwrap().contains("INSERT INTO `users`"));
        assert_eq!(report.transcript.lines()[0], "Connecting to database...");
        assert!(ledger.filename.is_none());
        assert!(report.message(&settings, Markup::Plain).starts_with("Database shop successfully exported to "));
    }

    #[test]
    fn failed_crawl_resumes_into_same_file()
    {
        let sink_dir = Fixture::blank("backups");
        let settings = crawl_settings(&sink_dir);
        let mut ledger = ExportLedger::default();

        let report = run_export_with(&settings, Environment::Dev, &mut ledger, |_| {
            let mut source = FakeSource::shop();
            source.fail_after.insert(String::from("empty"), 0);
            source.tables.swap(0, 1);
            source.tables[0].2.push(vec![crate::sql::SqlValue::Null]);
            Ok(Box::new(source))
        });
        assert_eq!(report.status, ExportStatus::Error);
        assert_eq!(ledger.filename.as_ref(), Some(&report.sink));

        let second = run_export_with(&settings, Environment::Dev, &mut ledger, |_| Ok(Box::new(FakeSource::shop())));
        assert_eq!(second.status, ExportStatus::Success);
        assert_eq!(second.sink, report.sink);
        assert!(ledger.filename.is_none());
    }

    #[test]
    fn connection_failure_starts_over()
    {
        let sink_dir = Fixture::blank("backups");
        let settings = crawl_settings(&sink_dir);
        let mut ledger = ExportLedger::default();

        let report = run_export_with(&settings, Environment::Live, &mut ledger, |_| Err(ExportError::CommandFailed{purpose: String::from("connect")}));
        assert_eq!(report.status, ExportStatus::Error);
        assert_eq!(report.transcript.lines().last().unwrap(), "Failed to run connect");
        assert!(ledger.filename.is_none());
        assert!(report.message(&settings, Markup::Plain).contains("MySQL User Name: app"));
    }

    #[test]
    fn missing_settings_are_reported()
    {
        let sink_dir = Fixture::blank("backups");
        let mut settings = crawl_settings(&sink_dir);
        settings.mysql.database = String::new();

        let report = run_export_with(&settings, Environment::Dev, &mut ExportLedger::default(), |_| Ok(Box::new(FakeSource::shop())));
        assert_eq!(report.status, ExportStatus::Error);
        assert_eq!(report.transcript.lines(), &[String::from("mysql.database not defined")]);
        assert!(!sink_dir.to_path().exists());
    }
}
