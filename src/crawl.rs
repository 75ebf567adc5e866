use log::{debug, warn/*, error, info, trace, log, Level*/};
use mysql::{prelude::Queryable, Conn, OptsBuilder, Row, Value};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ExportError, Result};
use crate::ledger::{ExportLedger, TableProgress};
use crate::settings::app_settings::Mysql;
use crate::sink;
use crate::sql::{self, quote_identifier, SqlValue};
use crate::transcript::Transcript;

/// Rows buffered before they are appended to the backup file, rounded down to a whole number of INSERT statements.
const ROWS_PER_WRITE: usize = 1000;

/**
Where the crawl reads the database from.
*/
pub trait DumpSource
{
    /// Next auto increment value per table, for tables that have one.
    fn auto_increments(&mut self) -> Result<BTreeMap<String, u64>>;
    fn table_names(&mut self) -> Result<Vec<String>>;
    fn count_rows(&mut self, table: &str) -> Result<u64>;
    fn create_statement(&mut self, table: &str) -> Result<Option<String>>;
    /// Feed every row of the table after the first `offset` to `f`, along with the column names.
    fn for_each_row(&mut self, table: &str, offset: u64, f: &mut dyn FnMut(&[String], Vec<SqlValue>) -> Result<()>) -> Result<()>;
}

#[derive(Clone, Copy, Debug)]
pub struct CrawlOptions
{
    pub drop_table: bool,
    pub insert_batch_size: usize
}

/**
A live MySQL connection, logged in as the export user with the configured database selected.
*/
pub struct MysqlSource
{
    conn: Conn,
    database: String
}

impl MysqlSource
{
    pub fn connect(mysql: &Mysql) -> Result<MysqlSource>
    {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(mysql.host.as_str()))
            .tcp_port(mysql.port)
            .user(Some(mysql.effective_username()))
            .pass(Some(mysql.effective_password()))
            .db_name(Some(mysql.database.as_str()));
        let conn = Conn::new(opts)?;
        Ok(MysqlSource{conn, database: mysql.database.clone()})
    }
}

impl DumpSource for MysqlSource
{
    fn auto_increments(&mut self) -> Result<BTreeMap<String, u64>>
    {
        let rows: Vec<Row> = self.conn.query("SHOW TABLE STATUS")?;
        let mut auto_increments = BTreeMap::new();
        for row in rows
        {
            let name = match row.get_opt::<String, _>("Name") {Some(Ok(n)) => n, _ => continue};
            let next = match row.get_opt::<Option<u64>, _>("Auto_increment") {Some(Ok(Some(v))) => v, _ => continue};
            auto_increments.insert(name, next);
        }
        Ok(auto_increments)
    }

    // views have no rows of their own to dump, so only base tables are listed
    fn table_names(&mut self) -> Result<Vec<String>>
    {
        let sql = format!("SHOW FULL TABLES FROM {} WHERE Table_type = 'BASE TABLE'", quote_identifier(&self.database));
        debug!("{}", sql);
        let tables: Vec<(String, String)> = self.conn.query(sql)?;
        Ok(tables.into_iter().map(|(name, _)| name).collect())
    }

    fn count_rows(&mut self, table: &str) -> Result<u64>
    {
        let count: Option<u64> = self.conn.query_first(format!("SELECT COUNT(*) FROM {}", quote_identifier(table)))?;
        Ok(count.unwrap_or(0))
    }

    fn create_statement(&mut self, table: &str) -> Result<Option<String>>
    {
        let row: Option<Row> = self.conn.query_first(format!("SHOW CREATE TABLE {}", quote_identifier(table)))?;
        Ok(row.and_then(|r| r.get_opt::<String, _>("Create Table")).and_then(|v| v.ok()))
    }

    fn for_each_row(&mut self, table: &str, offset: u64, f: &mut dyn FnMut(&[String], Vec<SqlValue>) -> Result<()>) -> Result<()>
    {
        let mut sql = format!("SELECT * FROM {}", quote_identifier(table));
        if offset > 0
        {
            // MySQL has no OFFSET without LIMIT, this is the documented "all remaining rows" value
            sql.push_str(&format!(" LIMIT 18446744073709551615 OFFSET {offset}"));
        }
        debug!("{}", sql);

        let result = self.conn.query_iter(sql)?;
        let columns: Vec<String> = result.columns().as_ref().iter().map(|c| c.name_str().into_owned()).collect();
        for row in result
        {
            let row = row?;
            let values = (0..row.len()).map(|i| sql_value(row.as_ref(i))).collect();
            f(&columns, values)?;
        }
        Ok(())
    }
}

fn sql_value(value: Option<&Value>) -> SqlValue
{
    match value
    {
        None | Some(Value::NULL) => SqlValue::Null,
        Some(Value::Bytes(bytes)) => SqlValue::from_bytes(bytes.clone()),
        Some(other) => SqlValue::Literal(other.as_sql(false))
    }
}

/**
Fetch the table list with fresh row counts. A table whose count can't be read is treated as empty.
*/
pub fn tables_data(source: &mut dyn DumpSource) -> Result<Vec<TableProgress>>
{
    let mut tables = Vec::new();
    for name in source.table_names()?
    {
        if name.is_empty() {continue;}
        let rows_total = match source.count_rows(&name)
        {
            Ok(n) => n,
            Err(e) => {warn!("Couldn't count rows of table {}, assuming none: {}", name, e); 0}
        };
        tables.push(TableProgress::new(&name, rows_total));
    }
    Ok(tables)
}

/**
Crawl the database and append (DROP+)CREATE+INSERT SQL to the backup file.

Tables the ledger already has as completed are skipped, so calling this again after a failure continues the same file.
*/
pub fn export_database_to_file(source: &mut dyn DumpSource, ledger: &mut ExportLedger, sink_file: &Path, options: CrawlOptions, transcript: &mut Transcript) -> Result<()>
{
    transcript.info("Preparing backup process...");
    sink::prepare_sink_file(sink_file)?;

    transcript.info("Loading data...");
    if ledger.auto_increments.is_empty()
    {
        ledger.auto_increments = source.auto_increments()?;
    }
    debug!("auto_increments: {:?}", ledger.auto_increments);

    let tables = tables_data(source)?;
    if tables.is_empty()
    {
        return Err(ExportError::NoTables);
    }
    ledger.merge_tables(tables);
    transcript.info("Loaded");

    transcript.info("Saving...");
    transcript.info(format!("There are {} tables", ledger.tables.len()));
    export_tables_to_file(source, ledger, sink_file, options, transcript)?;
    transcript.info("Exported all tables");

    transcript.info("Backup Complete");
    Ok(())
}

/**
Write structure and data of every table the ledger has that isn't completed yet.

A table's structure is written once per backup file, so a table interrupted part way
gets its remaining rows appended without repeating the CREATE.
*/
pub fn export_tables_to_file(source: &mut dyn DumpSource, ledger: &mut ExportLedger, sink_file: &Path, options: CrawlOptions, transcript: &mut Transcript) -> Result<()>
{
    let batch = options.insert_batch_size.max(1);
    let rows_per_write = usize::max(ROWS_PER_WRITE / batch, 1) * batch;

    let tables = ledger.tables.clone();
    for table in tables
    {
        let name = table.name.as_str();
        if table.completed
        {
            transcript.info(format!("Table {name} already complete; skipping"));
            continue;
        }
        transcript.info(format!("Saving table {name}..."));

        if !table.structure_written
        {
            let create = source.create_statement(name)?.ok_or_else(|| ExportError::NoCreateStatement(name.to_string()))?;
            let auto_increment = ledger.auto_increments.get(name).copied();
            sink::append(sink_file, &sql::table_structure(name, &create, auto_increment, options.drop_table))?;
            sink::append(sink_file, &sql::data_header(name))?;
            ledger.mark_structure_written(name);
        }

        let mut pending: Vec<Vec<SqlValue>> = Vec::new();
        let mut column_names: Vec<String> = Vec::new();
        source.for_each_row(name, table.rows_done, &mut |columns, row| {
            if column_names.is_empty()
            {
                column_names = columns.to_vec();
            }
            pending.push(row);
            if pending.len() >= rows_per_write
            {
                flush_rows(ledger, sink_file, name, &column_names, &mut pending, batch)?;
            }
            Ok(())
        })?;
        flush_rows(ledger, sink_file, name, &column_names, &mut pending, batch)?;

        sink::append(sink_file, &sql::data_footer())?;
        ledger.mark_completed(name);
        transcript.info(format!("Exported table {name}"));
    }
    Ok(())
}

fn flush_rows(ledger: &mut ExportLedger, sink_file: &Path, table: &str, columns: &[String], rows: &mut Vec<Vec<SqlValue>>, batch: usize) -> Result<()>
{
    if rows.is_empty() {return Ok(());}
    sink::append(sink_file, &sql::insert_statements(table, columns, rows, batch))?;
    ledger.mark_rows(table, rows.len() as u64);
    rows.clear();
    Ok(())
}

#[cfg(test)]
pub mod tests
{
    use super::*;
    use crate::testing::fixtures::Fixture;
    use std::fs;

    /// An in-memory database. Tables listed in `fail_after` error once that many rows have been read in a single pass.
    #[derive(Default)]
    pub struct FakeSource
    {
        pub tables: Vec<(String, Vec<String>, Vec<Vec<SqlValue>>)>,
        pub auto_increments: BTreeMap<String, u64>,
        pub fail_after: BTreeMap<String, usize>,
        pub status_queries: usize
    }

    impl FakeSource
    {
        pub fn shop() -> FakeSource
        {
            let text = |s: &str| SqlValue::Text(String::from(s));
            let mut source = FakeSource::default();
            source.tables.push((String::from("users"), vec![String::from("id"), String::from("name")], vec![
                vec![text("1"), text("ann")],
                vec![text("2"), text("o'brien")],
                vec![text("3"), SqlValue::Null],
            ]));
            source.tables.push((String::from("empty"), vec![String::from("x")], Vec::new()));
            source.auto_increments.insert(String::from("users"), 4);
            source
        }

        fn table(&self, name: &str) -> Option<&(String, Vec<String>, Vec<Vec<SqlValue>>)>
        {
            self.tables.iter().find(|t| t.0 == name)
        }
    }

    impl DumpSource for FakeSource
    {
        fn auto_increments(&mut self) -> Result<BTreeMap<String, u64>>
        {
            self.status_queries += 1;
            Ok(self.auto_increments.clone())
        }

        fn table_names(&mut self) -> Result<Vec<String>>
        {
            Ok(self.tables.iter().map(|t| t.0.clone()).collect())
        }

        fn count_rows(&mut self, table: &str) -> Result<u64>
        {
            Ok(self.table(table).map(|t| t.2.len() as u64).unwrap_or(0))
        }

        fn create_statement(&mut self, table: &str) -> Result<Option<String>>
        {
            Ok(self.table(table).map(|t| format!("CREATE TABLE `{}` (`{}` text)", t.0, t.1.join("` text, `"))))
        }

        fn for_each_row(&mut self, table: &str, offset: u64, f: &mut dyn FnMut(&[String], Vec<SqlValue>) -> Result<()>) -> Result<()>
        {
            let fail_after = self.fail_after.remove(table);
            let (_, columns, rows) = self.table(table).cloned().ok_or_else(|| ExportError::NoCreateStatement(table.to_string()))?;
            for (read, row) in rows.into_iter().skip(offset as usize).enumerate()
            {
                if fail_after == Some(read)
                {
                    return Err(ExportError::Io(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "lost connection")));
                }
                f(&columns, row)?;
            }
            Ok(())
        }
    }

    fn options(batch: usize) -> CrawlOptions
    {
        CrawlOptions{drop_table: false, insert_batch_size: batch}
    }

    #[test]
    fn full_export()
    {
        let sink_file = Fixture::blank("dump.sql");
        let mut source = FakeSource::shop();
        let mut ledger = ExportLedger::default();
        let mut transcript = Transcript::default();

        export_database_to_file(&mut source, &mut ledger, sink_file.to_path(), options(1), &mut transcript).unwrap();

        let dump = fs::read_to_string(sink_file.to_path()).unwrap();
        assert!(dump.starts_with("--\n-- Table structure for `users`\n--\n\nCREATE TABLE IF NOT EXISTS `users` (`id` text, `name` text) AUTO_INCREMENT=4;\n"));
        assert!(dump.contains("-- Data to be inserted into table `users`"));
        assert!(dump.contains("INSERT INTO `users` (`id`, `name`) VALUES ('2', 'o\\'brien');\n"));
        assert!(dump.contains("INSERT INTO `users` (`id`, `name`) VALUES ('3', NULL);\n"));
        assert_eq!(dump.matches("INSERT INTO").count(), 3);
        // empty tables still get their structure
        assert!(dump.contains("CREATE TABLE IF NOT EXISTS `empty` (`x` text);\n"));
        assert_eq!(dump.matches("-- ------").count(), 2);

        assert!(ledger.is_finished());
        assert_eq!(ledger.completed_tables, vec![String::from("users"), String::from("empty")]);
        assert_eq!(ledger.table("users").unwrap().rows_done, 3);
        assert!(transcript.lines().contains(&String::from("There are 2 tables")));
        assert_eq!(transcript.lines().last().unwrap(), "Backup Complete");
    }

    #[test]
    fn batched_inserts()
    {
        let sink_file = Fixture::blank("dump.sql");
        let mut source = FakeSource::shop();
        let mut ledger = ExportLedger::default();
        export_database_to_file(&mut source, &mut ledger, sink_file.to_path(), options(2), &mut Transcript::default()).unwrap();

        let dump = fs::read_to_string(sink_file.to_path()).unwrap();
        assert!(dump.contains("VALUES ('1', 'ann'), ('2', 'o\\'brien');\n"));
        assert_eq!(dump.matches("INSERT INTO").count(), 2);
    }

    #[test]
    fn no_tables_is_an_error()
    {
        let sink_file = Fixture::blank("dump.sql");
        let mut source = FakeSource::default();
        let result = export_database_to_file(&mut source, &mut ExportLedger::default(), sink_file.to_path(), options(1), &mut Transcript::default());
        assert!(matches!(result, Err(ExportError::NoTables)));
    }

    #[test]
    fn resumes_after_interruption()
    {
        let sink_file = Fixture::blank("dump.sql");
        let mut source = FakeSource::shop();
        source.tables.insert(0, (String::from("first"), vec![String::from("a")], vec![vec![SqlValue::Literal(String::from("7"))]]));
        source.fail_after.insert(String::from("users"), 0);
        let mut ledger = ExportLedger::default();

        let opts = CrawlOptions{drop_table: true, insert_batch_size: 1};

        let first = export_database_to_file(&mut source, &mut ledger, sink_file.to_path(), opts, &mut Transcript::default());
        assert!(first.is_err());
        assert_eq!(ledger.completed_tables, vec![String::from("first")]);
        let users = ledger.table("users").unwrap();
        assert!(!users.completed);
        assert!(users.structure_written);
        assert_eq!(users.rows_done, 0);

        let mut transcript = Transcript::default();
        export_database_to_file(&mut source, &mut ledger, sink_file.to_path(), opts, &mut transcript).unwrap();
        assert!(transcript.lines().contains(&String::from("Table first already complete; skipping")));
        assert_eq!(source.status_queries, 1);

        let dump = fs::read_to_string(sink_file.to_path()).unwrap();
        assert_eq!(dump.matches("CREATE TABLE IF NOT EXISTS `first`").count(), 1);
        assert_eq!(dump.matches("INSERT INTO `first`").count(), 1);
        assert_eq!(dump.matches("CREATE TABLE IF NOT EXISTS `users`").count(), 1);
        assert_eq!(dump.matches("DROP TABLE IF EXISTS `users`").count(), 1);
        assert_eq!(dump.matches("-- Data to be inserted into table `users`").count(), 1);
        assert_eq!(dump.matches("INSERT INTO `users`").count(), 3);
        assert!(ledger.is_finished());
    }

    #[test]
    fn partially_written_table_keeps_going_without_repeating_structure()
    {
        let sink_file = Fixture::blank("dump.sql");
        let mut source = FakeSource::shop();
        let mut ledger = ExportLedger::default();
        ledger.auto_increments = source.auto_increments.clone();
        ledger.merge_tables(tables_data(&mut source).unwrap());
        ledger.mark_structure_written("users");
        ledger.mark_rows("users", 2);

        export_tables_to_file(&mut source, &mut ledger, sink_file.to_path(), options(1), &mut Transcript::default()).unwrap();

        let dump = fs::read_to_string(sink_file.to_path()).unwrap();
        assert!(!dump.contains("CREATE TABLE IF NOT EXISTS `users`"));
        assert_eq!(dump.matches("INSERT INTO `users`").count(), 1);
        assert!(dump.contains("VALUES ('3', NULL)"));
        assert_eq!(ledger.table("users").unwrap().rows_done, 3);
    }

    #[test]
    fn drop_table_option()
    {
        let sink_file = Fixture::blank("dump.sql");
        let mut source = FakeSource::shop();
        let opts = CrawlOptions{drop_table: true, insert_batch_size: 1};
        export_database_to_file(&mut source, &mut ExportLedger::default(), sink_file.to_path(), opts, &mut Transcript::default()).unwrap();
        let dump = fs::read_to_string(sink_file.to_path()).unwrap();
        assert!(dump.contains("DROP TABLE IF EXISTS `users`;\nCREATE TABLE IF NOT EXISTS `users`"));
    }

    #[test]
    fn mysql_values()
    {
        assert_eq!(sql_value(None), SqlValue::Null);
        assert_eq!(sql_value(Some(&Value::NULL)), SqlValue::Null);
        assert_eq!(sql_value(Some(&Value::Bytes(b"abc".to_vec()))), SqlValue::Text(String::from("abc")));
        assert_eq!(sql_value(Some(&Value::Int(-3))), SqlValue::Literal(String::from("-3")));
    }
}
