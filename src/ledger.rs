use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

/**
How far the export of one table has got.
*/
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct TableProgress
{
    pub name: String,
    pub rows_done: u64,
    pub rows_total: u64,
    /// The DROP/CREATE and data banner are in the file, so a retry only appends rows.
    pub structure_written: bool,
    pub completed: bool
}

impl TableProgress
{
    pub fn new(name: &str, rows_total: u64) -> Self
    {
        TableProgress{name: String::from(name), rows_done: 0, rows_total, structure_written: false, completed: false}
    }
}

/**
Bookkeeping that lets a repeated export request carry on where an interrupted one stopped, appending to the same file.

This only lives in memory. It is advice for the next attempt, not a checkpoint: if the process dies the ledger goes with it,
and the next export starts a new file.
*/
#[derive(Serialize, Clone, Debug, Default)]
pub struct ExportLedger
{
    pub filename: Option<PathBuf>,
    pub auto_increments: BTreeMap<String, u64>,
    pub tables: Vec<TableProgress>,
    pub completed_tables: Vec<String>
}

impl ExportLedger
{
    /**
    The backup file this export writes to: the one an unfinished export was using, else `default`, which is then remembered.

    # Examples
    ```
    use std::path::PathBuf;
    use dbexport::ledger::ExportLedger;

    let mut ledger = ExportLedger::default();
    assert_eq!(ledger.sink_or_insert(PathBuf::from("a.sql")), PathBuf::from("a.sql"));
    assert_eq!(ledger.sink_or_insert(PathBuf::from("b.sql")), PathBuf::from("a.sql"));
    ```
    */
    pub fn sink_or_insert(&mut self, default: PathBuf) -> PathBuf
    {
        self.filename.get_or_insert(default).clone()
    }

    /**
    Replace the table list with a freshly loaded one. Progress of tables we already knew about is kept,
    tables that have gone away are forgotten.
    */
    pub fn merge_tables(&mut self, fresh: Vec<TableProgress>)
    {
        self.tables = fresh.into_iter().map(|mut table| {
            if let Some(known) = self.table(&table.name)
            {
                table.rows_done = known.rows_done;
                table.structure_written = known.structure_written;
                table.completed = known.completed;
            }
            table
        }).collect();
    }

    pub fn table(&self, name: &str) -> Option<&TableProgress>
    {
        self.tables.iter().find(|t| t.name == name)
    }

    fn table_mut(&mut self, name: &str) -> Option<&mut TableProgress>
    {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    pub fn mark_rows(&mut self, name: &str, rows: u64)
    {
        if let Some(table) = self.table_mut(name)
        {
            table.rows_done += rows;
        }
    }

    pub fn mark_structure_written(&mut self, name: &str)
    {
        if let Some(table) = self.table_mut(name)
        {
            table.structure_written = true;
        }
    }

    pub fn mark_completed(&mut self, name: &str)
    {
        if let Some(table) = self.table_mut(name)
        {
            table.completed = true;
            if !self.completed_tables.iter().any(|t| t == name)
            {
                self.completed_tables.push(String::from(name));
            }
        }
    }

    /// Names of the tables still to do, in export order.
    pub fn pending(&self) -> Vec<String>
    {
        self.tables.iter().filter(|t| !t.completed).map(|t| t.name.clone()).collect()
    }

    pub fn is_finished(&self) -> bool
    {
        !self.tables.is_empty() && self.tables.iter().all(|t| t.completed)
    }

    pub fn reset(&mut self)
    {
        *self = ExportLedger::default();
    }
}

lazy_static!
{
    /// The ledger shared by every export this process runs.
    pub static ref LEDGER: Mutex<ExportLedger> = Mutex::new(ExportLedger::default());
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn merge_keeps_progress_and_drops_missing()
    {
        let mut ledger = ExportLedger::default();
        ledger.merge_tables(vec![TableProgress::new("users", 3), TableProgress::new("old", 1)]);
        ledger.mark_rows("users", 2);
        ledger.mark_structure_written("users");
        ledger.mark_completed("old");

        ledger.merge_tables(vec![TableProgress::new("orders", 5), TableProgress::new("users", 4)]);
        assert_eq!(ledger.tables.len(), 2);
        assert_eq!(ledger.tables[0], TableProgress::new("orders", 5));
        assert_eq!(ledger.table("users"), Some(&TableProgress{name: String::from("users"), rows_done: 2, rows_total: 4, structure_written: true, completed: false}));
        assert!(ledger.table("old").is_none());
    }

    #[test]
    fn completion()
    {
        let mut ledger = ExportLedger::default();
        assert!(!ledger.is_finished());
        ledger.merge_tables(vec![TableProgress::new("a", 0), TableProgress::new("b", 0)]);
        ledger.mark_completed("a");
        ledger.mark_completed("a");
        assert_eq!(ledger.pending(), vec![String::from("b")]);
        assert_eq!(ledger.completed_tables, vec![String::from("a")]);
        assert!(!ledger.is_finished());
        ledger.mark_completed("b");
        assert!(ledger.is_finished());
    }

    #[test]
    fn unknown_tables_are_ignored()
    {
        let mut ledger = ExportLedger::default();
        ledger.mark_rows("ghost", 10);
        ledger.mark_completed("ghost");
        assert!(ledger.tables.is_empty());
        assert!(ledger.completed_tables.is_empty());
    }

    #[test]
    fn reset_forgets_everything()
    {
        let mut ledger = ExportLedger::default();
        ledger.sink_or_insert(PathBuf::from("a.sql"));
        ledger.auto_increments.insert(String::from("users"), 7);
        ledger.reset();
        assert!(ledger.filename.is_none());
        assert!(ledger.auto_increments.is_empty());
    }
}
