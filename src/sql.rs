use regex::Regex;
use std::fmt::Write;

/**
One column value of a row, as it should appear in an INSERT statement.
*/
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue
{
    Null,
    /// Already a valid SQL literal such as a number, written as is.
    Literal(String),
    Text(String),
    /// Bytes that aren't valid UTF-8, written as a hex literal.
    Binary(Vec<u8>)
}

impl SqlValue
{
    pub fn from_bytes(bytes: Vec<u8>) -> SqlValue
    {
        match String::from_utf8(bytes)
        {
            Ok(s) => SqlValue::Text(s),
            Err(e) => SqlValue::Binary(e.into_bytes())
        }
    }

    /**
    # Examples
    ```
    use dbexport::sql::SqlValue;

    assert_eq!(SqlValue::Null.to_literal(), "NULL");
    assert_eq!(SqlValue::Literal(String::from("42")).to_literal(), "42");
    assert_eq!(SqlValue::Text(String::from("it's")).to_literal(), r"'it\'s'");
    assert_eq!(SqlValue::Binary(vec![0xff, 0x00]).to_literal(), "0xFF00");
    ```
    */
    pub fn to_literal(&self) -> String
    {
        match self
        {
            SqlValue::Null => String::from("NULL"),
            SqlValue::Literal(n) => n.clone(),
            SqlValue::Text(s) => format!("'{}'", escape_string(s)),
            SqlValue::Binary(b) if b.is_empty() => String::from("''"),
            SqlValue::Binary(b) => {
                let mut hex = String::with_capacity(2 + b.len() * 2);
                hex.push_str("0x");
                for byte in b
                {
                    let _ = write!(hex, "{byte:02X}");
                }
                hex
            }
        }
    }
}

/// Backtick-quote a table or column name.
pub fn quote_identifier(name: &str) -> String
{
    format!("`{}`", name.replace('`', "``"))
}

/**
Escape a string for use inside single quotes, the same characters the MySQL client library escapes.
*/
pub fn escape_string(s: &str) -> String
{
    let mut out = String::with_capacity(s.len());
    for c in s.chars()
    {
        match c
        {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\x1a' => out.push_str("\\Z"),
            _ => out.push(c)
        }
    }
    out
}

/**
The schema part of a table's dump: a banner, optionally a DROP, then the create statement.

The create statement is made idempotent with IF NOT EXISTS, and gets the table's next auto increment value
unless it already states one.
*/
pub fn table_structure(table: &str, create_statement: &str, auto_increment: Option<u64>, drop_table: bool) -> String
{
    let name = quote_identifier(table);
    let mut out = format!("--\n-- Table structure for {name}\n--\n\n");

    if drop_table
    {
        out.push_str(&format!("DROP TABLE IF EXISTS {name};\n"));
    }

    let mut create = CREATE_TABLE_REGEX.replace(create_statement.trim_end().trim_end_matches(';'), "CREATE TABLE IF NOT EXISTS ").into_owned();
    if let Some(next) = auto_increment
    {
        if !AUTO_INCREMENT_OPTION_REGEX.is_match(&create)
        {
            create.push_str(&format!(" AUTO_INCREMENT={next}"));
        }
    }
    out.push_str(&create);
    out.push_str(";\n\n\n");
    out
}

pub fn data_header(table: &str) -> String
{
    format!("--\n-- Data to be inserted into table {}\n--\n\n", quote_identifier(table))
}

pub fn data_footer() -> String
{
    String::from("\n\n-- --------------------------------------------------------\n\n")
}

/**
INSERT statements for a slice of rows, with up to `batch` rows per statement. A batch of 0 is treated as 1.

# Examples
```
use dbexport::sql::{insert_statements, SqlValue};

let columns = vec![String::from("id"), String::from("name")];
let rows = vec![
    vec![SqlValue::Literal(String::from("1")), SqlValue::Text(String::from("ann"))],
    vec![SqlValue::Literal(String::from("2")), SqlValue::Null],
];
assert_eq!(
    insert_statements("users", &columns, &rows, 2),
    "INSERT INTO `users` (`id`, `name`) VALUES (1, 'ann'), (2, NULL);\n"
);
```
*/
pub fn insert_statements(table: &str, columns: &[String], rows: &[Vec<SqlValue>], batch: usize) -> String
{
    let prefix = format!(
        "INSERT INTO {} ({}) VALUES ",
        quote_identifier(table),
        columns.iter().map(|c| quote_identifier(c)).collect::<Vec<String>>().join(", ")
    );

    let mut out = String::new();
    for chunk in rows.chunks(batch.max(1))
    {
        let tuples = chunk.iter()
            .map(|row| format!("({})", row.iter().map(SqlValue::to_literal).collect::<Vec<String>>().join(", ")))
            .collect::<Vec<String>>()
            .join(", ");
        out.push_str(&prefix);
        out.push_str(&tuples);
        out.push_str(";\n");
    }
    out
}

lazy_static!
{
    static ref CREATE_TABLE_REGEX: Regex = Regex::new(r"(?i)^\s*CREATE\s+TABLE\s+(IF\s+NOT\s+EXISTS\s+)?").expect("Error in regex for matching create statements");
    static ref AUTO_INCREMENT_OPTION_REGEX: Regex = Regex::new(r"(?i)\bAUTO_INCREMENT\s*=\s*\d+").expect("Error in regex for matching table auto increment option");
}
