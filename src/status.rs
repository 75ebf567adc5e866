use serde::Serialize;

/**
Outcome of an export, following the exit codes of mysqldump. The crawl reports `Error` when it fails.
*/
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportStatus
{
    Success,
    Warning,
    Error,
    ConsCheck,
    OutOfMemory,
    OutOfDisk,
    IllegalTable,
    Unknown(i32)
}

/// Line ending and markup for the message: HTML for the web page, plain for the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Markup
{
    Html,
    Plain
}

/// What the status message needs to know about the export.
pub struct MessageContext<'a>
{
    pub database: &'a str,
    pub sink: &'a str,
    pub username: &'a str,
    pub host: &'a str,
    pub sink_exists: bool
}

impl ExportStatus
{
    pub fn from_exit_code(code: i32) -> ExportStatus
    {
        match code
        {
            0 => ExportStatus::Success,
            1 => ExportStatus::Warning,
            2 => ExportStatus::Error,
            3 => ExportStatus::ConsCheck,
            4 => ExportStatus::OutOfMemory,
            5 => ExportStatus::OutOfDisk,
            6 => ExportStatus::IllegalTable,
            other => ExportStatus::Unknown(other)
        }
    }

    pub fn exit_code(&self) -> i32
    {
        match self
        {
            ExportStatus::Success => 0,
            ExportStatus::Warning => 1,
            ExportStatus::Error => 2,
            ExportStatus::ConsCheck => 3,
            ExportStatus::OutOfMemory => 4,
            ExportStatus::OutOfDisk => 5,
            ExportStatus::IllegalTable => 6,
            ExportStatus::Unknown(code) => *code
        }
    }

    pub fn is_success(&self) -> bool
    {
        *self == ExportStatus::Success
    }

    /**
    Human readable description of the outcome.

    # Examples
    ```
    use dbexport::status::{ExportStatus, Markup, MessageContext};

    let ctx = MessageContext{database: "shop", sink: "LIVE-1.sql", username: "root", host: "db", sink_exists: true};
    assert_eq!(
        ExportStatus::Success.message(&ctx, Markup::Plain),
        "Database shop successfully exported to LIVE-1.sql\n"
    );
    ```
    */
    pub fn message(&self, ctx: &MessageContext, markup: Markup) -> String
    {
        let eol = match markup {Markup::Html => "<br/>\n", Markup::Plain => "\n"};
        let b = |s: &str| match markup {Markup::Html => format!("<b>{}</b>", html_escape(s)), Markup::Plain => String::from(s)};
        let (database, sink) = (b(ctx.database), b(ctx.sink));

        match self
        {
            ExportStatus::Success => {
                let mut message = format!("Database {database} successfully exported to {sink}{eol}");
                if !ctx.sink_exists
                {
                    let plain_sink = match markup {Markup::Html => html_escape(ctx.sink), Markup::Plain => String::from(ctx.sink)};
                    message.push_str(&format!("WARNING: Backup-function reports success, but {plain_sink} doesn't exist or isn't readable{eol}"));
                }
                message
            },
            ExportStatus::Warning => format!("There was a warning during the export of {database} to {sink}{eol}"),
            ExportStatus::Error => match markup
            {
                Markup::Html => format!(
                    "There was an error during export. Please check your values:{eol}<table><tr><td>MySQL Database Name:</td><td>{database}</td></tr><tr><td>MySQL User Name:</td><td>{}</td></tr><tr><td>MySQL Password:</td><td><b>NOTSHOWN</b></td></tr><tr><td>MySQL Host Name:</td><td>{}</td></tr></table>{eol}",
                    b(ctx.username), b(ctx.host)
                ),
                Markup::Plain => format!(
                    "There was an error during export. Please check your values:{eol}  MySQL Database Name: {database}{eol}  MySQL User Name: {}{eol}  MySQL Password: NOTSHOWN{eol}  MySQL Host Name: {}{eol}",
                    ctx.username, ctx.host
                )
            },
            ExportStatus::ConsCheck => format!("There was a CONSCHECK Error during the export of {database} to {sink}{eol}"),
            ExportStatus::OutOfMemory => format!("There was a EOM (out of memory?) Error during the export of {database} to {sink}{eol}"),
            ExportStatus::OutOfDisk => format!("There was a EOF (out of disk-space?) Error during the export of {database} to {sink}{eol}"),
            ExportStatus::IllegalTable => format!("There was an Illegal Table Error during the export of {database} to {sink}. Please turn off piping, and try again.{eol}"),
            ExportStatus::Unknown(code) => format!("The export of {database} to {sink} ended with unexpected exit code {code}{eol}")
        }
    }
}

pub fn html_escape(s: &str) -> String
{
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;").replace('\'', "&#39;")
}
