use log::{info/*, error, warn, debug, trace, log, Level*/};
use serde::Serialize;

/**
Progress messages of one export. Each is logged as it happens and kept so the web page can echo them back.
*/
#[derive(Serialize, Clone, Debug, Default)]
pub struct Transcript
{
    lines: Vec<String>
}

impl Transcript
{
    pub fn info(&mut self, message: impl Into<String>)
    {
        let message = message.into();
        info!("{}", message);
        self.lines.push(message);
    }

    pub fn lines(&self) -> &[String]
    {
        &self.lines
    }
}
