use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/**
Which deployment the app is running as. It picks the sink file prefix and decides who may export.
*/
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment
{
    Dev,
    Qa,
    Live
}

impl Environment
{
    /**
    Work out the environment from the path the app was reached at.

    Anything under a `/qa/` or `/remote/` directory is QA, anything under `/dev/` is DEV, everything else is LIVE.

    # Examples
    ```
    use dbexport::environment::Environment;

    assert_eq!(Environment::detect("/site/dev/export"), Environment::Dev);
    assert_eq!(Environment::detect("/REMOTE/export"), Environment::Qa);
    assert_eq!(Environment::detect("/export"), Environment::Live);
    ```
    */
    pub fn detect(script_path: &str) -> Environment
    {
        let path = script_path.to_lowercase();
        if path.contains("/qa/") || path.contains("/remote/")
        {
            Environment::Qa
        }else if path.contains("/dev/") {
            Environment::Dev
        }else{
            Environment::Live
        }
    }

    /// Only the DEV environment is allowed to run exports over HTTP.
    pub fn is_admin(&self) -> bool
    {
        *self == Environment::Dev
    }

    pub fn as_str(&self) -> &'static str
    {
        match self
        {
            Environment::Dev => "DEV",
            Environment::Qa => "QA",
            Environment::Live => "LIVE"
        }
    }
}

impl fmt::Display for Environment
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_uppercase().as_str()
        {
            "DEV" => Ok(Environment::Dev),
            "QA" => Ok(Environment::Qa),
            "LIVE" => Ok(Environment::Live),
            other => Err(format!("Not an environment: {other}"))
        }
    }
}
