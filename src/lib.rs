#[macro_use]
extern crate lazy_static;

pub mod app_logger;
pub mod crawl;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod export;
pub mod ledger;
pub mod mysqldump;
pub mod resources;
pub mod settings;
pub mod shell;
pub mod sink;
pub mod sql;
pub mod status;
pub mod testing;
pub mod transcript;
pub mod verbosity;
