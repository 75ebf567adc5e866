use dbexport::{dispatch::dispatch, settings::app_settings::Settings, app_logger::setup_logger};

/**
The command line manual interface to dbexport.
*/
fn main()
{
    let settings = Settings::load();
    setup_logger(&settings);
    std::process::exit(dispatch(&settings));
}
