use actix_web::{web, web::Data, App, HttpServer};
use log::{/*error, warn,*/ info, /*debug, trace, log, Level*/};

use dbexport::{resources::pages, settings::app_settings::Settings, app_logger::setup_logger};

/**
Start the web interface for dbexport

# Returns
Result, but only when actix-web fails to bind to the port we want to use for HTTP.
*/
#[actix_rt::main]
async fn main() -> std::io::Result<()>
{
    let settings = Settings::load();
    setup_logger(&settings);

    info!("Starting dbexport web interface on {}", settings.startup.listen_addr);

    //Start the HTTP server
    let settings_clone = settings.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(Data::new(settings_clone.clone()))
            .route("/", web::get().to(pages::index))                  // status of backups and any unfinished export
            .route("/export", web::get().to(pages::export))           // run an export
            .route("/dev/export", web::get().to(pages::export))
            .route("/qa/export", web::get().to(pages::export))
            .route("/remote/export", web::get().to(pages::export))
            .default_service(web::route().to(pages::notfound))        // where to go when nothing else matches
    })
    .bind(&settings.startup.listen_addr)?
    .run()
    .await
}
