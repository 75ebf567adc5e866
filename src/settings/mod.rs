pub mod app_settings;
pub mod settings_resolver;
