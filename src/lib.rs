pub mod commands;
pub mod dist;
pub mod download;
pub mod http;
pub mod i18n;
pub mod models;
pub mod notify;
pub mod paths;
pub mod release;
pub mod runtime;
pub mod settings;
pub mod state;
pub mod store;
