pub mod config;
mod dist;
mod fetch;
mod models;
mod resolve;
mod state;

pub use config::GlobalOptions;
pub use dist::dist;
pub use fetch::fetch;
pub use models::models;
pub use resolve::resolve;
pub use state::{StateAction, state};
