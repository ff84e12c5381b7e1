pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod state;
pub mod status;
pub mod store;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use store::Store;
