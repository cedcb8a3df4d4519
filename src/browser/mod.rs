pub mod auth_window;
pub mod connection;

pub use auth_window::BrowserAuthLauncher;
pub use connection::connect_or_launch;
