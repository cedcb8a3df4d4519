pub mod message_handler;
pub mod submit_flow;

pub use message_handler::MessageHandler;
pub use submit_flow::{resolve_code, SolutionForm};
