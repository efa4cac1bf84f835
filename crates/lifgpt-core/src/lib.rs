pub mod ai;
pub mod config;
pub mod format;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::{ClientError, InferenceClient, LifGptClient};
pub use config::Config;
pub use format::{format, Formatter};
pub use session::{ChatSession, Exchange, Outcome, Status, RESPONSE_ERROR};
pub use state::{ChatMessage, Sender};
