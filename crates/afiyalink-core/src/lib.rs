pub mod config;
pub mod coordinator;
pub mod languages;
pub mod shape;
pub mod state;
pub mod transport;
pub mod translator;

// Re-export main types for convenience
pub use config::{Config, ConfigError};
pub use coordinator::{PendingRequest, RequestCoordinator, Ticket, TRANSPORT_FAILURE_TEXT};
pub use languages::Language;
pub use shape::{RequestShape, CHAT_LANGUAGES, CHAT_PATH, TRANSLATE_PATH};
pub use state::{Message, RequestState, Sender, Session};
pub use transport::{HttpTransport, Transport, TransportError};
pub use translator::Translator;
