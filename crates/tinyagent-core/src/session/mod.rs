//! Conversation state and the interactive session loop
//!
//! - `Conversation`: ordered turns plus attached documents
//! - `Session`: drives one request at a time through model calls and tool rounds
//! - `SessionIo`: where lines come from and where events go

mod conversation;
mod state;
mod io;
#[allow(clippy::module_inception)]
mod session;

pub use conversation::{Conversation, ConversationError, TokenEstimate};
pub use state::{Directive, SessionState};
pub use io::{SessionEvent, SessionIo, UsageReport};
pub use session::Session;
