// LSP protocol layer
// - server.rs: connection accept loop, one session per connection
// - session.rs: read-dispatch-write loop for one peer
// - dispatcher.rs: method routing and lifecycle gating
// - handlers.rs: request/notification handlers
// - context.rs: per-session state (lifecycle, documents)
// - diagnostics.rs: syntax-error diagnostics
// - capabilities.rs: server-owned capabilities

pub mod capabilities;
pub mod context;
pub mod diagnostics;
pub mod dispatcher;
pub mod handlers;
pub mod server;
pub mod session;

pub use context::{SessionContext, SessionState};
pub use server::{Server, run_server};
pub use session::{Session, SessionError, Termination};
