pub mod comment_service;
pub mod in_flight;
pub mod mutation_coordinator;
pub mod session_service;

pub use comment_service::{CommentError, CommentService};
pub use in_flight::{InFlightRegistry, InFlightSnapshot};
pub use mutation_coordinator::{MutationCoordinator, ToggleError, ToggleOutcome};
pub use session_service::{SessionService, SessionSummary};
