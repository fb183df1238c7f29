pub mod coordinator;
pub mod locks;
pub mod types;

pub use coordinator::BookingCoordinator;
pub use types::{BookingOutcome, BookingRequest, BookingState, RejectReason};
