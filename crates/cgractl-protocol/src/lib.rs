//! Command protocol for the remote ALU.
//!
//! One exchange is one 5-byte command followed by one 2-byte reply, fully
//! synchronous. A [`Session`] owns its link and moves between two states,
//! `Idle` and `AwaitingResponse`; there is never more than one exchange in flight.

pub mod error;
pub mod session;

pub use error::{ProtocolError, Result};
pub use session::{execute, ExchangeState, Session, SessionConfig};
