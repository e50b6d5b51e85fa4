//! Host-side control of a CGRA fabric.
//!
//! Two independent channels reach the hardware:
//! a memory-mapped register window exposed through UIO, and a UART link to a
//! 16-bit ALU that exchanges Q8.7 fixed-point operands.
//!
//! # Crate Structure
//!
//! - [`bus`]: UIO discovery and the mapped register window
//! - [`transport`]: raw-mode serial link and the [`transport::Link`] seam
//! - [`frame`]: Q8.7 codec, opcodes, and the 5-byte / 2-byte frames
//! - [`protocol`]: one-command-one-response exchanges over a link

/// Re-export register bus types.
pub mod bus {
    pub use cgractl_bus::*;
}

/// Re-export transport types.
pub mod transport {
    pub use cgractl_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use cgractl_frame::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use cgractl_protocol::*;
}
