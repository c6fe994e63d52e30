//! Address resolution and socket handling
//!
//! This module finds the local and remote addresses of a query and owns the
//! two sockets of the exchange: a raw socket for the hand-built request and a
//! bound UDP socket for the reply.

mod interface;
mod resolver;
mod transport;

pub use self::interface::interface_addr;
pub use self::resolver::resolve_host;
pub use self::transport::{RawSender, ResponseListener};
