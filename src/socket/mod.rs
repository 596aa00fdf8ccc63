//! Role-oriented socket types.
//!
//! Every type here composes the same base: a [`Socket`] owning exactly one
//! descriptor. [`Acceptor`] drives the bind/listen/accept lifecycle and
//! [`StreamSocket`] is the connected peer-to-peer byte stream it hands out.

mod acceptor;
mod options;
mod sock;
mod stream;

pub use self::acceptor::{
	AcceptResult, Acceptor, DEFAULT_BACKLOG, Tcp6Acceptor, TcpAcceptor, UnixAcceptor,
};
pub use self::options::{set_reuse_addr, set_reuse_port, set_tcp_nodelay};
pub use self::sock::{Shutdown, Socket};
pub use self::stream::{StreamSocket, Tcp6Socket, TcpSocket, UnixSocket};
