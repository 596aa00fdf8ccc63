//! RAII wrappers around BSD stream sockets: TCP over IPv4/IPv6 and
//! Unix-domain streams.
//!
//! The crate is built around three pieces:
//! - address value types per family ([`InetAddr`], [`Inet6Addr`],
//!   [`UnixAddr`]), converted to and from the native `sockaddr` layouts
//!   only at the syscall boundary;
//! - a move-only socket handle owner ([`Socket`]) that closes its
//!   descriptor exactly once;
//! - an [`Acceptor`] driving the open → bind → listen → accept lifecycle,
//!   handing out connected [`StreamSocket`]s.
//!
//! There is no buffering, multiplexing, or event loop here; callers bring
//! their own concurrency model around `accept()`.

pub mod socket;
mod addr;
mod error;

pub use self::addr::{
	AsSockAddr, Family, FromSockAddr, Inet6Addr, InetAddr, Ipv4, Ipv6, Unix, UnixAddr,
};
pub use self::error::{errno, IoError, Result, SocketError};
pub use self::socket::{
	set_reuse_addr, set_reuse_port, set_tcp_nodelay, AcceptResult, Acceptor, Shutdown, Socket,
	StreamSocket, Tcp6Acceptor, Tcp6Socket, TcpAcceptor, TcpSocket, UnixAcceptor, UnixSocket,
	DEFAULT_BACKLOG,
};
