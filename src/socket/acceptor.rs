use std::os::fd::{FromRawFd, OwnedFd, RawFd};

use crate::addr::{AsSockAddr, Family, FromSockAddr, Inet6Addr, InetAddr, Ipv4, Ipv6, Unix};
use crate::error::{errno, Result, SocketError};
use crate::socket::options::set_reuse_addr;
use crate::socket::sock::{Shutdown, Socket};
use crate::socket::stream::StreamSocket;

/// Default listener queue size.
///
/// Sized for low-concurrency usage; servers expecting bursts of
/// connections should pass a larger value explicitly.
pub const DEFAULT_BACKLOG: i32 = 4;

/// IPv4 acceptor.
pub type TcpAcceptor = Acceptor<Ipv4>;
/// IPv6 acceptor.
pub type Tcp6Acceptor = Acceptor<Ipv6>;
/// Unix-domain acceptor.
pub type UnixAcceptor = Acceptor<Unix>;

/// Outcome of a non-blocking accept probe.
///
/// This is not socket state; the acceptor remains listening in all cases.
pub enum AcceptResult<F: Family> {
	/// A connection was accepted. The socket is connected but may not yet
	/// be readable; callers must handle `read()` returning would-block.
	Accepted(StreamSocket<F>, F::Addr),
	/// No connection is ready. Not an error; wait for readiness or retry.
	WouldBlock,
	/// The syscall was interrupted by a signal. Safe to retry immediately.
	Interrupted,
}

struct Listening<F: Family> {
	sock: Socket<F>,
	addr: F::Addr,
}

/// A streaming server socket: binds and listens on an address, then hands
/// out connected sockets.
///
/// The acceptor is a two-state machine. It starts *unopened* (no handle,
/// no address). [`open`](Acceptor::open) allocates, binds, and listens in
/// one step; only when all three succeed does the acceptor become
/// *listening* and record its bound address. Any failure along the way
/// releases the partially allocated handle and leaves the acceptor
/// unopened, so a failed `open` can always be retried with different
/// parameters.
///
/// A failed [`accept`](Acceptor::accept) never invalidates the listening
/// socket.
///
/// No internal locking: one thread should own the accept loop. The only
/// way to cancel a blocked `accept()` is [`shutdown`](Acceptor::shutdown)
/// from another thread, after which the handle must not be reused until
/// the blocked call has returned.
pub struct Acceptor<F: Family> {
	state: Option<Listening<F>>,
}

impl<F: Family> Acceptor<F> {
	/// Creates an unopened acceptor.
	pub fn new() -> Self {
		Self { state: None }
	}

	/// Creates an acceptor and starts it listening on the given address.
	pub fn bind(addr: F::Addr) -> Result<Self> {
		Self::bind_with_backlog(addr, DEFAULT_BACKLOG)
	}

	/// Creates an acceptor and starts it listening with an explicit
	/// backlog.
	pub fn bind_with_backlog(addr: F::Addr, backlog: i32) -> Result<Self> {
		let mut acc = Self::new();
		acc.open_with_backlog(addr, backlog)?;
		Ok(acc)
	}

	/// Opens the acceptor: allocate, bind, listen.
	///
	/// Uses [`DEFAULT_BACKLOG`]. See [`open_with_backlog`](Acceptor::open_with_backlog).
	pub fn open(&mut self, addr: F::Addr) -> Result<()> {
		self.open_with_backlog(addr, DEFAULT_BACKLOG)
	}

	/// Opens the acceptor with an explicit backlog.
	///
	/// Calling this while already listening fails with `AlreadyOpen` and
	/// leaves the existing listening socket untouched; rebinding silently
	/// would leak it. On any step failing, the partially allocated handle
	/// is released and the acceptor stays unopened.
	///
	/// On success the recorded address comes from `getsockname`, so an
	/// OS-assigned port (bind to port 0) is visible through
	/// [`address`](Acceptor::address) while a wildcard ip stays the
	/// wildcard.
	pub fn open_with_backlog(&mut self, addr: F::Addr, backlog: i32) -> Result<()> {
		if self.state.is_some() {
			return Err(SocketError::AlreadyOpen);
		}

		let sock = Socket::<F>::open()?;
		set_reuse_addr(&sock, true)?;

		let rc = addr
			.with_sockaddr(|ptr, len| unsafe { libc::bind(sock.as_raw_fd(), ptr, len) })?;
		if rc == -1 {
			// sock drops here, releasing the descriptor
			return Err(SocketError::Bind {
				errno: errno(),
				addr: addr.to_string(),
			});
		}

		let rc = unsafe { libc::listen(sock.as_raw_fd(), backlog) };
		if rc == -1 {
			return Err(SocketError::Listen {
				errno: errno(),
				backlog,
			});
		}

		let bound = sock.local_addr().unwrap_or(addr);
		self.state = Some(Listening { sock, addr: bound });
		Ok(())
	}

	/// Returns whether the acceptor is listening.
	pub fn is_listening(&self) -> bool {
		self.state.is_some()
	}

	/// Returns the bound address, or `None` while unopened.
	///
	/// Only reflects a fully successful `open`; a failed bind never leaves
	/// a half-written address here.
	pub fn address(&self) -> Option<F::Addr> {
		self.state.as_ref().map(|s| s.addr.clone())
	}

	/// Returns the raw listening descriptor, or `None` while unopened.
	///
	/// For callers integrating with an external readiness mechanism.
	pub fn raw_fd(&self) -> Option<RawFd> {
		self.state.as_ref().map(|s| s.sock.as_raw_fd())
	}

	/// Sets the listening socket to non-blocking mode.
	///
	/// Afterward `accept()` reports would-block instead of suspending;
	/// [`try_accept`](Acceptor::try_accept) is the more convenient probe.
	pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
		let state = self.state.as_ref().ok_or(SocketError::NotListening)?;
		state.sock.set_nonblocking(nonblocking)
	}

	/// Accepts an incoming connection, blocking until a peer connects.
	///
	/// Returns the connected socket (ownership transferred to the caller)
	/// and the peer's address. On failure the acceptor remains listening
	/// and usable; `Accept` errors are the one transient class in this
	/// crate, so callers typically log and retry.
	///
	/// Valid only while listening; anywhere else this fails with
	/// `NotListening` without touching the OS.
	pub fn accept(&self) -> Result<(StreamSocket<F>, F::Addr)> {
		let state = self.state.as_ref().ok_or(SocketError::NotListening)?;

		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

		let fd = unsafe {
			libc::accept4(
				state.sock.as_raw_fd(),
				&mut storage as *mut _ as *mut libc::sockaddr,
				&mut len,
				libc::SOCK_CLOEXEC,
			)
		};

		if fd == -1 {
			return Err(SocketError::Accept { errno: errno() });
		}

		let fd = unsafe { OwnedFd::from_raw_fd(fd) };
		let stream = StreamSocket::from_fd(fd);

		let addr = unsafe {
			F::Addr::from_sockaddr(&storage as *const _ as *const libc::sockaddr, len).ok_or(
				SocketError::InvalidAddress {
					reason: "invalid peer address",
				},
			)?
		};

		Ok((stream, addr))
	}

	/// Attempts to accept a connection without blocking.
	///
	/// Never suspends the caller, regardless of the listening socket's
	/// blocking mode: a blocking listener is switched to non-blocking for
	/// the duration of the call and switched back afterward, and a quiet
	/// queue reports [`AcceptResult::WouldBlock`]. The accepted descriptor
	/// comes back non-blocking either way.
	pub fn try_accept(&self) -> Result<AcceptResult<F>> {
		let state = self.state.as_ref().ok_or(SocketError::NotListening)?;

		// accept4's flags only affect the accepted descriptor; the probe
		// must not rely on them to keep the accept call itself from
		// suspending on an empty queue.
		let was_blocking = !state.sock.is_nonblocking()?;
		if was_blocking {
			state.sock.set_nonblocking(true)?;
		}

		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

		let fd = unsafe {
			libc::accept4(
				state.sock.as_raw_fd(),
				&mut storage as *mut _ as *mut libc::sockaddr,
				&mut len,
				libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
			)
		};
		let err = if fd == -1 { errno() } else { 0 };
		// Take ownership before restoring flags so an fcntl failure
		// cannot leak the accepted descriptor
		let fd = if fd == -1 {
			None
		} else {
			Some(unsafe { OwnedFd::from_raw_fd(fd) })
		};

		if was_blocking {
			state.sock.set_nonblocking(false)?;
		}

		let fd = match fd {
			Some(fd) => fd,
			None => {
				return match err {
					libc::EAGAIN => Ok(AcceptResult::WouldBlock),
					libc::EINTR => Ok(AcceptResult::Interrupted),
					_ => Err(SocketError::Accept { errno: err }),
				};
			}
		};
		let stream = StreamSocket::from_fd(fd);

		let addr = unsafe {
			F::Addr::from_sockaddr(&storage as *const _ as *const libc::sockaddr, len).ok_or(
				SocketError::InvalidAddress {
					reason: "invalid peer address",
				},
			)?
		};

		Ok(AcceptResult::Accepted(stream, addr))
	}

	/// Shuts down the listening socket without releasing the handle.
	///
	/// This is the supported way to cancel a blocked `accept()` from
	/// another thread: the blocked call returns with an `Accept` error.
	/// Inherently racy; do not reuse the handle for anything else until
	/// the blocked call has actually returned.
	pub fn shutdown(&self) -> Result<()> {
		let state = self.state.as_ref().ok_or(SocketError::NotListening)?;
		state.sock.shutdown(Shutdown::ReadWrite)
	}

	/// Closes the acceptor, releasing the handle and clearing the bound
	/// address. Idempotent; closing an unopened acceptor is a no-op.
	pub fn close(&mut self) {
		self.state = None;
	}
}

impl<F: Family> Default for Acceptor<F> {
	fn default() -> Self {
		Self::new()
	}
}

impl Acceptor<Ipv4> {
	/// Opens on the wildcard IPv4 address with the given port.
	pub fn open_port(&mut self, port: u16) -> Result<()> {
		self.open(InetAddr::any(port))
	}

	/// Opens on the wildcard IPv4 address with an explicit backlog.
	pub fn open_port_with_backlog(&mut self, port: u16, backlog: i32) -> Result<()> {
		self.open_with_backlog(InetAddr::any(port), backlog)
	}
}

impl Acceptor<Ipv6> {
	/// Opens on the wildcard IPv6 address with the given port.
	pub fn open_port(&mut self, port: u16) -> Result<()> {
		self.open(Inet6Addr::any(port))
	}

	/// Opens on the wildcard IPv6 address with an explicit backlog.
	pub fn open_port_with_backlog(&mut self, port: u16, backlog: i32) -> Result<()> {
		self.open_with_backlog(Inet6Addr::any(port), backlog)
	}
}
