use std::os::fd::{FromRawFd, IntoRawFd, OwnedFd, RawFd};
use std::time::Duration;

use crate::addr::{AsSockAddr, Family, FromSockAddr, Ipv4, Ipv6, Unix};
use crate::error::{errno, IoError, Result, SocketError};
use crate::socket::sock::{Shutdown, Socket};

/// IPv4 stream connection.
pub type TcpSocket = StreamSocket<Ipv4>;
/// IPv6 stream connection.
pub type Tcp6Socket = StreamSocket<Ipv6>;
/// Unix-domain stream connection.
pub type UnixSocket = StreamSocket<Unix>;

/// A connected stream socket.
///
/// Represents an established connection, ready for read/write. Created by
/// [`Acceptor::accept`](crate::Acceptor::accept) on the server side or by
/// [`StreamSocket::connect`] on the client side. Once returned from
/// `accept()` it is independently owned; dropping the acceptor does not
/// affect it.
pub struct StreamSocket<F: Family> {
	sock: Socket<F>,
}

impl<F: Family> StreamSocket<F> {
	/// Connects to a remote address.
	pub fn connect(addr: F::Addr) -> Result<Self> {
		let sock = Socket::<F>::open()?;

		let rc = addr.with_sockaddr(|ptr, len| unsafe {
			libc::connect(sock.as_raw_fd(), ptr, len)
		})?;

		if rc == -1 {
			// sock drops here; the half-made descriptor is released
			return Err(SocketError::Connect {
				errno: errno(),
				addr: addr.to_string(),
			});
		}

		Ok(Self { sock })
	}

	/// Adopts a descriptor that is already connected.
	pub(crate) fn from_fd(fd: OwnedFd) -> Self {
		Self {
			sock: Socket::from_fd(fd),
		}
	}

	/// Returns the raw file descriptor.
	#[inline]
	pub fn as_raw_fd(&self) -> libc::c_int {
		self.sock.as_raw_fd()
	}

	/// Reads from the socket.
	///
	/// A return of `Ok(0)` means the peer closed its write half.
	pub fn read(&self, buf: &mut [u8]) -> std::io::Result<usize> {
		let n = unsafe {
			libc::read(
				self.as_raw_fd(),
				buf.as_mut_ptr() as *mut libc::c_void,
				buf.len(),
			)
		};

		if n == -1 {
			Err(IoError::Read { errno: errno() }.into())
		} else {
			Ok(n as usize)
		}
	}

	/// Best-effort attempt to fill the whole buffer.
	///
	/// Retries short reads and `EINTR` until the buffer is full, the peer
	/// closes, or an error occurs. Returns the number of bytes actually
	/// read; less than `buf.len()` only on end of stream.
	pub fn read_n(&self, buf: &mut [u8]) -> std::io::Result<usize> {
		let mut total = 0;
		while total < buf.len() {
			match self.read(&mut buf[total..]) {
				Ok(0) => break,
				Ok(n) => total += n,
				Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(e),
			}
		}
		Ok(total)
	}

	/// Writes the buffer to the socket.
	pub fn write(&self, buf: &[u8]) -> std::io::Result<usize> {
		let n = unsafe {
			libc::write(
				self.as_raw_fd(),
				buf.as_ptr() as *const libc::c_void,
				buf.len(),
			)
		};

		if n == -1 {
			Err(IoError::Write { errno: errno() }.into())
		} else {
			Ok(n as usize)
		}
	}

	/// Best-effort attempt to write the whole buffer.
	///
	/// Retries short writes and `EINTR`. On success the return value always
	/// equals `buf.len()`.
	pub fn write_n(&self, buf: &[u8]) -> std::io::Result<usize> {
		let mut total = 0;
		while total < buf.len() {
			match self.write(&buf[total..]) {
				Ok(n) => total += n,
				Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(e),
			}
		}
		Ok(total)
	}

	/// Sets the timeout for read operations.
	///
	/// A zero duration disables the timeout. A read that exceeds the
	/// timeout fails with a would-block error.
	pub fn read_timeout(&self, to: Duration) -> Result<()> {
		self.set_timeval(libc::SO_RCVTIMEO, "SO_RCVTIMEO", to)
	}

	/// Sets the timeout for write operations.
	pub fn write_timeout(&self, to: Duration) -> Result<()> {
		self.set_timeval(libc::SO_SNDTIMEO, "SO_SNDTIMEO", to)
	}

	fn set_timeval(&self, opt: libc::c_int, name: &'static str, to: Duration) -> Result<()> {
		let tv = libc::timeval {
			tv_sec: to.as_secs() as libc::time_t,
			tv_usec: to.subsec_micros() as libc::suseconds_t,
		};
		let result = unsafe {
			libc::setsockopt(
				self.as_raw_fd(),
				libc::SOL_SOCKET,
				opt,
				&tv as *const _ as *const libc::c_void,
				std::mem::size_of::<libc::timeval>() as libc::socklen_t,
			)
		};
		if result == -1 {
			Err(SocketError::SetOption {
				errno: errno(),
				option: name,
			})
		} else {
			Ok(())
		}
	}

	/// Sets the socket to non-blocking mode.
	pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
		self.sock.set_nonblocking(nonblocking)
	}

	/// Shuts down one or both halves of the connection.
	pub fn shutdown(&self, how: Shutdown) -> Result<()> {
		self.sock.shutdown(how)
	}

	/// Returns the local address of this connection.
	pub fn local_addr(&self) -> Result<F::Addr> {
		self.sock.local_addr()
	}

	/// Returns the remote address of this connection.
	pub fn peer_addr(&self) -> Result<F::Addr> {
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

		let result = unsafe {
			libc::getpeername(
				self.as_raw_fd(),
				&mut storage as *mut _ as *mut libc::sockaddr,
				&mut len,
			)
		};

		if result == -1 {
			return Err(SocketError::GetOption {
				errno: errno(),
				option: "getpeername",
			});
		}

		unsafe {
			F::Addr::from_sockaddr(&storage as *const _ as *const libc::sockaddr, len).ok_or(
				SocketError::InvalidAddress {
					reason: "invalid peer address",
				},
			)
		}
	}
}

impl<F: Family> std::io::Read for StreamSocket<F> {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		StreamSocket::read(self, buf)
	}
}

impl<F: Family> std::io::Write for StreamSocket<F> {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		StreamSocket::write(self, buf)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(()) // no userspace buffering at this level
	}
}

impl<F: Family> std::os::fd::AsRawFd for StreamSocket<F> {
	fn as_raw_fd(&self) -> std::os::fd::RawFd {
		self.sock.as_raw_fd()
	}
}

impl<F: Family> std::os::fd::AsFd for StreamSocket<F> {
	fn as_fd(&self) -> std::os::fd::BorrowedFd<'_> {
		use std::os::fd::AsFd;
		self.sock.as_fd()
	}
}

impl<F: Family> FromRawFd for StreamSocket<F> {
	unsafe fn from_raw_fd(fd: RawFd) -> Self {
		unsafe { Self::from_fd(OwnedFd::from_raw_fd(fd)) }
	}
}

impl<F: Family> IntoRawFd for StreamSocket<F> {
	fn into_raw_fd(self) -> RawFd {
		self.sock.into_raw_fd()
	}
}
