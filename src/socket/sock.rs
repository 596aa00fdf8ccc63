use std::marker::PhantomData;
use std::os::fd::{FromRawFd, OwnedFd};

use crate::addr::{Family, FromSockAddr};
use crate::error::{errno, Result, SocketError};

/// How to shut down one or both halves of a socket.
pub enum Shutdown {
	Read,      // SHUT_RD
	Write,     // SHUT_WR
	ReadWrite, // SHUT_RDWR
}

/// Base socket resource: owns exactly one OS descriptor.
///
/// Move-only by construction; the descriptor is closed exactly once, when
/// the owner drops. The listening and connected-stream wrappers compose
/// this type rather than inherit from it, so each role exposes only the
/// operations valid for it.
pub struct Socket<F: Family> {
	fd: OwnedFd,
	_marker: PhantomData<F>,
}

impl<F: Family> Socket<F> {
	/// Allocates a new stream socket for this family.
	///
	/// Calls the `socket()` syscall with `SOCK_CLOEXEC` set.
	pub fn open() -> Result<Self> {
		let fd = unsafe { libc::socket(F::af(), libc::SOCK_STREAM | libc::SOCK_CLOEXEC, 0) };
		if fd == -1 {
			return Err(SocketError::Create { errno: errno() });
		}
		let fd = unsafe { OwnedFd::from_raw_fd(fd) };

		Ok(Self {
			fd,
			_marker: PhantomData,
		})
	}

	/// Adopts an already-allocated descriptor.
	///
	/// The descriptor must not be owned anywhere else; this owner will
	/// close it on drop.
	pub(crate) fn from_fd(fd: OwnedFd) -> Self {
		Self {
			fd,
			_marker: PhantomData,
		}
	}

	/// Returns the raw file descriptor.
	///
	/// Used internally for syscalls. Does not transfer ownership.
	#[inline]
	pub fn as_raw_fd(&self) -> libc::c_int {
		use std::os::fd::AsRawFd;
		self.fd.as_raw_fd()
	}

	/// Returns whether the socket is in non-blocking mode.
	pub fn is_nonblocking(&self) -> Result<bool> {
		let flags = unsafe { libc::fcntl(self.as_raw_fd(), libc::F_GETFL) };
		if flags == -1 {
			return Err(SocketError::GetOption {
				errno: errno(),
				option: "F_GETFL",
			});
		}
		Ok(flags & libc::O_NONBLOCK != 0)
	}

	/// Sets the socket to non-blocking mode.
	pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
		let flags = unsafe { libc::fcntl(self.as_raw_fd(), libc::F_GETFL) };
		if flags == -1 {
			return Err(SocketError::GetOption {
				errno: errno(),
				option: "F_GETFL",
			});
		}

		let new_flags = if nonblocking {
			flags | libc::O_NONBLOCK
		} else {
			flags & !libc::O_NONBLOCK
		};

		let result = unsafe { libc::fcntl(self.as_raw_fd(), libc::F_SETFL, new_flags) };
		if result == -1 {
			return Err(SocketError::SetOption {
				errno: errno(),
				option: "O_NONBLOCK",
			});
		}

		Ok(())
	}

	/// Returns the local address the socket is bound to.
	pub fn local_addr(&self) -> Result<F::Addr> {
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

		let result = unsafe {
			libc::getsockname(
				self.as_raw_fd(),
				&mut storage as *mut _ as *mut libc::sockaddr,
				&mut len,
			)
		};

		if result == -1 {
			return Err(SocketError::GetOption {
				errno: errno(),
				option: "getsockname",
			});
		}

		unsafe {
			F::Addr::from_sockaddr(&storage as *const _ as *const libc::sockaddr, len).ok_or(
				SocketError::InvalidAddress {
					reason: "invalid local address",
				},
			)
		}
	}

	/// Shuts down one or both halves of the socket.
	///
	/// On a listening socket this is the cancellation path: a thread
	/// blocked in `accept()` returns with an error once the shutdown takes
	/// effect.
	pub fn shutdown(&self, how: Shutdown) -> Result<()> {
		let how = match how {
			Shutdown::Read => libc::SHUT_RD,
			Shutdown::Write => libc::SHUT_WR,
			Shutdown::ReadWrite => libc::SHUT_RDWR,
		};

		let result = unsafe { libc::shutdown(self.as_raw_fd(), how) };
		if result == -1 {
			Err(SocketError::SetOption {
				errno: errno(),
				option: "shutdown",
			})
		} else {
			Ok(())
		}
	}
}

impl<F: Family> std::os::fd::AsRawFd for Socket<F> {
	fn as_raw_fd(&self) -> std::os::fd::RawFd {
		self.fd.as_raw_fd()
	}
}

impl<F: Family> std::os::fd::AsFd for Socket<F> {
	fn as_fd(&self) -> std::os::fd::BorrowedFd<'_> {
		self.fd.as_fd()
	}
}

impl<F: Family> std::os::fd::FromRawFd for Socket<F> {
	unsafe fn from_raw_fd(fd: std::os::fd::RawFd) -> Self {
		unsafe { Self::from_fd(OwnedFd::from_raw_fd(fd)) }
	}
}

impl<F: Family> std::os::fd::IntoRawFd for Socket<F> {
	fn into_raw_fd(self) -> std::os::fd::RawFd {
		self.fd.into_raw_fd()
	}
}
