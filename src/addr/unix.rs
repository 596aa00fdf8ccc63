use crate::addr::AsSockAddr;
use crate::error::{Result, SocketError};
use crate::Family;

/// Unix domain socket marker.
///
/// Sockets with this domain use filesystem paths (e.g., /tmp/app.sock).
/// Only works on the same machine.
pub struct Unix;

impl Family for Unix {
	type Addr = UnixAddr;

	const NAME: &'static str = "Unix";

	#[inline]
	fn af() -> libc::c_int {
		libc::AF_UNIX
	}
}

/// Unix domain socket address (file path or abstract).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnixAddr {
	path: Vec<u8>,
	/// True if this is an abstract socket (Linux-only, no filesystem entry).
	is_abstract: bool,
}

impl UnixAddr {
	/// Creates a new Unix address from a filesystem path.
	pub fn new<P: AsRef<[u8]>>(path: P) -> Self {
		Self {
			path: path.as_ref().to_vec(),
			is_abstract: false,
		}
	}

	/// Creates an abstract socket address (Linux-only).
	///
	/// Abstract sockets exist only in memory, with no filesystem entry.
	/// They are removed automatically when all references close.
	pub fn abstract_name<P: AsRef<[u8]>>(name: P) -> Self {
		Self {
			path: name.as_ref().to_vec(),
			is_abstract: true,
		}
	}

	/// Creates from a raw `sockaddr_un`, rejecting a wrong family tag.
	pub fn try_from_raw(raw: &libc::sockaddr_un) -> Result<Self> {
		if raw.sun_family != libc::AF_UNIX as libc::sa_family_t {
			return Err(SocketError::WrongFamily {
				expected: Unix::NAME,
				found: raw.sun_family as u16,
			});
		}
		Ok(Self::from_raw(raw))
	}

	/// Returns true if this is an abstract socket.
	pub fn is_abstract(&self) -> bool {
		self.is_abstract
	}

	/// Returns the path bytes.
	pub fn path(&self) -> &[u8] {
		&self.path
	}

	/// Returns the path as a string, if it is valid UTF-8.
	pub fn path_str(&self) -> Option<&str> {
		std::str::from_utf8(&self.path).ok()
	}

	/// Returns whether the path is non-empty.
	pub fn is_set(&self) -> bool {
		!self.path.is_empty()
	}

	/// Converts to the raw sockaddr_un for syscalls.
	///
	/// Returns `None` if the path does not fit in `sun_path`. The path is
	/// never truncated.
	pub(crate) fn to_raw(&self) -> Option<libc::sockaddr_un> {
		let mut addr: libc::sockaddr_un = unsafe { std::mem::zeroed() };
		addr.sun_family = libc::AF_UNIX as libc::sa_family_t;

		if self.is_abstract {
			// Abstract: first byte is null, then the name
			if self.path.len() + 1 >= addr.sun_path.len() {
				return None;
			}
			// sun_path[0] is already 0 from zeroed()
			for (i, &byte) in self.path.iter().enumerate() {
				addr.sun_path[i + 1] = byte as libc::c_char;
			}
		} else {
			// Filesystem path: null-terminated
			if self.path.len() >= addr.sun_path.len() {
				return None;
			}
			for (i, &byte) in self.path.iter().enumerate() {
				addr.sun_path[i] = byte as libc::c_char;
			}
		}

		Some(addr)
	}

	/// Creates from raw sockaddr_un.
	pub(crate) fn from_raw(raw: &libc::sockaddr_un) -> Self {
		// A leading null byte with data behind it marks an abstract socket
		if raw.sun_path[0] == 0 {
			let len = raw.sun_path[1..]
				.iter()
				.position(|&c| c == 0)
				.unwrap_or(raw.sun_path.len() - 1);

			let path: Vec<u8> = raw.sun_path[1..=len].iter().map(|&c| c as u8).collect();

			if path.is_empty() {
				// Unnamed peer: the kernel filled in only the family.
				// Decode as the plain default so it compares equal to
				// `UnixAddr::default()`.
				return Self::default();
			}

			Self { path, is_abstract: true }
		} else {
			let len = raw
				.sun_path
				.iter()
				.position(|&c| c == 0)
				.unwrap_or(raw.sun_path.len());

			let path: Vec<u8> = raw.sun_path[..len].iter().map(|&c| c as u8).collect();

			Self { path, is_abstract: false }
		}
	}
}

impl std::fmt::Display for UnixAddr {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.is_abstract {
			write!(f, "unix:@{}", String::from_utf8_lossy(&self.path))
		} else {
			write!(f, "unix:{}", String::from_utf8_lossy(&self.path))
		}
	}
}

impl AsSockAddr for UnixAddr {
	fn with_sockaddr<F, R>(&self, f: F) -> Result<R>
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		let raw = self.to_raw().ok_or(SocketError::InvalidAddress {
			reason: "unix path too long",
		})?;
		let ptr = &raw as *const _ as *const libc::sockaddr;
		let len = std::mem::size_of::<libc::sockaddr_un>() as libc::socklen_t;
		Ok(f(ptr, len))
	}
}
