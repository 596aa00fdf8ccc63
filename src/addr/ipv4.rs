use crate::addr::AsSockAddr;
use crate::error::{Result, SocketError};
use crate::Family;

/// IPv4 address family marker.
///
/// Sockets with this domain use 32-bit addresses (e.g., 192.168.1.1).
pub struct Ipv4;

impl Family for Ipv4 {
	type Addr = InetAddr;

	const NAME: &'static str = "IPv4";

	#[inline]
	fn af() -> libc::c_int {
		libc::AF_INET
	}
}

/// IPv4 socket address (IP + port).
///
/// Stored in host byte order; conversion to network order happens at the
/// syscall boundary. Equality is field-by-field, which coincides with
/// byte-exact equality of the encoded `sockaddr_in` because every padding
/// byte is written as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InetAddr {
	ip: [u8; 4],
	port: u16,
}

impl InetAddr {
	/// Creates a new IPv4 address.
	pub fn new(ip: [u8; 4], port: u16) -> Self {
		Self { ip, port }
	}

	/// Creates from an IP tuple and port.
	/// Example: `InetAddr::from((192, 168, 1, 1), 8080)`
	pub fn from(ip: (u8, u8, u8, u8), port: u16) -> Self {
		Self {
			ip: [ip.0, ip.1, ip.2, ip.3],
			port,
		}
	}

	/// Creates a wildcard address (`INADDR_ANY`) for the given port.
	///
	/// Servers use this to accept on all local interfaces. The address
	/// stays the wildcard after binding; which interface actually received
	/// a given connection is visible on the connected socket's
	/// `local_addr()`, not here.
	pub fn any(port: u16) -> Self {
		Self { ip: [0; 4], port }
	}

	/// Resolves a host name to an IPv4 address.
	///
	/// Takes the first AF_INET result the resolver returns. Numeric
	/// dotted-quad strings resolve without a lookup.
	pub fn resolve(name: &str, port: u16) -> Result<Self> {
		let storage = super::lookup_first(name, libc::AF_INET)?;
		let raw = unsafe { &*(&storage as *const _ as *const libc::sockaddr_in) };
		let mut addr = Self::from_raw(raw);
		addr.port = port;
		Ok(addr)
	}

	/// Creates from a raw `sockaddr_in`, rejecting a wrong family tag.
	pub fn try_from_raw(raw: &libc::sockaddr_in) -> Result<Self> {
		if raw.sin_family != libc::AF_INET as libc::sa_family_t {
			return Err(SocketError::WrongFamily {
				expected: Ipv4::NAME,
				found: raw.sin_family as u16,
			});
		}
		Ok(Self::from_raw(raw))
	}

	/// Creates from raw sockaddr storage, rejecting a wrong family tag.
	pub fn try_from_storage(storage: &libc::sockaddr_storage) -> Result<Self> {
		if storage.ss_family != libc::AF_INET as libc::sa_family_t {
			return Err(SocketError::WrongFamily {
				expected: Ipv4::NAME,
				found: storage.ss_family as u16,
			});
		}
		let raw = unsafe { &*(storage as *const _ as *const libc::sockaddr_in) };
		Ok(Self::from_raw(raw))
	}

	/// Creates from raw sockaddr_in.
	pub(crate) fn from_raw(raw: &libc::sockaddr_in) -> Self {
		Self {
			ip: raw.sin_addr.s_addr.to_ne_bytes(),
			port: u16::from_be(raw.sin_port),
		}
	}

	/// Returns the IP bytes.
	pub fn ip(&self) -> [u8; 4] {
		self.ip
	}

	/// Returns the port.
	pub fn port(&self) -> u16 {
		self.port
	}

	/// Returns whether this address differs from the all-zero value.
	pub fn is_set(&self) -> bool {
		self.ip != [0; 4] || self.port != 0
	}

	/// Converts to the raw sockaddr_in for syscalls.
	pub(crate) fn to_raw(&self) -> libc::sockaddr_in {
		libc::sockaddr_in {
			sin_family: libc::AF_INET as libc::sa_family_t,
			sin_port: self.port.to_be(),
			sin_addr: libc::in_addr {
				s_addr: u32::from_be_bytes(self.ip).to_be(),
			},
			sin_zero: [0; 8],
		}
	}
}

impl std::fmt::Display for InetAddr {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", std::net::Ipv4Addr::from(self.ip), self.port)
	}
}

impl AsSockAddr for InetAddr {
	fn with_sockaddr<F, R>(&self, f: F) -> Result<R>
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		let raw = self.to_raw(); // sockaddr_in lives on THIS stack frame
		let ptr = &raw as *const _ as *const libc::sockaddr;
		let len = std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
		Ok(f(ptr, len)) // call the closure while raw is still alive
	}
}
