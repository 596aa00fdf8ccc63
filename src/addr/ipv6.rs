use crate::addr::AsSockAddr;
use crate::error::{Result, SocketError};
use crate::Family;

/// IPv6 address family marker.
///
/// Sockets with this domain use 128-bit addresses (e.g., ::1).
pub struct Ipv6;

impl Family for Ipv6 {
	type Addr = Inet6Addr;

	const NAME: &'static str = "IPv6";

	#[inline]
	fn af() -> libc::c_int {
		libc::AF_INET6
	}
}

/// IPv6 socket address (IP + port + scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Inet6Addr {
	ip: [u8; 16],
	port: u16,
	/// Scope ID for link-local addresses (identifies network interface).
	/// Usually 0 unless using link-local addresses like fe80::.
	scope_id: u32,
}

impl Inet6Addr {
	/// Creates a new IPv6 address.
	pub fn new(ip: [u8; 16], port: u16) -> Self {
		Self { ip, port, scope_id: 0 }
	}

	/// Creates with explicit scope ID.
	///
	/// Use for link-local addresses (fe80::) where you need to specify the
	/// interface.
	pub fn with_scope(ip: [u8; 16], port: u16, scope_id: u32) -> Self {
		Self { ip, port, scope_id }
	}

	/// Creates a wildcard address (`in6addr_any`) for the given port.
	pub fn any(port: u16) -> Self {
		Self { ip: [0; 16], port, scope_id: 0 }
	}

	/// Resolves a host name to an IPv6 address.
	///
	/// Takes the first AF_INET6 result the resolver returns.
	pub fn resolve(name: &str, port: u16) -> Result<Self> {
		let storage = super::lookup_first(name, libc::AF_INET6)?;
		let raw = unsafe { &*(&storage as *const _ as *const libc::sockaddr_in6) };
		let mut addr = Self::from_raw(raw);
		addr.port = port;
		Ok(addr)
	}

	/// Creates from a raw `sockaddr_in6`, rejecting a wrong family tag.
	pub fn try_from_raw(raw: &libc::sockaddr_in6) -> Result<Self> {
		if raw.sin6_family != libc::AF_INET6 as libc::sa_family_t {
			return Err(SocketError::WrongFamily {
				expected: Ipv6::NAME,
				found: raw.sin6_family as u16,
			});
		}
		Ok(Self::from_raw(raw))
	}

	/// Creates from raw sockaddr storage, rejecting a wrong family tag.
	pub fn try_from_storage(storage: &libc::sockaddr_storage) -> Result<Self> {
		if storage.ss_family != libc::AF_INET6 as libc::sa_family_t {
			return Err(SocketError::WrongFamily {
				expected: Ipv6::NAME,
				found: storage.ss_family as u16,
			});
		}
		let raw = unsafe { &*(storage as *const _ as *const libc::sockaddr_in6) };
		Ok(Self::from_raw(raw))
	}

	/// Returns the IP bytes.
	pub fn ip(&self) -> [u8; 16] {
		self.ip
	}

	/// Returns the port.
	pub fn port(&self) -> u16 {
		self.port
	}

	/// Returns the scope ID.
	pub fn scope_id(&self) -> u32 {
		self.scope_id
	}

	/// Returns whether this address differs from the all-zero value.
	pub fn is_set(&self) -> bool {
		self.ip != [0; 16] || self.port != 0 || self.scope_id != 0
	}

	/// Converts to the raw sockaddr_in6 for syscalls.
	pub(crate) fn to_raw(&self) -> libc::sockaddr_in6 {
		libc::sockaddr_in6 {
			sin6_family: libc::AF_INET6 as libc::sa_family_t,
			sin6_port: self.port.to_be(),
			sin6_flowinfo: 0,
			sin6_addr: libc::in6_addr { s6_addr: self.ip },
			sin6_scope_id: self.scope_id,
		}
	}

	/// Creates from raw sockaddr_in6.
	pub(crate) fn from_raw(raw: &libc::sockaddr_in6) -> Self {
		Self {
			ip: raw.sin6_addr.s6_addr,
			port: u16::from_be(raw.sin6_port),
			scope_id: raw.sin6_scope_id,
		}
	}
}

impl std::fmt::Display for Inet6Addr {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[{}]:{}", std::net::Ipv6Addr::from(self.ip), self.port)
	}
}

impl AsSockAddr for Inet6Addr {
	fn with_sockaddr<F, R>(&self, f: F) -> Result<R>
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		let raw = self.to_raw();
		let ptr = &raw as *const _ as *const libc::sockaddr;
		let len = std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t;
		Ok(f(ptr, len))
	}
}
