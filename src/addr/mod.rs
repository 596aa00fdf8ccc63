//! Address families and related types.
//!
//! This module defines the three address families supported:
//! - `Ipv4` — Internet Protocol version 4
//! - `Ipv6` — Internet Protocol version 6
//! - `Unix` — Unix domain sockets (local only)

mod ipv4;
mod ipv6;
mod unix;
pub use self::ipv4::{InetAddr, Ipv4};
pub use self::ipv6::{Inet6Addr, Ipv6};
pub use self::unix::{Unix, UnixAddr};

use crate::error::{Result, SocketError};

/// Trait for address family markers.
///
/// Each type implementing this trait represents an address family that can
/// be passed to the `socket()` syscall, together with the concrete address
/// type used for binding and for reporting peers.
pub trait Family {
	/// The concrete address type for this family.
	type Addr: AsSockAddr
		+ FromSockAddr
		+ Clone
		+ PartialEq
		+ std::fmt::Debug
		+ std::fmt::Display;

	/// Human-readable family name, used in error messages.
	const NAME: &'static str;

	/// Returns the libc constant for this address family.
	fn af() -> libc::c_int;
}

/// Trait for address types that can be encoded to a raw sockaddr for
/// syscalls.
///
/// The encoded structure is a fresh copy living on the callee's stack, not a
/// reinterpretation of the address value. Family-specific structs differ in
/// size, so the pointer is only valid for the duration of the closure.
pub trait AsSockAddr {
	/// Calls the provided closure with a pointer to the raw sockaddr and its
	/// size. Fails if the address cannot be encoded (e.g., a Unix path
	/// longer than `sun_path`).
	fn with_sockaddr<F, R>(&self, f: F) -> Result<R>
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R;
}

/// Trait for address types that can be decoded from a raw sockaddr.
pub trait FromSockAddr: Sized {
	/// Creates an address from raw sockaddr storage.
	///
	/// Returns `None` if the buffer is too short to hold the family's
	/// structure.
	///
	/// # Safety
	/// The sockaddr must be of the correct family for this type.
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Self>;
}

/// Resolves `name` and returns the first result for the requested family.
///
/// This is the deterministic tie-break the inet address types build on:
/// whatever the resolver lists first for the family wins. The port is not
/// passed through to the resolver; callers patch it in afterward.
pub(crate) fn lookup_first(name: &str, af: libc::c_int) -> Result<libc::sockaddr_storage> {
	let c_name = std::ffi::CString::new(name).map_err(|_| SocketError::InvalidAddress {
		reason: "host name contains a NUL byte",
	})?;

	let mut hints: libc::addrinfo = unsafe { std::mem::zeroed() };
	hints.ai_family = af;
	hints.ai_socktype = libc::SOCK_STREAM;

	let mut res: *mut libc::addrinfo = std::ptr::null_mut();
	let rc = unsafe {
		libc::getaddrinfo(c_name.as_ptr(), std::ptr::null(), &hints, &mut res)
	};
	if rc != 0 {
		return Err(SocketError::Resolve {
			name: name.to_string(),
			code: rc,
		});
	}

	let mut found: Option<libc::sockaddr_storage> = None;
	let mut cur = res;
	while !cur.is_null() {
		let ai = unsafe { &*cur };
		if ai.ai_family == af && !ai.ai_addr.is_null() {
			let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
			let len =
				(ai.ai_addrlen as usize).min(std::mem::size_of::<libc::sockaddr_storage>());
			unsafe {
				std::ptr::copy_nonoverlapping(
					ai.ai_addr as *const u8,
					&mut storage as *mut _ as *mut u8,
					len,
				);
			}
			found = Some(storage);
			break;
		}
		cur = ai.ai_next;
	}
	unsafe { libc::freeaddrinfo(res) };

	found.ok_or(SocketError::Resolve {
		name: name.to_string(),
		code: libc::EAI_NONAME,
	})
}

impl FromSockAddr for InetAddr {
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Self> {
		if len < std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t {
			return None;
		}
		let raw = unsafe { &*(addr as *const libc::sockaddr_in) };
		Some(Self::from_raw(raw))
	}
}

impl FromSockAddr for Inet6Addr {
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Self> {
		if len < std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t {
			return None;
		}
		let raw = unsafe { &*(addr as *const libc::sockaddr_in6) };
		Some(Self::from_raw(raw))
	}
}

impl FromSockAddr for UnixAddr {
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Self> {
		if len < std::mem::size_of::<libc::sa_family_t>() as libc::socklen_t {
			return None;
		}
		let raw = unsafe { &*(addr as *const libc::sockaddr_un) };
		Some(Self::from_raw(raw))
	}
}
