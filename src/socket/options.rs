use std::os::fd::AsRawFd;

use crate::error::{errno, Result, SocketError};

fn set_bool_opt<S: AsRawFd>(
	socket: &S,
	level: libc::c_int,
	opt: libc::c_int,
	name: &'static str,
	enable: bool,
) -> Result<()> {
	let val: libc::c_int = if enable { 1 } else { 0 };
	let result = unsafe {
		libc::setsockopt(
			socket.as_raw_fd(),
			level,
			opt,
			&val as *const _ as *const libc::c_void,
			std::mem::size_of::<libc::c_int>() as libc::socklen_t,
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

/// Sets SO_REUSEADDR on a socket.
///
/// Allows binding to an address still in TIME_WAIT. Essential for server
/// restarts; the acceptor enables this before binding.
pub fn set_reuse_addr<S: AsRawFd>(socket: &S, enable: bool) -> Result<()> {
	set_bool_opt(socket, libc::SOL_SOCKET, libc::SO_REUSEADDR, "SO_REUSEADDR", enable)
}

/// Sets SO_REUSEPORT on a socket.
///
/// Allows multiple sockets to bind the same port, for load balancing
/// across threads or processes.
pub fn set_reuse_port<S: AsRawFd>(socket: &S, enable: bool) -> Result<()> {
	set_bool_opt(socket, libc::SOL_SOCKET, libc::SO_REUSEPORT, "SO_REUSEPORT", enable)
}

/// Sets TCP_NODELAY on a socket.
///
/// Disables Nagle's algorithm: data is sent immediately instead of being
/// coalesced.
pub fn set_tcp_nodelay<S: AsRawFd>(socket: &S, enable: bool) -> Result<()> {
	set_bool_opt(socket, libc::IPPROTO_TCP, libc::TCP_NODELAY, "TCP_NODELAY", enable)
}
