use sockline::{AsSockAddr, Inet6Addr, InetAddr, SocketError, UnixAddr};

#[test]
fn inet_addr_default_is_unset() {
    let addr = InetAddr::default();
    assert!(!addr.is_set());
    assert_eq!(addr.ip(), [0; 4]);
    assert_eq!(addr.port(), 0);
}

#[test]
fn inet_addr_is_set_truth_table() {
    assert!(!InetAddr::any(0).is_set());
    assert!(InetAddr::any(8080).is_set());
    assert!(InetAddr::new([127, 0, 0, 1], 0).is_set());
    assert!(InetAddr::new([127, 0, 0, 1], 8080).is_set());
}

#[test]
fn inet_addr_equality_is_constructor_independent() {
    let a = InetAddr::new([192, 168, 1, 1], 8080);
    let b = InetAddr::from((192, 168, 1, 1), 8080);
    assert_eq!(a, b);

    // Through the raw representation and back
    let c = InetAddr::try_from_raw(&a.into_raw()).unwrap();
    assert_eq!(a, c);
}

// Helper so the equality test can go through the native layout without
// reaching into crate internals.
trait IntoRaw {
    fn into_raw(self) -> libc::sockaddr_in;
}

impl IntoRaw for InetAddr {
    fn into_raw(self) -> libc::sockaddr_in {
        self.with_sockaddr(|ptr, _len| unsafe { *(ptr as *const libc::sockaddr_in) })
            .unwrap()
    }
}

#[test]
fn inet_addr_rendering() {
    assert_eq!(
        InetAddr::new([192, 168, 1, 1], 8080).to_string(),
        "192.168.1.1:8080"
    );
    assert_eq!(InetAddr::any(9).to_string(), "0.0.0.0:9");
}

#[test]
fn inet6_addr_rendering_and_is_set() {
    let mut ip = [0u8; 16];
    ip[15] = 1;
    let addr = Inet6Addr::new(ip, 443);
    assert!(addr.is_set());
    assert_eq!(addr.to_string(), "[::1]:443");

    assert!(!Inet6Addr::default().is_set());
    assert!(Inet6Addr::any(443).is_set());
}

#[test]
fn inet_addr_rejects_wrong_family() {
    let mut raw = InetAddr::new([10, 0, 0, 1], 80).into_raw();
    raw.sin_family = libc::AF_UNIX as libc::sa_family_t;

    let err = InetAddr::try_from_raw(&raw).unwrap_err();
    assert!(matches!(err, SocketError::WrongFamily { .. }));
}

#[test]
fn inet6_addr_rejects_wrong_family_storage() {
    let storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
    // ss_family is 0 (AF_UNSPEC) in a zeroed storage
    let err = Inet6Addr::try_from_storage(&storage).unwrap_err();
    assert!(matches!(err, SocketError::WrongFamily { found: 0, .. }));
}

#[test]
fn unix_addr_path_and_rendering() {
    let addr = UnixAddr::new("/tmp/sock");
    assert!(addr.is_set());
    assert_eq!(addr.path(), b"/tmp/sock");
    assert_eq!(addr.path_str(), Some("/tmp/sock"));
    assert_eq!(addr.to_string(), "unix:/tmp/sock");

    assert!(!UnixAddr::default().is_set());
}

#[test]
fn unix_addr_abstract_rendering() {
    let addr = UnixAddr::abstract_name("app.sock");
    assert!(addr.is_abstract());
    assert_eq!(addr.to_string(), "unix:@app.sock");
}

#[test]
fn unix_addr_rejects_wrong_family() {
    let mut raw: libc::sockaddr_un = unsafe { std::mem::zeroed() };
    raw.sun_family = libc::AF_INET as libc::sa_family_t;

    let err = UnixAddr::try_from_raw(&raw).unwrap_err();
    assert!(matches!(
        err,
        SocketError::WrongFamily {
            expected: "Unix",
            ..
        }
    ));
}

#[test]
fn unix_addr_round_trips_through_raw() {
    let mut raw: libc::sockaddr_un = unsafe { std::mem::zeroed() };
    raw.sun_family = libc::AF_UNIX as libc::sa_family_t;
    for (i, &b) in b"/tmp/sock".iter().enumerate() {
        raw.sun_path[i] = b as libc::c_char;
    }

    let addr = UnixAddr::try_from_raw(&raw).unwrap();
    assert_eq!(addr, UnixAddr::new("/tmp/sock"));
}

#[test]
fn unix_addr_unnamed_decodes_as_default() {
    let mut raw: libc::sockaddr_un = unsafe { std::mem::zeroed() };
    raw.sun_family = libc::AF_UNIX as libc::sa_family_t;

    let addr = UnixAddr::try_from_raw(&raw).unwrap();
    assert!(!addr.is_abstract());
    assert!(!addr.is_set());
    assert_eq!(addr, UnixAddr::default());
    assert_eq!(addr.to_string(), "unix:");
}

#[test]
fn unix_addr_never_truncates_long_paths() {
    let long = "/tmp/".to_string() + &"x".repeat(200);
    let addr = UnixAddr::new(long.as_bytes());

    let err = addr.with_sockaddr(|_, _| ()).unwrap_err();
    assert!(matches!(err, SocketError::InvalidAddress { .. }));
}

#[test]
fn resolve_numeric_host() {
    let addr = InetAddr::resolve("127.0.0.1", 8080).unwrap();
    assert_eq!(addr, InetAddr::new([127, 0, 0, 1], 8080));
}

#[test]
fn resolve_failure_names_the_host() {
    let err = InetAddr::resolve("host.that.does.not.exist.invalid", 80).unwrap_err();
    match err {
        SocketError::Resolve { name, .. } => {
            assert_eq!(name, "host.that.does.not.exist.invalid");
        }
        other => panic!("expected Resolve error, got {other:?}"),
    }
}
