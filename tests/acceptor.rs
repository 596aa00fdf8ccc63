use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sockline::{
    AcceptResult, Acceptor, InetAddr, Ipv4, SocketError, TcpAcceptor, TcpSocket, UnixAcceptor,
    UnixAddr, UnixSocket,
};

fn loopback() -> InetAddr {
    InetAddr::new([127, 0, 0, 1], 0)
}

#[test]
fn accept_while_unopened_is_rejected() {
    let acc = Acceptor::<Ipv4>::new();
    assert!(!acc.is_listening());
    assert!(acc.address().is_none());

    assert!(matches!(acc.accept(), Err(SocketError::NotListening)));
    assert!(matches!(acc.try_accept(), Err(SocketError::NotListening)));
}

#[test]
fn open_records_the_assigned_port() {
    let acc = TcpAcceptor::bind(loopback()).unwrap();
    assert!(acc.is_listening());

    let addr = acc.address().unwrap();
    assert_eq!(addr.ip(), [127, 0, 0, 1]);
    assert_ne!(addr.port(), 0);
}

#[test]
fn open_port_keeps_the_wildcard() {
    let mut acc = TcpAcceptor::new();
    acc.open_port(0).unwrap();

    let addr = acc.address().unwrap();
    assert_eq!(addr.ip(), [0; 4]);
    assert_ne!(addr.port(), 0);
}

#[test]
fn connect_accept_round_trip() {
    let acc = TcpAcceptor::bind(loopback()).unwrap();
    let addr = acc.address().unwrap();

    let client = thread::spawn(move || {
        let sock = TcpSocket::connect(addr).unwrap();
        sock.write_n(b"hello").unwrap();
        let mut buf = [0u8; 2];
        sock.read_n(&mut buf).unwrap();
        buf
    });

    let (stream, peer) = acc.accept().unwrap();
    assert_eq!(peer.ip(), [127, 0, 0, 1]);
    assert_ne!(peer.port(), 0);

    let mut buf = [0u8; 5];
    assert_eq!(stream.read_n(&mut buf).unwrap(), 5);
    assert_eq!(&buf, b"hello");
    stream.write_n(b"ok").unwrap();

    assert_eq!(&client.join().unwrap(), b"ok");
}

#[test]
fn double_open_is_rejected_and_harmless() {
    let mut acc = TcpAcceptor::bind(loopback()).unwrap();
    let addr = acc.address().unwrap();

    let err = acc.open(loopback()).unwrap_err();
    assert!(matches!(err, SocketError::AlreadyOpen));

    // First listening socket is unaffected
    assert_eq!(acc.address().unwrap(), addr);
    let client = thread::spawn(move || TcpSocket::connect(addr).unwrap());
    let (_stream, peer) = acc.accept().unwrap();
    assert_eq!(peer.ip(), [127, 0, 0, 1]);
    client.join().unwrap();
}

#[test]
fn failed_bind_rolls_back_to_unopened() {
    let first = TcpAcceptor::bind(loopback()).unwrap();
    let taken = first.address().unwrap();

    let mut second = TcpAcceptor::new();
    let err = second.open(taken).unwrap_err();
    assert!(matches!(err, SocketError::Bind { .. }));
    assert!(!second.is_listening());
    assert!(second.address().is_none());

    // The failed attempt leaked nothing and the acceptor is reusable
    second.open(loopback()).unwrap();
    assert!(second.is_listening());
}

#[test]
fn try_accept_reports_would_block() {
    let acc = TcpAcceptor::bind(loopback()).unwrap();
    match acc.try_accept().unwrap() {
        AcceptResult::WouldBlock => {}
        AcceptResult::Accepted(..) => panic!("nobody connected"),
        AcceptResult::Interrupted => panic!("not interrupted"),
    }
}

#[test]
fn try_accept_does_not_suspend_a_blocking_listener() {
    let acc = Arc::new(TcpAcceptor::bind(loopback()).unwrap());
    let (tx, rx) = mpsc::channel();

    let acc2 = Arc::clone(&acc);
    thread::spawn(move || {
        let _ = tx.send(acc2.try_accept());
    });

    let result = rx
        .recv_timeout(Duration::from_secs(2))
        .expect("try_accept suspended on an empty queue");
    assert!(matches!(result, Ok(AcceptResult::WouldBlock)));

    // The listener is back in blocking mode afterward
    let flags = unsafe { libc::fcntl(acc.raw_fd().unwrap(), libc::F_GETFL) };
    assert_eq!(flags & libc::O_NONBLOCK, 0);
}

#[test]
fn shutdown_unblocks_a_pending_accept() {
    let acc = Arc::new(TcpAcceptor::bind(loopback()).unwrap());
    let (tx, rx) = mpsc::channel();

    let acc2 = Arc::clone(&acc);
    thread::spawn(move || {
        let _ = tx.send(acc2.accept());
    });

    thread::sleep(Duration::from_millis(100));
    acc.shutdown().unwrap();

    let result = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("accept did not return after shutdown");
    match result {
        Err(SocketError::Accept { .. }) => {}
        Err(other) => panic!("expected Accept error, got {other:?}"),
        Ok(_) => panic!("accept returned a connection after shutdown"),
    }
}

#[test]
fn close_is_idempotent() {
    let mut acc = TcpAcceptor::bind(loopback()).unwrap();
    acc.close();
    assert!(!acc.is_listening());
    acc.close();

    // Reopening after close works
    acc.open(loopback()).unwrap();
    assert!(acc.is_listening());
}

#[test]
fn unix_round_trip() {
    let path = std::env::temp_dir().join(format!("sockline-acc-{}.sock", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let addr = UnixAddr::new(path.to_str().unwrap());
    let acc = UnixAcceptor::bind(addr.clone()).unwrap();
    assert_eq!(acc.address().unwrap(), addr);

    let client_addr = addr.clone();
    let client = thread::spawn(move || {
        let sock = UnixSocket::connect(client_addr).unwrap();
        sock.write_n(b"ping").unwrap();
    });

    let (stream, peer) = acc.accept().unwrap();
    // Unix clients connect unnamed unless they bind explicitly
    assert!(!peer.is_set());

    let mut buf = [0u8; 4];
    stream.read_n(&mut buf).unwrap();
    assert_eq!(&buf, b"ping");

    client.join().unwrap();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn read_timeout_trips_on_a_silent_peer() {
    let acc = TcpAcceptor::bind(loopback()).unwrap();
    let addr = acc.address().unwrap();

    let client = thread::spawn(move || {
        let sock = TcpSocket::connect(addr).unwrap();
        // Hold the connection open without sending anything
        thread::sleep(Duration::from_millis(500));
        drop(sock);
    });

    let (stream, _peer) = acc.accept().unwrap();
    stream.read_timeout(Duration::from_millis(50)).unwrap();

    let mut buf = [0u8; 1];
    let err = stream.read(&mut buf).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::WouldBlock);

    client.join().unwrap();
}
