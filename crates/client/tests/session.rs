//! End-to-end session tests against a loopback server

use shard_client::Session;
use shard_core::{Direction, Point3, Serial};
use shard_game::{ClientEvents, ConnectionState, FlatWorld, MoveOutcome, NoEvents};
use shard_network::NetworkConfig;
use shard_protocol::{decode, Packet, SpeechMode, LOGIN_BY_NAME};
use std::cell::RefCell;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

const PLAYER: Serial = Serial::new(0x0000_1234);

fn new_session() -> Session {
    Session::new(NetworkConfig::default(), Box::new(FlatWorld::default()), Box::new(NoEvents))
}

fn connect(session: &mut Session, listener: &TcpListener) -> TcpStream {
    let port = listener.local_addr().unwrap().port();
    session.connect(&format!("127.0.0.1:{}", port)).unwrap();
    let (server, _) = listener.accept().unwrap();
    server.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    server
}

/// Read one fixed-size client frame from the server side
fn read_packet(server: &mut TcpStream, length: usize) -> Packet {
    let mut buffer = vec![0u8; length];
    server.read_exact(&mut buffer).unwrap();
    decode(&buffer, length).unwrap()
}

fn send(server: &mut TcpStream, packets: &[Packet]) {
    for packet in packets {
        server.write_all(&packet.encode()).unwrap();
    }
    server.flush().unwrap();
}

/// Tick until `done` holds or give up after a few seconds
fn tick_until(session: &mut Session, done: impl Fn(&Session) -> bool) {
    for _ in 0..500 {
        session.tick();
        if done(session) {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("Condition not reached; session is {:?}", session);
}

#[test]
fn test_login_move_and_remote_close() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let mut session = new_session();
    let transitions = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&transitions);
    session
        .game_mut()
        .add_state_listener(move |from, to| sink.borrow_mut().push((from, to)));

    let mut server = connect(&mut session, &listener);
    assert_eq!(session.state(), ConnectionState::Connected);

    session.login("Avatar", "secret").unwrap();
    assert_eq!(
        read_packet(&mut server, 69),
        Packet::LoginRequest {
            seed: LOGIN_BY_NAME,
            serial: LOGIN_BY_NAME,
            name: "Avatar".into(),
            password: "secret".into(),
        }
    );

    send(
        &mut server,
        &[
            Packet::InitPlayer { serial: PLAYER },
            Packet::Location {
                serial: PLAYER,
                graphic: 0x0190,
                location: Point3::new(300, 300, 0),
                facing: Direction::South,
                hue: 0x83EA,
            },
            Packet::SendObject {
                serial: Serial::new(0x4000_0001),
                graphic: 0x0EED,
                location: Point3::new(302, 301, 0),
                hue: 0,
                facing: Direction::North,
                amount: 25,
            },
        ],
    );
    tick_until(&mut session, |s| s.game().registry().len() == 2);
    assert_eq!(session.state(), ConnectionState::LoggedIn);
    assert_eq!(session.game().player().unwrap().serial, PLAYER);

    assert_eq!(
        session.request_move(Direction::South),
        Ok(MoveOutcome::Moved(Point3::new(300, 301, 0)))
    );
    assert_eq!(
        read_packet(&mut server, 3),
        Packet::MoveRequest {
            direction: Direction::South,
            running: false,
            sequence: 0,
        }
    );
    send(&mut server, &[Packet::AllowMove { sequence: 0 }]);
    tick_until(&mut session, |s| s.stats().map_or(false, |stats| stats.frames_received == 4));

    session.send_text("Hail").unwrap();
    match read_packet_dynamic(&mut server) {
        Packet::SpeechRequest { mode, text, .. } => {
            assert_eq!(mode, SpeechMode::Bark);
            assert_eq!(text, "Hail");
        }
        other => panic!("Unexpected packet {:?}", other),
    }

    drop(server);
    tick_until(&mut session, |s| s.state() == ConnectionState::Disconnected);
    assert!(session.stats().is_none());
    assert!(session.game().registry().is_empty());
    assert_eq!(
        *transitions.borrow(),
        vec![
            (ConnectionState::Disconnected, ConnectionState::Connected),
            (ConnectionState::Connected, ConnectionState::LoggedIn),
            (ConnectionState::LoggedIn, ConnectionState::Disconnected),
        ]
    );
}

/// Read a length-prefixed client frame
fn read_packet_dynamic(server: &mut TcpStream) -> Packet {
    let mut header = [0u8; 3];
    server.read_exact(&mut header).unwrap();
    let length = u16::from_be_bytes([header[1], header[2]]) as usize;

    let mut frame = header.to_vec();
    frame.resize(length, 0);
    server.read_exact(&mut frame[3..]).unwrap();
    decode(&frame, length).unwrap()
}

#[test]
fn test_reconnect_ignores_old_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let mut session = new_session();
    let closes = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&closes);
    session.game_mut().add_state_listener(move |_, to| {
        if to == ConnectionState::Disconnected {
            *sink.borrow_mut() += 1;
        }
    });

    let first = connect(&mut session, &listener);
    drop(first);

    // Reconnecting before the old close was processed must not affect the new connection
    let mut second = connect(&mut session, &listener);
    assert_eq!(*closes.borrow(), 1);
    for _ in 0..10 {
        session.tick();
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(session.state(), ConnectionState::Connected);

    assert!(session.disconnect());
    assert!(!session.disconnect());
    assert_eq!(*closes.borrow(), 2);

    // The server sees the local close
    let mut rest = Vec::new();
    assert_eq!(second.read_to_end(&mut rest).unwrap(), 0);
}

/// Collects network error reasons
struct Errors(Rc<RefCell<Vec<String>>>);

impl ClientEvents for Errors {
    fn on_network_error(&mut self, reason: &str) {
        self.0.borrow_mut().push(reason.to_string());
    }
}

#[test]
fn test_disconnect_after_reset_reports_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let errors = Rc::new(RefCell::new(Vec::new()));
    let mut session = Session::new(
        NetworkConfig::default(),
        Box::new(FlatWorld::default()),
        Box::new(Errors(Rc::clone(&errors))),
    );

    let server = connect(&mut session, &listener);
    // Zero linger turns the close into a reset
    socket2::SockRef::from(&server).set_linger(Some(Duration::ZERO)).unwrap();
    drop(server);

    // Wait for the reader to queue the close without dispatching it
    for _ in 0..500 {
        if session.pending() > 0 {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(session.pending(), 1);

    assert!(session.disconnect());
    assert_eq!(*errors.borrow(), vec!["Connection reset by server".to_string()]);
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(session.pending(), 0);

    // Nothing left to report on later ticks
    session.tick();
    assert_eq!(errors.borrow().len(), 1);
}
