//! Black-box protocol scenarios driven purely through the public API,
//! feeding the crate raw byte strings rather than reaching into internals.

use http_engine::{
    Connection, ConnectionConfig, Event, Header, HTTPVersion, Method, NextEvent, Request, Response,
    Role, StatusCode,
};

fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name.as_bytes().to_vec(), value.as_bytes().to_vec()).unwrap()
}

fn get(target: &str, headers: Vec<Header>) -> Request {
    Request {
        method: Method::from_bytes(b"GET".to_vec()).unwrap(),
        target: target.as_bytes().to_vec(),
        http_version: HTTPVersion::HTTP_11,
        headers,
    }
}

/// Two full request/response cycles over the same connection, the second
/// lap going through `start_next_cycle`.
#[test]
fn keep_alive_connection_serves_two_cycles() {
    let mut client = Connection::new(Role::Client, ConnectionConfig::default());
    let mut server = Connection::new(Role::Server, ConnectionConfig::default());

    for i in 0..2 {
        let path = format!("/{}", i);
        let req_bytes = client
            .send(Event::Request(get(&path, vec![header("Host", "x")])))
            .unwrap();
        client.send(Event::end_of_message()).unwrap();

        server.receive_data(&req_bytes).unwrap();
        assert!(matches!(
            server.next_event().unwrap(),
            NextEvent::Event(http_engine::Event::Request(_))
        ));
        assert!(matches!(
            server.next_event().unwrap(),
            NextEvent::Event(http_engine::Event::EndOfMessage(_))
        ));

        let resp_bytes = server
            .send(Event::Response(Response {
                status: StatusCode(200),
                http_version: HTTPVersion::HTTP_11,
                headers: vec![header("Content-Length", "2")],
                reason: b"OK".to_vec(),
            }))
            .unwrap();
        let data_bytes = server.send(Event::data(b"ok".to_vec())).unwrap();
        let end_bytes = server.send(Event::end_of_message()).unwrap();

        client.receive_data(&resp_bytes).unwrap();
        client.next_event().unwrap();
        client.receive_data(&data_bytes).unwrap();
        client.next_event().unwrap();
        client.receive_data(&end_bytes).unwrap();
        client.next_event().unwrap();

        client.start_next_cycle().unwrap();
        server.start_next_cycle().unwrap();
    }
}

/// A malformed request line is a `RemoteProtocolError`, and the connection
/// stays failed afterwards -- both `send` and `next_event` must keep
/// raising once the connection has entered the error state.
#[test]
fn malformed_request_line_is_a_remote_protocol_error_and_sticks() {
    let mut server = Connection::new(Role::Server, ConnectionConfig::default());
    server.receive_data(b"NOT A REQUEST LINE\r\n\r\n").unwrap();
    assert!(server.next_event().is_err());
    assert!(server.next_event().is_err());

    let resp = server.send(Event::Response(Response {
        status: StatusCode(400),
        http_version: HTTPVersion::HTTP_11,
        headers: vec![],
        reason: vec![],
    }));
    assert!(resp.is_err());
}

/// An oversize header block (no terminator before the configured limit) is
/// rejected with a 431 status hint.
#[test]
fn oversize_header_block_is_rejected_with_431_hint() {
    let mut server = Connection::new(
        Role::Server,
        ConnectionConfig {
            max_header_block_size: 32,
        },
    );
    let huge = format!("GET / HTTP/1.1\r\nX-Long: {}\r\n", "a".repeat(64));
    server.receive_data(huge.as_bytes()).unwrap();
    match server.next_event() {
        Err(http_engine::ConnectionError::Remote(e)) => {
            assert_eq!(e.error_status_hint.as_u16(), 431);
        }
        other => panic!("expected a 431 RemoteProtocolError, got {:?}", other.err()),
    }
}

/// Sending a `Request` while already `SEND_BODY` (pipelining) is refused.
#[test]
fn client_pipelining_is_refused() {
    let mut client = Connection::new(Role::Client, ConnectionConfig::default());
    client
        .send(Event::Request(get("/a", vec![header("Host", "x")])))
        .unwrap();
    let err = client.send(Event::Request(get("/b", vec![header("Host", "x")])));
    assert!(err.is_err());
}

/// A chunked body consisting only of the terminating zero chunk produces
/// `EndOfMessage` without any `Data` events.
#[test]
fn chunked_body_with_only_terminating_chunk_emits_no_data() {
    let mut server = Connection::new(Role::Server, ConnectionConfig::default());
    server
        .receive_data(b"POST /up HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\n0\r\n\r\n")
        .unwrap();
    assert!(matches!(
        server.next_event().unwrap(),
        NextEvent::Event(http_engine::Event::Request(_))
    ));
    assert!(matches!(
        server.next_event().unwrap(),
        NextEvent::Event(http_engine::Event::EndOfMessage(_))
    ));
}

/// `next_event` returns `NEED_DATA` while a request is incomplete, and the
/// event is produced only once the remaining bytes arrive -- no prefetch.
#[test]
fn next_event_needs_data_until_request_is_complete() {
    let mut server = Connection::new(Role::Server, ConnectionConfig::default());
    server.receive_data(b"GET / HTTP/1.1\r\nHost: x").unwrap();
    assert!(matches!(server.next_event().unwrap(), NextEvent::NeedData));
    server.receive_data(b"\r\n\r\n").unwrap();
    assert!(matches!(
        server.next_event().unwrap(),
        NextEvent::Event(http_engine::Event::Request(_))
    ));
}
