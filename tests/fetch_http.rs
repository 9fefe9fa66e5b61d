//! DataFetcher against a one-shot local HTTP server.

use carburants::{DataFetcher, FetchError};
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

/// Serve exactly one request with the given status line and body; returns the base URL
/// and a handle yielding the request line.
fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                break;
            }
        }
        write!(
            stream,
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
        .unwrap();
        stream.flush().unwrap();
        request_line
    });
    (format!("http://{}/", addr), handle)
}

#[test]
fn ok_json_body_is_parsed() {
    let (base, server) = serve_once("200 OK", r#"{"a":1}"#);
    let fetcher = DataFetcher::with_base_url(base.clone());
    let v: Value = fetcher.get_json(&format!("{}x.json", base)).unwrap();
    assert_eq!(v, serde_json::json!({"a": 1}));
    assert!(server.join().unwrap().starts_with("GET /x.json"));
}

#[test]
fn not_found_is_rejected_with_status() {
    let (base, server) = serve_once("404 Not Found", "404: Not Found");
    let fetcher = DataFetcher::with_base_url(base.clone());
    let err = fetcher.get(&format!("{}missing.json", base)).unwrap_err();
    assert_eq!(err.status(), Some(404));
    match err {
        FetchError::Status { body, .. } => assert_eq!(body, "404: Not Found"),
        other => panic!("unexpected error {:?}", other),
    }
    server.join().unwrap();
}

#[test]
fn invalid_json_is_a_parse_error() {
    let (base, server) = serve_once("200 OK", "not json");
    let fetcher = DataFetcher::with_base_url(base.clone());
    let err = fetcher.get_json::<Value>(&format!("{}x.json", base)).unwrap_err();
    assert!(matches!(err, FetchError::Parse { .. }));
    server.join().unwrap();
}

#[test]
fn repository_files_are_addressed_by_ref_and_path() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"keys":["lat","lon","city","street","postcode","Gazole"],"data":[[4650000,240000,"Paris","Rue X","75000",1.85]]}"#,
    );
    let fetcher = DataFetcher::with_base_url(base);
    let points = fetcher.get_sale_points("data/20220526.json", "data").unwrap();
    assert_eq!(points.len(), 1);
    assert!(server.join().unwrap().starts_with("GET /data/data/20220526.json"));
}
