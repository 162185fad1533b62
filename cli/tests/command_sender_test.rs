//! Integration tests for outbound device commands.
//!
//! A wiremock server plays the device's web server and records the GETs.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use gbs_control::link::{ConnectionId, PanelRequest, Transport};
use gbs_control::pad::{Direction, PadMode};
use gbs_control::ui::ConsoleReflector;
use gbs_control::{
    CommandChannel, CommandSender, LinkRunner, LinkTiming, RunnerSettings, Session,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Transport that never connects; these tests only look at commands.
#[derive(Debug, Default)]
struct NullTransport;

impl Transport for NullTransport {
    fn open(&mut self, _id: ConnectionId, _url: &str) {}
    fn close(&mut self, _id: ConnectionId) {}
    fn discard(&mut self, _id: ConnectionId) {}
}

async fn device() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sc"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uc"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

/// (path, query) of every request the device saw.
async fn received(server: &MockServer) -> Vec<(String, String)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|req| {
            (
                req.url.path().to_string(),
                req.url.query().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

fn assert_command(query: &str, code: &str) {
    let (got, nocache) = query
        .split_once("&nocache=")
        .unwrap_or_else(|| panic!("missing nocache in '{query}'"));
    assert_eq!(got, code);
    assert!(nocache.parse::<i64>().unwrap() > 0);
}

fn runner_for(
    server: &MockServer,
) -> LinkRunner<NullTransport, ConsoleReflector<Vec<u8>>> {
    let (_events_tx, events) = tokio::sync::mpsc::unbounded_channel();
    LinkRunner::new(
        Session::new("ws://127.0.0.1:1/", LinkTiming::default()),
        NullTransport,
        events,
        ConsoleReflector::new(Vec::new()),
        CommandSender::new(&server.uri()).unwrap(),
        RunnerSettings::default(),
    )
}

#[tokio::test]
async fn test_send_and_wait_hits_document_path() {
    let server = device().await;
    let sender = CommandSender::new(&server.uri()).unwrap();

    sender
        .send_and_wait(CommandChannel::Document, "3")
        .await
        .unwrap();

    let requests = received(&server).await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "/sc");
    assert_command(&requests[0].1, "3");
}

#[tokio::test]
async fn test_send_is_fire_and_forget() {
    let server = device().await;
    let sender = CommandSender::new(&server.uri()).unwrap();

    sender.send(CommandChannel::User, "B");
    tokio::time::sleep(Duration::from_millis(300)).await;

    let requests = received(&server).await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "/uc");
    assert_command(&requests[0].1, "B");
}

#[tokio::test]
async fn test_send_and_wait_reports_device_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let sender = CommandSender::new(&server.uri()).unwrap();

    assert!(sender.send_and_wait(CommandChannel::User, "a").await.is_err());
}

#[tokio::test]
async fn test_send_to_unreachable_device_does_not_fail_caller() {
    let sender = CommandSender::new("http://127.0.0.1:1").unwrap();
    sender.send(CommandChannel::Document, "1");
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_runner_pad_uses_selected_mode() {
    let server = device().await;
    let mut runner = runner_for(&server);
    let requests = runner.request_sender();

    requests.send(PanelRequest::Pad(Direction::Up)).unwrap();
    requests
        .send(PanelRequest::PadMode(PadMode::Borders))
        .unwrap();
    requests.send(PanelRequest::Pad(Direction::Right)).unwrap();
    requests.send(PanelRequest::Quit).unwrap();

    let shutdown = AtomicBool::new(false);
    runner.run(&shutdown).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let mut seen = received(&server).await;
    seen.sort();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, "/sc");
    assert_command(&seen[0].1, "*");
    assert_eq!(seen[1].0, "/uc");
    assert_command(&seen[1].1, "A");
}

#[tokio::test]
async fn test_runner_hold_repeats_until_released() {
    let server = device().await;
    let mut runner = runner_for(&server);
    let requests = runner.request_sender();

    requests
        .send(PanelRequest::Hold {
            direction: Direction::Right,
            duration_ms: 650,
        })
        .unwrap();
    let quit = requests.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1200)).await;
        let _ = quit.send(PanelRequest::Quit);
    });

    let shutdown = AtomicBool::new(false);
    runner.run(&shutdown).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let seen = received(&server).await;
    assert!(
        (2..=4).contains(&seen.len()),
        "expected a few repeats, got {}",
        seen.len()
    );
    for (path, query) in &seen {
        assert_eq!(path, "/sc");
        assert_command(query, "6");
    }
}

#[tokio::test]
async fn test_runner_restart_command_is_sent_and_noted() {
    let server = device().await;
    let mut runner = runner_for(&server);
    let requests = runner.request_sender();

    requests
        .send(PanelRequest::Send {
            channel: CommandChannel::User,
            code: "a".to_string(),
        })
        .unwrap();
    requests.send(PanelRequest::Quit).unwrap();

    let shutdown = AtomicBool::new(false);
    runner.run(&shutdown).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let seen = received(&server).await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "/uc");
    assert_command(&seen[0].1, "a");

    let console = String::from_utf8_lossy(runner.reflector().get_ref()).into_owned();
    assert!(console.contains("\nRestart\n"));
}
