//! Integration tests for the HTTP reminder source and poller.
//!
//! These run the real `reqwest` client against a local mock server.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use habitdeck_core::clock::ManualClock;
use habitdeck_core::error::ReminderError;
use habitdeck_core::reminders::{
    HttpReminderSource, MemoryNotifier, Notification, Notifier, Permission, PollOutcome,
    ReminderPoller, ReminderSignal, ReminderSource, ALERT_TITLE,
};

fn poller(source: HttpReminderSource, notifier: &Arc<MemoryNotifier>) -> ReminderPoller {
    let notifier: Arc<dyn Notifier> = notifier.clone();
    ReminderPoller::new(Arc::new(source), notifier, Arc::new(ManualClock::new(0)))
}

#[tokio::test]
async fn test_fetch_parses_pending_alert() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/get_reminders")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"alert": true, "message": "Stretch"}"#)
        .create_async()
        .await;

    let source = HttpReminderSource::new(&server.url()).unwrap();
    let signal = source.fetch().await.unwrap();

    assert_eq!(signal, ReminderSignal::due("Stretch"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_quiet_reply_never_notifies() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/get_reminders")
        .with_status(200)
        .with_body(r#"{"alert": false}"#)
        .create_async()
        .await;

    let notifier = Arc::new(MemoryNotifier::new(Permission::Granted));
    let p = poller(HttpReminderSource::new(&server.url()).unwrap(), &notifier);

    assert_eq!(p.poll_once().await, PollOutcome::Quiet);
    assert!(notifier.delivered().is_empty());
}

#[tokio::test]
async fn test_pending_alert_notifies_with_message() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/get_reminders")
        .with_status(200)
        .with_body(r#"{"alert": true, "message": "Log your water"}"#)
        .create_async()
        .await;

    let notifier = Arc::new(MemoryNotifier::new(Permission::Granted));
    let p = poller(HttpReminderSource::new(&server.url()).unwrap(), &notifier);

    assert_eq!(
        p.poll_once().await,
        PollOutcome::Delivered("Log your water".into())
    );
    assert_eq!(
        notifier.delivered(),
        vec![Notification::new(ALERT_TITLE, "Log your water")]
    );
}

#[tokio::test]
async fn test_server_error_is_reported_not_raised() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/get_reminders")
        .with_status(500)
        .create_async()
        .await;

    let source = HttpReminderSource::new(&server.url()).unwrap();
    assert!(matches!(source.fetch().await, Err(ReminderError::Status(500))));

    let notifier = Arc::new(MemoryNotifier::new(Permission::Granted));
    let p = poller(source, &notifier);
    assert!(matches!(p.poll_once().await, PollOutcome::Failed(_)));
    assert!(notifier.delivered().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/get_reminders")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let source = HttpReminderSource::new(&server.url()).unwrap();
    assert!(matches!(
        source.fetch().await,
        Err(ReminderError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_denied_permission_never_contacts_server() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/get_reminders")
        .with_status(200)
        .with_body(r#"{"alert": true, "message": "x"}"#)
        .expect(0)
        .create_async()
        .await;

    let notifier = Arc::new(MemoryNotifier::new(Permission::Denied));
    let p = poller(HttpReminderSource::new(&server.url()).unwrap(), &notifier);

    assert_eq!(p.poll_once().await, PollOutcome::Skipped);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unanswered_request_times_out() {
    // Connections land in the backlog and are never read.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let source = HttpReminderSource::with_timeout(&base, Duration::from_millis(200)).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(10), source.fetch())
        .await
        .expect("client timeout fires first");
    match result {
        Err(ReminderError::Request(e)) => assert!(e.is_timeout()),
        other => panic!("expected a timeout, got {other:?}"),
    }
    drop(listener);
}
