use axum::{http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use pm1_monitor::core::measurement::ChannelReading;
use pm1_monitor::core::{MeasurementSource, PollError, PollEvent, PollSettings, Poller, ProbeClient};

fn measurements() -> Value {
    json!([
        {"_name": "CH0", "verbose_name": "Boiler", "probe": "Pt100", "avg_reading": 4521.0,
         "resistance_Om": 108.3531, "temperature_C": "21.5",
         "temperature_K": 294.65, "temperature_F": 70.7},
        {"_name": "CH1", "verbose_name": "Return", "probe": "Pt1000", "avg_reading": 4498.0,
         "resistance_Om": "1077.9", "temperature_C": 20.25,
         "temperature_K": "293.4", "temperature_F": "68.45"},
        {}
    ])
}

async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: &str) -> ProbeClient {
    ProbeClient::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn fetches_measurement_list() {
    let router = Router::new().route("/api/measurements/list", get(|| async { Json(measurements()) }));
    let base_url = spawn_server(router).await;

    let frame = client(&base_url).fetch_measurements().await.unwrap();

    assert_eq!(frame.len(), 3);
    let first = frame[0].record().unwrap();
    assert_eq!(first.verbose_name, "Boiler");
    assert_eq!(first.temperature_c.value(), 21.5);
    assert_eq!(frame[1].record().unwrap().resistance_ohm.value(), 1077.9);
    assert_eq!(frame[2], ChannelReading::Pending);
}

#[tokio::test]
async fn non_success_status_is_a_status_error() {
    let router = Router::new().route(
        "/api/measurements/list",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
    );
    let base_url = spawn_server(router).await;

    match client(&base_url).fetch_measurements().await {
        Err(PollError::Status(status)) => assert_eq!(status.as_u16(), 503),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn unknown_path_is_a_status_error() {
    let base_url = spawn_server(Router::new()).await;

    let err = client(&base_url).fetch_measurements().await.unwrap_err();
    assert!(err.is_network());
    assert_eq!(err.to_string(), "Response status: 404 Not Found");
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let router = Router::new().route("/api/measurements/list", get(|| async { "[{\"_name\": " }));
    let base_url = spawn_server(router).await;

    let err = client(&base_url).fetch_measurements().await.unwrap_err();
    assert!(matches!(err, PollError::Parse(_)));
    assert!(!err.is_network());
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}", addr)).fetch_measurements().await.unwrap_err();
    assert!(matches!(err, PollError::Transport(_)));
}

#[tokio::test]
async fn fetches_device_status() {
    let router = Router::new().route(
        "/api/state/list",
        get(|| async {
            Json(json!({
                "info": {"NAME": "PM1", "VERSION": "1.0"},
                "data": {
                    "device_mode": "Continuous",
                    "is_initialized": true,
                    "network_info": ["192.168.4.20", "255.255.255.0", "192.168.4.1", "8.8.8.8"],
                    "wifi_ok": true,
                    "free_memory": 120000,
                    "measurement_results": measurements()
                }
            }))
        }),
    );
    let base_url = spawn_server(router).await;

    let status = client(&base_url).fetch_status().await.unwrap();
    assert_eq!(status.info.version, "1.0");
    assert_eq!(status.data.device_mode, "Continuous");
    assert_eq!(status.data.measurement_results.unwrap().len(), 3);
}

#[tokio::test]
async fn poll_cycle_over_http_renders_both_views() {
    let router = Router::new().route("/api/measurements/list", get(|| async { Json(measurements()) }));
    let base_url = spawn_server(router).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (poller, _handle) = Poller::new(client(&base_url), PollSettings::default(), tx);

    assert!(poller.poll_cycle().await);
    assert!(matches!(rx.recv().await, Some(PollEvent::Started)));

    let Some(PollEvent::Updated { views, .. }) = rx.recv().await else {
        panic!("expected an update");
    };
    let texts: Vec<(String, &str)> = views
        .iter()
        .map(|(element, text)| (element.dom_id(), text.as_str()))
        .collect();

    assert!(texts.contains(&("tempdisplay-temp1".to_string(), "21.50°C")));
    assert!(texts.contains(&("tempdisplay-title2".to_string(), "Return")));
    assert!(texts.contains(&("tempc1".to_string(), "21.500")));
    assert!(texts.contains(&("tempf2".to_string(), "68.450")));
    assert!(texts.contains(&("resistance1".to_string(), "108.353")));
    // Third channel is pending: nothing written for it
    assert!(texts.iter().all(|(id, _)| !id.ends_with('3')));
}
