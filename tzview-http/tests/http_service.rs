use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tzview_core::{
    ClientState, ConversionRequest, ConversionRequester, ConversionResult, Outcome, PollKind,
    Poller, ServiceError, TimeZoneService, ViewModel,
};
use tzview_http::HttpTimeZoneService;

/// Serve `router` on an ephemeral local port and return its base URL.
async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn timezones() -> Json<Value> {
    Json(json!({
        "timezones": [
            {"timezone": "America/New_York", "current_time": "2025-03-08T05:08:43.620624-05:00"},
            {"timezone": "Asia/Kolkata", "current_time": "2025-03-08T15:38:43.620624+05:30"},
            {"timezone": "Europe/Paris", "current_time": "2025-03-08T11:08:43.620624+01:00"},
        ]
    }))
}

async fn current_time() -> Json<Value> {
    Json(json!({
        "timezone": "America/New_York",
        "current_time": "2025-03-08 05:08:43 AM",
    }))
}

async fn convert_time(Json(body): Json<ConversionRequest>) -> (StatusCode, Json<Value>) {
    let supported = ["America/New_York", "Asia/Kolkata"];
    if !supported.contains(&body.source_timezone.as_str()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Source timezone is not supported."})),
        );
    }
    if !supported.contains(&body.target_timezone.as_str()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Target timezone is not supported."})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "source_time": format!("{}:00-05:00", body.time),
            "source_timezone": body.source_timezone,
            "target_time": "2025-03-08T15:38:00+05:30",
            "target_timezone": body.target_timezone,
        })),
    )
}

fn time_service_router() -> Router {
    Router::new()
        .route("/timezones", get(timezones))
        .route("/current_time", get(current_time))
        .route("/convert-time", post(convert_time))
}

async fn service_for(router: Router) -> HttpTimeZoneService {
    HttpTimeZoneService::new(&spawn_server(router).await).unwrap()
}

#[tokio::test]
async fn test_list_time_zones_keeps_order() {
    let service = service_for(time_service_router()).await;

    let entries = service.list_time_zones().await.unwrap();

    let names: Vec<_> = entries.iter().map(|e| e.timezone.as_str()).collect();
    assert_eq!(names, vec!["America/New_York", "Asia/Kolkata", "Europe/Paris"]);
    assert_eq!(entries[1].current_time, "2025-03-08T15:38:43.620624+05:30");
}

#[tokio::test]
async fn test_current_time_decodes_pair() {
    let service = service_for(time_service_router()).await;

    let current = service.current_time().await.unwrap();

    assert_eq!(current.timezone, "America/New_York");
    assert_eq!(current.current_time, "2025-03-08 05:08:43 AM");
}

#[tokio::test]
async fn test_convert_time_round_trip() {
    let service = service_for(time_service_router()).await;
    let request = ConversionRequest {
        source_timezone: "America/New_York".into(),
        target_timezone: "Asia/Kolkata".into(),
        time: "2025-03-08T05:08".into(),
    };

    let result = service.convert_time(&request).await.unwrap();

    assert_eq!(
        result,
        ConversionResult {
            source_time: "2025-03-08T05:08:00-05:00".into(),
            source_timezone: "America/New_York".into(),
            target_time: "2025-03-08T15:38:00+05:30".into(),
            target_timezone: "Asia/Kolkata".into(),
        }
    );
}

#[tokio::test]
async fn test_rejected_conversion_carries_detail() {
    let service = service_for(time_service_router()).await;
    let request = ConversionRequest {
        source_timezone: "America/New_York".into(),
        target_timezone: "Mars/Olympus_Mons".into(),
        time: "2025-03-08T05:08".into(),
    };

    let err = service.convert_time(&request).await.unwrap_err();

    match err {
        ServiceError::Status {
            endpoint,
            status,
            detail,
        } => {
            assert_eq!(endpoint, "/convert-time");
            assert_eq!(status.as_u16(), 400);
            assert_eq!(detail.as_deref(), Some("Target timezone is not supported."));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_failure() {
    let router = Router::new()
        .route("/timezones", get(|| async { "this is not json" }))
        .route(
            "/current_time",
            get(|| async { Json(json!({"timezone": "Asia/Tokyo"})) }),
        );
    let service = service_for(router).await;

    let err = service.list_time_zones().await.unwrap_err();
    assert!(matches!(err, ServiceError::Decode { endpoint: "/timezones", .. }));

    // Valid JSON missing `current_time`
    let err = service.current_time().await.unwrap_err();
    assert!(matches!(err, ServiceError::Decode { endpoint: "/current_time", .. }));
}

#[tokio::test]
async fn test_missing_route_is_status_failure() {
    let service = service_for(Router::new()).await;

    let err = service.list_time_zones().await.unwrap_err();
    assert!(matches!(err, ServiceError::Status { detail: None, .. }));
}

#[tokio::test]
async fn test_unreachable_service_is_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let service = HttpTimeZoneService::new(&format!("http://{addr}")).unwrap();
    let err = service.current_time().await.unwrap_err();

    assert!(matches!(err, ServiceError::Network(_)));
    assert_eq!(err.kind(), "network");
}

#[tokio::test]
async fn test_timeout_is_network_failure() {
    let router = Router::new().route(
        "/current_time",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            current_time().await
        }),
    );
    let base = spawn_server(router).await;
    let service =
        HttpTimeZoneService::with_timeout(base.parse().unwrap(), Duration::from_millis(200))
            .unwrap();

    let err = service.current_time().await.unwrap_err();
    assert!(matches!(err, ServiceError::Network(ref e) if e.is_timeout()));
}

#[tokio::test]
async fn test_view_tracks_live_service() {
    let service: Arc<dyn TimeZoneService> =
        Arc::new(service_for(time_service_router()).await);
    let view = ViewModel::new(ClientState::default(), None);

    let list = Arc::new(Poller::new(
        PollKind::TimeZoneList,
        Arc::clone(&service),
        Arc::clone(&view),
        Duration::from_millis(50),
    ));
    let time = Arc::new(Poller::new(
        PollKind::CurrentTime,
        Arc::clone(&service),
        Arc::clone(&view),
        Duration::from_millis(20),
    ));
    let handles = [Arc::clone(&list).start(), Arc::clone(&time).start()];

    let mut state = view.snapshot().await;
    for _ in 0..100 {
        if state.available_time_zones.len() == 3 && state.selected_time_zone == "America/New_York" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        state = view.snapshot().await;
    }
    assert_eq!(state.available_time_zones.len(), 3);
    assert_eq!(state.current_time, "2025-03-08 05:08:43 AM");
    assert_eq!(state.selected_time_zone, "America/New_York");

    view.set_search_query("asia").await;
    view.set_time_to_convert("2025-03-08T05:08").await.unwrap();
    let outcome = ConversionRequester::new(Arc::clone(&service), Arc::clone(&view))
        .convert()
        .await;
    assert_eq!(outcome, Outcome::Applied);

    let state = view.snapshot().await;
    assert_eq!(state.filtered_time_zones().len(), 1);
    let result = state.conversion_result.unwrap();
    assert_eq!(result.source_time, "2025-03-08T05:08:00-05:00");
    assert_eq!(result.target_timezone, "Asia/Kolkata");

    view.teardown();
    for handle in handles {
        handle.await.unwrap();
    }
    list.in_flight().wait().await;
    time.in_flight().wait().await;
    assert!(view.is_torn_down());
}
