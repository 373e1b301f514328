//! Controller state tests against a scripted device and wiremock endpoints.

mod support;

use std::sync::Arc;
use std::time::Duration;

use svcmkt_core::Coordinates;
use svcmkt_location::{
    ControllerOptions, LocationController, LocationError, LocationState, PermissionStatus,
    Strategy,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{eventually, resolver, ScriptedSource};

fn controller(
    source: &Arc<ScriptedSource>,
    server: &MockServer,
    auto_request: bool,
) -> LocationController<ScriptedSource> {
    LocationController::new(
        resolver(source, &server.uri()),
        ControllerOptions { auto_request },
    )
}

#[tokio::test]
async fn reverse_geocode_failure_still_sets_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/location/reverse-geocode"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let source = Arc::new(ScriptedSource::at(34.0522, -118.2437));
    let controller = controller(&source, &server, false);

    controller
        .get_current_location()
        .await
        .expect("fix should succeed");

    let state = controller.state();
    assert_eq!(
        state.coordinates,
        Some(Coordinates::new(34.0522, -118.2437).unwrap())
    );
    assert!(state.location_info.is_none());
    assert!(state.error.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn denied_fix_marks_permission_denied() {
    let server = MockServer::start().await;
    let source = Arc::new(ScriptedSource::with_fix(Err(
        LocationError::permission_denied(),
    )));
    let controller = controller(&source, &server, false);

    let err = controller.get_current_location().await.unwrap_err();
    assert_eq!(err.code(), 1);

    let state = controller.state();
    assert_eq!(state.permission_status, PermissionStatus::Denied);
    assert_eq!(state.error.map(|e| e.code()), Some(1));
    assert!(!state.loading);
    assert!(state.coordinates.is_none());
}

#[tokio::test]
async fn loading_is_set_while_a_fix_is_pending() {
    let server = MockServer::start().await;
    let source = Arc::new(ScriptedSource {
        delay: Some(Duration::from_millis(100)),
        ..ScriptedSource::at(1.0, 1.0)
    });
    let controller = controller(&source, &server, false);

    let (result, loading_midway) = tokio::join!(controller.get_current_location(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.state().loading
    });

    assert!(result.is_ok());
    assert!(loading_midway);
    assert!(!controller.state().loading);
}

#[tokio::test]
async fn watch_is_cleared_exactly_once() {
    let server = MockServer::start().await;
    let source = Arc::new(ScriptedSource::at(1.0, 1.0));
    let controller = controller(&source, &server, false);

    controller.start_watching();
    assert!(controller.state().watching);
    controller.stop_watching();
    controller.stop_watching();
    controller.teardown();

    assert_eq!(source.watch_calls(), 1);
    assert_eq!(source.clear_calls(), 1);
    assert!(!controller.state().watching);
}

#[tokio::test]
async fn starting_twice_keeps_one_watch() {
    let server = MockServer::start().await;
    let source = Arc::new(ScriptedSource::at(1.0, 1.0));
    let controller = controller(&source, &server, false);

    controller.start_watching();
    controller.start_watching();
    assert_eq!(source.watch_calls(), 1);

    drop(controller);
    assert_eq!(source.clear_calls(), 1);
}

#[tokio::test]
async fn watch_updates_flow_into_state() {
    let server = MockServer::start().await;
    let source = Arc::new(ScriptedSource::at(1.0, 1.0));
    let controller = controller(&source, &server, false);
    controller.start_watching();

    let moved = Coordinates::new(-33.8688, 151.2093).unwrap();
    source.emit(Ok(moved));
    assert!(eventually(|| controller.state().coordinates == Some(moved)).await);

    source.emit(Err(LocationError::timeout()));
    assert!(eventually(|| controller.state().error.is_some()).await);

    let state = controller.state();
    assert_eq!(state.coordinates, Some(moved));
    let error = state.error.unwrap();
    assert_eq!(error.code(), 3);
    assert_eq!(error.message, "Watch position error: Location request timed out");

    source.emit(Ok(moved));
    assert!(eventually(|| controller.state().error.is_none()).await);
}

#[tokio::test]
async fn unsupported_device_cannot_watch() {
    let server = MockServer::start().await;
    let source = Arc::new(ScriptedSource::unsupported());
    let controller = controller(&source, &server, false);

    controller.start_watching();

    let state = controller.state();
    assert!(!state.watching);
    assert_eq!(state.error.map(|e| e.code()), Some(2));
    assert_eq!(source.watch_calls(), 0);
}

#[tokio::test]
async fn clear_location_resets_state_and_watch() {
    let server = MockServer::start().await;
    let source = Arc::new(ScriptedSource::at(10.0, 20.0));
    let controller = controller(&source, &server, false);

    controller.get_current_location().await.unwrap();
    controller.start_watching();
    controller.clear_location();

    let state = controller.state();
    assert!(state.coordinates.is_none());
    assert!(state.location_info.is_none());
    assert!(state.error.is_none());
    assert!(!state.watching);
    assert_eq!(source.clear_calls(), 1);
}

#[tokio::test]
async fn clear_error_keeps_everything_else() {
    let server = MockServer::start().await;
    let source = Arc::new(ScriptedSource::at(10.0, 20.0));
    let controller = controller(&source, &server, false);

    controller.get_current_location().await.unwrap();
    controller.get_location_from_ip().await.unwrap_err();
    assert_eq!(controller.state().error.map(|e| e.code()), Some(-1));

    controller.clear_error();

    let state = controller.state();
    assert!(state.error.is_none());
    assert_eq!(state.coordinates, Some(Coordinates::new(10.0, 20.0).unwrap()));
}

#[tokio::test]
async fn mount_swallows_permission_query_errors() {
    let server = MockServer::start().await;
    let source = Arc::new(ScriptedSource::at(1.0, 1.0));
    source.set_permission(Err(LocationError::remote("no permissions API")));
    let controller = controller(&source, &server, true);

    assert_eq!(controller.mount().await, PermissionStatus::Unsupported);

    let state = controller.state();
    assert_eq!(state.permission_status, PermissionStatus::Unsupported);
    assert!(state.error.is_none());
    assert_eq!(source.current_calls(), 0);
}

#[tokio::test]
async fn auto_request_fires_once_per_transition_into_granted() {
    let server = MockServer::start().await;
    let source = Arc::new(ScriptedSource::at(1.0, 1.0));
    source.set_permission(Ok(PermissionStatus::Granted));
    let controller = controller(&source, &server, true);

    controller.mount().await;
    assert_eq!(source.current_calls(), 1);

    controller.refresh_permission().await;
    controller.refresh_permission().await;
    assert_eq!(source.current_calls(), 1);

    source.set_permission(Ok(PermissionStatus::Prompt));
    controller.refresh_permission().await;
    source.set_permission(Ok(PermissionStatus::Granted));
    controller.refresh_permission().await;
    assert_eq!(source.current_calls(), 2);
}

#[tokio::test]
async fn auto_request_disabled_never_fetches() {
    let server = MockServer::start().await;
    let source = Arc::new(ScriptedSource::at(1.0, 1.0));
    source.set_permission(Ok(PermissionStatus::Granted));
    let controller = controller(&source, &server, false);

    assert_eq!(controller.mount().await, PermissionStatus::Granted);
    assert_eq!(source.current_calls(), 0);
}

#[tokio::test]
async fn teardown_discards_late_results() {
    let server = MockServer::start().await;
    let source = Arc::new(ScriptedSource {
        delay: Some(Duration::from_millis(100)),
        ..ScriptedSource::at(1.0, 1.0)
    });
    let controller = controller(&source, &server, false);

    let (result, ()) = tokio::join!(controller.get_current_location(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.teardown();
    });

    assert!(result.is_ok());
    let state = controller.state();
    assert!(state.coordinates.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn blank_geocode_leaves_state_untouched() {
    let server = MockServer::start().await;
    let source = Arc::new(ScriptedSource::at(1.0, 1.0));
    let controller = controller(&source, &server, false);

    assert_eq!(controller.geocode_address("  ").await, Ok(None));
    assert_eq!(controller.state(), LocationState::default());
}

#[tokio::test]
async fn geocode_replaces_position_and_address() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/location/geocode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "data": { "latitude": 51.5007, "longitude": -0.1246, "city": "London" }
        })))
        .mount(&server)
        .await;

    let source = Arc::new(ScriptedSource::at(1.0, 1.0));
    let controller = controller(&source, &server, false);
    controller.get_current_location().await.unwrap();

    controller
        .geocode_address("Westminster, London")
        .await
        .unwrap();

    let state = controller.state();
    assert_eq!(state.coordinates, Some(Coordinates::new(51.5007, -0.1246).unwrap()));
    assert_eq!(
        state.location_info.map(|info| info.display_string()),
        Some("London".to_string())
    );
}

#[tokio::test]
async fn locate_falls_back_to_ip_and_remembers_denial() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/location/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "data": { "latitude": 48.1351, "longitude": 11.5820, "city": "Munich" }
        })))
        .mount(&server)
        .await;

    let source = Arc::new(ScriptedSource::with_fix(Err(
        LocationError::permission_denied(),
    )));
    let controller = controller(&source, &server, false);

    let resolution = controller.locate().await.unwrap();
    assert_eq!(resolution.strategy, Strategy::Ip);

    let state = controller.state();
    assert_eq!(state.permission_status, PermissionStatus::Denied);
    assert!(state.error.is_none());
    assert_eq!(state.coordinates, Some(Coordinates::new(48.1351, 11.5820).unwrap()));
    assert!(!state.loading);
}

#[tokio::test]
async fn ip_result_without_position_drops_previous_fix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/location/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "data": { "city": "Lisbon", "country": "Portugal" }
        })))
        .mount(&server)
        .await;

    let source = Arc::new(ScriptedSource::at(37.77, -122.41));
    let controller = controller(&source, &server, false);

    controller.get_current_location().await.unwrap();
    assert!(controller.state().coordinates.is_some());

    controller.get_location_from_ip().await.unwrap();

    let state = controller.state();
    assert!(state.coordinates.is_none());
    assert_eq!(
        state.location_info.map(|info| info.display_string()),
        Some("Lisbon, Portugal".to_string())
    );
}

#[tokio::test]
async fn calls_after_teardown_leave_state_alone() {
    let server = MockServer::start().await;
    let source = Arc::new(ScriptedSource::with_fix(Err(LocationError::timeout())));
    let controller = controller(&source, &server, false);

    controller.get_current_location().await.unwrap_err();
    controller.teardown();
    let before = controller.state();
    assert_eq!(before.error.as_ref().map(LocationError::code), Some(3));

    assert!(controller.get_current_location().await.is_err());
    assert_eq!(controller.state(), before);
    assert_eq!(source.current_calls(), 2);
}
