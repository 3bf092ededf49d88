use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use concord_identity::NodeIdentity;
use concord_server::config::Config;
use concord_server::{app, AppState};
use serde_json::Value;
use tower::ServiceExt; // for oneshot

fn state_with_nodes(nodes: Vec<NodeIdentity>) -> AppState {
    let mut config = Config::default();
    config.server.domain = "d1.example".to_string();
    config.nodes = nodes;
    AppState::from_config(&config).unwrap()
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_check_returns_ok() {
    let (status, json) = get_json(app(state_with_nodes(vec![])), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_get_node_publishes_public_identity_only() {
    let alpha = NodeIdentity::provision("alpha", "Alpha").unwrap();
    let app = app(state_with_nodes(vec![alpha.clone()]));

    let (status, json) = get_json(app, "/api/v1/nodes/alpha").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["identifier"], "alpha");
    assert_eq!(json["display_name"], "Alpha");
    assert_eq!(json["signing_public_key"], alpha.signing_public_key.as_str());
    assert!(json.get("signing_private_key").is_none());
    assert!(!json.to_string().contains(&alpha.signing_private_key));
}

#[tokio::test]
async fn test_get_unknown_node_is_not_found() {
    let alpha = NodeIdentity::provision("alpha", "Alpha").unwrap();
    let (status, json) = get_json(app(state_with_nodes(vec![alpha])), "/api/v1/nodes/ghost").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn test_list_nodes_is_sorted() {
    let beta = NodeIdentity::provision("beta", "Beta").unwrap();
    let alpha = NodeIdentity::provision("alpha", "Alpha").unwrap();
    let (status, json) = get_json(app(state_with_nodes(vec![beta, alpha])), "/api/v1/nodes").await;

    assert_eq!(status, StatusCode::OK);
    let identifiers: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|node| node["identifier"].as_str().unwrap())
        .collect();
    assert_eq!(identifiers, vec!["alpha", "beta"]);
}

#[test]
fn test_state_rejects_bad_configuration() {
    let alpha = NodeIdentity::provision("alpha", "Alpha").unwrap();

    let mut duplicate = Config::default();
    duplicate.nodes = vec![alpha.clone(), alpha.clone()];
    assert!(AppState::from_config(&duplicate).is_err());

    let mut broken = Config::default();
    let mut bad = alpha.clone();
    bad.signing_public_key = "AAAA".to_string();
    broken.nodes = vec![bad];
    assert!(AppState::from_config(&broken).is_err());

    let mut scheme = Config::default();
    scheme.federation.scheme = "ftp".to_string();
    assert!(AppState::from_config(&scheme).is_err());

    let mut domain = Config::default();
    domain.server.domain = "d1/alpha".to_string();
    assert!(AppState::from_config(&domain).is_err());
}

#[test]
fn test_state_rejects_zero_durations() {
    use concord_server::config::ConfigError;

    let mut request = Config::default();
    request.server.request_timeout_secs = 0;
    let mut lookup = Config::default();
    lookup.federation.timeout_secs = 0;
    let mut ttl = Config::default();
    ttl.federation.cache_ttl_secs = Some(0);

    for config in [request, lookup, ttl] {
        assert!(matches!(
            AppState::from_config(&config),
            Err(ConfigError::Invalid(_))
        ));
    }
}
