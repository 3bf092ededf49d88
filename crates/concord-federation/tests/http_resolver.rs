use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use concord_federation::{FederationError, HttpResolver, RemoteResolver};
use concord_identity::NodeIdentity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Clone)]
struct Published {
    node: NodeIdentity,
    hits: Arc<AtomicUsize>,
}

async fn publish_handler(
    State(state): State<Published>,
    Path(identifier): Path<String>,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if identifier == state.node.identifier {
        Ok(Json(state.node.published()))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// Serves `router` on an ephemeral port and returns its `host:port` domain.
async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr.to_string()
}

async fn serve_node(node: NodeIdentity) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/api/v1/nodes/{identifier}", get(publish_handler))
        .with_state(Published {
            node,
            hits: hits.clone(),
        });
    (serve(router).await, hits)
}

fn http_resolver(timeout: Duration) -> HttpResolver {
    HttpResolver::with_scheme("http", timeout).unwrap()
}

#[tokio::test]
async fn resolves_published_identity() {
    let node = NodeIdentity::provision("alpha", "Alpha").unwrap();
    let (domain, _) = serve_node(node.clone()).await;

    let published = http_resolver(Duration::from_secs(5))
        .resolve_remote(&domain, "alpha")
        .await
        .unwrap();

    assert_eq!(published, node.published());
    assert_eq!(
        published.verifying_key().unwrap(),
        node.verifying_key().unwrap()
    );
}

#[tokio::test]
async fn every_lookup_is_a_fresh_request() {
    let node = NodeIdentity::provision("alpha", "Alpha").unwrap();
    let (domain, hits) = serve_node(node).await;
    let resolver = http_resolver(Duration::from_secs(5));

    resolver.resolve_remote(&domain, "alpha").await.unwrap();
    resolver.resolve_remote(&domain, "alpha").await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_node_is_a_status_error() {
    let node = NodeIdentity::provision("alpha", "Alpha").unwrap();
    let (domain, _) = serve_node(node).await;

    let err = http_resolver(Duration::from_secs(5))
        .resolve_remote(&domain, "beta")
        .await
        .unwrap_err();

    assert!(matches!(err, FederationError::Status(404)), "got {err:?}");
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let router = Router::new().route("/api/v1/nodes/{identifier}", get(|| async { "not json" }));
    let domain = serve(router).await;

    let err = http_resolver(Duration::from_secs(5))
        .resolve_remote(&domain, "alpha")
        .await
        .unwrap_err();

    assert!(matches!(err, FederationError::Body(_)), "got {err:?}");
}

#[tokio::test]
async fn undecodable_public_key_is_rejected() {
    let router = Router::new().route(
        "/api/v1/nodes/{identifier}",
        get(|| async {
            Json(serde_json::json!({
                "identifier": "alpha",
                "signing_public_key": "AAAA",
            }))
        }),
    );
    let domain = serve(router).await;

    let err = http_resolver(Duration::from_secs(5))
        .resolve_remote(&domain, "alpha")
        .await
        .unwrap_err();

    assert!(matches!(err, FederationError::Body(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_domain_is_a_transport_error() {
    // Bind then drop to obtain a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let domain = listener.local_addr().unwrap().to_string();
    drop(listener);

    let err = http_resolver(Duration::from_secs(5))
        .resolve_remote(&domain, "alpha")
        .await
        .unwrap_err();

    assert!(matches!(err, FederationError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_domain_times_out() {
    let router = Router::new().route(
        "/api/v1/nodes/{identifier}",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            StatusCode::OK
        }),
    );
    let domain = serve(router).await;

    let err = http_resolver(Duration::from_millis(100))
        .resolve_remote(&domain, "alpha")
        .await
        .unwrap_err();

    match err {
        FederationError::Transport(e) => assert!(e.is_timeout(), "expected timeout, got {e}"),
        other => panic!("expected transport timeout, got {other:?}"),
    }
}
