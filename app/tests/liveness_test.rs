//! Liveness endpoint served over a real socket.

use keyprobe_app::liveness;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_liveness_endpoints() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let cancel = CancellationToken::new();
    let server = tokio::spawn(liveness::serve(listener, cancel.clone()));

    let client = reqwest::Client::new();
    let root = client
        .get(format!("http://{addr}/"))
        .send()
        .await
        .expect("root request");
    assert_eq!(root.status(), reqwest::StatusCode::OK);
    assert_eq!(root.text().await.expect("root body"), "Bot is running!");

    let health: serde_json::Value = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .expect("health request")
        .json()
        .await
        .expect("health body");
    assert_eq!(health["status"], "ok");
    assert!(health["timestamp"].is_string());

    let missing = client
        .get(format!("http://{addr}/scan"))
        .send()
        .await
        .expect("404 request");
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    cancel.cancel();
    server
        .await
        .expect("server task")
        .expect("server shuts down cleanly");
}
