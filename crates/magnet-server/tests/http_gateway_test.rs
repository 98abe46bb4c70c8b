//! HTTP Gateway Integration Tests
//!
//! End-to-end tests against a real server: bind a listener on an ephemeral
//! port, serve the gateway from a temporary document root, and drive it
//! with a plain HTTP client. Covers:
//! - script output as response body
//! - 404 / 500 mapping for the three failure kinds
//! - cache reuse and invalidation observed across real requests
//! - built-in `/_metrics` and `/_info` endpoints

use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use magnet_server::{BaseEnv, Gateway, GatewayRouter, HttpServer};
use tokio::net::TcpListener;

struct TestGateway {
    addr: SocketAddr,
    root: tempfile::TempDir,
}

impl TestGateway {
    async fn start() -> Self {
        let root = tempfile::tempdir().unwrap();
        let gateway = Arc::new(Gateway::new(
            BaseEnv::new().with_value("SERVER_NAME", "magnet-test"),
        ));
        let router = GatewayRouter::new(gateway, root.path());
        let server = HttpServer::new(router);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        Self { addr, root }
    }

    fn write_script(&self, name: &str, content: &str) {
        fs::write(self.root.path().join(name), content).unwrap();
    }

    /// Pins a script's mtime so cache invalidation is deterministic.
    fn set_mtime(&self, name: &str, secs_from_epoch: u64) {
        let file = fs::File::options()
            .write(true)
            .open(self.root.path().join(name))
            .unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs_from_epoch))
            .unwrap();
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

#[tokio::test]
async fn test_script_output_becomes_response_body() {
    let gw = TestGateway::start().await;
    gw.write_script("hello.rhai", r#"print("hello over http");"#);

    let res = reqwest::get(gw.url("/hello.rhai")).await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "hello over http");
}

#[tokio::test]
async fn test_base_env_reachable_from_script() {
    let gw = TestGateway::start().await;
    gw.write_script("name.rhai", "print(SERVER_NAME);");

    let res = reqwest::get(gw.url("/name.rhai")).await.unwrap();
    assert_eq!(res.text().await.unwrap(), "magnet-test");
}

#[tokio::test]
async fn test_missing_script_is_404() {
    let gw = TestGateway::start().await;

    let res = reqwest::get(gw.url("/nope.rhai")).await.unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_compile_failure_is_500_without_diagnostic() {
    let gw = TestGateway::start().await;
    gw.write_script("broken.rhai", "let = ;");

    let res = reqwest::get(gw.url("/broken.rhai")).await.unwrap();
    assert_eq!(res.status(), 500);
    let body = res.text().await.unwrap();
    assert!(!body.contains("let = ;"), "diagnostic leaked to client");
}

#[tokio::test]
async fn test_runtime_fault_is_500() {
    let gw = TestGateway::start().await;
    gw.write_script("fault.rhai", r#"throw "kaput";"#);

    let res = reqwest::get(gw.url("/fault.rhai")).await.unwrap();
    assert_eq!(res.status(), 500);
}

#[tokio::test]
async fn test_cache_reuse_and_invalidation_over_http() {
    let gw = TestGateway::start().await;
    gw.write_script("page.rhai", r#"print("v1");"#);
    gw.set_mtime("page.rhai", 1_000_000);

    for _ in 0..2 {
        let res = reqwest::get(gw.url("/page.rhai")).await.unwrap();
        assert_eq!(res.text().await.unwrap(), "v1");
    }

    // Edit the script; the next request must serve the new version.
    gw.write_script("page.rhai", r#"print("v2");"#);
    gw.set_mtime("page.rhai", 1_000_001);

    let res = reqwest::get(gw.url("/page.rhai")).await.unwrap();
    assert_eq!(res.text().await.unwrap(), "v2");

    let metrics: serde_json::Value = reqwest::get(gw.url("/_metrics"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(metrics["cache_misses"], 1);
    assert_eq!(metrics["cache_hits"], 1);
    assert_eq!(metrics["recompiles"], 1);
}

#[tokio::test]
async fn test_failing_request_does_not_poison_the_gateway() {
    let gw = TestGateway::start().await;
    gw.write_script("good.rhai", r#"print("ok");"#);
    gw.write_script("fault.rhai", r#"throw "kaput";"#);

    for _ in 0..3 {
        let res = reqwest::get(gw.url("/fault.rhai")).await.unwrap();
        assert_eq!(res.status(), 500);

        let res = reqwest::get(gw.url("/good.rhai")).await.unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.text().await.unwrap(), "ok");
    }
}

#[tokio::test]
async fn test_info_endpoint() {
    let gw = TestGateway::start().await;

    let info: serde_json::Value = reqwest::get(gw.url("/_info"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["server_type"], "gateway");
    assert!(info["uptime_ms"].is_number());
    assert!(info["version"].is_string());
}

#[tokio::test]
async fn test_concurrent_requests_get_their_own_output() {
    let gw = TestGateway::start().await;
    for i in 0..4 {
        gw.write_script(
            &format!("s{}.rhai", i),
            &format!(r#"for n in 0..50 {{ print("{}"); }}"#, i),
        );
    }

    let mut tasks = Vec::new();
    for i in 0..4 {
        let url = gw.url(&format!("/s{}.rhai", i));
        tasks.push(tokio::spawn(async move {
            let body = reqwest::get(url).await.unwrap().text().await.unwrap();
            (i, body)
        }));
    }

    for task in tasks {
        let (i, body) = task.await.unwrap();
        assert_eq!(body, i.to_string().repeat(50));
    }
}
