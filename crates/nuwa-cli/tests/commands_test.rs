//! Commands driven end to end against a mock backend.

use clap::Parser;
use nuwa_cli::cli::Cli;
use nuwa_common_config::{ConfigLoader, LocalStore, NuwaConfig};
use nuwa_test_utils::fixtures::{error_envelope, ok_envelope, page_envelope, translation_response, wish};
use nuwa_test_utils::TestHttpServer;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

fn config_for(server: &TestHttpServer) -> NuwaConfig {
    let mut config = NuwaConfig::default();
    config.api.base_url = server.url();
    config.api.enable_mock = false;
    config.api.retry_count = 1;
    config
}

fn parse(dir: &TempDir, args: &[&str]) -> Cli {
    let project = dir.path().to_string_lossy().to_string();
    let mut argv = vec!["nuwa", "-q", "--config", project.as_str()];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn test_wishes_list_sends_paging() {
    let server = TestHttpServer::start().await;
    server
        .get_json_with_query(
            "/api/wishes/list_wishes",
            ("page", "2"),
            &page_envelope(vec![wish(11, "咖啡", "做咖啡")], 2, 10),
        )
        .await;
    let dir = tempfile::tempdir().unwrap();

    let cli = parse(&dir, &["wishes", "list", "--page", "2"]);
    cli.execute(config_for(&server)).await.unwrap();

    server.verify_received("/api/wishes/list_wishes", 1).await;
}

#[tokio::test]
async fn test_wishes_submit_posts_body() {
    let server = TestHttpServer::start().await;
    server
        .post_json("/api/wishes/submit_wish", &ok_envelope(wish(12, "翻译助手", "")))
        .await;
    let dir = tempfile::tempdir().unwrap();

    let cli = parse(
        &dir,
        &["--format", "json", "wishes", "submit", "--content", "想要一个翻译助手", "--user-id", "user_001"],
    );
    cli.execute(config_for(&server)).await.unwrap();

    assert_eq!(
        server.received_json("/api/wishes/submit_wish").await,
        vec![json!({"content": "想要一个翻译助手", "user_id": "user_001"})]
    );
}

#[tokio::test]
async fn test_blank_submission_is_rejected_locally() {
    let server = TestHttpServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let cli = parse(&dir, &["wishes", "submit", "--content", "   ", "--user-id", "user_001"]);
    let err = cli.execute(config_for(&server)).await.unwrap_err();

    assert_eq!(err.code(), 1);
    server.verify_received("/api/wishes/submit_wish", 0).await;
}

#[tokio::test]
async fn test_backend_down_without_mock_is_network_error() {
    let server = TestHttpServer::start().await;
    server.error("/api/agents/list_agents", 503, "maintenance").await;
    let dir = tempfile::tempdir().unwrap();

    let cli = parse(&dir, &["agents", "list"]);
    let err = cli.execute(config_for(&server)).await.unwrap_err();

    assert_eq!(err.code(), 4);
    assert_eq!(err.to_string(), "HTTP error! status: 503");
    assert!(err.hint().is_some());
}

#[tokio::test]
async fn test_backend_down_with_mock_shows_demo_data() {
    let server = TestHttpServer::start().await;
    server.error("/api/agents/list_agents", 503, "maintenance").await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(&server);
    config.api.enable_mock = true;

    let cli = parse(&dir, &["agents", "list"]);
    cli.execute(config).await.unwrap();
}

#[tokio::test]
async fn test_failure_envelope_is_general_error() {
    let server = TestHttpServer::start().await;
    let mut envelope = error_envelope("wish 99 not found");
    envelope["data"] = json!({});
    server.get_json("/api/tasks/list_tasks", &envelope).await;
    let dir = tempfile::tempdir().unwrap();

    let cli = parse(&dir, &["tasks", "list", "--wish-id", "99"]);
    let err = cli.execute(config_for(&server)).await.unwrap_err();

    assert_eq!(err.code(), 1);
    assert!(err.to_string().contains("wish 99 not found"));
}

#[tokio::test]
async fn test_failure_envelope_without_data_is_general_error() {
    let server = TestHttpServer::start().await;
    server
        .get_json("/api/wishes/list_wishes", &json!({"success": false, "message": "list failed", "error": "db down"}))
        .await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(&server);
    config.api.enable_mock = true;

    let cli = parse(&dir, &["wishes", "list"]);
    let err = cli.execute(config).await.unwrap_err();

    assert_eq!(err.code(), 1);
    assert!(err.to_string().contains("db down"));
}

#[tokio::test]
async fn test_translate_posts_to_translation_endpoint() {
    let server = TestHttpServer::start().await;
    server
        .post_json("/api/translation/translate", &translation_response("Hello"))
        .await;
    let dir = tempfile::tempdir().unwrap();

    let cli = parse(&dir, &["translate", "你好", "--to", "en"]);
    cli.execute(config_for(&server)).await.unwrap();

    assert_eq!(
        server.received_json("/api/translation/translate").await,
        vec![json!({"text": "你好", "target_lang": "en", "source_lang": "auto"})]
    );
}

#[tokio::test]
async fn test_invocations_are_counted() {
    let server = TestHttpServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server);

    for _ in 0..3 {
        parse(&dir, &["config", "show"]).execute(config.clone()).await.unwrap();
    }

    let store = LocalStore::open(dir.path().join(&config.storage.path));
    assert_eq!(store.page_views(), 3);
}

#[tokio::test]
async fn test_config_loaded_from_project_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = NuwaConfig::default();
    config.api.base_url = "http://nuwa.internal:8003".into();
    ConfigLoader::new(dir.path()).save(&config).unwrap();

    let cli = parse(&dir, &["health"]);
    let loaded = cli.load_config().unwrap();

    assert_eq!(loaded.api.base_url, "http://nuwa.internal:8003");
}
