use nuwa_common_config::ApiConfig;
use nuwa_common_core::WishStatus;
use nuwa_common_http::endpoints::paths;
use nuwa_common_http::{
    AgentsApi, ApiClient, BuildAgent, ListQuery, ModulesApi, SignatureLog, SignaturesApi, SubmitModule, SubmitWish,
    SynthesizeTask, TasksApi, WishesApi,
};
use nuwa_test_utils::fixtures::{ok_envelope, page_envelope, wish};
use nuwa_test_utils::{responses, TestHttpServer};
use pretty_assertions::assert_eq;
use serde_json::json;

fn client(server: &TestHttpServer) -> ApiClient {
    ApiClient::new(ApiConfig {
        base_url: server.url(),
        retry_base_delay_ms: 10,
        retry_max_delay_ms: 50,
        enable_mock: false,
        ..ApiConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_list_wishes_sends_pagination() {
    let server = TestHttpServer::start().await;
    server
        .get_json_with_query(paths::LIST_WISHES, ("page", "2"), &page_envelope(vec![wish(5, "愿望", "描述")], 2, 10))
        .await;

    let response = WishesApi::new(client(&server))
        .list_wishes(&ListQuery::new().page(2))
        .await
        .unwrap();

    assert_eq!(response.data.page, 2);
    assert_eq!(response.data.items[0].id, 5);
    assert_eq!(response.data.items[0].status(), Some(WishStatus::Pending));

    let requests = server.received_requests().await;
    assert_eq!(requests[0].url.query(), Some("page=2&size=10"));
}

#[tokio::test]
async fn test_list_filters_reach_backend() {
    let server = TestHttpServer::start().await;
    server
        .get_json_with_query(paths::LIST_MODULES, ("task_id", "3"), &page_envelope(vec![], 1, 10))
        .await;
    server
        .get_json_with_query(paths::LIST_SIGNATURES, ("agent_id", "8"), &page_envelope(vec![], 1, 10))
        .await;

    let client = client(&server);
    let modules = ModulesApi::new(client.clone())
        .list_modules(&ListQuery::new().task_id(3))
        .await
        .unwrap();
    let signatures = SignaturesApi::new(client)
        .list_signatures(&ListQuery::new().agent_id(8))
        .await
        .unwrap();

    assert!(modules.data.is_empty());
    assert!(signatures.data.is_empty());
}

#[tokio::test]
async fn test_list_is_retried() {
    let server = TestHttpServer::start().await;
    server
        .sequence(
            paths::LIST_AGENTS,
            vec![
                responses::server_error(),
                responses::ok_json(&page_envelope(vec![json!({"id": 1, "status": "active"})], 1, 10)),
            ],
        )
        .await;

    let response = AgentsApi::new(client(&server))
        .list_agents(&ListQuery::new())
        .await
        .unwrap();
    assert_eq!(response.data.items.len(), 1);
    server.verify_received(paths::LIST_AGENTS, 2).await;
}

#[tokio::test]
async fn test_submit_wish_posts_body_once() {
    let server = TestHttpServer::start().await;
    server
        .post_json_matching(
            paths::SUBMIT_WISH,
            json!({"content": "一个会泡茶的助手", "user_id": "u1"}),
            responses::ok_json(&ok_envelope(json!({"id": 42, "content": "一个会泡茶的助手", "status": "pending"}))),
        )
        .await;
    let api = WishesApi::new(client(&server));
    let body = SubmitWish {
        content: "一个会泡茶的助手".to_string(),
        user_id: "u1".to_string(),
    };

    let first = api.submit_wish(&body).await.unwrap();
    api.submit_wish(&body).await.unwrap();

    assert_eq!(first.data.id, 42);
    assert_eq!(first.data.content.as_deref(), Some("一个会泡茶的助手"));
    server.verify_received(paths::SUBMIT_WISH, 2).await;
}

#[tokio::test]
async fn test_submit_is_not_retried() {
    let server = TestHttpServer::start().await;
    server.error(paths::SYNTHESIZE_TASK, 500, "boom").await;

    let err = TasksApi::new(client(&server))
        .synthesize_task(&SynthesizeTask { wish_id: 1 })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    server.verify_received(paths::SYNTHESIZE_TASK, 1).await;
}

#[tokio::test]
async fn test_write_bodies() {
    let server = TestHttpServer::start().await;
    server
        .post_json(paths::SUBMIT_MODULE, &ok_envelope(json!({"id": 1, "task_id": 2})))
        .await;
    server
        .post_json(paths::BUILD_AGENT, &ok_envelope(json!({"id": 3, "task_id": 2})))
        .await;
    server
        .post_json(
            paths::SIGNATURE_LOG,
            &ok_envelope(json!({"id": 4, "agent_id": 3, "user_id": "u1", "contribution": "code"})),
        )
        .await;
    let client = client(&server);

    ModulesApi::new(client.clone())
        .submit_module(&SubmitModule {
            task_id: 2,
            name: "parser".to_string(),
            content: "fn main() {}".to_string(),
            user_id: "u1".to_string(),
        })
        .await
        .unwrap();
    let agent = AgentsApi::new(client.clone())
        .build_agent(&BuildAgent {
            task_id: 2,
            modules: vec![1],
        })
        .await
        .unwrap();
    let signature = SignaturesApi::new(client)
        .signature_log(&SignatureLog {
            agent_id: 3,
            user_id: "u1".to_string(),
            contribution: "code".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(agent.data.task_id, Some(2));
    assert_eq!(signature.data.contribution, "code");
    assert_eq!(
        server.received_json(paths::BUILD_AGENT).await,
        vec![json!({"task_id": 2, "modules": [1]})]
    );
    assert_eq!(
        server.received_json(paths::SUBMIT_MODULE).await[0]["name"],
        "parser"
    );
}
