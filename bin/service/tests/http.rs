use std::sync::Arc;
use std::time::Duration;

use ntex::http::StatusCode;
use ntex::web::{self, test};

use topology_graph::TopologyGraph;
use topology_optimizer::SingleTrackOptimizerKind;
use topology_service::{routes, state::ServiceState};

fn triangle_graph() -> TopologyGraph {
    let mut graph = TopologyGraph::new();
    graph.add_node("A", (0.0, 0.0));
    graph.add_node("B", (1.0, 1.0));
    graph.add_node("C", (2.0, 2.0));
    graph.add_edge("A", "B", 10.0, 10.0).unwrap();
    graph.add_edge("A", "C", 10.0, 10.0).unwrap();
    graph.add_edge("B", "C", 1.0, 1.0).unwrap();
    graph
}

fn test_state() -> Arc<ServiceState> {
    Arc::new(ServiceState::new(
        triangle_graph(),
        SingleTrackOptimizerKind::IntegerLinearProgramming,
        Duration::from_secs(5),
    ))
}

#[ntex::test]
async fn network_dump_lists_nodes_and_edges() {
    let state = test_state();
    let app = test::init_service(web::App::new().state(state).configure(routes::configure)).await;

    let req = test::TestRequest::get().uri("/network").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(body["edges"].as_array().unwrap().len(), 3);
}

#[ntex::test]
async fn create_then_fetch_track_round_trips() {
    let state = test_state();
    let app = test::init_service(web::App::new().state(state).configure(routes::configure)).await;

    let req = test::TestRequest::post()
        .uri("/tracks/ns1")
        .set_json(&serde_json::json!({ "publisher": "A", "delay_budget": 20.0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get().uri("/tracks/ns1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["publisher"], "A");
    assert_eq!(body["delay_budget"], 20.0);
}

#[ntex::test]
async fn get_track_is_404_when_missing() {
    let state = test_state();
    let app = test::init_service(web::App::new().state(state).configure(routes::configure)).await;

    let req = test::TestRequest::get().uri("/tracks/missing").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[ntex::test]
async fn subscribe_then_resubscribe_is_idempotent_with_304() {
    let state = test_state();
    let app = test::init_service(web::App::new().state(state).configure(routes::configure)).await;

    let create = test::TestRequest::post()
        .uri("/tracks/ns1")
        .set_json(&serde_json::json!({ "publisher": "A", "delay_budget": 20.0 }))
        .to_request();
    test::call_service(&app, create).await;

    let subscribe = test::TestRequest::post()
        .uri("/tracks/ns1/subscription/B")
        .to_request();
    let resp = test::call_service(&app, subscribe).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["next_hop"], "A");

    let resubscribe = test::TestRequest::post()
        .uri("/tracks/ns1/subscription/B")
        .to_request();
    let resp = test::call_service(&app, resubscribe).await;
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["next_hop"], "A");
}

#[ntex::test]
async fn subscribe_rejects_publisher_as_subscriber() {
    let state = test_state();
    let app = test::init_service(web::App::new().state(state).configure(routes::configure)).await;

    let create = test::TestRequest::post()
        .uri("/tracks/ns1")
        .set_json(&serde_json::json!({ "publisher": "A", "delay_budget": 20.0 }))
        .to_request();
    test::call_service(&app, create).await;

    let subscribe = test::TestRequest::post()
        .uri("/tracks/ns1/subscription/A")
        .to_request();
    let resp = test::call_service(&app, subscribe).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[ntex::test]
async fn subscribe_with_infeasible_budget_is_406() {
    let state = test_state();
    let app = test::init_service(web::App::new().state(state).configure(routes::configure)).await;

    let create = test::TestRequest::post()
        .uri("/tracks/ns1")
        .set_json(&serde_json::json!({ "publisher": "A", "delay_budget": 0.0 }))
        .to_request();
    test::call_service(&app, create).await;

    let subscribe = test::TestRequest::post()
        .uri("/tracks/ns1/subscription/B")
        .to_request();
    let resp = test::call_service(&app, subscribe).await;
    assert_eq!(resp.status(), StatusCode::NOT_ACCEPTABLE);
}

#[ntex::test]
async fn unsubscribe_removes_subscriber_and_invalidates_cache() {
    let state = test_state();
    let app = test::init_service(web::App::new().state(state).configure(routes::configure)).await;

    let create = test::TestRequest::post()
        .uri("/tracks/ns1")
        .set_json(&serde_json::json!({ "publisher": "A", "delay_budget": 20.0 }))
        .to_request();
    test::call_service(&app, create).await;

    let subscribe = test::TestRequest::post()
        .uri("/tracks/ns1/subscription/B")
        .to_request();
    test::call_service(&app, subscribe).await;

    let unsubscribe = test::TestRequest::delete()
        .uri("/tracks/ns1/subscription/B")
        .to_request();
    let resp = test::call_service(&app, unsubscribe).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let topology = test::TestRequest::get().uri("/tracks/ns1/topology").to_request();
    let resp = test::call_service(&app, topology).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[ntex::test]
async fn unsubscribe_missing_subscriber_is_404() {
    let state = test_state();
    let app = test::init_service(web::App::new().state(state).configure(routes::configure)).await;

    let create = test::TestRequest::post()
        .uri("/tracks/ns1")
        .set_json(&serde_json::json!({ "publisher": "A", "delay_budget": 20.0 }))
        .to_request();
    test::call_service(&app, create).await;

    let unsubscribe = test::TestRequest::delete()
        .uri("/tracks/ns1/subscription/B")
        .to_request();
    let resp = test::call_service(&app, unsubscribe).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[ntex::test]
async fn reduce_network_still_finds_direct_link() {
    let state = test_state();
    let app = test::init_service(web::App::new().state(state).configure(routes::configure)).await;

    let create = test::TestRequest::post()
        .uri("/tracks/ns1")
        .set_json(&serde_json::json!({ "publisher": "A", "delay_budget": 20.0 }))
        .to_request();
    test::call_service(&app, create).await;

    let subscribe = test::TestRequest::post()
        .uri("/tracks/ns1/subscription/B?reduce_network=true&optimizer_type=direct_link_tree")
        .to_request();
    let resp = test::call_service(&app, subscribe).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["next_hop"], "A");
}

#[ntex::test]
async fn topology_json_shape_matches_the_documented_contract() {
    let state = test_state();
    let app = test::init_service(web::App::new().state(state).configure(routes::configure)).await;

    let create = test::TestRequest::post()
        .uri("/tracks/ns1")
        .set_json(&serde_json::json!({ "publisher": "A", "delay_budget": 20.0 }))
        .to_request();
    test::call_service(&app, create).await;

    let subscribe = test::TestRequest::post()
        .uri("/tracks/ns1/subscription/B?optimizer_type=direct_link_tree")
        .to_request();
    test::call_service(&app, subscribe).await;

    let topology = test::TestRequest::get().uri("/tracks/ns1/topology").to_request();
    let resp = test::call_service(&app, topology).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    insta::assert_snapshot!(
        serde_json::to_string(&body).unwrap(),
        @r#"{"cost":10.0,"max_delay":10.0,"used_links":[["A","B"]]}"#
    );
}

#[ntex::test]
async fn health_and_readiness_are_ok() {
    let state = test_state();
    let app = test::init_service(web::App::new().state(state).configure(routes::configure)).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/readiness").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
