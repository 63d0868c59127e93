use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ntex::time::sleep;
use ntex::util::{select, Either};
use ntex::web::{
    self,
    types::{Query, State},
    HttpResponse,
};
use serde::{Deserialize, Serialize};

use topology_optimizer::SingleTrackOptimizerKind;

use crate::error::{InfeasibleReason, ServiceError};
use crate::state::ServiceState;

#[derive(Serialize)]
struct NetworkDto {
    nodes: Vec<NodeDto>,
    edges: Vec<EdgeDto>,
}

#[derive(Serialize)]
struct NodeDto {
    name: String,
    attributes: NodeAttributesDto,
}

#[derive(Serialize)]
struct NodeAttributesDto {
    location: (f64, f64),
}

#[derive(Serialize)]
struct EdgeDto {
    src: String,
    dst: String,
    attributes: EdgeAttributesDto,
}

#[derive(Serialize)]
struct EdgeAttributesDto {
    latency: f64,
    cost: f64,
}

async fn get_network(state: State<Arc<ServiceState>>) -> HttpResponse {
    let graph = state.graph();
    let nodes = graph
        .nodes()
        .map(|node| NodeDto {
            name: node.id.clone(),
            attributes: NodeAttributesDto { location: node.location },
        })
        .collect();
    let edges = graph
        .edges()
        .map(|(src, dst, edge)| EdgeDto {
            src: src.to_string(),
            dst: dst.to_string(),
            attributes: EdgeAttributesDto { latency: edge.latency, cost: edge.cost },
        })
        .collect();
    HttpResponse::Ok().json(&NetworkDto { nodes, edges })
}

#[derive(Serialize)]
struct TrackListItemDto {
    publisher: String,
    delay_budget: f64,
}

async fn list_tracks(state: State<Arc<ServiceState>>) -> HttpResponse {
    let items: Vec<TrackListItemDto> = state
        .namespaces()
        .into_iter()
        .map(|(_, view)| TrackListItemDto {
            publisher: view.publisher,
            delay_budget: view.delay_budget,
        })
        .collect();
    HttpResponse::Ok().json(&items)
}

#[derive(Deserialize)]
struct CreateTrackBody {
    publisher: String,
    delay_budget: f64,
}

#[derive(Serialize)]
struct TrackDto {
    publisher: String,
    delay_budget: f64,
}

async fn create_track(
    path: web::types::Path<String>,
    body: web::types::Json<CreateTrackBody>,
    state: State<Arc<ServiceState>>,
) -> Result<HttpResponse, ServiceError> {
    let namespace = path.into_inner();
    state.create_track(&namespace, &body.publisher, body.delay_budget)?;
    Ok(HttpResponse::Created().json(&TrackDto {
        publisher: body.publisher.clone(),
        delay_budget: body.delay_budget,
    }))
}

async fn get_track(
    path: web::types::Path<String>,
    state: State<Arc<ServiceState>>,
) -> Result<HttpResponse, ServiceError> {
    let view = state.get_track(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(&TrackDto {
        publisher: view.publisher,
        delay_budget: view.delay_budget,
    }))
}

#[derive(Serialize)]
struct TopologyDto {
    cost: f64,
    max_delay: f64,
    used_links: Vec<(String, String)>,
}

async fn get_topology(
    path: web::types::Path<String>,
    state: State<Arc<ServiceState>>,
) -> Result<HttpResponse, ServiceError> {
    let solution = state.get_topology(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(&TopologyDto {
        cost: solution.cost,
        max_delay: solution.max_delay,
        used_links: solution.used_links,
    }))
}

#[derive(Deserialize)]
struct SubscribeQuery {
    optimizer_type: Option<String>,
    reduce_network: Option<bool>,
}

#[derive(Serialize)]
struct NextHopBody {
    next_hop: String,
}

/// Races the (possibly CPU-bound, ILP-backed) solve against the same soft
/// deadline the optimizer itself honors, by selecting over a `sleep` and
/// the spawned blocking task. On an outer timeout the shared `cancelled`
/// flag is set before returning, so even a solve that is already past the
/// inner `Deadline` check and about to commit will back out instead of
/// writing to the track entry after the client has been told it timed out.
async fn subscribe(
    path: web::types::Path<(String, String)>,
    query: Query<SubscribeQuery>,
    state: State<Arc<ServiceState>>,
) -> Result<HttpResponse, ServiceError> {
    let (namespace, subscriber) = path.into_inner();
    let optimizer = match &query.optimizer_type {
        Some(raw) => raw
            .parse::<SingleTrackOptimizerKind>()
            .map_err(|_| ServiceError::BadInput(format!("unknown optimizer_type: {raw}")))?,
        None => state.default_optimizer(),
    };
    let reduce_network = query.reduce_network.unwrap_or(false);

    let deadline = state.solve_deadline();
    let state = state.get_ref().clone();
    let cancelled = Arc::new(AtomicBool::new(false));
    let solve_cancelled = cancelled.clone();
    let solve_task = tokio::task::spawn_blocking(move || {
        state.subscribe(&namespace, &subscriber, optimizer, reduce_network, &*solve_cancelled)
    });

    match select(sleep(deadline), solve_task).await {
        Either::Left(_) => {
            cancelled.store(true, Ordering::SeqCst);
            Err(ServiceError::Infeasible { reason: InfeasibleReason::Timeout })
        }
        Either::Right(joined) => {
            let next_hop = joined.expect("subscribe task panicked")?;
            Ok(HttpResponse::Ok().json(&NextHopBody { next_hop }))
        }
    }
}

async fn unsubscribe(
    path: web::types::Path<(String, String)>,
    state: State<Arc<ServiceState>>,
) -> Result<HttpResponse, ServiceError> {
    let (namespace, subscriber) = path.into_inner();
    state.unsubscribe(&namespace, &subscriber)?;
    Ok(HttpResponse::NoContent().finish())
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn readiness(state: State<Arc<ServiceState>>) -> HttpResponse {
    if state.graph().nodes().next().is_some() {
        HttpResponse::Ok().finish()
    } else {
        HttpResponse::InternalServerError().finish()
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/network", web::get().to(get_network))
        .route("/tracks", web::get().to(list_tracks))
        .route("/tracks/{namespace}", web::post().to(create_track))
        .route("/tracks/{namespace}", web::get().to(get_track))
        .route("/tracks/{namespace}/topology", web::get().to(get_topology))
        .route(
            "/tracks/{namespace}/subscription/{subscriber}",
            web::post().to(subscribe),
        )
        .route(
            "/tracks/{namespace}/subscription/{subscriber}",
            web::delete().to(unsubscribe),
        )
        .route("/health", web::get().to(health))
        .route("/readiness", web::get().to(readiness));
}
