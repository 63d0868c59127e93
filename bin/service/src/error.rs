use ntex::http::StatusCode;
use ntex::web::{self, HttpRequest};
use serde::Serialize;

use topology_graph::GraphError;
use topology_optimizer::TrackError;

/// The service-wide error taxonomy, mapped directly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("already subscribed")]
    AlreadyExists { next_hop: String },
    #[error("infeasible: {reason}")]
    Infeasible { reason: InfeasibleReason },
    #[error("solution has no next hop for this subscriber")]
    NoNextHop,
    #[error("bad input: {0}")]
    BadInput(String),
}

#[derive(Debug, Clone, Copy)]
pub enum InfeasibleReason {
    Optimizer,
    Timeout,
}

impl std::fmt::Display for InfeasibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimizer => write!(f, "optimizer"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

impl From<GraphError> for ServiceError {
    fn from(error: GraphError) -> Self {
        match error {
            GraphError::UnknownNode(id) => ServiceError::BadInput(format!("unknown node: {id}")),
        }
    }
}

impl From<TrackError> for ServiceError {
    fn from(error: TrackError) -> Self {
        match error {
            TrackError::NegativeBudget => ServiceError::BadInput(error.to_string()),
            TrackError::PublisherCannotSubscribe => ServiceError::BadInput(error.to_string()),
            TrackError::NotSubscribed(_) => ServiceError::NotFound("subscriber"),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    detail: String,
}

#[derive(Serialize)]
struct AlreadyExistsBody<'a> {
    next_hop: &'a str,
}

impl web::error::WebResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists { .. } => StatusCode::NOT_MODIFIED,
            Self::Infeasible { .. } => StatusCode::NOT_ACCEPTABLE,
            Self::NoNextHop => StatusCode::NOT_ACCEPTABLE,
            Self::BadInput(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self, _req: &HttpRequest) -> web::HttpResponse {
        let status = self.status_code();
        match self {
            Self::AlreadyExists { next_hop } => {
                web::HttpResponse::build(status).json(&AlreadyExistsBody { next_hop })
            }
            _ => web::HttpResponse::build(status).json(&ErrorBody {
                error: self.variant_name().to_string(),
                detail: self.to_string(),
            }),
        }
    }
}

impl ServiceError {
    fn variant_name(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists { .. } => "already_exists",
            Self::Infeasible { reason: InfeasibleReason::Timeout } => "timeout",
            Self::Infeasible { .. } => "infeasible",
            Self::NoNextHop => "no_next_hop",
            Self::BadInput(_) => "bad_input",
        }
    }
}
