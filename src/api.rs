use crate::error::{Error, RenderError};
use crate::registry::{Registry, Snapshot};
use crate::render::{self, TargetParams};
use crate::schema::Kind;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct RegistryStatus {
    pub message: String,
    pub version: &'static str,
    pub metrics_count: usize,
    pub dimensions_count: usize,
    pub loaded_at: DateTime<Utc>,
}

impl RegistryStatus {
    fn of(snapshot: &Snapshot, message: &str) -> Self {
        Self {
            message: message.to_string(),
            version: env!("CARGO_PKG_VERSION"),
            metrics_count: snapshot.len(Kind::Metric),
            dimensions_count: snapshot.len(Kind::Dimension),
            loaded_at: snapshot.loaded_at(),
        }
    }
}

fn error_response(err: &Error) -> Response {
    let status = match err {
        Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::NotFound(_) | Error::Render(RenderError::UnknownTarget(_)) => StatusCode::NOT_FOUND,
        Error::Render(_) => StatusCode::BAD_REQUEST,
    };
    (status, err.to_string()).into_response()
}

async fn root_handler(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    let snapshot = registry.snapshot();
    (StatusCode::OK, Json(RegistryStatus::of(&snapshot, "Semantic definition registry"))).into_response()
}

fn list_names(registry: &Registry, kind: Kind) -> Response {
    let snapshot = registry.snapshot();
    let names: Vec<&str> = snapshot.list_names(kind);
    (StatusCode::OK, Json(names)).into_response()
}

async fn list_metrics_handler(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    list_names(&registry, Kind::Metric)
}

async fn list_dimensions_handler(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    list_names(&registry, Kind::Dimension)
}

fn get_record(registry: &Registry, kind: Kind, name: &str) -> Response {
    let snapshot = registry.snapshot();
    match snapshot.get(kind, name) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response(&Error::from(e)),
    }
}

async fn get_metric_handler(Path(name): Path<String>, State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    get_record(&registry, Kind::Metric, &name)
}

async fn get_dimension_handler(Path(name): Path<String>, State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    get_record(&registry, Kind::Dimension, &name)
}

async fn targets_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(render::targets())).into_response()
}

async fn render_handler(
    Path((target, kind, name)): Path<(String, String, String)>,
    Query(params): Query<TargetParams>,
    State(registry): State<Arc<Registry>>,
) -> impl IntoResponse {
    let kind: Kind = match kind.parse() {
        Ok(kind) => kind,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("{e}")).into_response(),
    };

    let snapshot = registry.snapshot();
    match render::render(&snapshot, &target, kind, &name, &params) {
        Ok(artifact) => (StatusCode::OK, [(header::CONTENT_TYPE, artifact.media_type)], artifact.body).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn reload_handler(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    let result = {
        let registry = Arc::clone(&registry);
        tokio::task::spawn_blocking(move || registry.reload()).await
    };

    match result {
        Ok(Ok(snapshot)) => (StatusCode::OK, Json(RegistryStatus::of(&snapshot, "Semantics reloaded"))).into_response(),
        Ok(Err(e)) => error_response(&Error::from(e)),
        Err(e) => {
            warn!("reload task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "reload failed".to_string()).into_response()
        }
    }
}

pub fn create_router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(list_metrics_handler))
        .route("/dimensions", get(list_dimensions_handler))
        .route("/metric/{name}", get(get_metric_handler))
        .route("/dimension/{name}", get(get_dimension_handler))
        .route("/targets", get(targets_handler))
        .route("/render/{target}/{kind}/{name}", get(render_handler))
        .route("/reload", get(reload_handler).post(reload_handler))
        .with_state(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::fs;
    use std::path::Path as FsPath;

    fn write(root: &FsPath, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn registry(root: &FsPath) -> Arc<Registry> {
        write(
            root,
            "metrics/active_users.toml",
            "name = \"active_users\"\nexpression = \"COUNT(DISTINCT user_id)\"\nfilters = [\"status = 'active'\"]\n",
        );
        write(
            root,
            "dimensions/customer_region.toml",
            "name = \"customer_region\"\nexpression = \"region\"\nhierarchy = [\"country\", \"state\", \"city\"]\n",
        );
        Arc::new(Registry::open(vec![root.to_path_buf()]).unwrap())
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn lists_and_gets() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());

        let response = list_metrics_handler(State(Arc::clone(&registry))).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "[\"active_users\"]");

        let response = get_dimension_handler(Path("customer_region".to_string()), State(Arc::clone(&registry)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["hierarchy"], serde_json::json!(["country", "state", "city"]));

        let response = get_metric_handler(Path("missing".to_string()), State(registry)).await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn renders_sql() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());

        let response = render_handler(
            Path(("sql".to_string(), "metric".to_string(), "active_users".to_string())),
            Query(TargetParams::new().with("table", "users")),
            State(Arc::clone(&registry)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            "SELECT COUNT(DISTINCT user_id) AS active_users FROM users WHERE status = 'active';"
        );

        let response = render_handler(
            Path(("sql".to_string(), "metric".to_string(), "active_users".to_string())),
            Query(TargetParams::new()),
            State(Arc::clone(&registry)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = render_handler(
            Path(("pdf".to_string(), "metric".to_string(), "active_users".to_string())),
            Query(TargetParams::new()),
            State(registry),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn failed_reload_keeps_old_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        write(dir.path(), "metrics/broken.toml", "name = \"broken\"\nexpression = \"  \"\n");

        let response = reload_handler(State(Arc::clone(&registry))).await.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("expression"));

        assert_eq!(registry.snapshot().list_names(Kind::Metric), vec!["active_users"]);
    }
}
