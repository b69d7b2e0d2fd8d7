use crate::cli::Args;
use crate::persistence::{ Collection, Filter, PersistenceError, Record };
use crate::responder::Response as IntentResponse;
use crate::sensors::{ self, BiometricReading, WellnessAlert };
use crate::server::AppContext;
use crate::voice::{ self, VoiceMatch };

use std::collections::HashMap;
use std::error::Error;
use std::net::SocketAddr;
use axum::{
    routing::{ get, post },
    Json,
    Router,
    extract::{ Path, Query, State },
    response::{ IntoResponse, Response },
    http::StatusCode,
};
use serde::{ Deserialize, Serialize };
use serde_json::{ json, Value };
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, error };

#[derive(Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct VoiceRequest {
    pub transcript: String,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
struct ReloadResponse {
    success: bool,
    message: String,
    rules: usize,
}

#[derive(Serialize)]
struct AlertView {
    kind: WellnessAlert,
    advice: &'static str,
}

#[derive(Serialize)]
struct BiometricsView {
    reading: BiometricReading,
    alerts: Vec<AlertView>,
}

#[derive(Serialize)]
struct VoiceView {
    recognized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched: Option<VoiceMatch>,
}

/// Persistence failures rendered as `{ "error": message }`.
pub struct ApiError(PersistenceError);

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PersistenceError::NotFound { .. } | PersistenceError::UnknownCollection(_) =>
                StatusCode::NOT_FOUND,
            PersistenceError::InvalidRecord(_) => StatusCode::BAD_REQUEST,
            PersistenceError::Backend(msg) => {
                error!("Record storage failure: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn router(context: AppContext) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/classify", post(classify_handler))
        .route("/api/conversations/{id}", get(conversation_handler))
        .route("/api/conversations/{id}/messages", post(message_handler))
        .route("/api/reload-rules", get(reload_rules_handler))
        .route("/api/voice", post(voice_handler))
        .route("/api/biometrics", get(biometrics_handler))
        .route("/api/records/{collection}", post(create_record_handler).get(list_records_handler))
        .route(
            "/api/records/{collection}/{id}",
            get(get_record_handler).patch(update_record_handler).delete(delete_record_handler)
        )
        .layer(cors)
        .with_state(context)
}

pub async fn start_http_server(
    http_port: u16,
    context: AppContext,
    args: Args
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = format!("0.0.0.0:{}", http_port).parse::<SocketAddr>()?;
    info!("Starting HTTP API server on: http://{}", addr);

    let app = router(context);

    if let (true, Some(cert_path), Some(key_path)) = (
        args.tls_enabled(),
        &args.tls_cert_path,
        &args.tls_key_path,
    ) {
        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        tokio::spawn(async move {
            let result = axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await;

            if let Err(e) = result {
                error!("HTTPS server error: {}", e);
            }
        });

        info!("HTTPS server started with TLS enabled");
    } else {
        tokio::spawn(async move {
            match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => {
                    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                        error!("HTTP server error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                }
            }
        });

        info!("HTTP server started");
    }

    Ok(())
}

async fn health_handler(State(context): State<AppContext>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "rules": context.assistant.rule_count().await }))
}

async fn classify_handler(
    State(context): State<AppContext>,
    Json(req): Json<TextRequest>
) -> Json<IntentResponse> {
    Json(context.assistant.classify(&req.text).await)
}

async fn conversation_handler(
    State(context): State<AppContext>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>
) -> Response {
    let limit = query.limit.unwrap_or(context.history_default_limit);
    match context.assistant.history(&id, limit).await {
        Ok(conversation) => Json(conversation).into_response(),
        Err(e) => {
            error!("History read failed for {}: {}", id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

async fn message_handler(
    State(context): State<AppContext>,
    Path(id): Path<String>,
    Json(req): Json<TextRequest>
) -> Response {
    match context.assistant.reply(&id, &req.text).await {
        Ok(reply) =>
            Json(json!({ "message": reply.message, "intent": reply.intent })).into_response(),
        Err(e) => {
            error!("Reply failed for {}: {}", id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

async fn reload_rules_handler(State(context): State<AppContext>) -> impl IntoResponse {
    let result = context.assistant.reload_rules_if_changed().await;
    let rules = context.assistant.rule_count().await;
    let (code, success, message) = match result {
        Ok(true) => (StatusCode::OK, true, "Rules reloaded".to_string()),
        Ok(false) => (StatusCode::OK, true, "Rules unchanged".to_string()),
        Err(e) => (StatusCode::BAD_REQUEST, false, format!("Rule reload error: {}", e)),
    };
    (code, Json(ReloadResponse { success, message, rules }))
}

async fn voice_handler(Json(req): Json<VoiceRequest>) -> impl IntoResponse {
    let matched = voice::match_command(&req.transcript);
    Json(VoiceView {
        recognized: matched.is_some(),
        matched,
    })
}

async fn biometrics_handler(State(context): State<AppContext>) -> impl IntoResponse {
    let reading = *context.biometrics.borrow();
    let alerts = sensors
        ::assess(&reading)
        .into_iter()
        .map(|kind| AlertView { kind, advice: kind.advice() })
        .collect();
    Json(BiometricsView { reading, alerts })
}

fn parse_filter(params: HashMap<String, String>) -> Filter {
    let mut pairs: Vec<_> = params.into_iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .fold(Filter::new(), |filter, (field, raw)| {
            // `?floor=3` should match the number 3, `?status=pending` the string.
            let value = serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
            filter.eq(&field, value)
        })
}

async fn create_record_handler(
    State(context): State<AppContext>,
    Path(collection): Path<String>,
    Json(data): Json<Value>
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let collection: Collection = collection.parse()?;
    let record = context.records.create(collection, data).await?;
    info!("Created {} record {}", collection, record.id);
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_records_handler(
    State(context): State<AppContext>,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>
) -> Result<Json<Vec<Record>>, ApiError> {
    let collection: Collection = collection.parse()?;
    let records = context.records.read(collection, &parse_filter(params)).await?;
    Ok(Json(records))
}

async fn get_record_handler(
    State(context): State<AppContext>,
    Path((collection, id)): Path<(String, String)>
) -> Result<Json<Record>, ApiError> {
    let collection: Collection = collection.parse()?;
    Ok(Json(context.records.get(collection, &id).await?))
}

async fn update_record_handler(
    State(context): State<AppContext>,
    Path((collection, id)): Path<(String, String)>,
    Json(patch): Json<Value>
) -> Result<Json<Record>, ApiError> {
    let collection: Collection = collection.parse()?;
    Ok(Json(context.records.update(collection, &id, patch).await?))
}

async fn delete_record_handler(
    State(context): State<AppContext>,
    Path((collection, id)): Path<(String, String)>
) -> Result<StatusCode, ApiError> {
    let collection: Collection = collection.parse()?;
    context.records.delete(collection, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_values_are_json_when_possible() {
        let params = HashMap::from([
            ("floor".to_string(), "3".to_string()),
            ("status".to_string(), "pending".to_string()),
        ]);
        let filter = parse_filter(params);
        assert_eq!(filter.0, vec![
            ("floor".to_string(), json!(3)),
            ("status".to_string(), json!("pending"))
        ]);
    }
}
