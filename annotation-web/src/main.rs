//! Servidor web Axum com WebSocket para converter marcações e avaliar anotações NER

use std::net::SocketAddr;
use std::sync::Arc;

use annotation_core::{
    AnnotationSet, CodecConfig, EvaluationEvent, EvaluationMode, EvaluationPipeline,
    EvaluationRequest, EvaluationResult, MarkupCodec, Metrics, TaggingFormat,
};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Estado compartilhado da aplicação
struct AppState {
    pipeline: EvaluationPipeline,
}

impl AppState {
    fn codec(&self) -> &MarkupCodec {
        &self.pipeline.codec
    }
}

#[derive(Deserialize)]
struct DecodeRequest {
    markup: String,
    format: TaggingFormat,
}

#[derive(Deserialize)]
struct EncodeRequest {
    text: String,
    annotations: AnnotationSet,
    format: TaggingFormat,
}

#[derive(Serialize)]
struct EncodeResponse {
    markup: String,
}

#[derive(Deserialize)]
struct ConvertRequest {
    markup: String,
    from: TaggingFormat,
    to: TaggingFormat,
}

#[derive(Serialize)]
struct ModeMetrics {
    mode: EvaluationMode,
    overall: Metrics,
    tag_averaged: Metrics,
}

#[derive(Serialize)]
struct EvaluateResponse {
    metrics: Vec<ModeMetrics>,
    result: EvaluationResult,
    summary: String,
}

impl From<EvaluationResult> for EvaluateResponse {
    fn from(result: EvaluationResult) -> Self {
        let metrics = EvaluationMode::all()
            .into_iter()
            .map(|mode| ModeMetrics {
                mode,
                overall: result.metrics(mode),
                tag_averaged: result.tag_averaged_metrics(mode),
            })
            .collect();
        Self {
            metrics,
            summary: result.to_string(),
            result,
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = codec_config_from_env();
    info!(?config, "configuração do codec");
    let state = Arc::new(AppState {
        pipeline: EvaluationPipeline::with_codec(MarkupCodec::with_config(config)),
    });

    let addr = std::env::var("ANNOTATION_WEB_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let addr: SocketAddr = addr.parse().unwrap_or_else(|_| {
        warn!(%addr, "ANNOTATION_WEB_ADDR inválido, usando {DEFAULT_ADDR}");
        SocketAddr::from(([0, 0, 0, 0], 3000))
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 Servidor de anotações iniciado em http://{addr}");
    axum::serve(listener, app(state)).await
}

/// Configuração do codec com os overrides das variáveis de ambiente.
fn codec_config_from_env() -> CodecConfig {
    let mut config = CodecConfig::default();
    if let Some(window) = env_usize("ANNOTATION_CONTEXT_WINDOW") {
        config.context_window = window;
    }
    if let Some(max) = env_usize("ANNOTATION_MAX_ENTITY_CHARS") {
        config.max_entity_chars = max;
    }
    config
}

fn env_usize(name: &str) -> Option<usize> {
    let value = std::env::var(name).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(name, %value, "valor inválido ignorado");
            None
        }
    }
}

fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/decode", post(decode_handler))
        .route("/encode", post(encode_handler))
        .route("/convert", post(convert_handler))
        .route("/evaluate", post(evaluate_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state)
}

/// Retorna a página principal HTML
async fn index_handler() -> impl IntoResponse {
    Html(include_str!("templates/index.html"))
}

fn error_response(status: StatusCode, message: impl ToString) -> Response {
    (
        status,
        Json(serde_json::json!({"error": message.to_string()})),
    )
        .into_response()
}

async fn decode_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DecodeRequest>,
) -> impl IntoResponse {
    info!(format = %req.format, chars = req.markup.len(), "decode");
    Json(state.codec().decode(&req.markup, req.format))
}

async fn encode_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EncodeRequest>,
) -> Response {
    info!(format = %req.format, annotations = req.annotations.len(), "encode");
    match state.codec().encode(&req.text, &req.annotations, req.format) {
        Ok(markup) => Json(EncodeResponse { markup }).into_response(),
        Err(err) => error_response(StatusCode::UNPROCESSABLE_ENTITY, err),
    }
}

async fn convert_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConvertRequest>,
) -> Response {
    info!(from = %req.from, to = %req.to, "convert");
    match state.codec().convert(&req.markup, req.from, req.to) {
        Ok(markup) => Json(EncodeResponse { markup }).into_response(),
        Err(err) => error_response(StatusCode::UNPROCESSABLE_ENTITY, err),
    }
}

/// Avaliação via HTTP POST (sem streaming)
async fn evaluate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EvaluationRequest>,
) -> Response {
    if req.gold_markup.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Gold standard vazio");
    }
    info!(gold_format = %req.gold_format, "evaluate");

    let worker = Arc::clone(&state);
    let outcome = tokio::task::spawn_blocking(move || worker.pipeline.evaluate(&req)).await;
    match outcome {
        Ok(Ok(result)) => Json(EvaluateResponse::from(result)).into_response(),
        Ok(Err(err)) => error_response(StatusCode::UNPROCESSABLE_ENTITY, err),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Recebe um `EvaluationRequest` em JSON, executa o pipeline e envia os eventos
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let events = match serde_json::from_str::<EvaluationRequest>(&text) {
                    Ok(request) => run_streaming(Arc::clone(&state), request).await,
                    Err(err) => vec![EvaluationEvent::Error {
                        message: format!("Requisição inválida: {err}"),
                    }],
                };

                for event in &events {
                    if let Ok(json) = serde_json::to_string(event) {
                        if socket.send(Message::Text(json)).await.is_err() {
                            return; // cliente desconectou
                        }
                    }
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}

/// Roda o pipeline (síncrono) fora do runtime e coleta os eventos emitidos.
async fn run_streaming(state: Arc<AppState>, request: EvaluationRequest) -> Vec<EvaluationEvent> {
    let (tx, rx) = std::sync::mpsc::channel::<EvaluationEvent>();
    let handle = tokio::task::spawn_blocking(move || {
        state.pipeline.evaluate_streaming(&request, tx);
    });

    if let Err(err) = handle.await {
        return vec![EvaluationEvent::Error {
            message: err.to_string(),
        }];
    }
    rx.try_iter().collect()
}
