use std::net::SocketAddr;

use axum::extract::State;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::context::RpcApiContext;
use crate::router::map_http_requests;
use crate::rpc_types::{
    RpcErr, RpcErrorMetadata, RpcErrorResponse, RpcRequest, RpcRequestId, RpcSuccessResponse,
};

#[derive(Deserialize)]
#[serde(untagged)]
pub enum RpcRequestWrapper {
    Single(RpcRequest),
    Multiple(Vec<RpcRequest>),
}

/// Starts the JSON-RPC HTTP server and blocks until ctrl-c.
pub async fn start_api(http_addr: SocketAddr, context: RpcApiContext) -> Result<(), std::io::Error> {
    // All request headers, methods and origins allowed.
    let cors = CorsLayer::permissive();

    let http_router = Router::new()
        .route("/", axum::routing::post(handle_http_request))
        .layer(cors)
        .with_state(context);
    let http_listener = TcpListener::bind(http_addr).await?;

    info!("Starting HTTP server at {http_addr}");
    axum::serve(http_listener, http_router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn handle_http_request(
    State(context): State<RpcApiContext>,
    body: String,
) -> Json<Value> {
    let res = match serde_json::from_str::<RpcRequestWrapper>(&body) {
        Ok(RpcRequestWrapper::Single(request)) => {
            let res = map_http_requests(&request, context).await;
            rpc_response(request.id, res)
        }
        Ok(RpcRequestWrapper::Multiple(requests)) => {
            let mut responses = Vec::new();
            for request in requests {
                let res = map_http_requests(&request, context.clone()).await;
                responses.push(rpc_response(request.id, res));
            }
            serde_json::to_value(responses).unwrap_or(Value::Null)
        }
        Err(err) => rpc_response(
            RpcRequestId::Number(0),
            Err::<Value, _>(RpcErr::ParseError(err.to_string())),
        ),
    };
    Json(res)
}

/// Wraps a handler outcome into the JSON-RPC 2.0 response envelope.
pub fn rpc_response<E>(id: RpcRequestId, res: Result<Value, E>) -> Value
where
    E: Into<RpcErrorMetadata>,
{
    let response = match res {
        Ok(result) => serde_json::to_value(RpcSuccessResponse {
            id,
            jsonrpc: "2.0".to_string(),
            result,
        }),
        Err(error) => serde_json::to_value(RpcErrorResponse {
            id,
            jsonrpc: "2.0".to_string(),
            error: error.into(),
        }),
    };
    response.unwrap_or(Value::Null)
}
