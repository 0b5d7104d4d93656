use seqrex_blockchain::error::{ChainError, MempoolError};
use seqrex_storage::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ========== Error Types ==========

#[derive(Debug)]
pub enum RpcErr {
    ParseError(String),
    InvalidRequest(String),
    MethodNotFound(String),
    BadParams(String),
    MissingParam(String),
    Internal(String),
    /// Resource exhaustion and upstream failures (mempool capacity,
    /// unreachable L1).
    ServerError(String),
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RpcErrorMetadata {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub message: String,
}

impl From<RpcErr> for RpcErrorMetadata {
    fn from(value: RpcErr) -> Self {
        match value {
            RpcErr::ParseError(context) => RpcErrorMetadata {
                code: -32700,
                data: None,
                message: format!("Parse error: {context}"),
            },
            RpcErr::InvalidRequest(context) => RpcErrorMetadata {
                code: -32600,
                data: None,
                message: format!("Invalid request: {context}"),
            },
            RpcErr::MethodNotFound(method) => RpcErrorMetadata {
                code: -32601,
                data: None,
                message: format!("Method not found: {method}"),
            },
            RpcErr::BadParams(context) => RpcErrorMetadata {
                code: -32602,
                data: None,
                message: format!("Invalid params: {context}"),
            },
            RpcErr::MissingParam(name) => RpcErrorMetadata {
                code: -32602,
                data: None,
                message: format!("Expected parameter: {name} is missing"),
            },
            RpcErr::Internal(context) => RpcErrorMetadata {
                code: -32603,
                data: None,
                message: format!("Internal Error: {context}"),
            },
            RpcErr::ServerError(context) => RpcErrorMetadata {
                code: -32000,
                data: None,
                message: context,
            },
        }
    }
}

impl From<serde_json::Error> for RpcErr {
    fn from(error: serde_json::Error) -> Self {
        Self::BadParams(error.to_string())
    }
}

impl From<MempoolError> for RpcErr {
    fn from(err: MempoolError) -> Self {
        match err {
            MempoolError::Capacity => Self::ServerError("mempool is full".to_string()),
            MempoolError::StoreError(err) => Self::Internal(err.to_string()),
            MempoolError::Wal(err) => Self::Internal(err.to_string()),
            MempoolError::LockError(err) => Self::Internal(err),
            validation => Self::BadParams(validation.to_string()),
        }
    }
}

impl From<ChainError> for RpcErr {
    fn from(err: ChainError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Failure to read from the DB always constitutes an internal error.
impl From<StoreError> for RpcErr {
    fn from(value: StoreError) -> Self {
        RpcErr::Internal(value.to_string())
    }
}

// ========== RPC Types ==========

pub enum RpcNamespace {
    Eth,
    Debug,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcRequestId {
    Number(u64),
    String(String),
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RpcRequest {
    pub id: RpcRequestId,
    pub jsonrpc: String,
    pub method: String,
    pub params: Option<Vec<Value>>,
}

impl RpcRequest {
    pub fn namespace(&self) -> Result<RpcNamespace, RpcErr> {
        match self.method.split('_').next() {
            Some("eth") => Ok(RpcNamespace::Eth),
            Some("debug") => Ok(RpcNamespace::Debug),
            _ => Err(RpcErr::MethodNotFound(self.method.clone())),
        }
    }
}

impl Default for RpcRequest {
    fn default() -> Self {
        RpcRequest {
            id: RpcRequestId::Number(1),
            jsonrpc: "2.0".to_string(),
            method: String::new(),
            params: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RpcSuccessResponse {
    pub id: RpcRequestId,
    pub jsonrpc: String,
    pub result: Value,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RpcErrorResponse {
    pub id: RpcRequestId,
    pub jsonrpc: String,
    pub error: RpcErrorMetadata,
}
