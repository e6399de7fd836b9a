use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OdooError;

/// JSON-RPC 2.0 请求信封, Odoo 的 web 端点统一使用 method = "call"
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a, P: Serialize> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub id: String,
    pub params: &'a P,
}

impl<'a, P: Serialize> JsonRpcRequest<'a, P> {
    pub fn new(id: impl Into<String>, params: &'a P) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "call",
            id: id.into(),
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Odoo 把真正的业务错误放在 data.message 中
    fn detail(&self) -> String {
        let data_message = self
            .data
            .as_ref()
            .and_then(|d| d.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty());
        match data_message {
            Some(m) => format!("{}: {}", self.message, m),
            None => self.message.clone(),
        }
    }
}

impl JsonRpcResponse {
    /// 取出 result; error 对象转换为 [`OdooError::Remote`]
    pub fn into_result(self) -> Result<Value, OdooError> {
        if let Some(err) = self.error {
            return Err(OdooError::Remote {
                code: err.code,
                message: err.detail(),
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// search_read 端点的参数
#[derive(Debug, Serialize)]
pub struct SearchReadParams<'a> {
    pub model: &'a str,
    pub domain: &'a [Value],
    pub fields: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// call_kw 端点的参数 (create/write/unlink/自定义方法)
#[derive(Debug, Serialize)]
pub struct CallKwParams<'a> {
    pub model: &'a str,
    pub method: &'a str,
    pub args: Value,
    /// 字段必须存在 (可为空对象), 否则 Odoo 拒绝请求
    pub kwargs: serde_json::Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct LoginParams<'a> {
    pub db: &'a str,
    pub login: &'a str,
    pub password: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_envelope_shape() {
        let params = json!({"model": "res.partner"});
        let req = JsonRpcRequest::new("7", &params);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"jsonrpc": "2.0", "method": "call", "id": "7", "params": {"model": "res.partner"}})
        );
    }

    #[test]
    fn remote_error_uses_data_message() {
        let resp: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "error": {"code": 200, "message": "Odoo Server Error", "data": {"message": "Record does not exist"}}
        }))
        .unwrap();

        let err = resp.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "error from Odoo: Odoo Server Error: Record does not exist (code 200)"
        );
    }

    #[test]
    fn missing_result_is_null() {
        let resp: JsonRpcResponse = serde_json::from_value(json!({"jsonrpc": "2.0", "id": "1"})).unwrap();
        assert_eq!(resp.into_result().unwrap(), Value::Null);
    }
}
