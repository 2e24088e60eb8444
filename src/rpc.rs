use {
    crate::{
        payload::WireEncoding,
        router::{FailureKind, SubmissionFailure, SubmitTransaction},
    },
    async_trait::async_trait,
    reqwest::Client,
    serde_json::{Map, Value, json},
    std::time::Duration,
    tracing::debug,
};

// JSON-RPC 2.0 protocol rejections: the request itself is malformed, no
// other region can accept it.
const INVALID_REQUEST_CODE: i64 = -32600;
const INVALID_PARAMS_CODE: i64 = -32602;
// Block engines answer a transaction that fails signature verification with
// this code, deterministically.
const TX_VERIFICATION_FAILURE_CODE: i64 = -32003;

///
/// Classification policy for JSON-RPC error objects.
///
/// Kept as a single table rather than per-call-site guessing: the fatal set
/// is the closed list of codes whose rejection is a property of the payload,
/// everything else (node behind, overloaded, internal errors, unknown codes)
/// is worth retrying against another region.
pub fn classify_rpc_error(error: &Value) -> SubmissionFailure {
    let code = error.get("code").and_then(Value::as_i64);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let kind = match code {
        Some(INVALID_REQUEST_CODE | INVALID_PARAMS_CODE | TX_VERIFICATION_FAILURE_CODE) => {
            FailureKind::FatalPayload
        }
        _ => FailureKind::RetryableElsewhere,
    };
    SubmissionFailure {
        kind,
        message: match code {
            Some(code) => format!("rpc error {code}: {message}"),
            None => format!("rpc error: {message}"),
        },
    }
}

/// sendTransaction options forwarded as the second JSON-RPC param.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    pub skip_preflight: bool,
    pub preflight_commitment: Option<String>,
}

impl SubmitOptions {
    fn to_params_entry(&self) -> Option<Value> {
        let mut options = Map::new();
        if self.skip_preflight {
            options.insert("skipPreflight".to_owned(), Value::Bool(true));
        }
        if let Some(commitment) = &self.preflight_commitment {
            options.insert(
                "preflightCommitment".to_owned(),
                Value::String(commitment.clone()),
            );
        }
        (!options.is_empty()).then(|| Value::Object(options))
    }
}

/// JSON-RPC `sendTransaction` over HTTP. One POST per attempt, bounded by
/// the per-attempt timeout; transport failures are always worth trying
/// elsewhere.
pub struct RpcSubmitter {
    client: Client,
    wire_encoding: WireEncoding,
    options: SubmitOptions,
}

impl RpcSubmitter {
    pub fn new(
        wire_encoding: WireEncoding,
        options: SubmitOptions,
        attempt_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(attempt_timeout).build()?;
        Ok(Self {
            client,
            wire_encoding,
            options,
        })
    }
}

#[async_trait]
impl SubmitTransaction for RpcSubmitter {
    async fn submit(&self, endpoint: &str, payload: &[u8]) -> Result<Value, SubmissionFailure> {
        let encoded = self.wire_encoding.encode(payload);
        debug!(
            endpoint,
            encoding = self.wire_encoding.as_str(),
            chars = encoded.len(),
            "sending transaction"
        );

        let mut params = vec![Value::String(encoded)];
        if let Some(options) = self.options.to_params_entry() {
            params.push(options);
        }
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "sendTransaction",
            "params": params,
        });

        let response = self
            .client
            .post(endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|error| SubmissionFailure::retryable(format!("request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmissionFailure::retryable(format!(
                "endpoint returned http {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|error| SubmissionFailure::retryable(format!("invalid response: {error}")))?;

        if let Some(error) = body.get("error") {
            return Err(classify_rpc_error(error));
        }
        match body.get("result") {
            Some(result) => Ok(result.clone()),
            None => Err(SubmissionFailure::retryable(
                "invalid response: missing result field",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_params_is_fatal() {
        let failure = classify_rpc_error(&json!({"code": -32602, "message": "invalid params"}));
        assert_eq!(failure.kind, FailureKind::FatalPayload);
        assert!(failure.message.contains("-32602"));
    }

    #[test]
    fn signature_verification_failure_is_fatal() {
        let failure = classify_rpc_error(&json!({
            "code": -32003,
            "message": "Transaction signature verification failure"
        }));
        assert_eq!(failure.kind, FailureKind::FatalPayload);
    }

    #[test]
    fn node_behind_is_retryable_elsewhere() {
        let failure = classify_rpc_error(&json!({"code": -32005, "message": "node is behind"}));
        assert_eq!(failure.kind, FailureKind::RetryableElsewhere);
    }

    #[test]
    fn unknown_code_defaults_to_retryable() {
        let failure = classify_rpc_error(&json!({"code": -31999, "message": "who knows"}));
        assert_eq!(failure.kind, FailureKind::RetryableElsewhere);

        let failure = classify_rpc_error(&json!({"message": "no code at all"}));
        assert_eq!(failure.kind, FailureKind::RetryableElsewhere);
    }

    #[test]
    fn options_omitted_when_defaulted() {
        let options = SubmitOptions::default();
        assert_eq!(options.to_params_entry(), None);
    }

    #[test]
    fn options_serialize_set_fields_only() {
        let options = SubmitOptions {
            skip_preflight: true,
            preflight_commitment: Some("confirmed".to_owned()),
        };
        assert_eq!(
            options.to_params_entry(),
            Some(json!({"skipPreflight": true, "preflightCommitment": "confirmed"}))
        );

        let options = SubmitOptions {
            skip_preflight: false,
            preflight_commitment: Some("processed".to_owned()),
        };
        assert_eq!(
            options.to_params_entry(),
            Some(json!({"preflightCommitment": "processed"}))
        );
    }
}
