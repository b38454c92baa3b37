//! Tool executor
//!
//! Turns a `ToolCallRequest` into exactly one `ToolResult`. Every failure
//! (unknown tool, bad arguments, timeout, handler error or panic) becomes a
//! failed result instead of an error, so the model can see it and adapt.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use futures::FutureExt;
use serde_json::Value;

use crate::logging::Logger;
use crate::types::{value_kind, ToolCallRequest, ToolErrorKind, ToolResult, ToolSpec};

use super::handler::{HandlerError, ToolArgs};
use super::registry::ToolRegistry;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Check an argument value against a tool spec
///
/// `null` counts as an empty mapping; a `null` parameter counts as absent.
pub fn validate_arguments(spec: &ToolSpec, arguments: &Value) -> Result<ToolArgs, String> {
    let args = match arguments {
        Value::Null => ToolArgs::new(),
        Value::Object(map) => map.clone(),
        other => {
            return Err(format!(
                "arguments for `{}` must be an object, got {}",
                spec.name,
                value_kind(other)
            ))
        }
    };

    for param in &spec.parameters {
        match args.get(&param.name) {
            None | Some(Value::Null) if param.required => {
                return Err(format!("missing required parameter `{}`", param.name));
            }
            Some(value) if !value.is_null() && !param.kind.matches(value) => {
                return Err(format!(
                    "parameter `{}` must be {}, got {}",
                    param.name,
                    param.kind,
                    value_kind(value)
                ));
            }
            _ => {}
        }
    }

    let mut unknown: Vec<&str> = args
        .keys()
        .filter(|k| spec.param(k).is_none())
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        unknown.sort_unstable();
        return Err(format!("unexpected parameter(s): {}", unknown.join(", ")));
    }

    Ok(args)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs tool calls against a registry
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    default_timeout: Duration,
    parallel: bool,
    logger: Arc<dyn Logger>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, logger: Arc<dyn Logger>) -> Self {
        Self {
            registry,
            default_timeout: DEFAULT_TIMEOUT,
            parallel: false,
            logger,
        }
    }

    /// Bound for handlers that do not declare their own
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Run the calls of one batch concurrently
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Execute one call; never fails, errors come back as failed results
    pub async fn execute(&self, request: &ToolCallRequest) -> ToolResult {
        let resolved = match self.registry.resolve(&request.name) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.logger.warn(&format!("[ToolExecutor] {}", e));
                return ToolResult::failure(&request.id, &request.name, ToolErrorKind::UnknownTool, e.to_string());
            }
        };

        let args = match validate_arguments(&resolved.spec, &request.arguments) {
            Ok(args) => args,
            Err(message) => {
                self.logger.warn(&format!("[ToolExecutor] {} rejected: {}", request.name, message));
                return ToolResult::failure(&request.id, &request.name, ToolErrorKind::Validation, message);
            }
        };

        let timeout = resolved.handler.timeout().unwrap_or(self.default_timeout);
        self.logger.info(&format!(
            "[ToolExecutor] Calling {} (id={}, timeout={:?})",
            request.name,
            request.id,
            timeout
        ));

        let started = Instant::now();
        let call = AssertUnwindSafe(resolved.handler.call(&args)).catch_unwind();
        let result = match tokio::time::timeout(timeout, call).await {
            Err(_) => ToolResult::failure(
                &request.id,
                &request.name,
                ToolErrorKind::Timeout,
                format!("`{}` did not finish within {:?}", request.name, timeout),
            ),
            Ok(Err(panic)) => ToolResult::failure(
                &request.id,
                &request.name,
                ToolErrorKind::Handler,
                format!("`{}` panicked: {}", request.name, panic_message(panic.as_ref())),
            ),
            Ok(Ok(Err(e))) => {
                let kind = match e {
                    HandlerError::InvalidArgument { .. } => ToolErrorKind::Validation,
                    HandlerError::Timeout(_) => ToolErrorKind::Timeout,
                    HandlerError::Io(_) | HandlerError::Failed(_) => ToolErrorKind::Handler,
                };
                ToolResult::failure(&request.id, &request.name, kind, e.to_string())
            }
            Ok(Ok(Ok(output))) => ToolResult::success(&request.id, &request.name, output),
        };

        if result.success {
            self.logger.debug(&format!(
                "[ToolExecutor] {} finished in {}ms ({} chars)",
                request.name,
                started.elapsed().as_millis(),
                result.output.len()
            ));
        } else {
            self.logger.warn(&format!(
                "[ToolExecutor] {} failed: {}",
                request.name,
                result.model_content()
            ));
        }
        result
    }

    /// Execute a batch; one result per request, in request order
    pub async fn execute_batch(&self, requests: &[ToolCallRequest]) -> Vec<ToolResult> {
        if self.parallel && requests.len() > 1 {
            return join_all(requests.iter().map(|r| self.execute(r))).await;
        }

        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.execute(request).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::tools::handler::{HandlerResult, ToolHandler};
    use crate::types::{ParamKind, ParamSpec};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts invocations and echoes `text`
    struct EchoTool {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ToolHandler for EchoTool {
        async fn call(&self, args: &ToolArgs) -> HandlerResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(args.get("text").and_then(Value::as_str).unwrap_or_default().to_string())
        }
    }

    struct SleepTool(Duration);

    #[async_trait]
    impl ToolHandler for SleepTool {
        async fn call(&self, _args: &ToolArgs) -> HandlerResult {
            tokio::time::sleep(self.0).await;
            Ok(format!("slept {}ms", self.0.as_millis()))
        }

        fn timeout(&self) -> Option<Duration> {
            Some(Duration::from_millis(50))
        }
    }

    struct PanicTool;

    #[async_trait]
    impl ToolHandler for PanicTool {
        async fn call(&self, _args: &ToolArgs) -> HandlerResult {
            panic!("boom");
        }
    }

    struct FailTool;

    #[async_trait]
    impl ToolHandler for FailTool {
        async fn call(&self, _args: &ToolArgs) -> HandlerResult {
            Err(HandlerError::failed("disk on fire"))
        }
    }

    fn echo_spec() -> ToolSpec {
        ToolSpec::new("echo", "Echo text")
            .with_param(ParamSpec::required("text", ParamKind::String, "Text"))
            .with_param(ParamSpec::optional("times", ParamKind::Integer, "Repeat count"))
    }

    fn setup() -> (ToolExecutor, Arc<EchoTool>) {
        let registry = Arc::new(ToolRegistry::new(Arc::new(NoOpLogger)));
        let echo = Arc::new(EchoTool {
            calls: AtomicUsize::new(0),
        });
        registry.register(echo_spec(), echo.clone()).unwrap();
        registry
            .register(ToolSpec::new("sleep", "Sleep"), Arc::new(SleepTool(Duration::from_millis(500))))
            .unwrap();
        registry
            .register(ToolSpec::new("quick", "Sleep briefly"), Arc::new(SleepTool(Duration::from_millis(5))))
            .unwrap();
        registry.register(ToolSpec::new("panic", "Panic"), Arc::new(PanicTool)).unwrap();
        registry.register(ToolSpec::new("fail", "Fail"), Arc::new(FailTool)).unwrap();
        (ToolExecutor::new(registry, Arc::new(NoOpLogger)), echo)
    }

    #[test]
    fn test_validate_arguments() {
        let spec = echo_spec();
        assert!(validate_arguments(&spec, &json!({ "text": "hi" })).is_ok());
        assert!(validate_arguments(&spec, &json!({ "text": "hi", "times": null })).is_ok());

        let err = validate_arguments(&spec, &json!({})).unwrap_err();
        assert!(err.contains("missing required parameter `text`"));

        let err = validate_arguments(&spec, &json!({ "text": 5 })).unwrap_err();
        assert_eq!(err, "parameter `text` must be string, got integer");

        let err = validate_arguments(&spec, &json!({ "text": "hi", "colour": "red" })).unwrap_err();
        assert!(err.contains("colour"));

        let err = validate_arguments(&spec, &json!(["hi"])).unwrap_err();
        assert!(err.contains("must be an object"));

        // Tools without parameters accept null arguments
        assert!(validate_arguments(&ToolSpec::new("noop", ""), &Value::Null).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_success() {
        let (executor, echo) = setup();
        let result = executor.execute(&ToolCallRequest::new("c1", "echo", json!({ "text": "hi" }))).await;
        assert!(result.success);
        assert_eq!(result.call_id, "c1");
        assert_eq!(result.output, "hi");
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_validation_failure_skips_handler() {
        let (executor, echo) = setup();
        let result = executor.execute(&ToolCallRequest::new("c1", "echo", json!({ "text": 42 }))).await;
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ToolErrorKind::Validation));
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (executor, _) = setup();
        let result = executor.execute(&ToolCallRequest::new("c9", "launch_rocket", json!({}))).await;
        assert_eq!(result.error_kind, Some(ToolErrorKind::UnknownTool));
        assert_eq!(result.call_id, "c9");
        assert!(result.output.contains("launch_rocket"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let (executor, _) = setup();
        let result = executor.execute(&ToolCallRequest::new("c1", "sleep", json!({}))).await;
        assert_eq!(result.error_kind, Some(ToolErrorKind::Timeout));
        // Sub-second bounds are reported as they are, not rounded down to 0s
        assert!(result.output.contains("within 50ms"), "{}", result.output);
    }

    #[tokio::test]
    async fn test_panic_and_handler_error() {
        let (executor, _) = setup();
        let result = executor.execute(&ToolCallRequest::new("c1", "panic", json!({}))).await;
        assert_eq!(result.error_kind, Some(ToolErrorKind::Handler));
        assert!(result.output.contains("boom"));

        let result = executor.execute(&ToolCallRequest::new("c2", "fail", Value::Null)).await;
        assert_eq!(result.error_kind, Some(ToolErrorKind::Handler));
        assert_eq!(result.model_content(), "Error (handler error): disk on fire");
    }

    #[tokio::test]
    async fn test_batch_keeps_order_and_isolates_failures() {
        for parallel in [false, true] {
            let (executor, _) = setup();
            let executor = executor.with_parallel(parallel);
            let batch = vec![
                ToolCallRequest::new("a", "quick", json!({})),
                ToolCallRequest::new("b", "fail", json!({})),
                ToolCallRequest::new("c", "echo", json!({ "text": "third" })),
                ToolCallRequest::new("d", "missing", json!({})),
            ];

            let results = executor.execute_batch(&batch).await;
            let ids: Vec<&str> = results.iter().map(|r| r.call_id.as_str()).collect();
            assert_eq!(ids, vec!["a", "b", "c", "d"]);
            assert!(results[0].success);
            assert!(!results[1].success);
            assert_eq!(results[2].output, "third");
            assert_eq!(results[3].error_kind, Some(ToolErrorKind::UnknownTool));
        }
    }
}
