use std::{sync::Arc, time::Duration};

use serde_json::{Map, Value};
use tokio::{
    runtime::Handle,
    sync::{mpsc, oneshot, watch},
};
use uuid::Uuid;

use crate::{
    config::SdkConfig,
    models::Context,
    session::SessionIdentity,
};

use super::{
    debug::{DebugEvent, DebugSink},
    engine::{FingerprintEngine, ScriptResult, DEVICE_ID_KEY},
    error::ScriptError,
    payload::{ExecutionMode, ScriptPayload},
    state::ExecutionState,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

pub type ScriptOutcome = Result<ScriptResult, ScriptError>;

/// Single dictionary form of an outcome: the result map, or the tagged error map.
pub fn outcome_to_map(outcome: &ScriptOutcome) -> Map<String, Value> {
    match outcome {
        Ok(result) => result.clone(),
        Err(err) => err.to_map(),
    }
}

/// Pending result of one execution.
///
/// Backed by a oneshot channel: the outcome is delivered exactly once and can
/// only be consumed once.
#[derive(Debug)]
pub struct Completion {
    execution_id: Uuid,
    result_rx: oneshot::Receiver<ScriptOutcome>,
    state_rx: watch::Receiver<ExecutionState>,
}

impl Completion {
    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    /// Latest published state of the execution.
    pub fn state(&self) -> ExecutionState {
        *self.state_rx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ExecutionState> {
        self.state_rx.clone()
    }

    pub async fn wait(self) -> ScriptOutcome {
        self.result_rx
            .await
            .unwrap_or(Err(ScriptError::RuntimeError))
    }

    /// Blocks the current thread until the outcome arrives.
    ///
    /// For host threads outside the runtime; panics when called from async code.
    pub fn blocking_wait(self) -> ScriptOutcome {
        self.result_rx
            .blocking_recv()
            .unwrap_or(Err(ScriptError::RuntimeError))
    }
}

/// The shared execution engine.
///
/// Construct once at application start and clone the handle to callers. Each
/// call snapshots its context and tracks its own completion; concurrent
/// executions share nothing beyond the engine.
#[derive(Clone)]
pub struct ScriptOrchestrator {
    engine: Arc<dyn FingerprintEngine>,
    runtime: Handle,
    identity: SessionIdentity,
    debug: DebugSink,
    request_timeout: Duration,
}

impl ScriptOrchestrator {
    pub fn new<E: FingerprintEngine>(engine: E, runtime: Handle, config: &SdkConfig) -> Self {
        log_info!(
            "Script orchestrator ready (timeout={}ms)",
            config.request_timeout_ms
        );
        Self {
            engine: Arc::new(engine),
            runtime,
            identity: SessionIdentity::new(),
            debug: DebugSink::disabled(),
            request_timeout: config.request_timeout(),
        }
    }

    /// Like [`new`](Self::new), attaching a bounded debug channel when the
    /// config enables debugging.
    pub fn from_config<E: FingerprintEngine>(
        engine: E,
        runtime: Handle,
        config: &SdkConfig,
    ) -> (Self, Option<mpsc::Receiver<DebugEvent>>) {
        let orchestrator = Self::new(engine, runtime, config);
        if !config.debug_enabled {
            return (orchestrator, None);
        }
        let (sink, debug_rx) = DebugSink::channel(config.debug_channel_capacity);
        (orchestrator.with_debug_sink(sink), Some(debug_rx))
    }

    pub fn with_debug_sink(mut self, debug: DebugSink) -> Self {
        self.debug = debug;
        self
    }

    /// Shares an identity owned elsewhere instead of the orchestrator's own.
    pub fn with_session_identity(mut self, identity: SessionIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn session_identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn session_id(&self) -> String {
        self.identity.session_id()
    }

    pub fn reset_session_id(&self) -> String {
        self.identity.reset_session_id()
    }

    /// Empty context bound to this orchestrator's current session.
    pub fn new_context(&self) -> Context {
        Context::new(&self.identity)
    }

    /// Full fingerprinting step.
    pub fn execute(&self, context: &Context) -> Completion {
        self.start(context, ExecutionMode::Full)
    }

    /// Reduced step yielding only a device id.
    pub fn get_device_id(&self, context: &Context) -> Completion {
        self.start(context, ExecutionMode::DeviceId)
    }

    /// Callback form of [`execute`](Self::execute). The handler runs on the
    /// orchestrator's runtime, never on the calling thread.
    pub fn execute_with_completion<F>(&self, context: &Context, completion: F)
    where
        F: FnOnce(ScriptOutcome) + Send + 'static,
    {
        let pending = self.execute(context);
        self.runtime.spawn(async move { completion(pending.wait().await) });
    }

    pub fn get_device_id_with_completion<F>(&self, context: &Context, completion: F)
    where
        F: FnOnce(ScriptOutcome) + Send + 'static,
    {
        let pending = self.get_device_id(context);
        self.runtime.spawn(async move { completion(pending.wait().await) });
    }

    /// Fire-and-forget execution. Failures surface only on the debug sink.
    pub fn execute_detached(&self, context: &Context) {
        let pending = self.execute(context);
        let debug = self.debug.clone();
        self.runtime.spawn(async move {
            let execution_id = pending.execution_id();
            if let Err(err) = pending.wait().await {
                debug.emit(DebugEvent::failure(
                    format!("detached execution {execution_id} failed: {}", err.as_str()),
                    err,
                ));
            }
        });
    }

    fn start(&self, context: &Context, mode: ExecutionMode) -> Completion {
        let execution_id = Uuid::new_v4();
        let (state_tx, state_rx) = watch::channel(ExecutionState::Idle);
        let (result_tx, result_rx) = oneshot::channel();

        advance(&state_tx, ExecutionState::Validating);

        if !context.has_customer_id() {
            log_warn!("Execution {execution_id} rejected: missing customer id");
            advance(&state_tx, ExecutionState::Rejected);
            let _ = result_tx.send(Err(ScriptError::InvalidCustomerId));
            return Completion {
                execution_id,
                result_rx,
                state_rx,
            };
        }

        let payload = match mode {
            ExecutionMode::Full => ScriptPayload::full(context),
            ExecutionMode::DeviceId => ScriptPayload::device_only(context),
        };

        advance(&state_tx, ExecutionState::Running);
        log_debug!(
            "Execution {execution_id} running ({:?}, {} touches)",
            mode,
            payload.touch_events.len()
        );

        let engine = Arc::clone(&self.engine);
        let debug = self.debug.clone();
        let request_timeout = self.request_timeout;

        self.runtime.spawn(async move {
            let outcome = run_step(engine, payload, debug, request_timeout).await;

            match &outcome {
                Ok(_) => {
                    log_info!("Execution {execution_id} completed");
                    advance(&state_tx, ExecutionState::Completed);
                }
                Err(err) => {
                    log_warn!("Execution {execution_id} failed: {}", err.as_str());
                    advance(&state_tx, ExecutionState::Failed);
                }
            }

            if result_tx.send(outcome).is_err() {
                log_debug!("Execution {execution_id} finished after its completion was dropped");
            }
        });

        Completion {
            execution_id,
            result_rx,
            state_rx,
        }
    }
}

async fn run_step(
    engine: Arc<dyn FingerprintEngine>,
    payload: ScriptPayload,
    debug: DebugSink,
    request_timeout: Duration,
) -> ScriptOutcome {
    let mode = payload.mode;
    let worker = tokio::task::spawn_blocking(move || engine.run(&payload, &debug));

    // A timed-out worker keeps its blocking thread until the engine returns;
    // its result is discarded.
    let result = match tokio::time::timeout(request_timeout, worker).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => {
            log_error!("fingerprint worker faulted: {join_err}");
            Err(ScriptError::RuntimeError)
        }
        Err(_) => Err(ScriptError::RequestTimeout),
    };

    match result {
        Ok(map) if mode == ExecutionMode::DeviceId && !has_device_id(&map) => {
            log_error!("device id execution returned no {DEVICE_ID_KEY}");
            Err(ScriptError::RuntimeError)
        }
        other => other,
    }
}

fn has_device_id(result: &ScriptResult) -> bool {
    result
        .get(DEVICE_ID_KEY)
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty())
}

fn advance(state_tx: &watch::Sender<ExecutionState>, next: ExecutionState) {
    state_tx.send_if_modified(|state| {
        if state.can_advance_to(next) {
            *state = next;
            true
        } else {
            false
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Point, TouchEvent, TouchPhase};
    use crate::script::engine::ReferenceEngine;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedEngine(ScriptOutcome);

    impl FingerprintEngine for FixedEngine {
        fn run(&self, _: &ScriptPayload, _: &DebugSink) -> ScriptOutcome {
            self.0.clone()
        }
    }

    struct CountingEngine(Arc<AtomicUsize>);

    impl FingerprintEngine for CountingEngine {
        fn run(&self, _: &ScriptPayload, _: &DebugSink) -> ScriptOutcome {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(device_map("dev"))
        }
    }

    struct SlowEngine(Duration);

    impl FingerprintEngine for SlowEngine {
        fn run(&self, _: &ScriptPayload, _: &DebugSink) -> ScriptOutcome {
            std::thread::sleep(self.0);
            Ok(device_map("late"))
        }
    }

    struct PanickingEngine;

    impl FingerprintEngine for PanickingEngine {
        fn run(&self, _: &ScriptPayload, _: &DebugSink) -> ScriptOutcome {
            panic!("script fault");
        }
    }

    fn device_map(id: &str) -> ScriptResult {
        let mut map = Map::new();
        map.insert(DEVICE_ID_KEY.into(), json!(id));
        map
    }

    fn orchestrator<E: FingerprintEngine>(engine: E) -> ScriptOrchestrator {
        ScriptOrchestrator::new(engine, Handle::current(), &SdkConfig::default())
    }

    fn valid_context(orch: &ScriptOrchestrator) -> Context {
        let mut context = orch.new_context();
        context.customer_id = "abc123".into();
        context
    }

    #[tokio::test]
    async fn empty_customer_id_is_rejected_without_running_engine() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (sink, mut debug_rx) = DebugSink::channel(8);
        let orch = orchestrator(CountingEngine(Arc::clone(&calls))).with_debug_sink(sink);
        let context = orch.new_context();

        let pending = orch.execute(&context);
        assert_eq!(pending.state(), ExecutionState::Rejected);
        assert_eq!(pending.wait().await, Err(ScriptError::InvalidCustomerId));

        let pending = orch.get_device_id(&context);
        assert_eq!(pending.wait().await, Err(ScriptError::InvalidCustomerId));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(debug_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn successful_execution_completes() {
        let orch = orchestrator(ReferenceEngine::with_device_id("dev-42"));
        let mut context = valid_context(&orch);
        context.add_touch_event(TouchEvent::new(0.0, TouchPhase::Began, Point::default(), 0.1));
        context.add_touch_event(TouchEvent::new(0.2, TouchPhase::Ended, Point::default(), 0.0));

        let pending = orch.execute(&context);
        let mut states = pending.subscribe_state();
        let result = pending.wait().await.unwrap();

        assert_eq!(result[DEVICE_ID_KEY], "dev-42");
        assert_eq!(result["touchCount"], 2);
        assert_eq!(*states.borrow_and_update(), ExecutionState::Completed);
    }

    #[tokio::test]
    async fn engine_errors_are_surfaced_unchanged() {
        for err in &ScriptError::ALL[1..] {
            let orch = orchestrator(FixedEngine(Err(*err)));
            let pending = orch.execute(&valid_context(&orch));
            let state = pending.subscribe_state();

            assert_eq!(pending.wait().await, Err(*err));
            assert_eq!(*state.borrow(), ExecutionState::Failed);
        }
    }

    #[tokio::test]
    async fn slow_engine_times_out() {
        let config = SdkConfig {
            request_timeout_ms: 20,
            ..SdkConfig::default()
        };
        let orch = ScriptOrchestrator::new(
            SlowEngine(Duration::from_millis(200)),
            Handle::current(),
            &config,
        );

        let outcome = orch.execute(&valid_context(&orch)).wait().await;
        assert_eq!(outcome, Err(ScriptError::RequestTimeout));
    }

    #[tokio::test]
    async fn panicking_engine_is_runtime_error() {
        let orch = orchestrator(PanickingEngine);
        let outcome = orch.execute(&valid_context(&orch)).wait().await;
        assert_eq!(outcome, Err(ScriptError::RuntimeError));
    }

    #[tokio::test]
    async fn device_id_requires_id_in_result() {
        let orch = orchestrator(FixedEngine(Ok(Map::new())));
        let outcome = orch.get_device_id(&valid_context(&orch)).wait().await;
        assert_eq!(outcome, Err(ScriptError::RuntimeError));

        let orch = orchestrator(FixedEngine(Ok(device_map("dev-7"))));
        let result = orch.get_device_id(&valid_context(&orch)).wait().await.unwrap();
        assert_eq!(result[DEVICE_ID_KEY], "dev-7");
    }

    #[tokio::test]
    async fn callback_fires_exactly_once() {
        let orch = orchestrator(ReferenceEngine::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let (done_tx, done_rx) = oneshot::channel();

        let counter = Arc::clone(&calls);
        orch.execute_with_completion(&valid_context(&orch), move |outcome| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = done_tx.send(outcome);
        });

        assert!(done_rx.await.unwrap().is_ok());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn detached_failure_reaches_debug_sink_only() {
        let (sink, mut debug_rx) = DebugSink::channel(8);
        let orch = orchestrator(FixedEngine(Err(ScriptError::ServiceUnavailable)))
            .with_debug_sink(sink);

        orch.execute_detached(&valid_context(&orch));

        let event = tokio::time::timeout(Duration::from_secs(2), debug_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(event.is_error);
        assert_eq!(event.error, Some(ScriptError::ServiceUnavailable));
    }

    #[tokio::test]
    async fn context_mutation_after_execute_is_not_seen() {
        let orch = orchestrator(ReferenceEngine::new());
        let mut context = valid_context(&orch);
        let pending = orch.execute(&context);
        context.add_touch_event(TouchEvent::new(1.0, TouchPhase::Began, Point::default(), 0.5));

        let result = pending.wait().await.unwrap();
        assert_eq!(result["touchCount"], 0);
    }

    #[tokio::test]
    async fn new_contexts_follow_session_reset() {
        let orch = orchestrator(ReferenceEngine::new());
        let before = orch.new_context();
        let fresh = orch.reset_session_id();
        let after = orch.new_context();

        assert_ne!(before.session_id, fresh);
        assert_eq!(after.session_id, fresh);
        assert_eq!(orch.session_id(), fresh);
    }

    #[tokio::test]
    async fn debug_channel_follows_config() {
        let (_, debug_rx) =
            ScriptOrchestrator::from_config(ReferenceEngine::new(), Handle::current(), &SdkConfig::default());
        assert!(debug_rx.is_none());

        let config = SdkConfig {
            debug_enabled: true,
            ..SdkConfig::default()
        };
        let (orch, debug_rx) =
            ScriptOrchestrator::from_config(ReferenceEngine::new(), Handle::current(), &config);
        let mut debug_rx = debug_rx.unwrap();

        orch.execute(&valid_context(&orch)).wait().await.unwrap();
        let event = debug_rx.recv().await.unwrap();
        assert!(!event.is_error);
    }

    #[test]
    fn blocking_wait_from_host_thread() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let orch = ScriptOrchestrator::new(
            ReferenceEngine::with_device_id("dev-host"),
            runtime.handle().clone(),
            &SdkConfig::default(),
        );

        let result = orch
            .get_device_id(&valid_context(&orch))
            .blocking_wait()
            .unwrap();
        assert_eq!(result[DEVICE_ID_KEY], "dev-host");
    }

    #[test]
    fn outcome_map_forms() {
        let ok: ScriptOutcome = Ok(device_map("d"));
        assert_eq!(outcome_to_map(&ok)[DEVICE_ID_KEY], "d");

        let err: ScriptOutcome = Err(ScriptError::InvalidCustomerId);
        let map = outcome_to_map(&err);
        assert_eq!(map["error"], "invalidCustomerId");
        assert_eq!(map["code"], 0);
    }
}
