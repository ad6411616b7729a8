//! Aggregated view loader: runs a set of named, independently fallible
//! requests and folds their outcomes into one [`ViewModel`] per load cycle.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{join_all, BoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use sceneit_core::{
    validate, Derived, Generation, LoadFailure, RequestOutcome, RequestPlan, RequestSpec,
    Resource, SettleResult, SpecError, SpecKey, ViewModel,
};
use sceneit_infra::Fetcher;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Per-request limit; an expired spec settles `Failure(Timeout)`, an
    /// expired fan-out row is dropped. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_millis(
                sceneit_config::DEFAULT_REQUEST_TIMEOUT_MS,
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettleEvent {
    pub generation: Generation,
    pub key: SpecKey,
    pub outcome: RequestOutcome,
}

/// Shared handle to the current cycle's view model.
#[derive(Clone, Default)]
struct ViewStore {
    inner: Arc<Mutex<ViewModel>>,
}

impl ViewStore {
    fn state(&self) -> ViewModel {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn replace(&self, vm: ViewModel) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = vm;
    }

    fn settle(&self, ev: SettleEvent) -> SettleResult {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.settle(ev.generation, &ev.key, ev.outcome)
    }

    fn all_settled(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .all_settled()
    }
}

pub struct ViewLoader<F> {
    fetcher: Arc<F>,
    options: LoaderOptions,
    store: ViewStore,
    generation: Generation,
    cancel: Option<CancellationToken>,
    tx: mpsc::UnboundedSender<SettleEvent>,
    rx: mpsc::UnboundedReceiver<SettleEvent>,
}

impl<F: Fetcher> ViewLoader<F> {
    pub fn new(fetcher: Arc<F>, options: LoaderOptions) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            fetcher,
            options,
            store: ViewStore::default(),
            generation: Generation::default(),
            cancel: None,
            tx,
            rx,
        }
    }

    /// Starts a new load cycle, superseding the previous one. Rejects only
    /// malformed spec lists, before any request is issued.
    pub fn load(&mut self, specs: Vec<RequestSpec>) -> Result<Generation, SpecError> {
        validate(&specs)?;

        self.cancel();
        self.generation = self.generation.next();
        let generation = self.generation;
        self.store.replace(ViewModel::pending(
            generation,
            specs.iter().map(|s| s.key.clone()),
        ));
        info!("Load {} started with {} specs", generation, specs.len());

        if specs.is_empty() {
            return Ok(generation);
        }

        let keys: Vec<SpecKey> = specs.iter().map(|s| s.key.clone()).collect();
        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        let driver = drive(
            self.fetcher.clone(),
            specs,
            generation,
            self.options.timeout,
            self.tx.clone(),
            token,
        );
        if let Err(e) = crate::async_runtime::spawn(driver) {
            tracing::error!("Failed to start load {}: {}", generation, e);
            self.cancel = None;
            self.abandon(keys, &format!("runtime unavailable: {e}"));
        }
        Ok(generation)
    }

    /// Settles every key of the current cycle as failed, for a driver that never started.
    fn abandon(&self, keys: Vec<SpecKey>, reason: &str) {
        let failure = LoadFailure::network(None, reason);
        for key in keys {
            self.store.settle(SettleEvent {
                generation: self.generation,
                key,
                outcome: RequestOutcome::Failure(failure.clone()),
            });
        }
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn view(&self) -> ViewModel {
        self.store.state()
    }

    /// Applies every settlement received so far without waiting.
    pub fn tick(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(ev) = self.rx.try_recv() {
            if self.apply(ev) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next current-cycle settlement. `None` once everything is settled.
    pub async fn next_settled(&mut self) -> Option<SpecKey> {
        loop {
            if self.store.all_settled() {
                return None;
            }
            let ev = self.rx.recv().await?;
            let key = ev.key.clone();
            if self.apply(ev) {
                return Some(key);
            }
        }
    }

    pub async fn settled(&mut self) -> ViewModel {
        while self.next_settled().await.is_some() {}
        self.view()
    }

    fn apply(&self, ev: SettleEvent) -> bool {
        if ev.generation != self.generation {
            debug!("Dropping '{}' from superseded {}", ev.key, ev.generation);
            return false;
        }
        let key = ev.key.clone();
        match self.store.settle(ev) {
            SettleResult::Applied => true,
            other => {
                warn!("Settlement of '{}' ignored: {:?}", key, other);
                false
            }
        }
    }
}

impl<F> Drop for ViewLoader<F> {
    fn drop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}

type Flight = BoxFuture<'static, (RequestSpec, RequestOutcome)>;

async fn drive<F: Fetcher>(
    fetcher: Arc<F>,
    specs: Vec<RequestSpec>,
    generation: Generation,
    timeout: Option<Duration>,
    tx: mpsc::UnboundedSender<SettleEvent>,
    token: CancellationToken,
) {
    let mut waiting: HashMap<SpecKey, Vec<RequestSpec>> = HashMap::new();
    let mut in_flight: FuturesUnordered<Flight> = FuturesUnordered::new();

    for spec in specs {
        match spec.depends_on.clone() {
            Some(upstream) => waiting.entry(upstream).or_default().push(spec),
            None => in_flight.push(execute(fetcher.clone(), spec, None, timeout).boxed()),
        }
    }

    loop {
        let next = tokio::select! {
            _ = token.cancelled() => {
                debug!("Load {} cancelled", generation);
                return;
            }
            next = in_flight.next() => next,
        };
        let Some((spec, outcome)) = next else {
            break;
        };

        let mut settled = vec![(spec.key, outcome)];
        while let Some((key, outcome)) = settled.pop() {
            for dependent in waiting.remove(&key).unwrap_or_default() {
                match &outcome {
                    RequestOutcome::Success(payload) => in_flight.push(
                        execute(fetcher.clone(), dependent, Some(payload.clone()), timeout)
                            .boxed(),
                    ),
                    _ => settled.push((
                        dependent.key,
                        RequestOutcome::Failure(LoadFailure::Dependency {
                            upstream: key.clone(),
                        }),
                    )),
                }
            }

            if let RequestOutcome::Failure(failure) = &outcome {
                warn!("Spec '{}' failed in {}: {}", key, generation, failure);
            }
            let ev = SettleEvent {
                generation,
                key,
                outcome,
            };
            if tx.send(ev).is_err() {
                return;
            }
        }
    }
}

async fn execute<F: Fetcher>(
    fetcher: Arc<F>,
    spec: RequestSpec,
    upstream: Option<Value>,
    timeout: Option<Duration>,
) -> (RequestSpec, RequestOutcome) {
    let result = run_plan(&*fetcher, &spec, upstream.as_ref(), timeout).await;
    let result = match (result, &spec.not_found_default) {
        (Err(e), Some(default)) if e.is_not_found() => Ok(default.clone()),
        (r, _) => r,
    };
    (spec, result.into())
}

async fn bounded<Fut>(limit: Option<Duration>, work: Fut) -> Result<Value, LoadFailure>
where
    Fut: Future<Output = Result<Value, LoadFailure>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .unwrap_or(Err(LoadFailure::Timeout)),
        None => work.await,
    }
}

async fn run_plan<F: Fetcher>(
    fetcher: &F,
    spec: &RequestSpec,
    upstream: Option<&Value>,
    timeout: Option<Duration>,
) -> Result<Value, LoadFailure> {
    match &spec.plan {
        RequestPlan::Fetch(resource) => {
            bounded(timeout, fetch_one(fetcher, &spec.key, resource)).await
        }
        RequestPlan::Derive(derive) => {
            let upstream = upstream.ok_or_else(|| {
                LoadFailure::Decode(format!("'{}' has no upstream payload", spec.key))
            })?;
            match (**derive)(upstream)? {
                Derived::One(resource) => {
                    bounded(timeout, fetch_one(fetcher, &spec.key, &resource)).await
                }
                Derived::Each(resources) => {
                    // Each row has its own limit so one slow row cannot blank the section.
                    let results =
                        join_all(resources.iter().map(|r| bounded(timeout, fetcher.fetch(r))))
                            .await;
                    let total = results.len();
                    let mut payloads = Vec::with_capacity(total);
                    for (resource, res) in resources.iter().zip(results) {
                        match res {
                            Ok(v) => payloads.push(v),
                            Err(e) => warn!(
                                "Dropping {} from '{}': {}",
                                resource.describe(),
                                spec.key,
                                e
                            ),
                        }
                    }
                    debug!("'{}' kept {}/{} rows", spec.key, payloads.len(), total);
                    Ok(Value::Array(payloads))
                }
            }
        }
    }
}

async fn fetch_one<F: Fetcher>(
    fetcher: &F,
    key: &str,
    resource: &Resource,
) -> Result<Value, LoadFailure> {
    debug!("'{}' issuing {}", key, resource.describe());
    fetcher.fetch(resource).await
}
