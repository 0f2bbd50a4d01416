use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::task::{Context, Poll};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use super::validation::{FormValidator, model_from_values};
use crate::error_tree::ErrorTree;
use crate::guard::{AsyncGuard, Guarded, Settlement};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

pub type FormValues = BTreeMap<String, Value>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl AsRef<str> for FieldKey {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl From<FieldKey> for String {
    fn from(key: FieldKey) -> Self {
        key.0.to_owned()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubscriptionId(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum SubmitState {
    Idle,
    Submitting,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueChange {
    Field { name: String, value: Value },
    Patch(FormValues),
}

impl ValueChange {
    fn apply_to(&self, values: &mut FormValues) {
        match self {
            ValueChange::Field { name, value } => {
                values.insert(name.clone(), value.clone());
            }
            ValueChange::Patch(patch) => {
                values.extend(patch.iter().map(|(name, value)| (name.clone(), value.clone())));
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            ValueChange::Field { .. } => 1,
            ValueChange::Patch(patch) => patch.len(),
        }
    }
}

impl<K, V> From<(K, V)> for ValueChange
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from((name, value): (K, V)) -> Self {
        ValueChange::Field {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl From<FormValues> for ValueChange {
    fn from(patch: FormValues) -> Self {
        ValueChange::Patch(patch)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    pub reset_on_success: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            reset_on_success: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormSnapshot {
    pub form_id: FormId,
    pub values: FormValues,
    pub errors: ErrorTree,
    pub submit_state: SubmitState,
    pub submitting: bool,
    pub submit_count: u32,
    pub touched: bool,
    pub is_valid: bool,
}

impl FormSnapshot {
    pub fn field_value(&self, name: impl AsRef<str>) -> Option<&Value> {
        self.values.get(name.as_ref())
    }

    pub fn is_field_invalid(&self, name: impl AsRef<str>) -> bool {
        self.errors.is_field_invalid(name)
    }

    pub fn model<T>(&self) -> FormResult<T>
    where
        T: DeserializeOwned,
    {
        model_from_values(&self.values)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("no submit handler registered")]
    MissingSubmitHandler,
    #[error("failed to convert form values: {0}")]
    ModelConversion(String),
}

pub type FormResult<T> = Result<T, FormError>;

/// Rejection payload of a submit handler. Only its `errors` member is read.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitRejection(Value);

impl SubmitRejection {
    pub fn new(payload: impl Into<Value>) -> Self {
        Self(payload.into())
    }

    pub fn with_errors(errors: impl Into<Value>) -> Self {
        let mut payload = serde_json::Map::new();
        payload.insert("errors".to_owned(), errors.into());
        Self(Value::Object(payload))
    }

    pub fn errors(&self) -> Option<&Value> {
        self.0.get("errors")
    }

    pub fn payload(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for SubmitRejection {
    fn from(payload: Value) -> Self {
        Self(payload)
    }
}

pub type SubmitResult = Result<Value, SubmitRejection>;
pub type BoxedSubmitFuture = Pin<Box<dyn Future<Output = SubmitResult> + Send + 'static>>;

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    Succeeded(Value),
    Failed(ErrorTree),
    Discarded,
}

pub(super) type ValidatorFn = Arc<dyn Fn(&FormValues) -> bool + Send + Sync>;
pub(super) type SubmitFn = Arc<dyn Fn(FormValues) -> BoxedSubmitFuture + Send + Sync>;
pub(super) type ValueChangeFn = Arc<dyn Fn(&ValueChange, &FormValues) + Send + Sync>;
pub(super) type SnapshotObserverFn = Arc<dyn Fn(&FormSnapshot) + Send + Sync>;

pub(super) struct FormState {
    pub(super) id: FormId,
    pub(super) values: FormValues,
    pub(super) errors: ErrorTree,
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) touched: bool,
    pub(super) last_initial: Option<Arc<FormValues>>,
    pub(super) active_guard: Option<AsyncGuard>,
}

impl FormState {
    fn seed(&mut self, initial: Option<Arc<FormValues>>) {
        self.values = initial.as_deref().cloned().unwrap_or_default();
        self.errors = ErrorTree::Empty;
        self.submit_state = SubmitState::Idle;
        self.touched = false;
        self.last_initial = initial;
    }

    fn clear(&mut self) {
        self.values.clear();
        self.errors = ErrorTree::Empty;
        self.submit_state = SubmitState::Idle;
        self.touched = false;
    }

    fn cancel_active_guard(&mut self) -> bool {
        match self.active_guard.take() {
            Some(guard) => {
                guard.cancel();
                true
            }
            None => false,
        }
    }
}

#[derive(Clone)]
pub struct FormController {
    pub(super) options: FormOptions,
    pub(super) state: Arc<RwLock<FormState>>,
    pub(super) validator: Arc<RwLock<Option<ValidatorFn>>>,
    pub(super) submit_handler: Arc<RwLock<Option<SubmitFn>>>,
    pub(super) value_change_observer: Arc<RwLock<Option<ValueChangeFn>>>,
    pub(super) observers: Arc<RwLock<BTreeMap<SubscriptionId, SnapshotObserverFn>>>,
    next_subscription: Arc<AtomicU64>,
}

impl FormController {
    pub fn new(options: FormOptions) -> Self {
        Self::build(None, options)
    }

    pub fn with_initial_values(initial: impl Into<Arc<FormValues>>, options: FormOptions) -> Self {
        Self::build(Some(initial.into()), options)
    }

    fn build(initial: Option<Arc<FormValues>>, options: FormOptions) -> Self {
        let mut state = FormState {
            id: FormId::next(),
            values: FormValues::new(),
            errors: ErrorTree::Empty,
            submit_state: SubmitState::Idle,
            submit_count: 0,
            touched: false,
            last_initial: None,
            active_guard: None,
        };
        state.seed(initial);
        Self {
            options,
            state: Arc::new(RwLock::new(state)),
            validator: Arc::new(RwLock::new(None)),
            submit_handler: Arc::new(RwLock::new(None)),
            value_change_observer: Arc::new(RwLock::new(None)),
            observers: Arc::new(RwLock::new(BTreeMap::new())),
            next_subscription: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    pub fn register_validator<V>(&self, validator: V) -> FormResult<()>
    where
        V: FormValidator + 'static,
    {
        let validator = Arc::new(validator);
        let wrapped: ValidatorFn = Arc::new(move |values: &FormValues| validator.validate(values));
        *write_lock(&self.validator, "registering validator")? = Some(wrapped);
        Ok(())
    }

    pub fn register_submit_handler<F, Fut>(&self, handler: F) -> FormResult<()>
    where
        F: Fn(FormValues) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SubmitResult> + Send + 'static,
    {
        let wrapped: SubmitFn =
            Arc::new(move |values: FormValues| Box::pin(handler(values)) as BoxedSubmitFuture);
        *write_lock(&self.submit_handler, "registering submit handler")? = Some(wrapped);
        Ok(())
    }

    pub fn register_value_change_observer(
        &self,
        observer: impl Fn(&ValueChange, &FormValues) + Send + Sync + 'static,
    ) -> FormResult<()> {
        *write_lock(
            &self.value_change_observer,
            "registering value change observer",
        )? = Some(Arc::new(observer));
        Ok(())
    }

    pub fn subscribe(
        &self,
        observer: impl Fn(&FormSnapshot) + Send + Sync + 'static,
    ) -> FormResult<SubscriptionId> {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        write_lock(&self.observers, "subscribing observer")?.insert(id, Arc::new(observer));
        Ok(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> FormResult<bool> {
        Ok(write_lock(&self.observers, "unsubscribing observer")?
            .remove(&id)
            .is_some())
    }

    pub fn initialize(&self, initial: Option<Arc<FormValues>>) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "initializing form")?;
            state.cancel_active_guard();
            state.seed(initial);
            debug!(form_id = state.id.0, fields = state.values.len(), "form initialized");
        }
        self.notify()
    }

    pub fn update(&self, change: impl Into<ValueChange>) -> FormResult<()> {
        let change = change.into();
        let observer = read_lock(&self.value_change_observer, "reading value change observer")?
            .clone();
        let values = {
            let mut state = write_lock(&self.state, "applying value change")?;
            change.apply_to(&mut state.values);
            state.touched = true;
            trace!(form_id = state.id.0, fields = change.len(), "form values updated");
            observer.as_ref().map(|_| state.values.clone())
        };

        if let (Some(observer), Some(values)) = (observer, values) {
            observer(&change, &values);
        }
        self.notify()
    }

    pub fn update_value(&self, name: impl Into<String>, value: impl Into<Value>) -> FormResult<()> {
        self.update((name.into(), value.into()))
    }

    pub fn update_values(&self, patch: FormValues) -> FormResult<()> {
        self.update(patch)
    }

    pub fn is_valid(&self) -> FormResult<bool> {
        let values = read_lock(&self.state, "reading values for validation")?
            .values
            .clone();
        self.evaluate_validity(&values)
    }

    pub fn submit(&self) -> FormResult<SubmitTask> {
        self.start_submit()
    }

    /// Runs `suppress_default` first, e.g. to stop the host's native submit.
    pub fn submit_suppressing(&self, suppress_default: impl FnOnce()) -> FormResult<SubmitTask> {
        suppress_default();
        self.start_submit()
    }

    fn start_submit(&self) -> FormResult<SubmitTask> {
        let handler = read_lock(&self.submit_handler, "reading submit handler")?
            .clone()
            .ok_or(FormError::MissingSubmitHandler)?;

        let guard = AsyncGuard::new();
        let values = {
            let mut state = write_lock(&self.state, "starting submit")?;
            if state.cancel_active_guard() {
                debug!(form_id = state.id.0, "previous submission superseded");
            }
            state.active_guard = Some(guard.clone());
            state.submit_state = SubmitState::Submitting;
            state.errors = ErrorTree::Empty;
            state.submit_count = state.submit_count.saturating_add(1);
            debug!(
                form_id = state.id.0,
                fields = state.values.len(),
                attempt = state.submit_count,
                "form submit started"
            );
            state.values.clone()
        };

        let operation = guard.guard(handler(values));
        self.notify()?;

        Ok(SubmitTask {
            operation,
            guard,
            controller: self.clone(),
        })
    }

    fn settle_submit(
        &self,
        guard: &AsyncGuard,
        settlement: Settlement<SubmitResult>,
    ) -> FormResult<SubmitOutcome> {
        let outcome = {
            let mut state = write_lock(&self.state, "settling submit")?;
            let result = match settlement {
                Settlement::Delivered(result) if !guard.is_cancelled() => result,
                _ => {
                    debug!(form_id = state.id.0, "stale submit outcome discarded");
                    return Ok(SubmitOutcome::Discarded);
                }
            };
            if state
                .active_guard
                .as_ref()
                .is_some_and(|active| active.same_as(guard))
            {
                state.active_guard = None;
            }
            state.submit_state = SubmitState::Idle;

            match result {
                Ok(payload) => {
                    debug!(form_id = state.id.0, "form submit succeeded");
                    if self.options.reset_on_success {
                        state.clear();
                    }
                    SubmitOutcome::Succeeded(payload)
                }
                Err(rejection) => {
                    let errors = ErrorTree::from(rejection.errors().cloned());
                    debug!(
                        form_id = state.id.0,
                        has_errors = !errors.is_empty(),
                        "form submit failed"
                    );
                    state.errors = errors.clone();
                    SubmitOutcome::Failed(errors)
                }
            }
        };
        self.notify()?;
        Ok(outcome)
    }

    /// Clears to an empty map, not to the initial values.
    pub fn reset(&self) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "resetting form")?;
            state.clear();
            debug!(form_id = state.id.0, "form reset");
        }
        self.notify()
    }

    /// Adopts late-arriving initial values unless the user already edited.
    pub fn reconcile_initial_values(&self, initial: Option<Arc<FormValues>>) -> FormResult<bool> {
        let adopted = {
            let mut state = write_lock(&self.state, "reconciling initial values")?;
            let previous = std::mem::replace(&mut state.last_initial, initial.clone());
            let Some(initial) = initial else {
                return Ok(false);
            };
            if previous.is_some_and(|previous| Arc::ptr_eq(&previous, &initial)) {
                false
            } else if state.touched {
                debug!(form_id = state.id.0, "initial values ignored for touched form");
                false
            } else {
                state.values = (*initial).clone();
                debug!(
                    form_id = state.id.0,
                    fields = state.values.len(),
                    "initial values adopted"
                );
                true
            }
        };
        if adopted {
            self.notify()?;
        }
        Ok(adopted)
    }

    pub fn teardown(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "tearing down form")?;
        if state.cancel_active_guard() {
            debug!(form_id = state.id.0, "in-flight submission cancelled on teardown");
        }
        Ok(())
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot> {
        let mut snapshot = {
            let state = read_lock(&self.state, "creating form snapshot")?;
            FormSnapshot {
                form_id: state.id,
                values: state.values.clone(),
                errors: state.errors.clone(),
                submit_state: state.submit_state,
                submitting: state.submit_state == SubmitState::Submitting,
                submit_count: state.submit_count,
                touched: state.touched,
                is_valid: true,
            }
        };
        snapshot.is_valid = self.evaluate_validity(&snapshot.values)?;
        Ok(snapshot)
    }

    pub fn field_value(&self, name: impl AsRef<str>) -> FormResult<Option<Value>> {
        Ok(read_lock(&self.state, "reading field value")?
            .values
            .get(name.as_ref())
            .cloned())
    }

    pub fn is_field_invalid(&self, name: impl AsRef<str>) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading field errors")?
            .errors
            .is_field_invalid(name))
    }

    fn evaluate_validity(&self, values: &FormValues) -> FormResult<bool> {
        let validator = read_lock(&self.validator, "reading validator")?.clone();
        Ok(validator.is_none_or(|validator| validator(values)))
    }

    fn notify(&self) -> FormResult<()> {
        let observers = read_lock(&self.observers, "reading observers")?
            .values()
            .cloned()
            .collect::<Vec<_>>();
        if observers.is_empty() {
            return Ok(());
        }
        let snapshot = self.snapshot()?;
        for observer in observers {
            observer(&snapshot);
        }
        Ok(())
    }
}

#[must_use = "the submission only settles when the task is driven"]
pub struct SubmitTask {
    operation: Guarded<SubmitResult>,
    guard: AsyncGuard,
    controller: FormController,
}

impl SubmitTask {
    pub fn guard(&self) -> &AsyncGuard {
        &self.guard
    }
}

impl Future for SubmitTask {
    type Output = FormResult<SubmitOutcome>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.operation).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(settlement) => Poll::Ready(this.controller.settle_submit(&this.guard, settlement)),
        }
    }
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
