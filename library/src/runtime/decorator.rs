//! Composable update functions.
//!
//! A slot's computation is an [`UpdateChain`]: a base action wrapped by any
//! number of decorators. Each decorator runs its side computation and then
//! hands over to the action it wraps, so the last decorator installed runs
//! first and the base always runs last. Replacing the base keeps every
//! decorator in place.

use std::fmt;
use std::sync::Arc;

use crate::error::LibraryError;
use crate::evaluation::{EvaluationContext, UpdateAction, UpdateContext};
use crate::runtime::InstanceId;

/// Side computation that runs immediately before a slot's recompute.
pub trait SlotDecorator: Send + Sync {
    fn before_update(&self, update: &mut UpdateContext<'_>) -> Result<(), LibraryError>;

    fn name(&self) -> &str {
        "decorator"
    }
}

impl<F> SlotDecorator for F
where
    F: Fn(&mut UpdateContext<'_>) -> Result<(), LibraryError> + Send + Sync,
{
    fn before_update(&self, update: &mut UpdateContext<'_>) -> Result<(), LibraryError> {
        self(update)
    }
}

/// Callback signature for [`TransformCallback`].
pub type TransformFn = dyn Fn(InstanceId, &EvaluationContext) + Send + Sync;

/// Notifies an external transform stack before the owning instance recomputes,
/// e.g. to apply an accumulated transform.
pub struct TransformCallback {
    callback: Arc<TransformFn>,
}

impl TransformCallback {
    pub fn new(callback: impl Fn(InstanceId, &EvaluationContext) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }
}

impl SlotDecorator for TransformCallback {
    fn before_update(&self, update: &mut UpdateContext<'_>) -> Result<(), LibraryError> {
        (self.callback)(update.instance_id(), update.context());
        Ok(())
    }

    fn name(&self) -> &str {
        "transform_callback"
    }
}

pub struct UpdateChain {
    base: UpdateAction,
    decorators: Vec<Arc<dyn SlotDecorator>>,
    composed: UpdateAction,
    disabled: bool,
}

impl UpdateChain {
    pub fn new(base: UpdateAction) -> Self {
        Self {
            composed: base.clone(),
            base,
            decorators: Vec::new(),
            disabled: false,
        }
    }

    /// Chain whose action leaves the value untouched.
    pub fn noop() -> Self {
        let noop: UpdateAction = Arc::new(|_: &mut UpdateContext<'_>| Ok(()));
        Self::new(noop)
    }

    pub fn set_base(&mut self, base: UpdateAction) {
        self.base = base;
        self.recompose();
    }

    pub fn push_decorator(&mut self, decorator: Arc<dyn SlotDecorator>) {
        self.decorators.push(decorator);
        self.recompose();
    }

    /// Drop every decorator, keeping the base.
    pub fn clear_decorators(&mut self) {
        self.decorators.clear();
        self.recompose();
    }

    pub fn decorator_count(&self) -> usize {
        self.decorators.len()
    }

    pub fn decorator_names(&self) -> Vec<&str> {
        self.decorators.iter().map(|d| d.name()).collect()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// The caller is responsible for invalidating the slot afterwards.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Action to run for the next recompute.
    ///
    /// While disabled this is a no-op that also keeps the slot dirty, so the
    /// cached value stays visibly stale.
    pub fn active(&self) -> UpdateAction {
        if self.disabled {
            let disabled: UpdateAction = Arc::new(|update: &mut UpdateContext<'_>| {
                update.keep_dirty();
                Ok(())
            });
            disabled
        } else {
            self.composed.clone()
        }
    }

    fn recompose(&mut self) {
        self.composed = self
            .decorators
            .iter()
            .fold(self.base.clone(), |inner, decorator| {
                let decorator = decorator.clone();
                let wrapped: UpdateAction = Arc::new(move |update: &mut UpdateContext<'_>| {
                    decorator.before_update(update)?;
                    inner(update)
                });
                wrapped
            });
    }
}

impl fmt::Debug for UpdateChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateChain")
            .field("decorators", &self.decorator_names())
            .field("disabled", &self.disabled)
            .finish()
    }
}
