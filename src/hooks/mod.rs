//! Named before / error / after pipelines.
//!
//! A [`HookCollection`] maps a hook name to three ordered callback lists and
//! runs an operation through them:
//!
//! ```text
//! before[0] ─► before[1] ─► … ─► operation ─┬─ Ok ──────────────► after[0] ─► after[1] ─► …
//!                                           └─ Err ─► error[0] ─► error[1] ─► …
//!                                                     (Recover ─► after hooks, Raise ─► Err)
//! ```
//!
//! Registration takes a short write lock. [`run`](HookCollection::run)
//! snapshots the callback lists under a read lock and releases it before the
//! first `.await`, so hooks may register further hooks and concurrent runs
//! never block each other.
//!
//! # Examples
//!
//! ```
//! use cmskit::{HookCollection, Rescue};
//!
//! # tokio_test::block_on(async {
//! let hooks: HookCollection<u32, u32, String> = HookCollection::new();
//! hooks.before("double", |n| async move { Ok(n * 2) });
//! hooks.error("double", |e| async move { Rescue::Forward(format!("wrapped: {e}")) });
//!
//! let result = hooks.run("double", |n| async move { Ok(n + 1) }, 4).await;
//! assert_eq!(result, Ok(9));
//! # });
//! ```

use futures::future::{BoxFuture, FutureExt};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// What an `error` callback decides to do with a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Rescue<R, E> {
    /// Replace the failure with a result. Remaining error callbacks are
    /// skipped and the `after` callbacks run.
    Recover(R),
    /// Fail the run with this error. Remaining error callbacks are skipped.
    Raise(E),
    /// Hand this error (possibly a replacement) to the next error callback.
    Forward(E),
}

type BeforeFn<O, E> = Arc<dyn Fn(O) -> BoxFuture<'static, Result<O, E>> + Send + Sync>;
type ErrorFn<R, E> = Arc<dyn Fn(E) -> BoxFuture<'static, Rescue<R, E>> + Send + Sync>;
type AfterFn<O, R, E> = Arc<dyn Fn(R, O) -> BoxFuture<'static, Result<(), E>> + Send + Sync>;

struct Registry<O, R, E> {
    before: Vec<BeforeFn<O, E>>,
    error: Vec<ErrorFn<R, E>>,
    after: Vec<AfterFn<O, R, E>>,
}

impl<O, R, E> Default for Registry<O, R, E> {
    fn default() -> Self {
        Self {
            before: Vec::new(),
            error: Vec::new(),
            after: Vec::new(),
        }
    }
}

impl<O, R, E> Clone for Registry<O, R, E> {
    fn clone(&self) -> Self {
        Self {
            before: self.before.clone(),
            error: self.error.clone(),
            after: self.after.clone(),
        }
    }
}

impl<O, R, E> Registry<O, R, E> {
    fn len(&self) -> usize {
        self.before.len() + self.error.len() + self.after.len()
    }
}

/// Async middleware around named operations.
///
/// `O` is the options value threaded through the `before` callbacks, `R` the
/// operation's result and `E` its error.
pub struct HookCollection<O, R, E> {
    registry: RwLock<HashMap<String, Registry<O, R, E>>>,
}

impl<O, R, E> Default for HookCollection<O, R, E> {
    fn default() -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
        }
    }
}

impl<O, R, E> fmt::Debug for HookCollection<O, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.read();
        let mut map = f.debug_map();
        for (name, hooks) in registry.iter() {
            map.entry(
                name,
                &format_args!(
                    "before: {}, error: {}, after: {}",
                    hooks.before.len(),
                    hooks.error.len(),
                    hooks.after.len()
                ),
            );
        }
        map.finish()
    }
}

impl<O, R, E> HookCollection<O, R, E>
where
    O: Clone + Send + 'static,
    R: Clone + Send + 'static,
    E: Send + 'static,
{
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback that runs before the operation.
    ///
    /// It receives the options by value and returns them, possibly modified;
    /// later callbacks and the operation see the modified value.
    pub fn before<F, Fut>(&self, name: &str, hook: F) -> &Self
    where
        F: Fn(O) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
    {
        let hook: BeforeFn<O, E> = Arc::new(move |options| hook(options).boxed());
        self.registry
            .write()
            .entry(name.to_string())
            .or_default()
            .before
            .push(hook);
        self
    }

    /// Register a callback that runs when the operation (or a `before`
    /// callback) fails.
    pub fn error<F, Fut>(&self, name: &str, hook: F) -> &Self
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Rescue<R, E>> + Send + 'static,
    {
        let hook: ErrorFn<R, E> = Arc::new(move |error| hook(error).boxed());
        self.registry
            .write()
            .entry(name.to_string())
            .or_default()
            .error
            .push(hook);
        self
    }

    /// Register a callback that runs after a successful (or recovered)
    /// operation. Its `Ok` value is discarded; an `Err` fails the run.
    pub fn after<F, Fut>(&self, name: &str, hook: F) -> &Self
    where
        F: Fn(R, O) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        let hook: AfterFn<O, R, E> = Arc::new(move |result, options| hook(result, options).boxed());
        self.registry
            .write()
            .entry(name.to_string())
            .or_default()
            .after
            .push(hook);
        self
    }

    /// Whether any callback is registered under `name`.
    pub fn has_hooks(&self, name: &str) -> bool {
        self.len(name) > 0
    }

    /// Number of callbacks registered under `name`, across all three kinds.
    pub fn len(&self, name: &str) -> usize {
        self.registry.read().get(name).map_or(0, Registry::len)
    }

    /// Run `operation` through the callbacks registered under `name`.
    ///
    /// With nothing registered this is just `operation(options)`.
    pub async fn run<F, Fut>(&self, name: &str, operation: F, options: O) -> Result<R, E>
    where
        F: FnOnce(O) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let hooks = self.registry.read().get(name).cloned().unwrap_or_default();

        let mut options = options;
        let mut failure = None;
        for hook in &hooks.before {
            match hook(options.clone()).await {
                Ok(next) => options = next,
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }

        let outcome = match failure {
            Some(error) => Err(error),
            None => operation(options.clone()).await,
        };

        let result = match outcome {
            Ok(result) => result,
            Err(error) => rescue(&hooks.error, error).await?,
        };

        for hook in &hooks.after {
            hook(result.clone(), options.clone()).await?;
        }

        Ok(result)
    }
}

async fn rescue<R, E>(hooks: &[ErrorFn<R, E>], error: E) -> Result<R, E> {
    let mut error = error;
    for hook in hooks {
        match hook(error).await {
            Rescue::Recover(result) => return Ok(result),
            Rescue::Raise(raised) => return Err(raised),
            Rescue::Forward(forwarded) => error = forwarded,
        }
    }
    Err(error)
}
