//! Assembles and runs the middleware pipeline around the terminal dispatch
//! step, per `SPEC_FULL.md` §4.6.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use log::trace;

use crate::definition::MiddlewareRef;
use crate::error::RouterError;
use crate::event::{ActionContext, OutgoingResponse};

/// The continuation a middleware invokes to proceed to the next pipe (or,
/// at the end of the chain, the terminal dispatcher).
pub type Next<'a> = Box<dyn FnOnce(ActionContext<'a>) -> MiddlewareFuture<'a> + Send + 'a>;

/// A boxed future resolving to a response or a pipeline error, matching
/// this crate's boxed-future convention for async extension points.
pub type MiddlewareFuture<'a> = BoxFuture<'a, Result<OutgoingResponse, RouterError>>;

/// One pipe in the pipeline: may short-circuit with a response, or call
/// `next` to continue.
pub trait Middleware: Send + Sync {
    /// Stable identity, matched against [`MiddlewareRef::id`] for ordering
    /// and exclusion.
    fn id(&self) -> u64;

    /// Runs this pipe. Implementations decide whether to call `next` or
    /// short-circuit by simply not calling it.
    fn call<'a>(&'a self, ctx: ActionContext<'a>, next: Next<'a>) -> MiddlewareFuture<'a>;
}

/// One registered pipe plus the priority it was registered with, which may
/// differ per-route from the pipe's own declared default (mirroring
/// `MiddlewareRef::priority` carrying the override).
struct Entry {
    middleware: Arc<dyn Middleware>,
    reference: MiddlewareRef,
    order: usize,
}

/// An assembled, ordered pipeline for one dispatch.
pub struct Pipeline {
    entries: Vec<Entry>,
}

impl Pipeline {
    /// Assembles `global ⊎ route.middleware \ route.exclude_middleware`,
    /// sorted by `(priority asc, insertion order asc)`.
    pub fn assemble(
        global: &[(Arc<dyn Middleware>, MiddlewareRef)],
        route_middleware: &[MiddlewareRef],
        route_exclusions: &[u64],
        registry: &dyn Fn(u64) -> Option<Arc<dyn Middleware>>,
    ) -> Pipeline {
        let excluded: HashSet<u64> = route_exclusions.iter().copied().collect();
        let mut entries = Vec::new();
        let mut order = 0usize;

        for (middleware, reference) in global {
            if excluded.contains(&reference.id) {
                continue;
            }
            entries.push(Entry {
                middleware: middleware.clone(),
                reference: reference.clone(),
                order,
            });
            order += 1;
        }

        for reference in route_middleware {
            if excluded.contains(&reference.id) {
                continue;
            }
            if entries.iter().any(|e| e.reference.id == reference.id) {
                continue;
            }
            if let Some(middleware) = registry(reference.id) {
                entries.push(Entry {
                    middleware,
                    reference: reference.clone(),
                    order,
                });
                order += 1;
            }
        }

        entries.sort_by_key(|e| (e.reference.priority, e.order));
        Pipeline { entries }
    }

    /// An empty pipeline; dispatch proceeds straight to the terminal step.
    pub fn empty() -> Pipeline {
        Pipeline {
            entries: Vec::new(),
        }
    }

    /// Runs the assembled pipes in order, then `terminal`, via a recursive
    /// continuation chain.
    pub fn run<'a, F>(&'a self, ctx: ActionContext<'a>, terminal: F) -> MiddlewareFuture<'a>
    where
        F: FnOnce(ActionContext<'a>) -> MiddlewareFuture<'a> + Send + 'a,
    {
        run_from(&self.entries, 0, ctx, Box::new(terminal))
    }
}

fn run_from<'a>(
    entries: &'a [Entry],
    index: usize,
    ctx: ActionContext<'a>,
    terminal: Next<'a>,
) -> MiddlewareFuture<'a> {
    match entries.get(index) {
        None => terminal(ctx),
        Some(entry) => {
            trace!("running middleware id={} priority={}", entry.reference.id, entry.reference.priority);
            let next: Next<'a> = Box::new(move |ctx| run_from(entries, index + 1, ctx, terminal));
            entry.middleware.call(ctx, next)
        }
    }
}
