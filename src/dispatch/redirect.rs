use super::{DispatchFuture, Dispatcher};
use crate::definition::RedirectTarget;
use crate::error::RouterError;
use crate::event::{ActionContext, OutgoingResponse};

/// Materializes a [`RedirectTarget`] into a 3xx response.
///
/// A `Callable` target may itself return another `RedirectTarget`; per
/// `SPEC_FULL.md` §9 this is followed exactly one recursion deep, and
/// whatever that second evaluation produces is used as-is — even if it is
/// itself another callable descriptor. There is no further recursion and no
/// error; an uninvoked callable surviving the second evaluation simply
/// yields a bare redirect with no `Location`.
pub struct RedirectDispatcher<'a> {
    pub target: &'a RedirectTarget,
}

impl Dispatcher for RedirectDispatcher<'_> {
    fn dispatch<'a>(&'a self, ctx: ActionContext<'a>) -> DispatchFuture<'a> {
        Box::pin(async move { resolve(self.target, ctx) })
    }
}

fn resolve(target: &RedirectTarget, ctx: ActionContext<'_>) -> Result<OutgoingResponse, RouterError> {
    let first = match target {
        RedirectTarget::Location(location) => {
            return Ok(OutgoingResponse::new(302).header("Location", location.clone()))
        }
        RedirectTarget::LocationWithStatus { location, status } => {
            return Ok(OutgoingResponse::new(*status).header("Location", location.clone()))
        }
        RedirectTarget::Callable(f) => f(ctx.clone_view()),
    };

    let second = match &first {
        RedirectTarget::Callable(f) => f(ctx.clone_view()),
        _ => first,
    };

    Ok(materialize(second))
}

/// Turns a resolved `RedirectTarget` into its response, with no further
/// invocation of a `Callable` — see `resolve`'s doc comment.
fn materialize(target: RedirectTarget) -> OutgoingResponse {
    match target {
        RedirectTarget::Location(location) => OutgoingResponse::new(302).header("Location", location),
        RedirectTarget::LocationWithStatus { location, status } => {
            OutgoingResponse::new(status).header("Location", location)
        }
        RedirectTarget::Callable(_) => OutgoingResponse::new(302),
    }
}

impl<'a> ActionContext<'a> {
    /// A shallow re-borrow of this context for a second dispatcher pass
    /// (used by redirect recursion), since `ActionContext` holds only
    /// references and is cheap to reconstruct.
    fn clone_view(&self) -> ActionContext<'a> {
        ActionContext {
            event: self.event,
            route_name: self.route_name,
            params: self.params,
            query: self.query,
            body: self.body,
        }
    }
}
