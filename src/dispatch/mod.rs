//! Dispatcher registry: picks and invokes the right dispatcher for a
//! matched route's handler descriptor, per `SPEC_FULL.md` §4.5.

mod callable;
mod class;
mod component;
mod redirect;

pub use callable::CallableDispatcher;
pub use class::{ClassDispatcher, HandlerResolver};
pub use component::ComponentDispatcher;
pub use redirect::RedirectDispatcher;

use futures_util::future::BoxFuture;

use crate::definition::HandlerDescriptor;
use crate::error::RouterError;
use crate::event::{ActionContext, OutgoingResponse};

/// The result type every dispatcher's future resolves to.
pub type DispatchResult = Result<OutgoingResponse, RouterError>;

/// A boxed, `Send` future, the same shape used throughout this crate for
/// async extension points (`crate::binder::BindingResolver`,
/// `crate::middleware::Middleware`) instead of `async-trait`, matching the
/// teacher's own boxed-future convention in its handler and middleware
/// chains.
pub type DispatchFuture<'a> = BoxFuture<'a, DispatchResult>;

/// Invokes the handler `ctx` was constructed for, producing an outgoing
/// response or a dispatch error.
///
/// Each concrete dispatcher owns exactly one arm of [`HandlerDescriptor`];
/// [`dispatch`] below is the selection function the `Router` facade calls.
pub trait Dispatcher: Send + Sync {
    /// Invokes the handler for this dispatch.
    fn dispatch<'a>(&'a self, ctx: ActionContext<'a>) -> DispatchFuture<'a>;
}

/// Selects and runs the dispatcher matching `descriptor`'s variant.
pub async fn dispatch(
    descriptor: &HandlerDescriptor,
    resolver: Option<&dyn HandlerResolver>,
    ctx: ActionContext<'_>,
) -> DispatchResult {
    match descriptor {
        HandlerDescriptor::Callable(f) => {
            CallableDispatcher { f: f.clone() }.dispatch(ctx).await
        }
        HandlerDescriptor::Class { ctor, action } => {
            let resolver = resolver.ok_or_else(|| {
                RouterError::Dispatch("class action requires a handler resolver".to_string())
            })?;
            ClassDispatcher {
                ctor,
                action: action.as_deref().unwrap_or("handle"),
                resolver,
            }
            .dispatch(ctx)
            .await
        }
        HandlerDescriptor::Component { module, lazy } => {
            ComponentDispatcher {
                module,
                lazy: *lazy,
            }
            .dispatch(ctx)
            .await
        }
        HandlerDescriptor::Redirect(target) => RedirectDispatcher { target }.dispatch(ctx).await,
    }
}
