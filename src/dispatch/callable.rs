use std::sync::Arc;

use super::{DispatchFuture, Dispatcher};
use crate::event::{ActionContext, OutgoingResponse};

/// Invokes a bare function/closure handler directly with the action
/// context.
pub struct CallableDispatcher {
    pub f: Arc<dyn Fn(ActionContext<'_>) -> OutgoingResponse + Send + Sync>,
}

impl Dispatcher for CallableDispatcher {
    fn dispatch<'a>(&'a self, ctx: ActionContext<'a>) -> DispatchFuture<'a> {
        let response = (self.f)(ctx);
        Box::pin(async move { Ok(response) })
    }
}
