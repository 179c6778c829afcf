use super::{DispatchFuture, Dispatcher};
use crate::error::RouterError;
use crate::event::{ActionContext, OutgoingResponse};

/// Stand-in for the out-of-scope dependency container named in
/// `SPEC_FULL.md` §1 ("Dependency container — provides handler instances
/// given a key"). A host application implements this against its own DI
/// container; this crate only defines the interface `ClassDispatcher`
/// consumes.
pub trait HandlerResolver: Send + Sync {
    /// Resolves `ctor` and invokes `action` on the resulting instance with
    /// the given context, or `Ok(None)` if `ctor` falls back to zero-arg
    /// construction and the resolver has no instance to offer (the
    /// dispatcher then reports a dispatch error, since this crate cannot
    /// itself construct an arbitrary host type).
    fn invoke(
        &self,
        ctor: &str,
        action: &str,
        ctx: ActionContext<'_>,
    ) -> Result<OutgoingResponse, RouterError>;
}

/// Resolves a named class/struct through a [`HandlerResolver`] and invokes
/// one of its actions.
pub struct ClassDispatcher<'a> {
    pub ctor: &'a str,
    pub action: &'a str,
    pub resolver: &'a dyn HandlerResolver,
}

impl Dispatcher for ClassDispatcher<'_> {
    fn dispatch<'a>(&'a self, ctx: ActionContext<'a>) -> DispatchFuture<'a> {
        let result = self.resolver.invoke(self.ctor, self.action, ctx);
        Box::pin(async move { result })
    }
}
