use super::{DispatchFuture, Dispatcher};
use crate::event::{ActionContext, OutgoingResponse, ResponseContent};
use serde_json::json;

/// Returns the component descriptor itself as the response payload; the
/// caller (the transport layer, out of scope per `SPEC_FULL.md` §1) renders
/// it. `lazy=true` routes are modeled identically here since there is no
/// actual lazy-loader to await without a host-supplied component registry —
/// the `lazy` flag is carried through in the payload for the caller to act
/// on.
pub struct ComponentDispatcher<'a> {
    pub module: &'a str,
    pub lazy: bool,
}

impl Dispatcher for ComponentDispatcher<'_> {
    fn dispatch<'a>(&'a self, _ctx: ActionContext<'a>) -> DispatchFuture<'a> {
        let payload = json!({ "module": self.module, "lazy": self.lazy });
        let response = OutgoingResponse {
            status_code: 200,
            headers: Default::default(),
            content: Some(ResponseContent::Json(payload)),
        };
        Box::pin(async move { Ok(response) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEvent;
    use std::collections::HashMap;

    #[tokio::test]
    async fn returns_the_component_descriptor_as_payload() {
        let dispatcher = ComponentDispatcher {
            module: "UserCard",
            lazy: true,
        };
        let event = TestEvent::new("GET", "/a");
        let params = HashMap::new();
        let query = HashMap::new();
        let body = event.body().clone();
        let ctx = ActionContext {
            event: &event,
            route_name: None,
            params: &params,
            query: &query,
            body: &body,
        };
        let response = dispatcher.dispatch(ctx).await.unwrap();
        match response.content {
            Some(ResponseContent::Json(value)) => {
                assert_eq!(value["module"], "UserCard");
                assert_eq!(value["lazy"], true);
            }
            _ => panic!("expected json content"),
        }
    }
}
