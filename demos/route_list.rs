//! A minimal `router list`-style companion: builds a small router and
//! prints its route table, the same data `Router::dump_routes` returns,
//! formatted for a human at a terminal rather than consumed as structured
//! data by a host application.

use std::sync::Arc;

use strada::{
    definition::{HandlerDescriptor, Method, RouteDefinition},
    event::OutgoingResponse,
    RouterBuilder,
};

fn ok(_ctx: strada::event::ActionContext<'_>) -> OutgoingResponse {
    OutgoingResponse::new(200)
}

fn main() {
    let router = RouterBuilder::default()
        .scope("/api", |api| {
            api.scope("/v1", |v1| {
                v1.route(
                    RouteDefinition::leaf("/users", Method("GET".into()), HandlerDescriptor::Callable(Arc::new(ok)))
                        .named("users.index"),
                );
                v1.route(
                    RouteDefinition::leaf("/users/:id", Method("GET".into()), HandlerDescriptor::Callable(Arc::new(ok)))
                        .named("users.show"),
                );
            });
        })
        .build()
        .expect("demo route table is well-formed");

    for row in router.dump_routes() {
        println!("{row}");
    }
}
