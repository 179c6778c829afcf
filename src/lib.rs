//! A routing and dispatch engine: declarative route definitions compiled
//! into a match tree, with pluggable matchers, parameter binding,
//! middleware pipelines, and reverse URL generation.
//!
//! The entry point is [`router::Router`], built via [`router::RouterBuilder`].
//! See `SPEC_FULL.md` in the repository root for the full design.

pub mod binder;
pub mod collection;
pub mod compiler;
pub mod definition;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod matcher;
pub mod middleware;
pub mod normalizer;
pub mod route;
pub mod router;
pub mod segment;
pub mod state;
pub mod urlgen;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::RouterError;
pub use event::{ActionContext, Body, IncomingEvent, OutgoingResponse, ResponseContent};
pub use router::{Router, RouterBuilder, RouterConfig};
