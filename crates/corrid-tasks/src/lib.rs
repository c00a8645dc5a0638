//! Task dispatch and execution with correlation propagation.
//!
//! [`TaskClient`] runs the dispatch interceptors and hands envelopes to a
//! [`TaskTransport`]. [`Worker`] receives envelopes, runs the start
//! interceptors and executes the registered [`TaskHandler`] inside the
//! resulting bindings.

pub mod client;
pub mod handler;
pub mod transport;
pub mod worker;

pub use client::TaskClient;
pub use handler::{FnHandler, TaskContext, TaskHandler, handler_fn};
pub use transport::{InMemoryTransport, TaskTransport};
pub use worker::Worker;
