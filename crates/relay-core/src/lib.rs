//! # Relay Core
//!
//! The boundary layer of the Relay bot runtime.
//!
//! This crate holds everything the dispatch core shares with the outside
//! world, without knowing anything about routing itself:
//!
//! - **Requests**: one inbound message plus a way to answer it ([`Request`], [`Inbound`])
//! - **Adapters**: external media that produce requests ([`Adapter`], [`AdapterDescriptor`])
//! - **Dispatcher**: the entry point adapters call back into ([`Dispatcher`])
//! - **Store**: the namespaced key-value store shared by every plugin ([`Store`])
//! - **Errors**: the error taxonomy used across the workspace
//!
//! ## Data Flow
//!
//! ```text
//! ┌─────────────┐  Inbound   ┌────────────┐   call    ┌───────────┐
//! │   Adapter   │──────────▶│ Dispatcher │─────────▶│  Handler  │──▶ Store
//! │  (console)  │◀──────────└────────────┘           └───────────┘
//! └─────────────┘        Request::respond
//! ```

pub mod adapter;
pub mod downcast;
pub mod error;
pub mod request;
pub mod store;

pub use adapter::{Adapter, AdapterContext, AdapterDescriptor, BoxedAdapter, Dispatcher};
pub use downcast::AsAny;
pub use error::{
    AdapterError, AdapterResult, BoxError, DispatchError, DispatchResult, StoreError, StoreResult,
};
pub use request::{BoxedRequest, Inbound, Request};
pub use store::{Backend, JsonFileBackend, MemoryBackend, Store};

/// Prelude for common imports.
pub mod prelude {
    pub use super::adapter::{Adapter, AdapterContext, BoxedAdapter, Dispatcher};
    pub use super::error::{AdapterResult, DispatchResult, StoreResult};
    pub use super::request::{BoxedRequest, Inbound, Request};
    pub use super::store::Store;
}
