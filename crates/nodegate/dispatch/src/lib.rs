//! Nodegate Workflow Dispatcher
//!
//! Starts long-running host-platform workflows, gives each one a handle,
//! and keeps those handles findable by run id until the workflow finishes.
//!
//! ## Components
//!
//! - [`WorkflowFactoryRegistry`] - builds workflow values from descriptors,
//!   validating parameters against each type's declared schema
//! - [`HostPlatform`] - the gateway that actually starts workflows
//!   (in-process or over RPC; supplied by the caller)
//! - [`WorkflowDispatcher`] - `initiate` / `lookup`, owns the registry of
//!   active handles
//! - [`WorkflowHandle`] - identity, start time, a [`ResultSlot`] and a
//!   [`ProgressFeed`]
//!
//! ## Delivery guarantees
//!
//! - The result slot resolves exactly once and replays its value to every
//!   observer, however late.
//! - Progress is live only: a subscriber sees what is emitted after it
//!   subscribed, in emission order.
//! - A handle leaves the registry only after its result has resolved.
//! - Construction and host-rejection errors are returned by `initiate`;
//!   everything that happens after the host accepted the workflow arrives
//!   through the result slot.
//!
//! ## Usage
//!
//! ```no_run
//! use nodegate_dispatch::{WorkflowDispatcher, WorkflowFactoryRegistry, HostPlatform};
//! use nodegate_types::{ParamSchema, ParamSpec, ParamType, WorkflowDescriptor};
//! use std::sync::Arc;
//!
//! # async fn example(host: Arc<dyn HostPlatform>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut factories = WorkflowFactoryRegistry::new();
//! factories.register_plain(
//!     "com.example.IssueTokens",
//!     ParamSchema::new(vec![ParamSpec::required("quantity", ParamType::Integer)])?,
//!     true,
//! )?;
//!
//! let dispatcher = WorkflowDispatcher::new(host, factories);
//! let handle = dispatcher
//!     .initiate(
//!         &WorkflowDescriptor::new("com.example.IssueTokens")
//!             .with_param("quantity", 100)
//!             .with_progress(true),
//!     )
//!     .await?;
//!
//! let mut progress = handle.progress();
//! while let Some(event) = progress.next().await {
//!     println!("{}", event.step);
//! }
//! let outcome = handle.outcome().await;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod factory;
pub mod handle;
pub mod host;
pub mod progress;
pub mod result;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports
pub use config::DispatcherConfig;
pub use dispatcher::WorkflowDispatcher;
pub use error::{ConstructionFailure, DispatchError, HostError, RegistrationError, Result};
pub use factory::{FactoryFn, WorkflowFactoryRegistry, WorkflowInstance};
pub use handle::WorkflowHandle;
pub use host::{HostPlatform, NativeCompletion, NativeProgress, NativeWorkflow};
pub use progress::{ProgressFeed, ProgressSubscription};
pub use result::{AlreadyResolved, ResultSlot};
