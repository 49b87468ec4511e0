//! Retrieval source routing and context fusion for Wayfinder.
//!
//! A [`RoutingRequest`] names a query and a [`RetrievalMode`]. The
//! [`SourceRouter`] turns it into a [`RoutingDecision`], and the
//! [`ContextFusionService`] consults the chosen sources in parallel and merges
//! their text into a [`FusedContext`].
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use wayfinder_context::{
//!     ContextFusionService, RetrievalMode, RoutingRequest, UnwiredInternalProvider, UnwiredWebSource,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = ContextFusionService::new(Arc::new(UnwiredInternalProvider), Arc::new(UnwiredWebSource));
//! let request = RoutingRequest::new("weather today", RetrievalMode::Hybrid)?.with_user_allows_web(false);
//! match service.resolve(&request).await {
//!     Ok(context) => println!("{}", context.combined),
//!     Err(failure) => eprintln!("{}", failure),
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fusion;
pub mod internal;
pub mod router;
pub mod web;

pub use error::{ContextResolutionFailed, InternalProviderError, RoutingError, WebSearchError};
pub use fusion::{ContextFusionService, FusedContext};
pub use internal::{
    create_internal_provider, HttpInternalProvider, InternalContextProvider,
    UnwiredInternalProvider,
};
pub use router::{RetrievalMode, RoutingDecision, RoutingRequest, SourceRouter};
pub use web::{DirectWebSource, QueuedWebSource, UnwiredWebSource, WebContextSource};
