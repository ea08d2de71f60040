//! Request-scoped context carried between pipeline stages.
//!
//! Both values are attached to the request as extensions: created once by
//! their producing stage, read-only afterwards, and dropped with the
//! request. No pipeline stage reaches for process-wide state.

use std::sync::Arc;

/// The resource key extracted from the route, carried for the remainder of
/// the request. Always non-empty once inserted.
#[derive(Debug, Clone)]
pub struct ResourceKey(pub String);

/// The permission patterns granted by the authenticated token.
///
/// Defaults to an empty grant list, which authorizes nothing.
#[derive(Debug, Clone, Default)]
pub struct Permissions(pub Arc<Vec<String>>);
