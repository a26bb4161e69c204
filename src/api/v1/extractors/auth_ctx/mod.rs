/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Hand the authenticated context (AuthCtx) to handlers
 * - Enforce per-route roles before the handler body runs
 * - HTTP / axum specifics stay in core; plain types live in types
 *
 * Public API:
 * - AuthCtx, Role
 * - AuthCtxExtractor, Authorized<R> with R = Viewer | Manager | Admin
 */

mod core;
mod types;

pub use self::core::{Admin, AuthCtxExtractor, Authorized, Manager, RequiredRole, Viewer};
pub use self::types::{AuthCtx, Role};
