pub mod auth_ctx;

pub use auth_ctx::{Admin, AuthCtx, AuthCtxExtractor, Authorized, Manager, Role, Viewer};
