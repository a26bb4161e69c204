pub mod factory;
pub mod gate;
pub mod identity;
pub mod introspection;
pub mod token_cache;

pub use factory::build_token_gate;
pub use gate::{GateOutcome, IdentitySource, Rejection, TokenGate, TtlPolicy};
pub use identity::IdentityRecord;
pub use introspection::IntrospectionClient;
pub use token_cache::TokenCache;
