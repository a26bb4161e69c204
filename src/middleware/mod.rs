/*
 * Responsibility
 * - Cross-cutting layers: transport (http, cors) and per-route (auth, audit)
 */
pub mod audit;
pub mod auth;
pub mod cors;
pub mod http;
