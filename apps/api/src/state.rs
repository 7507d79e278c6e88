use crate::session::service::TailorService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Session registry plus workflow dependencies. Swap the generator behind
    /// it to change the text-generation backend.
    pub service: TailorService,
}
