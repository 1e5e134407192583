use seoforge_admission::AdmissionController;
use seoforge_enrich::EnrichmentOrchestrator;

pub struct AppState {
    pub orchestrator: EnrichmentOrchestrator,
    pub admission: AdmissionController,
    /// Proxy headers consulted for the client address, highest priority first.
    pub client_headers: Vec<String>,
}
