use std::sync::Arc;

use tunegrab_core::{
    artwork::ArtworkFetcher, extractor::Extractor, transcoder::Transcoder, Config,
    PipelineCoordinator,
};

use crate::api::WsBroadcaster;

/// Coordinator over boxed tool implementations.
pub type Coordinator = PipelineCoordinator<dyn Extractor, dyn Transcoder, dyn ArtworkFetcher>;

/// Shared application state
pub struct AppState {
    config: Config,
    coordinator: Coordinator,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        extractor: Arc<dyn Extractor>,
        transcoder: Arc<dyn Transcoder>,
        fetcher: Arc<dyn ArtworkFetcher>,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        let coordinator =
            Coordinator::new(config.pipeline.clone(), extractor, transcoder, fetcher);
        Self {
            config,
            coordinator,
            ws_broadcaster,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
