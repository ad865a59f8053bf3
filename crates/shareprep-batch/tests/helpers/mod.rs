//! Test helpers: build a `SharePipeline` around stub collaborators.
//!
//! Run from workspace root: `cargo test -p shareprep-batch`.

#![allow(dead_code)]

pub mod fixtures;
pub mod stubs;

use std::sync::Arc;

use futures::StreamExt;
use shareprep_batch::{PreparedBatch, SharePipeline};
use shareprep_core::{BatchState, PipelineConfig, PrepareError};
use shareprep_processing::{
    Collaborators, GifConverter, MapLinkResolver, NoPdfPreview, PresetVideoConverter,
};

use stubs::{FailingGifConverter, NoWaveform, StubStore, StubUploader};

pub struct TestPipeline {
    pub pipeline: SharePipeline,
    pub uploader: Arc<StubUploader>,
    pub store: Arc<StubStore>,
}

pub fn setup_pipeline(uploader: StubUploader) -> TestPipeline {
    setup_pipeline_with(uploader, Arc::new(FailingGifConverter))
}

pub fn setup_pipeline_with(
    uploader: StubUploader,
    gif_converter: Arc<dyn GifConverter>,
) -> TestPipeline {
    let uploader = Arc::new(uploader);
    let store = Arc::new(StubStore::default());
    let collaborators = Collaborators {
        uploader: uploader.clone(),
        gif_converter,
        video_converter: Arc::new(PresetVideoConverter),
        waveform_extractor: Arc::new(NoWaveform),
        location_resolver: Arc::new(MapLinkResolver),
        pdf_thumbnailer: Arc::new(NoPdfPreview),
    };

    TestPipeline {
        pipeline: SharePipeline::new(PipelineConfig::default(), collaborators, store.clone()),
        uploader,
        store,
    }
}

pub async fn collect_states(batch: PreparedBatch) -> Vec<Result<BatchState, PrepareError>> {
    batch.collect().await
}
