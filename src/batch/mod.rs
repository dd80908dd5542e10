//! Run driver: walks the input root and feeds every file through the pipeline

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{ConversionRequest, RunOptions};
use crate::error::{ConvertError, Result};
use crate::processing::{
    enumerate, process_candidate, Candidate, Codec, CodecCapabilities, ImageCodec,
    PlannedOutputs,
};

pub mod progress;

pub use progress::*;

/// Converts every eligible file under one input root
pub struct BatchConverter {
    request: ConversionRequest,
    options: RunOptions,
    codec: Arc<dyn Codec>,
    sink: Arc<dyn OutcomeSink>,
}

impl BatchConverter {
    /// Create a converter using the `image` codec and standard output
    pub fn new(request: ConversionRequest, options: RunOptions) -> Self {
        let codec = ImageCodec::new(request.target, CodecCapabilities::detect());
        Self {
            request,
            options,
            codec: Arc::new(codec),
            sink: Arc::new(ConsoleSink),
        }
    }

    /// Replace the codec adapter
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Replace the output sink
    pub fn with_sink(mut self, sink: Arc<dyn OutcomeSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Process the whole tree, print one line per file and the summary.
    ///
    /// Only a missing or unreadable input root (or a worker pool that
    /// cannot start) is an error; per-file problems end up in the summary.
    pub fn run(&self) -> Result<RunSummary> {
        self.options.validate()?;

        let start_time = Instant::now();
        let files = enumerate(&self.request.input_root, self.request.recursive)?;
        let tracker = SummaryTracker::new();
        let planned = self.options.dry_run.then(PlannedOutputs::new);
        let workers = self.options.worker_count();

        info!(
            "Converting {:?} to {} (output: {:?}, recursive: {}, workers: {})",
            self.request.input_root,
            self.request.target.name(),
            self.request.output_root,
            self.request.recursive,
            workers
        );

        if workers <= 1 {
            for candidate in files {
                self.process(&candidate, &tracker, planned.as_ref());
            }
        } else {
            let candidates: Vec<Candidate> = files.collect();
            debug!("Dispatching {} files to {} workers", candidates.len(), workers);

            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| ConvertError::pool(e.to_string()))?;
            pool.install(|| {
                candidates
                    .par_iter()
                    .for_each(|candidate| self.process(candidate, &tracker, planned.as_ref()));
            });
        }

        let summary = tracker.summary();
        self.report_summary(&summary);

        info!(
            "Finished {} files in {:.2}s",
            summary.total(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(summary)
    }

    fn process(
        &self,
        candidate: &Candidate,
        tracker: &SummaryTracker,
        planned: Option<&PlannedOutputs>,
    ) {
        let processed = process_candidate(candidate, &self.request, self.codec.as_ref(), planned);
        tracker.record(&processed.outcome);
        self.sink.outcome(&processed);
    }

    fn report_summary(&self, summary: &RunSummary) {
        if self.options.json {
            match serde_json::to_string(summary) {
                Ok(json) => self.sink.line(&json),
                Err(e) => debug!("Failed to serialize summary: {}", e),
            }
            return;
        }

        self.sink.line("");
        for line in summary.lines(self.options.dry_run) {
            self.sink.line(&line);
        }
    }
}
