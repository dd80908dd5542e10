//! Per-file conversion pipeline: extension filter, path resolver, codec

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::config::ConversionRequest;
use crate::error::ConvertError;

pub mod codec;
pub mod discovery;
pub mod formats;
pub mod paths;

pub use codec::*;
pub use discovery::*;
pub use formats::*;
pub use paths::*;

/// Why a file was left alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Extension is not on the allow-list
    Unsupported,
    /// The planned output path is already taken
    OutputExists { output: PathBuf },
}

/// Terminal state of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Converted { output: PathBuf },
    /// Dry run: the file would have been converted
    Planned { output: PathBuf },
    Skipped(SkipReason),
    Failed { reason: String },
}

/// A file together with what happened to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFile {
    pub input: PathBuf,
    pub outcome: FileOutcome,
}

impl fmt::Display for ProcessedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let input = self.input.display();
        match &self.outcome {
            FileOutcome::Converted { output } => {
                write!(f, "Converted: {} -> {}", input, output.display())
            }
            FileOutcome::Planned { output } => {
                write!(f, "Would convert: {} -> {}", input, output.display())
            }
            FileOutcome::Skipped(SkipReason::Unsupported) => {
                write!(f, "Skipping: {} (unsupported file type)", input)
            }
            FileOutcome::Skipped(SkipReason::OutputExists { output }) => write!(
                f,
                "Skipping: {} (output file {} already exists)",
                input,
                output.display()
            ),
            FileOutcome::Failed { reason } => write!(f, "Error converting {}: {}", input, reason),
        }
    }
}

/// Output paths claimed so far by a dry run.
///
/// Nothing is written during a dry run, so two inputs that resolve to the
/// same output would both look free on disk.
#[derive(Debug, Default)]
pub struct PlannedOutputs {
    claimed: Mutex<HashSet<PathBuf>>,
}

impl PlannedOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `output`; false if an earlier file already planned it
    pub fn claim(&self, output: &Path) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(output.to_path_buf())
    }
}

/// Run one candidate through filter, resolver and codec.
///
/// With `dry_run` set nothing is written; the candidate's output is claimed
/// in the registry instead. Never returns an error: every failure becomes a
/// `FileOutcome`.
pub fn process_candidate(
    candidate: &Candidate,
    request: &ConversionRequest,
    codec: &dyn Codec,
    dry_run: Option<&PlannedOutputs>,
) -> ProcessedFile {
    let outcome = resolve_outcome(candidate, request, codec, dry_run);
    debug!("{:?}: {:?}", candidate.path, outcome);
    ProcessedFile {
        input: candidate.path.clone(),
        outcome,
    }
}

fn resolve_outcome(
    candidate: &Candidate,
    request: &ConversionRequest,
    codec: &dyn Codec,
    dry_run: Option<&PlannedOutputs>,
) -> FileOutcome {
    if classify_extension(&candidate.extension) == ExtensionClass::SkipUnsupported {
        return FileOutcome::Skipped(SkipReason::Unsupported);
    }

    let plan = match plan_output(candidate, request) {
        Ok(plan) => plan,
        Err(e) => return FileOutcome::Failed { reason: e.to_string() },
    };

    if plan.output_exists() {
        return FileOutcome::Skipped(SkipReason::OutputExists {
            output: plan.output_path,
        });
    }

    if let Some(planned) = dry_run {
        if !planned.claim(&plan.output_path) {
            return FileOutcome::Skipped(SkipReason::OutputExists {
                output: plan.output_path,
            });
        }
        return FileOutcome::Planned {
            output: plan.output_path,
        };
    }

    let result = plan
        .ensure_directories()
        .and_then(|()| codec.convert(&candidate.path, &plan.output_path));

    match result {
        Ok(()) => FileOutcome::Converted {
            output: plan.output_path,
        },
        // Lost a race with another worker or process
        Err(ConvertError::OutputExists(output)) => {
            FileOutcome::Skipped(SkipReason::OutputExists { output })
        }
        Err(e) => FileOutcome::Failed { reason: e.to_string() },
    }
}
