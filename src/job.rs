//! Conversion job state machine.
//!
//! ```text
//! Idle ──select──▶ FileSelected ──begin──▶ Converting ──finish──▶ Succeeded | Failed
//!                    ▲    │                                          │
//!                    └────┴──────────────── select ◀─────────────────┘
//! ```
//!
//! Every [`ConversionJob::begin`] mints a fresh [`JobToken`]. Progress and
//! completion reports carrying any other token are ignored, so a
//! conversion abandoned by re-selecting a file cannot overwrite the state
//! of the job that replaced it.

use crate::config::ConversionConfig;
use crate::convert::convert;
use crate::dispatch::Converter;
use crate::error::ConvertError;
use crate::format::Format;
use crate::ingest::SourceFile;
use crate::output::ConvertedFile;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identity of one conversion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Idle,
    FileSelected,
    Converting,
    Succeeded,
    Failed,
}

/// A conversion from one fixed format pair, as driven by a page controller.
#[derive(Debug)]
pub struct ConversionJob {
    from: Format,
    to: Format,
    source: Option<SourceFile>,
    status: JobStatus,
    progress: u8,
    result: Option<ConvertedFile>,
    error_message: Option<String>,
    current: Option<JobToken>,
    issued: u64,
}

impl ConversionJob {
    pub fn new(from: Format, to: Format) -> Self {
        Self {
            from,
            to,
            source: None,
            status: JobStatus::Idle,
            progress: 0,
            result: None,
            error_message: None,
            current: None,
            issued: 0,
        }
    }

    /// Select (or replace) the source file. Any result, error or running
    /// attempt is discarded.
    pub fn select_file(&mut self, source: SourceFile) {
        debug!("Job {}→{}: selected '{}'", self.from, self.to, source.name);
        self.source = Some(source);
        self.status = JobStatus::FileSelected;
        self.reset_attempt();
    }

    /// Drop the selection and return to `Idle`.
    pub fn clear(&mut self) {
        self.source = None;
        self.status = JobStatus::Idle;
        self.reset_attempt();
    }

    fn reset_attempt(&mut self) {
        self.progress = 0;
        self.result = None;
        self.error_message = None;
        self.current = None;
    }

    /// Start an attempt.
    ///
    /// Fails with `Validation` when no file is selected or an attempt is
    /// already running, and with `UnsupportedConversion` when the pair has no
    /// converter; in every failure case the state is left untouched.
    pub fn begin(&mut self) -> Result<JobToken, ConvertError> {
        match self.status {
            JobStatus::Converting => {
                return Err(ConvertError::Validation("a conversion is already running".into()))
            }
            _ if self.source.is_none() => {
                return Err(ConvertError::Validation("no file selected".into()))
            }
            _ => {}
        }
        Converter::resolve(self.from, self.to)?;

        self.issued += 1;
        let token = JobToken(self.issued);
        self.status = JobStatus::Converting;
        self.reset_attempt();
        self.current = Some(token);
        Ok(token)
    }

    fn is_live(&self, token: JobToken) -> bool {
        self.status == JobStatus::Converting && self.current == Some(token)
    }

    /// Record progress for `token`. Stale tokens and regressions are ignored.
    pub fn report_progress(&mut self, token: JobToken, percent: u8) -> bool {
        if !self.is_live(token) {
            return false;
        }
        self.progress = self.progress.max(percent.min(100));
        true
    }

    /// Complete the attempt identified by `token`. Returns `false` (and
    /// changes nothing) for a stale token.
    pub fn finish(&mut self, token: JobToken, result: Result<ConvertedFile, ConvertError>) -> bool {
        if !self.is_live(token) {
            debug!("Ignoring completion of stale job {:?}", token);
            return false;
        }
        match result {
            Ok(file) => {
                self.progress = 100;
                self.result = Some(file);
                self.status = JobStatus::Succeeded;
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                self.status = JobStatus::Failed;
            }
        }
        true
    }

    /// Begin, convert the selected file and finish in one call.
    ///
    /// Live progress goes to the config's callback; the job itself records
    /// the final state.
    pub async fn run(&mut self, config: &ConversionConfig) -> Result<&ConvertedFile, ConvertError> {
        let token = self.begin()?;
        let source = self
            .source
            .clone()
            .ok_or_else(|| ConvertError::Internal("job lost its source".into()))?;

        match convert(&source, self.from, self.to, config).await {
            Ok(file) => {
                self.finish(token, Ok(file));
                self.result
                    .as_ref()
                    .ok_or_else(|| ConvertError::Internal("job result missing".into()))
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                self.status = JobStatus::Failed;
                Err(e)
            }
        }
    }

    pub fn source_format(&self) -> Format {
        self.from
    }

    pub fn target_format(&self) -> Format {
        self.to
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn source(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    /// Present exactly when the status is `Succeeded`.
    pub fn result(&self) -> Option<&ConvertedFile> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Whether the convert action should be offered.
    pub fn can_begin(&self) -> bool {
        self.source.is_some()
            && self.status != JobStatus::Converting
            && Converter::is_supported(self.from, self.to)
    }
}
