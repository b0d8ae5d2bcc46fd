use std::sync::Arc;
use tracing::{debug, info};

use crate::error::Result;
use crate::input::SelectedInput;
use crate::stage::{Controls, PipelineStage};

/// The chosen input file and the current pipeline stage.
///
/// Never performs I/O. The workflow owns one of these and is the only writer.
#[derive(Debug, Default)]
pub struct SelectionState {
    input: Option<Arc<SelectedInput>>,
    stage: PipelineStage,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a new input, invalidating any earlier result.
    ///
    /// On rejection the previous selection is dropped and the stage returns to `Idle`.
    pub fn select_file(&mut self, file: SelectedInput) -> Result<()> {
        match file.kind() {
            Ok(kind) => {
                info!("Selected {} ({}, {} bytes)", file.name, kind.media_type(), file.size());
                self.input = Some(Arc::new(file));
                self.stage = PipelineStage::FileSelected;
                Ok(())
            }
            Err(e) => {
                debug!("Rejected selection: {}", e);
                self.clear();
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.input = None;
        self.stage = PipelineStage::Idle;
    }

    pub fn input(&self) -> Option<&SelectedInput> {
        self.input.as_deref()
    }

    pub(crate) fn shared_input(&self) -> Option<Arc<SelectedInput>> {
        self.input.clone()
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub(crate) fn set_stage(&mut self, stage: PipelineStage) {
        self.stage = stage;
    }

    pub fn controls(&self) -> Controls {
        Controls::derive(self.stage, self.input.is_some())
    }
}
