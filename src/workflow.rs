use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::caption::CaptionSummary;
use crate::config::{Config, TranslateField};
use crate::error::{CapflowError, Result};
use crate::events::{ArtifactSink, EventKind, LogObserver, PipelineEvent, PipelineObserver};
use crate::input::SelectedInput;
use crate::language::LanguageChoice;
use crate::selection::SelectionState;
use crate::service::{
    ArtifactReference, HealthStatus, HttpPipelineService, PipelineService, ServiceError,
    TranslateInput, TranslateRequest,
};
use crate::stage::{Controls, PipelineStage, Step};

/// Result of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandle {
    pub run_id: Uuid,
    /// Server-side name of the translated caption file
    pub reference: ArtifactReference,
    /// Where the service put the extracted audio
    pub audio_path: String,
    pub languages: LanguageChoice,
    /// Local file name offered for the download
    pub suggested_name: String,
}

pub struct Workflow {
    config: Config,
    service: Arc<dyn PipelineService>,
    selection: SelectionState,
    observers: Vec<Arc<dyn PipelineObserver>>,
    artifact: Option<ArtifactHandle>,
    run_id: Option<Uuid>,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let service = HttpPipelineService::new(&config.service, config.pipeline.download_route)?
            .with_transcription(config.transcription.clone());
        Ok(Self::with_service(config, Arc::new(service)))
    }

    /// Build a workflow over any service implementation.
    pub fn with_service(config: Config, service: Arc<dyn PipelineService>) -> Self {
        Self {
            config,
            service,
            selection: SelectionState::new(),
            observers: vec![Arc::new(LogObserver)],
            artifact: None,
            run_id: None,
        }
    }

    pub fn subscribe(&mut self, observer: Arc<dyn PipelineObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn stage(&self) -> PipelineStage {
        self.selection.stage()
    }

    pub fn controls(&self) -> Controls {
        self.selection.controls()
    }

    /// The translated artifact of the last successful run, while it is still current.
    pub fn artifact(&self) -> Option<&ArtifactHandle> {
        self.artifact.as_ref()
    }

    /// Select a new input file, invalidating any finished result.
    pub fn select_file(&mut self, file: SelectedInput) -> Result<()> {
        let from = self.selection.stage();
        let name = file.name.clone();
        let result = self.selection.select_file(file);

        self.artifact = None;
        self.run_id = None;
        self.announce_transition(from);
        match &result {
            Ok(()) => self.progress(format!("Selected {}", name)),
            Err(e) => self.emit(EventKind::Failed {
                step: None,
                message: e.to_string(),
            }),
        }
        result
    }

    /// Read a file from disk and select it.
    pub async fn select_path<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = SelectedInput::from_path(path).await?;
        self.select_file(file)
    }

    pub fn clear(&mut self) {
        let from = self.selection.stage();
        self.selection.clear();
        self.artifact = None;
        self.run_id = None;
        self.announce_transition(from);
    }

    /// Run extract, transcribe, fetch-transcript and translate in order.
    ///
    /// Fails fast: the first failing step moves the stage to `Failed` and no
    /// later step is attempted. Nothing already done on the service is rolled back.
    pub async fn run_pipeline(&mut self, choice: LanguageChoice) -> Result<ArtifactHandle> {
        let stage = self.selection.stage();
        if stage.is_busy() {
            return Err(CapflowError::Precondition(format!(
                "a pipeline run is already in progress ({})",
                stage
            )));
        }
        let input = self
            .selection
            .shared_input()
            .ok_or_else(|| CapflowError::Precondition("Please select a video file".to_string()))?;
        choice.validate()?;

        let run_id = Uuid::new_v4();
        self.run_id = Some(run_id);
        self.artifact = None;
        info!(run = %run_id, "Starting pipeline for {} ({})", input.name, choice);

        match self.execute(run_id, &input, choice).await {
            Ok(handle) => {
                self.artifact = Some(handle.clone());
                self.transition(PipelineStage::Ready);
                self.progress("Subtitles generated successfully! Ready for download.");
                Ok(handle)
            }
            Err(e) => {
                self.transition(PipelineStage::Failed);
                self.emit(EventKind::Failed {
                    step: e.step(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn execute(
        &mut self,
        run_id: Uuid,
        input: &SelectedInput,
        choice: LanguageChoice,
    ) -> Result<ArtifactHandle> {
        // Step 1: extract audio
        self.transition(PipelineStage::Extracting);
        self.progress(format!("Extracting audio from {}", input.name));
        let extracted = self
            .service
            .extract_audio(input)
            .await
            .map_err(|e| stage_error(Step::Extract, e))?;
        self.progress(format!("Audio extracted to {}", extracted.extracted_audio_path));

        // Step 2: transcribe the original upload in the source language
        self.transition(PipelineStage::Transcribing);
        self.progress(format!(
            "Transcribing {} audio ({})",
            choice.source,
            choice.source.code()
        ));
        let transcribed = self
            .service
            .transcribe(input, choice.source.code())
            .await
            .map_err(|e| stage_error(Step::Transcribe, e))?;
        self.progress(
            transcribed
                .description
                .or(transcribed.message)
                .unwrap_or_else(|| "Transcription complete".to_string()),
        );

        // Step 3: fetch the transcript, then translate it
        self.transition(PipelineStage::Translating);
        self.progress("Fetching transcript");
        let transcript = self
            .service
            .fetch_transcript()
            .await
            .map_err(|e| stage_error(Step::FetchTranscript, e))?;
        CaptionSummary::inspect(&transcript).log("Transcript");

        let transcript_name = self.config.pipeline.transcript_name.clone();
        let request = TranslateRequest {
            input: match self.config.pipeline.translate_field {
                TranslateField::InputFile => TranslateInput::File {
                    name: transcript_name,
                    content: transcript,
                },
                TranslateField::InputPath => TranslateInput::Path(transcript_name),
            },
            source_language: choice.source.locale_name().to_string(),
            target_language: choice.target.locale_name().to_string(),
        };
        self.progress(format!("Translating {}", choice));
        let translated = self
            .service
            .translate(&request)
            .await
            .map_err(|e| stage_error(Step::Translate, e))?;
        self.progress(
            translated
                .description
                .clone()
                .or_else(|| translated.message.clone())
                .unwrap_or_else(|| "Translation complete".to_string()),
        );

        // Step 4: record the translated artifact
        let reference = translated
            .output_file
            .as_deref()
            .and_then(|p| Path::new(p).file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.config.pipeline.translated_name.clone());
        debug!(run = %run_id, "Translated artifact: {}", reference);

        Ok(ArtifactHandle {
            run_id,
            reference: ArtifactReference(reference),
            audio_path: extracted.extracted_audio_path,
            languages: choice,
            suggested_name: self.config.pipeline.translated_name.clone(),
        })
    }

    /// Fetch the translated caption file and hand it to `sink`.
    ///
    /// Only permitted in `Ready`; the stage returns to `Ready` afterwards, so the
    /// download may be repeated.
    pub async fn download_artifact(&mut self, sink: &dyn ArtifactSink) -> Result<Vec<u8>> {
        let stage = self.selection.stage();
        let handle = match (&self.artifact, stage.permits_download()) {
            (Some(handle), true) => handle.clone(),
            _ => return Err(CapflowError::NotReady(stage)),
        };

        self.transition(PipelineStage::Downloading);
        self.progress(format!("Downloading {}", handle.suggested_name));

        let outcome = match self.service.fetch_translated(&handle.reference).await {
            Ok(content) => {
                CaptionSummary::inspect(&content).log("Translated subtitle");
                sink.save(&handle.suggested_name, &content)
                    .await
                    .map(|()| content)
                    .map_err(|e| CapflowError::Download(e.to_string()))
            }
            Err(e) => Err(CapflowError::Download(e.to_string())),
        };

        self.transition(PipelineStage::Ready);
        match &outcome {
            Ok(content) => self.progress(format!(
                "Downloaded {} ({} bytes)",
                handle.suggested_name,
                content.len()
            )),
            Err(e) => self.emit(EventKind::Failed {
                step: None,
                message: e.to_string(),
            }),
        }
        outcome
    }

    /// Ask the service to discard intermediate files. Fire-and-forget.
    pub fn trigger_cleanup(&self) -> JoinHandle<()> {
        self.schedule_cleanup(Duration::ZERO)
    }

    /// Like [`trigger_cleanup`](Self::trigger_cleanup), after `delay`.
    pub fn schedule_cleanup(&self, delay: Duration) -> JoinHandle<()> {
        let service = Arc::clone(&self.service);
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            run_cleanup(service.as_ref()).await;
        })
    }

    /// Best-effort cleanup at session end.
    ///
    /// Returns immediately with the spawned task, or `None` when cleanup on exit is
    /// disabled or no runtime is available. Callers may await the task briefly;
    /// delivery is not guaranteed if they don't.
    pub fn end_session(self) -> Option<JoinHandle<()>> {
        if !self.config.cleanup.on_exit {
            return None;
        }
        match Handle::try_current() {
            Ok(handle) => {
                let service = Arc::clone(&self.service);
                Some(handle.spawn(async move { run_cleanup(service.as_ref()).await }))
            }
            Err(_) => {
                debug!("No async runtime at session end, skipping cleanup");
                None
            }
        }
    }

    pub async fn check_health(&self) -> Result<HealthStatus> {
        self.service
            .health()
            .await
            .map_err(|e| CapflowError::Unavailable(e.to_string()))
    }

    fn transition(&mut self, to: PipelineStage) {
        let from = self.selection.stage();
        self.selection.set_stage(to);
        self.announce_transition(from);
    }

    fn announce_transition(&self, from: PipelineStage) {
        let to = self.selection.stage();
        if from != to {
            self.emit(EventKind::StageChanged {
                from,
                to,
                controls: self.selection.controls(),
            });
        }
    }

    fn progress(&self, message: impl Into<String>) {
        self.emit(EventKind::Progress {
            stage: self.selection.stage(),
            message: message.into(),
        });
    }

    fn emit(&self, kind: EventKind) {
        let event = PipelineEvent::new(self.run_id, kind);
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }
}

fn stage_error(step: Step, error: ServiceError) -> CapflowError {
    CapflowError::Stage {
        step,
        message: error.to_string(),
    }
}

async fn run_cleanup(service: &dyn PipelineService) {
    match service.cleanup().await {
        Ok(response) => info!(
            "Cleanup requested: {}",
            response.message.unwrap_or_else(|| "ok".to_string())
        ),
        Err(e) => warn!("{}", CapflowError::CleanupWarning(e.to_string())),
    }
}
