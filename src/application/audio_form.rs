//! Audio item form controller
//!
//! Maps operator actions onto the recorder, preview manager, uploader and
//! document store, keeping the form state machine and error flags in step.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::audio_item::{
    AudioItem, ErrorFlags, Level, OptionsError, StoredAudioItem, ValidationErrors,
    AUDIO_COLLECTION, MAX_OPTIONS, MIN_OPTIONS,
};
use crate::domain::form::{Activity, FormPhase, FormStateMachine, FormTransitionError};
use crate::domain::recording::{Duration, EncodingId, PendingAudioBuffer, RecorderState};

use super::ports::{DocumentStore, Microphone, ObjectStore, PersistenceError};
use super::preview::{PreviewError, PreviewHandle, PreviewManager};
use super::recorder::{Recorder, RecorderError};
use super::uploader::{LocalFile, UploadContext, UploadError, UploadResult, UploadSource, Uploader};

/// Errors surfaced to the operator
#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Recording(#[from] RecorderError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Failed to load the item: {0}")]
    LoadFailed(PersistenceError),

    #[error("Failed to save the item: {0}")]
    PersistenceFailed(#[from] PersistenceError),

    #[error(transparent)]
    Preview(#[from] PreviewError),

    #[error("There must be at least {} options", MIN_OPTIONS)]
    TooFewOptions,

    #[error("No more than {} options are allowed", MAX_OPTIONS)]
    TooManyOptions,

    #[error("There is no option at index {index} (the item has {len} options)")]
    OptionOutOfRange { index: usize, len: usize },

    #[error("An upload is already in progress")]
    UploadInProgress,

    #[error("Cannot do that while {0}")]
    Busy(Activity),

    #[error("There is no recording to upload")]
    NothingToUpload,

    #[error("Audio item not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    InvalidPhase(#[from] FormTransitionError),
}

impl From<OptionsError> for FormError {
    fn from(err: OptionsError) -> Self {
        match err {
            OptionsError::TooFew => Self::TooFewOptions,
            OptionsError::TooMany => Self::TooManyOptions,
            OptionsError::OutOfRange { index, len } => Self::OptionOutOfRange { index, len },
            // only raised when building a sequence, never by an edit
            OptionsError::MultipleCorrect => {
                let mut errors = ValidationErrors::new();
                errors.push(crate::domain::audio_item::FieldError::CorrectOption);
                Self::Validation(errors)
            }
        }
    }
}

/// A stopped recording waiting to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSummary {
    pub encoding: EncodingId,
    pub size_bytes: u64,
    pub duration: Duration,
    pub preview_path: PathBuf,
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub id: String,
    /// `true` for a new document, `false` for an update
    pub created: bool,
}

/// Read-only view of the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    pub phase: FormPhase,
    pub activity: Activity,
    pub existing_id: Option<String>,
    pub item: AudioItem,
    pub errors: ErrorFlags,
    pub pending: Option<PendingSummary>,
}

struct PendingRecording {
    buffer: PendingAudioBuffer,
    preview: PreviewHandle,
}

impl PendingRecording {
    fn summary(&self) -> PendingSummary {
        PendingSummary {
            encoding: self.buffer.encoding(),
            size_bytes: self.buffer.size_bytes(),
            duration: self.buffer.duration(),
            preview_path: self.preview.path().to_path_buf(),
        }
    }
}

#[derive(Default)]
struct FormModel {
    existing_id: Option<String>,
    item: AudioItem,
    errors: ErrorFlags,
    machine: FormStateMachine,
    pending: Option<PendingRecording>,
}

impl FormModel {
    fn ensure_idle(&self) -> Result<(), FormError> {
        match self.machine.activity() {
            Activity::Idle => Ok(()),
            Activity::Uploading => Err(FormError::UploadInProgress),
            busy => Err(FormError::Busy(busy)),
        }
    }

    fn begin(&mut self, activity: Activity) -> Result<(), FormError> {
        self.ensure_idle()?;
        self.machine.begin_activity(activity)?;
        Ok(())
    }

    /// Edit that touches the audio source; refused while capturing or uploading
    fn edit_audio(&mut self) -> Result<(), FormError> {
        self.ensure_idle()?;
        self.machine.edit_audio()?;
        Ok(())
    }
}

/// Ends `activity` when dropped, unless another one has taken its place
struct ActivityGuard<'a> {
    model: &'a Mutex<FormModel>,
    activity: Activity,
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        self.model.lock().machine.finish_activity(self.activity);
    }
}

/// Controller for one audio item form instance
pub struct AudioFormController<M, S, D>
where
    M: Microphone,
    S: ObjectStore,
    D: DocumentStore,
{
    recorder: Recorder<M>,
    uploader: Uploader<S>,
    previews: PreviewManager,
    documents: D,
    model: Mutex<FormModel>,
}

impl<M, S, D> AudioFormController<M, S, D>
where
    M: Microphone,
    S: ObjectStore,
    D: DocumentStore,
{
    /// Create a controller for a new, empty item
    pub fn new(microphone: M, store: S, documents: D, previews: PreviewManager) -> Self {
        Self {
            recorder: Recorder::new(microphone),
            uploader: Uploader::new(store),
            previews,
            documents,
            model: Mutex::new(FormModel::default()),
        }
    }

    /// Hydrate the form from an existing document so save updates it.
    ///
    /// Only allowed before any edit.
    pub async fn load(&self, id: &str) -> Result<(), FormError> {
        {
            let model = self.model.lock();
            if model.machine.phase() != FormPhase::Clean {
                return Err(FormTransitionError {
                    phase: model.machine.phase(),
                    activity: model.machine.activity(),
                    action: "load an item".to_string(),
                }
                .into());
            }
        }

        let stored = self
            .documents
            .get(AUDIO_COLLECTION, id)
            .await
            .map_err(FormError::LoadFailed)?
            .ok_or_else(|| FormError::NotFound(id.to_string()))?;
        self.hydrate(stored);
        Ok(())
    }

    /// Replace the form contents with a stored item
    pub fn hydrate(&self, stored: StoredAudioItem) {
        let mut model = self.model.lock();
        debug!(id = %stored.id, "hydrating form");
        model.item = AudioItem::from_record(stored.record);
        model.existing_id = Some(stored.id);
        model.errors = ErrorFlags::default();
    }

    pub fn snapshot(&self) -> FormSnapshot {
        let model = self.model.lock();
        FormSnapshot {
            phase: model.machine.phase(),
            activity: model.machine.activity(),
            existing_id: model.existing_id.clone(),
            item: model.item.clone(),
            errors: model.errors.clone(),
            pending: model.pending.as_ref().map(PendingRecording::summary),
        }
    }

    pub fn recorder_state(&self) -> RecorderState {
        self.recorder.state()
    }

    /// Elapsed time of the current recording
    pub fn elapsed(&self) -> Duration {
        self.recorder.elapsed()
    }

    pub fn encoding(&self) -> EncodingId {
        self.recorder.encoding()
    }

    /// Path of the live preview, if a recording is pending
    pub fn preview_path(&self) -> Option<PathBuf> {
        let model = self.model.lock();
        let pending = model.pending.as_ref()?;
        self.previews.resolve(pending.preview.id())
    }

    /// Number of preview files still alive
    pub fn live_previews(&self) -> usize {
        self.previews.live_count()
    }

    // Field edits: clear the matching flag, never raise one

    pub fn set_level(&self, level: Level) -> Result<(), FormError> {
        let mut model = self.model.lock();
        model.machine.edit()?;
        model.item.level = level;
        Ok(())
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) -> Result<(), FormError> {
        let prompt = prompt.into();
        let mut model = self.model.lock();
        model.machine.edit()?;
        if !prompt.trim().is_empty() {
            model.errors.prompt = false;
        }
        model.item.prompt = prompt;
        Ok(())
    }

    /// Point the item at audio that is already hosted.
    ///
    /// Any pending recording is discarded.
    pub fn set_audio_url(&self, url: impl Into<String>) -> Result<(), FormError> {
        let url = url.into();
        let stale = {
            let mut model = self.model.lock();
            model.edit_audio()?;
            if !url.trim().is_empty() {
                model.errors.audio_url = false;
            }
            model.item.audio_url = Some(url).filter(|u| !u.trim().is_empty());
            model.pending.take()
        };
        self.release_pending(stale);
        Ok(())
    }

    pub fn set_option_text(&self, index: usize, text: impl Into<String>) -> Result<(), FormError> {
        let text = text.into();
        let mut model = self.model.lock();
        model.machine.edit()?;
        let filled = !text.trim().is_empty();
        model.item.options.set_text(index, text)?;
        if filled {
            model.errors.clear_option(index);
        }
        Ok(())
    }

    /// Mark one option correct, deselecting all others
    pub fn mark_correct(&self, index: usize) -> Result<(), FormError> {
        let mut model = self.model.lock();
        model.machine.edit()?;
        model.item.options.mark_correct(index)?;
        model.errors.correct_option = false;
        Ok(())
    }

    /// Append an empty option
    pub fn add_option(&self) -> Result<(), FormError> {
        let mut model = self.model.lock();
        model.machine.edit()?;
        model.item.options.push_empty()?;
        model.errors.push_option();
        Ok(())
    }

    /// Remove an option. Rejected when only the minimum remains.
    pub fn remove_option(&self, index: usize) -> Result<(), FormError> {
        let mut model = self.model.lock();
        model.machine.edit()?;
        if let Err(err) = model.item.options.remove(index) {
            warn!(index, error = %err, "option removal rejected");
            return Err(err.into());
        }
        model.errors.remove_option(index);
        Ok(())
    }

    // Capture

    /// Start a new recording, dropping any pending one first
    pub async fn start_recording(&self) -> Result<(), FormError> {
        let stale = {
            let mut model = self.model.lock();
            model.begin(Activity::Recording)?;
            model.pending.take()
        };
        self.release_pending(stale);

        if let Err(err) = self.recorder.start().await {
            warn!(error = %err, "could not start recording");
            self.recorder.discard().await;
            self.model.lock().machine.finish_activity(Activity::Recording);
            return Err(err.into());
        }
        Ok(())
    }

    /// Stop the recording and keep it as the pending audio with a preview
    pub async fn stop_recording(&self) -> Result<PendingSummary, FormError> {
        {
            let model = self.model.lock();
            if model.machine.activity() != Activity::Recording {
                return Err(FormTransitionError {
                    phase: model.machine.phase(),
                    activity: model.machine.activity(),
                    action: "stop recording".to_string(),
                }
                .into());
            }
        }

        let finished = match self.recorder.stop().await {
            Ok(()) => self.recorder.take_buffer().map_err(FormError::from),
            Err(err) => Err(err.into()),
        };
        let pending = finished.and_then(|buffer| {
            let previous = self.model.lock().pending.take().map(|p| p.preview);
            let preview = self.previews.replace(previous, &buffer)?;
            Ok(PendingRecording { buffer, preview })
        });

        let pending = match pending {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, "recording could not be finalized");
                self.recorder.discard().await;
                self.model.lock().machine.finish_activity(Activity::Recording);
                return Err(err);
            }
        };

        let summary = pending.summary();
        let mut model = self.model.lock();
        // a new recording supersedes audio uploaded earlier
        model.item.audio_url = None;
        model.pending = Some(pending);
        model.machine.finish_activity(Activity::Recording);
        info!(size = summary.size_bytes, "recording ready for preview");
        Ok(summary)
    }

    /// Abandon the recording in progress
    pub async fn cancel_recording(&self) {
        self.recorder.discard().await;
        self.model.lock().machine.finish_activity(Activity::Recording);
    }

    /// Drop the pending recording and its preview.
    ///
    /// Returns whether there was one.
    pub fn discard_pending(&self) -> bool {
        let stale = self.model.lock().pending.take();
        let had_pending = stale.is_some();
        self.release_pending(stale);
        had_pending
    }

    /// Upload the pending recording and set the item's audio URL
    pub async fn upload_pending(&self) -> Result<UploadResult, FormError> {
        let (pending, level) = {
            let mut model = self.model.lock();
            model.begin(Activity::Uploading)?;
            match model.pending.take() {
                Some(pending) => (pending, model.item.level),
                None => {
                    model.machine.finish_activity(Activity::Uploading);
                    return Err(FormError::NothingToUpload);
                }
            }
        };
        let _guard = ActivityGuard {
            model: &self.model,
            activity: Activity::Uploading,
        };

        let result = self
            .uploader
            .upload(UploadSource::Recording(&pending.buffer), UploadContext { level })
            .await;

        match result {
            Ok(upload) => {
                self.apply_upload(&upload);
                self.previews.release(pending.preview);
                Ok(upload)
            }
            Err(err) => {
                // keep the recording so the operator can retry
                self.model.lock().pending = Some(pending);
                Err(err.into())
            }
        }
    }

    /// Upload a local file and set the item's audio URL
    pub async fn upload_file(&self, path: impl AsRef<Path>) -> Result<UploadResult, FormError> {
        let level = {
            let mut model = self.model.lock();
            model.begin(Activity::Uploading)?;
            model.item.level
        };
        let _guard = ActivityGuard {
            model: &self.model,
            activity: Activity::Uploading,
        };

        let file = LocalFile::inspect(path).await?;
        let upload = self
            .uploader
            .upload(UploadSource::File(&file), UploadContext { level })
            .await?;

        self.apply_upload(&upload);
        let stale = self.model.lock().pending.take();
        self.release_pending(stale);
        Ok(upload)
    }

    /// Validate every field in one pass and raise the matching flags
    pub fn validate(&self) -> Result<(), FormError> {
        let mut model = self.model.lock();
        model.machine.begin_validation()?;
        let result = model.item.validate();
        let option_count = model.item.options.len();
        model.machine.end_validation();
        match result {
            Ok(()) => {
                model.errors = ErrorFlags::default();
                Ok(())
            }
            Err(errors) => {
                model.errors.apply(&errors, option_count);
                Err(FormError::Validation(errors))
            }
        }
    }

    /// Validate and persist the item.
    ///
    /// Creates a document for a new form and updates the loaded one
    /// otherwise. On failure the form stays editable with its data intact.
    pub async fn save(&self) -> Result<SaveOutcome, FormError> {
        let (record, existing_id) = {
            let mut model = self.model.lock();
            model.machine.begin_validation()?;
            match model.item.to_record() {
                Ok(record) => {
                    model.errors = ErrorFlags::default();
                    model.machine.begin_saving()?;
                    (record, model.existing_id.clone())
                }
                Err(errors) => {
                    let option_count = model.item.options.len();
                    model.errors.apply(&errors, option_count);
                    model.machine.end_validation();
                    warn!(problems = errors.len(), "save blocked by validation");
                    return Err(FormError::Validation(errors));
                }
            }
        };

        let result = match existing_id {
            Some(id) => self
                .documents
                .update(AUDIO_COLLECTION, &id, &record)
                .await
                .map(|()| SaveOutcome { id, created: false }),
            None => self
                .documents
                .create(AUDIO_COLLECTION, &record)
                .await
                .map(|id| SaveOutcome { id, created: true }),
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                self.model.lock().machine.save_failed();
                warn!(error = %err, "save failed");
                return Err(FormError::PersistenceFailed(err));
            }
        };

        let stale = {
            let mut model = self.model.lock();
            model.machine.save_succeeded()?;
            model.existing_id = Some(outcome.id.clone());
            model.pending.take()
        };
        self.release_pending(stale);

        if outcome.created {
            info!(id = %outcome.id, "audio item created");
        } else {
            info!(id = %outcome.id, "audio item updated");
        }
        Ok(outcome)
    }

    /// Close the form without saving, releasing the device and any preview
    pub async fn cancel(self) {
        self.recorder.discard().await;
        let stale = self.model.lock().pending.take();
        self.release_pending(stale);
        debug!("form cancelled");
    }

    fn apply_upload(&self, upload: &UploadResult) {
        let mut model = self.model.lock();
        model.item.audio_url = Some(upload.remote_url.clone());
        model.errors.audio_url = false;
    }

    fn release_pending(&self, pending: Option<PendingRecording>) {
        if let Some(pending) = pending {
            self.previews.release(pending.preview);
        }
    }
}
