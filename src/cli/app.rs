//! Audio item runner: drives the form controller from the terminal

use std::env;
use std::path::Path;
use std::process::ExitCode;

use thiserror::Error;

use crate::application::ports::{
    AudioPlayer, ConfigStore, DocumentStore, Microphone, ObjectStore,
};
use crate::application::{AudioFormController, FormError, PendingSummary, PreviewManager};
use crate::domain::audio_item::{MAX_OPTIONS, MIN_OPTIONS};
use crate::domain::config::{AppConfig, FirebaseConfig, StorageBackend};
use crate::domain::recording::Duration;
use crate::infrastructure::{
    CpalMicrophone, FirebaseStorage, FirestoreDocumentStore, LocalDiskStore, RodioPlayer,
    XdgConfigStore,
};

use super::args::{AudioAction, ItemArgs};
use super::presenter::Presenter;
use super::signals::{OperatorInput, RecordingControl};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Firebase emulator variables, as understood by the Firebase tooling
const FIRESTORE_EMULATOR_HOST: &str = "FIRESTORE_EMULATOR_HOST";
const STORAGE_EMULATOR_HOST: &str = "FIREBASE_STORAGE_EMULATOR_HOST";

/// How often the elapsed time on the recording line is refreshed
const RECORDING_REFRESH: std::time::Duration = std::time::Duration::from_millis(250);

/// Errors ending an `audio` run
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error("{0}")]
    Setup(String),

    #[error("{0}")]
    Usage(String),

    #[error("Recording cancelled")]
    Cancelled,

    #[error("Upload declined, nothing was saved")]
    Declined,
}

impl RunError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_)
            | Self::Form(FormError::TooFewOptions)
            | Self::Form(FormError::TooManyOptions)
            | Self::Form(FormError::OptionOutOfRange { .. }) => EXIT_USAGE_ERROR,
            _ => EXIT_ERROR,
        }
    }
}

/// Run `audio new` or `audio edit`
pub async fn run_audio(action: AudioAction, config: AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();

    let (existing_id, args) = match action {
        AudioAction::New(args) => (None, args),
        AudioAction::Edit { id, item } => (Some(id), item),
    };

    let result = match build_and_run(existing_id, &args, &config, &mut presenter).await {
        Ok(()) => return ExitCode::from(EXIT_SUCCESS),
        Err(err) => err,
    };

    presenter.stop_spinner();
    match &result {
        RunError::Form(FormError::Validation(errors)) => presenter.validation_summary(errors),
        other => presenter.error(&other.to_string()),
    }
    ExitCode::from(result.exit_code())
}

async fn build_and_run(
    existing_id: Option<String>,
    args: &ItemArgs,
    config: &AppConfig,
    presenter: &mut Presenter,
) -> Result<(), RunError> {
    let documents = document_store(config)?;
    let microphone = if args.wav {
        CpalMicrophone::wav_only()
    } else {
        CpalMicrophone::new()
    };

    match config.storage_or_default() {
        StorageBackend::Local => {
            let store = LocalDiskStore::new(config.local_storage_dir_or_default());
            run_form(microphone, store, documents, existing_id, args, config, presenter).await
        }
        StorageBackend::Firebase => {
            let store = object_store(config)?;
            run_form(microphone, store, documents, existing_id, args, config, presenter).await
        }
    }
}

async fn run_form<M, S, D>(
    microphone: M,
    store: S,
    documents: D,
    existing_id: Option<String>,
    args: &ItemArgs,
    config: &AppConfig,
    presenter: &mut Presenter,
) -> Result<(), RunError>
where
    M: Microphone,
    S: ObjectStore,
    D: DocumentStore,
{
    let controller = AudioFormController::new(microphone, store, documents, PreviewManager::new());
    let mut input = OperatorInput::spawn();

    let result = fill_and_save(&controller, &mut input, existing_id, args, config, presenter).await;
    if result.is_err() {
        controller.cancel().await;
    }
    result
}

async fn fill_and_save<M, S, D>(
    controller: &AudioFormController<M, S, D>,
    input: &mut OperatorInput,
    existing_id: Option<String>,
    args: &ItemArgs,
    config: &AppConfig,
    presenter: &mut Presenter,
) -> Result<(), RunError>
where
    M: Microphone,
    S: ObjectStore,
    D: DocumentStore,
{
    match &existing_id {
        Some(id) => {
            presenter.start_spinner(&format!("Loading item {}…", id));
            controller.load(id).await?;
            presenter.stop_spinner();
        }
        None if args.level.is_none() => controller.set_level(config.default_level_or_default())?,
        None => {}
    }

    apply_fields(controller, args)?;

    if let Some(url) = &args.url {
        controller.set_audio_url(url.clone())?;
    } else if let Some(path) = &args.file {
        upload_file(controller, input, path, args.yes, presenter).await?;
    } else if args.record {
        let max = max_recording(args, config)?;
        record_and_upload(controller, input, max, args, presenter).await?;
    }

    presenter.item_summary(&controller.snapshot().item);
    presenter.start_spinner("Saving…");
    let outcome = controller.save().await?;
    let verb = if outcome.created { "Created" } else { "Updated" };
    presenter.spinner_success(&format!("{} audio item {}", verb, outcome.id));
    presenter.output(&outcome.id);
    Ok(())
}

/// Apply field overrides from the command line
fn apply_fields<M, S, D>(
    controller: &AudioFormController<M, S, D>,
    args: &ItemArgs,
) -> Result<(), FormError>
where
    M: Microphone,
    S: ObjectStore,
    D: DocumentStore,
{
    if let Some(level) = args.level {
        controller.set_level(level)?;
    }
    if let Some(prompt) = &args.prompt {
        controller.set_prompt(prompt.clone())?;
    }

    if !args.options.is_empty() {
        let wanted = args.options.len();
        if wanted < MIN_OPTIONS {
            return Err(FormError::TooFewOptions);
        }
        if wanted > MAX_OPTIONS {
            return Err(FormError::TooManyOptions);
        }

        let current = controller.snapshot().item.options.len();
        for _ in current..wanted {
            controller.add_option()?;
        }
        for index in (wanted..current).rev() {
            controller.remove_option(index)?;
        }
        for (index, text) in args.options.iter().enumerate() {
            controller.set_option_text(index, text.clone())?;
        }
    }

    if let Some(number) = args.correct {
        controller.mark_correct(usize::from(number) - 1)?;
    }
    Ok(())
}

async fn upload_file<M, S, D>(
    controller: &AudioFormController<M, S, D>,
    input: &mut OperatorInput,
    path: &Path,
    assume_yes: bool,
    presenter: &mut Presenter,
) -> Result<(), RunError>
where
    M: Microphone,
    S: ObjectStore,
    D: DocumentStore,
{
    let question = format!("Upload {}?", path.display());
    if !assume_yes && !input.confirm(&question).await {
        return Err(RunError::Declined);
    }

    presenter.start_spinner("Uploading…");
    match controller.upload_file(path).await {
        Ok(upload) => {
            presenter.upload_done(&upload);
            Ok(())
        }
        Err(err) => {
            presenter.spinner_fail("Upload failed");
            Err(err.into())
        }
    }
}

async fn record_and_upload<M, S, D>(
    controller: &AudioFormController<M, S, D>,
    input: &mut OperatorInput,
    max: Duration,
    args: &ItemArgs,
    presenter: &mut Presenter,
) -> Result<(), RunError>
where
    M: Microphone,
    S: ObjectStore,
    D: DocumentStore,
{
    let pending = record(controller, input, max, presenter).await?;
    presenter.success(&format!("Recorded {}", presenter.format_pending(&pending)));

    if args.preview {
        presenter.start_spinner("Playing preview…");
        match RodioPlayer::new().play_file(&pending.preview_path).await {
            Ok(()) => presenter.stop_spinner(),
            Err(err) => presenter.spinner_fail(&format!("Preview unavailable: {}", err)),
        }
    }

    if !args.yes && !input.confirm("Upload the recording?").await {
        if controller.discard_pending() {
            presenter.warn("Recording discarded");
        }
        return Err(RunError::Declined);
    }

    presenter.start_spinner("Uploading…");
    match controller.upload_pending().await {
        Ok(upload) => {
            presenter.upload_done(&upload);
            Ok(())
        }
        Err(err) => {
            presenter.spinner_fail("Upload failed");
            Err(err.into())
        }
    }
}

/// Record until Enter, Ctrl-C or the duration cap
async fn record<M, S, D>(
    controller: &AudioFormController<M, S, D>,
    input: &mut OperatorInput,
    max: Duration,
    presenter: &mut Presenter,
) -> Result<PendingSummary, RunError>
where
    M: Microphone,
    S: ObjectStore,
    D: DocumentStore,
{
    controller.start_recording().await?;
    presenter.show_recording(max);

    let mut refresh = tokio::time::interval(RECORDING_REFRESH);
    loop {
        tokio::select! {
            control = input.next_control() => match control {
                RecordingControl::Stop => break,
                RecordingControl::Cancel => {
                    controller.cancel_recording().await;
                    presenter.spinner_fail("Recording cancelled");
                    return Err(RunError::Cancelled);
                }
            },
            _ = refresh.tick() => {
                let elapsed = controller.elapsed();
                presenter.update_recording(elapsed, max);
                if elapsed >= max {
                    presenter.stop_spinner();
                    presenter.info(&format!("Reached the {} limit", max));
                    break;
                }
            }
        }
    }

    presenter.start_spinner("Finishing recording…");
    match controller.stop_recording().await {
        Ok(pending) => {
            presenter.stop_spinner();
            Ok(pending)
        }
        Err(err) => {
            presenter.spinner_fail("Recording failed");
            Err(err.into())
        }
    }
}

fn max_recording(args: &ItemArgs, config: &AppConfig) -> Result<Duration, RunError> {
    let Some(raw) = &args.max_duration else {
        return Ok(config.max_recording_or_default());
    };
    raw.parse::<Duration>()
        .map_err(|e| RunError::Usage(format!("Invalid max-duration: {}", e)))
}

fn emulator_host(var: &str) -> Option<String> {
    env::var(var).ok().filter(|host| !host.trim().is_empty())
}

/// Firestore adapter for the configured project
pub fn document_store(config: &AppConfig) -> Result<FirestoreDocumentStore, RunError> {
    let project_id = config.project_id().ok_or_else(|| {
        RunError::Setup(
            "Missing Firebase project id. Set NIVELVER_PROJECT_ID or run 'nivelver-admin config set firebase.project_id <id>'"
                .to_string(),
        )
    })?;
    let api_key = config.api_key().map(String::from);
    let auth_token = config.auth_token().map(String::from);

    Ok(match emulator_host(FIRESTORE_EMULATOR_HOST) {
        Some(host) => FirestoreDocumentStore::with_base_url(
            format!("http://{}/v1", host),
            project_id,
            api_key,
            auth_token,
        ),
        None => FirestoreDocumentStore::new(project_id, api_key, auth_token),
    })
}

/// Firebase Storage adapter for the configured bucket
pub fn object_store(config: &AppConfig) -> Result<FirebaseStorage, RunError> {
    let bucket = config.bucket_or_default().ok_or_else(|| {
        RunError::Setup(
            "Missing storage bucket. Set NIVELVER_BUCKET or NIVELVER_PROJECT_ID, or use --storage local"
                .to_string(),
        )
    })?;
    let auth_token = config.auth_token().map(String::from);

    Ok(match emulator_host(STORAGE_EMULATOR_HOST) {
        Some(host) => FirebaseStorage::with_base_url(format!("http://{}", host), bucket, auth_token),
        None => FirebaseStorage::new(bucket, auth_token),
    })
}

/// Settings supplied through the environment
pub fn env_config() -> AppConfig {
    let var = |name: &str| env::var(name).ok().filter(|s| !s.is_empty());
    let firebase = FirebaseConfig {
        project_id: var("NIVELVER_PROJECT_ID"),
        api_key: var("NIVELVER_API_KEY"),
        auth_token: var("NIVELVER_AUTH_TOKEN"),
        bucket: var("NIVELVER_BUCKET"),
    };

    AppConfig {
        firebase: (firebase != FirebaseConfig::default()).then_some(firebase),
        ..Default::default()
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable config file");
        AppConfig::empty()
    });

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config())
        .merge(cli_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_count_errors_are_usage_errors() {
        assert_eq!(
            RunError::Form(FormError::TooFewOptions).exit_code(),
            EXIT_USAGE_ERROR
        );
        assert_eq!(
            RunError::Usage("bad".into()).exit_code(),
            EXIT_USAGE_ERROR
        );
        assert_eq!(RunError::Cancelled.exit_code(), EXIT_ERROR);
        assert_eq!(
            RunError::Form(FormError::NothingToUpload).exit_code(),
            EXIT_ERROR
        );
    }

    #[test]
    fn max_duration_flag_overrides_config() {
        let args = ItemArgs {
            record: true,
            max_duration: Some("45s".into()),
            ..Default::default()
        };
        let config = AppConfig::defaults();
        assert_eq!(max_recording(&args, &config).unwrap().as_secs(), 45);

        let args = ItemArgs::default();
        assert_eq!(max_recording(&args, &config).unwrap().as_secs(), 300);
    }

    #[test]
    fn zero_max_duration_is_rejected() {
        let args = ItemArgs {
            max_duration: Some("0s".into()),
            ..Default::default()
        };
        assert!(matches!(
            max_recording(&args, &AppConfig::defaults()),
            Err(RunError::Usage(_))
        ));
    }

    #[test]
    fn missing_project_is_a_setup_error() {
        assert!(matches!(
            document_store(&AppConfig::empty()),
            Err(RunError::Setup(_))
        ));
    }
}
