//! Capture-to-commit flow.
//!
//! A [`Picker`] walks one selection through its lifecycle:
//!
//! ```text
//! Idle -> Active(source) -> Editing -> Committed
//!              |               |
//!              +---------------+----> Cancelled
//! ```
//!
//! Camera captures always open the crop editor; library picks commit
//! directly unless the config asks for editing. Retaking from the editor is
//! only possible with the camera. Everything the host needs to react to is
//! reported through a [`PickerObserver`].
//!
//! Exports run off-thread. [`Picker::commit`] hands back a ticket carrying a
//! generation number; if the session is cancelled or retaken before the
//! export finishes, [`Picker::finish_commit`] sees a stale generation and
//! drops the result.

use std::sync::Arc;
use std::time::Instant;

use kurbo::Size;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::PickerConfig;
use crate::decode::DecodedImage;
use crate::editor::{Editor, GestureEvent, OriginalImage};
use crate::export::{ExportJob, ExportRequest};
use crate::metadata::{ImageWithMetadata, Metadata};

/// Why a selection did not produce an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickerError {
    #[error("selection cancelled")]
    Cancelled,

    #[error("no image was captured")]
    NoImage,

    #[error("edit session ended unexpectedly")]
    NoSelf,

    #[error("cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },
}

impl PickerError {
    /// Text to show the user, or `None` when nothing should be shown.
    pub fn user_message(&self) -> Option<String> {
        match self {
            PickerError::Cancelled => None,
            PickerError::NoImage => Some("No image was captured. Please try again.".to_string()),
            PickerError::NoSelf | PickerError::InvalidTransition { .. } => {
                Some("Something went wrong. Please try again.".to_string())
            }
        }
    }
}

/// Where the image comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Camera,
    Library,
}

/// Progress milestones reported while a selection is under way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerPhase {
    Active(Source),
    Editing,
    Exporting,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickerEvent {
    Progress(PickerPhase),
    Committed(ImageWithMetadata),
    Failed(PickerError),
    /// The picker closed; sent after `Committed` and after cancellation.
    Deactivated,
}

/// Receives picker events.
pub trait PickerObserver {
    fn on_event(&mut self, event: PickerEvent);
}

impl<F: FnMut(PickerEvent)> PickerObserver for F {
    fn on_event(&mut self, event: PickerEvent) {
        self(event)
    }
}

/// A captured or selected image handed to the picker.
#[derive(Debug, Clone)]
pub struct Capture {
    pub image: DecodedImage,
    pub original: OriginalImage,
    pub metadata: Metadata,
}

impl Capture {
    /// A capture whose screen image is also its original.
    pub fn new(image: DecodedImage) -> Self {
        Self {
            original: OriginalImage::ready(image.clone()),
            image,
            metadata: Metadata::EMPTY,
        }
    }

    pub fn with_original(mut self, original: OriginalImage) -> Self {
        self.original = original;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug)]
pub enum PickerState {
    Idle,
    Active(Source),
    Editing { source: Source, editor: Box<Editor> },
    Committed(ImageWithMetadata),
    Cancelled,
}

impl PickerState {
    fn name(&self) -> &'static str {
        match self {
            PickerState::Idle => "idle",
            PickerState::Active(_) => "active",
            PickerState::Editing { .. } => "editing",
            PickerState::Committed(_) => "committed",
            PickerState::Cancelled => "cancelled",
        }
    }
}

/// An export scheduled by [`Picker::commit`].
#[derive(Debug)]
pub struct ExportTicket {
    generation: u64,
    job: ExportJob,
}

impl ExportTicket {
    pub fn job(&self) -> &ExportJob {
        &self.job
    }

    /// Render on the calling thread.
    pub fn run(self) -> ExportOutcome {
        ExportOutcome {
            generation: self.generation,
            result: Ok(self.job.run()),
        }
    }

    /// Render on tokio's blocking pool.
    pub fn spawn(self) -> PendingExport {
        PendingExport {
            generation: self.generation,
            handle: self.job.spawn(),
        }
    }
}

/// An export running in the background.
#[derive(Debug)]
pub struct PendingExport {
    generation: u64,
    handle: JoinHandle<ImageWithMetadata>,
}

impl PendingExport {
    pub async fn wait(self) -> ExportOutcome {
        let result = self.handle.await.map_err(|err| {
            log::error!("export worker failed: {}", err);
            PickerError::NoSelf
        });
        ExportOutcome {
            generation: self.generation,
            result,
        }
    }
}

/// A finished export, to be handed back to [`Picker::finish_commit`].
#[derive(Debug)]
pub struct ExportOutcome {
    generation: u64,
    result: Result<ImageWithMetadata, PickerError>,
}

pub struct Picker<O: PickerObserver> {
    config: PickerConfig,
    bounds: Size,
    state: PickerState,
    observer: O,
    generation: u64,
}

impl<O: PickerObserver> Picker<O> {
    /// Create an idle picker whose editor will fill `bounds`.
    pub fn new(config: PickerConfig, bounds: Size, observer: O) -> Self {
        Self {
            config,
            bounds,
            state: PickerState::Idle,
            observer,
            generation: 0,
        }
    }

    pub fn state(&self) -> &PickerState {
        &self.state
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn editor(&self) -> Option<&Editor> {
        match &self.state {
            PickerState::Editing { editor, .. } => Some(&**editor),
            _ => None,
        }
    }

    pub fn editor_mut(&mut self) -> Option<&mut Editor> {
        match &mut self.state {
            PickerState::Editing { editor, .. } => Some(&mut **editor),
            _ => None,
        }
    }

    /// Open the picker for `source`. Allowed from idle and after a previous
    /// selection finished.
    pub fn activate(&mut self, source: Source) -> Result<(), PickerError> {
        match self.state {
            PickerState::Idle | PickerState::Committed(_) | PickerState::Cancelled => {
                log::info!("picker activated for {:?}", source);
                self.state = PickerState::Active(source);
                self.emit(PickerEvent::Progress(PickerPhase::Active(source)));
                Ok(())
            }
            _ => Err(self.invalid("activate")),
        }
    }

    /// Hand over the captured or selected image; `None` means the capture
    /// produced nothing, which is reported and leaves the picker active.
    pub fn captured(&mut self, capture: Option<Capture>) -> Result<(), PickerError> {
        let PickerState::Active(source) = self.state else {
            return Err(self.invalid("accept a capture"));
        };

        let Some(capture) = capture else {
            log::warn!("capture delivered no image");
            self.emit(PickerEvent::Failed(PickerError::NoImage));
            return Ok(());
        };

        if source == Source::Library && !self.config.edit_library_selection {
            let image = ImageWithMetadata::new(capture.image, capture.metadata);
            self.finish(image);
            return Ok(());
        }

        let editor = Editor::new(
            self.config.editor.clone(),
            self.bounds,
            Arc::new(capture.image),
            capture.original,
        );
        self.state = PickerState::Editing {
            source,
            editor: Box::new(editor),
        };
        self.emit(PickerEvent::Progress(PickerPhase::Editing));
        Ok(())
    }

    /// Decode raw camera bytes and hand them over as a capture.
    ///
    /// The screen image is decoded now with orientation correction; the
    /// original shares the same bytes and is decoded again only on export.
    pub fn captured_bytes(&mut self, bytes: Vec<u8>) -> Result<(), PickerError> {
        if !matches!(self.state, PickerState::Active(_)) {
            return Err(self.invalid("accept a capture"));
        }

        let desired = self.config.desired_aspect;
        let capture = match crate::decode::decode_capture(&bytes, desired) {
            Ok(image) => Some(
                Capture::new(image)
                    .with_original(OriginalImage::from_capture_bytes(bytes, desired)),
            ),
            Err(err) => {
                log::warn!("captured bytes could not be decoded: {}", err);
                None
            }
        };
        self.captured(capture)
    }

    /// Forward a gesture to the editor. Returns `false` when not editing.
    pub fn handle_gesture(&mut self, event: GestureEvent, now: Instant) -> bool {
        match self.editor_mut() {
            Some(editor) => {
                editor.handle(event, now);
                true
            }
            None => false,
        }
    }

    /// Advance editor timers. Returns `true` when a correction ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.editor_mut().is_some_and(|editor| editor.tick(now))
    }

    /// Snapshot the edit session for export.
    ///
    /// The picker stays in `Editing` until the outcome is passed to
    /// [`Picker::finish_commit`].
    pub fn commit(&mut self, request: ExportRequest) -> Result<ExportTicket, PickerError> {
        let job = match &self.state {
            PickerState::Editing { editor, .. } => editor.export_job(request),
            _ => return Err(self.invalid("commit")),
        };
        self.emit(PickerEvent::Progress(PickerPhase::Exporting));
        Ok(ExportTicket {
            generation: self.generation,
            job,
        })
    }

    /// Deliver a finished export.
    ///
    /// Returns `true` when the result was accepted. Results from a session
    /// that has since been cancelled or retaken are discarded.
    pub fn finish_commit(&mut self, outcome: ExportOutcome) -> bool {
        if outcome.generation != self.generation
            || !matches!(self.state, PickerState::Editing { .. })
        {
            log::debug!(
                "discarding export from generation {} (current {}, {})",
                outcome.generation,
                self.generation,
                self.state.name()
            );
            return false;
        }

        match outcome.result {
            Ok(image) => {
                self.finish(image);
                true
            }
            Err(err) => {
                self.emit(PickerEvent::Failed(err));
                false
            }
        }
    }

    /// Export and deliver in one step on tokio's blocking pool.
    pub async fn commit_and_wait(&mut self, request: ExportRequest) -> Result<bool, PickerError> {
        let pending = self.commit(request)?.spawn();
        let outcome = pending.wait().await;
        Ok(self.finish_commit(outcome))
    }

    /// Drop the edit session and go back to the camera.
    pub fn retake(&mut self) -> Result<(), PickerError> {
        match self.state {
            PickerState::Editing {
                source: Source::Camera,
                ..
            } => {
                self.generation += 1;
                self.state = PickerState::Active(Source::Camera);
                self.emit(PickerEvent::Progress(PickerPhase::Active(Source::Camera)));
                Ok(())
            }
            _ => Err(self.invalid("retake")),
        }
    }

    /// Abandon the selection.
    pub fn cancel(&mut self) -> Result<(), PickerError> {
        match self.state {
            PickerState::Active(_) | PickerState::Editing { .. } => {
                log::info!("picker cancelled while {}", self.state.name());
                self.generation += 1;
                self.state = PickerState::Cancelled;
                self.emit(PickerEvent::Failed(PickerError::Cancelled));
                self.emit(PickerEvent::Deactivated);
                Ok(())
            }
            _ => Err(self.invalid("cancel")),
        }
    }

    fn finish(&mut self, image: ImageWithMetadata) {
        log::info!(
            "selection committed: {}x{}",
            image.image().width,
            image.image().height
        );
        self.generation += 1;
        self.state = PickerState::Committed(image.clone());
        self.emit(PickerEvent::Committed(image));
        self.emit(PickerEvent::Deactivated);
    }

    fn invalid(&self, operation: &'static str) -> PickerError {
        let err = PickerError::InvalidTransition {
            operation,
            state: self.state.name(),
        };
        log::warn!("{}", err);
        err
    }

    fn emit(&mut self, event: PickerEvent) {
        self.observer.on_event(event);
    }
}
