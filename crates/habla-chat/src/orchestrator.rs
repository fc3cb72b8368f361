//! Mode orchestrator: single owner of every user-visible state.
//!
//! Requests arrive as `&mut self` calls. Backend exchanges and speech engine
//! calls run in spawned tasks that post [`Completion`]s to a FIFO queue; the
//! owner drains it with [`ModeOrchestrator::next_completion`] and
//! [`ModeOrchestrator::apply`]. A completion whose ticket no longer matches
//! the slot it was issued for is dropped.

use std::sync::Arc;

use futures::StreamExt;
use habla_core::config::HablaConfig;
use habla_core::events::UiEvent;
use habla_core::types::{
    ControlId, ControlVisual, Direction, Message, MessageId, MessageStatus, Mode, Role, TextField,
};
use habla_speech::{
    append_transcript, prepare_utterance, Capture, SpeakDecision, SpeechError,
    SpeechInputController, SpeechOutputController, SpeechRecognizer, SpeechSynthesizer, Voice,
    VoiceCatalog,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::assembler::StreamAssembler;
use crate::backend::{ConversationBackend, Fragment, SessionHandle};
use crate::clipboard::Clipboard;
use crate::error::ChatError;
use crate::mode::ModeMachine;
use crate::persona::PersonaRegistry;
use crate::render::MarkupRenderer;
use crate::session::{ConversationSession, SessionManager};
use crate::transcript::Transcript;
use crate::translation::TranslationController;

/// Placeholder shown in a field while dictation is active.
pub const LISTENING_PLACEHOLDER: &str = "Escuchando...";

/// Result of background work, posted back to the owner.
#[derive(Debug)]
pub enum Completion {
    StreamFragment { ticket: u64, fragment: Fragment },
    StreamFailed { ticket: u64, error: ChatError },
    StreamEnded { ticket: u64 },
    TranslationDone {
        ticket: u64,
        result: Result<String, ChatError>,
    },
    SpeechEnded {
        ticket: u64,
        result: Result<(), SpeechError>,
    },
    CaptureFinished {
        ticket: u64,
        result: Result<Option<String>, SpeechError>,
    },
    VoicesChanged {
        voices: Result<Vec<Voice>, SpeechError>,
    },
}

struct ActiveStream {
    ticket: u64,
    assembler: StreamAssembler,
    task: JoinHandle<()>,
}

/// Coordinates modes, sessions, the transcript, the translator and speech.
pub struct ModeOrchestrator {
    registry: PersonaRegistry,
    modes: ModeMachine,
    sessions: SessionManager,
    transcript: Transcript,
    translation: TranslationController,
    renderer: Box<dyn MarkupRenderer>,
    composer: String,
    spoken_language: String,

    speech_out: SpeechOutputController,
    speech_in: SpeechInputController,
    voices: VoiceCatalog,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    clipboard: Option<Box<dyn Clipboard>>,

    stream: Option<ActiveStream>,
    next_stream_ticket: u64,
    translation_task: Option<JoinHandle<()>>,
    speech_task: Option<JoinHandle<()>>,
    capture_task: Option<JoinHandle<()>>,

    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    events: mpsc::UnboundedSender<UiEvent>,
}

impl ModeOrchestrator {
    /// Create an orchestrator in the idle mode.
    ///
    /// Returns the receiving end of the UI event channel.
    pub fn new(
        config: &HablaConfig,
        backend: Arc<dyn ConversationBackend>,
        renderer: Box<dyn MarkupRenderer>,
    ) -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            registry: PersonaRegistry::new(),
            modes: ModeMachine::default(),
            sessions: SessionManager::new(backend),
            transcript: Transcript::new(),
            translation: TranslationController::new(config.translation.clone()),
            renderer,
            composer: String::new(),
            spoken_language: config.speech.spoken_language.clone(),
            speech_out: SpeechOutputController::new(),
            speech_in: SpeechInputController::new(),
            voices: VoiceCatalog::new(config.speech.preferred_voice.clone()),
            synthesizer: None,
            recognizer: None,
            clipboard: None,
            stream: None,
            next_stream_ticket: 1,
            translation_task: None,
            speech_task: None,
            capture_task: None,
            completions_tx,
            completions_rx,
            events,
        };
        (orchestrator, events_rx)
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn mode(&self) -> Mode {
        self.modes.current()
    }

    pub fn session(&self) -> Option<&ConversationSession> {
        self.sessions.current()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn translation(&self) -> &TranslationController {
        &self.translation
    }

    pub fn composer(&self) -> &str {
        &self.composer
    }

    pub fn set_composer(&mut self, text: impl Into<String>) {
        self.composer = text.into();
    }

    pub fn set_translation_input(&mut self, text: impl Into<String>) {
        self.translation.set_input(text);
    }

    pub fn speaking(&self) -> Option<ControlId> {
        self.speech_out.active_control()
    }

    pub fn capture(&self) -> Option<&Capture> {
        self.speech_in.active()
    }

    pub fn voices(&self) -> &VoiceCatalog {
        &self.voices
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Whether any stream, translation, playback or capture is in flight.
    pub fn is_busy(&self) -> bool {
        self.stream.is_some()
            || self.translation.is_pending()
            || self.speech_out.is_speaking()
            || self.speech_in.is_capturing()
    }

    /// Dictation language for the active mode.
    pub fn recognition_language(&self) -> &str {
        if self.mode() == Mode::Translator {
            self.translation.recognition_language()
        } else {
            &self.spoken_language
        }
    }

    /// Playback language when no override is given.
    pub fn speech_language(&self) -> &str {
        if self.mode() == Mode::Translator {
            self.translation.speech_language()
        } else {
            &self.spoken_language
        }
    }

    fn emit(&self, event: UiEvent) {
        if self.events.send(event).is_err() {
            debug!("UI event receiver dropped");
        }
    }

    fn field_placeholder(&self, field: TextField) -> String {
        match field {
            TextField::Composer => PersonaRegistry::profile(self.mode())
                .map(|p| p.placeholder)
                .unwrap_or_default()
                .to_string(),
            TextField::TranslatorInput => self.translation.placeholder().to_string(),
        }
    }

    // =========================================================================
    // Modes
    // =========================================================================

    /// Switch to `target`. Re-selecting an already active mode is a no-op.
    pub fn select_mode(&mut self, target: Mode) {
        let Some(plan) = self.modes.plan(target, self.sessions.current().is_some()) else {
            debug!(mode = %target, "Mode already active");
            return;
        };

        self.stop_speech();
        self.cancel_capture();
        self.cancel_stream();
        self.cancel_translation();

        self.modes.commit(&plan);
        self.emit(UiEvent::ModeChanged {
            from: plan.from,
            to: plan.to,
            region: plan.region,
        });

        if plan.reset_transcript {
            self.transcript.clear();
            self.emit(UiEvent::TranscriptCleared);
            if let Some(profile) = PersonaRegistry::profile(target) {
                self.transcript.set_welcome(target, profile.welcome);
                self.emit(UiEvent::WelcomeShown {
                    mode: target,
                    text: profile.welcome.to_string(),
                });
                self.emit(UiEvent::PlaceholderChanged {
                    field: TextField::Composer,
                    text: profile.placeholder.to_string(),
                });
            }
        }
        if target == Mode::Translator {
            self.emit(UiEvent::PlaceholderChanged {
                field: TextField::TranslatorInput,
                text: self.translation.placeholder().to_string(),
            });
        }

        match self.registry.persona(target).cloned() {
            Some(persona) if plan.create_session => {
                let created = self.sessions.create(&persona).map(|_| ());
                match created {
                    Ok(()) => self.emit(UiEvent::SessionCreated { mode: target }),
                    Err(e) => {
                        warn!(mode = %target, error = %e, "Session creation failed");
                        self.emit(UiEvent::SessionUnavailable {
                            mode: target,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            _ => self.sessions.clear(),
        }

        debug!(
            mode = %target,
            language = %self.recognition_language(),
            "Recognition language set"
        );
    }

    fn cancel_stream(&mut self) {
        if let Some(active) = self.stream.take() {
            active.task.abort();
            debug!(message = %active.assembler.message_id(), "Reply stream abandoned");
        }
    }

    fn cancel_translation(&mut self) {
        if let Some(task) = self.translation_task.take() {
            task.abort();
        }
        if self.translation.cancel() {
            debug!("Translation abandoned");
            self.emit(UiEvent::ControlChanged {
                control: ControlId::TranslateTrigger,
                visual: ControlVisual::Idle,
            });
        }
    }

    // =========================================================================
    // Chat
    // =========================================================================

    /// Send `text` in the active chat mode.
    ///
    /// Returns the id of the pending reply, or `None` when the submission was
    /// ignored.
    pub fn submit(&mut self, text: &str) -> Option<MessageId> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let mode = self.mode();
        if !mode.is_chat() {
            debug!(mode = %mode, "Submit outside a chat mode ignored");
            return None;
        }
        let Some(handle) = self.sessions.current().map(|s| s.handle) else {
            debug!(mode = %mode, "No session, submit ignored");
            return None;
        };
        if self.stream.is_some() {
            debug!("Reply in flight, submit ignored");
            return None;
        }

        if self.transcript.dismiss_welcome() {
            self.emit(UiEvent::WelcomeDismissed);
        }
        if !self.composer.is_empty() {
            self.composer.clear();
            self.emit(UiEvent::FieldTextChanged {
                field: TextField::Composer,
                text: String::new(),
            });
        }

        let user = Message::user(text, self.renderer.render(text));
        let user_id = self.transcript.push(user);
        self.emit(UiEvent::MessageAppended { id: user_id });
        let reply_id = self.transcript.push(Message::pending_assistant());
        self.emit(UiEvent::MessageAppended { id: reply_id });

        let ticket = self.next_stream_ticket;
        self.next_stream_ticket += 1;
        let task = tokio::spawn(forward_stream(
            self.sessions.backend(),
            handle,
            text.to_string(),
            ticket,
            self.completions_tx.clone(),
        ));
        self.stream = Some(ActiveStream {
            ticket,
            assembler: StreamAssembler::new(reply_id),
            task,
        });
        info!(mode = %mode, chars = text.chars().count(), "Message submitted");
        Some(reply_id)
    }

    /// Send the composer contents.
    pub fn submit_composer(&mut self) -> Option<MessageId> {
        let text = self.composer.clone();
        self.submit(&text)
    }

    fn take_stream(&mut self, ticket: u64) -> Option<ActiveStream> {
        if self.stream.as_ref().is_some_and(|s| s.ticket == ticket) {
            self.stream.take()
        } else {
            debug!(ticket, "Stale stream completion dropped");
            None
        }
    }

    fn on_fragment(&mut self, ticket: u64, fragment: Fragment) {
        let Some(active) = self.stream.as_mut().filter(|s| s.ticket == ticket) else {
            debug!(ticket, "Stale fragment dropped");
            return;
        };
        let id = active.assembler.message_id();
        let Some(message) = self.transcript.get_mut(id) else {
            return;
        };
        if active
            .assembler
            .apply(fragment, message, &*self.renderer)
        {
            self.emit(UiEvent::MessageUpdated { id });
        }
    }

    fn on_stream_ended(&mut self, ticket: u64) {
        let Some(active) = self.take_stream(ticket) else {
            return;
        };
        let id = active.assembler.message_id();
        if let Some(message) = self.transcript.get_mut(id) {
            let citations = active.assembler.finish(message, &*self.renderer);
            self.emit(UiEvent::MessageCompleted { id, citations });
        }
    }

    fn on_stream_failed(&mut self, ticket: u64, error: ChatError) {
        let Some(active) = self.take_stream(ticket) else {
            return;
        };
        warn!(error = %error, "Reply stream failed");
        let id = active.assembler.message_id();
        if let Some(message) = self.transcript.get_mut(id) {
            active.assembler.fail(message);
            self.emit(UiEvent::MessageFailed { id });
        }
    }

    // =========================================================================
    // Translator
    // =========================================================================

    /// Translate the input pane. Returns `true` when an exchange started.
    pub fn translate(&mut self) -> bool {
        if self.mode() != Mode::Translator {
            return false;
        }
        let Some(handle) = self.sessions.current().map(|s| s.handle) else {
            debug!("No session, translate ignored");
            return false;
        };
        let Some((ticket, prompt)) = self.translation.begin() else {
            return false;
        };

        self.emit(UiEvent::ControlChanged {
            control: ControlId::TranslateTrigger,
            visual: ControlVisual::Disabled,
        });
        self.emit(UiEvent::TranslationPending);

        let backend = self.sessions.backend();
        let tx = self.completions_tx.clone();
        self.translation_task = Some(tokio::spawn(async move {
            let result = backend.send_once(handle, &prompt).await;
            let _ = tx.send(Completion::TranslationDone { ticket, result });
        }));
        info!(direction = %self.translation.direction(), "Translation requested");
        true
    }

    /// Flip the translation direction. Buffered text is kept.
    pub fn swap_direction(&mut self) -> Direction {
        let direction = self.translation.swap();
        self.emit(UiEvent::DirectionSwapped {
            direction,
            source_label: self.translation.source().label.clone(),
            target_label: self.translation.target().label.clone(),
        });
        let dictating = self
            .speech_in
            .active()
            .is_some_and(|c| c.field == TextField::TranslatorInput);
        if !dictating {
            self.emit(UiEvent::PlaceholderChanged {
                field: TextField::TranslatorInput,
                text: self.translation.placeholder().to_string(),
            });
        }
        direction
    }

    /// Copy the translation output. Returns `false` when there is nothing to
    /// copy.
    pub fn copy_translation(&mut self) -> Result<bool, ChatError> {
        let Some(text) = self.translation.finished_output().map(str::to_string) else {
            return Ok(false);
        };
        let Some(clipboard) = self.clipboard.as_mut() else {
            return Err(ChatError::Clipboard("no clipboard available".to_string()));
        };
        clipboard.set_text(&text)?;
        self.emit(UiEvent::Copied {
            chars: text.chars().count(),
        });
        Ok(true)
    }

    fn on_translation_done(&mut self, ticket: u64, result: Result<String, ChatError>) {
        let Some(ok) = self.translation.complete(ticket, result) else {
            debug!(ticket, "Stale translation dropped");
            return;
        };
        self.translation_task = None;
        if ok {
            self.emit(UiEvent::TranslationCompleted {
                text: self.translation.output().to_string(),
            });
        } else {
            self.emit(UiEvent::TranslationFailed);
        }
        self.emit(UiEvent::ControlChanged {
            control: ControlId::TranslateTrigger,
            visual: ControlVisual::Idle,
        });
    }

    // =========================================================================
    // Speech output
    // =========================================================================

    /// Speak `text` for `control`, or stop if `control` is already speaking.
    ///
    /// `language` overrides the mode-derived playback language.
    pub fn speak(&mut self, control: ControlId, text: &str, language: Option<&str>) {
        let Some(synthesizer) = self.synthesizer.clone() else {
            debug!("No synthesizer, speak ignored");
            return;
        };
        if text.trim().is_empty() {
            return;
        }

        match self.speech_out.request(control) {
            SpeakDecision::Stop { control } => {
                synthesizer.cancel();
                self.abort_speech_task();
                self.emit(UiEvent::ControlChanged {
                    control,
                    visual: ControlVisual::Idle,
                });
            }
            SpeakDecision::Start { ticket, preempted } => {
                if let Some(previous) = preempted {
                    synthesizer.cancel();
                    self.abort_speech_task();
                    self.emit(UiEvent::ControlChanged {
                        control: previous,
                        visual: ControlVisual::Idle,
                    });
                }
                let language = language.unwrap_or(self.speech_language()).to_string();
                let utterance = prepare_utterance(text, &language, &self.voices);
                debug!(
                    control = %control,
                    language = %utterance.language,
                    voice = ?utterance.voice.as_ref().map(|v| &v.name),
                    "Speaking"
                );
                self.emit(UiEvent::ControlChanged {
                    control,
                    visual: ControlVisual::Playing,
                });
                let tx = self.completions_tx.clone();
                self.speech_task = Some(tokio::spawn(async move {
                    let result = synthesizer.speak(utterance).await;
                    let _ = tx.send(Completion::SpeechEnded { ticket, result });
                }));
            }
        }
    }

    /// Speak or stop the welcome entry.
    pub fn speak_welcome(&mut self) {
        let Some(text) = self.transcript.welcome().map(|w| w.text.clone()) else {
            return;
        };
        self.speak(ControlId::WelcomePlayback, &text, None);
    }

    /// Speak or stop a completed assistant reply.
    pub fn speak_message(&mut self, id: MessageId) {
        let Some(text) = self
            .transcript
            .get(id)
            .filter(|m| m.role == Role::Assistant && m.status == MessageStatus::Complete)
            .map(|m| m.raw_text.clone())
        else {
            return;
        };
        self.speak(ControlId::MessagePlayback(id), &text, None);
    }

    /// Speak or stop the translation output in the target language.
    pub fn speak_translation(&mut self) {
        let Some(text) = self.translation.finished_output().map(str::to_string) else {
            return;
        };
        self.speak(ControlId::TranslationPlayback, &text, None);
    }

    /// Stop any playback.
    pub fn stop_speech(&mut self) {
        let Some(control) = self.speech_out.stop() else {
            return;
        };
        if let Some(synthesizer) = &self.synthesizer {
            synthesizer.cancel();
        }
        self.abort_speech_task();
        self.emit(UiEvent::ControlChanged {
            control,
            visual: ControlVisual::Idle,
        });
    }

    fn abort_speech_task(&mut self) {
        if let Some(task) = self.speech_task.take() {
            task.abort();
        }
    }

    /// Reload the voice catalog from the synthesizer.
    pub fn refresh_voices(&mut self) {
        let Some(synthesizer) = self.synthesizer.clone() else {
            return;
        };
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let voices = synthesizer.voices().await;
            let _ = tx.send(Completion::VoicesChanged { voices });
        });
    }

    fn on_speech_ended(&mut self, ticket: u64, result: Result<(), SpeechError>) {
        if let Err(e) = &result {
            if !matches!(e, SpeechError::Cancelled) {
                warn!(error = %e, "Speech playback failed");
            }
        }
        if let Some(control) = self.speech_out.finish(ticket) {
            self.speech_task = None;
            self.emit(UiEvent::ControlChanged {
                control,
                visual: ControlVisual::Idle,
            });
        }
    }

    // =========================================================================
    // Speech input
    // =========================================================================

    /// Start dictation into `field`.
    pub fn start_capture(&mut self, field: TextField) {
        let Some(recognizer) = self.recognizer.clone() else {
            debug!("No recognizer, capture ignored");
            return;
        };
        let mode = self.mode();
        let visible = match field {
            TextField::Composer => mode.is_chat(),
            TextField::TranslatorInput => mode == Mode::Translator,
        };
        if !visible {
            debug!(field = ?field, mode = %mode, "Field not shown, capture ignored");
            return;
        }

        let language = self.recognition_language().to_string();
        let Some(capture) = self.speech_in.start(field, language) else {
            return;
        };
        let (ticket, control, language) = (capture.ticket, capture.control, capture.language.clone());

        self.emit(UiEvent::ControlChanged {
            control,
            visual: ControlVisual::Recording,
        });
        self.emit(UiEvent::PlaceholderChanged {
            field,
            text: LISTENING_PLACEHOLDER.to_string(),
        });

        let tx = self.completions_tx.clone();
        self.capture_task = Some(tokio::spawn(async move {
            let result = recognizer.recognize(&language).await;
            let _ = tx.send(Completion::CaptureFinished { ticket, result });
        }));
    }

    /// Ask the recognizer to end the current utterance early.
    pub fn stop_capture(&mut self) {
        if self.speech_in.request_stop() {
            if let Some(recognizer) = &self.recognizer {
                recognizer.stop();
            }
        }
    }

    pub fn toggle_capture(&mut self, field: TextField) {
        if self.speech_in.is_capturing() {
            self.stop_capture();
        } else {
            self.start_capture(field);
        }
    }

    fn cancel_capture(&mut self) {
        let Some(capture) = self.speech_in.cancel() else {
            return;
        };
        if let Some(recognizer) = &self.recognizer {
            recognizer.stop();
        }
        if let Some(task) = self.capture_task.take() {
            task.abort();
        }
        self.restore_capture_controls(&capture);
    }

    fn restore_capture_controls(&self, capture: &Capture) {
        self.emit(UiEvent::ControlChanged {
            control: capture.control,
            visual: ControlVisual::Idle,
        });
        self.emit(UiEvent::PlaceholderChanged {
            field: capture.field,
            text: self.field_placeholder(capture.field),
        });
    }

    fn on_capture_finished(&mut self, ticket: u64, result: Result<Option<String>, SpeechError>) {
        let Some(capture) = self.speech_in.finish(ticket) else {
            return;
        };
        self.capture_task = None;
        match result {
            Ok(Some(text)) => self.append_to_field(capture.field, &text),
            Ok(None) => debug!("Nothing recognized"),
            Err(e) => warn!(error = %e, "Speech recognition failed"),
        }
        self.restore_capture_controls(&capture);
    }

    fn append_to_field(&mut self, field: TextField, transcript: &str) {
        let text = match field {
            TextField::Composer => {
                self.composer = append_transcript(&self.composer, transcript);
                self.composer.clone()
            }
            TextField::TranslatorInput => {
                let text = append_transcript(self.translation.input(), transcript);
                self.translation.set_input(text.clone());
                text
            }
        };
        self.emit(UiEvent::FieldTextChanged { field, text });
    }

    // =========================================================================
    // Completion queue
    // =========================================================================

    /// Wait for the next completion. Cancel safe.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions_rx.recv().await
    }

    /// Apply one completion to the owned state.
    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::StreamFragment { ticket, fragment } => self.on_fragment(ticket, fragment),
            Completion::StreamFailed { ticket, error } => self.on_stream_failed(ticket, error),
            Completion::StreamEnded { ticket } => self.on_stream_ended(ticket),
            Completion::TranslationDone { ticket, result } => {
                self.on_translation_done(ticket, result)
            }
            Completion::SpeechEnded { ticket, result } => self.on_speech_ended(ticket, result),
            Completion::CaptureFinished { ticket, result } => {
                self.on_capture_finished(ticket, result)
            }
            Completion::VoicesChanged { voices } => match voices {
                Ok(voices) => {
                    info!(count = voices.len(), "Voices loaded");
                    self.voices.replace(voices);
                }
                Err(e) => warn!(error = %e, "Voice list unavailable"),
            },
        }
    }

    /// Apply every completion already queued. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Apply completions until nothing is in flight.
    pub async fn settle(&mut self) {
        while self.is_busy() {
            match self.completions_rx.recv().await {
                Some(completion) => self.apply(completion),
                None => break,
            }
        }
        self.pump();
    }
}

impl Drop for ModeOrchestrator {
    fn drop(&mut self) {
        if let Some(active) = self.stream.take() {
            active.task.abort();
        }
        for task in [
            self.translation_task.take(),
            self.speech_task.take(),
            self.capture_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
    }
}

/// Forward one streamed reply into the completion queue, in arrival order.
async fn forward_stream(
    backend: Arc<dyn ConversationBackend>,
    handle: SessionHandle,
    text: String,
    ticket: u64,
    tx: mpsc::UnboundedSender<Completion>,
) {
    let mut stream = match backend.send_streaming(handle, &text).await {
        Ok(stream) => stream,
        Err(error) => {
            let _ = tx.send(Completion::StreamFailed { ticket, error });
            return;
        }
    };
    while let Some(item) = stream.next().await {
        let completion = match item {
            Ok(fragment) => Completion::StreamFragment { ticket, fragment },
            Err(error) => {
                let _ = tx.send(Completion::StreamFailed { ticket, error });
                return;
            }
        };
        if tx.send(completion).is_err() {
            return;
        }
    }
    let _ = tx.send(Completion::StreamEnded { ticket });
}
