//! Section session state machine.
//!
//! A [`SectionSession`] runs one exam section: it holds the selected subject,
//! the answers, the countdown and (for listening) the simulated recording.
//! All commands run to completion synchronously and either apply fully or
//! return a [`SessionError`] with nothing changed. State changes are queued as
//! [`SessionEvent`]s for the front-end to drain.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::audio::{Playback, PlaybackEvent};
use crate::completion::{summarize, CompletionSummary};
use crate::config::Config;
use crate::content::{Answer, ContentKey, Module, SectionSlot, Subject, TestContent};
use crate::error::SessionError;
use crate::timer::{SectionTimer, TimerEvent, TimerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum EndReason {
    UserEnded,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Ended(EndReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    AnswerRecorded {
        question: String,
        summary: CompletionSummary,
    },
    TimeWarning {
        remaining: Duration,
    },
    /// The section clock ran out; followed by a change to `Ended(TimedOut)`.
    TimeUp,
    Playback(PlaybackEvent),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettings {
    pub parts: usize,
    pub part_length: Duration,
    /// Pausing the recording also pauses the section clock.
    pub pause_holds_timer: bool,
}

/// Per-section timing, derived from [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub default_duration: Duration,
    pub warnings: Vec<Duration>,
    pub playback: Option<PlaybackSettings>,
}

/// Written when a session ends.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub key: ContentKey,
    pub subject_id: String,
    pub reason: EndReason,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub time_used: Duration,
    pub summary: CompletionSummary,
}

#[derive(Debug)]
pub struct SectionSession {
    key: ContentKey,
    settings: SessionSettings,
    state: SessionState,
    subject: Option<Subject>,
    answers: BTreeMap<String, Answer>,
    timer: SectionTimer,
    playback: Option<Playback>,
    summary: CompletionSummary,
    started_at: Option<DateTime<Local>>,
    report: Option<SessionReport>,
    events: Vec<SessionEvent>,
}

impl SectionSession {
    pub fn new(key: ContentKey, settings: SessionSettings) -> Self {
        let timer = SectionTimer::with_warnings(settings.warnings.iter().copied());
        Self {
            key,
            settings,
            state: SessionState::Idle,
            subject: None,
            answers: BTreeMap::new(),
            timer,
            playback: None,
            summary: CompletionSummary::default(),
            started_at: None,
            report: None,
            events: Vec::new(),
        }
    }

    pub fn select_subject(&mut self, subject: Subject) -> Result<(), SessionError> {
        self.require(SessionState::Idle, "select a subject")?;
        debug!(key = %self.key, subject = %subject.id, "subject selected");
        self.subject = Some(subject);
        self.answers.clear();
        self.recompute();
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::Idle, "start")?;
        let Some(subject) = &self.subject else {
            return Err(SessionError::NoSubjectSelected);
        };
        let duration = self.planned_duration();
        self.timer.start(duration)?;

        self.playback = self
            .settings
            .playback
            .as_ref()
            .map(|p| Playback::new(p.parts, p.part_length));
        self.started_at = Some(Local::now());
        self.report = None;
        info!(key = %self.key, subject = %subject.id, secs = duration.as_secs(), "section started");
        self.transition(SessionState::Running);
        Ok(())
    }

    pub fn submit_answer(&mut self, question_id: &str, value: Answer) -> Result<(), SessionError> {
        self.require(SessionState::Running, "submit an answer")?;
        let subject = self.subject.as_ref().ok_or(SessionError::NoSubjectSelected)?;
        if !subject.has_slot(question_id) {
            return Err(SessionError::UnknownQuestion(question_id.to_string()));
        }
        let check = match subject.question(question_id) {
            Some(question) => question.kind.check(&value),
            None if value.as_text().is_some() || value.is_blank() => Ok(()),
            None => Err("expected a text response".to_string()),
        };
        check.map_err(|reason| SessionError::InvalidAnswer {
            question: question_id.to_string(),
            reason,
        })?;

        if value.is_blank() {
            self.answers.remove(question_id);
        } else {
            self.answers.insert(question_id.to_string(), value);
        }
        self.recompute();
        self.events.push(SessionEvent::AnswerRecorded {
            question: question_id.to_string(),
            summary: self.summary,
        });
        Ok(())
    }

    pub fn end(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::Running, "end")?;
        self.finish(EndReason::UserEnded);
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), SessionError> {
        if !matches!(self.state, SessionState::Ended(_)) {
            return Err(SessionError::InvalidTransition {
                state: self.state,
                action: "reset",
            });
        }
        self.answers.clear();
        self.timer.reset();
        self.playback = None;
        self.started_at = None;
        self.recompute();
        self.transition(SessionState::Idle);
        Ok(())
    }

    /// Advances the clock and recording. Ignored unless the session is running.
    pub fn tick(&mut self, elapsed: Duration) {
        if self.state != SessionState::Running {
            return;
        }
        if let Some(playback) = &mut self.playback {
            for event in playback.tick(elapsed) {
                debug!(key = %self.key, ?event, "recording progress");
                self.events.push(SessionEvent::Playback(event));
            }
        }
        for event in self.timer.tick(elapsed) {
            match event {
                TimerEvent::Warning { remaining } => {
                    info!(key = %self.key, remaining_secs = remaining.as_secs(), "time warning");
                    self.events.push(SessionEvent::TimeWarning { remaining });
                }
                TimerEvent::Expired => {
                    self.events.push(SessionEvent::TimeUp);
                    self.finish(EndReason::TimedOut);
                }
            }
        }
    }

    pub fn play_audio(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::Running, "play the recording")?;
        let hold = self.pause_holds_timer();
        let playback = self.playback.as_mut().ok_or(SessionError::NoPlayback)?;
        playback.play()?;
        if hold && self.timer.state() == TimerState::Paused {
            self.timer.resume()?;
        }
        Ok(())
    }

    pub fn pause_audio(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::Running, "pause the recording")?;
        let hold = self.pause_holds_timer();
        let playback = self.playback.as_mut().ok_or(SessionError::NoPlayback)?;
        playback.pause()?;
        if hold {
            self.timer.pause()?;
        }
        Ok(())
    }

    /// Takes the queued events, oldest first.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Time budget for the selected subject, or the section default.
    pub fn planned_duration(&self) -> Duration {
        self.subject
            .as_ref()
            .and_then(|s| s.duration)
            .unwrap_or(self.settings.default_duration)
    }

    pub fn key(&self) -> ContentKey {
        self.key
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn summary(&self) -> CompletionSummary {
        self.summary
    }

    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    pub fn answers(&self) -> &BTreeMap<String, Answer> {
        &self.answers
    }

    pub fn timer(&self) -> &SectionTimer {
        &self.timer
    }

    pub fn playback(&self) -> Option<&Playback> {
        self.playback.as_ref()
    }

    /// Report of the most recent run, available once it has ended.
    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    pub fn accepts_answers(&self) -> bool {
        self.state == SessionState::Running
    }

    fn pause_holds_timer(&self) -> bool {
        self.settings
            .playback
            .as_ref()
            .is_some_and(|p| p.pause_holds_timer)
    }

    fn require(&self, expected: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }

    fn recompute(&mut self) {
        self.summary = summarize(self.subject.as_ref(), &self.answers);
    }

    fn finish(&mut self, reason: EndReason) {
        self.timer.stop();
        if let Some(playback) = &mut self.playback {
            playback.stop();
        }
        self.recompute();
        let ended_at = Local::now();
        if let Some(subject) = &self.subject {
            self.report = Some(SessionReport {
                key: self.key,
                subject_id: subject.id.clone(),
                reason,
                started_at: self.started_at.unwrap_or(ended_at),
                ended_at,
                time_used: self.timer.elapsed(),
                summary: self.summary,
            });
        }
        info!(key = %self.key, %reason, summary = %self.summary.label(), "section ended");
        self.transition(SessionState::Ended(reason));
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        self.state = to;
        debug!(key = %self.key, %from, %to, "session state changed");
        self.events.push(SessionEvent::StateChanged { from, to });
    }
}

/// One independent session per exam part, sharing a read-only content snapshot.
#[derive(Debug)]
pub struct ExamSessions {
    content: Arc<TestContent>,
    config: Config,
    module: Module,
    // in SectionSlot::ALL order
    sessions: Vec<SectionSession>,
}

fn slot_index(slot: SectionSlot) -> usize {
    match slot {
        SectionSlot::Listening => 0,
        SectionSlot::Reading => 1,
        SectionSlot::Task1 => 2,
        SectionSlot::Task2 => 3,
    }
}

impl ExamSessions {
    pub fn new(content: Arc<TestContent>, config: &Config) -> Self {
        let module = config.module;
        let sessions = SectionSlot::ALL
            .into_iter()
            .map(|slot| {
                let key = slot.key(module);
                SectionSession::new(key, config.session_settings(key))
            })
            .collect();
        Self {
            content,
            config: config.clone(),
            module,
            sessions,
        }
    }

    pub fn content(&self) -> &Arc<TestContent> {
        &self.content
    }

    pub fn module(&self) -> Module {
        self.module
    }

    pub fn session(&self, slot: SectionSlot) -> &SectionSession {
        &self.sessions[slot_index(slot)]
    }

    pub fn session_mut(&mut self, slot: SectionSlot) -> &mut SectionSession {
        &mut self.sessions[slot_index(slot)]
    }

    pub fn subject_list(&self, slot: SectionSlot) -> &[Subject] {
        self.content.subjects_for(self.session(slot).key())
    }

    /// Selects a subject by id from this slot's list.
    pub fn select(&mut self, slot: SectionSlot, subject_id: &str) -> Result<(), SessionError> {
        let subject = self
            .subject_list(slot)
            .iter()
            .find(|s| s.id == subject_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSubject(subject_id.to_string()))?;
        self.session_mut(slot).select_subject(subject)
    }

    /// Switches Academic/General. Every module-dependent session must be idle;
    /// they are recreated with no subject selected.
    pub fn set_module(&mut self, module: Module) -> Result<(), SessionError> {
        if module == self.module {
            return Ok(());
        }
        let dependent = SectionSlot::ALL.into_iter().filter(|s| s.depends_on_module());
        for slot in dependent.clone() {
            let session = self.session(slot);
            if session.state() != SessionState::Idle {
                return Err(SessionError::InvalidTransition {
                    state: session.state(),
                    action: "change module",
                });
            }
        }
        for slot in dependent {
            let key = slot.key(module);
            let session = SectionSession::new(key, self.config.session_settings(key));
            self.sessions[slot_index(slot)] = session;
        }
        info!(%module, "module changed");
        self.module = module;
        Ok(())
    }

    /// Swaps in a newer snapshot. Running sessions keep their own subject copy.
    pub fn replace_content(&mut self, content: Arc<TestContent>) {
        self.content = content;
    }

    pub fn tick(&mut self, elapsed: Duration) {
        for session in &mut self.sessions {
            session.tick(elapsed);
        }
    }

    /// Queued events of every session, tagged with the slot that raised them.
    pub fn drain_events(&mut self) -> Vec<(SectionSlot, SessionEvent)> {
        SectionSlot::ALL
            .into_iter()
            .flat_map(|slot| {
                self.sessions[slot_index(slot)]
                    .drain_events()
                    .into_iter()
                    .map(move |event| (slot, event))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentStore, LoadOptions, Question, QuestionKind, SubjectContent, WritingTask};
    use crate::error::{PlaybackError, SessionErrorKind};
    use assert_matches::assert_matches;

    const SEC: Duration = Duration::from_secs(1);

    fn settings(secs: u64) -> SessionSettings {
        SessionSettings {
            default_duration: Duration::from_secs(secs),
            warnings: vec![Duration::from_secs(600), Duration::from_secs(300)],
            playback: None,
        }
    }

    fn passage() -> Subject {
        Subject {
            id: "P1".into(),
            title: "Passage 1".into(),
            body: "Some passage text.".into(),
            duration: None,
            content: SubjectContent::Questions(vec![
                Question {
                    id: "Q1".into(),
                    prompt: "First".into(),
                    kind: QuestionKind::default(),
                },
                Question {
                    id: "Q2".into(),
                    prompt: "Second".into(),
                    kind: QuestionKind::TrueFalseNotGiven,
                },
            ]),
        }
    }

    fn essay() -> Subject {
        Subject {
            id: "T2".into(),
            title: "Essay".into(),
            body: "Discuss.".into(),
            duration: Some(Duration::from_secs(2400)),
            content: SubjectContent::Task(WritingTask { min_words: 5 }),
        }
    }

    fn running_reading() -> SectionSession {
        let mut session = SectionSession::new(ContentKey::Reading(Module::Academic), settings(3600));
        session.select_subject(passage()).unwrap();
        session.start().unwrap();
        session.drain_events();
        session
    }

    #[test]
    fn start_requires_subject() {
        let mut session = SectionSession::new(ContentKey::Listening, settings(2400));
        assert_eq!(session.start(), Err(SessionError::NoSubjectSelected));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn start_twice_is_invalid_and_leaves_state() {
        let mut session = running_reading();
        session.tick(Duration::from_secs(10));
        let remaining = session.timer().remaining();

        let err = session.start().unwrap_err();
        assert_eq!(err.kind(), SessionErrorKind::InvalidTransition);
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.timer().remaining(), remaining);
    }

    #[test]
    fn select_while_running_is_rejected() {
        let mut session = running_reading();
        assert_matches!(
            session.select_subject(essay()),
            Err(SessionError::InvalidTransition {
                state: SessionState::Running,
                ..
            })
        );
        assert_eq!(session.subject().unwrap().id, "P1");
    }

    #[test]
    fn answers_before_start_are_rejected() {
        let mut session = SectionSession::new(ContentKey::Reading(Module::Academic), settings(60));
        session.select_subject(passage()).unwrap();
        let err = session
            .submit_answer("Q1", Answer::Text("x".into()))
            .unwrap_err();
        assert_eq!(err.kind(), SessionErrorKind::InvalidTransition);
    }

    #[test]
    fn unknown_question_leaves_answers_unchanged() {
        let mut session = running_reading();
        session.submit_answer("Q1", Answer::Text("glass".into())).unwrap();
        let before = session.answers().clone();

        assert_eq!(
            session.submit_answer("Q7", Answer::Text("x".into())),
            Err(SessionError::UnknownQuestion("Q7".into()))
        );
        assert_eq!(session.answers(), &before);
    }

    #[test]
    fn mismatched_answer_shape_is_rejected() {
        let mut session = running_reading();
        let err = session.submit_answer("Q2", Answer::Choice(5)).unwrap_err();
        assert_eq!(err.kind(), SessionErrorKind::InvalidAnswer);
        assert!(session.answer("Q2").is_none());
    }

    #[test]
    fn answers_update_summary_and_emit_event() {
        let mut session = running_reading();
        session.submit_answer("Q2", Answer::Choice(0)).unwrap();
        let expected = CompletionSummary::Questions {
            answered: 1,
            total: 2,
        };
        assert_eq!(session.summary(), expected);
        assert_eq!(
            session.drain_events(),
            vec![SessionEvent::AnswerRecorded {
                question: "Q2".into(),
                summary: expected
            }]
        );
    }

    #[test]
    fn blank_answer_clears_previous_value() {
        let mut session = running_reading();
        session.submit_answer("Q1", Answer::Text("glass".into())).unwrap();
        session.submit_answer("Q1", Answer::Text(" ".into())).unwrap();
        assert!(session.answer("Q1").is_none());
        assert_eq!(
            session.summary(),
            CompletionSummary::Questions {
                answered: 0,
                total: 2
            }
        );
    }

    #[test]
    fn free_text_over_word_limit_is_rejected() {
        let mut subject = passage();
        if let SubjectContent::Questions(questions) = &mut subject.content {
            questions[0].kind = QuestionKind::FreeText { max_words: Some(1) };
        }
        let mut session = SectionSession::new(ContentKey::Reading(Module::Academic), settings(3600));
        session.select_subject(subject).unwrap();
        session.start().unwrap();
        session.drain_events();

        let err = session
            .submit_answer("Q1", Answer::Text("three whole words".into()))
            .unwrap_err();
        assert_eq!(err.kind(), SessionErrorKind::InvalidAnswer);
        assert!(session.answer("Q1").is_none());
        assert!(session.drain_events().is_empty());

        session.submit_answer("Q1", Answer::Text("nineteenth".into())).unwrap();
        assert_eq!(session.answer("Q1"), Some(&Answer::Text("nineteenth".into())));
    }

    #[test]
    fn user_end_produces_report() {
        let mut session = running_reading();
        session.submit_answer("Q1", Answer::Text("glass".into())).unwrap();
        session.tick(Duration::from_secs(30));
        session.end().unwrap();

        assert_eq!(session.state(), SessionState::Ended(EndReason::UserEnded));
        assert_eq!(session.timer().state(), TimerState::Stopped);
        assert_eq!(session.timer().remaining(), Duration::from_secs(3570));
        let report = session.report().unwrap();
        assert_eq!(report.subject_id, "P1");
        assert_eq!(report.reason, EndReason::UserEnded);
        assert_eq!(report.time_used, Duration::from_secs(30));
        assert!(report.ended_at >= report.started_at);

        let err = session
            .submit_answer("Q2", Answer::Choice(1))
            .unwrap_err();
        assert_eq!(err.kind(), SessionErrorKind::InvalidTransition);
    }

    #[test]
    fn end_is_only_valid_while_running() {
        let mut session = SectionSession::new(ContentKey::Task2, settings(60));
        assert_eq!(session.end().unwrap_err().kind(), SessionErrorKind::InvalidTransition);
        assert_eq!(session.reset().unwrap_err().kind(), SessionErrorKind::InvalidTransition);
    }

    #[test]
    fn timeout_ends_session_once() {
        let mut session = SectionSession::new(ContentKey::Task1(Module::Academic), settings(1200));
        let mut task = essay();
        task.duration = None;
        session.select_subject(task).unwrap();
        session.start().unwrap();

        for _ in 0..1300 {
            session.tick(SEC);
        }
        let events = session.drain_events();
        let time_ups = events.iter().filter(|e| **e == SessionEvent::TimeUp).count();
        let ended = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    SessionEvent::StateChanged {
                        to: SessionState::Ended(EndReason::TimedOut),
                        ..
                    }
                )
            })
            .count();
        assert_eq!(time_ups, 1);
        assert_eq!(ended, 1);
        assert_eq!(session.state(), SessionState::Ended(EndReason::TimedOut));
        assert_eq!(session.timer().remaining(), Duration::ZERO);
        assert_eq!(session.timer().state(), TimerState::Expired);
    }

    #[test]
    fn reset_keeps_subject_and_clears_answers() {
        let mut session = running_reading();
        session.submit_answer("Q1", Answer::Text("glass".into())).unwrap();
        session.end().unwrap();
        session.reset().unwrap();

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.answers().is_empty());
        assert_eq!(session.timer().state(), TimerState::Idle);
        assert_eq!(session.subject().unwrap().id, "P1");
        assert!(session.start().is_ok());
    }

    #[test]
    fn select_after_end_requires_reset() {
        let mut session = running_reading();
        session.end().unwrap();
        assert!(session.select_subject(passage()).is_err());
        session.reset().unwrap();
        assert!(session.select_subject(passage()).is_ok());
    }

    #[test]
    fn writing_word_count_tracks_single_slot() {
        let mut session = SectionSession::new(ContentKey::Task2, settings(2400));
        session.select_subject(essay()).unwrap();
        session.start().unwrap();
        assert_eq!(session.timer().duration(), Duration::from_secs(2400));

        session
            .submit_answer("T2", Answer::Text("one two three".into()))
            .unwrap();
        assert_eq!(
            session.summary(),
            CompletionSummary::Writing {
                word_count: 3,
                minimum: 5,
                meets_minimum: false
            }
        );
        session
            .submit_answer("T2", Answer::Text("one two three four five".into()))
            .unwrap();
        assert!(session.summary().is_complete());

        assert_eq!(
            session.submit_answer("T2", Answer::Choice(0)).unwrap_err().kind(),
            SessionErrorKind::InvalidAnswer
        );
    }

    #[test]
    fn warnings_are_queued() {
        let mut session = SectionSession::new(ContentKey::Task2, settings(700));
        session.select_subject({
            let mut e = essay();
            e.duration = None;
            e
        })
        .unwrap();
        session.start().unwrap();
        session.drain_events();
        session.tick(Duration::from_secs(100));
        assert_eq!(
            session.drain_events(),
            vec![SessionEvent::TimeWarning {
                remaining: Duration::from_secs(600)
            }]
        );
    }

    fn listening_settings(pause_holds_timer: bool) -> SessionSettings {
        SessionSettings {
            playback: Some(PlaybackSettings {
                parts: 2,
                part_length: Duration::from_secs(10),
                pause_holds_timer,
            }),
            ..settings(100)
        }
    }

    #[test]
    fn recording_advances_with_ticks() {
        let mut session = SectionSession::new(ContentKey::Listening, listening_settings(false));
        session.select_subject(passage()).unwrap();
        assert_eq!(session.play_audio().unwrap_err().kind(), SessionErrorKind::InvalidTransition);
        session.start().unwrap();
        session.play_audio().unwrap();
        session.drain_events();

        session.tick(Duration::from_secs(10));
        assert_eq!(
            session.drain_events(),
            vec![SessionEvent::Playback(PlaybackEvent::PartFinished { part: 1 })]
        );
        assert_eq!(session.playback().unwrap().part(), 2);
    }

    #[test]
    fn pausing_audio_keeps_clock_running_by_default() {
        let mut session = SectionSession::new(ContentKey::Listening, listening_settings(false));
        session.select_subject(passage()).unwrap();
        session.start().unwrap();
        session.play_audio().unwrap();
        session.pause_audio().unwrap();
        session.tick(Duration::from_secs(5));
        assert_eq!(session.timer().remaining(), Duration::from_secs(95));
    }

    #[test]
    fn pausing_audio_can_hold_clock() {
        let mut session = SectionSession::new(ContentKey::Listening, listening_settings(true));
        session.select_subject(passage()).unwrap();
        session.start().unwrap();
        session.play_audio().unwrap();
        session.pause_audio().unwrap();
        session.tick(Duration::from_secs(5));
        assert_eq!(session.timer().remaining(), Duration::from_secs(100));

        session.play_audio().unwrap();
        session.tick(Duration::from_secs(5));
        assert_eq!(session.timer().remaining(), Duration::from_secs(95));
    }

    #[test]
    fn audio_errors_are_typed() {
        let mut session = running_reading();
        assert_eq!(session.play_audio(), Err(SessionError::NoPlayback));

        let mut listening = SectionSession::new(ContentKey::Listening, listening_settings(false));
        listening.select_subject(passage()).unwrap();
        listening.start().unwrap();
        assert_eq!(
            listening.pause_audio(),
            Err(SessionError::Playback(PlaybackError::NotPlaying))
        );
    }

    #[test]
    fn exam_sessions_select_by_id() {
        let store = ContentStore::bundled("sample", LoadOptions::default()).unwrap();
        let mut exam = ExamSessions::new(store.snapshot(), &Config::default());

        assert!(!exam.subject_list(SectionSlot::Reading).is_empty());
        exam.select(SectionSlot::Reading, "glass-history").unwrap();
        assert_eq!(
            exam.select(SectionSlot::Reading, "missing"),
            Err(SessionError::UnknownSubject("missing".into()))
        );

        exam.session_mut(SectionSlot::Reading).start().unwrap();
        // the passage overrides the 60 minute default
        assert_eq!(
            exam.session(SectionSlot::Reading).timer().duration(),
            Duration::from_secs(1200)
        );
    }

    #[test]
    fn module_change_requires_idle_sessions() {
        let store = ContentStore::bundled("sample", LoadOptions::default()).unwrap();
        let mut exam = ExamSessions::new(store.snapshot(), &Config::default());

        exam.set_module(Module::General).unwrap();
        assert_eq!(
            exam.session(SectionSlot::Task1).key(),
            ContentKey::Task1(Module::General)
        );
        assert_eq!(exam.subject_list(SectionSlot::Reading)[0].id, "gym-membership");

        exam.select(SectionSlot::Reading, "gym-membership").unwrap();
        exam.session_mut(SectionSlot::Reading).start().unwrap();
        assert_eq!(
            exam.set_module(Module::Academic).unwrap_err().kind(),
            SessionErrorKind::InvalidTransition
        );
        assert_eq!(exam.module(), Module::General);
    }

    #[test]
    fn sessions_tick_independently() {
        let store = ContentStore::bundled("sample", LoadOptions::default()).unwrap();
        let mut exam = ExamSessions::new(store.snapshot(), &Config::default());
        exam.select(SectionSlot::Task2, "remote-work").unwrap();
        exam.session_mut(SectionSlot::Task2).start().unwrap();

        exam.tick(Duration::from_secs(60));
        assert_eq!(
            exam.session(SectionSlot::Task2).timer().elapsed(),
            Duration::from_secs(60)
        );
        assert_eq!(
            exam.session(SectionSlot::Task1).timer().state(),
            TimerState::Idle
        );
    }
}
