//! Error types for content loading, section timers and exam sessions.
//!
//! Every command on the core either succeeds or returns one of these; a
//! failed command never leaves partially-applied state behind.

use std::path::PathBuf;

use thiserror::Error;

use crate::session::SessionState;
use crate::timer::TimerState;

/// Category of a [`ContentError`], for callers that only branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorKind {
    MalformedSchema,
    MissingSection,
    EmptySection,
    UnknownBundle,
    Io,
}

/// Failure to load a test-content document.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The document (or part of it) has the wrong shape.
    #[error("malformed content at `{path}`: {reason}")]
    MalformedSchema { path: String, reason: String },

    /// A required section key is absent.
    #[error("missing required section `{path}`")]
    MissingSection { path: String },

    /// A required section key resolves to an empty list.
    #[error("section `{path}` has no subjects")]
    EmptySection { path: String },

    /// No document with this name is compiled into the binary.
    #[error("no bundled content named `{name}`")]
    UnknownBundle { name: String },

    #[error("failed to read content file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ContentError::MalformedSchema {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ContentErrorKind {
        match self {
            ContentError::MalformedSchema { .. } => ContentErrorKind::MalformedSchema,
            ContentError::MissingSection { .. } => ContentErrorKind::MissingSection,
            ContentError::EmptySection { .. } => ContentErrorKind::EmptySection,
            ContentError::UnknownBundle { .. } => ContentErrorKind::UnknownBundle,
            ContentError::Io { .. } => ContentErrorKind::Io,
        }
    }

    /// Dotted document path of the offending node, when the error has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            ContentError::MalformedSchema { path, .. }
            | ContentError::MissingSection { path }
            | ContentError::EmptySection { path } => Some(path),
            ContentError::UnknownBundle { .. } | ContentError::Io { .. } => None,
        }
    }
}

/// Rejected timer command. The timer is unchanged when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("timer duration must be greater than zero")]
    InvalidDuration,

    #[error("cannot {action} a timer that is {state}")]
    InvalidState {
        state: TimerState,
        action: &'static str,
    },
}

/// Rejected audio playback command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("recording is already playing")]
    AlreadyPlaying,

    #[error("recording is not playing")]
    NotPlaying,

    #[error("all recording parts have been played")]
    Finished,
}

/// Category of a [`SessionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    InvalidTransition,
    NoSubjectSelected,
    UnknownQuestion,
    UnknownSubject,
    InvalidAnswer,
    NoPlayback,
    Playback,
    Timer,
}

/// Rejected session command. The session is unchanged when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while the session is {state}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },

    #[error("no subject has been selected")]
    NoSubjectSelected,

    #[error("question `{0}` is not part of the active subject")]
    UnknownQuestion(String),

    #[error("subject `{0}` does not exist in this section")]
    UnknownSubject(String),

    #[error("invalid answer for `{question}`: {reason}")]
    InvalidAnswer { question: String, reason: String },

    #[error("this section has no recording")]
    NoPlayback,

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    Timer(#[from] TimerError),
}

impl SessionError {
    pub fn kind(&self) -> SessionErrorKind {
        match self {
            SessionError::InvalidTransition { .. } => SessionErrorKind::InvalidTransition,
            SessionError::NoSubjectSelected => SessionErrorKind::NoSubjectSelected,
            SessionError::UnknownQuestion(_) => SessionErrorKind::UnknownQuestion,
            SessionError::UnknownSubject(_) => SessionErrorKind::UnknownSubject,
            SessionError::InvalidAnswer { .. } => SessionErrorKind::InvalidAnswer,
            SessionError::NoPlayback => SessionErrorKind::NoPlayback,
            SessionError::Playback(_) => SessionErrorKind::Playback,
            SessionError::Timer(_) => SessionErrorKind::Timer,
        }
    }
}
