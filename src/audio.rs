//! Simulated listening recording.
//!
//! There is no audio data: a recording is a sequence of equal-length parts
//! whose position advances with the same ticks that drive the section timer.
//! When a part finishes the player stops at the start of the next part and
//! waits for `play` again.

use std::time::Duration;

use crate::error::PlaybackError;
use crate::timer::format_clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// 1-based number of the part that just ended.
    PartFinished { part: usize },
    AllPartsFinished,
}

#[derive(Debug, Clone)]
pub struct Playback {
    part_length: Duration,
    parts: usize,
    part: usize,
    position: Duration,
    playing: bool,
    finished: bool,
}

impl Playback {
    pub fn new(parts: usize, part_length: Duration) -> Self {
        Self {
            part_length,
            parts: parts.max(1),
            part: 0,
            position: Duration::ZERO,
            playing: false,
            finished: false,
        }
    }

    pub fn play(&mut self) -> Result<(), PlaybackError> {
        if self.finished {
            return Err(PlaybackError::Finished);
        }
        if self.playing {
            return Err(PlaybackError::AlreadyPlaying);
        }
        self.playing = true;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        if !self.playing {
            return Err(PlaybackError::NotPlaying);
        }
        self.playing = false;
        Ok(())
    }

    /// Stops playback without an error if nothing is playing.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn tick(&mut self, elapsed: Duration) -> Vec<PlaybackEvent> {
        if !self.playing {
            return Vec::new();
        }
        self.position += elapsed;
        if self.position < self.part_length {
            return Vec::new();
        }

        self.playing = false;
        let mut events = vec![PlaybackEvent::PartFinished {
            part: self.part + 1,
        }];
        if self.part + 1 >= self.parts {
            self.position = self.part_length;
            self.finished = true;
            events.push(PlaybackEvent::AllPartsFinished);
        } else {
            self.part += 1;
            self.position = Duration::ZERO;
        }
        events
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 1-based number of the current part.
    pub fn part(&self) -> usize {
        self.part + 1
    }

    pub fn parts(&self) -> usize {
        self.parts
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn progress(&self) -> f64 {
        if self.part_length.is_zero() {
            return 1.0;
        }
        (self.position.as_secs_f64() / self.part_length.as_secs_f64()).min(1.0)
    }

    /// Position within the current part, e.g. `02:10 / 07:00`.
    pub fn clock(&self) -> String {
        format!(
            "{} / {}",
            format_clock(self.position),
            format_clock(self.part_length)
        )
    }
}
