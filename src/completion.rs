//! Completion tracking: how much of the active subject has been answered.

use std::collections::BTreeMap;

use crate::content::{Answer, Subject, SubjectContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSummary {
    Questions {
        answered: usize,
        total: usize,
    },
    Writing {
        word_count: usize,
        minimum: usize,
        meets_minimum: bool,
    },
}

impl Default for CompletionSummary {
    fn default() -> Self {
        CompletionSummary::Questions {
            answered: 0,
            total: 0,
        }
    }
}

impl CompletionSummary {
    /// Fraction in `0.0..=1.0` for progress bars.
    pub fn progress_ratio(&self) -> f64 {
        let (done, target) = match *self {
            CompletionSummary::Questions { answered, total } => (answered, total),
            CompletionSummary::Writing {
                word_count,
                minimum,
                ..
            } => (word_count, minimum),
        };
        if target == 0 {
            return 0.0;
        }
        (done as f64 / target as f64).min(1.0)
    }

    pub fn is_complete(&self) -> bool {
        match *self {
            CompletionSummary::Questions { answered, total } => total > 0 && answered == total,
            CompletionSummary::Writing { meets_minimum, .. } => meets_minimum,
        }
    }

    pub fn label(&self) -> String {
        match *self {
            CompletionSummary::Questions { answered, total } => {
                format!("Completed: {answered}/{total} questions")
            }
            CompletionSummary::Writing {
                word_count,
                minimum,
                ..
            } => format!("Words: {word_count} (minimum {minimum})"),
        }
    }
}

/// Whitespace-separated, non-empty tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn summarize(subject: Option<&Subject>, answers: &BTreeMap<String, Answer>) -> CompletionSummary {
    let Some(subject) = subject else {
        return CompletionSummary::default();
    };
    match &subject.content {
        SubjectContent::Questions(questions) => CompletionSummary::Questions {
            answered: questions
                .iter()
                .filter(|q| answers.get(&q.id).is_some_and(|a| !a.is_blank()))
                .count(),
            total: questions.len(),
        },
        SubjectContent::Task(task) => {
            let word_count = answers
                .get(&subject.id)
                .and_then(Answer::as_text)
                .map_or(0, word_count);
            CompletionSummary::Writing {
                word_count,
                minimum: task.min_words,
                meets_minimum: word_count >= task.min_words,
            }
        }
    }
}
