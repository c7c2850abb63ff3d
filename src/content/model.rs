use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::completion::word_count;

/// Top-level test division with its own timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Section {
    Listening,
    Reading,
    Writing,
}

/// Academic or General Training variant.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    #[default]
    Academic,
    General,
}

impl Module {
    pub fn toggled(self) -> Self {
        match self {
            Module::Academic => Module::General,
            Module::General => Module::Academic,
        }
    }

    pub(crate) fn as_key(self) -> &'static str {
        match self {
            Module::Academic => "academic",
            Module::General => "general",
        }
    }
}

/// One session slot per exam part, independent of module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, strum_macros::Display)]
pub enum SectionSlot {
    Listening,
    Reading,
    Task1,
    Task2,
}

impl SectionSlot {
    pub const ALL: [SectionSlot; 4] = [
        SectionSlot::Listening,
        SectionSlot::Reading,
        SectionSlot::Task1,
        SectionSlot::Task2,
    ];

    pub fn key(self, module: Module) -> ContentKey {
        match self {
            SectionSlot::Listening => ContentKey::Listening,
            SectionSlot::Reading => ContentKey::Reading(module),
            SectionSlot::Task1 => ContentKey::Task1(module),
            SectionSlot::Task2 => ContentKey::Task2,
        }
    }

    pub fn next(self) -> Self {
        match self {
            SectionSlot::Listening => SectionSlot::Reading,
            SectionSlot::Reading => SectionSlot::Task1,
            SectionSlot::Task1 => SectionSlot::Task2,
            SectionSlot::Task2 => SectionSlot::Listening,
        }
    }

    pub fn depends_on_module(self) -> bool {
        matches!(self, SectionSlot::Reading | SectionSlot::Task1)
    }
}

/// Address of one subject list inside a content document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContentKey {
    Listening,
    Reading(Module),
    Task1(Module),
    Task2,
}

impl ContentKey {
    pub const ALL: [ContentKey; 6] = [
        ContentKey::Listening,
        ContentKey::Reading(Module::Academic),
        ContentKey::Reading(Module::General),
        ContentKey::Task1(Module::Academic),
        ContentKey::Task1(Module::General),
        ContentKey::Task2,
    ];

    pub fn section(self) -> Section {
        match self {
            ContentKey::Listening => Section::Listening,
            ContentKey::Reading(_) => Section::Reading,
            ContentKey::Task1(_) | ContentKey::Task2 => Section::Writing,
        }
    }

    pub fn slot(self) -> SectionSlot {
        match self {
            ContentKey::Listening => SectionSlot::Listening,
            ContentKey::Reading(_) => SectionSlot::Reading,
            ContentKey::Task1(_) => SectionSlot::Task1,
            ContentKey::Task2 => SectionSlot::Task2,
        }
    }

    pub fn module(self) -> Option<Module> {
        match self {
            ContentKey::Reading(m) | ContentKey::Task1(m) => Some(m),
            ContentKey::Listening | ContentKey::Task2 => None,
        }
    }

    /// Top-level document key holding this list.
    pub fn root(self) -> &'static str {
        match self {
            ContentKey::Listening => "listening_subjects",
            ContentKey::Reading(_) => "reading_subjects",
            ContentKey::Task1(_) => "task1_subjects",
            ContentKey::Task2 => "task2_subjects",
        }
    }

    /// Dotted path as written in the document, e.g. `reading_subjects.academic`.
    pub fn path(self) -> String {
        match self.module() {
            Some(m) => format!("{}.{}", self.root(), m.as_key()),
            None => self.root().to_string(),
        }
    }

    pub fn label(self) -> String {
        match self {
            ContentKey::Listening => "Listening".to_string(),
            ContentKey::Reading(m) => format!("Reading ({m})"),
            ContentKey::Task1(m) => format!("Writing Task 1 ({m})"),
            ContentKey::Task2 => "Writing Task 2".to_string(),
        }
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for ContentKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentKey::ALL
            .into_iter()
            .find(|key| key.path() == s)
            .ok_or_else(|| format!("unknown content key `{s}`"))
    }
}

impl TryFrom<String> for ContentKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentKey> for String {
    fn from(key: ContentKey) -> Self {
        key.path()
    }
}

/// Expected shape of a question's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    FreeText {
        #[serde(default)]
        max_words: Option<usize>,
    },
    SingleChoice {
        options: Vec<String>,
    },
    MultiChoice {
        options: Vec<String>,
        #[serde(default)]
        max_selections: Option<usize>,
    },
    TrueFalseNotGiven,
    YesNoNotGiven,
}

impl Default for QuestionKind {
    fn default() -> Self {
        QuestionKind::FreeText { max_words: None }
    }
}

impl QuestionKind {
    /// Labels a choice answer indexes into; empty for free text.
    pub fn option_labels(&self) -> Vec<&str> {
        match self {
            QuestionKind::FreeText { .. } => Vec::new(),
            QuestionKind::SingleChoice { options } | QuestionKind::MultiChoice { options, .. } => {
                options.iter().map(String::as_str).collect()
            }
            QuestionKind::TrueFalseNotGiven => vec!["True", "False", "Not Given"],
            QuestionKind::YesNoNotGiven => vec!["Yes", "No", "Not Given"],
        }
    }

    pub fn is_choice(&self) -> bool {
        !matches!(self, QuestionKind::FreeText { .. })
    }

    /// Checks that a non-blank answer fits this kind.
    pub fn check(&self, answer: &Answer) -> Result<(), String> {
        if answer.is_blank() {
            return Ok(());
        }
        let options = self.option_labels().len();
        match (self, answer) {
            (QuestionKind::FreeText { max_words: Some(max) }, Answer::Text(text))
                if word_count(text) > *max =>
            {
                Err(format!("at most {max} words"))
            }
            (QuestionKind::FreeText { .. }, Answer::Text(_)) => Ok(()),
            (QuestionKind::FreeText { .. }, _) => Err("expected a text answer".into()),
            (QuestionKind::MultiChoice { max_selections, .. }, Answer::Choices(picked)) => {
                if let Some(bad) = picked.iter().find(|&&i| i >= options) {
                    return Err(format!("option {} is out of range", bad + 1));
                }
                match max_selections {
                    Some(max) if picked.len() > *max => {
                        Err(format!("at most {max} options may be selected"))
                    }
                    _ => Ok(()),
                }
            }
            (QuestionKind::MultiChoice { .. }, _) => Err("expected a set of options".into()),
            (_, Answer::Choice(i)) if *i < options => Ok(()),
            (_, Answer::Choice(i)) => Err(format!("option {} is out of range", i + 1)),
            (_, _) => Err("expected a single option".into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub kind: QuestionKind,
}

/// A candidate's answer to one question or writing task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    Text(String),
    Choice(usize),
    Choices(BTreeSet<usize>),
}

impl Answer {
    /// Blank answers count as unanswered and clear the stored value.
    pub fn is_blank(&self) -> bool {
        match self {
            Answer::Text(text) => text.trim().is_empty(),
            Answer::Choice(_) => false,
            Answer::Choices(picked) => picked.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingTask {
    pub min_words: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectContent {
    Questions(Vec<Question>),
    Task(WritingTask),
}

/// One selectable test unit: a recording topic, a passage or a writing prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Overrides the section's default time budget.
    pub duration: Option<Duration>,
    pub content: SubjectContent,
}

impl Subject {
    pub fn questions(&self) -> &[Question] {
        match &self.content {
            SubjectContent::Questions(questions) => questions,
            SubjectContent::Task(_) => &[],
        }
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions().iter().find(|q| q.id == id)
    }

    pub fn writing_task(&self) -> Option<&WritingTask> {
        match &self.content {
            SubjectContent::Task(task) => Some(task),
            SubjectContent::Questions(_) => None,
        }
    }

    /// Writing tasks have one answer slot, keyed by the subject id.
    pub fn has_slot(&self, id: &str) -> bool {
        match &self.content {
            SubjectContent::Questions(_) => self.question(id).is_some(),
            SubjectContent::Task(_) => self.id == id,
        }
    }

    pub fn slot_ids(&self) -> Vec<&str> {
        match &self.content {
            SubjectContent::Questions(questions) => {
                questions.iter().map(|q| q.id.as_str()).collect()
            }
            SubjectContent::Task(_) => vec![self.id.as_str()],
        }
    }
}

/// Validated, immutable test content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestContent {
    pub(crate) subjects: BTreeMap<ContentKey, Vec<Subject>>,
}

impl TestContent {
    /// Subjects for a key in document order; empty when the key was optional and absent.
    pub fn subjects_for(&self, key: ContentKey) -> &[Subject] {
        self.subjects.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn subject(&self, key: ContentKey, id: &str) -> Option<&Subject> {
        self.subjects_for(key).iter().find(|s| s.id == id)
    }

    pub fn is_available(&self, key: ContentKey) -> bool {
        !self.subjects_for(key).is_empty()
    }

    pub fn subject_count(&self) -> usize {
        self.subjects.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_key_paths_roundtrip() {
        for key in ContentKey::ALL {
            assert_eq!(key.path().parse::<ContentKey>(), Ok(key));
        }
        assert_eq!(
            ContentKey::Task1(Module::General).path(),
            "task1_subjects.general"
        );
        assert!("task3_subjects".parse::<ContentKey>().is_err());
    }

    #[test]
    fn slot_keys_follow_module() {
        assert_eq!(
            SectionSlot::Reading.key(Module::General),
            ContentKey::Reading(Module::General)
        );
        assert_eq!(SectionSlot::Task2.key(Module::General), ContentKey::Task2);
        assert_eq!(ContentKey::Task1(Module::Academic).slot(), SectionSlot::Task1);
        assert_eq!(ContentKey::Task2.section(), Section::Writing);
    }

    #[test]
    fn choice_answers_are_range_checked() {
        let kind = QuestionKind::SingleChoice {
            options: vec!["A".into(), "B".into()],
        };
        assert!(kind.check(&Answer::Choice(1)).is_ok());
        assert!(kind.check(&Answer::Choice(2)).is_err());
        assert!(kind.check(&Answer::Text("B".into())).is_err());
        // clearing is always allowed
        assert!(kind.check(&Answer::Text("  ".into())).is_ok());
    }

    #[test]
    fn free_text_respects_word_limit() {
        let kind = QuestionKind::FreeText { max_words: Some(2) };
        assert!(kind.check(&Answer::Text("nineteenth century".into())).is_ok());
        assert_eq!(
            kind.check(&Answer::Text("the nineteenth century".into())),
            Err("at most 2 words".to_string())
        );

        let open = QuestionKind::FreeText { max_words: None };
        assert!(open.check(&Answer::Text("as long as you like".into())).is_ok());
    }

    #[test]
    fn true_false_not_given_has_three_options() {
        let kind = QuestionKind::TrueFalseNotGiven;
        assert_eq!(kind.option_labels(), vec!["True", "False", "Not Given"]);
        assert!(kind.check(&Answer::Choice(2)).is_ok());
        assert!(kind.check(&Answer::Choice(3)).is_err());
    }

    #[test]
    fn multi_choice_respects_selection_limit() {
        let kind = QuestionKind::MultiChoice {
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            max_selections: Some(2),
        };
        let two: BTreeSet<usize> = [0, 3].into_iter().collect();
        let three: BTreeSet<usize> = [0, 1, 3].into_iter().collect();
        assert!(kind.check(&Answer::Choices(two)).is_ok());
        assert!(kind.check(&Answer::Choices(three)).is_err());
        assert!(kind.check(&Answer::Choice(0)).is_err());
    }

    #[test]
    fn writing_subject_has_single_slot() {
        let subject = Subject {
            id: "T2-1".into(),
            title: "Remote work".into(),
            body: String::new(),
            duration: None,
            content: SubjectContent::Task(WritingTask { min_words: 250 }),
        };
        assert!(subject.has_slot("T2-1"));
        assert!(!subject.has_slot("Q1"));
        assert_eq!(subject.slot_ids(), vec!["T2-1"]);
        assert!(subject.questions().is_empty());
    }
}
