use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::model::{
    ContentKey, Question, QuestionKind, Section, Subject, SubjectContent, TestContent,
    WritingTask,
};
use crate::error::ContentError;

/// How a document is validated and how shorthand entries are expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Keys that must be present and non-empty.
    pub required: BTreeSet<ContentKey>,
    /// Questions generated for a listening subject given only as a title.
    pub listening_questions: usize,
    pub task1_min_words: usize,
    pub task2_min_words: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            required: ContentKey::ALL.into_iter().collect(),
            listening_questions: 40,
            task1_min_words: 150,
            task2_min_words: 250,
        }
    }
}

impl LoadOptions {
    pub fn requiring(keys: impl IntoIterator<Item = ContentKey>) -> Self {
        Self {
            required: keys.into_iter().collect(),
            ..Self::default()
        }
    }

    fn default_min_words(&self, key: ContentKey) -> usize {
        match key {
            ContentKey::Task2 => self.task2_min_words,
            _ => self.task1_min_words,
        }
    }
}

#[derive(Deserialize)]
struct RawSubject {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: String,
    #[serde(default)]
    duration_secs: Option<i64>,
    #[serde(default)]
    min_words: Option<i64>,
    #[serde(default)]
    questions: Option<Vec<RawQuestion>>,
}

#[derive(Deserialize)]
struct RawQuestion {
    id: String,
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    kind: QuestionKind,
}

/// Parses and validates a JSON content document.
pub(crate) fn parse(source: &str, options: &LoadOptions) -> Result<TestContent, ContentError> {
    let root: Value =
        serde_json::from_str(source).map_err(|e| ContentError::malformed("$", e.to_string()))?;
    let root = root
        .as_object()
        .ok_or_else(|| ContentError::malformed("$", "expected an object at the top level"))?;

    let mut subjects = BTreeMap::new();
    for key in ContentKey::ALL {
        let path = key.path();
        let required = options.required.contains(&key);
        let items = match lookup(root, key)? {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(ContentError::malformed(path, "expected a list of subjects")),
            None if required => return Err(ContentError::MissingSection { path }),
            None => continue,
        };
        if items.is_empty() && required {
            return Err(ContentError::EmptySection { path });
        }

        let parsed = parse_subjects(key, &path, items, options)?;
        debug!(key = %path, subjects = parsed.len(), "parsed content section");
        subjects.insert(key, parsed);
    }

    Ok(TestContent { subjects })
}

fn lookup(root: &Map<String, Value>, key: ContentKey) -> Result<Option<&Value>, ContentError> {
    let Some(node) = root.get(key.root()) else {
        return Ok(None);
    };
    match key.module() {
        None => Ok(Some(node)),
        Some(module) => {
            let by_module = node.as_object().ok_or_else(|| {
                ContentError::malformed(key.root(), "expected `academic` and `general` lists")
            })?;
            Ok(by_module.get(module.as_key()))
        }
    }
}

fn parse_subjects(
    key: ContentKey,
    path: &str,
    items: &[Value],
    options: &LoadOptions,
) -> Result<Vec<Subject>, ContentError> {
    let mut seen = HashSet::new();
    let mut subjects = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{idx}]");
        let subject = match item {
            Value::String(title) => expand_shorthand(key, &item_path, idx, title, options)?,
            Value::Object(_) => parse_record(key, &item_path, item, options)?,
            _ => {
                return Err(ContentError::malformed(
                    item_path,
                    "expected a subject record or title",
                ))
            }
        };
        if !seen.insert(subject.id.clone()) {
            return Err(ContentError::malformed(
                format!("{item_path}.id"),
                format!("duplicate subject id `{}`", subject.id),
            ));
        }
        subjects.push(subject);
    }
    Ok(subjects)
}

fn expand_shorthand(
    key: ContentKey,
    path: &str,
    idx: usize,
    title: &str,
    options: &LoadOptions,
) -> Result<Subject, ContentError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ContentError::malformed(path, "subject title is empty"));
    }
    let id = match slugify(title) {
        slug if slug.is_empty() => format!("subject-{}", idx + 1),
        slug => slug,
    };
    let content = match key.section() {
        Section::Listening => SubjectContent::Questions(
            (1..=options.listening_questions)
                .map(|n| Question {
                    id: format!("Q{n}"),
                    prompt: format!("Question {n}"),
                    kind: QuestionKind::default(),
                })
                .collect(),
        ),
        Section::Writing => SubjectContent::Task(WritingTask {
            min_words: options.default_min_words(key),
        }),
        Section::Reading => {
            return Err(ContentError::malformed(
                path,
                "a reading passage needs a record with a body and questions",
            ))
        }
    };
    Ok(Subject {
        id,
        title: title.to_string(),
        body: String::new(),
        duration: None,
        content,
    })
}

fn parse_record(
    key: ContentKey,
    path: &str,
    item: &Value,
    options: &LoadOptions,
) -> Result<Subject, ContentError> {
    let raw: RawSubject = serde_json::from_value(item.clone())
        .map_err(|e| ContentError::malformed(path, e.to_string()))?;

    if raw.id.trim().is_empty() {
        return Err(ContentError::malformed(format!("{path}.id"), "subject id is empty"));
    }
    let duration = match raw.duration_secs {
        Some(secs) if secs <= 0 => {
            return Err(ContentError::malformed(
                format!("{path}.duration_secs"),
                "duration must be positive",
            ))
        }
        Some(secs) => Some(Duration::from_secs(secs.unsigned_abs())),
        None => None,
    };

    let content = match key.section() {
        Section::Writing => {
            if raw.questions.is_some() {
                return Err(ContentError::malformed(
                    format!("{path}.questions"),
                    "writing tasks take a single free-text response",
                ));
            }
            let min_words = match raw.min_words {
                Some(n) if n <= 0 => {
                    return Err(ContentError::malformed(
                        format!("{path}.min_words"),
                        "word-count minimum must be positive",
                    ))
                }
                Some(n) => n.unsigned_abs() as usize,
                None => options.default_min_words(key),
            };
            SubjectContent::Task(WritingTask { min_words })
        }
        Section::Reading | Section::Listening => {
            if key.section() == Section::Reading && raw.body.trim().is_empty() {
                return Err(ContentError::malformed(
                    format!("{path}.body"),
                    "reading passage body is empty",
                ));
            }
            let questions = raw.questions.unwrap_or_default();
            if questions.is_empty() {
                return Err(ContentError::malformed(
                    format!("{path}.questions"),
                    "subject needs at least one question",
                ));
            }
            SubjectContent::Questions(parse_questions(&format!("{path}.questions"), questions)?)
        }
    };

    Ok(Subject {
        title: raw.title.unwrap_or_else(|| raw.id.clone()),
        id: raw.id,
        body: raw.body,
        duration,
        content,
    })
}

fn parse_questions(path: &str, raw: Vec<RawQuestion>) -> Result<Vec<Question>, ContentError> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .enumerate()
        .map(|(idx, q)| {
            let q_path = format!("{path}[{idx}]");
            if q.id.trim().is_empty() {
                return Err(ContentError::malformed(
                    format!("{q_path}.id"),
                    "question id is empty",
                ));
            }
            if !seen.insert(q.id.clone()) {
                return Err(ContentError::malformed(
                    format!("{q_path}.id"),
                    format!("duplicate question id `{}`", q.id),
                ));
            }
            if q.kind.is_choice() && q.kind.option_labels().len() < 2 {
                return Err(ContentError::malformed(
                    format!("{q_path}.kind"),
                    "a choice question needs at least two options",
                ));
            }
            Ok(Question {
                prompt: q.prompt,
                id: q.id,
                kind: q.kind,
            })
        })
        .collect()
}

fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
