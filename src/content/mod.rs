//! Test content: the validated document model and the store that loads it.

pub mod document;
pub mod model;
pub mod store;

pub use document::LoadOptions;
pub use model::{
    Answer, ContentKey, Module, Question, QuestionKind, Section, SectionSlot, Subject,
    SubjectContent, TestContent, WritingTask,
};
pub use store::ContentStore;
