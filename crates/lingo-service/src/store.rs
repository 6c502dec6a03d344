//! The storage backend the services run against

use lingo_store::{EntityStore, LanguageStore, TranslationStore};

/// Entity, translation and language persistence behind one object.
pub trait LocalizedStore: EntityStore + TranslationStore + LanguageStore {}

impl<T> LocalizedStore for T where T: EntityStore + TranslationStore + LanguageStore + ?Sized {}
