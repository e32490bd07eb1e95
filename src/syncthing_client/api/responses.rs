use super::types::Completion;

/// Result of a completion lookup; the daemon answers 404 for pairs it has no data for.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionLookup {
    Found(Completion),
    NotFound,
}

impl From<Option<Completion>> for CompletionLookup {
    fn from(value: Option<Completion>) -> Self {
        match value {
            Some(completion) => CompletionLookup::Found(completion),
            None => CompletionLookup::NotFound,
        }
    }
}
