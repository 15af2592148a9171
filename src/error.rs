//! Domain errors that callers need to tell apart
//!
//! Most functions return `anyhow::Result`. The variants here are the failures
//! the CLI reacts to differently (soft warning vs. abort), so they travel as a
//! typed error inside `anyhow::Error` and are recovered with `downcast_ref`.

use std::path::PathBuf;
use thiserror::Error;

/// External capability the agent depends on but does not implement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    TextEncoder,
    ImageEncoder,
    TextExtractor,
    VectorStore,
}

impl std::fmt::Display for Collaborator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Collaborator::TextEncoder => "text encoder",
            Collaborator::ImageEncoder => "image encoder",
            Collaborator::TextExtractor => "text extractor",
            Collaborator::VectorStore => "vector store",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Only PDF files are supported: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("File not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Invalid topic name '{0}': topics must be a single directory name")]
    InvalidTopic(String),

    #[error("Cannot score an empty result list")]
    EmptyDistances,

    #[error("Distance at position {index} is not a finite number")]
    InvalidDistance { index: usize },

    #[error("Collection '{collection}' stores {stored}-dimensional vectors, encoder produces {requested}")]
    DimensionMismatch {
        collection: String,
        stored: usize,
        requested: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{collaborator} unavailable: {reason}")]
    CollaboratorUnavailable {
        collaborator: Collaborator,
        reason: String,
    },
}

impl AgentError {
    /// Wrap a collaborator failure, keeping the whole context chain as the reason
    pub fn collaborator(collaborator: Collaborator, err: impl Into<anyhow::Error>) -> Self {
        AgentError::CollaboratorUnavailable {
            collaborator,
            reason: format!("{:#}", err.into()),
        }
    }

    /// Input problems are reported as warnings, not failures
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            AgentError::UnsupportedFormat(_)
                | AgentError::MissingInput(_)
                | AgentError::InvalidTopic(_)
        )
    }
}

/// Tag a fallible collaborator call with the collaborator it came from
pub trait CollaboratorResultExt<T> {
    fn via(self, collaborator: Collaborator) -> anyhow::Result<T>;
}

impl<T, E> CollaboratorResultExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn via(self, collaborator: Collaborator) -> anyhow::Result<T> {
        self.map_err(|e| {
            let err: anyhow::Error = e.into();
            // Already classified (dimension mismatch, unsupported input, ...)
            if err.downcast_ref::<AgentError>().is_some() {
                err
            } else {
                AgentError::collaborator(collaborator, err).into()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_via_wraps_raw_errors_only() {
        let raw: Result<(), anyhow::Error> = Err(anyhow::anyhow!("disk full"));
        let err = raw.via(Collaborator::VectorStore).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::CollaboratorUnavailable {
                collaborator: Collaborator::VectorStore,
                ..
            })
        ));

        let typed: Result<(), anyhow::Error> = Err(AgentError::EmptyDistances.into());
        let err = typed.via(Collaborator::VectorStore).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::EmptyDistances)
        ));
    }

    #[test]
    fn test_collaborator_error_keeps_context_chain() {
        let inner = anyhow::anyhow!("model.onnx missing").context("Failed to load ONNX model");
        let err = AgentError::collaborator(Collaborator::TextEncoder, inner);
        let message = err.to_string();
        assert!(message.starts_with("text encoder unavailable"));
        assert!(message.contains("Failed to load ONNX model"));
        assert!(message.contains("model.onnx missing"));
    }

    #[test]
    fn test_user_input_classification() {
        assert!(AgentError::UnsupportedFormat(PathBuf::from("a.txt")).is_user_input());
        assert!(AgentError::InvalidTopic("../x".into()).is_user_input());
        assert!(!AgentError::EmptyDistances.is_user_input());
        assert!(!AgentError::collaborator(Collaborator::VectorStore, anyhow::anyhow!("io"))
            .is_user_input());
    }
}
