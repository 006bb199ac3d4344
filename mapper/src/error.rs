use thiserror::Error;

use crate::path::PathError;

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("failed to parse XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("no element matching <{tag}> in the document")]
    NoMatchingElement { tag: String },
    #[error(transparent)]
    Path(#[from] PathError),
}
