//! Map XML documents to objects without writing a schema first.
//!
//! [`parse`] infers a [`TypeDefinition`] from the document itself and then extracts the document
//! with it:
//!
//! ```
//! let address = dt_mapper::parse(
//!     r#"<address><street>Milchstrasse</street><country code="de">Germany</country></address>"#,
//! )
//! .unwrap();
//! assert_eq!(address["street"], "Milchstrasse");
//! assert_eq!(address["country"]["code"], "de");
//! assert_eq!(address["country"]["content"], "Germany");
//! ```

pub mod attribute;
pub mod builder;
pub mod error;
pub mod extractor;
pub mod namespaces;
pub mod naming;
pub mod path;
pub mod type_def;
pub mod value;

mod node;

pub use attribute::{AttributeLookup, AttributeRule, Found};
pub use builder::build;
pub use error::MapperError;
pub use extractor::{Extraction, Extractor, ResultMode};
pub use namespaces::NamespaceRegistrations;
pub use naming::normalize;
pub use path::{PathError, PathExpression, PathMatch, PathOptions};
pub use type_def::{Cardinality, FieldDefinition, TypeDefinition, ValueType, CONTENT_FIELD};
pub use value::{Object, Value};

use roxmltree::Document;
use tracing::debug;

/// Options for reading XML input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MapperOptions {
    /// Allow a Document Type Definition (DTD) to occur.
    pub allow_dtd: bool,
    /// Maximum number of nodes in a document.
    pub nodes_limit: u32,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            allow_dtd: false,
            nodes_limit: u32::MAX,
        }
    }
}

impl MapperOptions {
    pub(crate) fn parsing_options(&self) -> roxmltree::ParsingOptions {
        roxmltree::ParsingOptions {
            allow_dtd: self.allow_dtd,
            nodes_limit: self.nodes_limit,
            ..Default::default()
        }
    }
}

/// Infer the type definition of the document's root element.
pub fn infer(xml: &str, options: &MapperOptions) -> Result<TypeDefinition, MapperError> {
    let document = Document::parse_with_options(xml, options.parsing_options())?;
    Ok(build(document.root_element()))
}

/// Infer a schema from `xml` and extract the root element with it.
pub fn parse(xml: &str) -> Result<Object, MapperError> {
    parse_with_options(xml, &MapperOptions::default())
}

pub fn parse_with_options(xml: &str, options: &MapperOptions) -> Result<Object, MapperError> {
    parse_with_extractor(xml, options, &Extractor::new())
}

/// Like [`parse`], extracting with a configured [`Extractor`] (callbacks, path options).
pub fn parse_with_extractor(
    xml: &str,
    options: &MapperOptions,
    extractor: &Extractor,
) -> Result<Object, MapperError> {
    let document = Document::parse_with_options(xml, options.parsing_options())?;
    let root_type = build(document.root_element());
    debug!(tag = %root_type.tag, "extracting with inferred schema");
    extractor
        .extract(&root_type, &document, ResultMode::Single)
        .into_single()
        .ok_or(MapperError::NoMatchingElement { tag: root_type.tag })
}
