//! This module provides the Gene struct, representing a gene

use std::fmt::{Display, Formatter};

use derive_builder::Builder;
use indexmap::IndexMap;
use serde_json::Value;

/// Annotation key under which the source-database gene code is stored
pub const REFERENCE_GENE_KEY: &str = "kegg.genes";

/// Structure Representing a Gene
#[derive(Builder, Clone, Debug, PartialEq)]
pub struct Gene {
    /// Used to identify the gene
    pub id: String,
    /// Human Readable Gene Name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene Annotations
    #[builder(default = "IndexMap::new()")]
    pub annotation: IndexMap<String, Value>,
}

impl Gene {
    pub fn new(id: impl Into<String>) -> Gene {
        GeneBuilder::default().id(id.into()).build().unwrap()
    }

    /// Create a gene carrying its source-database gene code as an annotation
    pub fn with_reference(id: impl Into<String>, reference_code: &str) -> Gene {
        let mut gene = Gene::new(id);
        gene.annotation.insert(
            REFERENCE_GENE_KEY.to_string(),
            Value::String(reference_code.to_string()),
        );
        gene
    }

    /// The source-database gene code this gene was mapped from, if any
    pub fn reference_code(&self) -> Option<&str> {
        self.annotation.get(REFERENCE_GENE_KEY)?.as_str()
    }
}

impl Display for Gene {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
