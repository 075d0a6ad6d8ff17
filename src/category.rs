//! Canonical metadata categories.
//!
//! Every canonical term the harmonizer handles maps onto one [`Category`].
//! The category decides how raw values are homogenized (see
//! [`crate::gather`]) and which validation strategy applies (see
//! [`crate::validate`]). Terms with no dedicated category land in
//! [`Category::Other`], which passes values through unchanged.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    MetadataIdentifier,
    DataIdentifier,
    TemporalCoverage,
    SpatialCoverage,
    PersonIdentifier,
    Keywords,
    Format,
    License,
    ResourceDiscovery,
    MetadataAccessibility,
    MetadataConnection,
    DataConnection,
    /// Any other canonical term, carried by name.
    Other(String),
}

impl Category {
    /// Map a canonical term name onto its category.
    pub fn from_term(term: &str) -> Self {
        match term {
            "Metadata Identifier" => Category::MetadataIdentifier,
            "Data Identifier" => Category::DataIdentifier,
            "Temporal Coverage" => Category::TemporalCoverage,
            "Spatial Coverage" => Category::SpatialCoverage,
            "Person Identifier" => Category::PersonIdentifier,
            "Keywords" => Category::Keywords,
            "Format" => Category::Format,
            "License" => Category::License,
            "Metadata for Resource Discovery" => Category::ResourceDiscovery,
            // Deployed configs carry the historical spelling.
            "Metadata for accesibility" | "Metadata for accessibility" => {
                Category::MetadataAccessibility
            }
            "Metadata connection" => Category::MetadataConnection,
            "Data connection" => Category::DataConnection,
            other => Category::Other(other.to_string()),
        }
    }

    /// The canonical term name, as used for `controlled_vocabularies` lookups.
    pub fn term(&self) -> &str {
        match self {
            Category::MetadataIdentifier => "Metadata Identifier",
            Category::DataIdentifier => "Data Identifier",
            Category::TemporalCoverage => "Temporal Coverage",
            Category::SpatialCoverage => "Spatial Coverage",
            Category::PersonIdentifier => "Person Identifier",
            Category::Keywords => "Keywords",
            Category::Format => "Format",
            Category::License => "License",
            Category::ResourceDiscovery => "Metadata for Resource Discovery",
            Category::MetadataAccessibility => "Metadata for accesibility",
            Category::MetadataConnection => "Metadata connection",
            Category::DataConnection => "Data connection",
            Category::Other(name) => name,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.term())
    }
}
