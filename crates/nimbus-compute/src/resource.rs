// crates/nimbus-compute/src/resource.rs
// ============================================================================
// Module: Compute Resources
// Description: Resource identifiers and the resource family descriptor table.
// Purpose: Replace name-based method dispatch with a tagged resource enum.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Resource families (`servers`, `images`, `flavors`) are modeled as
//! [`ResourceKind`] variants, each mapped to a static [`ResourceDescriptor`]
//! naming its path segment, nested sub-resources, and whether it accepts
//! writes. [`ResourceId`] is the opaque identifier rendered into paths.
//!
//! Invariants:
//! - An empty text identifier is absent and never rendered into a path.
//! - A numeric identifier is always present, including `0`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Opaque identifier of a server, image, flavor, or floating IP.
///
/// Serializes untagged so numeric ids stay numbers in request bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    /// Numeric identifier.
    Number(u64),
    /// Text identifier; empty text means "absent".
    Text(String),
}

impl ResourceId {
    /// Returns the absent identifier.
    #[must_use]
    pub const fn none() -> Self {
        Self::Text(String::new())
    }

    /// Returns true when the identifier should be rendered into a path.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        match self {
            Self::Number(_) => true,
            Self::Text(text) => !text.is_empty(),
        }
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => value.fmt(f),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ResourceId {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<u64> for ResourceId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for ResourceId {
    fn from(value: u32) -> Self {
        Self::Number(u64::from(value))
    }
}

impl From<&Self> for ResourceId {
    fn from(value: &Self) -> Self {
        value.clone()
    }
}

// ============================================================================
// SECTION: Resource Families
// ============================================================================

/// Top-level compute resource families with their own path namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Virtual machines.
    Servers,
    /// Bootable images.
    Images,
    /// Hardware flavors.
    Flavors,
}

/// Static description of a resource family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Family this descriptor belongs to.
    pub kind: ResourceKind,
    /// Path segment naming the collection.
    pub segment: &'static str,
    /// Nested sub-resources reachable under `/<segment>/<id>/`.
    pub subresources: &'static [&'static str],
    /// Whether POST, PUT, and DELETE are accepted.
    pub writable: bool,
}

/// Descriptor table indexed by [`ResourceKind`].
const DESCRIPTORS: [ResourceDescriptor; 3] = [
    ResourceDescriptor {
        kind: ResourceKind::Servers,
        segment: "servers",
        subresources: &["metadata", "ips"],
        writable: true,
    },
    ResourceDescriptor {
        kind: ResourceKind::Images,
        segment: "images",
        subresources: &["metadata"],
        writable: true,
    },
    ResourceDescriptor {
        kind: ResourceKind::Flavors,
        segment: "flavors",
        subresources: &[],
        writable: false,
    },
];

impl ResourceKind {
    /// All resource families in table order.
    pub const ALL: [Self; 3] = [Self::Servers, Self::Images, Self::Flavors];

    /// Returns the static descriptor for this family.
    #[must_use]
    pub const fn descriptor(self) -> &'static ResourceDescriptor {
        match self {
            Self::Servers => &DESCRIPTORS[0],
            Self::Images => &DESCRIPTORS[1],
            Self::Flavors => &DESCRIPTORS[2],
        }
    }

    /// Returns the collection path segment.
    #[must_use]
    pub const fn segment(self) -> &'static str {
        self.descriptor().segment
    }

    /// Returns true when `name` is a nested sub-resource of this family.
    #[must_use]
    pub fn has_subresource(self, name: &str) -> bool {
        self.descriptor().subresources.contains(&name)
    }

    /// Returns the singular envelope key for one entity of this family.
    #[must_use]
    pub const fn singular(self) -> &'static str {
        match self {
            Self::Servers => "server",
            Self::Images => "image",
            Self::Flavors => "flavor",
        }
    }

    /// Parses a collection path segment into a family.
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.segment() == segment)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}
