use std::sync::Arc;

use crate::ast::ValueType;

/// Role of a path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathType {
    /// A root binder: a collection variable or a lambda parameter (`x`)
    Variable,

    /// A member of its parent (`x.Name`)
    Property,

    /// "Any element of" the parent collection (`x.Children.any()`).
    ///
    /// The static type of such a segment is the element type.
    CollectionAny,
}

impl PathType {
    /// Stable name used by the JSON tree encoding.
    pub fn name(self) -> &'static str {
        match self {
            PathType::Variable => "variable",
            PathType::Property => "property",
            PathType::CollectionAny => "any",
        }
    }

    /// Inverse of [`PathType::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "variable" => Some(PathType::Variable),
            "property" => Some(PathType::Property),
            "any" => Some(PathType::CollectionAny),
            _ => None,
        }
    }
}

/// Name, parent, and role of a path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathMetadata {
    pub name: String,
    /// Enclosing segment; `None` for a root. Chains are finite and acyclic
    /// because a parent must exist before its child can be built.
    pub parent: Option<Arc<Path>>,
    pub path_type: PathType,
}

/// A typed field reference.
///
/// Equality is structural: two paths are equal when their names, roles, and
/// static types agree along the whole parent chain.
///
/// # Examples
///
/// ```
/// use linq_rewrite::ast::{Path, ValueType};
///
/// let x = Path::variable("x", ValueType::object("Snapshot"));
/// let actions = Path::property(&x, "ClickActions", ValueType::Collection);
///
/// assert_eq!(actions.dotted(), "x.ClickActions");
/// assert_eq!(actions.root().name(), "x");
/// assert!(!actions.is_root());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    pub ty: ValueType,
    pub metadata: PathMetadata,
}

impl Path {
    /// A root binder named `name`.
    pub fn variable(name: impl Into<String>, ty: ValueType) -> Arc<Path> {
        Arc::new(Path {
            ty,
            metadata: PathMetadata {
                name: name.into(),
                parent: None,
                path_type: PathType::Variable,
            },
        })
    }

    /// The member `name` of `parent`.
    pub fn property(parent: &Arc<Path>, name: impl Into<String>, ty: ValueType) -> Arc<Path> {
        Arc::new(Path {
            ty,
            metadata: PathMetadata {
                name: name.into(),
                parent: Some(parent.clone()),
                path_type: PathType::Property,
            },
        })
    }

    /// The "any element of `collection`" marker, typed as the element.
    pub fn any(collection: &Arc<Path>, element: ValueType) -> Arc<Path> {
        Arc::new(Path {
            ty: element,
            metadata: PathMetadata {
                name: "any".to_string(),
                parent: Some(collection.clone()),
                path_type: PathType::CollectionAny,
            },
        })
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn parent(&self) -> Option<&Arc<Path>> {
        self.metadata.parent.as_ref()
    }

    pub fn path_type(&self) -> PathType {
        self.metadata.path_type
    }

    /// True when this segment has no parent.
    pub fn is_root(&self) -> bool {
        self.metadata.parent.is_none()
    }

    /// Outermost ancestor (the segment itself for a root).
    pub fn root(self: &Arc<Self>) -> &Arc<Path> {
        let mut current = self;
        while let Some(parent) = &current.metadata.parent {
            current = parent;
        }
        current
    }

    /// The same segment attached to another parent.
    pub fn with_parent(&self, parent: Arc<Path>) -> Arc<Path> {
        Arc::new(Path {
            ty: self.ty.clone(),
            metadata: PathMetadata {
                name: self.metadata.name.clone(),
                parent: Some(parent),
                path_type: self.metadata.path_type,
            },
        })
    }

    /// Canonical dotted text form, e.g. `x.ClickActions.any().ContactId`.
    pub fn dotted(&self) -> String {
        let segment = match self.metadata.path_type {
            PathType::CollectionAny => "any()",
            PathType::Variable | PathType::Property => self.metadata.name.as_str(),
        };
        match &self.metadata.parent {
            Some(parent) => format!("{}.{}", parent.dotted(), segment),
            None => segment.to_string(),
        }
    }
}
