//! Breadcrumb paths recorded while the decoder walks nested values.
//!
//! A path is attached to every error raised below the top level so callers can tell which
//! field, key or element triggered it. Rendering rules:
//! - record fields and map keys are joined with `.`;
//! - sequence indices are rendered as `[n]` without a separator;
//! - the empty path renders as `<root>`.

use std::fmt;

use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// A record field, named by its resolved identifier.
    Field,
    /// A map key, rendered through its textual form.
    Key,
    /// A position inside a sequence.
    Index,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub(crate) kind: PathKind,
    pub(crate) name: String,
}

impl PathSegment {
    pub(crate) fn field<S: Into<String>>(name: S) -> Self {
        Self {
            kind: PathKind::Field,
            name: name.into(),
        }
    }

    pub(crate) fn key<S: Into<String>>(name: S) -> Self {
        Self {
            kind: PathKind::Key,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        Self {
            kind: PathKind::Index,
            name: value.to_string(),
        }
    }
}

/// Location of a value relative to the top-level source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: SmallVec<[PathSegment; 8]>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, seg: PathSegment) {
        self.segments.push(seg);
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Name of the innermost segment, if any.
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(|seg| seg.name.as_str())
    }

    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (idx, seg) in self.segments.iter().enumerate() {
            match seg.kind {
                PathKind::Index => write!(f, "[{}]", seg.name)?,
                PathKind::Field | PathKind::Key => {
                    if idx > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(&seg.name)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_renders_as_root() {
        assert_eq!(Path::root().to_string(), "<root>");
        assert!(Path::root().leaf().is_none());
    }

    #[test]
    fn mixed_segments_render_with_dots_and_brackets() {
        let mut path = Path::root();
        path.push(PathSegment::field("nested"));
        path.push(PathSegment::key("items"));
        path.push(PathSegment::from(2usize));
        path.push(PathSegment::field("name"));
        assert_eq!(path.to_string(), "nested.items[2].name");
        assert_eq!(path.leaf(), Some("name"));

        path.pop();
        path.pop();
        assert_eq!(path.to_string(), "nested.items");
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn leading_index_has_no_separator() {
        let mut path = Path::root();
        path.push(PathSegment::from(0usize));
        path.push(PathSegment::field("age"));
        assert_eq!(path.to_string(), "[0].age");
    }
}
