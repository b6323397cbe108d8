use std::sync::OnceLock;

use xref_store::Container;
use xref_types::{ObjectToken, RefKind, Selection};

use crate::error::{CodecError, CodecResult};

/// What a reference points at within its target object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefTarget {
    /// The whole object.
    Object,
    /// A selection of the object's elements.
    Region(Selection),
    /// A named attribute of the object.
    Attribute(String),
}

impl RefTarget {
    pub fn kind(&self) -> RefKind {
        match self {
            Self::Object => RefKind::Object,
            Self::Region(_) => RefKind::Region,
            Self::Attribute(_) => RefKind::Attribute,
        }
    }
}

/// In-memory reference to an object, region, or attribute.
///
/// A handle may hold a live [`Container`] (a capability that keeps the
/// container open while the handle exists), or only the container's name
/// when it was decoded from an external reference that could not be
/// resolved. A handle with neither is implicitly scoped to whatever
/// container it is decoded from.
#[derive(Clone, Debug)]
pub struct ReferenceHandle {
    target: RefTarget,
    token: ObjectToken,
    container: Option<Container>,
    container_name: Option<String>,
    encode_size: OnceLock<usize>,
}

impl ReferenceHandle {
    fn build(container: Container, token: ObjectToken, target: RefTarget) -> CodecResult<Self> {
        check_token(&container, &token)?;
        Ok(Self {
            target,
            token,
            container_name: Some(container.name().to_string()),
            container: Some(container),
            encode_size: OnceLock::new(),
        })
    }

    /// Reference to a whole object in `container`.
    pub fn object(container: Container, token: ObjectToken) -> CodecResult<Self> {
        Self::build(container, token, RefTarget::Object)
    }

    /// Reference to a selection of an object in `container`.
    pub fn region(
        container: Container,
        token: ObjectToken,
        selection: Selection,
    ) -> CodecResult<Self> {
        Self::build(container, token, RefTarget::Region(selection))
    }

    /// Reference to an attribute of an object in `container`.
    pub fn attribute(
        container: Container,
        token: ObjectToken,
        name: impl Into<String>,
    ) -> CodecResult<Self> {
        Self::build(container, token, RefTarget::Attribute(name.into()))
    }

    /// Handle not bound to any container.
    pub fn detached(target: RefTarget, token: ObjectToken) -> Self {
        Self {
            target,
            token,
            container: None,
            container_name: None,
            encode_size: OnceLock::new(),
        }
    }

    /// Zero-token object reference used to probe the minimum encoded size.
    pub fn zeroed_object(token_size: usize) -> CodecResult<Self> {
        Ok(Self::detached(RefTarget::Object, ObjectToken::zeroed(token_size)?))
    }

    /// Record the name of the container the handle refers into without
    /// attaching a live container.
    pub fn with_container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = Some(name.into());
        self
    }

    pub fn kind(&self) -> RefKind {
        self.target.kind()
    }

    pub fn target(&self) -> &RefTarget {
        &self.target
    }

    pub fn token(&self) -> &ObjectToken {
        &self.token
    }

    pub fn selection(&self) -> Option<&Selection> {
        match &self.target {
            RefTarget::Region(selection) => Some(selection),
            _ => None,
        }
    }

    pub fn attribute_name(&self) -> Option<&str> {
        match &self.target {
            RefTarget::Attribute(name) => Some(name),
            _ => None,
        }
    }

    /// Live container, if one is attached.
    pub fn container(&self) -> Option<&Container> {
        self.container.as_ref()
    }

    /// Name of the container the handle refers into, if known.
    pub fn container_name(&self) -> Option<&str> {
        self.container_name.as_deref()
    }

    /// Attach a live handle to `container`, replacing any previous one.
    ///
    /// Fails if the token width does not match the container's.
    pub fn attach(&mut self, container: Container) -> CodecResult<()> {
        check_token(&container, &self.token)?;
        self.container_name = Some(container.name().to_string());
        self.container = Some(container);
        Ok(())
    }

    /// Container name to carry on the wire when encoding for `destination`,
    /// or `None` if the reference is local to it.
    pub fn external_name(&self, destination: Option<&Container>) -> Option<&str> {
        match (&self.container, destination) {
            (Some(own), Some(dst)) if own.same_as(dst) => None,
            (Some(own), Some(_)) => Some(own.name()),
            (Some(_), None) => None,
            (None, dst) => {
                let name = self.container_name.as_deref()?;
                match dst {
                    Some(dst) if dst.name() == name => None,
                    _ => Some(name),
                }
            }
        }
    }

    /// Returns `true` if encoding for `destination` sets the external flag.
    pub fn is_external_to(&self, destination: Option<&Container>) -> bool {
        self.external_name(destination).is_some()
    }

    /// Cached non-external encoded size. 0 until first computed.
    pub fn cached_encode_size(&self) -> usize {
        self.encode_size.get().copied().unwrap_or(0)
    }

    pub(crate) fn cache_encode_size(&self, size: usize) {
        let _ = self.encode_size.set(size);
    }
}

/// Handles are equal when they name the same target in the same container.
/// The size cache does not participate.
impl PartialEq for ReferenceHandle {
    fn eq(&self, other: &Self) -> bool {
        let same_container = match (&self.container, &other.container) {
            (Some(a), Some(b)) => a.same_as(b),
            _ => self.container_name == other.container_name,
        };
        self.target == other.target && self.token == other.token && same_container
    }
}

impl Eq for ReferenceHandle {}

fn check_token(container: &Container, token: &ObjectToken) -> CodecResult<()> {
    if token.len() != container.token_size() {
        return Err(CodecError::TokenSize {
            expected: container.token_size(),
            actual: token.len(),
        });
    }
    Ok(())
}
