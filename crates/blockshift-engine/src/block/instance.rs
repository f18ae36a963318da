use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::BlockName;
use crate::schema::{AttributeValue, Attributes};

/// Identity of a block instance within an editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        ClientId(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One concrete block with attribute values conforming to its type's schema.
///
/// Instances are only built by the registry, which validates the attributes
/// and fills in defaults. Editing gestures produce new values rather than
/// mutating existing ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockInstance {
    client_id: ClientId,
    name: BlockName,
    attributes: Attributes,
    /// Editing focus. Owned by the session, never persisted.
    #[serde(skip)]
    selected: bool,
}

impl BlockInstance {
    pub(crate) fn new(name: BlockName, attributes: Attributes) -> Self {
        Self {
            client_id: ClientId::new(),
            name,
            attributes,
            selected: false,
        }
    }

    /// Same identity, different attributes.
    pub(crate) fn with_attributes(&self, attributes: Attributes) -> Self {
        Self {
            client_id: self.client_id,
            name: self.name.clone(),
            attributes,
            selected: self.selected,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn name(&self) -> &BlockName {
        &self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}
