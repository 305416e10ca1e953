//! Entity declarations and lookup tables.

/// Static HTML character entity table.
pub mod named_character_references;

use std::collections::HashMap;

use serde::Serialize;
use strum_macros::Display;

pub use named_character_references::{entity_names, lookup_entity};

use crate::names::fold;

/// How the replacement text of an entity is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum EntityType {
    /// Parsed replacement text: markup in it is recognized.
    #[strum(serialize = "regular")]
    Regular,
    /// Character data, inserted without markup recognition.
    #[strum(serialize = "CDATA")]
    Cdata,
    /// Specific character data, inserted without markup recognition.
    #[strum(serialize = "SDATA")]
    Sdata,
    /// The replacement text is a processing instruction. Only valid where a
    /// processing instruction may occur.
    #[strum(serialize = "PI")]
    ProcessingInstruction,
}

/// Where the replacement text of an entity comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EntityValue {
    /// Literal replacement text from the declaration.
    Internal(String),
    /// Text obtained through the resolver.
    External {
        /// `PUBLIC` identifier, if given.
        public_ident: Option<String>,
        /// `SYSTEM` identifier, if given.
        system_ident: Option<String>,
    },
}

/// A declared parameter or general entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    /// Name as written in the declaration.
    pub name: String,
    /// Interpretation of the replacement text.
    pub entity_type: EntityType,
    /// Replacement text or external identifiers.
    pub value: EntityValue,
}

impl Entity {
    /// An entity with literal replacement text.
    #[must_use]
    pub fn internal(name: &str, entity_type: EntityType, text: &str) -> Self {
        Self {
            name: name.to_string(),
            entity_type,
            value: EntityValue::Internal(text.to_string()),
        }
    }

    /// True if declared with `PUBLIC`/`SYSTEM` identifiers.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(self.value, EntityValue::External { .. })
    }

    /// Replacement text of an internal entity.
    #[must_use]
    pub fn replacement_text(&self) -> Option<&str> {
        match &self.value {
            EntityValue::Internal(text) => Some(text),
            EntityValue::External { .. } => None,
        }
    }
}

/// Entities of one namespace, keyed by folded name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityTable {
    case_insensitive: bool,
    entries: HashMap<String, Entity>,
}

impl EntityTable {
    /// An empty table that folds names if `case_insensitive` is set.
    #[must_use]
    pub fn new(case_insensitive: bool) -> Self {
        Self {
            case_insensitive,
            entries: HashMap::new(),
        }
    }

    /// Record a declaration. The first declaration of a name wins; returns
    /// `false` and leaves the table unchanged if the name is already declared.
    pub fn declare(&mut self, entity: Entity) -> bool {
        let key = fold(&entity.name, self.case_insensitive);
        if self.entries.contains_key(&key) {
            return false;
        }
        let _ = self.entries.insert(key, entity);
        true
    }

    /// Find an entity by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.entries.get(&fold(name, self.case_insensitive))
    }

    /// Number of declared entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All declared entities, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entries.values()
    }
}

/// Entities declared by one DTD scope.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DtdDefinitions {
    /// `<!ENTITY name ...>` declarations.
    pub general: EntityTable,
    /// `<!ENTITY % name ...>` declarations.
    pub parameter: EntityTable,
}

impl DtdDefinitions {
    /// Empty tables with the given folding.
    #[must_use]
    pub fn new(case_insensitive: bool) -> Self {
        Self {
            general: EntityTable::new(case_insensitive),
            parameter: EntityTable::new(case_insensitive),
        }
    }
}
