//! Helper functions for the body parser.
//!
//! - State transitions
//! - Text emission
//! - Per-name caches for general entities and element definitions

use super::{BodyParser, BodyState};
use crate::entity::{EntityType, EntityValue, lookup_entity};

/// What a general entity reference expands to, resolved once per name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum GenEntity {
    /// Neither declared nor a known character entity.
    Undefined,
    /// Text inserted as is, without markup recognition.
    SimpleText(String),
    /// Replacement text that must be parsed.
    Parsed { name: String, text: String },
    /// Replacement text that is a processing instruction.
    ProcInstr(String),
    /// Replacement text that must be fetched through the resolver.
    External {
        name: String,
        entity_type: EntityType,
        public_ident: Option<String>,
        system_ident: Option<String>,
    },
}

/// Per-element properties, resolved once per folded name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ElementDef {
    /// Content is raw text, delivered through a dedicated callback.
    pub(super) use_special_cdata_content_handler: bool,
    /// Content is handed to the `script` callback.
    pub(super) consider_content_as_script: bool,
}

// =============================================================================
// State Transition Helpers
// =============================================================================

impl BodyParser<'_, '_> {
    pub(super) const fn switch_to(&mut self, new_state: BodyState) {
        self.state = new_state;
    }
}

// =============================================================================
// Emission Helpers
// =============================================================================

impl BodyParser<'_, '_> {
    /// Deliver pending character data. Called before every other event so
    /// that events arrive in document order.
    pub(super) fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.callbacks.text(&text);
        }
    }
}

// =============================================================================
// Caches
// =============================================================================

impl BodyParser<'_, '_> {
    /// Resolve a general entity name: entities declared in the internal
    /// subset first, then the HTML character entities.
    ///
    /// The character entity table is always matched case-sensitively, even
    /// when `case_insensitive` is set: `&Agrave;` and `&agrave;` name
    /// different characters, so folding would make the lookup ambiguous.
    pub(super) fn general_entity(&mut self, name: &str) -> GenEntity {
        if let Some(cached) = self.entity_cache.get(name) {
            return cached.clone();
        }
        let resolved = self.resolve_general_entity(name);
        let _ = self.entity_cache.insert(name.to_string(), resolved.clone());
        resolved
    }

    fn resolve_general_entity(&self, name: &str) -> GenEntity {
        if let Some(entity) = self.doctype_def.general.get(name) {
            return match (&entity.value, entity.entity_type) {
                (EntityValue::Internal(text), EntityType::ProcessingInstruction) => {
                    GenEntity::ProcInstr(text.clone())
                }
                (EntityValue::Internal(text), EntityType::Cdata | EntityType::Sdata) => {
                    GenEntity::SimpleText(text.clone())
                }
                (EntityValue::Internal(text), EntityType::Regular) => {
                    // `]` may start a marked section end, which needs the
                    // entity boundary to be tracked.
                    if text.contains(['<', '&', ']']) {
                        GenEntity::Parsed {
                            name: entity.name.clone(),
                            text: text.clone(),
                        }
                    } else {
                        GenEntity::SimpleText(text.clone())
                    }
                }
                (
                    EntityValue::External {
                        public_ident,
                        system_ident,
                    },
                    entity_type,
                ) => GenEntity::External {
                    name: entity.name.clone(),
                    entity_type,
                    public_ident: public_ident.clone(),
                    system_ident: system_ident.clone(),
                },
            };
        }
        lookup_entity(name).map_or(GenEntity::Undefined, |c| GenEntity::SimpleText(c.to_string()))
    }

    /// Properties of the element named `name`.
    pub(super) fn element_def(&mut self, name: &str) -> ElementDef {
        let key = self.ctx.fold(name);
        if let Some(def) = self.element_cache.get(&key) {
            return *def;
        }
        // Raw text elements are recognized regardless of case folding.
        let is_script = name.eq_ignore_ascii_case("script");
        let is_style = name.eq_ignore_ascii_case("style");
        let def = ElementDef {
            use_special_cdata_content_handler: is_script || is_style,
            consider_content_as_script: is_script,
        };
        let _ = self.element_cache.insert(key, def);
        def
    }
}
