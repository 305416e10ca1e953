//! `<!ENTITY ...>` declarations.
//!
//! ```text
//! <!ENTITY [%] name ( "literal" | CDATA "literal" | SDATA "literal" | PI "literal"
//!                   | ( PUBLIC "pubid" ["sysid"] | SYSTEM ["sysid"] ) [CDATA | SDATA] ) >
//! ```

use super::DtdParser;
use crate::entity::{Entity, EntityType, EntityValue};
use crate::error::ParseError;

const DECL_NAME: &str = "ENTITY";

impl DtdParser<'_, '_, '_> {
    /// After the `ENTITY` keyword.
    pub(super) fn entity_declaration(&mut self) -> Result<(), ParseError> {
        let decl_level = self.ctx.level();
        if !self.skip_decl_space(decl_level)? {
            self.ctx.warn("Missing separator after ENTITY keyword")?;
        }

        let mut is_parameter = false;
        let mut name = self.eat_decl_word()?;
        if name == "%" {
            is_parameter = true;
            let _ = self.skip_decl_space(decl_level)?;
            name = self.eat_decl_word()?;
        }
        if !self.is_valid_name(&name) {
            if name.is_empty() {
                self.ctx.error("Missing entity name in ENTITY declaration")?;
            } else {
                self.ctx.error(format!("Invalid entity name '{name}'"))?;
            }
            return self.ctx.skip_declaration();
        }
        let _ = self.skip_decl_space(decl_level)?;

        let Some((entity_type, value)) = self.entity_text(&name, is_parameter, decl_level)? else {
            return self.ctx.skip_declaration();
        };
        self.end_decl(DECL_NAME, decl_level)?;

        let entity = Entity {
            name: name.clone(),
            entity_type,
            value,
        };
        let table = if is_parameter {
            &mut self.defs.parameter
        } else {
            &mut self.defs.general
        };
        if !table.declare(entity) {
            self.ctx
                .warn(format!("Redefinition of entity '{name}' ignored"))?;
        }
        Ok(())
    }

    fn is_valid_name(&self, name: &str) -> bool {
        let mut chars = name.chars();
        chars.next().is_some_and(|c| self.ctx.is_name_start(c))
            && chars.all(|c| self.ctx.is_name_char(c))
    }

    /// Parse the part after the entity name. Returns `None` after reporting an
    /// error that makes the declaration unusable.
    fn entity_text(
        &mut self,
        name: &str,
        is_parameter: bool,
        decl_level: usize,
    ) -> Result<Option<(EntityType, EntityValue)>, ParseError> {
        if matches!(self.ctx.peek()?, Some('"' | '\'')) {
            return Ok(self
                .eat_quoted_str()?
                .map(|text| (EntityType::Regular, EntityValue::Internal(text))));
        }

        let keyword = self.eat_decl_word()?;
        if self.ctx.keyword_eq(&keyword, "PUBLIC") {
            let _ = self.skip_decl_space(decl_level)?;
            let Some(public_ident) = self.external_ident_literal()? else {
                self.ctx.error("Missing public identifier in ENTITY declaration")?;
                return Ok(None);
            };
            let _ = self.skip_decl_space(decl_level)?;
            let system_ident = self.external_ident_literal()?;
            let value = EntityValue::External {
                public_ident: Some(public_ident),
                system_ident,
            };
            return self.external_data_type(name, is_parameter, decl_level, value);
        }
        if self.ctx.keyword_eq(&keyword, "SYSTEM") {
            let _ = self.skip_decl_space(decl_level)?;
            let system_ident = self.external_ident_literal()?;
            let value = EntityValue::External {
                public_ident: None,
                system_ident,
            };
            return self.external_data_type(name, is_parameter, decl_level, value);
        }

        let entity_type = if self.ctx.keyword_eq(&keyword, "CDATA") {
            EntityType::Cdata
        } else if self.ctx.keyword_eq(&keyword, "SDATA") {
            EntityType::Sdata
        } else if self.ctx.keyword_eq(&keyword, "PI") {
            EntityType::ProcessingInstruction
        } else {
            if keyword.is_empty() {
                self.ctx.error("Missing replacement text in ENTITY declaration")?;
            } else {
                self.ctx
                    .error(format!("Invalid keyword '{keyword}' in ENTITY declaration"))?;
            }
            return Ok(None);
        };
        if is_parameter {
            self.ctx.error(format!(
                "Entity type {entity_type} not allowed for parameter entity '%{name}'"
            ))?;
            return Ok(None);
        }

        let _ = self.skip_decl_space(decl_level)?;
        if !matches!(self.ctx.peek()?, Some('"' | '\'')) {
            self.ctx.error("Missing replacement text in ENTITY declaration")?;
            return Ok(None);
        }
        Ok(self
            .eat_quoted_str()?
            .map(|text| (entity_type, EntityValue::Internal(text))))
    }

    /// Optional `CDATA` or `SDATA` after an external identifier.
    fn external_data_type(
        &mut self,
        name: &str,
        is_parameter: bool,
        decl_level: usize,
        value: EntityValue,
    ) -> Result<Option<(EntityType, EntityValue)>, ParseError> {
        let _ = self.skip_decl_space(decl_level)?;
        if !matches!(self.ctx.peek()?, Some(c) if self.ctx.is_name_start(c)) {
            return Ok(Some((EntityType::Regular, value)));
        }
        let keyword = self.eat_decl_word()?;
        let entity_type = if self.ctx.keyword_eq(&keyword, "CDATA") {
            EntityType::Cdata
        } else if self.ctx.keyword_eq(&keyword, "SDATA") {
            EntityType::Sdata
        } else {
            self.ctx
                .error(format!("Invalid keyword '{keyword}' in ENTITY declaration"))?;
            return Ok(None);
        };
        if is_parameter {
            self.ctx.error(format!(
                "Entity type {entity_type} not allowed for parameter entity '%{name}'"
            ))?;
            return Ok(None);
        }
        Ok(Some((entity_type, value)))
    }

    fn external_ident_literal(&mut self) -> Result<Option<String>, ParseError> {
        if matches!(self.ctx.peek()?, Some('"' | '\'')) {
            self.eat_quoted_str()
        } else {
            Ok(None)
        }
    }
}
