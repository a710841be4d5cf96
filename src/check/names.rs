//! Name, type, and inheritance predicates, plus the template-spec and
//! typedef checkers that lean on them.

use crate::ast::{TemplateParamDefault, TemplateParamType, TemplateSpec, Typedef, TypedefList};
use crate::scope::ScopeTag;
use crate::ALLOWED_SCOPE_PREFIXES;

use super::{deny, CheckResult, Checker};

/// Substrings that disqualify a type spelling wherever they appear. Floats
/// are hardware-variant, strings and chars have no deterministic platform
/// representation, and `QpiContext` is host-only.
const FORBIDDEN_TYPES: &[&str] = &["float", "double", "string", "char", "QpiContext"];

impl Checker<'_> {
    pub(crate) fn inheritance_allowed(&self, base_name: &str) -> CheckResult {
        if base_name == "QpiContext" {
            return deny(format!("Inheritance from type {base_name} is not allowed."));
        }
        Ok(())
    }

    pub(crate) fn name_allowed(&self, name: &str) -> CheckResult {
        self.scope_resolution_allowed(name)?;

        // double underscores are reserved for internal functions and
        // compiler macros
        if name.starts_with("__") {
            return deny("Names starting with double underscores are reserved.");
        }
        // variadic arguments are parsed with a name ending in ...
        if name.ends_with("...") {
            return deny("Variadic arguments are not allowed.");
        }
        Ok(())
    }

    pub(crate) fn type_allowed(&self, type_spelling: &str) -> CheckResult {
        self.scope_resolution_allowed(type_spelling)?;

        if type_spelling.ends_with("...") {
            return deny("Variadic arguments or parameter packs are not allowed.");
        }
        for forbidden in FORBIDDEN_TYPES {
            if type_spelling.contains(forbidden) {
                return deny(format!("Type {forbidden} is not allowed."));
            }
        }
        Ok(())
    }

    /// Global-scope names must start with the state struct name. An empty
    /// state struct name (non-contract file) fails every global name.
    pub(crate) fn has_state_prefix(&self, name: &str) -> CheckResult {
        let prefix = self.state_struct_name();
        if prefix.is_empty() || !name.starts_with(prefix) {
            return deny(format!(
                "Names declared in global scope (constants, structs/classes, functions) have to start with state struct name ({prefix}). Found invalid name: {name}"
            ));
        }
        Ok(())
    }

    /// A qualified name passes iff the text before the first `::` is a
    /// statically allowed prefix or was registered by an in-file
    /// struct/class/enum earlier in the traversal.
    pub(crate) fn scope_resolution_allowed(&self, name: &str) -> CheckResult {
        let Some(pos) = name.find("::") else {
            return Ok(());
        };
        let prefix = &name[..pos];
        if ALLOWED_SCOPE_PREFIXES.iter().any(|allowed| *allowed == prefix) {
            return Ok(());
        }
        if self.scope_prefixes().iter().any(|registered| registered == prefix) {
            return Ok(());
        }
        deny(format!("Scope resolution with prefix {prefix} is not allowed."))
    }

    // ─── Template specifications ─────────────────────────────────────

    pub(crate) fn check_template_spec(&mut self, spec: &TemplateSpec) -> CheckResult {
        self.with_scope(ScopeTag::TemplateSpec, |checker| {
            for param in &spec.params {
                if let Some(param_type) = &param.param_type {
                    match param_type {
                        TemplateParamType::VarType(var_type) => checker.check_var_type(var_type)?,
                        TemplateParamType::FunctionPointer => {
                            return deny("Function pointers are not allowed.");
                        }
                    }
                }

                checker.name_allowed(&param.name)?;

                match &param.default {
                    TemplateParamDefault::None => {}
                    TemplateParamDefault::Type(var_type) => checker.check_var_type(var_type)?,
                    TemplateParamDefault::Expr(expr) => checker.check_expr(expr)?,
                }
            }
            Ok(())
        })
    }

    // ─── Typedefs ────────────────────────────────────────────────────

    pub(crate) fn check_typedef(&mut self, def: &Typedef) -> CheckResult {
        if self.scopes().is_global() {
            return deny("`typedef` is not allowed in global scope.");
        }
        self.with_scope(ScopeTag::Typedef, |checker| checker.check_var(&def.var))
    }

    pub(crate) fn check_typedef_list(&mut self, defs: &TypedefList) -> CheckResult {
        if self.scopes().is_global() {
            return deny("`typedef` is not allowed in global scope.");
        }
        self.with_scope(ScopeTag::Typedef, |checker| checker.check_var_list(&defs.vars))
    }
}
