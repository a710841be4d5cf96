//! Variable declaration rules: type shape, declarator, and scope policy.

use crate::ast::{Var, VarDecl, VarInit, VarList, VarType};
use crate::scope::ScopeTag;

use super::{deny, CheckResult, Checker};

impl Checker<'_> {
    pub(crate) fn check_var_type(&mut self, var_type: &VarType) -> CheckResult {
        // in global scope this has to be const or constexpr
        if self.scopes().is_global() && !(var_type.is_const || var_type.is_constexpr) {
            return deny("Global variables are not allowed. You may use global constants (const/constexpr).");
        }

        match &var_type.compound {
            Some(compound) => self.check_entity(compound)?,
            None => self.type_allowed(&var_type.base_type)?,
        }

        if var_type.ptr_level > 0 {
            return deny("Pointers are not allowed.");
        }

        if var_type.is_parameter_pack || var_type.base_type.contains("...") {
            return deny("Parameter packs are not allowed.");
        }

        Ok(())
    }

    fn check_var_decl(&mut self, decl: &VarDecl) -> CheckResult {
        self.name_allowed(&decl.name)?;
        // global constant name has to start with the state struct name
        if self.scopes().is_global() {
            self.has_state_prefix(&decl.name)?;
        }

        if decl.array_dims > 0 {
            return deny("Plain arrays are not allowed, use the Array class provided by the QPI instead.");
        }

        match &decl.init {
            None => Ok(()),
            Some(VarInit::Assign(expr)) => self.check_expr(expr),
            Some(VarInit::DirectCall(args)) => args.iter().try_for_each(|arg| self.check_expr(arg)),
        }
    }

    pub(crate) fn check_var(&mut self, var: &Var) -> CheckResult {
        let scope_allows_declarations = self.scopes().is_global()
            || matches!(
                self.scopes().top(),
                Some(ScopeTag::Struct | ScopeTag::Class | ScopeTag::FunctionSignature | ScopeTag::Typedef)
            );
        if !scope_allows_declarations {
            return deny(format!(
                "Local variables are not allowed, found variable with name {}.",
                var.decl.name
            ));
        }

        if let Some(spec) = &var.template_spec {
            self.check_template_spec(spec)?;
        }

        self.check_var_type(&var.var_type)?;
        self.check_var_decl(&var.decl)
    }

    pub(crate) fn check_var_list(&mut self, list: &VarList) -> CheckResult {
        self.check_var(&list.first)?;
        for item in &list.rest {
            if item.ptr_level > 0 {
                return deny("Pointers are not allowed.");
            }
            self.check_var_decl(&item.decl)?;
        }
        Ok(())
    }
}
