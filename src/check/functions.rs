//! Function-like constructs: functions, lambdas, conversion operators,
//! return statements.

use crate::ast::{Function, Lambda, Param, Return, TypeConverter};
use crate::scope::ScopeTag;

use super::{deny, CheckResult, Checker};

impl Checker<'_> {
    fn check_param_list(&mut self, params: &[Param]) -> CheckResult {
        for param in params {
            match param {
                Param::Var(var) => self.check_var(var)?,
                Param::FunctionPointer => return deny("Function pointers are not allowed."),
            }
        }
        Ok(())
    }

    pub(crate) fn check_function(&mut self, func: &Function) -> CheckResult {
        // global function name has to start with the state struct name
        if self.scopes().is_global() {
            self.has_state_prefix(&func.name)?;
        }

        self.with_scope(ScopeTag::FunctionSignature, |checker| {
            if let Some(spec) = &func.template_spec {
                checker.check_template_spec(spec)?;
            }
            if let Some(return_type) = &func.return_type {
                checker.check_var_type(return_type)?;
            }

            checker.name_allowed(&func.name)?;
            checker.check_param_list(&func.params)?;

            if let Some(body) = &func.body {
                checker.check_compound(body)?;
            }
            Ok(())
        })
    }

    pub(crate) fn check_lambda(&mut self, lambda: &Lambda) -> CheckResult {
        self.with_scope(ScopeTag::FunctionSignature, |checker| {
            if let Some(captures) = &lambda.captures {
                checker.check_expr(captures)?;
            }
            if let Some(return_type) = &lambda.return_type {
                checker.check_var_type(return_type)?;
            }

            checker.check_param_list(&lambda.params)?;

            if let Some(body) = &lambda.body {
                checker.check_compound(body)?;
            }
            Ok(())
        })
    }

    pub(crate) fn check_type_converter(&mut self, converter: &TypeConverter) -> CheckResult {
        if let Some(spec) = &converter.template_spec {
            self.check_template_spec(spec)?;
        }

        self.check_var_type(&converter.target_type)?;

        if let Some(body) = &converter.body {
            self.check_compound(body)?;
        }
        Ok(())
    }

    pub(crate) fn check_return(&mut self, ret: &Return) -> CheckResult {
        match &ret.value {
            Some(value) => self.check_expr(value),
            None => Ok(()),
        }
    }
}
