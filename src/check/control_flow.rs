//! Control-flow constructs. None of them is forbidden by itself; they
//! recurse structurally into their conditions, headers, and bodies.

use crate::ast::{DoWhileBlock, ForBlock, Goto, IfBlock, RangeForBlock, SwitchBlock, WhileBlock};

use super::{CheckResult, Checker};

impl Checker<'_> {
    pub(crate) fn check_if_block(&mut self, block: &IfBlock) -> CheckResult {
        self.check_entity(&block.condition)?;

        if let Some(body) = &block.body {
            self.check_entity(body)?;
        }
        if let Some(else_part) = &block.else_part {
            self.check_entity(else_part)?;
        }
        Ok(())
    }

    pub(crate) fn check_for_block(&mut self, block: &ForBlock) -> CheckResult {
        // the init clause is a full entity: it may declare
        if let Some(init) = &block.init {
            self.check_entity(init)?;
        }
        if let Some(stop) = &block.stop {
            self.check_expr(stop)?;
        }
        if let Some(step) = &block.step {
            self.check_expr(step)?;
        }
        if let Some(body) = &block.body {
            self.check_entity(body)?;
        }
        Ok(())
    }

    pub(crate) fn check_range_for_block(&mut self, block: &RangeForBlock) -> CheckResult {
        if let Some(var) = &block.var {
            self.check_var(var)?;
        }
        if let Some(range) = &block.range {
            self.check_expr(range)?;
        }
        if let Some(body) = &block.body {
            self.check_entity(body)?;
        }
        Ok(())
    }

    pub(crate) fn check_while_block(&mut self, block: &WhileBlock) -> CheckResult {
        self.check_entity(&block.condition)?;

        if let Some(body) = &block.body {
            self.check_entity(body)?;
        }
        Ok(())
    }

    pub(crate) fn check_do_while_block(&mut self, block: &DoWhileBlock) -> CheckResult {
        if let Some(body) = &block.body {
            self.check_entity(body)?;
        }
        self.check_entity(&block.condition)
    }

    pub(crate) fn check_switch_block(&mut self, block: &SwitchBlock) -> CheckResult {
        self.check_expr(&block.condition)?;

        for case in &block.cases {
            if let Some(expr) = &case.expr {
                self.check_expr(expr)?;
            }
            if let Some(body) = &case.body {
                self.check_compound(body)?;
            }
        }
        Ok(())
    }

    pub(crate) fn check_goto(&mut self, stmt: &Goto) -> CheckResult {
        self.check_expr(&stmt.label)
    }
}
