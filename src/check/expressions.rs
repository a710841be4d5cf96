//! Expression rules. Most operators recurse into their operands; the
//! forbidden ones (division, modulo, indexing, any pointer operation,
//! allocation) reject immediately with a fixed diagnostic.

use crate::ast::{AtomicExpr, BinaryOp, Expr, TernaryOp, TypecastKind, UnaryOp};

use super::{deny, CheckResult, Checker};

impl Checker<'_> {
    pub(crate) fn check_expr(&mut self, expr: &Expr) -> CheckResult {
        match expr {
            Expr::Atomic(atom) => self.check_atomic_expr(atom),

            Expr::Monomial(op, term) => self.check_monomial_expr(*op, term),

            Expr::Binomial(op, lhs, rhs) => self.check_binomial_expr(*op, lhs, rhs),

            Expr::Trinomial(TernaryOp::Conditional, cond, then_term, else_term) => {
                self.check_expr(cond)?;
                self.check_expr(then_term)?;
                self.check_expr(else_term)
            }

            Expr::FunctionCall { callee, args } => {
                self.check_expr(callee)?;
                args.iter().try_for_each(|arg| self.check_expr(arg))
            }

            Expr::UniformInitializer { name, args } => {
                self.name_allowed(name)?;
                args.iter().try_for_each(|arg| self.check_expr(arg))
            }

            Expr::InitializerList(elements) => {
                elements.iter().try_for_each(|element| self.check_expr(element))
            }

            Expr::Typecast { kind, target, operand } => match kind {
                TypecastKind::CStyle
                | TypecastKind::FunctionStyle
                | TypecastKind::Static
                | TypecastKind::Dynamic
                | TypecastKind::Reinterpret => {
                    self.check_var_type(target)?;
                    self.check_expr(operand)
                }
                TypecastKind::Const => deny("`const_cast` is not allowed."),
            },
        }
    }

    fn check_atomic_expr(&mut self, atom: &AtomicExpr) -> CheckResult {
        match atom {
            AtomicExpr::StringLiteral(value) => {
                deny(format!("String literals are not allowed, found {value}."))
            }
            AtomicExpr::CharLiteral(value) => {
                deny(format!("Char literals are not allowed, found {value}."))
            }
            AtomicExpr::NumberLiteral(_) => Ok(()),
            AtomicExpr::Name(name) => self.name_allowed(name),
            AtomicExpr::VarType(var_type) => self.check_var_type(var_type),
            AtomicExpr::Lambda(lambda) => self.check_lambda(lambda),
        }
    }

    fn check_monomial_expr(&mut self, op: UnaryOp, term: &Expr) -> CheckResult {
        use UnaryOp::*;

        match op {
            Plus | Minus | PrefixIncrement | PrefixDecrement | PostfixIncrement
            | PostfixDecrement | BitToggle | LogicalNot | Parenthesize | SizeOf => {
                self.check_expr(term)
            }
            Deref => deny("Pointer dereferencing (unary operator `*`) is not allowed."),
            AddressOf => deny("Variable referencing (unary operator `&`) is not allowed."),
            New => deny("Allocation via `new` is not allowed."),
            Delete | DeleteArray => deny("Deallocation via `delete` is not allowed."),
            Variadic | VariadicSizeOf => deny("Variadic expressions are not allowed."),
        }
    }

    fn check_binomial_expr(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> CheckResult {
        use BinaryOp::*;

        match op {
            Plus | Minus | Mul | And | Or | Xor | Assign | Less | Greater | Comma
            | LogicalAnd | LogicalOr | PlusAssign | MinusAssign | MulAssign | XorAssign
            | AndAssign | OrAssign | LeftShift | RightShift | Extraction | Equal
            | NotEqual | LessEqual | GreaterEqual | LShiftAssign | RShiftAssign
            | ThreeWayCmp | UserLiteral | Dot => {
                self.check_expr(lhs)?;
                self.check_expr(rhs)
            }
            Div | DivAssign => {
                deny("Division operator `/` is not allowed. Use the `div` function provided in the QPI instead.")
            }
            Percent | PercentAssign => {
                deny("Modulo operator `%` is not allowed. Use the `mod` function provided in the QPI instead.")
            }
            ArrayIndex => {
                deny("Plain arrays are not allowed, use the Array class provided by the QPI instead.")
            }
            PlacementNew | GlobalPlacementNew => {
                deny("Construction via placement `new` is not allowed.")
            }
            Arrow | ArrowStar => deny("Dereferencing (operator `->` or `->*`) is not allowed."),
        }
    }
}
