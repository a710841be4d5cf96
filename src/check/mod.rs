//! The rule engine: a single pre-order traversal proving every AST node
//! lies within the permitted contract subset.
//!
//! The first violation aborts the traversal; its diagnostic text is the
//! public contract of the tool. Checkers return `Result<(), Violation>` and
//! propagate with `?`, so short-circuiting falls out of the type.

mod control_flow;
mod expressions;
mod functions;
mod names;
mod variables;


use tracing::debug;

use crate::ast::{Compound, CompoundKind, Entity, ForwardClassDecl, UsingDecl, UsingDef, UsingNamespace};
use crate::error::Violation;
use crate::scope::{ScopeStack, ScopeTag};

pub type CheckResult = Result<(), Violation>;

/// Shorthand for rejecting the current construct.
pub(crate) fn deny(message: impl Into<String>) -> CheckResult {
    Err(Violation::new(message))
}

/// Traversal state: the scope stack, the scope-prefix registry, and the
/// state struct name global rules key off.
///
/// The scope stack mirrors the lexical nesting of the node under inspection
/// and is balanced on every exit path. The prefix registry only grows: once
/// a struct, class, or enum name has been seen, it stays a legal `::` prefix
/// for the rest of the check.
pub struct Checker<'a> {
    state_struct_name: &'a str,
    scopes: ScopeStack,
    scope_prefixes: Vec<String>,
}

impl<'a> Checker<'a> {
    pub fn new(state_struct_name: &'a str) -> Self {
        Checker {
            state_struct_name,
            scopes: ScopeStack::new(),
            scope_prefixes: Vec::new(),
        }
    }

    pub(crate) fn state_struct_name(&self) -> &str {
        self.state_struct_name
    }

    pub(crate) fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    pub(crate) fn scope_prefixes(&self) -> &[String] {
        &self.scope_prefixes
    }

    pub(crate) fn register_prefix(&mut self, name: impl Into<String>) {
        self.scope_prefixes.push(name.into());
    }

    /// Runs `f` with `tag` pushed; the pop happens whether `f` succeeds or
    /// fails, keeping the stack balanced on the error path.
    pub(crate) fn with_scope(&mut self, tag: ScopeTag, f: impl FnOnce(&mut Self) -> CheckResult) -> CheckResult {
        self.scopes.push(tag);
        let result = f(self);
        self.scopes.pop();
        result
    }

    // ─── Entity dispatch ─────────────────────────────────────────────

    /// Closed case analysis over the node kind. Every variant either routes
    /// to a checker or yields a direct verdict; exhaustiveness of the match
    /// is the closed-world guarantee.
    pub fn check_entity(&mut self, entity: &Entity) -> CheckResult {
        match entity {
            Entity::DocComment => Ok(()),

            // public, protected, private
            Entity::AccessSpecifier => Ok(()),

            Entity::Enum(decl) => {
                self.register_prefix(decl.name.clone());
                Ok(())
            }

            // macro arguments are not inspected; the allow-list given to the
            // front-end already restricts which macros can appear
            Entity::MacroCall(_) => Ok(()),

            Entity::Label(_) => Ok(()),

            Entity::Preprocessor => deny("Preprocessor directives (character `#`) are not allowed."),

            Entity::NamespaceAlias => deny("Namespace alias is not allowed."),

            Entity::FunctionPointer => deny("Function pointers are not allowed."),

            Entity::Constructor => deny("Constructors are not allowed."),

            Entity::Destructor => deny("Destructors are not allowed."),

            Entity::ThrowStatement => deny("`throw` statement is not allowed."),

            Entity::TryBlock => deny("`try` blocks are not allowed."),

            Entity::Blob => deny("Entity of kind BLOB cannot be analyzed."),

            Entity::Compound(compound) => self.check_compound(compound),

            Entity::Var(var) => self.check_var(var),

            Entity::VarList(list) => self.check_var_list(list),

            Entity::UsingNamespace(decl) => self.check_using_namespace(decl),

            Entity::UsingDecl(decl) => self.check_using_decl(decl),

            Entity::Typedef(def) => self.check_typedef(def),

            Entity::TypedefList(defs) => self.check_typedef_list(defs),

            Entity::Goto(stmt) => self.check_goto(stmt),

            Entity::ForwardClassDecl(decl) => self.check_fwd_decl(decl),

            Entity::TypeConverter(conv) => self.check_type_converter(conv),

            Entity::Function(func) => self.check_function(func),

            Entity::Lambda(lambda) => self.check_lambda(lambda),

            Entity::Expression(expr) => self.check_expr(expr),

            Entity::Return(ret) => self.check_return(ret),

            Entity::If(block) => self.check_if_block(block),

            Entity::For(block) => self.check_for_block(block),

            Entity::RangeFor(block) => self.check_range_for_block(block),

            Entity::While(block) => self.check_while_block(block),

            Entity::DoWhile(block) => self.check_do_while_block(block),

            Entity::Switch(block) => self.check_switch_block(block),
        }
    }

    // ─── Compounds ───────────────────────────────────────────────────

    pub(crate) fn check_compound(&mut self, compound: &Compound) -> CheckResult {
        if compound.kind.is_namespace_like() {
            if compound.kind == CompoundKind::Union {
                return deny("`union` is not allowed.");
            }
            if let Some(spec) = &compound.template_spec {
                self.check_template_spec(spec)?;
            }
            self.name_allowed(&compound.name)?;
        }
        for base in &compound.inheritance {
            self.inheritance_allowed(base)?;
        }

        let tag = match compound.kind {
            CompoundKind::Struct => {
                // global struct name has to start with the state struct name
                if self.scopes.is_global() {
                    self.has_state_prefix(&compound.name)?;
                }
                self.register_prefix(compound.name.clone());
                Some(ScopeTag::Struct)
            }
            CompoundKind::Class => {
                if self.scopes.is_global() {
                    self.has_state_prefix(&compound.name)?;
                }
                self.register_prefix(compound.name.clone());
                Some(ScopeTag::Class)
            }
            CompoundKind::Namespace => Some(ScopeTag::Namespace),
            CompoundKind::Block | CompoundKind::ExternC => Some(ScopeTag::Block),
            CompoundKind::File | CompoundKind::Union => None,
        };

        match tag {
            Some(tag) => self.with_scope(tag, |checker| {
                compound.members.iter().try_for_each(|member| checker.check_entity(member))
            }),
            None => compound.members.iter().try_for_each(|member| self.check_entity(member)),
        }
    }

    // ─── Using directives and forward declarations ───────────────────

    fn check_using_namespace(&mut self, decl: &UsingNamespace) -> CheckResult {
        // in global scope, only namespace QPI is allowed
        if self.scopes.is_global() && decl.name != "QPI" {
            return deny("Only QPI can be used for a using namespace declaration in global scope.");
        }
        self.scope_resolution_allowed(&decl.name)
    }

    fn check_using_decl(&mut self, decl: &UsingDecl) -> CheckResult {
        if self.scopes.is_global() {
            return deny("Using declaration is not allowed in global scope.");
        }

        if let Some(spec) = &decl.template_spec {
            self.check_template_spec(spec)?;
        }

        self.scope_resolution_allowed(&decl.name)?;

        match &decl.definition {
            UsingDef::None => Ok(()),
            UsingDef::VarType(var_type) => self.check_var_type(var_type),
            UsingDef::FunctionPointer => deny("Function pointers are not allowed."),
            UsingDef::Compound(compound) => self.check_compound(compound),
        }
    }

    fn check_fwd_decl(&mut self, decl: &ForwardClassDecl) -> CheckResult {
        if let Some(spec) = &decl.template_spec {
            self.check_template_spec(spec)?;
        }
        Ok(())
    }
}

// ─── Driver ──────────────────────────────────────────────────────────

/// Checks a whole file AST against the contract rules.
///
/// `state_struct_name` is usually the result of [`find_state_struct_name`];
/// passing it separately keeps the discovery testable on its own.
pub fn check_compliance(ast: &Entity, state_struct_name: &str) -> CheckResult {
    debug!(state_struct = %state_struct_name, "starting compliance check");
    let mut checker = Checker::new(state_struct_name);
    let result = checker.check_entity(ast);
    debug_assert!(checker.scopes.is_global(), "scope stack must unwind fully");
    result
}

/// The state struct is the first top-level struct that inherits from
/// `ContractBase`. Returns an empty string when the file declares none; the
/// global-prefix rules then reject every global name, which is the intended
/// verdict for non-contract inputs.
pub fn find_state_struct_name(ast: &Entity) -> String {
    let file = match ast {
        Entity::Compound(compound) if compound.kind == CompoundKind::File => compound,
        _ => {
            debug!("state struct discovery needs a file compound at the root");
            return String::new();
        }
    };

    for member in &file.members {
        if let Entity::Compound(compound) = member {
            if compound.kind == CompoundKind::Struct
                && compound.inheritance.iter().any(|base| base == "ContractBase")
            {
                debug!(name = %compound.name, "found state struct");
                return compound.name.clone();
            }
        }
    }
    String::new()
}
