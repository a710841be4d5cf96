//! Lowers the tree-sitter C++ tree into the tagged contract AST.
//!
//! The mapping is deliberately closed: every recognized node kind produces
//! the matching [`Entity`] or [`Expr`]; everything else becomes
//! [`Entity::Blob`]. A statement whose sub-expressions cannot be classified
//! is poisoned to `Blob` as a whole, so nothing unknown slips through as an
//! accepted name.

use tree_sitter::Node;

use crate::ast::*;
use crate::is_known_macro;

// ─── Helpers ─────────────────────────────────────────────────────────

fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children: Vec<_> = node.named_children(&mut cursor).collect();
    children
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children: Vec<_> = node.children_by_field_name(field, &mut cursor).collect();
    children
}

/// Any direct child token with exactly this text (used for `.` vs `->`,
/// `delete[]`, `sizeof...`).
fn has_token(node: Node, source: &[u8], token: &str) -> bool {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if !child.is_named() && node_text(child, source) == token {
                return true;
            }
        }
    }
    false
}

// ─── File entry point ────────────────────────────────────────────────

pub(super) fn lower_file(root: Node, source: &[u8]) -> Entity {
    Entity::Compound(Compound::file(lower_children(root, source)))
}

fn lower_children(container: Node, source: &[u8]) -> Vec<Entity> {
    let mut out = Vec::new();
    for child in named_children(container) {
        lower_into(child, source, &mut out);
    }
    out
}

fn lower_block(node: Node, source: &[u8]) -> Compound {
    Compound::block(lower_children(node, source))
}

/// Lowers one statement/declaration node to exactly one entity, wrapping
/// multi-entity lowerings (labels, macro definitions) in a block.
fn lower_statement_entity(node: Node, source: &[u8]) -> Entity {
    let mut out = Vec::new();
    lower_into(node, source, &mut out);
    match out.len() {
        0 => Entity::Compound(Compound::block(Vec::new())),
        1 => out.pop().expect("len checked"),
        _ => Entity::Compound(Compound::block(out)),
    }
}

// ─── Statement / declaration dispatch ────────────────────────────────

fn lower_into(node: Node, source: &[u8], out: &mut Vec<Entity>) {
    if node.is_missing() {
        return;
    }
    if node.is_error() {
        out.push(Entity::Blob);
        return;
    }

    let kind = node.kind();
    if kind.starts_with("preproc_") {
        out.push(Entity::Preprocessor);
        return;
    }

    match kind {
        "comment" => out.push(Entity::DocComment),

        "access_specifier" => out.push(Entity::AccessSpecifier),

        "namespace_definition" => out.push(lower_namespace(node, source)),

        "namespace_alias_definition" => out.push(Entity::NamespaceAlias),

        "struct_specifier" | "class_specifier" | "union_specifier" => {
            out.push(lower_class_like(node, source, None))
        }

        "enum_specifier" => out.push(lower_enum(node, source)),

        "template_declaration" => lower_template_declaration(node, source, out),

        "alias_declaration" => out.push(lower_alias_declaration(node, source, None)),

        "using_declaration" => out.push(lower_using(node, source)),

        "type_definition" => out.push(lower_type_definition(node, source)),

        "declaration" | "field_declaration" | "condition_declaration" => {
            lower_declaration_like(node, source, None, out)
        }

        "function_definition" => lower_function_like(node, source, None, out),

        "linkage_specification" => out.push(lower_linkage(node, source)),

        "labeled_statement" => {
            let label = node
                .child_by_field_name("label")
                .map(|l| node_text(l, source).to_string())
                .unwrap_or_default();
            out.push(Entity::Label(label));
            let inner = named_children(node)
                .into_iter()
                .find(|c| c.kind() != "statement_identifier" && c.kind() != "comment");
            if let Some(inner) = inner {
                lower_into(inner, source, out);
            }
        }

        "goto_statement" => {
            let label = node
                .child_by_field_name("label")
                .map(|l| Expr::name(node_text(l, source)))
                .unwrap_or_else(|| Expr::name(""));
            out.push(Entity::Goto(Goto { label }));
        }

        "expression_statement" => lower_expression_statement(node, source, out),

        "compound_statement" => out.push(Entity::Compound(lower_block(node, source))),

        "if_statement" => out.push(lower_if(node, source)),

        "for_statement" => out.push(lower_for(node, source)),

        "for_range_loop" => out.push(lower_range_for(node, source)),

        "while_statement" => out.push(lower_while(node, source)),

        "do_statement" => out.push(lower_do_while(node, source)),

        "switch_statement" => out.push(lower_switch(node, source)),

        "return_statement" => out.push(lower_return(node, source)),

        "break_statement" | "continue_statement" => {
            // plain jump keywords carry nothing to check
            out.push(Entity::Expression(Expr::name(
                if kind == "break_statement" { "break" } else { "continue" },
            )));
        }

        "throw_statement" => out.push(Entity::ThrowStatement),

        "try_statement" => out.push(Entity::TryBlock),

        // container nodes that occasionally surface directly
        "translation_unit" | "declaration_list" | "field_declaration_list" => {
            for child in named_children(node) {
                lower_into(child, source, out);
            }
        }

        _ => out.push(Entity::Blob),
    }
}

// ─── Namespaces, classes, enums ──────────────────────────────────────

fn lower_namespace(node: Node, source: &[u8]) -> Entity {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default();
    let members = node
        .child_by_field_name("body")
        .map(|body| lower_children(body, source))
        .unwrap_or_default();
    Entity::Compound(Compound {
        kind: CompoundKind::Namespace,
        name,
        template_spec: None,
        inheritance: Vec::new(),
        members,
    })
}

fn lower_class_like(node: Node, source: &[u8], template_spec: Option<TemplateSpec>) -> Entity {
    let kind = match node.kind() {
        "struct_specifier" => CompoundKind::Struct,
        "class_specifier" => CompoundKind::Class,
        _ => CompoundKind::Union,
    };
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default();

    let Some(body) = node.child_by_field_name("body") else {
        // no body: a forward declaration
        return Entity::ForwardClassDecl(ForwardClassDecl { name, template_spec });
    };

    Entity::Compound(Compound {
        kind,
        name,
        template_spec,
        inheritance: base_class_names(node, source),
        members: lower_children(body, source),
    })
}

/// Base names from the inheritance list, access keywords skipped.
fn base_class_names(node: Node, source: &[u8]) -> Vec<String> {
    let mut bases = Vec::new();
    for child in named_children(node) {
        if child.kind() != "base_class_clause" {
            continue;
        }
        for base in named_children(child) {
            if matches!(
                base.kind(),
                "type_identifier" | "qualified_identifier" | "template_type"
            ) {
                bases.push(node_text(base, source).to_string());
            }
        }
    }
    bases
}

fn lower_enum(node: Node, source: &[u8]) -> Entity {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default();
    Entity::Enum(EnumDecl { name })
}

fn lower_linkage(node: Node, source: &[u8]) -> Entity {
    let members = node
        .child_by_field_name("body")
        .map(|body| match body.kind() {
            "declaration_list" => lower_children(body, source),
            _ => {
                let mut out = Vec::new();
                lower_into(body, source, &mut out);
                out
            }
        })
        .unwrap_or_default();
    Entity::Compound(Compound {
        kind: CompoundKind::ExternC,
        name: String::new(),
        template_spec: None,
        inheritance: Vec::new(),
        members,
    })
}

// ─── Templates ───────────────────────────────────────────────────────

fn lower_template_declaration(node: Node, source: &[u8], out: &mut Vec<Entity>) {
    let template_spec = node
        .child_by_field_name("parameters")
        .map(|params| lower_template_params(params, source));

    for child in named_children(node) {
        match child.kind() {
            "template_parameter_list" | "comment" => continue,
            "struct_specifier" | "class_specifier" | "union_specifier" => {
                out.push(lower_class_like(child, source, template_spec));
                return;
            }
            "function_definition" => {
                lower_function_like(child, source, template_spec, out);
                return;
            }
            "declaration" | "field_declaration" => {
                lower_declaration_like(child, source, template_spec, out);
                return;
            }
            "alias_declaration" => {
                out.push(lower_alias_declaration(child, source, template_spec));
                return;
            }
            "template_declaration" => {
                lower_template_declaration(child, source, out);
                return;
            }
            _ => {
                out.push(Entity::Blob);
                return;
            }
        }
    }
    out.push(Entity::Blob);
}

/// The parameter name of a `typename`/`class` template parameter, by field
/// or by kind.
fn type_param_name(node: Node) -> Option<Node> {
    node.child_by_field_name("name").or_else(|| {
        named_children(node)
            .into_iter()
            .find(|c| c.kind() == "type_identifier")
    })
}

fn lower_template_params(list: Node, source: &[u8]) -> TemplateSpec {
    let mut params = Vec::new();
    for child in named_children(list) {
        match child.kind() {
            "type_parameter_declaration" => {
                let name = named_children(child)
                    .first()
                    .map(|n| node_text(*n, source).to_string())
                    .unwrap_or_default();
                params.push(TemplateParam {
                    param_type: None,
                    name,
                    default: TemplateParamDefault::None,
                });
            }
            "optional_type_parameter_declaration" => {
                let name_node = type_param_name(child);
                let name = name_node
                    .map(|n| node_text(n, source).to_string())
                    .unwrap_or_default();
                let default = child
                    .child_by_field_name("default_type")
                    .or_else(|| {
                        // last named child that is not the parameter name
                        named_children(child)
                            .into_iter()
                            .filter(|c| Some(c.id()) != name_node.map(|n| n.id()))
                            .next_back()
                    })
                    .map(|t| TemplateParamDefault::Type(VarType::named(node_text(t, source))))
                    .unwrap_or(TemplateParamDefault::None);
                params.push(TemplateParam {
                    param_type: None,
                    name,
                    default,
                });
            }
            // variadics keep the `...` in the name so the name rules see it
            "variadic_type_parameter_declaration" => {
                let base = type_param_name(child)
                    .map(|n| node_text(n, source).to_string())
                    .unwrap_or_default();
                params.push(TemplateParam {
                    param_type: None,
                    name: format!("{base}..."),
                    default: TemplateParamDefault::None,
                });
            }
            "parameter_declaration" | "optional_parameter_declaration" => {
                let is_function_pointer = child
                    .child_by_field_name("declarator")
                    .map(contains_function_declarator)
                    .unwrap_or(false);
                let param_type = if is_function_pointer {
                    TemplateParamType::FunctionPointer
                } else {
                    TemplateParamType::VarType(
                        lower_var_type(child, source).unwrap_or_else(|| VarType::named("")),
                    )
                };
                let name = child
                    .child_by_field_name("declarator")
                    .map(|d| node_text(d, source).to_string())
                    .unwrap_or_default();
                let default = child
                    .child_by_field_name("default_value")
                    .and_then(|v| lower_expr(v, source))
                    .map(TemplateParamDefault::Expr)
                    .unwrap_or(TemplateParamDefault::None);
                params.push(TemplateParam {
                    param_type: Some(param_type),
                    name,
                    default,
                });
            }
            "comment" => {}
            _ => {
                params.push(TemplateParam {
                    param_type: None,
                    name: node_text(child, source).to_string(),
                    default: TemplateParamDefault::None,
                });
            }
        }
    }
    TemplateSpec { params }
}

// ─── Using directives and typedefs ───────────────────────────────────

fn lower_alias_declaration(node: Node, source: &[u8], template_spec: Option<TemplateSpec>) -> Entity {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default();
    let definition = node
        .child_by_field_name("type")
        .map(|t| {
            let var_type = lower_type_descriptor(t, source);
            if type_descriptor_is_function(t) {
                UsingDef::FunctionPointer
            } else {
                UsingDef::VarType(var_type)
            }
        })
        .unwrap_or(UsingDef::None);
    Entity::UsingDecl(UsingDecl {
        name,
        template_spec,
        definition,
    })
}

fn lower_using(node: Node, source: &[u8]) -> Entity {
    let mut is_namespace = false;
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.kind() == "namespace" {
                is_namespace = true;
            }
        }
    }
    let name = named_children(node)
        .last()
        .map(|n| node_text(*n, source).to_string())
        .unwrap_or_default();

    if is_namespace {
        Entity::UsingNamespace(UsingNamespace { name })
    } else {
        Entity::UsingDecl(UsingDecl {
            name,
            template_spec: None,
            definition: UsingDef::None,
        })
    }
}

fn lower_type_definition(node: Node, source: &[u8]) -> Entity {
    let declarators = field_children(node, "declarator");
    if declarators.is_empty() {
        return Entity::Blob;
    }
    if declarators.iter().any(|d| contains_function_declarator(*d)) {
        return Entity::FunctionPointer;
    }

    let Some(base_type) = lower_var_type(node, source) else {
        return Entity::FunctionPointer;
    };

    let mut lowered = Vec::new();
    for declarator in &declarators {
        match lower_one_declarator(*declarator, source) {
            Some(decl) => lowered.push(decl),
            None => return Entity::Blob,
        }
    }

    let (first_ptr, first_decl) = lowered.remove(0);
    let first = Var {
        template_spec: None,
        var_type: VarType {
            ptr_level: base_type.ptr_level + first_ptr,
            ..base_type.clone()
        },
        decl: first_decl,
    };

    if lowered.is_empty() {
        Entity::Typedef(Typedef { var: Box::new(first) })
    } else {
        Entity::TypedefList(TypedefList {
            vars: VarList {
                first: Box::new(first),
                rest: lowered
                    .into_iter()
                    .map(|(ptr_level, decl)| ListDecl { ptr_level, decl })
                    .collect(),
            },
        })
    }
}

// ─── Declarations (variables, prototypes, function pointers) ─────────

fn lower_declaration_like(
    node: Node,
    source: &[u8],
    template_spec: Option<TemplateSpec>,
    out: &mut Vec<Entity>,
) {
    let declarators = field_children(node, "declarator");
    let type_node = node.child_by_field_name("type");

    if declarators.is_empty() {
        // a nested type declaration carries no declarator
        match type_node.map(|t| t.kind()) {
            Some("struct_specifier" | "class_specifier" | "union_specifier" | "enum_specifier") => {
                lower_into(type_node.expect("kind checked"), source, out);
            }
            _ => out.push(Entity::Blob),
        }
        return;
    }

    let first = declarators[0];
    match classify_declarator(first) {
        DeclaratorShape::FunctionPointer => out.push(Entity::FunctionPointer),
        DeclaratorShape::Function => lower_function_like(node, source, template_spec, out),
        DeclaratorShape::Plain => {
            lower_var_declaration(node, source, template_spec, &declarators, out)
        }
    }
}

enum DeclaratorShape {
    FunctionPointer,
    Function,
    Plain,
}

/// Walks declarator wrappers to find out whether this declares a function,
/// a function pointer, or a plain variable.
fn classify_declarator(declarator: Node) -> DeclaratorShape {
    let mut node = declarator;
    loop {
        match node.kind() {
            "init_declarator" | "pointer_declarator" | "reference_declarator"
            | "array_declarator" => {
                let fallback = node.child_by_field_name("declarator").or_else(|| {
                    let mut cursor = node.walk();
                    let first = node.named_children(&mut cursor).next();
                    first
                });
                match fallback {
                    Some(inner) => node = inner,
                    None => return DeclaratorShape::Plain,
                }
            }
            "function_declarator" => {
                let inner = node.child_by_field_name("declarator");
                return match inner.map(|i| i.kind()) {
                    Some("parenthesized_declarator") => DeclaratorShape::FunctionPointer,
                    _ => DeclaratorShape::Function,
                };
            }
            "parenthesized_declarator" => return DeclaratorShape::FunctionPointer,
            _ => return DeclaratorShape::Plain,
        }
    }
}

fn contains_function_declarator(declarator: Node) -> bool {
    matches!(
        classify_declarator(declarator),
        DeclaratorShape::Function | DeclaratorShape::FunctionPointer
    )
}

fn lower_var_declaration(
    node: Node,
    source: &[u8],
    template_spec: Option<TemplateSpec>,
    declarators: &[Node],
    out: &mut Vec<Entity>,
) {
    let Some(base_type) = lower_var_type(node, source) else {
        out.push(Entity::Blob);
        return;
    };

    let mut lowered = Vec::new();
    for declarator in declarators {
        match lower_one_declarator(*declarator, source) {
            Some(decl) => lowered.push(decl),
            None => {
                out.push(Entity::Blob);
                return;
            }
        }
    }

    // member initializers live on the declaration node, not the declarator
    if let Some(default_value) = node.child_by_field_name("default_value") {
        let init = match default_value.kind() {
            "initializer_list" => match lower_expr_list(default_value, source) {
                Some(args) => Some(VarInit::DirectCall(args)),
                None => {
                    out.push(Entity::Blob);
                    return;
                }
            },
            _ => match lower_expr(default_value, source) {
                Some(expr) => Some(VarInit::Assign(expr)),
                None => {
                    out.push(Entity::Blob);
                    return;
                }
            },
        };
        if let Some((_, decl)) = lowered.last_mut() {
            decl.init = init;
        }
    }

    let (first_ptr, first_decl) = lowered.remove(0);
    let first = Var {
        template_spec,
        var_type: VarType {
            ptr_level: base_type.ptr_level + first_ptr,
            ..base_type
        },
        decl: first_decl,
    };

    if lowered.is_empty() {
        out.push(Entity::Var(first));
    } else {
        out.push(Entity::VarList(VarList {
            first: Box::new(first),
            rest: lowered
                .into_iter()
                .map(|(ptr_level, decl)| ListDecl { ptr_level, decl })
                .collect(),
        }));
    }
}

/// Base type + qualifiers of a declaration-like node. `None` when the type
/// is itself a function shape.
fn lower_var_type(node: Node, source: &[u8]) -> Option<VarType> {
    let type_node = node.child_by_field_name("type")?;

    let mut var_type = match type_node.kind() {
        "struct_specifier" | "class_specifier" | "union_specifier" | "enum_specifier"
            if type_node.child_by_field_name("body").is_some() =>
        {
            let mut inline = Vec::new();
            lower_into(type_node, source, &mut inline);
            VarType {
                base_type: String::new(),
                compound: inline.pop().map(Box::new),
                is_const: false,
                is_constexpr: false,
                ptr_level: 0,
                is_parameter_pack: false,
            }
        }
        _ => VarType::named(node_text(type_node, source)),
    };

    for i in 0..node.child_count() {
        let Some(child) = node.child(i) else { continue };
        if matches!(child.kind(), "type_qualifier" | "storage_class_specifier") {
            match node_text(child, source) {
                "const" => var_type.is_const = true,
                "constexpr" | "consteval" | "constinit" => var_type.is_constexpr = true,
                _ => {}
            }
        }
    }

    Some(var_type)
}

/// `using Alias = <descriptor>` and cast targets use type_descriptor nodes.
fn lower_type_descriptor(node: Node, source: &[u8]) -> VarType {
    let base = node
        .child_by_field_name("type")
        .map(|t| node_text(t, source).to_string())
        .unwrap_or_else(|| node_text(node, source).to_string());

    let mut ptr_level = 0u8;
    if let Some(declarator) = node.child_by_field_name("declarator") {
        let mut current = Some(declarator);
        while let Some(d) = current {
            if d.kind() == "abstract_pointer_declarator" {
                ptr_level += 1;
                current = d.child_by_field_name("declarator").or_else(|| {
                    let mut cursor = d.walk();
                    let first = d.named_children(&mut cursor).next();
                    first
                });
            } else {
                break;
            }
        }
    }

    let mut var_type = VarType::named(base);
    var_type.ptr_level = ptr_level;
    for child in named_children(node) {
        if child.kind() == "type_qualifier" && node_text(child, source) == "const" {
            var_type.is_const = true;
        }
    }
    var_type
}

fn type_descriptor_is_function(node: Node) -> bool {
    node.child_by_field_name("declarator")
        .map(|d| {
            let mut current = d;
            loop {
                match current.kind() {
                    "abstract_function_declarator" => return true,
                    "abstract_pointer_declarator" | "abstract_reference_declarator"
                    | "abstract_parenthesized_declarator" => {
                        let mut cursor = current.walk();
                        match current
                            .child_by_field_name("declarator")
                            .or_else(|| current.named_children(&mut cursor).next())
                        {
                            Some(inner) => current = inner,
                            None => return false,
                        }
                    }
                    _ => return false,
                }
            }
        })
        .unwrap_or(false)
}

/// One declarator: pointer depth, array dims, name, initializer.
/// `None` poisons the containing declaration.
fn lower_one_declarator(declarator: Node, source: &[u8]) -> Option<(u8, VarDecl)> {
    let (decl_node, init) = if declarator.kind() == "init_declarator" {
        let inner = declarator.child_by_field_name("declarator")?;
        let init = match declarator.child_by_field_name("value") {
            Some(value) => Some(match value.kind() {
                "initializer_list" | "argument_list" => {
                    VarInit::DirectCall(lower_expr_list(value, source)?)
                }
                _ => VarInit::Assign(lower_expr(value, source)?),
            }),
            None => None,
        };
        (inner, init)
    } else {
        (declarator, None)
    };

    let mut node = decl_node;
    let mut ptr_level = 0u8;
    let mut array_dims = 0usize;
    let name = loop {
        match node.kind() {
            "pointer_declarator" => {
                ptr_level += 1;
                node = declarator_inner(node)?;
            }
            "reference_declarator" => {
                node = declarator_inner(node)?;
            }
            "array_declarator" => {
                array_dims += 1;
                node = declarator_inner(node)?;
            }
            "identifier" | "field_identifier" | "qualified_identifier" | "operator_name" => {
                break node_text(node, source).to_string();
            }
            _ => break node_text(node, source).to_string(),
        }
    };

    Some((
        ptr_level,
        VarDecl {
            name,
            array_dims,
            init,
        },
    ))
}

fn declarator_inner(node: Node) -> Option<Node> {
    node.child_by_field_name("declarator").or_else(|| {
        let mut cursor = node.walk();
        let first = node.named_children(&mut cursor).next();
        first
    })
}

// ─── Functions, methods, conversion operators ────────────────────────

fn lower_function_like(
    node: Node,
    source: &[u8],
    template_spec: Option<TemplateSpec>,
    out: &mut Vec<Entity>,
) {
    let Some(declarator) = node.child_by_field_name("declarator") else {
        out.push(Entity::Blob);
        return;
    };

    let body = node
        .child_by_field_name("body")
        .map(|b| lower_block(b, source));

    // conversion operator: `operator T() { … }`
    if declarator.kind() == "operator_cast" {
        let target_type = declarator
            .child_by_field_name("type")
            .map(|t| VarType::named(node_text(t, source)))
            .unwrap_or_else(|| VarType::named(""));
        out.push(Entity::TypeConverter(TypeConverter {
            template_spec,
            target_type,
            body,
        }));
        return;
    }

    // unwrap pointers on the return type
    let mut core = declarator;
    let mut return_ptr = 0u8;
    loop {
        match core.kind() {
            "pointer_declarator" => {
                return_ptr += 1;
                match declarator_inner(core) {
                    Some(inner) => core = inner,
                    None => {
                        out.push(Entity::Blob);
                        return;
                    }
                }
            }
            "reference_declarator" => match declarator_inner(core) {
                Some(inner) => core = inner,
                None => {
                    out.push(Entity::Blob);
                    return;
                }
            },
            _ => break,
        }
    }

    if core.kind() != "function_declarator" {
        out.push(Entity::Blob);
        return;
    }

    let name_node = core.child_by_field_name("declarator");
    if name_node.map(|n| n.kind()) == Some("destructor_name") {
        out.push(Entity::Destructor);
        return;
    }
    if name_node.map(|n| n.kind()) == Some("operator_cast") {
        let target_type = name_node
            .and_then(|n| n.child_by_field_name("type"))
            .map(|t| VarType::named(node_text(t, source)))
            .unwrap_or_else(|| VarType::named(""));
        out.push(Entity::TypeConverter(TypeConverter {
            template_spec,
            target_type,
            body,
        }));
        return;
    }

    let name = name_node
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default();

    let type_node = node.child_by_field_name("type");
    if type_node.is_none() {
        // a typeless definition is either a platform macro followed by a
        // plain block, or a constructor
        if is_known_macro(&name) {
            out.push(Entity::MacroCall(MacroCall { name }));
            if let Some(block) = body {
                out.push(Entity::Compound(block));
            }
            return;
        }
        out.push(Entity::Constructor);
        return;
    }

    let return_type = lower_var_type(node, source).map(|mut t| {
        t.ptr_level += return_ptr;
        t
    });

    let params = core
        .child_by_field_name("parameters")
        .map(|list| lower_params(list, source))
        .unwrap_or_default();

    out.push(Entity::Function(Function {
        name,
        template_spec,
        return_type,
        params,
        body,
    }));
}

fn lower_params(list: Node, source: &[u8]) -> Vec<Param> {
    let mut params = Vec::new();
    for child in named_children(list) {
        match child.kind() {
            "parameter_declaration" | "optional_parameter_declaration" => {
                let is_function_pointer = child
                    .child_by_field_name("declarator")
                    .map(contains_function_declarator)
                    .unwrap_or(false);
                if is_function_pointer {
                    params.push(Param::FunctionPointer);
                    continue;
                }

                let var_type = match lower_var_type(child, source) {
                    Some(t) => t,
                    None => {
                        params.push(Param::FunctionPointer);
                        continue;
                    }
                };
                let (ptr_level, mut decl) = child
                    .child_by_field_name("declarator")
                    .and_then(|d| lower_one_declarator(d, source))
                    .unwrap_or((0, VarDecl::plain("")));
                if let Some(default_value) = child.child_by_field_name("default_value") {
                    if let Some(expr) = lower_expr(default_value, source) {
                        decl.init = Some(VarInit::Assign(expr));
                    }
                }
                params.push(Param::Var(Var {
                    template_spec: None,
                    var_type: VarType {
                        ptr_level: var_type.ptr_level + ptr_level,
                        ..var_type
                    },
                    decl,
                }));
            }
            // `Args... args` and bare `...` keep the dots in the name so the
            // name rules reject them
            "variadic_parameter_declaration" | "variadic_parameter" => {
                let base = child
                    .child_by_field_name("declarator")
                    .map(|d| node_text(d, source).trim_start_matches("...").trim().to_string())
                    .unwrap_or_default();
                let var_type = lower_var_type(child, source)
                    .unwrap_or_else(|| VarType::named(""));
                params.push(Param::Var(Var {
                    template_spec: None,
                    var_type,
                    decl: VarDecl::plain(format!("{base}...")),
                }));
            }
            "comment" => {}
            _ => {
                params.push(Param::Var(Var {
                    template_spec: None,
                    var_type: VarType::named(node_text(child, source)),
                    decl: VarDecl::plain(""),
                }));
            }
        }
    }
    params
}

fn lower_lambda(node: Node, source: &[u8]) -> Lambda {
    let captures = node
        .child_by_field_name("captures")
        .and_then(|c| lower_captures(c, source));

    let mut return_type = None;
    let mut params = Vec::new();
    if let Some(declarator) = node.child_by_field_name("declarator") {
        if let Some(list) = declarator.child_by_field_name("parameters") {
            params = lower_params(list, source);
        }
        for child in named_children(declarator) {
            if child.kind() == "trailing_return_type" {
                let text = named_children(child)
                    .first()
                    .map(|t| node_text(*t, source).to_string())
                    .unwrap_or_default();
                return_type = Some(VarType::named(text));
            }
        }
    }

    let body = node
        .child_by_field_name("body")
        .map(|b| lower_block(b, source));

    Lambda {
        captures,
        return_type,
        params,
        body,
    }
}

fn lower_captures(node: Node, source: &[u8]) -> Option<Expr> {
    let mut items: Vec<Expr> = Vec::new();
    for child in named_children(node) {
        match child.kind() {
            "lambda_default_capture" => {
                if node_text(child, source) == "&" {
                    // by-reference default capture reads as a referencing op
                    items.push(Expr::unary(UnaryOp::AddressOf, Expr::name("")));
                }
            }
            "comment" => {}
            _ => {
                if let Some(expr) = lower_expr(child, source) {
                    items.push(expr);
                }
            }
        }
    }
    items
        .into_iter()
        .reduce(|lhs, rhs| Expr::binary(BinaryOp::Comma, lhs, rhs))
}

// ─── Control flow ────────────────────────────────────────────────────

/// if/while/switch conditions may declare, so they lower to entities.
fn lower_condition(node: Node, source: &[u8]) -> Entity {
    let Some(value) = node.child_by_field_name("value") else {
        return Entity::Blob;
    };
    lower_condition_value(value, source)
}

fn lower_condition_value(value: Node, source: &[u8]) -> Entity {
    if value.kind().contains("declaration") {
        return lower_statement_entity(value, source);
    }
    match lower_expr(value, source) {
        Some(expr) => Entity::Expression(expr),
        None => Entity::Blob,
    }
}

fn lower_if(node: Node, source: &[u8]) -> Entity {
    let condition = node
        .child_by_field_name("condition")
        .map(|c| lower_condition(c, source))
        .unwrap_or(Entity::Blob);

    let body = node
        .child_by_field_name("consequence")
        .map(|b| Box::new(lower_statement_entity(b, source)));

    let else_part = node.child_by_field_name("alternative").map(|alt| {
        // else_clause wraps the actual statement
        let inner = named_children(alt)
            .into_iter()
            .find(|c| c.kind() != "comment");
        Box::new(match inner {
            Some(stmt) => lower_statement_entity(stmt, source),
            None => Entity::Compound(Compound::block(Vec::new())),
        })
    });

    Entity::If(IfBlock {
        condition: Box::new(condition),
        body,
        else_part,
    })
}

fn lower_for(node: Node, source: &[u8]) -> Entity {
    let init = node.child_by_field_name("initializer").map(|i| {
        Box::new(match i.kind() {
            "declaration" => lower_statement_entity(i, source),
            "expression_statement" => lower_statement_entity(i, source),
            _ => match lower_expr(i, source) {
                Some(expr) => Entity::Expression(expr),
                None => Entity::Blob,
            },
        })
    });

    let stop = node
        .child_by_field_name("condition")
        .map(|c| lower_expr(c, source).unwrap_or_else(|| Expr::name("")));
    let step = node
        .child_by_field_name("update")
        .map(|u| lower_expr(u, source).unwrap_or_else(|| Expr::name("")));
    let body = node
        .child_by_field_name("body")
        .map(|b| Box::new(lower_statement_entity(b, source)));

    Entity::For(ForBlock {
        init,
        stop,
        step,
        body,
    })
}

fn lower_range_for(node: Node, source: &[u8]) -> Entity {
    let var = lower_var_type(node, source).map(|var_type| {
        let (ptr_level, decl) = node
            .child_by_field_name("declarator")
            .and_then(|d| lower_one_declarator(d, source))
            .unwrap_or((0, VarDecl::plain("")));
        Box::new(Var {
            template_spec: None,
            var_type: VarType {
                ptr_level: var_type.ptr_level + ptr_level,
                ..var_type
            },
            decl,
        })
    });

    let range = node
        .child_by_field_name("right")
        .and_then(|r| lower_expr(r, source));
    let body = node
        .child_by_field_name("body")
        .map(|b| Box::new(lower_statement_entity(b, source)));

    Entity::RangeFor(RangeForBlock { var, range, body })
}

fn lower_while(node: Node, source: &[u8]) -> Entity {
    let condition = node
        .child_by_field_name("condition")
        .map(|c| lower_condition(c, source))
        .unwrap_or(Entity::Blob);
    let body = node
        .child_by_field_name("body")
        .map(|b| Box::new(lower_statement_entity(b, source)));

    Entity::While(WhileBlock {
        condition: Box::new(condition),
        body,
    })
}

fn lower_do_while(node: Node, source: &[u8]) -> Entity {
    let body = node
        .child_by_field_name("body")
        .map(|b| Box::new(lower_statement_entity(b, source)));
    let condition = node
        .child_by_field_name("condition")
        .and_then(|c| lower_expr(c, source))
        .map(Entity::Expression)
        .unwrap_or(Entity::Blob);

    Entity::DoWhile(DoWhileBlock {
        body,
        condition: Box::new(condition),
    })
}

fn lower_switch(node: Node, source: &[u8]) -> Entity {
    let condition = node
        .child_by_field_name("condition")
        .and_then(|c| c.child_by_field_name("value"))
        .and_then(|v| lower_expr(v, source))
        .unwrap_or_else(|| Expr::name(""));

    let mut cases = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        for child in named_children(body) {
            match child.kind() {
                "case_statement" => cases.push(lower_case(child, source)),
                "comment" => {}
                _ => {
                    // stray statements outside any case label
                    let mut stray = Vec::new();
                    lower_into(child, source, &mut stray);
                    cases.push(SwitchCase {
                        expr: None,
                        body: Some(Compound::block(stray)),
                    });
                }
            }
        }
    }

    Entity::Switch(SwitchBlock { condition, cases })
}

fn lower_case(node: Node, source: &[u8]) -> SwitchCase {
    let expr = node
        .child_by_field_name("value")
        .and_then(|v| lower_expr(v, source));

    let value_id = node.child_by_field_name("value").map(|v| v.id());
    let mut statements = Vec::new();
    for child in named_children(node) {
        if Some(child.id()) == value_id {
            continue;
        }
        lower_into(child, source, &mut statements);
    }

    SwitchCase {
        expr,
        body: Some(Compound::block(statements)),
    }
}

fn lower_return(node: Node, source: &[u8]) -> Entity {
    let value = named_children(node)
        .into_iter()
        .find(|c| c.kind() != "comment")
        .and_then(|v| lower_expr(v, source));
    Entity::Return(Return { value })
}

// ─── Expressions ─────────────────────────────────────────────────────

fn lower_expression_statement(node: Node, source: &[u8], out: &mut Vec<Entity>) {
    let Some(expr_node) = named_children(node).into_iter().find(|c| c.kind() != "comment") else {
        return; // bare `;`
    };

    // statement-level call to a known platform macro
    if expr_node.kind() == "call_expression" {
        if let Some(function) = expr_node.child_by_field_name("function") {
            let name = node_text(function, source);
            if function.kind() == "identifier" && is_known_macro(name) {
                out.push(Entity::MacroCall(MacroCall {
                    name: name.to_string(),
                }));
                return;
            }
        }
    }

    match lower_expr(expr_node, source) {
        Some(expr) => out.push(Entity::Expression(expr)),
        None => out.push(Entity::Blob),
    }
}

fn lower_expr_list(node: Node, source: &[u8]) -> Option<Vec<Expr>> {
    let mut exprs = Vec::new();
    for child in named_children(node) {
        if child.kind() == "comment" {
            continue;
        }
        exprs.push(lower_expr(child, source)?);
    }
    Some(exprs)
}

fn lower_expr(node: Node, source: &[u8]) -> Option<Expr> {
    if node.is_missing() || node.is_error() {
        return None;
    }

    match node.kind() {
        "number_literal" => Some(Expr::number(node_text(node, source))),

        "string_literal" | "raw_string_literal" | "concatenated_string" => Some(Expr::Atomic(
            AtomicExpr::StringLiteral(node_text(node, source).to_string()),
        )),

        "char_literal" => Some(Expr::Atomic(AtomicExpr::CharLiteral(
            node_text(node, source).to_string(),
        ))),

        "identifier" | "field_identifier" | "type_identifier" | "namespace_identifier"
        | "statement_identifier" | "qualified_identifier" | "template_function"
        | "template_type" | "dependent_name" | "true" | "false" | "this" | "nullptr"
        | "null" | "primitive_type" | "auto" => Some(Expr::name(node_text(node, source))),

        "parenthesized_expression" => {
            let inner = named_children(node)
                .into_iter()
                .find(|c| c.kind() != "comment")?;
            Some(Expr::unary(UnaryOp::Parenthesize, lower_expr(inner, source)?))
        }

        "unary_expression" => {
            let op = match operator_text(node, source)? {
                "!" => UnaryOp::LogicalNot,
                "~" => UnaryOp::BitToggle,
                "-" => UnaryOp::Minus,
                "+" => UnaryOp::Plus,
                _ => return None,
            };
            let argument = node.child_by_field_name("argument")?;
            Some(Expr::unary(op, lower_expr(argument, source)?))
        }

        "pointer_expression" => {
            let op = match operator_text(node, source)? {
                "*" => UnaryOp::Deref,
                "&" => UnaryOp::AddressOf,
                _ => return None,
            };
            let argument = node.child_by_field_name("argument")?;
            // forbidden anyway; a bad operand must not mask the message
            let operand =
                lower_expr(argument, source).unwrap_or_else(|| Expr::name(node_text(argument, source)));
            Some(Expr::unary(op, operand))
        }

        "update_expression" => {
            let argument = node.child_by_field_name("argument")?;
            let operator = node.child_by_field_name("operator")?;
            let prefix = operator.start_byte() < argument.start_byte();
            let op = match (node_text(operator, source), prefix) {
                ("++", true) => UnaryOp::PrefixIncrement,
                ("++", false) => UnaryOp::PostfixIncrement,
                ("--", true) => UnaryOp::PrefixDecrement,
                ("--", false) => UnaryOp::PostfixDecrement,
                _ => return None,
            };
            Some(Expr::unary(op, lower_expr(argument, source)?))
        }

        "binary_expression" => {
            let op = binary_op(operator_text(node, source)?)?;
            let left = lower_expr(node.child_by_field_name("left")?, source)?;
            let right = lower_expr(node.child_by_field_name("right")?, source)?;
            Some(Expr::binary(op, left, right))
        }

        "assignment_expression" => {
            let op = match operator_text(node, source)? {
                "=" => BinaryOp::Assign,
                "+=" => BinaryOp::PlusAssign,
                "-=" => BinaryOp::MinusAssign,
                "*=" => BinaryOp::MulAssign,
                "/=" => BinaryOp::DivAssign,
                "%=" => BinaryOp::PercentAssign,
                "&=" => BinaryOp::AndAssign,
                "|=" => BinaryOp::OrAssign,
                "^=" => BinaryOp::XorAssign,
                "<<=" => BinaryOp::LShiftAssign,
                ">>=" => BinaryOp::RShiftAssign,
                _ => return None,
            };
            let left = lower_expr(node.child_by_field_name("left")?, source)?;
            let right = lower_expr(node.child_by_field_name("right")?, source)?;
            Some(Expr::binary(op, left, right))
        }

        "comma_expression" => {
            let left = lower_expr(node.child_by_field_name("left")?, source)?;
            let right = lower_expr(node.child_by_field_name("right")?, source)?;
            Some(Expr::binary(BinaryOp::Comma, left, right))
        }

        "conditional_expression" => {
            let condition = lower_expr(node.child_by_field_name("condition")?, source)?;
            let consequence = lower_expr(node.child_by_field_name("consequence")?, source)?;
            let alternative = lower_expr(node.child_by_field_name("alternative")?, source)?;
            Some(Expr::Trinomial(
                TernaryOp::Conditional,
                Box::new(condition),
                Box::new(consequence),
                Box::new(alternative),
            ))
        }

        "call_expression" => lower_call(node, source),

        "field_expression" => {
            let op = if has_token(node, source, "->") {
                BinaryOp::Arrow
            } else {
                BinaryOp::Dot
            };
            let argument = lower_expr(node.child_by_field_name("argument")?, source)?;
            let field = node.child_by_field_name("field")?;
            Some(Expr::binary(op, argument, Expr::name(node_text(field, source))))
        }

        "subscript_expression" => {
            let argument = node.child_by_field_name("argument")?;
            let operand =
                lower_expr(argument, source).unwrap_or_else(|| Expr::name(node_text(argument, source)));
            let index = node
                .child_by_field_name("index")
                .or_else(|| node.child_by_field_name("indices"))
                .and_then(|i| lower_expr(i, source))
                .unwrap_or_else(|| Expr::number("0"));
            Some(Expr::binary(BinaryOp::ArrayIndex, operand, index))
        }

        "cast_expression" => {
            let target = node
                .child_by_field_name("type")
                .map(|t| lower_type_descriptor(t, source))?;
            let operand = lower_expr(node.child_by_field_name("value")?, source)?;
            Some(Expr::Typecast {
                kind: TypecastKind::CStyle,
                target: Box::new(target),
                operand: Box::new(operand),
            })
        }

        "sizeof_expression" => {
            if has_token(node, source, "...") {
                let inner = named_children(node)
                    .first()
                    .map(|n| Expr::name(node_text(*n, source)))
                    .unwrap_or_else(|| Expr::name(""));
                return Some(Expr::unary(UnaryOp::VariadicSizeOf, inner));
            }
            let operand = match node.child_by_field_name("value") {
                Some(value) => lower_expr(value, source)?,
                None => {
                    let descriptor = node.child_by_field_name("type")?;
                    Expr::Atomic(AtomicExpr::VarType(Box::new(lower_type_descriptor(
                        descriptor, source,
                    ))))
                }
            };
            Some(Expr::unary(UnaryOp::SizeOf, operand))
        }

        "new_expression" => {
            let type_name = node
                .child_by_field_name("type")
                .map(|t| node_text(t, source))
                .unwrap_or("");
            if node.child_by_field_name("placement").is_some() {
                return Some(Expr::binary(
                    BinaryOp::PlacementNew,
                    Expr::name(type_name),
                    Expr::name(""),
                ));
            }
            Some(Expr::unary(UnaryOp::New, Expr::name(type_name)))
        }

        "delete_expression" => {
            let op = if has_token(node, source, "[") {
                UnaryOp::DeleteArray
            } else {
                UnaryOp::Delete
            };
            let operand = named_children(node)
                .into_iter()
                .find(|c| c.kind() != "comment")
                .and_then(|v| lower_expr(v, source))
                .unwrap_or_else(|| Expr::name(""));
            Some(Expr::unary(op, operand))
        }

        "lambda_expression" => Some(Expr::Atomic(AtomicExpr::Lambda(Box::new(lower_lambda(
            node, source,
        ))))),

        "initializer_list" => Some(Expr::InitializerList(lower_expr_list(node, source)?)),

        "compound_literal_expression" => {
            let name = node
                .child_by_field_name("type")
                .map(|t| node_text(t, source).to_string())
                .unwrap_or_default();
            let args = node
                .child_by_field_name("value")
                .map(|v| lower_expr_list(v, source))
                .unwrap_or_else(|| Some(Vec::new()))?;
            Some(Expr::UniformInitializer { name, args })
        }

        "user_defined_literal" => {
            let number = named_children(node)
                .first()
                .map(|n| Expr::number(node_text(*n, source)))
                .unwrap_or_else(|| Expr::number(""));
            let suffix = named_children(node)
                .last()
                .map(|n| Expr::name(node_text(*n, source)))
                .unwrap_or_else(|| Expr::name(""));
            Some(Expr::binary(BinaryOp::UserLiteral, number, suffix))
        }

        "parameter_pack_expansion" => {
            let inner = named_children(node)
                .into_iter()
                .find(|c| c.kind() != "comment")
                .and_then(|v| lower_expr(v, source))
                .unwrap_or_else(|| Expr::name(""));
            Some(Expr::unary(UnaryOp::Variadic, inner))
        }

        _ => None,
    }
}

fn operator_text<'a>(node: Node, source: &'a [u8]) -> Option<&'a str> {
    node.child_by_field_name("operator")
        .map(|op| node_text(op, source))
}

fn binary_op(text: &str) -> Option<BinaryOp> {
    Some(match text {
        "+" => BinaryOp::Plus,
        "-" => BinaryOp::Minus,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Percent,
        "&" => BinaryOp::And,
        "|" => BinaryOp::Or,
        "^" => BinaryOp::Xor,
        "<<" => BinaryOp::LeftShift,
        ">>" => BinaryOp::RightShift,
        "&&" => BinaryOp::LogicalAnd,
        "||" => BinaryOp::LogicalOr,
        "==" => BinaryOp::Equal,
        "!=" => BinaryOp::NotEqual,
        "<" => BinaryOp::Less,
        ">" => BinaryOp::Greater,
        "<=" => BinaryOp::LessEqual,
        ">=" => BinaryOp::GreaterEqual,
        "<=>" => BinaryOp::ThreeWayCmp,
        "->" => BinaryOp::Arrow,
        "->*" => BinaryOp::ArrowStar,
        _ => return None,
    })
}

/// Calls, plus the named C++ casts which share the call shape
/// (`static_cast<T>(x)` parses as a call of a template function).
fn lower_call(node: Node, source: &[u8]) -> Option<Expr> {
    let function = node.child_by_field_name("function")?;

    if function.kind() == "template_function" {
        let cast_kind = function
            .child_by_field_name("name")
            .map(|n| node_text(n, source))
            .and_then(|name| match name {
                "static_cast" => Some(TypecastKind::Static),
                "dynamic_cast" => Some(TypecastKind::Dynamic),
                "reinterpret_cast" => Some(TypecastKind::Reinterpret),
                "const_cast" => Some(TypecastKind::Const),
                _ => None,
            });
        if let Some(kind) = cast_kind {
            let target = function
                .child_by_field_name("arguments")
                .and_then(|args| named_children(args).into_iter().next())
                .map(|t| lower_type_descriptor(t, source))
                .unwrap_or_else(|| VarType::named(""));
            let operand = node
                .child_by_field_name("arguments")
                .and_then(|args| named_children(args).into_iter().next())
                .and_then(|a| lower_expr(a, source))
                .unwrap_or_else(|| Expr::name(""));
            return Some(Expr::Typecast {
                kind,
                target: Box::new(target),
                operand: Box::new(operand),
            });
        }
    }

    let callee = lower_expr(function, source)?;
    let args = node
        .child_by_field_name("arguments")
        .map(|list| lower_expr_list(list, source))
        .unwrap_or_else(|| Some(Vec::new()))?;

    Some(Expr::FunctionCall {
        callee: Box::new(callee),
        args,
    })
}
