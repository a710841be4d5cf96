//! Lowering tests: parse inline snippets and assert the shape of the
//! resulting AST. Full verdict tests live in `compliance_tests.rs`.

use crate::ast::*;
use crate::parse::parse_source;

fn parse_members(source: &str) -> Vec<Entity> {
    match parse_source(source).expect("tree-sitter must produce a tree") {
        Entity::Compound(compound) => {
            assert_eq!(compound.kind, CompoundKind::File);
            compound.members
        }
        other => panic!("expected a file compound, got {other:?}"),
    }
}

fn single_member(source: &str) -> Entity {
    let mut members = parse_members(source);
    assert_eq!(members.len(), 1, "expected one entity, got {members:?}");
    members.pop().expect("len checked")
}

#[test]
fn test_empty_source_is_empty_file() {
    assert!(parse_members("").is_empty());
}

#[test]
fn test_comment_lowering() {
    let member = single_member("// just a comment\n");
    assert_eq!(member, Entity::DocComment);
}

#[test]
fn test_include_is_preprocessor() {
    let member = single_member("#include <qpi.h>\n");
    assert_eq!(member, Entity::Preprocessor);
}

#[test]
fn test_define_is_preprocessor() {
    let member = single_member("#define LIMIT 16\n");
    assert_eq!(member, Entity::Preprocessor);
}

#[test]
fn test_struct_with_base() {
    let member = single_member("struct TESTCON : public ContractBase { };\n");
    match member {
        Entity::Compound(compound) => {
            assert_eq!(compound.kind, CompoundKind::Struct);
            assert_eq!(compound.name, "TESTCON");
            assert_eq!(compound.inheritance, vec!["ContractBase".to_string()]);
            assert!(compound.members.is_empty());
        }
        other => panic!("expected a struct compound, got {other:?}"),
    }
}

#[test]
fn test_forward_declaration() {
    let member = single_member("struct Later;\n");
    assert_eq!(
        member,
        Entity::ForwardClassDecl(ForwardClassDecl {
            name: "Later".to_string(),
            template_spec: None,
        })
    );
}

#[test]
fn test_namespace_lowering() {
    let member = single_member("namespace detail { }\n");
    match member {
        Entity::Compound(compound) => {
            assert_eq!(compound.kind, CompoundKind::Namespace);
            assert_eq!(compound.name, "detail");
        }
        other => panic!("expected a namespace compound, got {other:?}"),
    }
}

#[test]
fn test_enum_lowering() {
    let member = single_member("enum Color { RED, GREEN };\n");
    assert_eq!(
        member,
        Entity::Enum(EnumDecl {
            name: "Color".to_string()
        })
    );
}

#[test]
fn test_using_namespace_lowering() {
    let member = single_member("using namespace QPI;\n");
    assert_eq!(
        member,
        Entity::UsingNamespace(UsingNamespace {
            name: "QPI".to_string()
        })
    );
}

#[test]
fn test_alias_declaration_lowering() {
    let member = single_member("using Amount = QPI::uint64;\n");
    match member {
        Entity::UsingDecl(decl) => {
            assert_eq!(decl.name, "Amount");
            match decl.definition {
                UsingDef::VarType(var_type) => {
                    assert_eq!(var_type.base_type, "QPI::uint64");
                    assert_eq!(var_type.ptr_level, 0);
                }
                other => panic!("expected a var-type definition, got {other:?}"),
            }
        }
        other => panic!("expected a using declaration, got {other:?}"),
    }
}

#[test]
fn test_typedef_lowering() {
    let member = single_member("typedef unsigned int Amount;\n");
    match member {
        Entity::Typedef(def) => {
            assert_eq!(def.var.var_type.base_type, "unsigned int");
            assert_eq!(def.var.decl.name, "Amount");
        }
        other => panic!("expected a typedef, got {other:?}"),
    }
}

#[test]
fn test_global_const_lowering() {
    let member = single_member("const uint64 TESTCON_FEE = 100;\n");
    match member {
        Entity::Var(var) => {
            assert!(var.var_type.is_const);
            assert_eq!(var.var_type.base_type, "uint64");
            assert_eq!(var.decl.name, "TESTCON_FEE");
            assert_eq!(
                var.decl.init,
                Some(VarInit::Assign(Expr::number("100")))
            );
        }
        other => panic!("expected a variable, got {other:?}"),
    }
}

#[test]
fn test_constexpr_lowering() {
    let member = single_member("constexpr uint64 TESTCON_MAX = 16;\n");
    match member {
        Entity::Var(var) => assert!(var.var_type.is_constexpr || var.var_type.is_const),
        other => panic!("expected a variable, got {other:?}"),
    }
}

#[test]
fn test_pointer_declarator_lowering() {
    let members = parse_members("struct S { uint64* ptr; };\n");
    match &members[0] {
        Entity::Compound(compound) => match &compound.members[0] {
            Entity::Var(var) => assert_eq!(var.var_type.ptr_level, 1),
            other => panic!("expected a member variable, got {other:?}"),
        },
        other => panic!("expected a struct, got {other:?}"),
    }
}

#[test]
fn test_array_declarator_lowering() {
    let members = parse_members("struct S { uint64 values[8]; };\n");
    match &members[0] {
        Entity::Compound(compound) => match &compound.members[0] {
            Entity::Var(var) => assert_eq!(var.decl.array_dims, 1),
            other => panic!("expected a member variable, got {other:?}"),
        },
        other => panic!("expected a struct, got {other:?}"),
    }
}

#[test]
fn test_function_lowering() {
    let members = parse_members(
        "struct S {\n    uint64 add(uint64 a, uint64 b)\n    {\n        return a + b;\n    }\n};\n",
    );
    let Entity::Compound(compound) = &members[0] else {
        panic!("expected a struct");
    };
    match &compound.members[0] {
        Entity::Function(func) => {
            assert_eq!(func.name, "add");
            assert_eq!(func.params.len(), 2);
            assert_eq!(
                func.return_type.as_ref().map(|t| t.base_type.as_str()),
                Some("uint64")
            );
            let body = func.body.as_ref().expect("function body");
            assert_eq!(body.kind, CompoundKind::Block);
            assert_eq!(body.members.len(), 1);
            match &body.members[0] {
                Entity::Return(ret) => {
                    assert_eq!(
                        ret.value,
                        Some(Expr::binary(
                            BinaryOp::Plus,
                            Expr::name("a"),
                            Expr::name("b")
                        ))
                    );
                }
                other => panic!("expected a return statement, got {other:?}"),
            }
        }
        other => panic!("expected a function, got {other:?}"),
    }
}

#[test]
fn test_function_pointer_lowering() {
    let member = single_member("void (*handler)(uint64);\n");
    assert_eq!(member, Entity::FunctionPointer);
}

#[test]
fn test_string_literal_keeps_quotes() {
    let members = parse_members(
        "struct S {\n    void f()\n    {\n        x = \"hello\";\n    }\n};\n",
    );
    let Entity::Compound(compound) = &members[0] else {
        panic!("expected a struct");
    };
    let Entity::Function(func) = &compound.members[0] else {
        panic!("expected a function");
    };
    let body = func.body.as_ref().expect("body");
    match &body.members[0] {
        Entity::Expression(Expr::Binomial(BinaryOp::Assign, _, rhs)) => {
            assert_eq!(
                **rhs,
                Expr::Atomic(AtomicExpr::StringLiteral("\"hello\"".to_string()))
            );
        }
        other => panic!("expected an assignment, got {other:?}"),
    }
}

#[test]
fn test_macro_call_statement_lowering() {
    let members = parse_members(
        "struct S {\n    void f()\n    {\n        CALL(GetFee, input, output);\n    }\n};\n",
    );
    let Entity::Compound(compound) = &members[0] else {
        panic!("expected a struct");
    };
    let Entity::Function(func) = &compound.members[0] else {
        panic!("expected a function");
    };
    let body = func.body.as_ref().expect("body");
    assert_eq!(
        body.members[0],
        Entity::MacroCall(MacroCall {
            name: "CALL".to_string()
        })
    );
}

#[test]
fn test_unknown_call_is_not_a_macro() {
    let members = parse_members(
        "struct S {\n    void f()\n    {\n        notAMacro(1);\n    }\n};\n",
    );
    let Entity::Compound(compound) = &members[0] else {
        panic!("expected a struct");
    };
    let Entity::Function(func) = &compound.members[0] else {
        panic!("expected a function");
    };
    let body = func.body.as_ref().expect("body");
    assert!(matches!(
        body.members[0],
        Entity::Expression(Expr::FunctionCall { .. })
    ));
}

#[test]
fn test_garbage_becomes_blob() {
    let members = parse_members("@@@!!\n");
    assert!(
        members.iter().any(|m| *m == Entity::Blob),
        "unparseable input must lower to a blob, got {members:?}"
    );
}

#[test]
fn test_template_struct_lowering() {
    let member = single_member("template <typename T>\nstruct Box { };\n");
    match member {
        Entity::Compound(compound) => {
            assert_eq!(compound.kind, CompoundKind::Struct);
            assert_eq!(compound.name, "Box");
            let spec = compound.template_spec.expect("template spec");
            assert_eq!(spec.params.len(), 1);
            assert_eq!(spec.params[0].name, "T");
            assert_eq!(spec.params[0].param_type, None);
        }
        other => panic!("expected a templated struct, got {other:?}"),
    }
}

#[test]
fn test_nested_struct_registers_as_compound() {
    let members = parse_members("struct Outer {\n    struct Inner { };\n};\n");
    let Entity::Compound(outer) = &members[0] else {
        panic!("expected a struct");
    };
    match &outer.members[0] {
        Entity::Compound(inner) => {
            assert_eq!(inner.kind, CompoundKind::Struct);
            assert_eq!(inner.name, "Inner");
        }
        other => panic!("expected a nested struct, got {other:?}"),
    }
}
