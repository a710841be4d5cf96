//! Criterion benchmarks for the compliance checker.
//!
//! Run with: `cargo bench`
//!
//! Synthetic ASTs keep the numbers reproducible across machines; the parse
//! benchmark uses a generated contract source of configurable size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use contractverify::ast::*;
use contractverify::check::{check_compliance, find_state_struct_name};
use contractverify::parse::parse_source;

// ─── Helpers ─────────────────────────────────────────────────────────

/// A TESTCON contract with `methods` methods of `statements` permitted
/// statements each.
fn build_synthetic_contract(methods: usize, statements: usize) -> Entity {
    let mut members = Vec::with_capacity(methods);
    for m in 0..methods {
        let mut body = Vec::with_capacity(statements);
        for s in 0..statements {
            body.push(Entity::Expression(Expr::binary(
                BinaryOp::PlusAssign,
                Expr::binary(
                    BinaryOp::Dot,
                    Expr::name("state"),
                    Expr::name(format!("field{s}")),
                ),
                Expr::binary(BinaryOp::Mul, Expr::name("amount"), Expr::number("3")),
            )));
        }
        members.push(Entity::Function(Function {
            name: format!("method{m}"),
            template_spec: None,
            return_type: Some(VarType::named("void")),
            params: vec![Param::Var(Var::new(
                VarType::named("uint64"),
                VarDecl::plain("amount"),
            ))],
            body: Some(Compound::block(body)),
        }));
    }

    Entity::Compound(Compound::file(vec![Entity::Compound(Compound {
        kind: CompoundKind::Struct,
        name: "TESTCON".to_string(),
        template_spec: None,
        inheritance: vec!["ContractBase".to_string()],
        members,
    })]))
}

/// Structs nested `depth` deep, to exercise the scope stack.
fn build_nested_contract(depth: usize) -> Entity {
    let mut inner = Entity::Var(Var::new(VarType::named("uint64"), VarDecl::plain("leaf")));
    for i in (0..depth).rev() {
        inner = Entity::Compound(Compound {
            kind: CompoundKind::Struct,
            name: format!("Nested{i}"),
            template_spec: None,
            inheritance: if i == 0 {
                vec!["ContractBase".to_string()]
            } else {
                Vec::new()
            },
            members: vec![inner],
        });
    }
    Entity::Compound(Compound::file(vec![inner]))
}

fn build_contract_source(methods: usize) -> String {
    let mut source = String::from("struct TESTCON : public ContractBase\n{\n");
    for m in 0..methods {
        source.push_str(&format!(
            "    void method{m}(uint64 amount)\n    {{\n        state.total += amount * 3;\n    }}\n"
        ));
    }
    source.push_str("};\n");
    source
}

// ─── Benchmarks ──────────────────────────────────────────────────────

fn bench_check_compliance(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_compliance");
    for &(methods, statements) in &[(10usize, 10usize), (100, 10), (100, 100)] {
        let ast = build_synthetic_contract(methods, statements);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{methods}x{statements}")),
            &ast,
            |b, ast| b.iter(|| check_compliance(black_box(ast), black_box("TESTCON"))),
        );
    }
    group.finish();
}

fn bench_nested_scopes(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_scopes");
    for &depth in &[8usize, 64, 256] {
        let ast = build_nested_contract(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &ast, |b, ast| {
            b.iter(|| check_compliance(black_box(ast), black_box("Nested0")))
        });
    }
    group.finish();
}

fn bench_state_struct_discovery(c: &mut Criterion) {
    let ast = build_synthetic_contract(100, 10);
    c.bench_function("find_state_struct_name", |b| {
        b.iter(|| find_state_struct_name(black_box(&ast)))
    });
}

fn bench_parse_source(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_source");
    for &methods in &[10usize, 100] {
        let source = build_contract_source(methods);
        group.bench_with_input(
            BenchmarkId::from_parameter(methods),
            &source,
            |b, source| b.iter(|| parse_source(black_box(source))),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_check_compliance,
    bench_nested_scopes,
    bench_state_struct_discovery,
    bench_parse_source
);
criterion_main!(benches);
