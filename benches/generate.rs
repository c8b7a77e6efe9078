//! End-to-end generation latency benchmark.
//!
//! Builds synthetic type-checked programs of growing parameter counts and
//! measures a full processor-class generation pass for each.

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use prism::ast::*;
use prism::generate_processor;
use prism::span::{Span, Spanned};
use prism::types::Ty;

fn builtin_var(name: &str, ty: Ty, builtin: i32) -> Rc<Variable> {
    Rc::new(Variable {
        name: name.to_string(),
        ty,
        modifiers: Modifiers {
            flags: Flags::default(),
            precision: Precision::Default,
            layout: Layout {
                builtin,
                ..Layout::default()
            },
        },
        storage: Storage::Global,
        span: Span::dummy(),
    })
}

fn keyed_param(name: &str, ty: Ty) -> Rc<Variable> {
    Rc::new(Variable {
        name: name.to_string(),
        ty,
        modifiers: Modifiers {
            flags: Flags {
                is_in: true,
                ..Flags::default()
            },
            precision: Precision::Default,
            layout: Layout {
                key: KeyMode::Key,
                ..Layout::default()
            },
        },
        storage: Storage::Global,
        span: Span::dummy(),
    })
}

/// A program with `n` keyed float parameters, each referenced from `main`,
/// plus the usual input/output color plumbing.
fn synthetic_program(n: usize) -> Program {
    let in_color = builtin_var("pr_InColor", Ty::Half4, INPUT_COLOR_BUILTIN);
    let out_color = builtin_var("pr_OutColor", Ty::Half4, OUTPUT_COLOR_BUILTIN);

    let mut elements = Vec::new();
    let mut body = Vec::new();
    for i in 0..n {
        let param = keyed_param(&format!("scale{}", i), Ty::Float);
        elements.push(ProgramElement::VarDecls(VarDeclarations {
            base_ty: Ty::Float,
            vars: vec![VarDeclaration {
                var: param.clone(),
                init: None,
            }],
        }));
        body.push(Spanned::dummy(Stmt::Expr(Spanned::dummy(Expr::VarRef(
            param,
        )))));
    }
    body.push(Spanned::dummy(Stmt::Expr(Spanned::dummy(Expr::Binary {
        op: BinOp::Assign,
        lhs: Box::new(Spanned::dummy(Expr::VarRef(out_color))),
        rhs: Box::new(Spanned::dummy(Expr::VarRef(in_color))),
    }))));
    elements.push(ProgramElement::Function(FunctionDefinition {
        name: "main".to_string(),
        return_ty: Ty::Void,
        params: Vec::new(),
        body,
        span: Span::dummy(),
    }));
    Program { elements }
}

fn bench_generate(c: &mut Criterion) {
    let small = synthetic_program(4);
    let large = synthetic_program(32);

    let mut group = c.benchmark_group("generate");
    group.bench_function("4_params", |b| {
        b.iter(|| generate_processor(black_box(&small), "Bench").unwrap())
    });
    group.bench_function("32_params", |b| {
        b.iter(|| generate_processor(black_box(&large), "Bench").unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_generate);
criterion_main!(benches);
