//! Generic shader-text printer.
//!
//! The base capability the specialized backend builds on: precedence-aware
//! expression printing plus statement, function, and whole-program drives.
//! Everything here is a free function recursing through the [`GlslPrint`]
//! trait, so a backend overrides a node kind by handling it itself and calls
//! back in here explicitly for the kinds it leaves alone.

use crate::ast::*;
use crate::span::Spanned;

/// Operator precedence tiers, tightest binding first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Parentheses = 1,
    Postfix,
    Prefix,
    Multiplicative,
    Additive,
    Shift,
    Relational,
    Equality,
    BitwiseAnd,
    BitwiseXor,
    BitwiseOr,
    LogicalAnd,
    LogicalXor,
    LogicalOr,
    Ternary,
    Assignment,
    Sequence,
    TopLevel,
}

pub fn binary_precedence(op: BinOp) -> Precedence {
    match op {
        BinOp::Mul | BinOp::Div | BinOp::Mod => Precedence::Multiplicative,
        BinOp::Add | BinOp::Sub => Precedence::Additive,
        BinOp::Shl | BinOp::Shr => Precedence::Shift,
        BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => Precedence::Relational,
        BinOp::Eq | BinOp::Ne => Precedence::Equality,
        BinOp::BitAnd => Precedence::BitwiseAnd,
        BinOp::BitXor => Precedence::BitwiseXor,
        BinOp::BitOr => Precedence::BitwiseOr,
        BinOp::LogicalAnd => Precedence::LogicalAnd,
        BinOp::LogicalXor => Precedence::LogicalXor,
        BinOp::LogicalOr => Precedence::LogicalOr,
        BinOp::Assign => Precedence::Assignment,
        BinOp::Comma => Precedence::Sequence,
    }
}

/// The printer capability set. The backend implements this and delegates the
/// node kinds it does not specialize to the free functions below.
pub trait GlslPrint {
    fn write_expression(&mut self, out: &mut String, expr: &Spanned<Expr>, parent: Precedence);
    fn write_statement(&mut self, out: &mut String, stmt: &Spanned<Stmt>);
    fn write_program_element(&mut self, out: &mut String, element: &ProgramElement);

    /// Initializer of a declared variable. Backends may substitute a
    /// deferred runtime value here.
    fn write_var_initializer(&mut self, out: &mut String, var: &Variable, value: &Spanned<Expr>) {
        let _ = var;
        self.write_expression(out, value, Precedence::TopLevel);
    }

    /// Line terminator woven into emitted shader text.
    fn line_ending(&self) -> &'static str {
        "\n"
    }
}

/// Float literals keep a decimal point so the shader compiler reads them as
/// floating-point.
pub fn float_literal(value: f64) -> String {
    if value == value.trunc() && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

pub fn write_expression<P: GlslPrint + ?Sized>(
    p: &mut P,
    out: &mut String,
    expr: &Spanned<Expr>,
    parent: Precedence,
) {
    match &expr.node {
        Expr::IntLiteral(v) => out.push_str(&v.to_string()),
        Expr::FloatLiteral(v) => out.push_str(&float_literal(*v)),
        Expr::BoolLiteral(v) => out.push_str(if *v { "true" } else { "false" }),
        Expr::VarRef(var) => out.push_str(&var.name),
        Expr::Setting { name, .. } => out.push_str(name),
        Expr::Binary { op, lhs, rhs } => write_binary(p, out, *op, lhs, rhs, parent),
        Expr::Prefix { op, operand } => write_prefix(p, out, *op, operand, parent),
        Expr::Ternary {
            cond,
            if_true,
            if_false,
        } => write_ternary(p, out, cond, if_true, if_false, parent),
        Expr::Index { base, index } => write_index(p, out, base, index),
        Expr::Swizzle { base, components } => write_swizzle(p, out, base, components),
        Expr::Call { function, args } => write_call(p, out, function, args),
    }
}

pub fn write_binary<P: GlslPrint + ?Sized>(
    p: &mut P,
    out: &mut String,
    op: BinOp,
    lhs: &Spanned<Expr>,
    rhs: &Spanned<Expr>,
    parent: Precedence,
) {
    let precedence = binary_precedence(op);
    let needs_parens = precedence >= parent;
    if needs_parens {
        out.push('(');
    }
    p.write_expression(out, lhs, precedence);
    out.push(' ');
    out.push_str(op.as_str());
    out.push(' ');
    p.write_expression(out, rhs, precedence);
    if needs_parens {
        out.push(')');
    }
}

pub fn write_prefix<P: GlslPrint + ?Sized>(
    p: &mut P,
    out: &mut String,
    op: PrefixOp,
    operand: &Spanned<Expr>,
    parent: Precedence,
) {
    let needs_parens = Precedence::Prefix >= parent;
    if needs_parens {
        out.push('(');
    }
    out.push_str(op.as_str());
    p.write_expression(out, operand, Precedence::Prefix);
    if needs_parens {
        out.push(')');
    }
}

pub fn write_ternary<P: GlslPrint + ?Sized>(
    p: &mut P,
    out: &mut String,
    cond: &Spanned<Expr>,
    if_true: &Spanned<Expr>,
    if_false: &Spanned<Expr>,
    parent: Precedence,
) {
    let needs_parens = Precedence::Ternary >= parent;
    if needs_parens {
        out.push('(');
    }
    p.write_expression(out, cond, Precedence::Ternary);
    out.push_str(" ? ");
    p.write_expression(out, if_true, Precedence::Ternary);
    out.push_str(" : ");
    p.write_expression(out, if_false, Precedence::Ternary);
    if needs_parens {
        out.push(')');
    }
}

pub fn write_index<P: GlslPrint + ?Sized>(
    p: &mut P,
    out: &mut String,
    base: &Spanned<Expr>,
    index: &Spanned<Expr>,
) {
    p.write_expression(out, base, Precedence::Postfix);
    out.push('[');
    p.write_expression(out, index, Precedence::TopLevel);
    out.push(']');
}

pub fn write_swizzle<P: GlslPrint + ?Sized>(
    p: &mut P,
    out: &mut String,
    base: &Spanned<Expr>,
    components: &str,
) {
    p.write_expression(out, base, Precedence::Postfix);
    out.push('.');
    out.push_str(components);
}

pub fn write_call<P: GlslPrint + ?Sized>(
    p: &mut P,
    out: &mut String,
    function: &FunctionRef,
    args: &[Spanned<Expr>],
) {
    out.push_str(&function.name);
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        p.write_expression(out, arg, Precedence::Sequence);
    }
    out.push(')');
}

pub fn write_statement<P: GlslPrint + ?Sized>(p: &mut P, out: &mut String, stmt: &Spanned<Stmt>) {
    match &stmt.node {
        Stmt::Block(stmts) => {
            out.push('{');
            out.push_str(p.line_ending());
            for s in stmts {
                p.write_statement(out, s);
                out.push_str(p.line_ending());
            }
            out.push('}');
        }
        Stmt::VarDecls(decls) => write_var_declarations(p, out, decls),
        Stmt::Expr(e) => {
            p.write_expression(out, e, Precedence::TopLevel);
            out.push(';');
        }
        Stmt::If {
            cond,
            then_stmt,
            else_stmt,
            ..
        } => write_if(p, out, cond, then_stmt, else_stmt.as_deref()),
        Stmt::Switch { value, cases, .. } => write_switch(p, out, value, cases),
        Stmt::For {
            init,
            cond,
            next,
            body,
        } => write_for(p, out, init.as_deref(), cond.as_ref(), next.as_ref(), body),
        Stmt::Return(value) => {
            out.push_str("return");
            if let Some(v) = value {
                out.push(' ');
                p.write_expression(out, v, Precedence::TopLevel);
            }
            out.push(';');
        }
        Stmt::Break => out.push_str("break;"),
        Stmt::Continue => out.push_str("continue;"),
        Stmt::Discard => out.push_str("discard;"),
    }
}

pub fn write_var_declarations<P: GlslPrint + ?Sized>(
    p: &mut P,
    out: &mut String,
    decls: &VarDeclarations,
) {
    out.push_str(decls.base_ty.name());
    out.push(' ');
    for (i, decl) in decls.vars.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&decl.var.name);
        if let Some(init) = &decl.init {
            out.push_str(" = ");
            p.write_var_initializer(out, &decl.var, init);
        }
    }
    out.push(';');
}

pub fn write_if<P: GlslPrint + ?Sized>(
    p: &mut P,
    out: &mut String,
    cond: &Spanned<Expr>,
    then_stmt: &Spanned<Stmt>,
    else_stmt: Option<&Spanned<Stmt>>,
) {
    out.push_str("if (");
    p.write_expression(out, cond, Precedence::TopLevel);
    out.push_str(") ");
    p.write_statement(out, then_stmt);
    if let Some(e) = else_stmt {
        out.push_str(" else ");
        p.write_statement(out, e);
    }
}

pub fn write_switch<P: GlslPrint + ?Sized>(
    p: &mut P,
    out: &mut String,
    value: &Spanned<Expr>,
    cases: &[SwitchCase],
) {
    out.push_str("switch (");
    p.write_expression(out, value, Precedence::TopLevel);
    out.push_str(") {");
    out.push_str(p.line_ending());
    for case in cases {
        match &case.value {
            Some(v) => {
                out.push_str("case ");
                p.write_expression(out, v, Precedence::TopLevel);
                out.push(':');
            }
            None => out.push_str("default:"),
        }
        out.push_str(p.line_ending());
        for s in &case.stmts {
            p.write_statement(out, s);
            out.push_str(p.line_ending());
        }
    }
    out.push('}');
}

pub fn write_for<P: GlslPrint + ?Sized>(
    p: &mut P,
    out: &mut String,
    init: Option<&Spanned<Stmt>>,
    cond: Option<&Spanned<Expr>>,
    next: Option<&Spanned<Expr>>,
    body: &Spanned<Stmt>,
) {
    out.push_str("for (");
    match init {
        Some(s) => p.write_statement(out, s),
        None => out.push(';'),
    }
    out.push(' ');
    if let Some(c) = cond {
        p.write_expression(out, c, Precedence::TopLevel);
    }
    out.push_str("; ");
    if let Some(n) = next {
        p.write_expression(out, n, Precedence::TopLevel);
    }
    out.push_str(") ");
    p.write_statement(out, body);
}

pub fn write_function<P: GlslPrint + ?Sized>(
    p: &mut P,
    out: &mut String,
    f: &FunctionDefinition,
) {
    out.push_str(f.return_ty.name());
    out.push(' ');
    out.push_str(&f.name);
    out.push('(');
    for (i, param) in f.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(param.ty.name());
        out.push(' ');
        out.push_str(&param.name);
    }
    out.push_str(") {");
    out.push_str(p.line_ending());
    for s in &f.body {
        p.write_statement(out, s);
        out.push_str(p.line_ending());
    }
    out.push('}');
    out.push_str(p.line_ending());
}

pub fn write_program_element<P: GlslPrint + ?Sized>(
    p: &mut P,
    out: &mut String,
    element: &ProgramElement,
) {
    match element {
        ProgramElement::VarDecls(decls) => {
            write_var_declarations(p, out, decls);
            out.push_str(p.line_ending());
        }
        ProgramElement::Function(f) => write_function(p, out, f),
        // Sections are injected at fixed points by the backend, never walked.
        ProgramElement::Section(_) => {}
    }
}

/// Drive a whole program through the printer, element by element.
pub fn write_program<P: GlslPrint + ?Sized>(p: &mut P, out: &mut String, program: &Program) {
    for element in &program.elements {
        p.write_program_element(out, element);
    }
}

/// Plain printer: every capability delegates to the generic functions.
pub struct PlainPrinter;

impl GlslPrint for PlainPrinter {
    fn write_expression(&mut self, out: &mut String, expr: &Spanned<Expr>, parent: Precedence) {
        write_expression(self, out, expr, parent);
    }

    fn write_statement(&mut self, out: &mut String, stmt: &Spanned<Stmt>) {
        write_statement(self, out, stmt);
    }

    fn write_program_element(&mut self, out: &mut String, element: &ProgramElement) {
        write_program_element(self, out, element);
    }
}

/// Source-style rendering of an expression, for generated code that quotes
/// an initializer verbatim.
pub fn description(expr: &Spanned<Expr>) -> String {
    let mut out = String::new();
    PlainPrinter.write_expression(&mut out, expr, Precedence::TopLevel);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Spanned;
    use crate::types::Ty;

    fn int(v: i64) -> Spanned<Expr> {
        Spanned::dummy(Expr::IntLiteral(v))
    }

    fn binary(op: BinOp, lhs: Spanned<Expr>, rhs: Spanned<Expr>) -> Spanned<Expr> {
        Spanned::dummy(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn print_expr(expr: &Spanned<Expr>) -> String {
        let mut out = String::new();
        PlainPrinter.write_expression(&mut out, expr, Precedence::TopLevel);
        out
    }

    #[test]
    fn test_nested_precedence_parenthesization() {
        // (1 + 2) * 3: the additive child of a multiplicative parent needs parens.
        let sum = binary(BinOp::Add, int(1), int(2));
        let product = binary(BinOp::Mul, sum, int(3));
        assert_eq!(print_expr(&product), "(1 + 2) * 3");

        // 1 + 2 * 3 stays flat.
        let product = binary(BinOp::Mul, int(2), int(3));
        let sum = binary(BinOp::Add, int(1), product);
        assert_eq!(print_expr(&sum), "1 + 2 * 3");
    }

    #[test]
    fn test_float_literals_keep_decimal_point() {
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(0.5), "0.5");
        assert_eq!(float_literal(-2.0), "-2.0");
    }

    #[test]
    fn test_call_and_swizzle() {
        let call = Spanned::dummy(Expr::Call {
            function: FunctionRef {
                name: "clamp".to_string(),
                builtin: true,
            },
            args: vec![
                int(0),
                Spanned::dummy(Expr::FloatLiteral(0.0)),
                Spanned::dummy(Expr::FloatLiteral(1.0)),
            ],
        });
        let swizzled = Spanned::dummy(Expr::Swizzle {
            base: Box::new(call),
            components: "rgb".to_string(),
        });
        assert_eq!(print_expr(&swizzled), "clamp(0, 0.0, 1.0).rgb");
    }

    #[test]
    fn test_return_statement() {
        let stmt = Spanned::dummy(Stmt::Return(Some(binary(BinOp::Add, int(1), int(2)))));
        let mut out = String::new();
        PlainPrinter.write_statement(&mut out, &stmt);
        assert_eq!(out, "return 1 + 2;");
    }

    #[test]
    fn test_var_declaration_statement() {
        let var = std::rc::Rc::new(Variable {
            name: "x".to_string(),
            ty: Ty::Float,
            modifiers: Modifiers::default(),
            storage: Storage::Local,
            span: crate::span::Span::dummy(),
        });
        let stmt = Spanned::dummy(Stmt::VarDecls(VarDeclarations {
            base_ty: Ty::Float,
            vars: vec![VarDeclaration {
                var,
                init: Some(Spanned::dummy(Expr::FloatLiteral(2.0))),
            }],
        }));
        let mut out = String::new();
        PlainPrinter.write_statement(&mut out, &stmt);
        assert_eq!(out, "float x = 2.0;");
    }
}
