//! The type-checked AST consumed by code generation.
//!
//! Produced by the front end (lexer/parser/type checker, out of scope here);
//! every variable reference is already resolved to its declaration and every
//! declaration carries a semantic type from the closed supported set.

use std::rc::Rc;

use crate::span::{Span, Spanned};
use crate::types::Ty;

/// Builtin slot identifiers, assigned by the resolver via `layout(builtin=...)`.
pub const INPUT_COLOR_BUILTIN: i32 = 10001;
pub const OUTPUT_COLOR_BUILTIN: i32 = 10002;
pub const TRANSFORMED_COORDS_BUILTIN: i32 = 10003;
pub const TEXTURE_SAMPLERS_BUILTIN: i32 = 10004;

/// Prefix of compiler-injected argument-struct settings (`pr_Args.<field>`).
pub const ARGS_SETTING_PREFIX: &str = "pr_Args.";

/// Modifier flags on a declaration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    pub uniform: bool,
    pub is_in: bool,
    pub is_out: bool,
}

/// Uniform precision tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Precision {
    #[default]
    Default,
    Low,
    Medium,
    High,
}

/// Cache-key contribution mode, from `layout(key)` / `layout(key=identity)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyMode {
    #[default]
    No,
    Key,
    Identity,
}

/// Layout descriptor on a declaration.
#[derive(Clone, Debug)]
pub struct Layout {
    /// Builtin slot identifier, or -1 for ordinary declarations.
    pub builtin: i32,
    pub key: KeyMode,
    /// Guard predicate from `layout(when=...)`: host-language boolean text.
    pub when: Option<String>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            builtin: -1,
            key: KeyMode::No,
            when: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Modifiers {
    pub flags: Flags,
    pub precision: Precision,
    pub layout: Layout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Storage {
    Global,
    Local,
}

/// A named, typed declaration. Owned by the AST, shared by reference sites.
#[derive(Clone, Debug)]
pub struct Variable {
    pub name: String,
    pub ty: Ty,
    pub modifiers: Modifiers,
    pub storage: Storage,
    pub span: Span,
}

impl Variable {
    /// A processor parameter: `in`-flagged with no builtin slot.
    pub fn is_parameter(&self) -> bool {
        self.modifiers.flags.is_in && self.modifiers.layout.builtin == -1
    }
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    LogicalAnd,
    LogicalXor,
    LogicalOr,
    Assign,
    Comma,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::BitAnd => "&",
            BinOp::BitXor => "^",
            BinOp::BitOr => "|",
            BinOp::LogicalAnd => "&&",
            BinOp::LogicalXor => "^^",
            BinOp::LogicalOr => "||",
            BinOp::Assign => "=",
            BinOp::Comma => ",",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrefixOp {
    Neg,
    Not,
    BitNot,
}

impl PrefixOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrefixOp::Neg => "-",
            PrefixOp::Not => "!",
            PrefixOp::BitNot => "~",
        }
    }
}

/// A called function. Builtins (`texture`, `colorSpaceTransform`, the
/// intrinsic math set) are marked by the type checker.
#[derive(Clone, Debug)]
pub struct FunctionRef {
    pub name: String,
    pub builtin: bool,
}

/// Expressions.
#[derive(Clone, Debug)]
pub enum Expr {
    IntLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    VarRef(Rc<Variable>),
    /// Compiler-injected capability/argument access, e.g. `pr_Args.inputColor`.
    Setting { name: String, ty: Ty },
    Binary {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Prefix {
        op: PrefixOp,
        operand: Box<Spanned<Expr>>,
    },
    Ternary {
        cond: Box<Spanned<Expr>>,
        if_true: Box<Spanned<Expr>>,
        if_false: Box<Spanned<Expr>>,
    },
    Index {
        base: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },
    /// Component selection / field access, e.g. `.rgb`.
    Swizzle {
        base: Box<Spanned<Expr>>,
        components: String,
    },
    Call {
        function: FunctionRef,
        args: Vec<Spanned<Expr>>,
    },
}

/// A single declared variable with its optional initializer.
#[derive(Clone, Debug)]
pub struct VarDeclaration {
    pub var: Rc<Variable>,
    pub init: Option<Spanned<Expr>>,
}

/// One `<type> a = ..., b = ...;` declaration group.
#[derive(Clone, Debug)]
pub struct VarDeclarations {
    pub base_ty: Ty,
    pub vars: Vec<VarDeclaration>,
}

#[derive(Clone, Debug)]
pub struct SwitchCase {
    /// `None` for the `default:` case.
    pub value: Option<Spanned<Expr>>,
    pub stmts: Vec<Spanned<Stmt>>,
}

/// Statements.
#[derive(Clone, Debug)]
pub enum Stmt {
    Block(Vec<Spanned<Stmt>>),
    VarDecls(VarDeclarations),
    Expr(Spanned<Expr>),
    If {
        /// Resolved at shader-compile time rather than per pixel.
        is_static: bool,
        cond: Spanned<Expr>,
        then_stmt: Box<Spanned<Stmt>>,
        else_stmt: Option<Box<Spanned<Stmt>>>,
    },
    Switch {
        is_static: bool,
        value: Spanned<Expr>,
        cases: Vec<SwitchCase>,
    },
    For {
        init: Option<Box<Spanned<Stmt>>>,
        cond: Option<Spanned<Expr>>,
        next: Option<Spanned<Expr>>,
        body: Box<Spanned<Stmt>>,
    },
    Return(Option<Spanned<Expr>>),
    Break,
    Continue,
    Discard,
}

#[derive(Clone, Debug)]
pub struct FunctionDefinition {
    pub name: String,
    pub return_ty: Ty,
    pub params: Vec<Rc<Variable>>,
    pub body: Vec<Spanned<Stmt>>,
    pub span: Span,
}

/// An author-supplied raw-text block bound to a named injection point.
#[derive(Clone, Debug)]
pub struct Section {
    pub name: String,
    pub argument: Option<String>,
    pub text: String,
    pub span: Span,
}

/// Top-level program elements, in declaration order.
#[derive(Clone, Debug)]
pub enum ProgramElement {
    VarDecls(VarDeclarations),
    Function(FunctionDefinition),
    Section(Section),
}

/// A type-checked fragment-processor program.
#[derive(Clone, Debug)]
pub struct Program {
    pub elements: Vec<ProgramElement>,
}
