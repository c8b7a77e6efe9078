//! prism — backend of a small shading-language compiler.
//!
//! Lowers a type-checked fragment-processor program into the textual C++
//! source of the host graphics framework's processor class: shader setup,
//! per-draw uniform upload, cache-key contribution, equality, cloning, and
//! an optional test factory. The front end (lexer, parser, type checker)
//! and file I/O live elsewhere; this crate consumes a resolved AST and an
//! error sink and produces one output stream.

pub mod ast;
pub mod codegen;
pub mod diagnostic;
pub mod names;
pub mod section;
pub mod span;
pub mod types;

pub use codegen::processor::ProcessorEmitter;

use diagnostic::Diagnostic;

/// Generate the fragment-processor source for a type-checked program.
///
/// `name` is the base processor name; the emitted class is `Gr<name>`.
/// Returns the complete source text, or every diagnostic accumulated over
/// the single generation pass.
pub fn generate_processor(
    program: &ast::Program,
    name: &str,
) -> Result<String, Vec<Diagnostic>> {
    ProcessorEmitter::new(program, name).generate()
}
