//! Registry of author-supplied sections and processor parameters.
//!
//! Sections are verbatim raw-text blocks tagged to named injection points in
//! the generated class. The registry is built once per program and read-only
//! during generation.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::ast::{Program, ProgramElement, Section, Variable};
use crate::diagnostic::Diagnostic;

pub const CLASS_SECTION: &str = "class";
pub const CLONE_SECTION: &str = "clone";
pub const CONSTRUCTOR_SECTION: &str = "constructor";
pub const CONSTRUCTOR_PARAMS_SECTION: &str = "constructorParams";
pub const COORD_TRANSFORM_SECTION: &str = "coordTransform";
pub const CPP_SECTION: &str = "cpp";
pub const CPP_END_SECTION: &str = "cppEnd";
pub const EMIT_CODE_SECTION: &str = "emitCode";
pub const FIELDS_SECTION: &str = "fields";
pub const HEADER_SECTION: &str = "header";
pub const HEADER_END_SECTION: &str = "headerEnd";
pub const INITIALIZERS_SECTION: &str = "initializers";
pub const MAKE_SECTION: &str = "make";
pub const OPTIMIZATION_FLAGS_SECTION: &str = "optimizationFlags";
pub const SAMPLER_PARAMS_SECTION: &str = "samplerParams";
pub const SET_DATA_SECTION: &str = "setData";
pub const TEST_CODE_SECTION: &str = "test";

const SUPPORTED_SECTIONS: &[&str] = &[
    CLASS_SECTION,
    CLONE_SECTION,
    CONSTRUCTOR_SECTION,
    CONSTRUCTOR_PARAMS_SECTION,
    COORD_TRANSFORM_SECTION,
    CPP_SECTION,
    CPP_END_SECTION,
    EMIT_CODE_SECTION,
    FIELDS_SECTION,
    HEADER_SECTION,
    HEADER_END_SECTION,
    INITIALIZERS_SECTION,
    MAKE_SECTION,
    OPTIMIZATION_FLAGS_SECTION,
    SAMPLER_PARAMS_SECTION,
    SET_DATA_SECTION,
    TEST_CODE_SECTION,
];

/// Sections that may appear more than once in a program.
fn permits_duplicates(name: &str) -> bool {
    name == COORD_TRANSFORM_SECTION || name == SAMPLER_PARAMS_SECTION
}

/// Named raw-text lookups plus the program's parameter list.
pub struct SectionRegistry<'a> {
    sections: BTreeMap<&'a str, Vec<&'a Section>>,
    parameters: Vec<Rc<Variable>>,
}

impl<'a> SectionRegistry<'a> {
    /// Collect sections and parameters from a program, reporting unsupported
    /// or duplicated section names through the diagnostic sink.
    pub fn build(program: &'a Program, diagnostics: &mut Vec<Diagnostic>) -> Self {
        let mut sections: BTreeMap<&'a str, Vec<&'a Section>> = BTreeMap::new();
        let mut parameters = Vec::new();
        for element in &program.elements {
            match element {
                ProgramElement::Section(s) => {
                    if !SUPPORTED_SECTIONS.contains(&s.name.as_str()) {
                        diagnostics.push(Diagnostic::error(
                            format!("unsupported section @{}", s.name),
                            s.span,
                        ));
                        continue;
                    }
                    let entries = sections.entry(s.name.as_str()).or_default();
                    if !entries.is_empty() && !permits_duplicates(&s.name) {
                        diagnostics.push(Diagnostic::error(
                            format!("duplicate section @{}", s.name),
                            s.span,
                        ));
                        continue;
                    }
                    entries.push(s);
                }
                ProgramElement::VarDecls(decls) => {
                    for decl in &decls.vars {
                        if decl.var.is_parameter() {
                            parameters.push(decl.var.clone());
                        }
                    }
                }
                ProgramElement::Function(_) => {}
            }
        }
        Self {
            sections,
            parameters,
        }
    }

    /// First section with the given name, if any.
    pub fn get(&self, name: &str) -> Option<&'a Section> {
        self.sections.get(name).and_then(|v| v.first().copied())
    }

    /// All sections with the given name, in declaration order.
    pub fn get_all(&self, name: &str) -> &[&'a Section] {
        self.sections.get(name).map_or(&[], |v| v.as_slice())
    }

    /// Processor parameters (`in`-flagged, non-builtin), in declaration order.
    pub fn parameters(&self) -> &[Rc<Variable>] {
        &self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::diagnostic::error_count;
    use crate::span::Span;
    use crate::types::Ty;

    fn section(name: &str, text: &str) -> ProgramElement {
        ProgramElement::Section(Section {
            name: name.to_string(),
            argument: None,
            text: text.to_string(),
            span: Span::dummy(),
        })
    }

    fn param(name: &str, ty: Ty) -> ProgramElement {
        let var = Rc::new(Variable {
            name: name.to_string(),
            ty,
            modifiers: Modifiers {
                flags: Flags {
                    is_in: true,
                    ..Flags::default()
                },
                ..Modifiers::default()
            },
            storage: Storage::Global,
            span: Span::dummy(),
        });
        ProgramElement::VarDecls(VarDeclarations {
            base_ty: ty,
            vars: vec![VarDeclaration { var, init: None }],
        })
    }

    #[test]
    fn test_first_and_all_lookups() {
        let program = Program {
            elements: vec![
                section(COORD_TRANSFORM_SECTION, "first"),
                section(COORD_TRANSFORM_SECTION, "second"),
                section(CPP_SECTION, "includes"),
            ],
        };
        let mut diags = Vec::new();
        let registry = SectionRegistry::build(&program, &mut diags);
        assert!(diags.is_empty());
        assert_eq!(registry.get(CPP_SECTION).unwrap().text, "includes");
        let all = registry.get_all(COORD_TRANSFORM_SECTION);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].text, "first");
        assert_eq!(all[1].text, "second");
        assert!(registry.get(TEST_CODE_SECTION).is_none());
        assert!(registry.get_all(TEST_CODE_SECTION).is_empty());
    }

    #[test]
    fn test_unsupported_section_reported() {
        let program = Program {
            elements: vec![section("emitKode", "typo")],
        };
        let mut diags = Vec::new();
        let registry = SectionRegistry::build(&program, &mut diags);
        assert_eq!(error_count(&diags), 1);
        assert!(diags[0].message.contains("unsupported section @emitKode"));
        assert!(registry.get("emitKode").is_none());
    }

    #[test]
    fn test_duplicate_non_repeatable_section_reported() {
        let program = Program {
            elements: vec![section(CPP_SECTION, "a"), section(CPP_SECTION, "b")],
        };
        let mut diags = Vec::new();
        let registry = SectionRegistry::build(&program, &mut diags);
        assert_eq!(error_count(&diags), 1);
        // First-seen section stays in effect.
        assert_eq!(registry.get(CPP_SECTION).unwrap().text, "a");
    }

    #[test]
    fn test_parameters_in_declaration_order() {
        let program = Program {
            elements: vec![
                param("color", Ty::Half4),
                param("image", Ty::Sampler2D),
                param("scale", Ty::Float),
            ],
        };
        let mut diags = Vec::new();
        let registry = SectionRegistry::build(&program, &mut diags);
        let names: Vec<&str> = registry
            .parameters()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["color", "image", "scale"]);
    }
}
