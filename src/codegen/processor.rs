//! Fragment-processor class emitter.
//!
//! Lowers a type-checked program into the host framework's C++ source for a
//! fragment processor: an inner shader-setup class plus the outer processor's
//! method bodies. The shader body itself is emitted as a host format string;
//! values unknown until shader-compile time become placeholders whose
//! arguments are collected in [`ProcessorEmitter::format_args`] and appended
//! to the final `codeAppendf` call.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::ast::*;
use crate::diagnostic::{error_count, Diagnostic};
use crate::names::{field_name, field_type};
use crate::section::{
    SectionRegistry, CLONE_SECTION, COORD_TRANSFORM_SECTION, CPP_END_SECTION, CPP_SECTION,
    EMIT_CODE_SECTION, FIELDS_SECTION, SET_DATA_SECTION, TEST_CODE_SECTION,
};
use crate::span::{Span, Spanned};
use crate::types::{Ty, TyKind};

use super::glsl::{self, GlslPrint, Precedence};

/// Builtin rewritten into a conditional gamut transform of its first argument.
pub const COLOR_XFORM_BUILTIN_FN: &str = "colorSpaceTransform";
/// Builtin sampling a texture; the result is swizzled per the sampler config.
pub const TEXTURE_BUILTIN_FN: &str = "texture";

fn needs_uniform_var(var: &Variable) -> bool {
    var.modifiers.flags.uniform && var.ty != Ty::ColorSpaceXform
}

/// A private field of the generated class: global, no flags, no builtin slot.
fn is_private(var: &Variable) -> bool {
    !var.modifiers.flags.uniform
        && !var.modifiers.flags.is_in
        && var.storage == Storage::Global
        && var.modifiers.layout.builtin == -1
}

/// Shader-text default substituted when a guarded uniform is absent.
fn default_value(ty: Ty) -> String {
    if ty == Ty::ColorSpaceXform {
        return "float4x4(1.0)".to_string();
    }
    match ty.kind() {
        TyKind::Scalar => "0".to_string(),
        TyKind::Vector => format!("{}(0)", ty.name()),
        TyKind::Matrix => format!("{}(1)", ty.name()),
        _ => panic!("unsupported default value type: {}", ty.name()),
    }
}

/// Emits one processor class per program. Session state is reset by
/// constructing a fresh emitter; two fresh emitters over the same program
/// produce byte-identical output.
pub struct ProcessorEmitter<'a> {
    program: &'a Program,
    /// Base class name; the generated processor is `Gr<name>`.
    name: String,
    full_name: String,
    sections: SectionRegistry<'a>,
    diagnostics: Vec<Diagnostic>,
    /// Host expressions matching the placeholders written into the captured
    /// shader body, in placeholder order.
    format_args: Vec<String>,
    /// Statements that must run before the main shader append (one-time
    /// coordinate caching).
    extra_emit_code: String,
    /// Coordinate-set indices already materialized this pass.
    written_coords: BTreeSet<i64>,
    /// Prologue prepended to the captured main body (synthesized temporaries
    /// that must be visible to the whole function).
    function_header: String,
    tmp_count: u32,
    need_color_xform_helper: bool,
}

impl<'a> ProcessorEmitter<'a> {
    pub fn new(program: &'a Program, name: &str) -> Self {
        let mut diagnostics = Vec::new();
        let sections = SectionRegistry::build(program, &mut diagnostics);
        Self {
            program,
            name: name.to_string(),
            full_name: format!("Gr{}", name),
            sections,
            diagnostics,
            format_args: Vec::new(),
            extra_emit_code: String::new(),
            written_coords: BTreeSet::new(),
            function_header: String::new(),
            tmp_count: 0,
            need_color_xform_helper: false,
        }
    }

    // ─── Runtime-Value Lowering ──────────────────────────────────────

    /// Lower a value only known at shader-compile time: a placeholder in the
    /// shader text plus the host expression(s) that fill it.
    fn write_runtime_value(&mut self, out: &mut String, ty: Ty, host_expr: &str) {
        if ty.is_float() {
            out.push_str("%f");
            self.format_args.push(host_expr.to_string());
            return;
        }
        match ty {
            Ty::Int => {
                out.push_str("%d");
                self.format_args.push(host_expr.to_string());
            }
            Ty::Bool => {
                out.push_str("%s");
                self.format_args
                    .push(format!("({} ? \"true\" : \"false\")", host_expr));
            }
            Ty::Float2 | Ty::Half2 => {
                out.push_str(ty.name());
                out.push_str("(%f, %f)");
                self.format_args.push(format!("{}.fX", host_expr));
                self.format_args.push(format!("{}.fY", host_expr));
            }
            _ => panic!("unsupported runtime value type: {}", ty.name()),
        }
    }

    /// Host expression for the sampler slot bound to a declaration.
    fn sampler_handle(&self, var: &Rc<Variable>) -> String {
        let mut sampler_count = 0;
        for param in self.sections.parameters() {
            if Rc::ptr_eq(param, var) {
                return format!("args.fTexSamplers[{}]", sampler_count);
            }
            if param.ty.kind() == TyKind::Sampler {
                sampler_count += 1;
            }
        }
        panic!("sampler not found in parameters: {}", var.name);
    }

    // ─── Specialized Expression Printing ─────────────────────────────

    /// `%` must be doubled: the shader body is itself a host format string.
    fn write_modulo(
        &mut self,
        out: &mut String,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        parent: Precedence,
    ) {
        let precedence = glsl::binary_precedence(BinOp::Mod);
        let needs_parens = precedence >= parent;
        if needs_parens {
            out.push('(');
        }
        self.write_expression(out, lhs, precedence);
        out.push_str(" %% ");
        self.write_expression(out, rhs, precedence);
        if needs_parens {
            out.push(')');
        }
    }

    fn write_index_expression(
        &mut self,
        out: &mut String,
        base: &Spanned<Expr>,
        index: &Spanned<Expr>,
    ) {
        if let Expr::VarRef(var) = &base.node {
            let builtin = var.modifiers.layout.builtin;
            if builtin == TRANSFORMED_COORDS_BUILTIN {
                let value = match index.node {
                    Expr::IntLiteral(v) => v,
                    _ => {
                        self.diagnostics.push(Diagnostic::error(
                            "index into pr_TransformedCoords2D must be an integer literal"
                                .to_string(),
                            index.span,
                        ));
                        return;
                    }
                };
                out.push_str("%s");
                let cache_name = format!("pr_TransformedCoords2D_{}", value);
                self.format_args.push(format!("{}.c_str()", cache_name));
                if self.written_coords.insert(value) {
                    self.extra_emit_code.push_str(&format!(
                        "        SkString {} = fragBuilder->ensureCoords2D(args.fTransformedCoords[{}]);\n",
                        cache_name, value
                    ));
                }
                return;
            } else if builtin == TEXTURE_SAMPLERS_BUILTIN {
                let value = match index.node {
                    Expr::IntLiteral(v) => v,
                    _ => {
                        self.diagnostics.push(Diagnostic::error(
                            "index into pr_TextureSamplers must be an integer literal".to_string(),
                            index.span,
                        ));
                        return;
                    }
                };
                out.push_str("%s");
                self.format_args.push(format!(
                    "fragBuilder->getProgramBuilder()->samplerVariable(args.fTexSamplers[{}]).c_str()",
                    value
                ));
                return;
            }
        }
        glsl::write_index(self, out, base, index);
    }

    fn write_variable_reference(&mut self, out: &mut String, var: &Rc<Variable>) {
        match var.modifiers.layout.builtin {
            INPUT_COLOR_BUILTIN => {
                out.push_str("%s");
                self.format_args
                    .push("args.fInputColor ? args.fInputColor : \"half4(1)\"".to_string());
            }
            OUTPUT_COLOR_BUILTIN => {
                out.push_str("%s");
                self.format_args.push("args.fOutputColor".to_string());
            }
            _ => {
                if var.ty.kind() == TyKind::Sampler {
                    out.push_str("%s");
                    let handle = self.sampler_handle(var);
                    self.format_args.push(format!(
                        "fragBuilder->getProgramBuilder()->samplerVariable({}).c_str()",
                        handle
                    ));
                    return;
                }
                if var.modifiers.flags.uniform {
                    out.push_str("%s");
                    let accessor = if var.ty == Ty::ColorSpaceXform {
                        assert!(
                            self.need_color_xform_helper,
                            "color-space helper referenced before it was required"
                        );
                        format!(
                            "fColorSpaceHelper.isValid() ? args.fUniformHandler->getUniformCStr(fColorSpaceHelper.gamutXformUniform()) : \"{}\"",
                            default_value(var.ty)
                        )
                    } else {
                        format!(
                            "args.fUniformHandler->getUniformCStr({}Var)",
                            field_name(&var.name)
                        )
                    };
                    let code = if var.modifiers.layout.when.is_some() {
                        format!(
                            "{}Var.isValid() ? {} : \"{}\"",
                            field_name(&var.name),
                            accessor,
                            default_value(var.ty)
                        )
                    } else {
                        accessor
                    };
                    self.format_args.push(code);
                } else if var.is_parameter() {
                    self.write_runtime_value(out, var.ty, &format!("_outer.{}()", var.name));
                } else {
                    out.push_str(&var.name);
                }
            }
        }
    }

    /// Compiler-injected argument access: `pr_Args.<field>` lowers to the
    /// matching member field's runtime value; anything else prints verbatim.
    fn write_setting(&mut self, out: &mut String, name: &str, ty: Ty) {
        if let Some(suffix) = name.strip_prefix(ARGS_SETTING_PREFIX) {
            let host_expr = field_name(suffix);
            self.write_runtime_value(out, ty, &host_expr);
        } else {
            out.push_str(name);
        }
    }

    fn write_function_call(
        &mut self,
        out: &mut String,
        function: &FunctionRef,
        args: &[Spanned<Expr>],
    ) {
        if function.builtin && function.name == COLOR_XFORM_BUILTIN_FN {
            self.tmp_count += 1;
            let tmp = format!("_tmpVar{}", self.tmp_count);
            // Declared in the function prologue: the temporary must be
            // visible to the whole generated body, not just this statement.
            self.function_header
                .push_str(&format!("half4 {};", tmp));
            assert!(
                args.len() == 2,
                "{} takes exactly two arguments",
                COLOR_XFORM_BUILTIN_FN
            );
            out.push_str("%s");
            self.format_args.push(format!(
                "fColorSpaceHelper.isValid() ? \"({} = \" : \"\"",
                tmp
            ));
            self.write_expression(out, &args[0], Precedence::TopLevel);
            assert!(
                matches!(args[1].node, Expr::VarRef(_)),
                "{} transform argument must be a variable reference",
                COLOR_XFORM_BUILTIN_FN
            );
            let xform =
                "args.fUniformHandler->getUniformCStr(fColorSpaceHelper.gamutXformUniform())";
            out.push_str("%s");
            self.format_args.push(format!(
                "fColorSpaceHelper.isValid() ? SkStringPrintf(\", half4(clamp((%s * half4({0}.rgb, 1.0)).rgb, 0.0, {0}.a), {0}.a))\", {1}).c_str() : \"\"",
                tmp, xform
            ));
            return;
        }
        glsl::write_call(self, out, function, args);
        if function.builtin && function.name == TEXTURE_BUILTIN_FN {
            out.push_str(".%s");
            assert!(!args.is_empty(), "texture() takes a sampler argument");
            let sampler = match &args[0].node {
                Expr::VarRef(var) => self.sampler_handle(var),
                _ => panic!("texture() first argument must be a sampler reference"),
            };
            self.format_args.push(format!(
                "fragBuilder->getProgramBuilder()->samplerSwizzle({}).c_str()",
                sampler
            ));
        }
    }

    /// `main` is emitted body-only into a detached buffer so prologue
    /// statements discovered during generation can be prepended.
    fn write_main_function(&mut self, out: &mut String, f: &FunctionDefinition) {
        self.function_header.clear();
        let mut buffer = String::new();
        for stmt in &f.body {
            self.write_statement(&mut buffer, stmt);
            buffer.push_str(self.line_ending());
        }
        out.push_str(&self.function_header);
        out.push_str(&buffer);
    }

    // ─── Uniform/Parameter Management ────────────────────────────────

    fn add_uniform(&mut self, out: &mut String, var: &Variable) {
        if !needs_uniform_var(var) {
            return;
        }
        let precision = match var.modifiers.precision {
            Precision::High => "kHigh_GrSLPrecision",
            Precision::Medium => "kMedium_GrSLPrecision",
            Precision::Low => "kLow_GrSLPrecision",
            Precision::Default => "kDefault_GrSLPrecision",
        };
        let ty_token = match var.ty {
            Ty::Float => "kFloat_GrSLType",
            Ty::Half => "kHalf_GrSLType",
            Ty::Float2 => "kFloat2_GrSLType",
            Ty::Half2 => "kHalf2_GrSLType",
            Ty::Float4 => "kFloat4_GrSLType",
            Ty::Half4 => "kHalf4_GrSLType",
            Ty::Float4x4 => "kFloat4x4_GrSLType",
            Ty::Half4x4 => "kHalf4x4_GrSLType",
            _ => panic!(
                "unsupported uniform type: {} {}",
                var.ty.name(),
                var.name
            ),
        };
        if let Some(when) = &var.modifiers.layout.when {
            out.push_str(&format!("        if ({}) {{\n    ", when));
        }
        out.push_str(&format!(
            "        {}Var = args.fUniformHandler->addUniform(kFragment_GrShaderFlag, {}, {}, \"{}\");\n",
            field_name(&var.name),
            ty_token,
            precision,
            var.name
        ));
        if var.modifiers.layout.when.is_some() {
            out.push_str("        }\n");
        }
    }

    fn write_private_vars(&mut self, out: &mut String) {
        for element in &self.program.elements {
            if let ProgramElement::VarDecls(decls) = element {
                for decl in &decls.vars {
                    if is_private(&decl.var) {
                        out.push_str(&format!(
                            "{} {};\n",
                            field_type(&decl.var.ty),
                            decl.var.name
                        ));
                    }
                }
            }
        }
    }

    fn write_private_var_values(&mut self, out: &mut String) {
        for element in &self.program.elements {
            if let ProgramElement::VarDecls(decls) = element {
                for decl in &decls.vars {
                    if is_private(&decl.var) {
                        if let Some(init) = &decl.init {
                            out.push_str(&format!(
                                "{} = {};\n",
                                decl.var.name,
                                glsl::description(init)
                            ));
                        }
                    }
                }
            }
        }
    }

    // ─── Boilerplate Synthesis ───────────────────────────────────────

    /// Splice a named section's raw text. Returns whether one existed.
    fn write_section(&mut self, out: &mut String, name: &str, prefix: &str) -> bool {
        match self.sections.get(name) {
            Some(s) => {
                out.push_str(prefix);
                out.push_str(&s.text);
                true
            }
            None => false,
        }
    }

    fn write_emit_code(&mut self, out: &mut String, uniforms: &[Rc<Variable>]) {
        out.push_str(
            "    void emitCode(EmitArgs& args) override {\n        \
             GrGLSLFPFragmentBuilder* fragBuilder = args.fFragBuilder;\n",
        );
        out.push_str(&format!(
            "        const {0}& _outer = args.fFp.cast<{0}>();\n        (void) _outer;\n",
            self.full_name
        ));
        self.write_private_var_values(out);
        for u in uniforms {
            self.add_uniform(out, u);
            if u.ty == Ty::ColorSpaceXform {
                if self.need_color_xform_helper {
                    // Report and keep the first-seen helper wiring.
                    self.diagnostics.push(Diagnostic::error(
                        "only a single ColorSpaceXform is supported".to_string(),
                        u.span,
                    ));
                    continue;
                }
                self.need_color_xform_helper = true;
                out.push_str(&format!(
                    "        fColorSpaceHelper.emitCode(args.fUniformHandler, _outer.{}().get());\n",
                    u.name
                ));
            }
        }
        self.write_section(out, EMIT_CODE_SECTION, "");
        // Capture the shader-body drive into a detached buffer; placeholder
        // arguments and extra setup discovered during the capture are woven
        // around the buffered text afterwards.
        let program = self.program;
        let mut main_buffer = String::new();
        glsl::write_program(self, &mut main_buffer, program);
        out.push_str(&self.extra_emit_code);
        out.push_str(&format!(
            "        fragBuilder->codeAppendf(\"{}\"",
            main_buffer
        ));
        for arg in &self.format_args {
            out.push_str(&format!(", {}", arg));
        }
        out.push_str(");\n    }\n");
    }

    fn write_set_data(&mut self, out: &mut String, uniforms: &[Rc<Variable>]) {
        let section = self.sections.get(SET_DATA_SECTION);
        let pdman = section
            .and_then(|s| s.argument.as_deref())
            .unwrap_or("pdman");
        out.push_str(&format!(
            "    void onSetData(const GrGLSLProgramDataManager& {}, const GrFragmentProcessor& _proc) override {{\n",
            pdman
        ));
        let mut wrote_processor = false;
        for u in uniforms {
            if !u.modifiers.flags.is_in {
                continue;
            }
            if !wrote_processor {
                out.push_str(&format!(
                    "        const {0}& _outer = _proc.cast<{0}>();\n",
                    self.full_name
                ));
                wrote_processor = true;
                out.push_str("        {\n");
            }
            let name = &u.name;
            match u.ty {
                Ty::Float4 | Ty::Half4 => out.push_str(&format!(
                    "        const SkRect {0}Value = _outer.{0}();\n        {1}.set4fv({2}Var, 1, (float*) &{0}Value);\n",
                    name,
                    pdman,
                    field_name(name)
                )),
                Ty::Float4x4 | Ty::Half4x4 => out.push_str(&format!(
                    "        float {0}Value[16];\n        _outer.{0}().asColMajorf({0}Value);\n        {1}.setMatrix4f({2}Var, {0}Value);\n",
                    name,
                    pdman,
                    field_name(name)
                )),
                Ty::ColorSpaceXform => {
                    assert!(
                        self.need_color_xform_helper,
                        "color-space helper upload without the helper being required"
                    );
                    out.push_str(&format!(
                        "        if (fColorSpaceHelper.isValid()) {{\n            fColorSpaceHelper.setData({}, _outer.{}().get());\n        }}\n",
                        pdman, name
                    ));
                }
                _ => out.push_str(&format!(
                    "        {}.set1f({}Var, _outer.{}());\n",
                    pdman,
                    field_name(name),
                    name
                )),
            }
        }
        if wrote_processor {
            out.push_str("        }\n");
        }
        if section.is_some() {
            // Alias every handle and parameter into a local so the section
            // text can refer to them by their source names.
            for element in &self.program.elements {
                if let ProgramElement::VarDecls(decls) = element {
                    for decl in &decls.vars {
                        let var = &decl.var;
                        let name = &var.name;
                        if needs_uniform_var(var) {
                            out.push_str(&format!(
                                "        UniformHandle& {0} = {1}Var;\n        (void) {0};\n",
                                name,
                                field_name(name)
                            ));
                        } else if var.is_parameter() {
                            if !wrote_processor {
                                out.push_str(&format!(
                                    "        const {0}& _outer = _proc.cast<{0}>();\n",
                                    self.full_name
                                ));
                                wrote_processor = true;
                            }
                            out.push_str(&format!(
                                "        auto {0} = _outer.{0}();\n        (void) {0};\n",
                                name
                            ));
                        }
                    }
                }
            }
            self.write_section(out, SET_DATA_SECTION, "");
        }
        out.push_str("    }\n");
    }

    fn write_get_key(&mut self, out: &mut String) {
        out.push_str(&format!(
            "void {}::onGetGLSLProcessorKey(const GrShaderCaps& caps, GrProcessorKeyBuilder* b) const {{\n",
            self.full_name
        ));
        let params: Vec<Rc<Variable>> = self.sections.parameters().to_vec();
        for param in &params {
            let name = field_name(&param.name);
            if param.ty == Ty::ColorSpaceXform {
                out.push_str(&format!(
                    "    b->add32(GrColorSpaceXform::XformKey({}.get()));\n",
                    name
                ));
                continue;
            }
            if param.modifiers.layout.key != KeyMode::No && param.modifiers.flags.uniform {
                self.diagnostics.push(Diagnostic::error(
                    "layout(key) may not be specified on uniforms".to_string(),
                    param.span,
                ));
            }
            match param.modifiers.layout.key {
                KeyMode::Key => match param.ty {
                    Ty::Float4x4 | Ty::Half4x4 => {
                        panic!("no automatic key handling for matrix types")
                    }
                    Ty::Float2 | Ty::Half2 => {
                        out.push_str(&format!("    b->add32({}.fX);\n", name));
                        out.push_str(&format!("    b->add32({}.fY);\n", name));
                    }
                    Ty::Float4 | Ty::Half4 => {
                        out.push_str(&format!("    b->add32({}.x());\n", name));
                        out.push_str(&format!("    b->add32({}.y());\n", name));
                        out.push_str(&format!("    b->add32({}.width());\n", name));
                        out.push_str(&format!("    b->add32({}.height());\n", name));
                    }
                    _ => out.push_str(&format!("    b->add32({});\n", name)),
                },
                KeyMode::Identity => {
                    if param.ty.kind() != TyKind::Matrix {
                        self.diagnostics.push(Diagnostic::error(
                            "layout(key=identity) requires matrix type".to_string(),
                            param.span,
                        ));
                    }
                    out.push_str(&format!(
                        "    b->add32({}.isIdentity() ? 1 : 0);\n",
                        name
                    ));
                }
                KeyMode::No => {}
            }
        }
        out.push_str("}\n");
    }

    fn write_clone(&mut self, out: &mut String) {
        if self.write_section(out, CLONE_SECTION, "") {
            return;
        }
        if self.sections.get(FIELDS_SECTION).is_some() {
            self.diagnostics.push(Diagnostic::error(
                "fragment processors with custom @fields must also have a custom @clone"
                    .to_string(),
                Span::dummy(),
            ));
        }
        out.push_str(&format!(
            "{0}::{0}(const {0}& src)\n: INHERITED(k{0}_ClassID, src.optimizationFlags())",
            self.full_name
        ));
        for param in self.sections.parameters() {
            let fname = field_name(&param.name);
            out.push_str(&format!("\n, {0}(src.{0})", fname));
        }
        for s in self.sections.get_all(COORD_TRANSFORM_SECTION) {
            let fname = field_name(s.argument.as_deref().unwrap_or(""));
            out.push_str(&format!(
                "\n, {0}CoordTransform(src.{0}CoordTransform)",
                fname
            ));
        }
        out.push_str(" {\n");
        for param in self.sections.parameters() {
            if param.ty.kind() == TyKind::Sampler {
                out.push_str(&format!(
                    "    this->addTextureSampler(&{});\n",
                    field_name(&param.name)
                ));
            }
        }
        for s in self.sections.get_all(COORD_TRANSFORM_SECTION) {
            let fname = field_name(s.argument.as_deref().unwrap_or(""));
            out.push_str(&format!(
                "    this->addCoordTransform(&{}CoordTransform);\n",
                fname
            ));
        }
        out.push_str("}\n");
        out.push_str(&format!(
            "std::unique_ptr<GrFragmentProcessor> {0}::clone() const {{\n    return std::unique_ptr<GrFragmentProcessor>(new {0}(*this));\n}}\n",
            self.full_name
        ));
    }

    fn write_test(&mut self, out: &mut String) {
        if let Some(test) = self.sections.get(TEST_CODE_SECTION) {
            out.push_str(&format!(
                "GR_DEFINE_FRAGMENT_PROCESSOR_TEST({0});\n#if GR_TEST_UTILS\nstd::unique_ptr<GrFragmentProcessor> {0}::TestCreate(GrProcessorTestData* {1}) {{\n",
                self.full_name,
                test.argument.as_deref().unwrap_or("d")
            ));
            self.write_section(out, TEST_CODE_SECTION, "");
            out.push_str("}\n#endif\n");
        }
    }

    // ─── Orchestration ───────────────────────────────────────────────

    /// Generate the complete processor source. `Ok` only when the whole pass
    /// accumulated zero errors; reported errors never abort mid-pass so one
    /// run surfaces all of them.
    pub fn generate(mut self) -> Result<String, Vec<Diagnostic>> {
        let mut uniforms: Vec<Rc<Variable>> = Vec::new();
        for element in &self.program.elements {
            if let ProgramElement::VarDecls(decls) = element {
                for decl in &decls.vars {
                    if decl.var.modifiers.flags.uniform && decl.var.ty.kind() != TyKind::Sampler {
                        uniforms.push(decl.var.clone());
                    }
                }
            }
        }

        let mut out = String::new();
        out.push_str(&format!(
            "/*\n\
             **************************************************************************************************\n\
             *** This file was autogenerated from {}.fp; do not modify.\n\
             **************************************************************************************************\n\
             */\n",
            self.full_name
        ));
        out.push_str(&format!(
            "#include \"{}.h\"\n#if SK_SUPPORT_GPU\n",
            self.full_name
        ));
        self.write_section(&mut out, CPP_SECTION, "");
        out.push_str(&format!(
            "#include \"glsl/GrGLSLColorSpaceXformHelper.h\"\n\
             #include \"glsl/GrGLSLFragmentProcessor.h\"\n\
             #include \"glsl/GrGLSLFragmentShaderBuilder.h\"\n\
             #include \"glsl/GrGLSLProgramBuilder.h\"\n\
             #include \"PrismCpp.h\"\n\
             #include \"PrismUtil.h\"\n\
             class GrGLSL{0} : public GrGLSLFragmentProcessor {{\npublic:\n    GrGLSL{0}() {{}}\n",
            self.name
        ));
        self.write_emit_code(&mut out, &uniforms);
        out.push_str("private:\n");
        self.write_set_data(&mut out, &uniforms);
        self.write_private_vars(&mut out);
        for u in &uniforms {
            if needs_uniform_var(u) && !u.modifiers.flags.is_in {
                out.push_str(&format!("    UniformHandle {}Var;\n", field_name(&u.name)));
            }
        }
        for param in self.sections.parameters() {
            if needs_uniform_var(param) {
                out.push_str(&format!(
                    "    UniformHandle {}Var;\n",
                    field_name(&param.name)
                ));
            }
        }
        if self.need_color_xform_helper {
            out.push_str("    GrGLSLColorSpaceXformHelper fColorSpaceHelper;\n");
        }
        out.push_str(&format!(
            "}};\nGrGLSLFragmentProcessor* {0}::onCreateGLSLInstance() const {{\n    return new GrGLSL{1}();\n}}\n",
            self.full_name, self.name
        ));
        self.write_get_key(&mut out);
        out.push_str(&format!(
            "bool {0}::onIsEqual(const GrFragmentProcessor& other) const {{\n    const {0}& that = other.cast<{0}>();\n    (void) that;\n",
            self.full_name
        ));
        for param in self.sections.parameters() {
            let fname = field_name(&param.name);
            out.push_str(&format!("    if ({0} != that.{0}) return false;\n", fname));
        }
        out.push_str("    return true;\n}\n");
        self.write_clone(&mut out);
        self.write_test(&mut out);
        self.write_section(&mut out, CPP_END_SECTION, "");
        out.push_str("#endif\n");

        if error_count(&self.diagnostics) == 0 {
            Ok(out)
        } else {
            Err(self.diagnostics)
        }
    }
}

impl<'a> GlslPrint for ProcessorEmitter<'a> {
    fn write_expression(&mut self, out: &mut String, expr: &Spanned<Expr>, parent: Precedence) {
        match &expr.node {
            Expr::Binary {
                op: BinOp::Mod,
                lhs,
                rhs,
            } => self.write_modulo(out, lhs, rhs, parent),
            Expr::Index { base, index } => self.write_index_expression(out, base, index),
            // Narrowed on purpose: matches the shading language's 32-bit
            // integer literals.
            Expr::IntLiteral(v) => out.push_str(&(*v as i32).to_string()),
            Expr::VarRef(var) => self.write_variable_reference(out, var),
            Expr::Setting { name, ty } => self.write_setting(out, name, *ty),
            Expr::Call { function, args } => self.write_function_call(out, function, args),
            _ => glsl::write_expression(self, out, expr, parent),
        }
    }

    fn write_statement(&mut self, out: &mut String, stmt: &Spanned<Stmt>) {
        // Leading marker: the branch resolves at shader-compile time.
        match &stmt.node {
            Stmt::If { is_static: true, .. } | Stmt::Switch { is_static: true, .. } => {
                out.push('@');
            }
            _ => {}
        }
        glsl::write_statement(self, out, stmt);
    }

    fn write_var_initializer(&mut self, out: &mut String, var: &Variable, value: &Spanned<Expr>) {
        if is_private(var) {
            // The initializer reads the generated class's private field at
            // shader-build time.
            self.write_runtime_value(out, var.ty, &var.name);
        } else {
            self.write_expression(out, value, Precedence::TopLevel);
        }
    }

    fn write_program_element(&mut self, out: &mut String, element: &ProgramElement) {
        match element {
            // Sections are injected at fixed points, never walked.
            ProgramElement::Section(_) => return,
            // Parameters, uniforms and builtins are declared as class fields,
            // not in the shader body.
            ProgramElement::VarDecls(decls) => match decls.vars.first() {
                None => return,
                Some(first) => {
                    let var = &first.var;
                    if var.modifiers.flags.is_in
                        || var.modifiers.flags.uniform
                        || var.modifiers.layout.builtin != -1
                    {
                        return;
                    }
                }
            },
            ProgramElement::Function(f) => {
                if f.name == "main" {
                    self.write_main_function(out, f);
                    return;
                }
            }
        }
        glsl::write_program_element(self, out, element);
    }

    fn line_ending(&self) -> &'static str {
        // The captured body lands inside a C++ string literal.
        "\\n"
    }
}
