//! Host-side identifier and type derivation.
//!
//! The generated processor class stores every parameter in a member field;
//! these utilities map a shading-language declaration to that field's name
//! and C++ type. Pure functions, shared by every synthesized method.

use crate::types::Ty;

/// Member-field name for a declaration: `colorXform` → `fColorXform`.
pub fn field_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("f{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "f".to_string(),
    }
}

/// Host-side C++ type used to store a parameter of the given semantic type.
pub fn field_type(ty: &Ty) -> &'static str {
    match ty {
        Ty::Float | Ty::Half => "float",
        Ty::Int => "int32_t",
        Ty::Bool => "bool",
        Ty::Float2 | Ty::Half2 => "SkPoint",
        Ty::Float4 | Ty::Half4 => "SkRect",
        Ty::Float4x4 | Ty::Half4x4 => "SkMatrix44",
        Ty::ColorSpaceXform => "sk_sp<GrColorSpaceXform>",
        Ty::Sampler2D => "TextureSampler",
        Ty::Void => panic!("void has no host field type"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_name_capitalizes_and_prefixes() {
        assert_eq!(field_name("color"), "fColor");
        assert_eq!(field_name("colorXform"), "fColorXform");
        assert_eq!(field_name("x"), "fX");
    }

    #[test]
    fn test_field_types() {
        assert_eq!(field_type(&Ty::Half), "float");
        assert_eq!(field_type(&Ty::Float4), "SkRect");
        assert_eq!(field_type(&Ty::ColorSpaceXform), "sk_sp<GrColorSpaceXform>");
        assert_eq!(field_type(&Ty::Sampler2D), "TextureSampler");
    }
}
