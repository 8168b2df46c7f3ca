use inkwell::context::Context;
use inkwell::types::BasicTypeEnum;

/// Whether `name` is a legal type name in this position. `void` is only
/// legal as a function's declared return type.
pub fn is_valid_type(name: &str, is_function_return: bool) -> bool {
    matches!(name, "int" | "double") || (is_function_return && name == "void")
}

/// Maps a source type name to its back-end representation. `void` has no
/// `BasicTypeEnum` — it's handled separately wherever function types are built.
pub fn type_of<'ctx>(context: &'ctx Context, name: &str) -> Option<BasicTypeEnum<'ctx>> {
    match name {
        "int" => Some(context.i64_type().into()),
        "double" => Some(context.f64_type().into()),
        _ => None,
    }
}
