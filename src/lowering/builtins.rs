use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::BasicTypeEnum;
use inkwell::values::FunctionValue;
use inkwell::AddressSpace;

/// Declares the foreign `printf` sink and defines the two concrete `echo`
/// variants lowering dispatches to. Format strings are materialized once as
/// module-level constants, not re-emitted per call site.
pub(super) fn install<'ctx>(context: &'ctx Context, module: &Module<'ctx>) {
    let builder = context.create_builder();

    let i32_type = context.i32_type();
    let i8_ptr_type = context.ptr_type(AddressSpace::default());
    let printf_type = i32_type.fn_type(&[i8_ptr_type.into()], true);
    let printf = module.add_function("printf", printf_type, Some(Linkage::External));

    install_echo_variant(context, module, &builder, printf, "echoint", "%lld\n", context.i64_type().into());
    install_echo_variant(
        context,
        module,
        &builder,
        printf,
        "echodouble",
        "%lf\n",
        context.f64_type().into(),
    );
}

fn install_echo_variant<'ctx>(
    context: &'ctx Context,
    module: &Module<'ctx>,
    builder: &inkwell::builder::Builder<'ctx>,
    printf: FunctionValue<'ctx>,
    name: &str,
    format: &str,
    arg_type: BasicTypeEnum<'ctx>,
) {
    let void_type = context.void_type();
    let fn_type = void_type.fn_type(&[arg_type.into()], false);
    let function = module.add_function(name, fn_type, Some(Linkage::Internal));
    let entry = context.append_basic_block(function, "entry");
    builder.position_at_end(entry);

    let format_global = builder
        .build_global_string_ptr(format, &format!("{}_fmt", name))
        .expect("built-in format string should not fail to build");
    let arg = function
        .get_first_param()
        .expect("echo variant always takes exactly one parameter");
    builder
        .build_call(printf, &[format_global.as_pointer_value().into(), arg.into()], "printfcall")
        .expect("printf call in a built-in echo variant should not fail to build");
    builder
        .build_return(None)
        .expect("echo variant returns void");
}
