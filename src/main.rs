pub mod ast;
pub mod cli;
pub mod lexer;
pub mod limits;
pub mod lowering;
pub mod parser;

use clap::Parser as _;
use cli::{Cli, Commands, EmitArgs, ParseArgs, RunArgs};
use inkwell::context::Context;
use inkwell::targets::{InitializationConfig, Target};
use inkwell::OptimizationLevel;

/// A command failure carrying the process exit code it should produce.
/// Mirrors the original driver's `exit(N)` calls, but threaded back through
/// `main` as a value instead of calling `exit` from deep inside the pipeline.
struct CliFailure {
    code: i32,
    message: String,
}

impl CliFailure {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Parse(args) => parse_command(args),
        Commands::Emit(args) => emit_command(args),
        Commands::Run(args) => run_command(args),
    };

    if let Err(failure) = result {
        eprintln!("{}", failure.message);
        std::process::exit(failure.code);
    }
}

fn load_limits() -> limits::CompilerLimits {
    match limits::CompilerLimits::from_project_toml("project.toml") {
        Ok(l) if l.validate().is_ok() => l,
        _ => limits::CompilerLimits::default(),
    }
}

fn read_source(path: &str) -> Result<String, CliFailure> {
    std::fs::read_to_string(path).map_err(|e| CliFailure::new(2, format!("Cannot open input '{}': {}", path, e)))
}

fn lex_and_parse(source: &str, limits: &limits::CompilerLimits) -> Result<ast::Block, CliFailure> {
    let tokens = lexer::lex(source, limits).map_err(|e| CliFailure::new(4, e.to_string()))?;
    parser::parse(tokens, source, limits).map_err(|e| CliFailure::new(4, e.to_string()))
}

fn parse_command(args: ParseArgs) -> Result<(), CliFailure> {
    let limits = load_limits();
    let source = read_source(&args.file)?;
    let program = lex_and_parse(&source, &limits)?;
    println!("{:#?}", program);
    Ok(())
}

fn emit_command(args: EmitArgs) -> Result<(), CliFailure> {
    let limits = load_limits();
    let source = read_source(&args.file)?;
    let program = lex_and_parse(&source, &limits)?;

    let context = Context::create();
    let module =
        lowering::lower_program(&context, &args.file, &program, &limits).map_err(|e| CliFailure::new(5, e.to_string()))?;
    let ir = module.print_to_string().to_string();

    match args.out_file {
        Some(path) => std::fs::write(&path, ir)
            .map_err(|e| CliFailure::new(3, format!("Cannot write output '{}': {}", path, e)))?,
        None => print!("{}", ir),
    }
    Ok(())
}

fn run_command(args: RunArgs) -> Result<(), CliFailure> {
    let limits = load_limits();
    let source = read_source(&args.file)?;
    let program = lex_and_parse(&source, &limits)?;

    let context = Context::create();
    let module =
        lowering::lower_program(&context, &args.file, &program, &limits).map_err(|e| CliFailure::new(5, e.to_string()))?;

    Target::initialize_native(&InitializationConfig::default())
        .map_err(|e| CliFailure::new(5, format!("Failed to initialize native target: {}", e)))?;

    let engine = module
        .create_jit_execution_engine(OptimizationLevel::None)
        .map_err(|e| CliFailure::new(5, format!("Failed to create JIT execution engine: {}", e)))?;

    unsafe {
        let main_fn = engine
            .get_function::<unsafe extern "C" fn() -> i64>("main")
            .map_err(|e| CliFailure::new(5, format!("Failed to locate 'main' in compiled module: {}", e)))?;
        main_fn.call();
    }
    Ok(())
}
