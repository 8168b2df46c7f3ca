use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ucml")]
#[command(about = "Lexer, parser and LLVM lowering engine for a small statically-typed imperative language")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lex and parse a source file, printing the AST's debug form
    Parse(ParseArgs),
    /// Lex, parse and lower a source file, printing (or writing) textual LLVM IR
    Emit(EmitArgs),
    /// Lex, parse, lower and JIT-execute a source file
    Run(RunArgs),
}

#[derive(clap::Args)]
pub struct ParseArgs {
    /// Input source file path
    pub file: String,
}

#[derive(clap::Args)]
pub struct EmitArgs {
    /// Input source file path
    pub file: String,
    /// Write textual LLVM IR here instead of stdout
    pub out_file: Option<String>,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Input source file path
    pub file: String,
}
