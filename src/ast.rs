//! AST node definitions.
//!
//! Nodes are ordinary recursive enums rather than a class hierarchy: one
//! variant per expression/statement form, dispatched by pattern matching in
//! the lowering engine. Every node that participates in diagnostics carries
//! a `Location`.

/// A source range, `first_line`/`first_column` through `last_line`/`last_column`,
/// both 1-indexed. Mirrors the parser's token line/column tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub first_line: u32,
    pub first_column: u32,
    pub last_line: u32,
    pub last_column: u32,
}

impl Location {
    pub fn new(first_line: u32, first_column: u32, last_line: u32, last_column: u32) -> Self {
        Self {
            first_line,
            first_column,
            last_line,
            last_column,
        }
    }

    /// A single-point location (start == end), used for synthesized nodes.
    pub fn point(line: u32, column: u32) -> Self {
        Self::new(line, column, line, column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Integer(i64),
    Double(f64),
    Identifier {
        name: String,
        loc: Location,
    },
    BinaryOp {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        loc: Location,
    },
    UnaryOp {
        op: UnOp,
        operand: Box<Expr>,
        loc: Location,
    },
    Assignment {
        target: String,
        expr: Box<Expr>,
        loc: Location,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        loc: Location,
    },
}

impl Expr {
    /// The location to report diagnostics at, if this node carries one.
    pub fn loc(&self) -> Location {
        match self {
            Expr::Integer(_) | Expr::Double(_) => Location::default(),
            Expr::Identifier { loc, .. }
            | Expr::BinaryOp { loc, .. }
            | Expr::UnaryOp { loc, .. }
            | Expr::Assignment { loc, .. }
            | Expr::Call { loc, .. } => *loc,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub type_name: String,
    pub name: String,
    pub loc: Location,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    VarDecl {
        type_name: String,
        name: String,
        init: Option<Expr>,
        loc: Location,
    },
    ExprStmt(Expr),
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
        loc: Location,
    },
    For {
        iter_name: String,
        iter_type: String,
        from: Expr,
        to: Expr,
        body: Block,
        step: Option<Expr>,
        loc: Location,
    },
    Return {
        expr: Option<Expr>,
        loc: Location,
    },
    FnDecl {
        return_type: String,
        name: String,
        params: Vec<Param>,
        body: Option<Block>,
        is_external: bool,
        loc: Location,
    },
}
