//! Lambda syntax tree.

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Return(Option<Expr>),
    Assign { target: String, value: Expr },
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
    Eq,
    NotEq,
    Identical,
    NotIdentical,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Var(String),
    Array(Vec<(Option<Expr>, Expr)>),
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Property {
        target: Box<Expr>,
        name: String,
    },
    MethodCall {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    StaticCall {
        class: String,
        method: String,
        args: Vec<Expr>,
    },
    Invoke {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Coalesce {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then: Option<Box<Expr>>,
        otherwise: Box<Expr>,
    },
}

impl Expr {
    /// Visit this node and every nested expression.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Expr)) {
        f(self);
        match self {
            Expr::Literal(_) | Expr::Var(_) => {}
            Expr::Array(items) => {
                for (k, v) in items {
                    if let Some(k) = k {
                        k.walk(f);
                    }
                    v.walk(f);
                }
            }
            Expr::Index { target, index } => {
                target.walk(f);
                index.walk(f);
            }
            Expr::Property { target, .. } => target.walk(f),
            Expr::MethodCall { target, args, .. } => {
                target.walk(f);
                for a in args {
                    a.walk(f);
                }
            }
            Expr::Call { args, .. } | Expr::StaticCall { args, .. } => {
                for a in args {
                    a.walk(f);
                }
            }
            Expr::Invoke { callee, args } => {
                callee.walk(f);
                for a in args {
                    a.walk(f);
                }
            }
            Expr::Unary { expr, .. } => expr.walk(f),
            Expr::Binary { lhs, rhs, .. } | Expr::Coalesce { lhs, rhs } => {
                lhs.walk(f);
                rhs.walk(f);
            }
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                cond.walk(f);
                if let Some(t) = then {
                    t.walk(f);
                }
                otherwise.walk(f);
            }
        }
    }
}

impl Stmt {
    pub fn walk_exprs<'a>(&'a self, f: &mut dyn FnMut(&'a Expr)) {
        match self {
            Stmt::Return(Some(e)) | Stmt::Expr(e) | Stmt::Assign { value: e, .. } => e.walk(f),
            Stmt::Return(None) => {}
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                cond.walk(f);
                for s in then.iter().chain(otherwise) {
                    s.walk_exprs(f);
                }
            }
        }
    }
}
