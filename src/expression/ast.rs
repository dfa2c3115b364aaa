#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Lit(Lit),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Cond {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call {
        func: String,
        args: Vec<Expr>,
    },
    /// An unresolved identifier path, as written: `ratio`, `self.x`.
    Path(Vec<String>),
    /// Bound reference into the hook's declared input slots.
    Input(usize),
    /// Bound builtin call.
    Builtin {
        id: BuiltinId,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lit {
    F64(f64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuiltinId {
    Min,
    Max,
    Clamp,
    Abs,
    Sin,
    Cos,
    Tan,
    Sqrt,
    Pow,
    Floor,
    Ceil,
    Round,
    Lerp,
    Smoothstep,
}

impl BuiltinId {
    pub(crate) fn lookup(name: &str) -> Option<(Self, usize)> {
        let v = match name {
            "min" => (Self::Min, 2),
            "max" => (Self::Max, 2),
            "clamp" => (Self::Clamp, 3),
            "abs" => (Self::Abs, 1),
            "sin" => (Self::Sin, 1),
            "cos" => (Self::Cos, 1),
            "tan" => (Self::Tan, 1),
            "sqrt" => (Self::Sqrt, 1),
            "pow" => (Self::Pow, 2),
            "floor" => (Self::Floor, 1),
            "ceil" => (Self::Ceil, 1),
            "round" => (Self::Round, 1),
            "lerp" => (Self::Lerp, 3),
            "smoothstep" => (Self::Smoothstep, 3),
            _ => return None,
        };
        Some(v)
    }
}
