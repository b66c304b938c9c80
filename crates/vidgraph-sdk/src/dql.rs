//! Typed DQL query builder
//!
//! Queries are assembled as values and rendered to DQL text only at the
//! transport boundary. String literals are always escaped while
//! rendering, so caller-supplied text cannot terminate a literal early.

use std::fmt::Write;

use crate::models::Uid;

/// Literal argument of a root function
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Str(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::Str(s)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Int(n)
    }
}

impl Literal {
    fn render(&self, out: &mut String) {
        match self {
            Literal::Str(s) => {
                out.push('"');
                out.push_str(&escape(s));
                out.push('"');
            }
            Literal::Int(n) => {
                let _ = write!(out, "{}", n);
            }
        }
    }
}

/// Escape a string for use inside a double-quoted DQL literal
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Root or filter function
#[derive(Debug, Clone, PartialEq)]
pub enum Func {
    /// Exact equality on an indexed predicate
    Eq { predicate: String, value: Literal },
    /// Full-text match of any term
    AnyOfText { predicate: String, text: String },
    /// Strictly greater than
    Gt { predicate: String, value: Literal },
    /// All nodes of a type
    Type(String),
    /// Explicit node list
    Uid(Vec<Uid>),
}

impl Func {
    pub fn eq(predicate: &str, value: impl Into<Literal>) -> Self {
        Func::Eq { predicate: predicate.to_string(), value: value.into() }
    }

    pub fn any_of_text(predicate: &str, text: &str) -> Self {
        Func::AnyOfText { predicate: predicate.to_string(), text: text.to_string() }
    }

    pub fn gt(predicate: &str, value: impl Into<Literal>) -> Self {
        Func::Gt { predicate: predicate.to_string(), value: value.into() }
    }

    pub fn of_type(name: &str) -> Self {
        Func::Type(name.to_string())
    }

    fn render(&self, out: &mut String) {
        match self {
            Func::Eq { predicate, value } => {
                let _ = write!(out, "eq({}, ", predicate);
                value.render(out);
                out.push(')');
            }
            Func::AnyOfText { predicate, text } => {
                let _ = write!(out, "anyoftext({}, ", predicate);
                Literal::Str(text.clone()).render(out);
                out.push(')');
            }
            Func::Gt { predicate, value } => {
                let _ = write!(out, "gt({}, ", predicate);
                value.render(out);
                out.push(')');
            }
            Func::Type(name) => {
                let _ = write!(out, "type({})", name);
            }
            Func::Uid(uids) => {
                let list: Vec<String> = uids.iter().map(|u| u.to_string()).collect();
                let _ = write!(out, "uid({})", list.join(", "));
            }
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordering of a block's results
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub predicate: String,
    pub direction: Direction,
}

/// A selected field
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Uid,
    Scalar(String),
    /// Nested traversal of a `[uid]` predicate, `~pred` when `reverse`
    Edge {
        predicate: String,
        reverse: bool,
        fields: Vec<Field>,
    },
    /// `alias: count(uid)`
    Count { alias: String },
}

impl Field {
    pub fn scalar(name: &str) -> Self {
        Field::Scalar(name.to_string())
    }

    pub fn edge(predicate: &str, fields: Vec<Field>) -> Self {
        Field::Edge { predicate: predicate.to_string(), reverse: false, fields }
    }

    pub fn reverse_edge(predicate: &str, fields: Vec<Field>) -> Self {
        Field::Edge { predicate: predicate.to_string(), reverse: true, fields }
    }

    pub fn count(alias: &str) -> Self {
        Field::Count { alias: alias.to_string() }
    }

    /// Key this field occupies in a result object
    pub fn result_key(&self) -> String {
        match self {
            Field::Uid => "uid".to_string(),
            Field::Scalar(name) => name.clone(),
            Field::Edge { predicate, reverse: false, .. } => predicate.clone(),
            Field::Edge { predicate, reverse: true, .. } => format!("~{}", predicate),
            Field::Count { alias } => alias.clone(),
        }
    }

    fn render(&self, out: &mut String) {
        match self {
            Field::Uid => out.push_str("uid"),
            Field::Scalar(name) => out.push_str(name),
            Field::Edge { predicate, reverse, fields } => {
                if *reverse {
                    out.push('~');
                }
                out.push_str(predicate);
                render_fields(fields, out);
            }
            Field::Count { alias } => {
                let _ = write!(out, "{}: count(uid)", alias);
            }
        }
    }
}

fn render_fields(fields: &[Field], out: &mut String) {
    out.push_str(" {");
    for field in fields {
        out.push(' ');
        field.render(out);
    }
    out.push_str(" }");
}

/// One named query block
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub func: Func,
    pub filter: Option<Func>,
    pub order: Option<Order>,
    pub first: Option<i64>,
    pub offset: Option<i64>,
    pub fields: Vec<Field>,
}

impl Block {
    pub fn new(name: &str, func: Func) -> Self {
        Self {
            name: name.to_string(),
            func,
            filter: None,
            order: None,
            first: None,
            offset: None,
            fields: Vec::new(),
        }
    }

    pub fn filter(mut self, func: Func) -> Self {
        self.filter = Some(func);
        self
    }

    pub fn order_by(mut self, predicate: &str, direction: Direction) -> Self {
        self.order = Some(Order { predicate: predicate.to_string(), direction });
        self
    }

    pub fn first(mut self, n: i64) -> Self {
        self.first = Some(n);
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    fn render(&self, out: &mut String) {
        let _ = write!(out, "{}(func: ", self.name);
        self.func.render(out);
        if let Some(order) = &self.order {
            let key = match order.direction {
                Direction::Asc => "orderasc",
                Direction::Desc => "orderdesc",
            };
            let _ = write!(out, ", {}: {}", key, order.predicate);
        }
        if let Some(first) = self.first {
            let _ = write!(out, ", first: {}", first);
        }
        if let Some(offset) = self.offset {
            let _ = write!(out, ", offset: {}", offset);
        }
        out.push(')');
        if let Some(filter) = &self.filter {
            out.push_str(" @filter(");
            filter.render(out);
            out.push(')');
        }
        render_fields(&self.fields, out);
    }
}

/// A complete query of one or more blocks
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub blocks: Vec<Block>,
}

impl Query {
    pub fn new(block: Block) -> Self {
        Self { blocks: vec![block] }
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Render to DQL text
    pub fn render(&self) -> String {
        let mut out = String::from("{");
        for block in &self.blocks {
            out.push(' ');
            block.render(&mut out);
        }
        out.push_str(" }");
        out
    }
}
