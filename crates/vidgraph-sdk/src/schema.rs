//! Typed schema declarations rendered to Dgraph schema text

use std::fmt::Write;

/// Scalar or edge type of a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Int,
    Float,
    Bool,
    Geo,
    DateTime,
    Uid,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::Geo => "geo",
            ValueType::DateTime => "datetime",
            ValueType::Uid => "uid",
        }
    }
}

/// Index tokenizer attached to a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tokenizer {
    Exact,
    Hash,
    Term,
    Fulltext,
    Int,
    Geo,
    Hour,
}

impl Tokenizer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tokenizer::Exact => "exact",
            Tokenizer::Hash => "hash",
            Tokenizer::Term => "term",
            Tokenizer::Fulltext => "fulltext",
            Tokenizer::Int => "int",
            Tokenizer::Geo => "geo",
            Tokenizer::Hour => "hour",
        }
    }
}

/// A single predicate declaration
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateSchema {
    pub name: String,
    pub value_type: ValueType,
    pub list: bool,
    pub indexes: Vec<Tokenizer>,
    pub reverse: bool,
}

impl PredicateSchema {
    /// Scalar predicate with no index
    pub fn scalar(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            list: false,
            indexes: Vec::new(),
            reverse: false,
        }
    }

    /// `[uid]` edge predicate
    pub fn edge(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: ValueType::Uid,
            list: true,
            indexes: Vec::new(),
            reverse: false,
        }
    }

    pub fn index(mut self, tokenizer: Tokenizer) -> Self {
        self.indexes.push(tokenizer);
        self
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn is_indexed(&self) -> bool {
        !self.indexes.is_empty()
    }

    pub fn has_index(&self, tokenizer: Tokenizer) -> bool {
        self.indexes.contains(&tokenizer)
    }
}

/// A node type and the predicates it groups
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSchema {
    pub name: String,
    pub fields: Vec<String>,
}

impl TypeSchema {
    pub fn new(name: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            name: name.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Complete schema declaration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub types: Vec<TypeSchema>,
    pub predicates: Vec<PredicateSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, ty: TypeSchema) -> Self {
        self.types.push(ty);
        self
    }

    pub fn with_predicate(mut self, predicate: PredicateSchema) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicate(&self, name: &str) -> Option<&PredicateSchema> {
        self.predicates.iter().find(|p| p.name == name)
    }

    /// Merge another declaration into this one; later declarations of
    /// the same predicate or type replace earlier ones.
    pub fn merge(&mut self, other: &Schema) {
        for p in &other.predicates {
            match self.predicates.iter_mut().find(|q| q.name == p.name) {
                Some(existing) => *existing = p.clone(),
                None => self.predicates.push(p.clone()),
            }
        }
        for t in &other.types {
            match self.types.iter_mut().find(|u| u.name == t.name) {
                Some(existing) => *existing = t.clone(),
                None => self.types.push(t.clone()),
            }
        }
    }

    /// Render to the engine's schema language
    pub fn render(&self) -> String {
        let mut out = String::new();
        for ty in &self.types {
            let _ = writeln!(out, "type {} {{", ty.name);
            for field in &ty.fields {
                let _ = writeln!(out, "    {}", field);
            }
            out.push_str("}\n\n");
        }
        for p in &self.predicates {
            let ty = if p.list {
                format!("[{}]", p.value_type.as_str())
            } else {
                p.value_type.as_str().to_string()
            };
            let _ = write!(out, "{}: {}", p.name, ty);
            if p.is_indexed() {
                let tokenizers: Vec<&str> = p.indexes.iter().map(|t| t.as_str()).collect();
                let _ = write!(out, " @index({})", tokenizers.join(", "));
            }
            if p.reverse {
                out.push_str(" @reverse");
            }
            out.push_str(" .\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_predicates_and_types() {
        let schema = Schema::new()
            .with_type(TypeSchema::new("Comment", &["text", "replies_to_c_c"]))
            .with_predicate(PredicateSchema::scalar("text", ValueType::String).index(Tokenizer::Fulltext))
            .with_predicate(PredicateSchema::edge("replies_to_c_c").reverse())
            .with_predicate(PredicateSchema::edge("contains"));

        let text = schema.render();
        assert!(text.contains("type Comment {\n    text\n    replies_to_c_c\n}"));
        assert!(text.contains("text: string @index(fulltext) ."));
        assert!(text.contains("replies_to_c_c: [uid] @reverse ."));
        assert!(text.contains("contains: [uid] ."));
    }

    #[test]
    fn test_merge_replaces_by_name() {
        let mut base = Schema::new().with_predicate(PredicateSchema::edge("posts"));
        base.merge(&Schema::new().with_predicate(PredicateSchema::edge("posts").reverse()));
        assert_eq!(base.predicates.len(), 1);
        assert!(base.predicate("posts").unwrap().reverse);
    }
}
