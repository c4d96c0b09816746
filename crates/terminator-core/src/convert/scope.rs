//! Name and type bookkeeping used while lowering a translation unit.

use std::collections::HashMap;

use crate::tree::TypeName;

/// Lexical frames of declared names, innermost last.
///
/// Frames below `function_base` belong to enclosing scopes (file-level
/// globals); everything from `function_base` up is local to the function
/// currently being converted.
pub(crate) struct Scopes {
    frames: Vec<HashMap<String, Option<TypeName>>>,
    function_base: usize,
}

impl Scopes {
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
            function_base: 1,
        }
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Open a function frame; pass the returned token to `exit_function`.
    pub fn enter_function(&mut self) -> usize {
        let saved = self.function_base;
        self.function_base = self.frames.len();
        self.push();
        saved
    }

    pub fn exit_function(&mut self, saved: usize) {
        self.frames.truncate(self.function_base.max(1));
        self.function_base = saved;
    }

    /// Whether a function body is being converted.
    pub fn in_function(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn declare(&mut self, name: &str, ty: Option<TypeName>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), ty);
        }
    }

    /// Declared type of `name`, searching innermost frames first. The outer
    /// `Option` says whether the name is declared at all.
    pub fn lookup(&self, name: &str) -> Option<Option<&TypeName>> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .map(|ty| ty.as_ref())
    }

    /// Whether `name` is a parameter or local of the current function.
    pub fn is_local(&self, name: &str) -> bool {
        self.frames
            .iter()
            .skip(self.function_base)
            .any(|frame| frame.contains_key(name))
    }
}

/// What the converter knows about one class while lowering its members.
#[derive(Debug, Clone, Default)]
pub(crate) struct ClassInfo {
    pub name: String,
    pub fields: HashMap<String, Option<TypeName>>,
    pub statics: HashMap<String, Option<TypeName>>,
    pub methods: HashMap<String, Option<TypeName>>,
    pub static_methods: HashMap<String, Option<TypeName>>,
}

impl ClassInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Type of an instance field or result type of an instance method.
    pub fn member_type(&self, name: &str) -> Option<&TypeName> {
        self.fields
            .get(name)
            .or_else(|| self.methods.get(name))
            .and_then(|ty| ty.as_ref())
    }

    pub fn static_member_type(&self, name: &str) -> Option<&TypeName> {
        self.statics
            .get(name)
            .or_else(|| self.static_methods.get(name))
            .and_then(|ty| ty.as_ref())
    }
}
