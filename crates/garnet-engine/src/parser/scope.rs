//! Lexical scopes and the parse environment
//!
//! Constant references are resolved against the chain of module bodies that
//! textually enclose them, unless the environment has switched to dynamic
//! constant lookup (singleton class bodies). Both pieces of state are what a
//! deferred method body needs restored before it is lowered.

use std::sync::Arc;

/// Name of the outermost lexical scope
pub const ROOT_SCOPE: &str = "Object";

/// A module body in the lexical nesting chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalScope {
    name: String,
    parent: Option<Arc<LexicalScope>>,
}

impl LexicalScope {
    /// The outermost scope
    pub fn root() -> Arc<Self> {
        Arc::new(Self {
            name: ROOT_SCOPE.to_string(),
            parent: None,
        })
    }

    /// A scope nested inside `parent`
    pub fn child(parent: &Arc<Self>, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: Some(Arc::clone(parent)),
        })
    }

    /// Name of the module this scope belongs to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enclosing scope, if any
    pub fn parent(&self) -> Option<&Arc<LexicalScope>> {
        self.parent.as_ref()
    }

    /// Names from the outermost scope down to this one
    pub fn path(&self) -> Vec<String> {
        let mut path = vec![self.name.clone()];
        let mut scope = self.parent.as_deref();
        while let Some(s) = scope {
            path.push(s.name.clone());
            scope = s.parent.as_deref();
        }
        path.reverse();
        path
    }
}

/// Parse-time state consulted while lowering
#[derive(Debug, Clone)]
pub struct ParseEnvironment {
    lexical_scope: Arc<LexicalScope>,
    dynamic_constant_lookup: bool,
}

impl Default for ParseEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseEnvironment {
    /// Environment positioned at the root scope with lexical constant lookup
    pub fn new() -> Self {
        Self {
            lexical_scope: LexicalScope::root(),
            dynamic_constant_lookup: false,
        }
    }

    /// Current lexical scope
    pub fn lexical_scope(&self) -> &Arc<LexicalScope> {
        &self.lexical_scope
    }

    /// Enter a module body, returning the scope to restore afterwards
    pub fn push_lexical_scope(&mut self, name: impl Into<String>) -> Arc<LexicalScope> {
        let child = LexicalScope::child(&self.lexical_scope, name);
        std::mem::replace(&mut self.lexical_scope, child)
    }

    /// Replace the current lexical scope
    pub fn reset_lexical_scope(&mut self, scope: Arc<LexicalScope>) {
        self.lexical_scope = scope;
    }

    /// Whether constants are looked up dynamically
    pub fn is_dynamic_constant_lookup(&self) -> bool {
        self.dynamic_constant_lookup
    }

    /// Switch constant lookup mode
    pub fn set_dynamic_constant_lookup(&mut self, dynamic: bool) {
        self.dynamic_constant_lookup = dynamic;
    }
}
