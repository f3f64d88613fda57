use crate::bytecode::compile_error::CompileError;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Global,
    Local,
    Builtin,
    ObjectMethod,
    /// Captured from an enclosing function; indexes the closure's free values.
    Free,
    /// The name a function literal is bound to, seen from inside its body.
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: usize,
    pub mutable: bool,
}

/// Outcome of a lookup that has not touched any table yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Usable as is: bound in this table, or a global/builtin.
    Bound(Symbol),
    /// Bound `depth` tables out in a function scope; every table in between
    /// must capture it before it can be loaded here.
    Capture { depth: usize, original: Symbol },
}

/// Bindings of one lexical scope. Function bodies get a table enclosing the
/// table of the surrounding code.
#[derive(Debug, Default)]
pub struct SymbolTable {
    outer: Option<Box<SymbolTable>>,
    store: HashMap<String, Symbol>,
    methods: HashMap<String, Symbol>,
    num_definitions: usize,
    free_symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_enclosed(outer: SymbolTable) -> Self {
        Self {
            outer: Some(Box::new(outer)),
            ..Self::default()
        }
    }

    /// Drop this scope and hand back the enclosing one.
    pub fn into_outer(self) -> Option<SymbolTable> {
        self.outer.map(|outer| *outer)
    }

    pub fn is_global(&self) -> bool {
        self.outer.is_none()
    }

    pub fn num_definitions(&self) -> usize {
        self.num_definitions
    }

    /// Original symbols captured by this scope, in free-slot order.
    pub fn free_symbols(&self) -> &[Symbol] {
        &self.free_symbols
    }

    pub fn defined_here(&self, name: &str) -> bool {
        self.store
            .get(name)
            .is_some_and(|s| matches!(s.scope, SymbolScope::Global | SymbolScope::Local))
    }

    pub fn define(&mut self, name: &str, mutable: bool) -> Symbol {
        let scope = if self.is_global() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index: self.num_definitions,
            mutable,
        };
        self.num_definitions += 1;
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Builtin,
            index,
            mutable: false,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Member names live apart from variables so `len` can be both.
    pub fn define_object_method(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::ObjectMethod,
            index,
            mutable: false,
        };
        self.methods.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Function,
            index: 0,
            mutable: false,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Find `name` without recording anything.
    pub fn lookup(&self, name: &str) -> Option<Resolution> {
        if let Some(symbol) = self.store.get(name) {
            return Some(Resolution::Bound(symbol.clone()));
        }

        let outer = self.outer.as_deref()?;
        match outer.lookup(name)? {
            Resolution::Bound(symbol)
                if matches!(symbol.scope, SymbolScope::Global | SymbolScope::Builtin) =>
            {
                Some(Resolution::Bound(symbol))
            }
            Resolution::Bound(original) => Some(Resolution::Capture {
                depth: 1,
                original,
            }),
            Resolution::Capture { depth, original } => Some(Resolution::Capture {
                depth: depth + 1,
                original,
            }),
        }
    }

    /// Thread `original` through the `depth` innermost tables as a free
    /// variable, returning the `Free` symbol of this table.
    pub fn capture(&mut self, original: Symbol, depth: usize) -> Symbol {
        let captured = match self.outer.as_deref_mut() {
            Some(outer) if depth > 1 => outer.capture(original, depth - 1),
            _ => original,
        };
        self.define_free(captured)
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        let symbol = Symbol {
            name: original.name.clone(),
            scope: SymbolScope::Free,
            index: self.free_symbols.len(),
            mutable: false,
        };
        self.free_symbols.push(original);
        self.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }

    /// Lookup followed by any capture it calls for.
    pub fn resolve(&mut self, name: &str) -> Result<Symbol, CompileError> {
        match self.lookup(name) {
            Some(Resolution::Bound(symbol)) => Ok(symbol),
            Some(Resolution::Capture { depth, original }) => Ok(self.capture(original, depth)),
            None => Err(CompileError::undefined_symbol(name)),
        }
    }

    pub fn resolve_method(&self, name: &str) -> Option<Symbol> {
        match self.outer.as_deref() {
            Some(outer) => outer.resolve_method(name),
            None => self.methods.get(name).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str, scope: SymbolScope, index: usize, mutable: bool) -> Symbol {
        Symbol {
            name: name.to_string(),
            scope,
            index,
            mutable,
        }
    }

    #[test]
    fn test_define() {
        let mut global = SymbolTable::new();
        assert_eq!(
            global.define("a", true),
            sym("a", SymbolScope::Global, 0, true)
        );
        assert_eq!(
            global.define("b", false),
            sym("b", SymbolScope::Global, 1, false)
        );

        let mut local = SymbolTable::new_enclosed(global);
        assert_eq!(
            local.define("c", true),
            sym("c", SymbolScope::Local, 0, true)
        );
    }

    #[test]
    fn test_resolve_global_from_nested() {
        let mut global = SymbolTable::new();
        global.define("a", false);
        let mut first = SymbolTable::new_enclosed(global);
        first.define("b", true);
        let mut second = SymbolTable::new_enclosed(first);

        assert_eq!(
            second.resolve("a").unwrap(),
            sym("a", SymbolScope::Global, 0, false)
        );
        assert!(second.free_symbols().is_empty());
    }

    #[test]
    fn test_resolve_free() {
        let mut global = SymbolTable::new();
        global.define("a", true);
        let mut first = SymbolTable::new_enclosed(global);
        first.define("c", true);
        let mut second = SymbolTable::new_enclosed(first);
        second.define("e", true);

        assert_eq!(
            second.resolve("c").unwrap(),
            sym("c", SymbolScope::Free, 0, false)
        );
        assert_eq!(
            second.resolve("e").unwrap(),
            sym("e", SymbolScope::Local, 0, true)
        );
        assert_eq!(
            second.free_symbols(),
            &[sym("c", SymbolScope::Local, 0, true)]
        );
    }

    #[test]
    fn test_lookup_is_pure() {
        let mut global = SymbolTable::new();
        global.define("a", true);
        let mut first = SymbolTable::new_enclosed(global);
        first.define("x", true);
        let second = SymbolTable::new_enclosed(first);

        assert_eq!(
            second.lookup("x"),
            Some(Resolution::Capture {
                depth: 1,
                original: sym("x", SymbolScope::Local, 0, true)
            })
        );
        assert!(second.free_symbols().is_empty());
        assert_eq!(second.lookup("missing"), None);
    }

    #[test]
    fn test_capture_threads_through_intermediate_scopes() {
        let global = SymbolTable::new();
        let mut outer = SymbolTable::new_enclosed(global);
        outer.define("x", true);
        let middle = SymbolTable::new_enclosed(outer);
        let mut inner = SymbolTable::new_enclosed(middle);

        let symbol = inner.resolve("x").unwrap();
        assert_eq!(symbol, sym("x", SymbolScope::Free, 0, false));
        // inner captured middle's free slot, not outer's local
        assert_eq!(
            inner.free_symbols(),
            &[sym("x", SymbolScope::Free, 0, false)]
        );

        let middle = inner.into_outer().unwrap();
        assert_eq!(
            middle.free_symbols(),
            &[sym("x", SymbolScope::Local, 0, true)]
        );
    }

    #[test]
    fn test_resolve_free_only_once() {
        let global = SymbolTable::new();
        let mut outer = SymbolTable::new_enclosed(global);
        outer.define("x", true);
        let mut inner = SymbolTable::new_enclosed(outer);

        inner.resolve("x").unwrap();
        inner.resolve("x").unwrap();

        assert_eq!(inner.free_symbols().len(), 1);
    }

    #[test]
    fn test_builtins_never_captured() {
        let mut global = SymbolTable::new();
        global.define_builtin(0, "len");
        let first = SymbolTable::new_enclosed(global);
        let mut second = SymbolTable::new_enclosed(first);

        assert_eq!(
            second.resolve("len").unwrap(),
            sym("len", SymbolScope::Builtin, 0, false)
        );
        assert!(second.free_symbols().is_empty());
    }

    #[test]
    fn test_function_name_captured_by_inner_scope() {
        let global = SymbolTable::new();
        let mut fun = SymbolTable::new_enclosed(global);
        fun.define_function_name("fact");
        let mut inner = SymbolTable::new_enclosed(fun);

        assert_eq!(
            inner.resolve("fact").unwrap(),
            sym("fact", SymbolScope::Free, 0, false)
        );
        assert_eq!(inner.free_symbols()[0].scope, SymbolScope::Function);
    }

    #[test]
    fn test_shadowing_function_name() {
        let global = SymbolTable::new();
        let mut fun = SymbolTable::new_enclosed(global);
        fun.define_function_name("a");
        fun.define("a", true);

        assert_eq!(
            fun.resolve("a").unwrap(),
            sym("a", SymbolScope::Local, 0, true)
        );
    }

    #[test]
    fn test_undefined() {
        let mut global = SymbolTable::new();

        assert!(matches!(
            global.resolve("nope"),
            Err(CompileError::UndefinedSymbol { .. })
        ));
    }

    #[test]
    fn test_methods_separate_from_variables() {
        let mut global = SymbolTable::new();
        global.define_object_method(0, "len");
        let inner = SymbolTable::new_enclosed(global);

        assert_eq!(inner.lookup("len"), None);
        assert_eq!(
            inner.resolve_method("len"),
            Some(sym("len", SymbolScope::ObjectMethod, 0, false))
        );
    }
}
