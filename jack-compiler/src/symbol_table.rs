//! Two-scope symbol table: class scope (STATIC/FIELD) and subroutine scope
//! (ARG/VAR), each kind with its own monotonic counter. Subroutine scope
//! shadows class scope; `start_subroutine` clears only the subroutine map
//! and the ARG/VAR counters.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Static,
    Field,
    Arg,
    Var,
}

#[derive(Debug, Clone)]
struct Symbol {
    ty: String,
    kind: SegmentKind,
    index: u16,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: HashMap<String, Symbol>,
    subroutine_scope: HashMap<String, Symbol>,
    static_count: u16,
    field_count: u16,
    arg_count: u16,
    var_count: u16,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.arg_count = 0;
        self.var_count = 0;
    }

    pub fn define(&mut self, name: &str, ty: &str, kind: SegmentKind) {
        let index = match kind {
            SegmentKind::Static => {
                let i = self.static_count;
                self.static_count += 1;
                i
            }
            SegmentKind::Field => {
                let i = self.field_count;
                self.field_count += 1;
                i
            }
            SegmentKind::Arg => {
                let i = self.arg_count;
                self.arg_count += 1;
                i
            }
            SegmentKind::Var => {
                let i = self.var_count;
                self.var_count += 1;
                i
            }
        };

        let symbol = Symbol {
            ty: ty.to_string(),
            kind,
            index,
        };

        match kind {
            SegmentKind::Static | SegmentKind::Field => {
                self.class_scope.insert(name.to_string(), symbol);
            }
            SegmentKind::Arg | SegmentKind::Var => {
                self.subroutine_scope.insert(name.to_string(), symbol);
            }
        }
    }

    #[must_use]
    pub fn var_count(&self, kind: SegmentKind) -> u16 {
        match kind {
            SegmentKind::Static => self.static_count,
            SegmentKind::Field => self.field_count,
            SegmentKind::Arg => self.arg_count,
            SegmentKind::Var => self.var_count,
        }
    }

    fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<SegmentKind> {
        self.lookup(name).map(|s| s.kind)
    }

    #[must_use]
    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|s| s.ty.as_str())
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|s| s.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_of_equals_prior_define_count_in_scope() {
        let mut table = SymbolTable::new();
        table.define("x", "int", SegmentKind::Field);
        table.define("y", "int", SegmentKind::Field);
        assert_eq!(table.index_of("x"), Some(0));
        assert_eq!(table.index_of("y"), Some(1));
    }

    #[test]
    fn subroutine_scope_shadows_class_scope() {
        let mut table = SymbolTable::new();
        table.define("x", "int", SegmentKind::Field);
        table.define("x", "int", SegmentKind::Var);
        assert_eq!(table.kind_of("x"), Some(SegmentKind::Var));
    }

    #[test]
    fn start_subroutine_resets_arg_and_var_but_keeps_static_and_field() {
        let mut table = SymbolTable::new();
        table.define("count", "int", SegmentKind::Field);
        table.define("n", "int", SegmentKind::Arg);
        table.define("i", "int", SegmentKind::Var);
        table.start_subroutine();
        assert_eq!(table.var_count(SegmentKind::Arg), 0);
        assert_eq!(table.var_count(SegmentKind::Var), 0);
        assert_eq!(table.var_count(SegmentKind::Field), 1);
        assert!(!table.exists("n"));
        assert!(table.exists("count"));
    }

    #[test]
    fn unknown_name_has_no_kind() {
        let table = SymbolTable::new();
        assert!(table.kind_of("ghost").is_none());
    }
}
