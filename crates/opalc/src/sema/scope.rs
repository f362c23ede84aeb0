//! Scope tree and symbol table arena

use string_interner::DefaultStringInterner;
use thiserror::Error;

use crate::ast::AccessModifier;
use crate::common::Pos;

use super::symbol::{
    FunctionArg, NameId, ObjectLevel, ScopeId, Symbol, SymbolId, SymbolKind, Ty, TypeInfo, TypeKind,
};

/// A lexical container of uniquely named symbols.
///
/// `owner` is the symbol this scope belongs to (`None` only for the
/// universe root). A detached scope ends the lookup chain: function bodies
/// cannot implicitly see the lexical context they were declared in.
#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub owner: Option<SymbolId>,
    pub detached_from_parent: bool,
    symbols: Vec<SymbolId>,
}

impl Scope {
    /// Member symbols in insertion order.
    pub fn symbols(&self) -> &[SymbolId] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Insertion failure: the name is already bound along the lookup chain.
///
/// Carries the conflicting symbol, hence its kind, name and declaration
/// position.
#[derive(Error, Debug)]
#[error("duplicate symbol")]
pub struct DuplicateSymbol {
    pub existing: SymbolId,
}

/// Handles to the built-in types registered in the universe scope.
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    pub void: Ty,
    pub never: Ty,
    pub nil: Ty,
    pub any: Ty,
    pub bool: Ty,
    pub int: Ty,
    pub float: Ty,
    pub string: Ty,
}

/// Arena of symbols and scopes plus the name interner.
///
/// All cross-references are index handles; traversing parent/owner links is
/// O(1) and creates no ownership cycles.
#[derive(Debug)]
pub struct SymbolTable {
    interner: DefaultStringInterner,
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    universe: ScopeId,
    builtins: Builtins,
}

impl SymbolTable {
    pub fn new() -> Self {
        let placeholder = Ty(SymbolId(0));
        let mut table = Self {
            interner: DefaultStringInterner::default(),
            symbols: Vec::new(),
            scopes: Vec::new(),
            universe: ScopeId(0),
            builtins: Builtins {
                void: placeholder,
                never: placeholder,
                nil: placeholder,
                any: placeholder,
                bool: placeholder,
                int: placeholder,
                float: placeholder,
                string: placeholder,
            },
        };
        table.scopes.push(Scope {
            parent: None,
            owner: None,
            detached_from_parent: false,
            symbols: Vec::new(),
        });
        table.builtins = Builtins {
            void: table.add_builtin(TypeKind::Void, "void"),
            never: table.add_builtin(TypeKind::Never, "never"),
            nil: table.add_builtin(TypeKind::Nil, "nil"),
            any: table.add_builtin(TypeKind::Any, "any"),
            bool: table.add_builtin(TypeKind::Bool, "bool"),
            int: table.add_builtin(TypeKind::Int, "int"),
            float: table.add_builtin(TypeKind::Float, "float"),
            string: table.add_builtin(TypeKind::String, "string"),
        };
        table
    }

    fn add_builtin(&mut self, kind: TypeKind, name: &str) -> Ty {
        let scope = self.new_scope(None, false);
        let sym = self.new_type(AccessModifier::Private, kind, name, scope, TypeInfo::None, None);
        let universe = self.universe;
        let _ = self.insert(universe, sym);
        Ty(sym)
    }

    /// The root scope holding the built-in types and the package modules.
    pub fn universe(&self) -> ScopeId {
        self.universe
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn intern(&mut self, name: &str) -> NameId {
        self.interner.get_or_intern(name)
    }

    pub fn name(&self, id: NameId) -> &str {
        self.interner.resolve(id).unwrap_or("")
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn new_scope(&mut self, parent: Option<ScopeId>, detached_from_parent: bool) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            owner: None,
            detached_from_parent,
            symbols: Vec::new(),
        });
        id
    }

    fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        if let Some(scope) = symbol.owned_scope() {
            self.scopes[scope.index()].owner = Some(id);
        }
        self.symbols.push(symbol);
        id
    }

    pub fn new_module(
        &mut self,
        access: AccessModifier,
        name: &str,
        scope: ScopeId,
        is_pkg: bool,
        is_inline: bool,
        pos: Option<Pos>,
    ) -> SymbolId {
        let name = self.intern(name);
        self.alloc(Symbol {
            name,
            access,
            parent: None,
            pos,
            kind: SymbolKind::Module { scope, is_pkg, is_inline },
        })
    }

    pub fn new_type(
        &mut self,
        access: AccessModifier,
        kind: TypeKind,
        name: &str,
        scope: ScopeId,
        info: TypeInfo,
        pos: Option<Pos>,
    ) -> SymbolId {
        let name = self.intern(name);
        self.alloc(Symbol {
            name,
            access,
            parent: None,
            pos,
            kind: SymbolKind::Type { kind, scope, fields: Vec::new(), info },
        })
    }

    pub fn new_function(
        &mut self,
        access: AccessModifier,
        name: &str,
        args: Vec<FunctionArg>,
        scope: ScopeId,
        pos: Option<Pos>,
    ) -> SymbolId {
        let name = self.intern(name);
        self.alloc(Symbol {
            name,
            access,
            parent: None,
            pos,
            kind: SymbolKind::Function { args, scope, ret: None },
        })
    }

    pub fn new_const(
        &mut self,
        access: AccessModifier,
        name: &str,
        is_local: bool,
        pos: Option<Pos>,
    ) -> SymbolId {
        let name = self.intern(name);
        self.alloc(Symbol {
            name,
            access,
            parent: None,
            pos,
            kind: SymbolKind::Const { ty: None, is_local },
        })
    }

    pub fn new_object(
        &mut self,
        access: AccessModifier,
        name: &str,
        level: ObjectLevel,
        pos: Option<Pos>,
    ) -> SymbolId {
        let name = self.intern(name);
        self.alloc(Symbol {
            name,
            access,
            parent: None,
            pos,
            kind: SymbolKind::Object { level, ty: None },
        })
    }

    /// Insert `sym` into `scope`.
    ///
    /// The duplicate check uses the chain-walking `lookup`, not `find`: a
    /// name already bound anywhere along the (non-detached) chain refuses
    /// the insertion. On success the symbol's `parent` becomes the scope's
    /// owner.
    pub fn insert(&mut self, scope: ScopeId, sym: SymbolId) -> Result<(), DuplicateSymbol> {
        self.insert_ref(scope, sym)?;
        self.symbols[sym.index()].parent = self.scopes[scope.index()].owner;
        Ok(())
    }

    /// Insert a symbol owned elsewhere, leaving its `parent` untouched.
    ///
    /// Used by the driver to make an already-loaded module visible to a
    /// second importer.
    pub fn insert_ref(&mut self, scope: ScopeId, sym: SymbolId) -> Result<(), DuplicateSymbol> {
        let name = self.symbols[sym.index()].name;
        if let Some(existing) = self.lookup_id(scope, name) {
            return Err(DuplicateSymbol { existing });
        }
        self.scopes[scope.index()].symbols.push(sym);
        Ok(())
    }

    /// Find `name` in `scope` only.
    pub fn find(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let name = self.interner.get(name)?;
        self.find_id(scope, name)
    }

    /// Find `name` walking outward through parent scopes, stopping
    /// permanently at a detached scope or at the root.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let name = self.interner.get(name)?;
        self.lookup_id(scope, name)
    }

    fn find_id(&self, scope: ScopeId, name: NameId) -> Option<SymbolId> {
        self.scopes[scope.index()]
            .symbols
            .iter()
            .copied()
            .find(|&sym| self.symbols[sym.index()].name == name)
    }

    fn lookup_id(&self, scope: ScopeId, name: NameId) -> Option<SymbolId> {
        let mut current = scope;
        loop {
            if let Some(sym) = self.find_id(current, name) {
                return Some(sym);
            }
            let scope = &self.scopes[current.index()];
            if scope.detached_from_parent {
                return None;
            }
            match scope.parent {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    pub fn symbol_name(&self, sym: SymbolId) -> &str {
        self.name(self.symbols[sym.index()].name)
    }

    /// The symbol's name prefixed by its chain of enclosing owners, except
    /// owners whose own scope is the universe root.
    pub fn qualified_name(&self, sym: SymbolId, sep: &str) -> String {
        let symbol = &self.symbols[sym.index()];
        if let Some(parent) = symbol.parent {
            let parent_scope = self.symbols[parent.index()].owned_scope();
            if parent_scope != Some(self.universe) {
                return format!(
                    "{}{}{}",
                    self.qualified_name(parent, sep),
                    sep,
                    self.name(symbol.name)
                );
            }
        }
        self.name(symbol.name).to_string()
    }

    /// Diagnostic rendering: local bindings as their bare name, everything
    /// else qualified.
    pub fn display_name(&self, sym: SymbolId) -> String {
        if self.symbols[sym.index()].is_local_binding() {
            self.symbol_name(sym).to_string()
        } else {
            self.qualified_name(sym, "::")
        }
    }

    /// The nearest enclosing module, including `sym` itself.
    pub fn enclosing_module(&self, sym: SymbolId) -> Option<SymbolId> {
        let mut current = sym;
        loop {
            if matches!(self.symbols[current.index()].kind, SymbolKind::Module { .. }) {
                return Some(current);
            }
            current = self.symbols[current.index()].parent?;
        }
    }

    /// The nearest enclosing package-root module, including `sym` itself.
    pub fn enclosing_package(&self, sym: SymbolId) -> Option<SymbolId> {
        let mut current = sym;
        loop {
            if matches!(
                self.symbols[current.index()].kind,
                SymbolKind::Module { is_pkg: true, .. }
            ) {
                return Some(current);
            }
            current = self.symbols[current.index()].parent?;
        }
    }

    /// Visibility predicate: may `from` access `to`?
    pub fn has_access_to(&self, from: SymbolId, to: SymbolId) -> bool {
        match self.symbols[to.index()].access {
            AccessModifier::Public => true,
            AccessModifier::Internal => match (self.enclosing_package(from), self.enclosing_package(to)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            // `protected` grants nothing beyond `private`
            AccessModifier::Private | AccessModifier::Protected => {
                match (self.enclosing_module(from), self.enclosing_module(to)) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
        }
    }

    /// Query the symbol forest by qualified name, starting at the universe.
    pub fn resolve_qualified(&self, path: &str, sep: &str) -> Option<SymbolId> {
        let mut segments = path.split(sep);
        let first = segments.next()?;
        let mut current = self.find(self.universe, first)?;
        for segment in segments {
            let scope = self.symbols[current.index()].owned_scope()?;
            current = self.find(scope, segment)?;
        }
        Some(current)
    }

    /// The type a reference to `sym` evaluates to, when it has one.
    pub fn type_of(&self, sym: SymbolId) -> Option<Ty> {
        match &self.symbols[sym.index()].kind {
            SymbolKind::Const { ty, .. } | SymbolKind::Object { ty, .. } => *ty,
            SymbolKind::Type { .. } => Some(Ty(sym)),
            SymbolKind::Function { .. } | SymbolKind::Module { .. } => None,
        }
    }

    pub fn ty_name(&self, ty: Ty) -> String {
        self.qualified_name(ty.0, "::")
    }

    pub fn set_const_ty(&mut self, sym: SymbolId, new_ty: Ty) {
        if let SymbolKind::Const { ty, .. } = &mut self.symbols[sym.index()].kind {
            *ty = Some(new_ty);
        }
    }

    pub fn set_object_ty(&mut self, sym: SymbolId, new_ty: Ty) {
        if let SymbolKind::Object { ty, .. } = &mut self.symbols[sym.index()].kind {
            *ty = Some(new_ty);
        }
    }

    pub fn set_function_ret(&mut self, sym: SymbolId, new_ret: Ty) {
        if let SymbolKind::Function { ret, .. } = &mut self.symbols[sym.index()].kind {
            *ret = Some(new_ret);
        }
    }

    pub fn set_function_arg_ty(&mut self, sym: SymbolId, arg: usize, new_ty: Ty) {
        if let SymbolKind::Function { args, .. } = &mut self.symbols[sym.index()].kind {
            if let Some(slot) = args.get_mut(arg) {
                slot.ty = Some(new_ty);
            }
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32) -> Pos {
        Pos::new("main.opal", line, 1, 1, 0)
    }

    /// A detached module scope under the universe, the way the driver
    /// registers file modules.
    fn module(table: &mut SymbolTable, name: &str, is_pkg: bool) -> SymbolId {
        let universe = table.universe();
        let scope = table.new_scope(Some(universe), true);
        let sym = table.new_module(AccessModifier::Public, name, scope, is_pkg, false, None);
        table.insert(universe, sym).unwrap();
        sym
    }

    #[test]
    fn test_builtins_live_in_universe() {
        let table = SymbolTable::new();
        let int = table.find(table.universe(), "int").unwrap();
        assert_eq!(Ty(int), table.builtins().int);
        assert_eq!(table.ty_name(table.builtins().float), "float");
    }

    #[test]
    fn test_insert_duplicate_regardless_of_kind() {
        let mut table = SymbolTable::new();
        let m = module(&mut table, "main", true);
        let scope = table.symbol(m).owned_scope().unwrap();

        let first = table.new_const(AccessModifier::Private, "x", false, Some(pos(1)));
        table.insert(scope, first).unwrap();

        // Same name, different kind: still a duplicate.
        let second = table.new_object(AccessModifier::Private, "x", ObjectLevel::Static, Some(pos(2)));
        let err = table.insert(scope, second).unwrap_err();
        assert_eq!(err.existing, first);
        assert_eq!(table.symbol(err.existing).pos, Some(pos(1)));
        assert_eq!(table.scope(scope).len(), 1);
    }

    #[test]
    fn test_lookup_stops_at_detached_scope() {
        let mut table = SymbolTable::new();
        let m = module(&mut table, "main", true);
        let mod_scope = table.symbol(m).owned_scope().unwrap();

        let var = table.new_object(AccessModifier::Private, "captured", ObjectLevel::Static, Some(pos(1)));
        table.insert(mod_scope, var).unwrap();

        // A nested block sees the enclosing scope...
        let block = table.new_scope(Some(mod_scope), false);
        assert_eq!(table.lookup(block, "captured"), Some(var));

        // ...but a function body, created detached, does not.
        let fn_scope = table.new_scope(Some(mod_scope), true);
        assert_eq!(table.lookup(fn_scope, "captured"), None);

        // A block nested in the function still sees the function's own
        // symbols through its non-detached parent link.
        let arg = table.new_object(AccessModifier::Private, "n", ObjectLevel::Argument, Some(pos(2)));
        table.insert(fn_scope, arg).unwrap();
        let inner = table.new_scope(Some(fn_scope), false);
        assert_eq!(table.lookup(inner, "n"), Some(arg));
    }

    #[test]
    fn test_duplicate_check_walks_the_chain() {
        let mut table = SymbolTable::new();
        let m = module(&mut table, "main", true);
        let mod_scope = table.symbol(m).owned_scope().unwrap();

        let var = table.new_object(AccessModifier::Private, "x", ObjectLevel::Static, Some(pos(1)));
        table.insert(mod_scope, var).unwrap();

        // Shadowing in a chained block is refused...
        let block = table.new_scope(Some(mod_scope), false);
        let shadow = table.new_object(AccessModifier::Private, "x", ObjectLevel::Local, Some(pos(2)));
        assert!(table.insert(block, shadow).is_err());

        // ...but a detached function scope starts fresh.
        let fn_scope = table.new_scope(Some(mod_scope), true);
        let local = table.new_object(AccessModifier::Private, "x", ObjectLevel::Local, Some(pos(3)));
        assert!(table.insert(fn_scope, local).is_ok());
    }

    #[test]
    fn test_qualified_name_skips_universe_owners() {
        let mut table = SymbolTable::new();
        let pkg = module(&mut table, "app", true);
        let pkg_scope = table.symbol(pkg).owned_scope().unwrap();

        let inner_scope = table.new_scope(Some(pkg_scope), true);
        let inner = table.new_module(AccessModifier::Public, "util", inner_scope, false, false, None);
        table.insert(pkg_scope, inner).unwrap();

        let k = table.new_const(AccessModifier::Private, "k", false, Some(pos(1)));
        table.insert(inner_scope, k).unwrap();

        assert_eq!(table.qualified_name(pkg, "::"), "app");
        assert_eq!(table.qualified_name(inner, "::"), "app::util");
        assert_eq!(table.qualified_name(k, "::"), "app::util::k");
        assert_eq!(table.qualified_name(k, "."), "app.util.k");
    }

    #[test]
    fn test_resolve_qualified() {
        let mut table = SymbolTable::new();
        let pkg = module(&mut table, "app", true);
        let pkg_scope = table.symbol(pkg).owned_scope().unwrap();
        let k = table.new_const(AccessModifier::Private, "k", false, Some(pos(1)));
        table.insert(pkg_scope, k).unwrap();

        assert_eq!(table.resolve_qualified("app::k", "::"), Some(k));
        assert_eq!(table.resolve_qualified("app", "::"), Some(pkg));
        assert_eq!(table.resolve_qualified("app::missing", "::"), None);
        assert_eq!(table.resolve_qualified("int", "::"), Some(table.builtins().int.0));
    }

    #[test]
    fn test_access_public_always_visible() {
        let mut table = SymbolTable::new();
        let a = module(&mut table, "a", true);
        let b = module(&mut table, "b", true);
        let b_scope = table.symbol(b).owned_scope().unwrap();
        let k = table.new_const(AccessModifier::Public, "k", false, Some(pos(1)));
        table.insert(b_scope, k).unwrap();

        assert!(table.has_access_to(a, k));
    }

    #[test]
    fn test_access_private_requires_same_module() {
        let mut table = SymbolTable::new();
        let a = module(&mut table, "a", true);
        let b = module(&mut table, "b", true);
        let b_scope = table.symbol(b).owned_scope().unwrap();
        let k = table.new_const(AccessModifier::Private, "k", false, Some(pos(1)));
        table.insert(b_scope, k).unwrap();

        assert!(!table.has_access_to(a, k));
        assert!(table.has_access_to(b, k));
    }

    #[test]
    fn test_access_internal_requires_same_package() {
        let mut table = SymbolTable::new();
        let pkg = module(&mut table, "app", true);
        let pkg_scope = table.symbol(pkg).owned_scope().unwrap();

        // Two sibling modules under the same package root.
        let x_scope = table.new_scope(Some(table.universe()), true);
        let x = table.new_module(AccessModifier::Public, "x", x_scope, false, false, None);
        table.insert(pkg_scope, x).unwrap();
        let y_scope = table.new_scope(Some(table.universe()), true);
        let y = table.new_module(AccessModifier::Public, "y", y_scope, false, false, None);
        table.insert(pkg_scope, y).unwrap();

        let k = table.new_const(AccessModifier::Internal, "k", false, Some(pos(1)));
        table.insert(x_scope, k).unwrap();

        assert!(table.has_access_to(y, k));

        // A module outside the package sees nothing.
        let other = module(&mut table, "other", true);
        assert!(!table.has_access_to(other, k));
    }

    #[test]
    fn test_access_protected_behaves_like_private() {
        let mut table = SymbolTable::new();
        let a = module(&mut table, "a", true);
        let b = module(&mut table, "b", true);
        let b_scope = table.symbol(b).owned_scope().unwrap();
        let k = table.new_const(AccessModifier::Protected, "k", false, Some(pos(1)));
        table.insert(b_scope, k).unwrap();

        assert!(!table.has_access_to(a, k));
        assert!(table.has_access_to(b, k));
    }
}
