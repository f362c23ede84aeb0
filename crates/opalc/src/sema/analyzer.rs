//! Two-pass semantic analyzer
//!
//! Pass 1 registers every declaration in the symbol table; pass 2 resolves
//! names, checks types and enforces access rules. Pass 1 runs for all
//! modules, in dependency order, before pass 2 starts for any of them, so a
//! module may reference symbols of its dependencies freely.

use tracing::trace;

use crate::ast::{
    AccessModifier, BinaryOp, Block, ConstDecl, Decl, EnumDecl, Expr, ExprKind, FnDecl, ModuleDecl,
    SourceModule, Stmt, TypeExpr, TypeExprKind, UnaryOp, VarDecl, WhileStmt,
};
use crate::common::{Diagnostics, Pos};

use super::scope::{DuplicateSymbol, SymbolTable};
use super::symbol::{
    EnumField, EnumInfo, FunctionArg, ObjectLevel, ScopeId, SymbolId, SymbolKind, Ty, TypeInfo,
    TypeKind,
};

/// Hard ceiling on the number of symbols held directly by one function
/// scope (arguments plus top-level locals).
const MAX_FN_LOCALS: usize = 200;

/// Walks the declaration trees twice, mutating the shared scope tree in
/// strict pre-order with explicit save/restore of the current
/// module/symbol/scope around every nested declaration.
pub struct Analyzer<'a> {
    table: &'a mut SymbolTable,
    diags: &'a mut Diagnostics,
    first_pass: bool,
    cur_mod: Option<SymbolId>,
    cur_sym: Option<SymbolId>,
    cur_scope: ScopeId,
}

impl<'a> Analyzer<'a> {
    pub fn new(table: &'a mut SymbolTable, diags: &'a mut Diagnostics) -> Self {
        let universe = table.universe();
        Self {
            table,
            diags,
            first_pass: true,
            cur_mod: None,
            cur_sym: None,
            cur_scope: universe,
        }
    }

    /// Run both passes. `modules` must already be in dependency order with
    /// their module symbols registered (the driver's job).
    pub fn check_modules(&mut self, modules: &mut [SourceModule]) {
        self.first_pass = true;
        for module in modules.iter_mut() {
            self.check_module(module);
        }
        self.first_pass = false;
        for module in modules.iter_mut() {
            self.check_module(module);
        }
    }

    fn check_module(&mut self, module: &mut SourceModule) {
        let Some(mod_sym) = module.sym else { return };
        trace!(module = %module.name, first_pass = self.first_pass, "checking module");
        self.cur_mod = Some(mod_sym);
        self.cur_sym = Some(mod_sym);
        if let Some(scope) = self.table.symbol(mod_sym).owned_scope() {
            self.cur_scope = scope;
        }
        self.check_decls(&mut module.decls);
    }

    fn check_decls(&mut self, decls: &mut [Decl]) {
        for decl in decls {
            self.check_decl(decl);
        }
    }

    fn check_decl(&mut self, decl: &mut Decl) {
        match decl {
            Decl::Module(d) => self.check_module_decl(d),
            Decl::Enum(d) => self.check_enum_decl(d),
            Decl::Fn(d) => self.check_fn_decl(d),
            Decl::Const(d) => self.check_const_decl(d),
            Decl::Var(d) => self.check_var_decl(d),
        }
    }

    fn check_module_decl(&mut self, decl: &mut ModuleDecl) {
        if !decl.is_inline {
            // Imports: the driver associates `sym` with the loaded module,
            // whose declarations are checked when its own tree is visited.
            return;
        }
        let old_mod = self.cur_mod;
        let old_sym = self.cur_sym;
        let old_scope = self.cur_scope;
        if self.first_pass {
            let scope = self.table.new_scope(Some(self.cur_scope), true);
            let sym = self.table.new_module(
                decl.access,
                &decl.name,
                scope,
                false,
                true,
                Some(decl.pos.clone()),
            );
            decl.sym = Some(sym);
            self.add_sym(sym, &decl.pos);
            self.cur_mod = Some(sym);
            self.cur_sym = Some(sym);
            self.cur_scope = scope;
            self.check_decls(&mut decl.decls);
            self.cur_mod = old_mod;
            self.cur_sym = old_sym;
            self.cur_scope = old_scope;
            return;
        }
        if let Some(sym) = decl.sym {
            self.cur_mod = Some(sym);
            self.cur_sym = Some(sym);
            if let Some(scope) = self.table.symbol(sym).owned_scope() {
                self.cur_scope = scope;
            }
            self.check_decls(&mut decl.decls);
            self.cur_mod = old_mod;
            self.cur_sym = old_sym;
            self.cur_scope = old_scope;
        }
    }

    fn check_enum_decl(&mut self, decl: &mut EnumDecl) {
        let old_sym = self.cur_sym;
        let old_scope = self.cur_scope;
        if self.first_pass {
            let fields = decl
                .fields
                .iter()
                .enumerate()
                .map(|(ordinal, field)| EnumField {
                    name: self.table.intern(&field.name),
                    ordinal,
                })
                .collect();
            let scope = self.table.new_scope(Some(self.cur_scope), false);
            let sym = self.table.new_type(
                decl.access,
                TypeKind::Enum,
                &decl.name,
                scope,
                TypeInfo::Enum(EnumInfo { fields }),
                Some(decl.pos.clone()),
            );
            decl.sym = Some(sym);
            self.add_sym(sym, &decl.pos);
            self.cur_sym = Some(sym);
            self.cur_scope = scope;
            self.check_decls(&mut decl.decls);
            self.cur_sym = old_sym;
            self.cur_scope = old_scope;
            return;
        }
        // Deferred structural check: field count is known at parse time but
        // non-structural diagnostics belong to pass 2.
        if decl.fields.is_empty() {
            self.diags
                .error(format!("enum `{}` cannot be empty", decl.name), decl.pos.clone());
        }
        if let Some(sym) = decl.sym {
            self.cur_sym = Some(sym);
            if let Some(scope) = self.table.symbol(sym).owned_scope() {
                self.cur_scope = scope;
            }
            self.check_decls(&mut decl.decls);
            self.cur_sym = old_sym;
            self.cur_scope = old_scope;
        }
    }

    fn check_fn_decl(&mut self, decl: &mut FnDecl) {
        let old_sym = self.cur_sym;
        let old_scope = self.cur_scope;
        if self.first_pass {
            let args = decl
                .args
                .iter()
                .map(|arg| FunctionArg {
                    name: self.table.intern(&arg.name),
                    ty: None,
                    has_default: arg.default.is_some(),
                })
                .collect();
            let scope = self.table.new_scope(Some(self.cur_scope), true);
            let sym = self.table.new_function(
                decl.access,
                &decl.name,
                args,
                scope,
                Some(decl.pos.clone()),
            );
            decl.sym = Some(sym);
            self.add_sym(sym, &decl.pos);
            self.cur_sym = Some(sym);
            self.cur_scope = scope;
            for arg in &decl.args {
                let obj = self.table.new_object(
                    AccessModifier::Private,
                    &arg.name,
                    ObjectLevel::Argument,
                    Some(arg.pos.clone()),
                );
                self.add_sym(obj, &arg.pos);
            }
            for arg in &mut decl.args {
                if let Some(default) = &mut arg.default {
                    self.scan_expr(default);
                }
            }
            if let Some(body) = &mut decl.body {
                self.check_stmts(body);
            }
            self.cur_sym = old_sym;
            self.cur_scope = old_scope;
            if self.table.scope(scope).len() > MAX_FN_LOCALS {
                self.diags.error(
                    format!(
                        "function `{}` exceeded the maximum number of local variables allowed ({MAX_FN_LOCALS})",
                        decl.name
                    ),
                    decl.pos.clone(),
                );
            }
            return;
        }
        let Some(sym) = decl.sym else { return };
        let fn_scope = self.table.symbol(sym).owned_scope();
        for (index, arg) in decl.args.iter().enumerate() {
            if let Some(annotation) = &arg.ty {
                let ty = self.resolve_type_expr(annotation);
                self.table.set_function_arg_ty(sym, index, ty);
                if let Some(scope) = fn_scope {
                    if let Some(obj) = self.table.find(scope, &arg.name) {
                        self.table.set_object_ty(obj, ty);
                    }
                }
            }
        }
        if let Some(annotation) = &decl.ret {
            let ret = self.resolve_type_expr(annotation);
            self.table.set_function_ret(sym, ret);
        }
        self.cur_sym = Some(sym);
        if let Some(scope) = fn_scope {
            self.cur_scope = scope;
        }
        for arg in &mut decl.args {
            if let Some(default) = &mut arg.default {
                self.check_expr(default);
            }
        }
        if let Some(body) = &mut decl.body {
            self.check_stmts(body);
        }
        self.cur_sym = old_sym;
        self.cur_scope = old_scope;
    }

    fn check_const_decl(&mut self, decl: &mut ConstDecl) {
        if self.first_pass {
            let is_local = self.in_function();
            if is_local && decl.access != AccessModifier::Private {
                self.diags
                    .error("local constants cannot have access modifier", decl.pos.clone());
            }
            let sym = self
                .table
                .new_const(decl.access, &decl.name, is_local, Some(decl.pos.clone()));
            decl.sym = Some(sym);
            self.add_sym(sym, &decl.pos);
            self.scan_expr(&mut decl.init);
            return;
        }
        let init_ty = self.check_expr(&mut decl.init);
        if let Some(sym) = decl.sym {
            let ty = match &decl.ty {
                Some(annotation) => self.resolve_type_expr(annotation),
                None => init_ty,
            };
            self.table.set_const_ty(sym, ty);
        }
    }

    fn check_var_decl(&mut self, decl: &mut VarDecl) {
        if self.first_pass {
            let is_local = self.in_function();
            let level = if is_local { ObjectLevel::Local } else { ObjectLevel::Static };
            for left in &mut decl.lefts {
                if is_local && decl.access != AccessModifier::Private {
                    self.diags
                        .error("local variables cannot have access modifier", left.pos.clone());
                }
                let sym = self.table.new_object(
                    decl.access,
                    &left.name,
                    level,
                    Some(decl.pos.clone()),
                );
                left.sym = Some(sym);
                self.add_sym(sym, &left.pos);
            }
            if let Some(init) = &mut decl.init {
                self.scan_expr(init);
            }
            return;
        }
        let init_ty = decl.init.as_mut().map(|init| self.check_expr(init));
        let single = decl.lefts.len() == 1;
        for left in &mut decl.lefts {
            let Some(sym) = left.sym else { continue };
            if let Some(annotation) = &left.ty {
                let ty = self.resolve_type_expr(annotation);
                self.table.set_object_ty(sym, ty);
            } else if single {
                if let Some(ty) = init_ty {
                    self.table.set_object_ty(sym, ty);
                }
            }
        }
    }

    // === Statements ===================================

    fn check_stmts(&mut self, stmts: &mut [Stmt]) {
        for stmt in stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Expr(expr) => {
                let ty = self.check_expr(expr);
                if ty != self.table.builtins().void {
                    self.diags
                        .warn("expression evaluated but not used", expr.pos.clone());
                }
            }
            Stmt::Const(decl) => self.check_const_decl(decl),
            Stmt::Var(decl) => self.check_var_decl(decl),
            Stmt::While(stmt) => self.check_while_stmt(stmt),
        }
    }

    fn check_while_stmt(&mut self, stmt: &mut WhileStmt) {
        if self.first_pass {
            self.scan_expr(&mut stmt.cond);
            self.check_stmts(&mut stmt.body);
            return;
        }
        let cond_ty = self.check_expr(&mut stmt.cond);
        if cond_ty != self.table.builtins().bool {
            let pos = stmt.cond.pos.clone();
            self.diags.error(
                format!("expected `bool` condition, found `{}`", self.table.ty_name(cond_ty)),
                pos,
            );
        }
        self.check_stmts(&mut stmt.body);
    }

    // === Expressions ==================================

    /// Pass 1: structural walk only. Opens block scopes and registers local
    /// declarations, without computing types.
    fn scan_expr(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Nil
            | ExprKind::Bool(_)
            | ExprKind::Number(_)
            | ExprKind::Str(_)
            | ExprKind::Ident { .. } => {}
            ExprKind::Paren(inner) => self.scan_expr(inner),
            ExprKind::Path { left, .. } => self.scan_expr(left),
            ExprKind::Call { callee, args } => {
                self.scan_expr(callee);
                for arg in args {
                    self.scan_expr(arg);
                }
            }
            ExprKind::Unary { expr: operand, .. } => self.scan_expr(operand),
            ExprKind::Binary { left, right, .. } => {
                self.scan_expr(left);
                self.scan_expr(right);
            }
            ExprKind::If { branches } => {
                for branch in branches {
                    if let Some(cond) = &mut branch.cond {
                        self.scan_expr(cond);
                    }
                    self.scan_expr(&mut branch.body);
                }
            }
            ExprKind::Block(block) => self.scan_block(block),
            ExprKind::Assign { lefts, right, .. } => {
                for left in lefts {
                    self.scan_expr(left);
                }
                self.scan_expr(right);
            }
            ExprKind::Return(inner) => {
                if let Some(inner) = inner {
                    self.scan_expr(inner);
                }
            }
        }
    }

    fn scan_block(&mut self, block: &mut Block) {
        let scope = self.table.new_scope(Some(self.cur_scope), false);
        block.scope = Some(scope);
        let old_scope = self.cur_scope;
        self.cur_scope = scope;
        self.check_stmts(&mut block.stmts);
        if let Some(tail) = &mut block.tail {
            self.scan_expr(tail);
        }
        self.cur_scope = old_scope;
    }

    /// Pass 2: compute and memoize the expression's type. Pass 1 delegates
    /// to the structural walk and reports everything as `void`.
    fn check_expr(&mut self, expr: &mut Expr) -> Ty {
        if self.first_pass {
            self.scan_expr(expr);
            return self.table.builtins().void;
        }
        if let Some(ty) = expr.ty {
            return ty;
        }
        let pos = expr.pos.clone();
        let ty = match &mut expr.kind {
            ExprKind::Paren(inner) => self.check_expr(inner),
            ExprKind::Nil => self.table.builtins().nil,
            ExprKind::Bool(_) => self.table.builtins().bool,
            ExprKind::Str(_) => self.table.builtins().string,
            ExprKind::Number(value) => self.number_literal_ty(value),
            ExprKind::Ident { name, sym } => {
                let (resolved, ty) = self.resolve_ident(name, &pos);
                *sym = resolved;
                ty
            }
            ExprKind::Path { left, name, sym } => {
                let (resolved, ty) = self.check_path(left, name, &pos);
                *sym = resolved;
                ty
            }
            ExprKind::Call { callee, args } => {
                self.check_expr(callee);
                for arg in args.iter_mut() {
                    self.check_expr(arg);
                }
                let callee_sym = match &callee.kind {
                    ExprKind::Ident { sym, .. } | ExprKind::Path { sym, .. } => *sym,
                    _ => None,
                };
                self.call_result_ty(callee_sym)
            }
            ExprKind::Unary { op, expr: operand } => {
                let op = *op;
                let operand_ty = self.check_expr(operand);
                self.check_unary_operand(op, operand_ty, &pos);
                // Error recovery: the expression keeps the operand's type.
                operand_ty
            }
            ExprKind::Binary { left, op, right } => {
                let op = *op;
                let left_ty = self.check_expr(left);
                let right_ty = self.check_expr(right);
                self.check_binary_operands(op, left_ty, right_ty, &pos);
                if op.is_relational() {
                    self.table.builtins().bool
                } else {
                    left_ty
                }
            }
            ExprKind::If { branches } => {
                let bool_ty = self.table.builtins().bool;
                let mut result = None;
                for branch in branches.iter_mut() {
                    if let Some(cond) = &mut branch.cond {
                        let cond_ty = self.check_expr(cond);
                        if cond_ty != bool_ty {
                            let cond_pos = cond.pos.clone();
                            self.diags.error(
                                format!(
                                    "expected `bool` condition, found `{}`",
                                    self.table.ty_name(cond_ty)
                                ),
                                cond_pos,
                            );
                        }
                    }
                    let branch_ty = self.check_expr(&mut branch.body);
                    // No cross-branch unification: the first branch decides.
                    if result.is_none() {
                        result = Some(branch_ty);
                    }
                }
                result.unwrap_or(self.table.builtins().void)
            }
            ExprKind::Block(block) => self.check_block(block),
            ExprKind::Assign { right, .. } => {
                self.check_expr(right);
                self.table.builtins().void
            }
            ExprKind::Return(inner) => {
                if let Some(inner) = inner {
                    self.check_expr(inner);
                }
                self.table.builtins().void
            }
        };
        expr.ty = Some(ty);
        ty
    }

    fn check_block(&mut self, block: &mut Block) -> Ty {
        let old_scope = self.cur_scope;
        if let Some(scope) = block.scope {
            self.cur_scope = scope;
        }
        self.check_stmts(&mut block.stmts);
        let ty = match &mut block.tail {
            Some(tail) => self.check_expr(tail),
            None => self.table.builtins().void,
        };
        self.cur_scope = old_scope;
        ty
    }

    fn number_literal_ty(&self, value: &str) -> Ty {
        let builtins = self.table.builtins();
        let has_float_marker = value.contains(['.', 'e', 'E']);
        let prefix = value.get(..2).map(str::to_ascii_lowercase);
        let radix_prefixed = matches!(prefix.as_deref(), Some("0x" | "0o" | "0b"));
        // The radix prefix wins: `0x1.8` is an int literal.
        if has_float_marker && !radix_prefixed {
            builtins.float
        } else {
            builtins.int
        }
    }

    fn call_result_ty(&self, callee: Option<SymbolId>) -> Ty {
        let void = self.table.builtins().void;
        let Some(callee) = callee else { return void };
        match &self.table.symbol(callee).kind {
            SymbolKind::Function { ret, .. } => (*ret).unwrap_or(void),
            _ => void,
        }
    }

    fn check_unary_operand(&mut self, op: UnaryOp, ty: Ty, pos: &Pos) {
        let builtins = *self.table.builtins();
        match op {
            UnaryOp::Not if ty != builtins.bool => self.diags.error_with_notes(
                format!("operator `!` is not defined for type `{}`", self.table.ty_name(ty)),
                pos.clone(),
                vec!["operator `!` is only defined for type `bool`".to_string()],
            ),
            UnaryOp::Neg if ty != builtins.int && ty != builtins.float => {
                self.diags.error_with_notes(
                    format!("operator `-` is not defined for type `{}`", self.table.ty_name(ty)),
                    pos.clone(),
                    vec!["operator `-` is only defined for `int` and `float` types".to_string()],
                );
            }
            UnaryOp::BitNot if ty != builtins.int => self.diags.error_with_notes(
                format!("operator `~` is not defined for type `{}`", self.table.ty_name(ty)),
                pos.clone(),
                vec!["operator `~` is only defined for type `int`".to_string()],
            ),
            _ => {}
        }
    }

    fn check_binary_operands(&mut self, op: BinaryOp, left: Ty, right: Ty, pos: &Pos) {
        if !matches!(op, BinaryOp::And | BinaryOp::Or) {
            return;
        }
        let bool_ty = self.table.builtins().bool;
        let offending = if left != bool_ty {
            Some(left)
        } else if right != bool_ty {
            Some(right)
        } else {
            None
        };
        if let Some(ty) = offending {
            self.diags.error_with_notes(
                format!("operator `{op}` is not defined for type `{}`", self.table.ty_name(ty)),
                pos.clone(),
                vec![format!("operator `{op}` is only defined for type `bool`")],
            );
        }
    }

    // === Symbols ======================================

    fn resolve_ident(&mut self, name: &str, pos: &Pos) -> (Option<SymbolId>, Ty) {
        let void = self.table.builtins().void;
        let Some(sym) = self.lookup_symbol(name) else {
            self.diags
                .error(format!("cannot find symbol `{name}` in this scope"), pos.clone());
            return (None, void);
        };
        self.check_declaration_order(sym, name, pos);
        (Some(sym), self.table.type_of(sym).unwrap_or(void))
    }

    /// Identifier resolution order: the lexical chain from the current
    /// position, then the current declaration's own scope (forward
    /// references to sibling members), then the enclosing module's scope.
    fn lookup_symbol(&self, name: &str) -> Option<SymbolId> {
        if let Some(sym) = self.table.lookup(self.cur_scope, name) {
            return Some(sym);
        }
        if let Some(scope) = self.cur_sym.and_then(|sym| self.table.symbol(sym).owned_scope()) {
            if let Some(sym) = self.table.lookup(scope, name) {
                return Some(sym);
            }
        }
        if let Some(scope) = self.cur_mod.and_then(|sym| self.table.symbol(sym).owned_scope()) {
            if let Some(sym) = self.table.lookup(scope, name) {
                return Some(sym);
            }
        }
        None
    }

    /// The line-order rule applies to every positioned symbol kind, hoisted
    /// declarations included; built-ins and file modules carry no position
    /// and are exempt.
    fn check_declaration_order(&mut self, sym: SymbolId, name: &str, use_pos: &Pos) {
        let symbol = self.table.symbol(sym);
        let Some(decl_pos) = &symbol.pos else { return };
        if decl_pos.line > use_pos.line {
            let kind = symbol.kind_name();
            self.diags.error(
                format!("{kind} `{name}` is used before its declaration"),
                use_pos.clone(),
            );
        }
    }

    fn check_path(&mut self, left: &mut Expr, name: &str, pos: &Pos) -> (Option<SymbolId>, Ty) {
        let void = self.table.builtins().void;
        self.check_expr(left);
        let left_sym = match &left.kind {
            ExprKind::Ident { sym, .. } | ExprKind::Path { sym, .. } => *sym,
            _ => None,
        };
        // Resolution of the left side already reported its own failure.
        let Some(left_sym) = left_sym else { return (None, void) };
        let Some(scope) = self.table.symbol(left_sym).owned_scope() else {
            self.diags.error(
                format!(
                    "cannot find symbol `{name}` in {} `{}`",
                    self.table.symbol(left_sym).kind_name(),
                    self.table.display_name(left_sym)
                ),
                pos.clone(),
            );
            return (None, void);
        };
        // Qualified names search the target's own scope, not the chain.
        let Some(target) = self.table.find(scope, name) else {
            self.diags.error(
                format!(
                    "cannot find symbol `{name}` in {} `{}`",
                    self.table.symbol(left_sym).kind_name(),
                    self.table.display_name(left_sym)
                ),
                pos.clone(),
            );
            return (None, void);
        };
        if let Some(from) = self.cur_sym {
            if !self.table.has_access_to(from, target) {
                self.diags.error(
                    format!(
                        "{} `{}` is private",
                        self.table.symbol(target).kind_name(),
                        self.table.qualified_name(target, "::")
                    ),
                    pos.clone(),
                );
            }
        }
        // The type is assigned even on an access violation, so downstream
        // checks do not cascade.
        (Some(target), self.table.type_of(target).unwrap_or(void))
    }

    fn resolve_type_expr(&mut self, annotation: &TypeExpr) -> Ty {
        let void = self.table.builtins().void;
        match &annotation.kind {
            TypeExprKind::Named(name) => {
                // Module scopes are detached from the universe, so built-in
                // type names need the explicit universe fallback.
                let found = self
                    .lookup_symbol(name)
                    .or_else(|| self.table.find(self.table.universe(), name));
                let Some(sym) = found else {
                    self.diags.error(
                        format!("cannot find type `{name}` in this scope"),
                        annotation.pos.clone(),
                    );
                    return void;
                };
                if matches!(self.table.symbol(sym).kind, SymbolKind::Type { .. }) {
                    Ty(sym)
                } else {
                    void
                }
            }
            TypeExprKind::Path(segments) => {
                let mut segments = segments.iter();
                let Some(first) = segments.next() else { return void };
                let found = self
                    .lookup_symbol(first)
                    .or_else(|| self.table.find(self.table.universe(), first));
                let Some(mut current) = found else {
                    self.diags.error(
                        format!("cannot find symbol `{first}` in this scope"),
                        annotation.pos.clone(),
                    );
                    return void;
                };
                for segment in segments {
                    let next = self
                        .table
                        .symbol(current)
                        .owned_scope()
                        .and_then(|scope| self.table.find(scope, segment));
                    let Some(next) = next else {
                        self.diags.error(
                            format!(
                                "cannot find symbol `{segment}` in {} `{}`",
                                self.table.symbol(current).kind_name(),
                                self.table.display_name(current)
                            ),
                            annotation.pos.clone(),
                        );
                        return void;
                    };
                    current = next;
                }
                if matches!(self.table.symbol(current).kind, SymbolKind::Type { .. }) {
                    Ty(current)
                } else {
                    void
                }
            }
        }
    }

    // === Utilities ====================================

    fn in_function(&self) -> bool {
        self.cur_sym
            .is_some_and(|sym| matches!(self.table.symbol(sym).kind, SymbolKind::Function { .. }))
    }

    fn add_sym(&mut self, sym: SymbolId, pos: &Pos) {
        if let Err(DuplicateSymbol { existing }) = self.table.insert(self.cur_scope, sym) {
            self.report_duplicate(sym, existing, pos);
        }
    }

    fn report_duplicate(&mut self, sym: SymbolId, existing: SymbolId, pos: &Pos) {
        let name = self.table.symbol_name(sym).to_string();
        let message = match self.table.scope(self.cur_scope).owner {
            Some(owner) => format!(
                "duplicate symbol `{name}` in {} `{}`",
                self.table.symbol(owner).kind_name(),
                self.table.display_name(owner)
            ),
            None => format!("duplicate symbol `{name}` in global namespace"),
        };
        let existing_sym = self.table.symbol(existing);
        let same_kind = std::mem::discriminant(&existing_sym.kind)
            == std::mem::discriminant(&self.table.symbol(sym).kind);
        let note = if same_kind {
            if matches!(
                existing_sym.kind,
                SymbolKind::Object { level: ObjectLevel::Argument, .. }
            ) {
                "another argument with the same name was already declared previously".to_string()
            } else {
                format!(
                    "another {} with the same name was defined before",
                    existing_sym.kind_name()
                )
            }
        } else {
            format!(
                "a {} with the same name has already been defined",
                existing_sym.kind_name()
            )
        };
        self.diags.error_with_notes(message, pos.clone(), vec![note]);
    }
}
