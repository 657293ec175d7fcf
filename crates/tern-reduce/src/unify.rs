//! Eager unification for instance matching.
//!
//! Associated-type reduction matches a concrete receiver against an
//! instance's receiver shape. Each attempt runs in a throwaway
//! `Unifier` built over `ena`'s union-find table: unify the freshened
//! shape against the receiver, then read results back out through
//! `resolve`. Rigid variables (and scope-bound ones) never bind, so
//! substitution flows from the instance into the receiver only.

use ena::unify::InPlaceUnificationTable;

use crate::env::{RigidityEnv, Scope};
use crate::ty::{JvmQuery, Ty, TyVar};

/// Why a unification attempt failed.
///
/// Callers fold every case into "no match"; the distinction exists for
/// tests and trace output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnifyError {
    /// Structurally incompatible types.
    Mismatch { left: Ty, right: Ty },
    /// Binding would create an infinite type.
    OccursCheck { var: TyVar, ty: Ty },
    /// A rigid variable would have to change.
    RigidBind { var: TyVar, ty: Ty },
}

/// A single unification attempt's state.
pub struct Unifier<'e> {
    table: InPlaceUnificationTable<TyVar>,
    scope: &'e Scope,
    renv: &'e RigidityEnv,
}

impl<'e> Unifier<'e> {
    pub fn new(scope: &'e Scope, renv: &'e RigidityEnv) -> Self {
        Unifier { table: InPlaceUnificationTable::new(), scope, renv }
    }

    fn is_rigid(&self, var: TyVar) -> bool {
        self.renv.is_rigid(var, self.scope)
    }

    /// Grow the table until `var` has a slot.
    ///
    /// Variables arrive with ids minted elsewhere; `ena` indexes keys
    /// by id, so every id must be backed before it is probed or bound.
    fn ensure_var(&mut self, var: TyVar) {
        while (self.table.len() as u32) <= var.0 {
            self.table.new_key(None);
        }
    }

    // ── Resolution ──────────────────────────────────────────────────────

    /// Resolve a type by following union-find indirection.
    ///
    /// Bound variables are replaced by their values recursively;
    /// unbound variables normalize to their root key so unified
    /// variables read back identically. Compound types are rebuilt
    /// with resolved components.
    pub fn resolve(&mut self, ty: Ty) -> Ty {
        match ty {
            Ty::Var(v, kind) => {
                self.ensure_var(v);
                match self.table.probe_value(v) {
                    Some(inner) => self.resolve(inner),
                    None => {
                        let root = self.table.find(v);
                        Ty::Var(root, kind)
                    }
                }
            }
            Ty::Cst(_) => ty,
            Ty::Apply(f, a) => {
                let f = Box::new(self.resolve(*f));
                let a = Box::new(self.resolve(*a));
                Ty::Apply(f, a)
            }
            Ty::Alias { name, args, expanded } => {
                let args = args.into_iter().map(|t| self.resolve(t)).collect();
                let expanded = Box::new(self.resolve(*expanded));
                Ty::Alias { name, args, expanded }
            }
            Ty::Assoc { sym, arg, kind } => {
                let arg = Box::new(self.resolve(*arg));
                Ty::Assoc { sym, arg, kind }
            }
            Ty::UnresolvedJvm(query) => {
                let query = match *query {
                    JvmQuery::Constructor { class, args } => JvmQuery::Constructor {
                        class,
                        args: args.into_iter().map(|t| self.resolve(t)).collect(),
                    },
                    JvmQuery::Method { receiver, name, args, is_static } => JvmQuery::Method {
                        receiver: self.resolve(receiver),
                        name,
                        args: args.into_iter().map(|t| self.resolve(t)).collect(),
                        is_static,
                    },
                    JvmQuery::Field { receiver, name } => JvmQuery::Field {
                        receiver: self.resolve(receiver),
                        name,
                    },
                };
                Ty::UnresolvedJvm(Box::new(query))
            }
            Ty::JvmToType(inner) => Ty::JvmToType(Box::new(self.resolve(*inner))),
            Ty::JvmToEff(inner) => Ty::JvmToEff(Box::new(self.resolve(*inner))),
        }
    }

    // ── Occurs Check ────────────────────────────────────────────────────

    /// Whether `var` occurs anywhere within `ty`, following bindings.
    pub fn occurs_in(&mut self, var: TyVar, ty: &Ty) -> bool {
        match ty {
            Ty::Var(v, _) => {
                if *v == var {
                    return true;
                }
                self.ensure_var(*v);
                match self.table.probe_value(*v) {
                    Some(inner) => self.occurs_in(var, &inner),
                    None => false,
                }
            }
            Ty::Cst(_) => false,
            Ty::Apply(f, a) => self.occurs_in(var, f) || self.occurs_in(var, a),
            Ty::Alias { args, expanded, .. } => {
                args.iter().any(|t| self.occurs_in(var, t)) || self.occurs_in(var, expanded)
            }
            Ty::Assoc { arg, .. } => self.occurs_in(var, arg),
            Ty::UnresolvedJvm(query) => match query.as_ref() {
                JvmQuery::Constructor { args, .. } => {
                    args.iter().any(|t| self.occurs_in(var, t))
                }
                JvmQuery::Method { receiver, args, .. } => {
                    self.occurs_in(var, receiver) || args.iter().any(|t| self.occurs_in(var, t))
                }
                JvmQuery::Field { receiver, .. } => self.occurs_in(var, receiver),
            },
            Ty::JvmToType(inner) | Ty::JvmToEff(inner) => self.occurs_in(var, inner),
        }
    }

    // ── Unification ─────────────────────────────────────────────────────

    /// Unify two types, making them equal.
    ///
    /// Both sides are resolved first, then compared structurally.
    /// Flexible variables bind (with occurs check); rigid variables
    /// only ever match themselves. Aliases unify through their
    /// expansion. Unreduced projections and member queries never
    /// unify -- instance shapes contain none, so meeting one is a
    /// mismatch.
    pub fn unify(&mut self, a: Ty, b: Ty) -> Result<(), UnifyError> {
        let a = self.resolve(a);
        let b = self.resolve(b);

        match (a, b) {
            // Two identical variables -- already unified.
            (Ty::Var(v1, _), Ty::Var(v2, _)) if v1 == v2 => Ok(()),

            (Ty::Var(v1, k1), Ty::Var(v2, k2)) => {
                match (self.is_rigid(v1), self.is_rigid(v2)) {
                    // Both flexible -- union them.
                    (false, false) => {
                        self.table
                            .unify_var_var(v1, v2)
                            .expect("unifying two unbound vars should not fail");
                        Ok(())
                    }
                    // One rigid -- bind the flexible side to it.
                    (false, true) => self.bind(v1, Ty::Var(v2, k2)),
                    (true, false) => self.bind(v2, Ty::Var(v1, k1)),
                    // Distinct rigid variables never unify.
                    (true, true) => Err(UnifyError::RigidBind { var: v1, ty: Ty::Var(v2, k2) }),
                }
            }

            // A rigid variable sees through aliases -- the expansion may
            // be the variable itself.
            (Ty::Var(v, k), Ty::Alias { expanded, .. })
            | (Ty::Alias { expanded, .. }, Ty::Var(v, k))
                if self.is_rigid(v) =>
            {
                self.unify(Ty::Var(v, k), *expanded)
            }

            // Variable meets a non-variable type. Flexible variables
            // bind to alias nodes whole, keeping the name in results.
            (Ty::Var(v, _), ty) | (ty, Ty::Var(v, _)) => {
                if self.is_rigid(v) {
                    Err(UnifyError::RigidBind { var: v, ty })
                } else {
                    self.bind(v, ty)
                }
            }

            // Aliases are structurally transparent.
            (Ty::Alias { expanded, .. }, other) => self.unify(*expanded, other),
            (other, Ty::Alias { expanded, .. }) => self.unify(other, *expanded),

            (Ty::Cst(c1), Ty::Cst(c2)) => {
                if c1 == c2 {
                    Ok(())
                } else {
                    Err(UnifyError::Mismatch { left: Ty::Cst(c1), right: Ty::Cst(c2) })
                }
            }

            // Applications decompose pairwise.
            (Ty::Apply(f1, a1), Ty::Apply(f2, a2)) => {
                self.unify(*f1, *f2)?;
                self.unify(*a1, *a2)
            }

            // Everything else (including projections and member
            // queries on either side) is a mismatch.
            (a, b) => Err(UnifyError::Mismatch { left: a, right: b }),
        }
    }

    /// Bind a flexible variable to a type, with occurs check.
    fn bind(&mut self, var: TyVar, ty: Ty) -> Result<(), UnifyError> {
        if self.occurs_in(var, &ty) {
            return Err(UnifyError::OccursCheck { var, ty });
        }
        self.ensure_var(var);
        self.table
            .unify_var_value(var, Some(ty))
            .expect("binding an unbound var after occurs check should not fail");
        Ok(())
    }
}

/// Unify `a` against `b` in a fresh table.
///
/// `Some(unifier)` carries the substitution on success; apply it by
/// resolving types through the returned unifier. `None` is failure of
/// any kind -- callers treat all failures as "no match".
pub fn fully_unify<'e>(
    a: Ty,
    b: Ty,
    scope: &'e Scope,
    renv: &'e RigidityEnv,
) -> Option<Unifier<'e>> {
    let mut unifier = Unifier::new(scope, renv);
    match unifier.unify(a, b) {
        Ok(()) => Some(unifier),
        Err(_) => None,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
