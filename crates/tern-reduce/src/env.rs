//! Reduction environments.
//!
//! `EqualityEnv` holds the instance-provided associated-type
//! definitions, built once by the front end and shared read-only.
//! `RigidityEnv` records which variables are rigid -- looked up but
//! never substituted. `Scope` holds the region-bound variables of the
//! current reduction call; those behave rigidly while the region is
//! open.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ty::{AssocSym, Ty, TyVar};

/// One instance's definition of one associated type.
///
/// For `instance Container[List[v]] { type Elem = v }` this is
/// `tparams = [v]`, `receiver = List[v]`, `definition = v`.
#[derive(Clone, Debug)]
pub struct AssocInstance {
    /// The instance's own type parameters, freshened per match attempt.
    pub tparams: Vec<TyVar>,
    /// The receiver shape the instance covers.
    pub receiver: Ty,
    /// The instance-specific definition of the associated type.
    pub definition: Ty,
}

impl AssocInstance {
    pub fn new(tparams: Vec<TyVar>, receiver: Ty, definition: Ty) -> Self {
        AssocInstance { tparams, receiver, definition }
    }
}

/// Registry of associated-type definitions, keyed by symbol.
#[derive(Clone, Debug, Default)]
pub struct EqualityEnv {
    defs: FxHashMap<AssocSym, Vec<AssocInstance>>,
}

impl EqualityEnv {
    pub fn new() -> Self {
        EqualityEnv { defs: FxHashMap::default() }
    }

    /// Register one instance definition for `sym`.
    ///
    /// Candidates are tried in registration order; keeping instances
    /// non-overlapping is the front end's coherence obligation.
    pub fn add_instance(&mut self, sym: AssocSym, inst: AssocInstance) {
        self.defs.entry(sym).or_default().push(inst);
    }

    /// The candidate definitions for `sym`, in registration order.
    pub fn candidates(&self, sym: &AssocSym) -> &[AssocInstance] {
        self.defs.get(sym).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of registered instance definitions.
    pub fn len(&self) -> usize {
        self.defs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Which type variables are rigid.
///
/// Rigid variables are fixed points of reduction: unification may
/// compare them but never substitute them. Extension copies -- callers
/// hand the extended env down and keep their own unchanged.
#[derive(Clone, Debug, Default)]
pub struct RigidityEnv {
    rigid: FxHashSet<TyVar>,
}

impl RigidityEnv {
    pub fn new() -> Self {
        RigidityEnv { rigid: FxHashSet::default() }
    }

    /// Whether `var` is rigid: explicitly marked, or bound by `scope`.
    pub fn is_rigid(&self, var: TyVar, scope: &Scope) -> bool {
        self.rigid.contains(&var) || scope.is_bound(var)
    }

    /// A copy of this env with `var` marked rigid.
    pub fn mark_rigid(&self, var: TyVar) -> RigidityEnv {
        let mut next = self.clone();
        next.rigid.insert(var);
        next
    }

    /// A copy of this env with every variable in `vars` marked rigid.
    pub fn mark_all(&self, vars: impl IntoIterator<Item = TyVar>) -> RigidityEnv {
        let mut next = self.clone();
        next.rigid.extend(vars);
        next
    }
}

/// The region-bound type variables of the current reduction call.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    bound: FxHashSet<TyVar>,
}

impl Scope {
    /// The top-level scope: no region variables.
    pub fn top() -> Self {
        Scope { bound: FxHashSet::default() }
    }

    /// A copy of this scope with `var` bound.
    pub fn enter(&self, var: TyVar) -> Scope {
        let mut next = self.clone();
        next.bound.insert(var);
        next
    }

    pub fn is_bound(&self, var: TyVar) -> bool {
        self.bound.contains(&var)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
