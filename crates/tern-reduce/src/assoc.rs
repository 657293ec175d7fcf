//! Associated-type projection through the equality environment.
//!
//! A projection `Trait.Name[receiver]` reduces by instance matching:
//! find the registered instance whose receiver shape unifies with the
//! concrete receiver, then substitute the receiver's pieces into the
//! instance's definition. Dispatch runs backwards relative to normal
//! inference -- the receiver is the given, the instance is the
//! unknown -- so the receiver's free variables are pinned rigid for
//! the attempt and only the instance's freshened parameters may bind.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::env::{AssocInstance, EqualityEnv, RigidityEnv, Scope};
use crate::member::is_known;
use crate::ty::{AssocSym, JvmQuery, Ty, TyVar};
use crate::unify::fully_unify;

/// Reduce `sym[receiver]` one step, or `None` when no instance
/// currently matches.
///
/// The receiver must already be fully known; a projection over a
/// receiver that still contains flexible variables or unreduced nodes
/// is left for a later sweep. Candidates are tried in registration
/// order and the first match wins -- instance coherence upstream
/// guarantees at most one can match.
pub fn reduce_assoc(
    eq_env: &EqualityEnv,
    sym: &AssocSym,
    receiver: &Ty,
    scope: &Scope,
    renv: &RigidityEnv,
) -> Option<Ty> {
    if !is_known(receiver, scope, renv) {
        return None;
    }

    // Substitution must flow from the instance into the receiver,
    // never backwards: pin every variable still free in the receiver
    // before unifying.
    let local_renv = renv.mark_all(receiver.vars());

    for inst in eq_env.candidates(sym) {
        if let Some(result) = try_instance(inst, receiver, scope, &local_renv) {
            trace!("reduced {}[{}] to {}", sym, receiver, result);
            return Some(result);
        }
    }
    None
}

/// Match one instance: freshen its parameters, unify its receiver
/// shape against the receiver, and read the definition back through
/// the resulting substitution.
fn try_instance(
    inst: &AssocInstance,
    receiver: &Ty,
    scope: &Scope,
    renv: &RigidityEnv,
) -> Option<Ty> {
    // One renaming shared by shape and definition, so the bindings the
    // shape picks up carry over into the definition. Fresh variables
    // also keep repeated uses of the same instance independent.
    let mut fresh = FxHashMap::default();
    for &v in &inst.tparams {
        fresh.insert(v, TyVar::fresh());
    }
    let shape = rename_vars(&inst.receiver, &fresh);
    let definition = rename_vars(&inst.definition, &fresh);

    let mut unifier = fully_unify(shape, receiver.clone(), scope, renv)?;
    Some(unifier.resolve(definition))
}

/// Clone `ty`, replacing every variable in `map` with its fresh
/// counterpart. Variables outside the map pass through untouched.
fn rename_vars(ty: &Ty, map: &FxHashMap<TyVar, TyVar>) -> Ty {
    match ty {
        Ty::Var(v, kind) => match map.get(v) {
            Some(fresh) => Ty::Var(*fresh, kind.clone()),
            None => ty.clone(),
        },
        Ty::Cst(_) => ty.clone(),
        Ty::Apply(f, a) => {
            Ty::Apply(Box::new(rename_vars(f, map)), Box::new(rename_vars(a, map)))
        }
        Ty::Alias { name, args, expanded } => Ty::Alias {
            name: name.clone(),
            args: args.iter().map(|t| rename_vars(t, map)).collect(),
            expanded: Box::new(rename_vars(expanded, map)),
        },
        Ty::Assoc { sym, arg, kind } => Ty::Assoc {
            sym: sym.clone(),
            arg: Box::new(rename_vars(arg, map)),
            kind: kind.clone(),
        },
        Ty::UnresolvedJvm(query) => {
            let renamed = match query.as_ref() {
                JvmQuery::Constructor { class, args } => JvmQuery::Constructor {
                    class: class.clone(),
                    args: args.iter().map(|t| rename_vars(t, map)).collect(),
                },
                JvmQuery::Method { receiver, name, args, is_static } => JvmQuery::Method {
                    receiver: rename_vars(receiver, map),
                    name: name.clone(),
                    args: args.iter().map(|t| rename_vars(t, map)).collect(),
                    is_static: *is_static,
                },
                JvmQuery::Field { receiver, name } => JvmQuery::Field {
                    receiver: rename_vars(receiver, map),
                    name: name.clone(),
                },
            };
            Ty::UnresolvedJvm(Box::new(renamed))
        }
        Ty::JvmToType(inner) => Ty::JvmToType(Box::new(rename_vars(inner, map))),
        Ty::JvmToEff(inner) => Ty::JvmToEff(Box::new(rename_vars(inner, map))),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
