//! The reduction driver.
//!
//! `Reducer::reduce` performs one top-down reduction pass over a type:
//! aliases expand, associated-type projections resolve through the
//! equality environment, JVM member queries resolve through the class
//! catalog, and `JvmToType`/`JvmToEff` queries collapse once their
//! member is picked. Unreducible nodes pass through untouched, and a
//! subtree in which nothing changed is returned as-is rather than
//! rebuilt, so the caller's fixpoint loop only ever sees fresh
//! allocations where something actually happened.
//!
//! The external solver owns the fixpoint: it sweeps every type of
//! interest, checks the shared [`Progress`] signal, and stops when a
//! whole sweep changes nothing. Worker threads share one `Progress`;
//! each `reduce` call bumps it at most once.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::trace;

use tern_common::Span;

use crate::assoc::reduce_assoc;
use crate::env::{EqualityEnv, RigidityEnv, Scope};
use crate::error::ResolutionError;
use crate::jvm::JvmCatalog;
use crate::member::{self, Resolution};
use crate::ty::{JvmQuery, Kind, Ty, TyCon};

/// The shared progress signal.
///
/// The fixpoint loop resets it, sweeps, and asks [`Progress::any`];
/// the exact count does not matter, only whether at least one
/// reduction happened. Relaxed ordering is enough -- the counter
/// carries no data other workers read through it.
#[derive(Debug, Default)]
pub struct Progress {
    count: AtomicUsize,
}

impl Progress {
    pub fn new() -> Self {
        Progress { count: AtomicUsize::new(0) }
    }

    /// Record that one reduction happened.
    pub fn mark(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Whether any reduction happened since the last reset.
    pub fn any(&self) -> bool {
        self.count.load(Ordering::Relaxed) > 0
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Clear the signal before the next sweep.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}

/// One-step type reduction over shared, read-only environments.
pub struct Reducer<'a> {
    eq_env: &'a EqualityEnv,
    jvm: &'a JvmCatalog,
    progress: &'a Progress,
}

impl<'a> Reducer<'a> {
    pub fn new(eq_env: &'a EqualityEnv, jvm: &'a JvmCatalog, progress: &'a Progress) -> Self {
        Reducer { eq_env, jvm, progress }
    }

    /// Reduce `ty` one step closer to normal form.
    ///
    /// Returns `ty` itself when nothing inside it could be reduced;
    /// otherwise returns the rewritten type and marks the progress
    /// signal, exactly once for the whole call.
    pub fn reduce(&self, ty: Ty, scope: &Scope, renv: &RigidityEnv) -> Ty {
        match self.reduce_node(&ty, scope, renv) {
            Some(reduced) => {
                trace!("reduced {} to {}", ty, reduced);
                self.progress.mark();
                reduced
            }
            None => ty,
        }
    }

    /// Reduce one node. `None` means "unchanged" -- callers keep their
    /// original allocation, which is what preserves structural
    /// identity across untouched subtrees.
    fn reduce_node(&self, ty: &Ty, scope: &Scope, renv: &RigidityEnv) -> Option<Ty> {
        match ty {
            // Already normal.
            Ty::Var(..) | Ty::Cst(_) => None,

            Ty::Apply(f, a) => {
                let rf = self.reduce_node(f, scope, renv);
                let ra = self.reduce_node(a, scope, renv);
                if rf.is_none() && ra.is_none() {
                    return None;
                }
                let f = rf.map(Box::new).unwrap_or_else(|| f.clone());
                let a = ra.map(Box::new).unwrap_or_else(|| a.clone());
                Some(Ty::Apply(f, a))
            }

            // One expansion step, unconditionally. Aliases are
            // definitional, but the replacement is still a visible
            // change the fixpoint loop must see.
            Ty::Alias { expanded, .. } => Some(expanded.as_ref().clone()),

            Ty::Assoc { sym, arg, kind } => {
                // Projections nest; resolve the receiver first.
                let arg_reduced = self.reduce_node(arg, scope, renv);
                let receiver = match &arg_reduced {
                    Some(t) => t,
                    None => arg.as_ref(),
                };
                match reduce_assoc(self.eq_env, sym, receiver, scope, renv) {
                    Some(result) => Some(result),
                    // No instance matched yet; keep the projection over
                    // the possibly-further-reduced receiver.
                    None => arg_reduced.map(|t| Ty::Assoc {
                        sym: sym.clone(),
                        arg: Box::new(t),
                        kind: kind.clone(),
                    }),
                }
            }

            Ty::UnresolvedJvm(query) => self.reduce_query(query, scope, renv),

            Ty::JvmToType(inner) => {
                let inner_reduced = self.reduce_node(inner, scope, renv);
                let cur = match &inner_reduced {
                    Some(t) => t,
                    None => inner.as_ref(),
                };
                if let Ty::Cst(con) = cur {
                    if let Some(declared) = self.jvm.member_ty(con) {
                        return Some(declared);
                    }
                }
                inner_reduced.map(|t| Ty::JvmToType(Box::new(t)))
            }

            Ty::JvmToEff(inner) => {
                let inner_reduced = self.reduce_node(inner, scope, renv);
                let cur = match &inner_reduced {
                    Some(t) => t,
                    None => inner.as_ref(),
                };
                if let Ty::Cst(con) = cur {
                    if let Some(effect) = self.jvm.member_eff(con) {
                        return Some(effect);
                    }
                }
                inner_reduced.map(|t| Ty::JvmToEff(Box::new(t)))
            }
        }
    }

    /// Reduce a member query: first its embedded types, then the
    /// lookup itself. A resolved lookup leaves a member handle behind;
    /// an unresolved one re-emits the query, rebuilt only if some
    /// embedded type changed.
    fn reduce_query(&self, query: &JvmQuery, scope: &Scope, renv: &RigidityEnv) -> Option<Ty> {
        match query {
            JvmQuery::Constructor { class, args } => {
                let args_reduced = self.reduce_list(args, scope, renv);
                let cur: &[Ty] = match &args_reduced {
                    Some(list) => list,
                    None => args,
                };
                match member::lookup_constructor(self.jvm, class, cur, scope, renv) {
                    Resolution::Resolved(id) => Some(Ty::Cst(TyCon::JvmConstructor(id))),
                    Resolution::NotFound | Resolution::UnresolvedTypes => {
                        args_reduced.map(|args| Ty::jvm_constructor(class.clone(), args))
                    }
                }
            }

            JvmQuery::Method { receiver, name, args, is_static } => {
                let recv_reduced = self.reduce_node(receiver, scope, renv);
                let args_reduced = self.reduce_list(args, scope, renv);
                let recv = match &recv_reduced {
                    Some(t) => t,
                    None => receiver,
                };
                let cur: &[Ty] = match &args_reduced {
                    Some(list) => list,
                    None => args,
                };
                match member::lookup_method(self.jvm, recv, name, cur, *is_static, scope, renv) {
                    Resolution::Resolved(id) => Some(Ty::Cst(TyCon::JvmMethod(id))),
                    Resolution::NotFound | Resolution::UnresolvedTypes => {
                        if recv_reduced.is_none() && args_reduced.is_none() {
                            return None;
                        }
                        Some(Ty::UnresolvedJvm(Box::new(JvmQuery::Method {
                            receiver: recv_reduced.unwrap_or_else(|| receiver.clone()),
                            name: name.clone(),
                            args: args_reduced.unwrap_or_else(|| args.clone()),
                            is_static: *is_static,
                        })))
                    }
                }
            }

            JvmQuery::Field { receiver, name } => {
                let recv_reduced = self.reduce_node(receiver, scope, renv);
                let recv = match &recv_reduced {
                    Some(t) => t,
                    None => receiver,
                };
                match member::lookup_field(self.jvm, recv, name, scope, renv) {
                    Resolution::Resolved(id) => Some(Ty::Cst(TyCon::JvmField(id))),
                    Resolution::NotFound | Resolution::UnresolvedTypes => {
                        recv_reduced.map(|t| Ty::jvm_field(t, name.clone()))
                    }
                }
            }
        }
    }

    /// Reduce every element of a list; `None` when all are unchanged.
    fn reduce_list(&self, tys: &[Ty], scope: &Scope, renv: &RigidityEnv) -> Option<Vec<Ty>> {
        let reduced: Vec<Option<Ty>> =
            tys.iter().map(|t| self.reduce_node(t, scope, renv)).collect();
        if reduced.iter().all(Option::is_none) {
            return None;
        }
        Some(
            reduced
                .into_iter()
                .zip(tys)
                .map(|(r, orig)| r.unwrap_or_else(|| orig.clone()))
                .collect(),
        )
    }

    // ── Fixpoint diagnosis ─────────────────────────────────────────────

    /// Explain why `ty` is stuck.
    ///
    /// Called by the solver once a whole sweep makes no progress:
    /// every remaining redex in `ty` becomes one error, attributed to
    /// `span`. Only the innermost blockers are reported -- a method
    /// query stuck because its receiver is undetermined yields the
    /// receiver's error, not a misleading "method not found".
    pub fn diagnose(
        &self,
        ty: &Ty,
        span: Span,
        scope: &Scope,
        renv: &RigidityEnv,
    ) -> Vec<ResolutionError> {
        let mut errors = Vec::new();
        self.diagnose_node(ty, span, scope, renv, &mut errors);
        errors
    }

    fn diagnose_node(
        &self,
        ty: &Ty,
        span: Span,
        scope: &Scope,
        renv: &RigidityEnv,
        errors: &mut Vec<ResolutionError>,
    ) {
        match ty {
            Ty::Var(v, kind) => {
                // Effect variables default elsewhere; rigid variables
                // name a fixed type. Neither is a failure.
                if !matches!(kind, Kind::Eff) && !renv.is_rigid(*v, scope) {
                    errors.push(ResolutionError::UndeterminedType { ty: ty.clone(), span });
                }
            }
            Ty::Cst(_) => {}
            Ty::Apply(f, a) => {
                self.diagnose_node(f, span, scope, renv, errors);
                self.diagnose_node(a, span, scope, renv, errors);
            }
            Ty::Alias { expanded, .. } => self.diagnose_node(expanded, span, scope, renv, errors),
            Ty::Assoc { sym, arg, .. } => {
                let before = errors.len();
                self.diagnose_node(arg, span, scope, renv, errors);
                if errors.len() == before {
                    errors.push(ResolutionError::NoMatchingInstance {
                        sym: sym.clone(),
                        receiver: arg.as_ref().clone(),
                        span,
                    });
                }
            }
            Ty::UnresolvedJvm(query) => {
                let before = errors.len();
                match query.as_ref() {
                    JvmQuery::Constructor { args, .. } => {
                        for a in args {
                            self.diagnose_node(a, span, scope, renv, errors);
                        }
                    }
                    JvmQuery::Method { receiver, args, .. } => {
                        self.diagnose_node(receiver, span, scope, renv, errors);
                        for a in args {
                            self.diagnose_node(a, span, scope, renv, errors);
                        }
                    }
                    JvmQuery::Field { receiver, .. } => {
                        self.diagnose_node(receiver, span, scope, renv, errors);
                    }
                }
                if errors.len() == before {
                    errors.push(match query.as_ref() {
                        JvmQuery::Constructor { class, args } => {
                            ResolutionError::ConstructorNotFound {
                                class: class.name.clone(),
                                args: args.clone(),
                                span,
                            }
                        }
                        JvmQuery::Method { receiver, name, args, is_static } => {
                            ResolutionError::MethodNotFound {
                                name: name.clone(),
                                receiver: receiver.clone(),
                                args: args.clone(),
                                is_static: *is_static,
                                span,
                            }
                        }
                        JvmQuery::Field { receiver, name } => ResolutionError::FieldNotFound {
                            name: name.clone(),
                            receiver: receiver.clone(),
                            span,
                        },
                    });
                }
            }
            Ty::JvmToType(inner) | Ty::JvmToEff(inner) => {
                let before = errors.len();
                self.diagnose_node(inner, span, scope, renv, errors);
                if errors.len() == before {
                    errors.push(ResolutionError::UndeterminedType { ty: ty.clone(), span });
                }
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::AssocInstance;
    use crate::ty::{AssocSym, TyVar};

    fn fixture<'a>(
        eq_env: &'a EqualityEnv,
        jvm: &'a JvmCatalog,
        progress: &'a Progress,
    ) -> Reducer<'a> {
        Reducer::new(eq_env, jvm, progress)
    }

    #[test]
    fn normal_types_pass_through_silently() {
        let eq_env = EqualityEnv::new();
        let jvm = JvmCatalog::new();
        let progress = Progress::new();
        let reducer = fixture(&eq_env, &jvm, &progress);
        let scope = Scope::top();
        let renv = RigidityEnv::new();

        let ty = Ty::arrow(Ty::int32(), Ty::bool());
        let out = reducer.reduce(ty.clone(), &scope, &renv);
        assert_eq!(out, ty);
        assert!(!progress.any());
    }

    #[test]
    fn alias_expansion_counts_as_progress() {
        let eq_env = EqualityEnv::new();
        let jvm = JvmCatalog::new();
        let progress = Progress::new();
        let reducer = fixture(&eq_env, &jvm, &progress);
        let scope = Scope::top();
        let renv = RigidityEnv::new();

        let out = reducer.reduce(Ty::alias("Text", vec![], Ty::str()), &scope, &renv);
        assert_eq!(out, Ty::str());
        assert_eq!(progress.count(), 1);
    }

    #[test]
    fn projection_reduces_through_a_nested_application() {
        let v = TyVar::fresh();
        let elem = AssocSym::new("Container", "Elem");
        let mut eq_env = EqualityEnv::new();
        eq_env.add_instance(
            elem.clone(),
            AssocInstance::new(
                vec![v],
                Ty::data("List", vec![Ty::Var(v, Kind::Star)]),
                Ty::Var(v, Kind::Star),
            ),
        );
        let jvm = JvmCatalog::new();
        let progress = Progress::new();
        let reducer = fixture(&eq_env, &jvm, &progress);
        let scope = Scope::top();
        let renv = RigidityEnv::new();

        // Option[Elem[List[Int32]]] -- the redex sits under an Apply.
        let proj = Ty::assoc(elem, Ty::data("List", vec![Ty::int32()]), Kind::Star);
        let ty = Ty::data("Option", vec![proj]);
        let out = reducer.reduce(ty, &scope, &renv);
        assert_eq!(out, Ty::data("Option", vec![Ty::int32()]));
        assert_eq!(progress.count(), 1);
    }

    #[test]
    fn stuck_projection_is_returned_unchanged() {
        let eq_env = EqualityEnv::new();
        let jvm = JvmCatalog::new();
        let progress = Progress::new();
        let reducer = fixture(&eq_env, &jvm, &progress);
        let scope = Scope::top();
        let renv = RigidityEnv::new();

        let proj = Ty::assoc(
            AssocSym::new("Container", "Elem"),
            Ty::data("List", vec![Ty::int32()]),
            Kind::Star,
        );
        let out = reducer.reduce(proj.clone(), &scope, &renv);
        assert_eq!(out, proj);
        assert!(!progress.any());
    }

    #[test]
    fn diagnose_reports_innermost_blockers_only() {
        let eq_env = EqualityEnv::new();
        let jvm = JvmCatalog::new();
        let progress = Progress::new();
        let reducer = fixture(&eq_env, &jvm, &progress);
        let scope = Scope::top();
        let renv = RigidityEnv::new();
        let span = Span::new(0, 5);

        // A method query over an undetermined receiver: the receiver
        // is the problem, not the method.
        let stuck = Ty::jvm_method(Ty::fresh_var(Kind::Star), "length", vec![]);
        let errors = reducer.diagnose(&stuck, span, &scope, &renv);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ResolutionError::UndeterminedType { .. }));

        // Fully known receiver, genuinely missing method.
        let missing = Ty::jvm_method(Ty::str(), "reverse", vec![]);
        let errors = reducer.diagnose(&missing, span, &scope, &renv);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ResolutionError::MethodNotFound { .. }));
    }

    #[test]
    fn diagnose_of_a_normal_type_is_empty() {
        let eq_env = EqualityEnv::new();
        let jvm = JvmCatalog::new();
        let progress = Progress::new();
        let reducer = fixture(&eq_env, &jvm, &progress);
        let scope = Scope::top();
        let renv = RigidityEnv::new();

        let ty = Ty::tuple(vec![Ty::int32(), Ty::str()]);
        assert!(reducer.diagnose(&ty, Span::new(0, 1), &scope, &renv).is_empty());
    }
}
