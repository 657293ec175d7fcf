//! Overload resolution for JVM constructors, methods, and fields.
//!
//! Lookups are total: every outcome is `Resolved`, `NotFound`, or
//! `UnresolvedTypes`. `UnresolvedTypes` means some input type is not
//! yet fully known and the caller should retry once other constraints
//! have made progress. `NotFound` means the inputs were fully known
//! and no unique accessible member matched.
//!
//! Matching is by name, staticness, arity, and per-parameter fit,
//! walking the receiver's superclass chain most-derived-first (the
//! chain always ends at `java.lang.Object`, so inherited members such
//! as `toString` resolve on any receiver). A candidate whose only
//! claim is primitive boxing -- an `Int32` argument against a
//! `java.lang.Integer` parameter, or the reverse -- is discarded:
//! Tern keeps the primitive/reference boundary explicit, so such an
//! overload is reachable only through a conversion the caller never
//! wrote.

use tracing::trace;

use crate::env::{RigidityEnv, Scope};
use crate::jvm::{CtorId, FieldId, JvmCatalog, MethodId};
use crate::ty::{ClassTy, Kind, Ty};

/// Outcome of a member lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution<T> {
    /// Exactly one accessible member matched.
    Resolved(T),
    /// Inputs were fully known but nothing matched (including the case
    /// where every would-be match was boxing-only or ambiguous).
    NotFound,
    /// Some input type is not fully known; retry later.
    UnresolvedTypes,
}

impl<T> Resolution<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    /// The handle, if resolution succeeded.
    pub fn resolved(self) -> Option<T> {
        match self {
            Resolution::Resolved(handle) => Some(handle),
            _ => None,
        }
    }
}

/// Whether `ty` is ready to take part in member resolution.
///
/// Fully known means no flexible variable of non-effect kind, no
/// unreduced projection, and no unresolved member query anywhere in
/// the tree. Effect variables never block resolution (members are
/// matched on value types, not effect rows), and rigid variables
/// count as known: each names one fixed type for the whole call.
pub fn is_known(ty: &Ty, scope: &Scope, renv: &RigidityEnv) -> bool {
    match ty {
        Ty::Var(v, kind) => matches!(kind, Kind::Eff) || renv.is_rigid(*v, scope),
        Ty::Cst(_) => true,
        Ty::Apply(f, a) => is_known(f, scope, renv) && is_known(a, scope, renv),
        // An alias means exactly its expansion.
        Ty::Alias { expanded, .. } => is_known(expanded, scope, renv),
        Ty::Assoc { .. } => false,
        Ty::UnresolvedJvm(_) => false,
        Ty::JvmToType(_) | Ty::JvmToEff(_) => false,
    }
}

/// How a supplied argument fits a declared parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ParamFit {
    /// The same type.
    Exact,
    /// The argument's class inherits from the parameter's.
    Subtype,
    /// Compatible only through primitive boxing or unboxing.
    Boxed,
}

/// Aliases are transparent for matching purposes.
fn strip_alias(ty: &Ty) -> &Ty {
    match ty {
        Ty::Alias { expanded, .. } => strip_alias(expanded),
        _ => ty,
    }
}

fn fit(catalog: &JvmCatalog, arg: &Ty, param: &Ty) -> Option<ParamFit> {
    let arg = strip_alias(arg);
    let param = strip_alias(param);
    if arg == param {
        return Some(ParamFit::Exact);
    }
    if let (Some(from), Some(to)) = (catalog.class_of(arg), catalog.class_of(param)) {
        if from == to {
            return Some(ParamFit::Exact);
        }
        if catalog.is_assignable(from, to) {
            return Some(ParamFit::Subtype);
        }
    }
    if catalog.is_boxing_pair(arg, param) {
        return Some(ParamFit::Boxed);
    }
    None
}

/// Fit every argument against the corresponding parameter, or `None`
/// on an arity or per-parameter mismatch.
fn fit_all(catalog: &JvmCatalog, args: &[Ty], params: &[Ty]) -> Option<Vec<ParamFit>> {
    if args.len() != params.len() {
        return None;
    }
    args.iter().zip(params).map(|(arg, param)| fit(catalog, arg, param)).collect()
}

/// Choose among matching overloads: the candidate with strictly the
/// most exact parameter fits wins; a tie is ambiguous and resolves
/// nothing.
fn pick<T: Copy>(candidates: Vec<(T, Vec<ParamFit>)>) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    let mut tied = false;
    for (handle, fits) in candidates {
        let exact = fits.iter().filter(|f| matches!(f, ParamFit::Exact)).count();
        match best {
            None => best = Some((handle, exact)),
            Some((_, top)) if exact > top => {
                best = Some((handle, exact));
                tied = false;
            }
            Some((_, top)) if exact == top => tied = true,
            Some(_) => {}
        }
    }
    match best {
        Some((handle, _)) if !tied => Some(handle),
        _ => None,
    }
}

/// Resolve `new class(args)` against the class's declared
/// constructors. Constructors are not inherited, so there is no chain
/// walk here.
pub fn lookup_constructor(
    catalog: &JvmCatalog,
    class: &ClassTy,
    args: &[Ty],
    scope: &Scope,
    renv: &RigidityEnv,
) -> Resolution<CtorId> {
    if args.iter().any(|a| !is_known(a, scope, renv)) {
        return Resolution::UnresolvedTypes;
    }

    let mut candidates = Vec::new();
    for (id, ctor) in catalog.constructors_of(class.id) {
        if !ctor.is_public {
            continue;
        }
        let fits = match fit_all(catalog, args, &ctor.params) {
            Some(fits) => fits,
            None => continue,
        };
        if fits.iter().any(|f| matches!(f, ParamFit::Boxed)) {
            trace!("discarding boxing-only constructor of {}", class.name);
            continue;
        }
        candidates.push((id, fits));
    }

    match pick(candidates) {
        Some(id) => Resolution::Resolved(id),
        None => Resolution::NotFound,
    }
}

/// Resolve `receiver.name(args)` (or `Class.name(args)` when
/// `is_static`) against the receiver's class chain.
pub fn lookup_method(
    catalog: &JvmCatalog,
    receiver: &Ty,
    name: &str,
    args: &[Ty],
    is_static: bool,
    scope: &Scope,
    renv: &RigidityEnv,
) -> Resolution<MethodId> {
    if !is_known(receiver, scope, renv) || args.iter().any(|a| !is_known(a, scope, renv)) {
        return Resolution::UnresolvedTypes;
    }

    // A known receiver with no class behind it (a primitive, a tuple)
    // has no members to offer.
    let class = match catalog.class_of(strip_alias(receiver)) {
        Some(class) => class,
        None => return Resolution::NotFound,
    };

    for cls in catalog.search_chain(class) {
        let mut candidates = Vec::new();
        for (id, method) in catalog.methods_of(cls) {
            if method.name != name || method.is_static != is_static || !method.is_public {
                continue;
            }
            let fits = match fit_all(catalog, args, &method.params) {
                Some(fits) => fits,
                None => continue,
            };
            if fits.iter().any(|f| matches!(f, ParamFit::Boxed)) {
                trace!("discarding boxing-only overload {}.{}", catalog.class(cls).name, name);
                continue;
            }
            candidates.push((id, fits));
        }
        // The nearest class with any matching overload decides;
        // deeper declarations are shadowed.
        if !candidates.is_empty() {
            return match pick(candidates) {
                Some(id) => Resolution::Resolved(id),
                None => Resolution::NotFound,
            };
        }
    }

    trace!("no accessible method {} on {}", name, catalog.class(class).name);
    Resolution::NotFound
}

/// Resolve `receiver.name` against the receiver's class chain.
/// Instance fields only.
pub fn lookup_field(
    catalog: &JvmCatalog,
    receiver: &Ty,
    name: &str,
    scope: &Scope,
    renv: &RigidityEnv,
) -> Resolution<FieldId> {
    if !is_known(receiver, scope, renv) {
        return Resolution::UnresolvedTypes;
    }

    let class = match catalog.class_of(strip_alias(receiver)) {
        Some(class) => class,
        None => return Resolution::NotFound,
    };

    for cls in catalog.search_chain(class) {
        let found: Vec<FieldId> = catalog
            .fields_of(cls)
            .filter(|(_, field)| field.name == name && !field.is_static && field.is_public)
            .map(|(id, _)| id)
            .collect();
        match found.as_slice() {
            [] => continue,
            [id] => return Resolution::Resolved(*id),
            _ => return Resolution::NotFound,
        }
    }

    Resolution::NotFound
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jvm::{JvmConstructor, JvmField, JvmMethod};
    use crate::ty::{AssocSym, TyVar};

    fn catalog_with_reader() -> (JvmCatalog, crate::jvm::ClassId, crate::jvm::ClassId) {
        let mut catalog = JvmCatalog::new();
        let object = catalog.object_class();
        let reader = catalog.add_class("java.io.Reader", Some(object));
        let buffered = catalog.add_class("java.io.BufferedReader", Some(reader));
        (catalog, reader, buffered)
    }

    #[test]
    fn known_gate() {
        let scope = Scope::top();
        let renv = RigidityEnv::new();
        let flex = Ty::fresh_var(Kind::Star);
        let eff = Ty::fresh_var(Kind::Eff);

        assert!(is_known(&Ty::int32(), &scope, &renv));
        assert!(!is_known(&flex, &scope, &renv));
        assert!(is_known(&eff, &scope, &renv));
        assert!(!is_known(&Ty::data("List", vec![flex.clone()]), &scope, &renv));
        assert!(!is_known(
            &Ty::assoc(AssocSym::new("Container", "Elem"), Ty::int32(), Kind::Star),
            &scope,
            &renv,
        ));
        assert!(is_known(&Ty::alias("Text", vec![], Ty::str()), &scope, &renv));

        // Rigid variables are known.
        let v = TyVar::fresh();
        let rigid_renv = renv.mark_rigid(v);
        assert!(is_known(&Ty::Var(v, Kind::Star), &scope, &rigid_renv));
    }

    #[test]
    fn fit_distinguishes_exact_subtype_boxed() {
        let (catalog, reader, buffered) = catalog_with_reader();
        let integer = catalog.class_named("java.lang.Integer").unwrap();

        assert_eq!(fit(&catalog, &Ty::int32(), &Ty::int32()), Some(ParamFit::Exact));
        assert_eq!(
            fit(&catalog, &catalog.class_ty(buffered), &catalog.class_ty(reader)),
            Some(ParamFit::Subtype)
        );
        assert_eq!(
            fit(&catalog, &Ty::int32(), &catalog.class_ty(integer)),
            Some(ParamFit::Boxed)
        );
        assert_eq!(fit(&catalog, &Ty::int32(), &Ty::str()), None);
    }

    #[test]
    fn fit_sees_through_aliases() {
        let catalog = JvmCatalog::new();
        let text = Ty::alias("Text", vec![], Ty::str());
        assert_eq!(fit(&catalog, &text, &Ty::str()), Some(ParamFit::Exact));
    }

    #[test]
    fn pick_prefers_more_exact_fits() {
        let a = ("a", vec![ParamFit::Exact, ParamFit::Subtype]);
        let b = ("b", vec![ParamFit::Exact, ParamFit::Exact]);
        assert_eq!(pick(vec![a, b]), Some("b"));
    }

    #[test]
    fn pick_tie_is_ambiguous() {
        let a = ("a", vec![ParamFit::Exact]);
        let b = ("b", vec![ParamFit::Exact]);
        assert_eq!(pick(vec![a, b]), None);
        assert_eq!(pick(Vec::<(&str, Vec<ParamFit>)>::new()), None);
    }

    #[test]
    fn constructor_lookup_picks_unique_overload() {
        let (mut catalog, reader, _) = catalog_with_reader();
        let empty = catalog.add_constructor(JvmConstructor::new(reader, vec![]));
        let sized = catalog.add_constructor(JvmConstructor::new(reader, vec![Ty::int32()]));
        let scope = Scope::top();
        let renv = RigidityEnv::new();
        let class = catalog.class_ref(reader);

        assert_eq!(
            lookup_constructor(&catalog, &class, &[], &scope, &renv),
            Resolution::Resolved(empty)
        );
        assert_eq!(
            lookup_constructor(&catalog, &class, &[Ty::int32()], &scope, &renv),
            Resolution::Resolved(sized)
        );
        assert_eq!(
            lookup_constructor(&catalog, &class, &[Ty::str()], &scope, &renv),
            Resolution::NotFound
        );
    }

    #[test]
    fn constructor_lookup_gates_on_unknown_args() {
        let (catalog, reader, _) = catalog_with_reader();
        let scope = Scope::top();
        let renv = RigidityEnv::new();
        let class = catalog.class_ref(reader);

        assert_eq!(
            lookup_constructor(&catalog, &class, &[Ty::fresh_var(Kind::Star)], &scope, &renv),
            Resolution::UnresolvedTypes
        );
    }

    #[test]
    fn boxing_only_overload_is_invisible() {
        let (mut catalog, reader, _) = catalog_with_reader();
        let integer = catalog.class_named("java.lang.Integer").unwrap();
        let boxed_param = catalog.class_ty(integer);
        catalog.add_method(JvmMethod::new(reader, "mark", vec![boxed_param], Ty::unit()));
        let scope = Scope::top();
        let renv = RigidityEnv::new();
        let receiver = catalog.class_ty(reader);

        assert_eq!(
            lookup_method(&catalog, &receiver, "mark", &[Ty::int32()], false, &scope, &renv),
            Resolution::NotFound
        );
    }

    #[test]
    fn private_members_are_invisible() {
        let (mut catalog, reader, _) = catalog_with_reader();
        let mut method = JvmMethod::new(reader, "fill", vec![], Ty::unit());
        method.is_public = false;
        catalog.add_method(method);
        let mut field = JvmField::new(reader, "buf", Ty::str());
        field.is_public = false;
        catalog.add_field(field);
        let scope = Scope::top();
        let renv = RigidityEnv::new();
        let receiver = catalog.class_ty(reader);

        assert_eq!(
            lookup_method(&catalog, &receiver, "fill", &[], false, &scope, &renv),
            Resolution::NotFound
        );
        assert_eq!(
            lookup_field(&catalog, &receiver, "buf", &scope, &renv),
            Resolution::NotFound
        );
    }

    #[test]
    fn classless_receiver_is_not_found() {
        let catalog = JvmCatalog::new();
        let scope = Scope::top();
        let renv = RigidityEnv::new();

        assert_eq!(
            lookup_method(&catalog, &Ty::int32(), "hashCode", &[], false, &scope, &renv),
            Resolution::NotFound
        );
    }
}
