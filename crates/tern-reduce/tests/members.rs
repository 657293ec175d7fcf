//! Integration tests for JVM member resolution.
//!
//! Tests cover:
//! - Deterministic unique-overload resolution
//! - Fallback to `java.lang.Object` for inherited members
//! - Boxing rejection, symmetric across every primitive kind
//! - Overload ranking (exact beats subtype) and ambiguity
//! - Static/instance qualifier matching
//! - Accessibility and superclass shadowing
//! - The known-ness gate on receivers and arguments

use tern_reduce::env::{RigidityEnv, Scope};
use tern_reduce::jvm::{JvmCatalog, JvmConstructor, JvmField, JvmMethod};
use tern_reduce::member::{lookup_constructor, lookup_field, lookup_method, Resolution};
use tern_reduce::ty::{Kind, Ty};

// ── Helpers ────────────────────────────────────────────────────────────

/// Empty scope and rigidity environments.
fn envs() -> (Scope, RigidityEnv) {
    (Scope::top(), RigidityEnv::new())
}

/// Unwrap a successful resolution or fail with the actual outcome.
fn resolved<T: std::fmt::Debug + Copy>(res: Resolution<T>) -> T {
    match res {
        Resolution::Resolved(handle) => handle,
        other => panic!("expected Resolved, got {:?}", other),
    }
}

// ── Unique-match determinism ───────────────────────────────────────────

/// A class with exactly one accessible `size` method resolves to the
/// same handle on every call.
#[test]
fn test_unique_method_is_deterministic() {
    let mut catalog = JvmCatalog::new();
    let object = catalog.object_class();
    let coll = catalog.add_class("tern.runtime.Buffer", Some(object));
    let size = catalog.add_method(JvmMethod::new(coll, "size", vec![], Ty::int32()));
    let (scope, renv) = envs();
    let receiver = catalog.class_ty(coll);

    for _ in 0..3 {
        let found = resolved(lookup_method(
            &catalog, &receiver, "size", &[], false, &scope, &renv,
        ));
        assert_eq!(found, size);
    }
}

// ── Fallback to the universal base ─────────────────────────────────────

/// A class that declares no `toString` still resolves it, inherited
/// from `java.lang.Object`.
#[test]
fn test_tostring_falls_back_to_object() {
    let mut catalog = JvmCatalog::new();
    let object = catalog.object_class();
    let widget = catalog.add_class("tern.ui.Widget", Some(object));
    let (scope, renv) = envs();
    let receiver = catalog.class_ty(widget);

    let found = resolved(lookup_method(
        &catalog, &receiver, "toString", &[], false, &scope, &renv,
    ));
    assert_eq!(catalog.method(found).class, object);
    assert_eq!(catalog.method(found).ret, Ty::str());

    // `equals(Object)` accepts the widget itself through widening.
    let found = resolved(lookup_method(
        &catalog,
        &receiver,
        "equals",
        &[receiver.clone()],
        false,
        &scope,
        &renv,
    ));
    assert_eq!(catalog.method(found).class, object);
}

// ── Boxing rejection ───────────────────────────────────────────────────

/// For every primitive kind, an overload reachable only through boxing
/// (in either direction) resolves nothing, while the straight match
/// still works.
#[test]
fn test_boxing_symmetry_all_primitives() {
    let mut catalog = JvmCatalog::new();
    let object = catalog.object_class();
    let holder = catalog.add_class("tern.runtime.Holder", Some(object));

    let pairs = [
        ("java.lang.Boolean", Ty::bool()),
        ("java.lang.Byte", Ty::int8()),
        ("java.lang.Short", Ty::int16()),
        ("java.lang.Integer", Ty::int32()),
        ("java.lang.Long", Ty::int64()),
        ("java.lang.Character", Ty::char()),
        ("java.lang.Float", Ty::float32()),
        ("java.lang.Double", Ty::float64()),
    ];
    for (i, (wrapper_name, prim)) in pairs.iter().enumerate() {
        let wrapper = catalog.class_named(wrapper_name).unwrap();
        let wrapper_ty = catalog.class_ty(wrapper);
        let boxed_name = format!("toBoxed{}", i);
        let prim_name = format!("toPrim{}", i);
        catalog.add_method(JvmMethod::new(
            holder,
            &boxed_name,
            vec![wrapper_ty.clone()],
            Ty::unit(),
        ));
        catalog.add_method(JvmMethod::new(holder, &prim_name, vec![prim.clone()], Ty::unit()));
        let (scope, renv) = envs();
        let receiver = catalog.class_ty(holder);

        // Primitive against the boxed parameter: rejected.
        assert_eq!(
            lookup_method(&catalog, &receiver, &boxed_name, &[prim.clone()], false, &scope, &renv),
            Resolution::NotFound,
            "{} must not accept the primitive", boxed_name
        );
        // Wrapper against the primitive parameter: rejected.
        assert_eq!(
            lookup_method(&catalog, &receiver, &prim_name, &[wrapper_ty], false, &scope, &renv),
            Resolution::NotFound,
            "{} must not accept the wrapper", prim_name
        );
        // The straight match is unaffected.
        assert!(
            lookup_method(&catalog, &receiver, &prim_name, &[prim.clone()], false, &scope, &renv)
                .is_resolved()
        );
    }
}

// ── Overload ranking ───────────────────────────────────────────────────

/// With `print(Object)` and `print(Str)` declared, a `Str` argument
/// picks the exact overload and a widget falls through to `Object`.
#[test]
fn test_overload_prefers_exact_fit() {
    let mut catalog = JvmCatalog::new();
    let object = catalog.object_class();
    let printer = catalog.add_class("tern.io.Printer", Some(object));
    let object_ty = catalog.class_ty(object);
    let general = catalog.add_method(JvmMethod::new(printer, "print", vec![object_ty], Ty::unit()));
    let exact = catalog.add_method(JvmMethod::new(printer, "print", vec![Ty::str()], Ty::unit()));
    let (scope, renv) = envs();
    let receiver = catalog.class_ty(printer);

    let found = resolved(lookup_method(
        &catalog, &receiver, "print", &[Ty::str()], false, &scope, &renv,
    ));
    assert_eq!(found, exact);

    let found = resolved(lookup_method(
        &catalog,
        &receiver,
        "print",
        &[receiver.clone()],
        false,
        &scope,
        &renv,
    ));
    assert_eq!(found, general);
}

/// Two overloads the argument fits equally well resolve nothing.
#[test]
fn test_ambiguous_overloads_resolve_nothing() {
    let mut catalog = JvmCatalog::new();
    let object = catalog.object_class();
    let readable = catalog.add_interface("tern.io.Readable");
    let writable = catalog.add_interface("tern.io.Writable");
    let file = catalog.add_class("tern.io.File", Some(object));
    catalog.add_implements(file, readable);
    catalog.add_implements(file, writable);
    let sink = catalog.add_class("tern.io.Sink", Some(object));
    let readable_ty = catalog.class_ty(readable);
    let writable_ty = catalog.class_ty(writable);
    catalog.add_method(JvmMethod::new(sink, "accept", vec![readable_ty], Ty::unit()));
    catalog.add_method(JvmMethod::new(sink, "accept", vec![writable_ty], Ty::unit()));
    let (scope, renv) = envs();
    let receiver = catalog.class_ty(sink);
    let file_ty = catalog.class_ty(file);

    assert_eq!(
        lookup_method(&catalog, &receiver, "accept", &[file_ty], false, &scope, &renv),
        Resolution::NotFound
    );
}

// ── Qualifiers and accessibility ───────────────────────────────────────

/// Static and instance members never answer for each other.
#[test]
fn test_static_qualifier_must_match() {
    let catalog = JvmCatalog::new();
    let (scope, renv) = envs();

    // String.valueOf is static.
    assert!(lookup_method(
        &catalog, &Ty::str(), "valueOf", &[Ty::bool()], true, &scope, &renv,
    )
    .is_resolved());
    assert_eq!(
        lookup_method(&catalog, &Ty::str(), "valueOf", &[Ty::bool()], false, &scope, &renv),
        Resolution::NotFound
    );

    // String.length is an instance method.
    assert_eq!(
        lookup_method(&catalog, &Ty::str(), "length", &[], true, &scope, &renv),
        Resolution::NotFound
    );
}

/// A private override on the subclass is invisible; resolution lands
/// on the public base declaration.
#[test]
fn test_private_method_defers_to_base() {
    let mut catalog = JvmCatalog::new();
    let object = catalog.object_class();
    let conn = catalog.add_class("tern.net.Conn", Some(object));
    let base_close = catalog.add_method(JvmMethod::new(conn, "close", vec![], Ty::unit()));
    let pooled = catalog.add_class("tern.net.PooledConn", Some(conn));
    let mut private_close = JvmMethod::new(pooled, "close", vec![], Ty::unit());
    private_close.is_public = false;
    catalog.add_method(private_close);
    let (scope, renv) = envs();
    let receiver = catalog.class_ty(pooled);

    let found = resolved(lookup_method(
        &catalog, &receiver, "close", &[], false, &scope, &renv,
    ));
    assert_eq!(found, base_close);
}

/// A subclass declaration of the same name shadows the base one.
#[test]
fn test_subclass_method_shadows_base() {
    let mut catalog = JvmCatalog::new();
    let object = catalog.object_class();
    let animal = catalog.add_class("tern.zoo.Animal", Some(object));
    catalog.add_method(JvmMethod::new(animal, "speak", vec![], Ty::str()));
    let dog = catalog.add_class("tern.zoo.Dog", Some(animal));
    let bark = catalog.add_method(JvmMethod::new(dog, "speak", vec![], Ty::int32()));
    let (scope, renv) = envs();
    let receiver = catalog.class_ty(dog);

    let found = resolved(lookup_method(
        &catalog, &receiver, "speak", &[], false, &scope, &renv,
    ));
    assert_eq!(found, bark);
    assert_eq!(catalog.method(found).ret, Ty::int32());
}

// ── Fields ─────────────────────────────────────────────────────────────

/// Field lookup walks the superclass chain, sees instance fields only,
/// and gates on the receiver being known.
#[test]
fn test_field_lookup_walks_the_chain() {
    let mut catalog = JvmCatalog::new();
    let object = catalog.object_class();
    let shape = catalog.add_class("tern.geom.Shape", Some(object));
    let area = catalog.add_field(JvmField::new(shape, "area", Ty::float64()));
    let mut count = JvmField::new(shape, "count", Ty::int32());
    count.is_static = true;
    catalog.add_field(count);
    let circle = catalog.add_class("tern.geom.Circle", Some(shape));
    let (scope, renv) = envs();
    let receiver = catalog.class_ty(circle);

    assert_eq!(
        lookup_field(&catalog, &receiver, "area", &scope, &renv),
        Resolution::Resolved(area)
    );
    assert_eq!(
        lookup_field(&catalog, &receiver, "count", &scope, &renv),
        Resolution::NotFound
    );
    assert_eq!(
        lookup_field(&catalog, &receiver, "radius", &scope, &renv),
        Resolution::NotFound
    );
    assert_eq!(
        lookup_field(&catalog, &Ty::fresh_var(Kind::Star), "area", &scope, &renv),
        Resolution::UnresolvedTypes
    );
}

// ── Constructors ───────────────────────────────────────────────────────

/// The bootstrapped `java.lang.String` constructors resolve by arity
/// and argument type.
#[test]
fn test_string_constructors_from_bootstrap() {
    let catalog = JvmCatalog::new();
    let string = catalog.class_named("java.lang.String").unwrap();
    let class = catalog.class_ref(string);
    let (scope, renv) = envs();

    let empty = resolved(lookup_constructor(&catalog, &class, &[], &scope, &renv));
    let copy = resolved(lookup_constructor(&catalog, &class, &[Ty::str()], &scope, &renv));
    assert_ne!(empty, copy);
    assert!(catalog.constructor(empty).params.is_empty());

    assert_eq!(
        lookup_constructor(&catalog, &class, &[Ty::int32()], &scope, &renv),
        Resolution::NotFound
    );
}

/// A private constructor is not a candidate.
#[test]
fn test_private_constructor_is_invisible() {
    let mut catalog = JvmCatalog::new();
    let object = catalog.object_class();
    let singleton = catalog.add_class("tern.runtime.Scheduler", Some(object));
    let mut ctor = JvmConstructor::new(singleton, vec![]);
    ctor.is_public = false;
    catalog.add_constructor(ctor);
    let (scope, renv) = envs();
    let class = catalog.class_ref(singleton);

    assert_eq!(
        lookup_constructor(&catalog, &class, &[], &scope, &renv),
        Resolution::NotFound
    );
}

// ── The known-ness gate ────────────────────────────────────────────────

/// Flexible value-kind variables gate resolution; effect variables do
/// not (they are never what a member is matched on).
#[test]
fn test_effect_vars_never_gate() {
    let catalog = JvmCatalog::new();
    let string = catalog.class_named("java.lang.String").unwrap();
    let class = catalog.class_ref(string);
    let (scope, renv) = envs();

    assert_eq!(
        lookup_constructor(&catalog, &class, &[Ty::fresh_var(Kind::Star)], &scope, &renv),
        Resolution::UnresolvedTypes
    );
    // An effect variable is "known" -- the lookup proceeds and simply
    // fails to match any parameter list.
    assert_eq!(
        lookup_constructor(&catalog, &class, &[Ty::fresh_var(Kind::Eff)], &scope, &renv),
        Resolution::NotFound
    );
}
