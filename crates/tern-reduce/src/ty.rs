//! Type representation for the Tern type system.
//!
//! Defines the `Ty` tree the reduction engine rewrites: variables,
//! atomic constructors (`TyCon`), curried applications, alias nodes
//! kept for display, associated-type projections, and the JVM member
//! queries that resolve against the class catalog. Function arrows,
//! tuples, and effect unions are all spelled through `Apply`.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use rustc_hash::FxHashSet;

use crate::jvm::{ClassId, CtorId, FieldId, MethodId};

/// A type variable, identified by a `u32` index.
///
/// Ids come from a process-global counter so that variables minted by
/// different parts of the compiler never collide; the `ena` crate
/// handles the union-find mechanics inside each unifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TyVar(pub u32);

static NEXT_VAR: AtomicU32 = AtomicU32::new(0);

impl TyVar {
    /// Mint a fresh, globally unique variable.
    pub fn fresh() -> TyVar {
        TyVar(NEXT_VAR.fetch_add(1, Ordering::Relaxed))
    }
}

/// The kind of a type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Value types: `Int32`, `Str`, tuples, functions.
    Star,
    /// Effect rows: `Pure`, `IO`, unions thereof.
    Eff,
    /// Record rows.
    Record,
    /// A type-constructor kind `k1 -> k2`.
    Arrow(Box<Kind>, Box<Kind>),
}

impl Kind {
    pub fn arrow(from: Kind, to: Kind) -> Kind {
        Kind::Arrow(Box::new(from), Box::new(to))
    }

    /// `Star -> ... -> Star` taking `params` parameters.
    pub fn star_arrows(params: usize) -> Kind {
        let mut kind = Kind::Star;
        for _ in 0..params {
            kind = Kind::arrow(Kind::Star, kind);
        }
        kind
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Star => write!(f, "Type"),
            Kind::Eff => write!(f, "Eff"),
            Kind::Record => write!(f, "RecordRow"),
            Kind::Arrow(from, to) => {
                if matches!(from.as_ref(), Kind::Arrow(..)) {
                    write!(f, "({}) -> {}", from, to)
                } else {
                    write!(f, "{} -> {}", from, to)
                }
            }
        }
    }
}

/// A JVM class as it appears inside a type.
///
/// The `name` field is carried ONLY for display in error messages.
/// It is intentionally excluded from `PartialEq` and `Hash`: type
/// identity is the catalog id.
#[derive(Clone, Debug)]
pub struct ClassTy {
    pub id: ClassId,
    /// Fully qualified class name for display (e.g. "java.lang.String").
    pub name: String,
}

impl PartialEq for ClassTy {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id // name intentionally excluded
    }
}

impl Eq for ClassTy {}

impl std::hash::Hash for ClassTy {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state); // name intentionally excluded
    }
}

/// An atomic type constructor.
///
/// Covers the built-in primitives, the structural heads (`Arrow`,
/// `Tuple`), the effect-row constructors, the opaque JVM class marker,
/// and the resolved JVM member handles produced by reduction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TyCon {
    Unit,
    Bool,
    Char,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Str,
    /// A named data-type constructor (`List`, `Pair`, user enums).
    Data(String),
    /// The function arrow, curried: effect row first, then the
    /// parameter, then the result.
    Arrow,
    /// The product constructor of the given arity.
    Tuple(usize),
    /// The record constructor, wrapping a record row into a value type.
    Record,
    /// The empty record row.
    RecordEmpty,
    /// Extends a record row with one labeled field: applied to the
    /// field type, then the rest of the row.
    RecordExtend(String),
    /// The empty effect row.
    Pure,
    /// A named atomic effect (`IO`, an exception class, ...).
    Effect(String),
    /// Union of two effect rows, curried like `Arrow`.
    Union,
    /// An opaque JVM class.
    JvmClass(ClassTy),
    /// A resolved JVM constructor handle.
    JvmConstructor(CtorId),
    /// A resolved JVM method handle.
    JvmMethod(MethodId),
    /// A resolved JVM field handle.
    JvmField(FieldId),
}

impl TyCon {
    /// The kind of this constructor.
    pub fn kind(&self) -> Kind {
        match self {
            TyCon::Unit
            | TyCon::Bool
            | TyCon::Char
            | TyCon::Int8
            | TyCon::Int16
            | TyCon::Int32
            | TyCon::Int64
            | TyCon::Float32
            | TyCon::Float64
            | TyCon::Str => Kind::Star,
            // Applications of a data constructor stay `Star`; arity is
            // not tracked at the kind level.
            TyCon::Data(_) => Kind::Star,
            TyCon::Arrow => Kind::arrow(Kind::Eff, Kind::star_arrows(2)),
            TyCon::Tuple(n) => Kind::star_arrows(*n),
            TyCon::Record => Kind::arrow(Kind::Record, Kind::Star),
            TyCon::RecordEmpty => Kind::Record,
            TyCon::RecordExtend(_) => {
                Kind::arrow(Kind::Star, Kind::arrow(Kind::Record, Kind::Record))
            }
            TyCon::Pure | TyCon::Effect(_) => Kind::Eff,
            TyCon::Union => Kind::arrow(Kind::Eff, Kind::arrow(Kind::Eff, Kind::Eff)),
            // Member handles only ever appear under a JvmToType or
            // JvmToEff query.
            TyCon::JvmClass(_)
            | TyCon::JvmConstructor(_)
            | TyCon::JvmMethod(_)
            | TyCon::JvmField(_) => Kind::Star,
        }
    }
}

impl fmt::Display for TyCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TyCon::Unit => "Unit",
            TyCon::Bool => "Bool",
            TyCon::Char => "Char",
            TyCon::Int8 => "Int8",
            TyCon::Int16 => "Int16",
            TyCon::Int32 => "Int32",
            TyCon::Int64 => "Int64",
            TyCon::Float32 => "Float32",
            TyCon::Float64 => "Float64",
            TyCon::Str => "Str",
            TyCon::Arrow => "->",
            TyCon::Record => "Record",
            TyCon::RecordEmpty => "{}",
            TyCon::Pure => "Pure",
            TyCon::Union => "+",
            TyCon::Data(name) => return write!(f, "{}", name),
            TyCon::Tuple(n) => return write!(f, "Tuple{}", n),
            TyCon::RecordExtend(label) => return write!(f, "{{{}}}", label),
            TyCon::Effect(name) => return write!(f, "{}", name),
            TyCon::JvmClass(c) => return write!(f, "{}", c.name),
            TyCon::JvmConstructor(id) => return write!(f, "<ctor #{}>", id.0),
            TyCon::JvmMethod(id) => return write!(f, "<method #{}>", id.0),
            TyCon::JvmField(id) => return write!(f, "<field #{}>", id.0),
        };
        write!(f, "{}", name)
    }
}

/// The symbol of an associated type: the owning trait plus the member
/// name, e.g. `Container.Elem`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssocSym {
    pub trait_name: String,
    pub name: String,
}

impl AssocSym {
    pub fn new(trait_name: impl Into<String>, name: impl Into<String>) -> Self {
        AssocSym { trait_name: trait_name.into(), name: name.into() }
    }
}

impl fmt::Display for AssocSym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.trait_name, self.name)
    }
}

/// An unresolved JVM member reference, as produced by the front end.
///
/// Constructors name their class directly in source, so the class is
/// already a handle; method and field receivers are types that may
/// still need reduction before the class is known.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum JvmQuery {
    /// `new Class(args)`.
    Constructor { class: ClassTy, args: Vec<Ty> },
    /// `receiver.name(args)`, or `Class.name(args)` when static.
    Method { receiver: Ty, name: String, args: Vec<Ty>, is_static: bool },
    /// `receiver.name` field access.
    Field { receiver: Ty, name: String },
}

impl JvmQuery {
    /// Collect the free type variables of the embedded types.
    pub fn collect_vars(&self, out: &mut FxHashSet<TyVar>) {
        match self {
            JvmQuery::Constructor { args, .. } => {
                for a in args {
                    a.collect_vars(out);
                }
            }
            JvmQuery::Method { receiver, args, .. } => {
                receiver.collect_vars(out);
                for a in args {
                    a.collect_vars(out);
                }
            }
            JvmQuery::Field { receiver, .. } => receiver.collect_vars(out),
        }
    }
}

impl fmt::Display for JvmQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JvmQuery::Constructor { class, args } => {
                write!(f, "new {}(", class.name)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            JvmQuery::Method { receiver, name, args, .. } => {
                write!(f, "{}.{}(", receiver, name)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            JvmQuery::Field { receiver, name } => write!(f, "{}.{}", receiver, name),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, tys: &[Ty]) -> fmt::Result {
    for (i, t) in tys.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", t)?;
    }
    Ok(())
}

/// A Tern type.
///
/// The reduction engine treats this as a rewrite tree: `Alias`,
/// `Assoc`, `UnresolvedJvm`, `JvmToType`, and `JvmToEff` nodes are the
/// redexes; everything else is structure.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// A type variable with its kind.
    Var(TyVar, Kind),
    /// An atomic constructor.
    Cst(TyCon),
    /// Curried type application.
    Apply(Box<Ty>, Box<Ty>),
    /// A type alias applied to arguments, carrying its expansion.
    /// Structurally transparent; kept only so diagnostics can show the
    /// alias name until reduction erases it.
    Alias { name: String, args: Vec<Ty>, expanded: Box<Ty> },
    /// An associated-type projection `Trait.Name[arg]`, not yet
    /// reduced through the equality environment.
    Assoc { sym: AssocSym, arg: Box<Ty>, kind: Kind },
    /// An unresolved JVM member reference.
    UnresolvedJvm(Box<JvmQuery>),
    /// The declared type of the member `inner` resolves to.
    JvmToType(Box<Ty>),
    /// The effect row of the member `inner` resolves to.
    JvmToEff(Box<Ty>),
}

impl Ty {
    pub fn unit() -> Ty {
        Ty::Cst(TyCon::Unit)
    }

    pub fn bool() -> Ty {
        Ty::Cst(TyCon::Bool)
    }

    pub fn char() -> Ty {
        Ty::Cst(TyCon::Char)
    }

    pub fn int8() -> Ty {
        Ty::Cst(TyCon::Int8)
    }

    pub fn int16() -> Ty {
        Ty::Cst(TyCon::Int16)
    }

    pub fn int32() -> Ty {
        Ty::Cst(TyCon::Int32)
    }

    pub fn int64() -> Ty {
        Ty::Cst(TyCon::Int64)
    }

    pub fn float32() -> Ty {
        Ty::Cst(TyCon::Float32)
    }

    pub fn float64() -> Ty {
        Ty::Cst(TyCon::Float64)
    }

    pub fn str() -> Ty {
        Ty::Cst(TyCon::Str)
    }

    /// A fresh flexible variable of the given kind.
    pub fn fresh_var(kind: Kind) -> Ty {
        Ty::Var(TyVar::fresh(), kind)
    }

    /// The empty effect row.
    pub fn pure() -> Ty {
        Ty::Cst(TyCon::Pure)
    }

    /// The `IO` effect.
    pub fn io() -> Ty {
        Ty::Cst(TyCon::Effect("IO".into()))
    }

    /// A named atomic effect.
    pub fn effect(name: impl Into<String>) -> Ty {
        Ty::Cst(TyCon::Effect(name.into()))
    }

    /// The union of two effect rows.
    pub fn union(a: Ty, b: Ty) -> Ty {
        Ty::app(Ty::Cst(TyCon::Union), vec![a, b])
    }

    /// Apply `head` to `args`, left to right.
    pub fn app(head: Ty, args: Vec<Ty>) -> Ty {
        args.into_iter()
            .fold(head, |f, a| Ty::Apply(Box::new(f), Box::new(a)))
    }

    /// A pure function type `param -> ret`.
    pub fn arrow(param: Ty, ret: Ty) -> Ty {
        Ty::arrow_eff(Ty::pure(), param, ret)
    }

    /// A function type `param -> ret \ eff`.
    pub fn arrow_eff(eff: Ty, param: Ty, ret: Ty) -> Ty {
        Ty::app(Ty::Cst(TyCon::Arrow), vec![eff, param, ret])
    }

    /// The product of `elems`.
    pub fn tuple(elems: Vec<Ty>) -> Ty {
        let arity = elems.len();
        Ty::app(Ty::Cst(TyCon::Tuple(arity)), elems)
    }

    /// A named data-type application, e.g. `List[Int32]`.
    pub fn data(name: impl Into<String>, args: Vec<Ty>) -> Ty {
        Ty::app(Ty::Cst(TyCon::Data(name.into())), args)
    }

    /// A closed record `{ l1 = t1, ... }`.
    pub fn record(fields: Vec<(&str, Ty)>) -> Ty {
        let mut row = Ty::Cst(TyCon::RecordEmpty);
        for (label, ty) in fields.into_iter().rev() {
            row = Ty::app(Ty::Cst(TyCon::RecordExtend(label.into())), vec![ty, row]);
        }
        Ty::app(Ty::Cst(TyCon::Record), vec![row])
    }

    /// An alias node with its expansion.
    pub fn alias(name: impl Into<String>, args: Vec<Ty>, expanded: Ty) -> Ty {
        Ty::Alias { name: name.into(), args, expanded: Box::new(expanded) }
    }

    /// An associated-type projection.
    pub fn assoc(sym: AssocSym, arg: Ty, kind: Kind) -> Ty {
        Ty::Assoc { sym, arg: Box::new(arg), kind }
    }

    /// An unresolved constructor call.
    pub fn jvm_constructor(class: ClassTy, args: Vec<Ty>) -> Ty {
        Ty::UnresolvedJvm(Box::new(JvmQuery::Constructor { class, args }))
    }

    /// An unresolved instance-method call.
    pub fn jvm_method(receiver: Ty, name: impl Into<String>, args: Vec<Ty>) -> Ty {
        Ty::UnresolvedJvm(Box::new(JvmQuery::Method {
            receiver,
            name: name.into(),
            args,
            is_static: false,
        }))
    }

    /// An unresolved static-method call.
    pub fn jvm_static_method(receiver: Ty, name: impl Into<String>, args: Vec<Ty>) -> Ty {
        Ty::UnresolvedJvm(Box::new(JvmQuery::Method {
            receiver,
            name: name.into(),
            args,
            is_static: true,
        }))
    }

    /// An unresolved field access.
    pub fn jvm_field(receiver: Ty, name: impl Into<String>) -> Ty {
        Ty::UnresolvedJvm(Box::new(JvmQuery::Field { receiver, name: name.into() }))
    }

    /// The kind of this type. `Apply` takes the codomain of the head's
    /// kind; an ill-kinded application keeps the head's kind as-is.
    pub fn kind(&self) -> Kind {
        match self {
            Ty::Var(_, kind) => kind.clone(),
            Ty::Cst(con) => con.kind(),
            Ty::Apply(head, _) => match head.kind() {
                Kind::Arrow(_, to) => *to,
                other => other,
            },
            Ty::Alias { expanded, .. } => expanded.kind(),
            Ty::Assoc { kind, .. } => kind.clone(),
            Ty::UnresolvedJvm(_) => Kind::Star,
            Ty::JvmToType(_) => Kind::Star,
            Ty::JvmToEff(_) => Kind::Eff,
        }
    }

    /// Collect the free type variables of this type into `out`.
    pub fn collect_vars(&self, out: &mut FxHashSet<TyVar>) {
        match self {
            Ty::Var(v, _) => {
                out.insert(*v);
            }
            Ty::Cst(_) => {}
            Ty::Apply(f, a) => {
                f.collect_vars(out);
                a.collect_vars(out);
            }
            Ty::Alias { args, expanded, .. } => {
                for a in args {
                    a.collect_vars(out);
                }
                expanded.collect_vars(out);
            }
            Ty::Assoc { arg, .. } => arg.collect_vars(out),
            Ty::UnresolvedJvm(query) => query.collect_vars(out),
            Ty::JvmToType(inner) | Ty::JvmToEff(inner) => inner.collect_vars(out),
        }
    }

    /// The free type variables of this type.
    pub fn vars(&self) -> FxHashSet<TyVar> {
        let mut out = FxHashSet::default();
        self.collect_vars(&mut out);
        out
    }

    // ── Display spine helpers ──────────────────────────────────────────

    /// Split a fully applied arrow into (effect, parameter, result).
    fn arrow_parts(&self) -> Option<(&Ty, &Ty, &Ty)> {
        if let Ty::Apply(f, ret) = self {
            if let Ty::Apply(g, param) = f.as_ref() {
                if let Ty::Apply(h, eff) = g.as_ref() {
                    if matches!(h.as_ref(), Ty::Cst(TyCon::Arrow)) {
                        return Some((eff, param, ret));
                    }
                }
            }
        }
        None
    }

    /// Split a fully applied tuple into its elements.
    fn tuple_parts(&self) -> Option<Vec<&Ty>> {
        let (head, args) = self.spine();
        match head {
            Ty::Cst(TyCon::Tuple(n)) if args.len() == *n => Some(args),
            _ => None,
        }
    }

    /// Split `Record[row]` into labeled fields plus the row tail.
    fn record_parts(&self) -> Option<(Vec<(&str, &Ty)>, &Ty)> {
        let (head, args) = self.spine();
        if !matches!(head, Ty::Cst(TyCon::Record)) || args.len() != 1 {
            return None;
        }
        let mut fields = Vec::new();
        let mut row = args[0];
        loop {
            let (row_head, row_args) = row.spine();
            match row_head {
                Ty::Cst(TyCon::RecordExtend(label)) if row_args.len() == 2 => {
                    fields.push((label.as_str(), row_args[0]));
                    row = row_args[1];
                }
                _ => break,
            }
        }
        Some((fields, row))
    }

    /// Split a fully applied effect union into its two rows.
    fn union_parts(&self) -> Option<(&Ty, &Ty)> {
        if let Ty::Apply(f, b) = self {
            if let Ty::Apply(g, a) = f.as_ref() {
                if matches!(g.as_ref(), Ty::Cst(TyCon::Union)) {
                    return Some((a, b));
                }
            }
        }
        None
    }

    /// The application spine: innermost head plus arguments in order.
    fn spine(&self) -> (&Ty, Vec<&Ty>) {
        let mut args = Vec::new();
        let mut cur = self;
        while let Ty::Apply(f, a) = cur {
            args.push(a.as_ref());
            cur = f.as_ref();
        }
        args.reverse();
        (cur, args)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Arrows, tuples, and unions are Apply-encoded; print them in
        // surface syntax when fully applied.
        if let Some((eff, param, ret)) = self.arrow_parts() {
            if param.arrow_parts().is_some() {
                write!(f, "({})", param)?;
            } else {
                write!(f, "{}", param)?;
            }
            write!(f, " -> {}", ret)?;
            if !matches!(eff, Ty::Cst(TyCon::Pure)) {
                write!(f, " \\ {}", eff)?;
            }
            return Ok(());
        }
        if let Some(elems) = self.tuple_parts() {
            write!(f, "(")?;
            for (i, e) in elems.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", e)?;
            }
            return write!(f, ")");
        }
        if let Some((a, b)) = self.union_parts() {
            return write!(f, "{} + {}", a, b);
        }
        if let Some((fields, tail)) = self.record_parts() {
            if fields.is_empty() && matches!(tail, Ty::Cst(TyCon::RecordEmpty)) {
                return write!(f, "{{}}");
            }
            write!(f, "{{ ")?;
            for (i, (label, ty)) in fields.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} = {}", label, ty)?;
            }
            if !matches!(tail, Ty::Cst(TyCon::RecordEmpty)) {
                write!(f, " | {}", tail)?;
            }
            return write!(f, " }}");
        }

        match self {
            Ty::Var(v, _) => write!(f, "?{}", v.0),
            Ty::Cst(con) => write!(f, "{}", con),
            Ty::Apply(..) => {
                let (head, args) = self.spine();
                write!(f, "{}[", head)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, "]")
            }
            Ty::Alias { name, args, .. } => {
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    write!(f, "[")?;
                    write_list(f, args)?;
                    write!(f, "]")?;
                }
                Ok(())
            }
            Ty::Assoc { sym, arg, .. } => write!(f, "{}[{}]", sym, arg),
            Ty::UnresolvedJvm(query) => write!(f, "{}", query),
            Ty::JvmToType(inner) => write!(f, "JvmToType({})", inner),
            Ty::JvmToEff(inner) => write!(f, "JvmToEff({})", inner),
        }
    }
}

// ── ena trait implementations ──────────────────────────────────────────

impl ena::unify::UnifyKey for TyVar {
    type Value = Option<Ty>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TyVar(u)
    }

    fn tag() -> &'static str {
        "TyVar"
    }
}

impl ena::unify::EqUnifyValue for Ty {}
