//! In-memory catalog of JVM classes and member signatures.
//!
//! The engine never loads real classes: the embedder registers every
//! class it may name, with member signatures already mapped into `Ty`.
//! The catalog answers name, inheritance, and signature queries, and
//! knows the primitive/wrapper boxing pairs.
//!
//! `JvmCatalog::new` bootstraps `java.lang.Object` (the universal base
//! class), the eight primitive wrapper classes, `java.lang.Class`, and
//! `java.lang.String`. Everything else is registered by the embedder
//! through `add_class` and friends; the catalog is read-only once
//! construction finishes and is then shared by reference.

use rustc_hash::FxHashMap;

use crate::ty::{ClassTy, Ty, TyCon};

/// Identifies a registered class. Index into the catalog's class table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

/// Identifies a registered constructor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CtorId(pub u32);

/// Identifies a registered method.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodId(pub u32);

/// Identifies a registered field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldId(pub u32);

/// A registered class or interface.
#[derive(Clone, Debug)]
pub struct JvmClass {
    /// Fully qualified name, e.g. "java.util.ArrayList".
    pub name: String,
    /// Direct superclass; `None` for `java.lang.Object` and for
    /// interfaces.
    pub superclass: Option<ClassId>,
    /// Directly declared interfaces.
    pub interfaces: Vec<ClassId>,
    pub is_interface: bool,
    ctors: Vec<CtorId>,
    methods: Vec<MethodId>,
    fields: Vec<FieldId>,
}

/// A constructor signature.
#[derive(Clone, Debug)]
pub struct JvmConstructor {
    pub class: ClassId,
    pub params: Vec<Ty>,
    pub is_public: bool,
    /// Effect row of invoking the constructor.
    pub effect: Ty,
}

impl JvmConstructor {
    /// A public constructor with the `IO` effect.
    pub fn new(class: ClassId, params: Vec<Ty>) -> Self {
        JvmConstructor { class, params, is_public: true, effect: Ty::io() }
    }
}

/// A method signature.
#[derive(Clone, Debug)]
pub struct JvmMethod {
    pub class: ClassId,
    pub name: String,
    pub params: Vec<Ty>,
    pub ret: Ty,
    pub is_static: bool,
    pub is_public: bool,
    /// Effect row of invoking the method.
    pub effect: Ty,
}

impl JvmMethod {
    /// A public instance method with the `IO` effect.
    pub fn new(class: ClassId, name: impl Into<String>, params: Vec<Ty>, ret: Ty) -> Self {
        JvmMethod {
            class,
            name: name.into(),
            params,
            ret,
            is_static: false,
            is_public: true,
            effect: Ty::io(),
        }
    }
}

/// A field signature.
#[derive(Clone, Debug)]
pub struct JvmField {
    pub class: ClassId,
    pub name: String,
    pub ty: Ty,
    pub is_static: bool,
    pub is_public: bool,
    /// Effect row of reading the field.
    pub effect: Ty,
}

impl JvmField {
    /// A public instance field whose reads carry the `IO` effect.
    pub fn new(class: ClassId, name: impl Into<String>, ty: Ty) -> Self {
        JvmField {
            class,
            name: name.into(),
            ty,
            is_static: false,
            is_public: true,
            effect: Ty::io(),
        }
    }
}

/// The class and member registry.
pub struct JvmCatalog {
    classes: Vec<JvmClass>,
    by_name: FxHashMap<String, ClassId>,
    ctors: Vec<JvmConstructor>,
    methods: Vec<JvmMethod>,
    fields: Vec<JvmField>,
    /// Wrapper class -> the primitive it boxes.
    wrappers: FxHashMap<ClassId, TyCon>,
    object: ClassId,
    string: ClassId,
}

impl JvmCatalog {
    pub fn new() -> Self {
        let mut catalog = JvmCatalog {
            classes: Vec::new(),
            by_name: FxHashMap::default(),
            ctors: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            wrappers: FxHashMap::default(),
            object: ClassId(0),
            string: ClassId(0),
        };
        catalog.bootstrap();
        catalog
    }

    /// Register the classes every catalog carries.
    fn bootstrap(&mut self) {
        // ── java.lang.Object ──────────────────────────────────────────
        let object = self.add_class("java.lang.Object", None);
        self.object = object;

        let class_class = self.add_class("java.lang.Class", Some(object));
        let string = self.add_class("java.lang.String", Some(object));
        self.string = string;

        let object_ty = self.class_ty(object);
        self.add_method(JvmMethod::new(object, "equals", vec![object_ty.clone()], Ty::bool()));
        self.add_method(JvmMethod::new(object, "hashCode", vec![], Ty::int32()));
        self.add_method(JvmMethod::new(object, "toString", vec![], Ty::str()));
        self.add_method(JvmMethod::new(object, "getClass", vec![], self.class_ty(class_class)));

        // ── java.lang.String ──────────────────────────────────────────
        self.add_constructor(JvmConstructor::new(string, vec![]));
        self.add_constructor(JvmConstructor::new(string, vec![Ty::str()]));
        self.add_method(JvmMethod::new(string, "length", vec![], Ty::int32()));
        self.add_method(JvmMethod::new(string, "isEmpty", vec![], Ty::bool()));
        self.add_method(JvmMethod::new(string, "charAt", vec![Ty::int32()], Ty::char()));
        self.add_method(JvmMethod::new(string, "concat", vec![Ty::str()], Ty::str()));
        self.add_method(JvmMethod::new(string, "substring", vec![Ty::int32()], Ty::str()));
        self.add_method(JvmMethod::new(
            string,
            "substring",
            vec![Ty::int32(), Ty::int32()],
            Ty::str(),
        ));
        self.add_method(JvmMethod::new(string, "toString", vec![], Ty::str()));
        for param in [Ty::bool(), Ty::char(), Ty::int32(), Ty::int64(), Ty::float64(), object_ty] {
            let mut value_of = JvmMethod::new(string, "valueOf", vec![param], Ty::str());
            value_of.is_static = true;
            self.add_method(value_of);
        }

        // ── Primitive wrapper classes ─────────────────────────────────
        let wrappers: [(&str, TyCon, &str); 8] = [
            ("java.lang.Boolean", TyCon::Bool, "booleanValue"),
            ("java.lang.Byte", TyCon::Int8, "byteValue"),
            ("java.lang.Short", TyCon::Int16, "shortValue"),
            ("java.lang.Integer", TyCon::Int32, "intValue"),
            ("java.lang.Long", TyCon::Int64, "longValue"),
            ("java.lang.Character", TyCon::Char, "charValue"),
            ("java.lang.Float", TyCon::Float32, "floatValue"),
            ("java.lang.Double", TyCon::Float64, "doubleValue"),
        ];
        for (name, prim, accessor) in wrappers {
            let class = self.add_class(name, Some(object));
            self.add_method(JvmMethod::new(class, accessor, vec![], Ty::Cst(prim.clone())));
            self.wrappers.insert(class, prim);
        }
    }

    // ── Registration ──────────────────────────────────────────────────

    /// Register a class. The superclass must already be registered;
    /// only `java.lang.Object` goes without one.
    pub fn add_class(&mut self, name: impl Into<String>, superclass: Option<ClassId>) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        let name = name.into();
        self.by_name.insert(name.clone(), id);
        self.classes.push(JvmClass {
            name,
            superclass,
            interfaces: Vec::new(),
            is_interface: false,
            ctors: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        });
        id
    }

    /// Register an interface. Interfaces sit outside the superclass
    /// chain; member search still falls back to `java.lang.Object`.
    pub fn add_interface(&mut self, name: impl Into<String>) -> ClassId {
        let id = self.add_class(name, None);
        self.classes[id.0 as usize].is_interface = true;
        id
    }

    /// Declare that `class` implements `iface`.
    pub fn add_implements(&mut self, class: ClassId, iface: ClassId) {
        self.classes[class.0 as usize].interfaces.push(iface);
    }

    pub fn add_constructor(&mut self, ctor: JvmConstructor) -> CtorId {
        let id = CtorId(self.ctors.len() as u32);
        self.classes[ctor.class.0 as usize].ctors.push(id);
        self.ctors.push(ctor);
        id
    }

    pub fn add_method(&mut self, method: JvmMethod) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        self.classes[method.class.0 as usize].methods.push(id);
        self.methods.push(method);
        id
    }

    pub fn add_field(&mut self, field: JvmField) -> FieldId {
        let id = FieldId(self.fields.len() as u32);
        self.classes[field.class.0 as usize].fields.push(id);
        self.fields.push(field);
        id
    }

    // ── Lookup ────────────────────────────────────────────────────────

    /// The universal base class, `java.lang.Object`.
    pub fn object_class(&self) -> ClassId {
        self.object
    }

    pub fn class_named(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn class(&self, id: ClassId) -> &JvmClass {
        &self.classes[id.0 as usize]
    }

    pub fn constructor(&self, id: CtorId) -> &JvmConstructor {
        &self.ctors[id.0 as usize]
    }

    pub fn method(&self, id: MethodId) -> &JvmMethod {
        &self.methods[id.0 as usize]
    }

    pub fn field(&self, id: FieldId) -> &JvmField {
        &self.fields[id.0 as usize]
    }

    pub fn constructors_of(
        &self,
        class: ClassId,
    ) -> impl Iterator<Item = (CtorId, &JvmConstructor)> + '_ {
        self.classes[class.0 as usize]
            .ctors
            .iter()
            .map(move |&id| (id, &self.ctors[id.0 as usize]))
    }

    pub fn methods_of(&self, class: ClassId) -> impl Iterator<Item = (MethodId, &JvmMethod)> + '_ {
        self.classes[class.0 as usize]
            .methods
            .iter()
            .map(move |&id| (id, &self.methods[id.0 as usize]))
    }

    pub fn fields_of(&self, class: ClassId) -> impl Iterator<Item = (FieldId, &JvmField)> + '_ {
        self.classes[class.0 as usize]
            .fields
            .iter()
            .map(move |&id| (id, &self.fields[id.0 as usize]))
    }

    /// A display-carrying class reference for embedding in types.
    pub fn class_ref(&self, id: ClassId) -> ClassTy {
        ClassTy { id, name: self.classes[id.0 as usize].name.clone() }
    }

    /// The `Ty` a class handle maps to. `java.lang.String` maps to the
    /// built-in `Str`; every other class stays opaque.
    pub fn class_ty(&self, id: ClassId) -> Ty {
        if id == self.string {
            return Ty::str();
        }
        Ty::Cst(TyCon::JvmClass(self.class_ref(id)))
    }

    /// The registered class a type corresponds to, if any.
    pub fn class_of(&self, ty: &Ty) -> Option<ClassId> {
        match ty {
            Ty::Cst(TyCon::JvmClass(c)) => Some(c.id),
            Ty::Cst(TyCon::Str) => Some(self.string),
            _ => None,
        }
    }

    /// Whether `from` is `to` or inherits from it, through the
    /// superclass chain and declared interfaces.
    pub fn is_assignable(&self, from: ClassId, to: ClassId) -> bool {
        if from == to {
            return true;
        }
        let class = &self.classes[from.0 as usize];
        if let Some(sup) = class.superclass {
            if self.is_assignable(sup, to) {
                return true;
            }
        }
        class.interfaces.iter().any(|&i| self.is_assignable(i, to))
    }

    /// Whether `a` and `b` are a primitive and its wrapper class, in
    /// either order.
    pub fn is_boxing_pair(&self, a: &Ty, b: &Ty) -> bool {
        self.boxes_to(a, b) || self.boxes_to(b, a)
    }

    fn boxes_to(&self, prim: &Ty, wrapper: &Ty) -> bool {
        match (prim, wrapper) {
            (Ty::Cst(p), Ty::Cst(TyCon::JvmClass(c))) => self.wrappers.get(&c.id) == Some(p),
            _ => false,
        }
    }

    /// The member-search chain for a class: itself, its superclasses
    /// in order, always ending at `java.lang.Object`.
    pub fn search_chain(&self, class: ClassId) -> Vec<ClassId> {
        let mut chain = Vec::new();
        let mut cur = Some(class);
        while let Some(c) = cur {
            chain.push(c);
            cur = self.classes[c.0 as usize].superclass;
        }
        if chain.last() != Some(&self.object) {
            chain.push(self.object);
        }
        chain
    }

    /// Declared type of a resolved member handle: the owning class for
    /// a constructor, the return type for a method, the field type for
    /// a field.
    pub fn member_ty(&self, handle: &TyCon) -> Option<Ty> {
        match handle {
            TyCon::JvmConstructor(id) => Some(self.class_ty(self.ctors[id.0 as usize].class)),
            TyCon::JvmMethod(id) => Some(self.methods[id.0 as usize].ret.clone()),
            TyCon::JvmField(id) => Some(self.fields[id.0 as usize].ty.clone()),
            _ => None,
        }
    }

    /// Effect row of invoking (or reading) a resolved member handle.
    pub fn member_eff(&self, handle: &TyCon) -> Option<Ty> {
        match handle {
            TyCon::JvmConstructor(id) => Some(self.ctors[id.0 as usize].effect.clone()),
            TyCon::JvmMethod(id) => Some(self.methods[id.0 as usize].effect.clone()),
            TyCon::JvmField(id) => Some(self.fields[id.0 as usize].effect.clone()),
            _ => None,
        }
    }
}

impl Default for JvmCatalog {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
