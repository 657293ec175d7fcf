//! Tern type reduction: associated types and JVM member resolution.
//!
//! This crate implements the type-level reduction engine of the Tern
//! compiler. Given a type that may still contain computed fragments --
//! associated-type projections awaiting instance dispatch, and JVM
//! member references awaiting overload resolution -- it rewrites the
//! type one step closer to normal form, or reports that nothing can
//! currently be reduced. The constraint solver drives it to a
//! fixpoint, sweeping every open type until the shared progress
//! signal stays quiet, and only then turns the surviving redexes into
//! diagnostics:
//!
//! - Associated-type projection by instance matching, with
//!   substitution flowing strictly from instance to receiver
//! - JVM constructor/method/field overload resolution with subtype
//!   widening and explicit rejection of boxing-only matches
//! - Derived type and effect queries over resolved member handles
//!
//! # Architecture
//!
//! - [`ty`]: Core type representation (Ty, TyCon, TyVar, Kind)
//! - [`env`]: Equality, rigidity, and scope environments
//! - [`jvm`]: The JVM class and member catalog
//! - [`unify`]: Eager unification used by instance matching
//! - [`member`]: Constructor/method/field overload resolution
//! - [`assoc`]: Associated-type projection
//! - [`reduce`]: The reduction driver, progress signal, and fixpoint
//!   diagnosis
//! - [`error`]: Resolution error types
//! - [`diagnostics`]: Ariadne-based error rendering

pub mod assoc;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod jvm;
pub mod member;
pub mod reduce;
pub mod ty;
pub mod unify;

pub use env::{AssocInstance, EqualityEnv, RigidityEnv, Scope};
pub use error::ResolutionError;
pub use jvm::JvmCatalog;
pub use member::{is_known, Resolution};
pub use reduce::{Progress, Reducer};
pub use ty::{AssocSym, ClassTy, JvmQuery, Kind, Ty, TyCon, TyVar};
