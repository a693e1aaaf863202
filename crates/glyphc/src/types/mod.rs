//! The front-end's structural/sum type system (§3.3). Every non-function
//! type flattens to an ordered list of IR values; two types are
//! structurally equal exactly when their canonical printed form (§6.3)
//! matches, which also doubles as the key functions are monomorphized on.

mod scope;

pub use scope::{ScopeNode, ScopeRef};

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::ir::{BlockId, Program, ValueId};
use crate::syntax::Span;

/// A function value: the unevaluated parameter pattern and body, the scope
/// it closed over, and the monomorphic instances compiled for it so far.
/// Shared (`Rc<RefCell<_>>`) because calling through a `Func` may both read
/// and extend `impls`, and two bindings of the same `fn` expression must
/// see the same instance cache.
#[derive(Debug)]
pub struct FuncData {
    pub params: Span,
    pub body: Span,
    pub captured_scope: ScopeRef,
    pub impls: Vec<Impl>,
}

pub type FuncRef = Rc<RefCell<FuncData>>;

/// One compiled body for a `Func`, keyed (by the lowerer) on the canonical
/// printed form of `params_type`.
#[derive(Debug)]
pub struct Impl {
    pub params_type: Type,
    pub return_type: Type,
    pub entry_block: BlockId,
}

#[derive(Debug, Clone)]
pub enum Type {
    Integer(ValueId),
    Boolean(ValueId),
    /// A presence value (0 or 1) plus an inner type, undefined when absent.
    Maybe(ValueId, Box<Type>),
    Tuple(Vec<Type>),
    Struct(BTreeMap<String, Type>),
    Func(FuncRef),
}

impl Type {
    /// The canonical printed form (§6.3); the definition of structural
    /// equality and the monomorphization key.
    pub fn type_string(&self) -> String {
        match self {
            Type::Integer(_) => "int".to_string(),
            Type::Boolean(_) => "bool".to_string(),
            Type::Maybe(_, inner) => format!("{}?", inner.type_string()),
            Type::Tuple(items) => {
                let parts: Vec<String> = items.iter().map(Type::type_string).collect();
                format!("({})", parts.join(", "))
            }
            Type::Struct(fields) => {
                let parts: Vec<String> =
                    fields.iter().map(|(name, ty)| format!("{name}: {}", ty.type_string())).collect();
                format!("{{{}}}", parts.join(", "))
            }
            Type::Func(_) => "fn".to_string(),
        }
    }

    pub fn structurally_equal(&self, other: &Type) -> bool {
        self.type_string() == other.type_string()
    }

    pub fn is_maybe(&self) -> bool {
        matches!(self, Type::Maybe(..))
    }

    /// Appends this type's underlying IR values in flatten order: for
    /// `Maybe`, presence before inner; struct fields in name order (the
    /// map is already sorted); tuples in index order. `Func` contributes
    /// nothing — function values never touch the IR.
    pub fn to_values(&self, out: &mut Vec<ValueId>) {
        match self {
            Type::Integer(v) | Type::Boolean(v) => out.push(*v),
            Type::Maybe(presence, inner) => {
                out.push(*presence);
                inner.to_values(out);
            }
            Type::Tuple(items) => items.iter().for_each(|t| t.to_values(out)),
            Type::Struct(fields) => fields.values().for_each(|t| t.to_values(out)),
            Type::Func(_) => {}
        }
    }

    /// Rebuilds a type with the same shape as `skeleton`, consuming fresh
    /// values from `values` in the same preorder `to_values` would visit.
    /// `skeleton`'s own values are discarded — only its shape is reused.
    pub fn from_values(values: &mut impl Iterator<Item = ValueId>, skeleton: &Type) -> Type {
        match skeleton {
            Type::Integer(_) => Type::Integer(values.next().expect("flatten/unflatten shape mismatch")),
            Type::Boolean(_) => Type::Boolean(values.next().expect("flatten/unflatten shape mismatch")),
            Type::Maybe(_, inner) => {
                let presence = values.next().expect("flatten/unflatten shape mismatch");
                Type::Maybe(presence, Box::new(Type::from_values(values, inner)))
            }
            Type::Tuple(items) => Type::Tuple(items.iter().map(|t| Type::from_values(values, t)).collect()),
            Type::Struct(fields) => Type::Struct(
                fields.iter().map(|(name, t)| (name.clone(), Type::from_values(values, t))).collect(),
            ),
            Type::Func(f) => Type::Func(Rc::clone(f)),
        }
    }

    /// Allocates a brand new, still-undefined value for every leaf of this
    /// type's shape. Used to set up a function's dedicated parameter slots:
    /// every call site copies its actual arguments into these same slots
    /// rather than the callee reading caller-specific values directly.
    pub fn fresh_like(&self, program: &mut Program) -> Type {
        match self {
            Type::Integer(_) => Type::Integer(program.new_value()),
            Type::Boolean(_) => Type::Boolean(program.new_value()),
            Type::Maybe(_, inner) => Type::Maybe(program.new_value(), Box::new(inner.fresh_like(program))),
            Type::Tuple(items) => Type::Tuple(items.iter().map(|t| t.fresh_like(program)).collect()),
            Type::Struct(fields) => {
                Type::Struct(fields.iter().map(|(k, t)| (k.clone(), t.fresh_like(program))).collect())
            }
            Type::Func(f) => Type::Func(Rc::clone(f)),
        }
    }

    /// Allocates a fresh value (via `Program::copy`) for every leaf,
    /// producing a same-shaped type whose values are copies made in
    /// `block`. Used wherever a binding must survive past a point its
    /// current values don't (loop-carried variables, call arguments).
    pub fn duplicate(&self, program: &mut Program, block: BlockId) -> Type {
        match self {
            Type::Integer(v) => Type::Integer(program.copy(block, *v)),
            Type::Boolean(v) => Type::Boolean(program.copy(block, *v)),
            Type::Maybe(presence, inner) => {
                Type::Maybe(program.copy(block, *presence), Box::new(inner.duplicate(program, block)))
            }
            Type::Tuple(items) => Type::Tuple(items.iter().map(|t| t.duplicate(program, block)).collect()),
            Type::Struct(fields) => {
                Type::Struct(fields.iter().map(|(k, t)| (k.clone(), t.duplicate(program, block))).collect())
            }
            Type::Func(f) => Type::Func(Rc::clone(f)),
        }
    }

    /// Emits, in `block`, a `Copy` from every leaf of `src` into the
    /// corresponding already-allocated leaf of `dest`. `src` and `dest`
    /// must have the same shape. This is how two predecessor blocks at a
    /// diamond join each write their own value into one shared destination
    /// (§4.8.2's same-type merge, and the `while` final join).
    pub fn copy_into(program: &mut Program, block: BlockId, src: &Type, dest: &Type) {
        match (src, dest) {
            (Type::Integer(s), Type::Integer(d)) => program.copy_into(block, *s, *d),
            (Type::Boolean(s), Type::Boolean(d)) => program.copy_into(block, *s, *d),
            (Type::Maybe(sp, si), Type::Maybe(dp, di)) => {
                program.copy_into(block, *sp, *dp);
                Type::copy_into(program, block, si, di);
            }
            (Type::Tuple(ss), Type::Tuple(ds)) => {
                for (s, d) in ss.iter().zip(ds) {
                    Type::copy_into(program, block, s, d);
                }
            }
            (Type::Struct(sf), Type::Struct(df)) => {
                for (name, d) in df {
                    if let Some(s) = sf.get(name) {
                        Type::copy_into(program, block, s, d);
                    }
                }
            }
            (Type::Func(_), Type::Func(_)) => {}
            _ => panic!("copy_into: shape mismatch between {} and {}", src.type_string(), dest.type_string()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_string())
    }
}
