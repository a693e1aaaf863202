//! Lexical scopes. A child scope is entered on `if`/`else`/`while`/`struct`/
//! `.`/function body and exited at the end of that construct, after the
//! lowerer has merged its bindings back into the parent (§4.8.1).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::Type;

pub type ScopeRef = Rc<RefCell<ScopeNode>>;

#[derive(Debug, Default)]
pub struct ScopeNode {
    dict: BTreeMap<String, Type>,
    previous: Option<ScopeRef>,
}

impl ScopeNode {
    pub fn root() -> ScopeRef {
        Rc::new(RefCell::new(ScopeNode::default()))
    }

    pub fn child(parent: &ScopeRef) -> ScopeRef {
        Rc::new(RefCell::new(ScopeNode { dict: BTreeMap::new(), previous: Some(Rc::clone(parent)) }))
    }

    pub fn assign(scope: &ScopeRef, name: impl Into<String>, ty: Type) {
        scope.borrow_mut().dict.insert(name.into(), ty);
    }

    pub fn get(scope: &ScopeRef, name: &str) -> Option<Type> {
        let node = scope.borrow();
        if let Some(ty) = node.dict.get(name) {
            return Some(ty.clone());
        }
        node.previous.as_ref().and_then(|parent| ScopeNode::get(parent, name))
    }

    /// Bindings made directly in this frame, sorted by name — used to turn
    /// a `struct { ... }` body's scope into a `Type::Struct` snapshot.
    pub fn snapshot(scope: &ScopeRef) -> BTreeMap<String, Type> {
        scope.borrow().dict.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ValueId;

    #[test]
    fn child_scope_sees_parent_bindings() {
        let parent = ScopeNode::root();
        ScopeNode::assign(&parent, "x", Type::Integer(ValueId(0)));
        let child = ScopeNode::child(&parent);
        assert!(ScopeNode::get(&child, "x").is_some());
        assert!(ScopeNode::get(&child, "y").is_none());
    }

    #[test]
    fn child_binding_shadows_without_mutating_parent() {
        let parent = ScopeNode::root();
        ScopeNode::assign(&parent, "x", Type::Integer(ValueId(0)));
        let child = ScopeNode::child(&parent);
        ScopeNode::assign(&child, "x", Type::Integer(ValueId(1)));
        assert!(matches!(ScopeNode::get(&parent, "x"), Some(Type::Integer(ValueId(0)))));
        assert!(matches!(ScopeNode::get(&child, "x"), Some(Type::Integer(ValueId(1)))));
    }
}
