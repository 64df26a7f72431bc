//! The ambient, request-scoped context.
//!
//! A [`Context`] holds the acting [`Role`], named variables such as the
//! current user id, and the transaction depth. It is confined to one logical
//! task and passed explicitly to every check; it is never shared.
//!
//! Transaction scopes are RAII guards. A [`TransactionGuard`] derefs to the
//! context, so work inside the scope goes through the guard, and dropping it
//! (including on early return or unwinding) restores the depth.
//!
//! ```
//! use lockdown_core::Context;
//!
//! let mut ctx = Context::new();
//! {
//!     let mut outer = ctx.enter_transaction();
//!     {
//!         let inner = outer.enter_transaction();
//!         assert_eq!(inner.transaction_depth(), 2);
//!     }
//!     assert_eq!(outer.transaction_depth(), 1);
//! }
//! assert_eq!(ctx.transaction_depth(), 0);
//! ```

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::entity::EntityType;
use crate::role::Role;
use crate::ruleset::RuleSet;
use crate::value::Value;

/// Request-scoped authorization context.
#[derive(Debug, Clone, Default)]
pub struct Context {
    role: Option<Arc<Role>>,
    variables: HashMap<String, Value>,
    transaction_depth: usize,
}

impl Context {
    /// Create an empty context: no role, no variables, depth zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context acting as `role`.
    pub fn with_role(role: Arc<Role>) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    /// The acting role, if any.
    pub fn active_role(&self) -> Option<&Arc<Role>> {
        self.role.as_ref()
    }

    /// Replace the acting role.
    pub fn set_role(&mut self, role: Option<Arc<Role>>) {
        self.role = role;
    }

    /// Value of a context variable.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Set a context variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Remove a context variable.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    /// Reset role, variables and depth between logical requests.
    pub fn reset(&mut self) {
        self.role = None;
        self.variables.clear();
        self.transaction_depth = 0;
    }

    /// Number of enclosing transaction scopes.
    pub fn transaction_depth(&self) -> usize {
        self.transaction_depth
    }

    /// Whether at least one transaction scope is open.
    pub fn in_transaction(&self) -> bool {
        self.transaction_depth > 0
    }

    /// Open a transaction scope. It closes when the guard is dropped.
    pub fn enter_transaction(&mut self) -> TransactionGuard<'_> {
        self.transaction_depth += 1;
        TransactionGuard { ctx: self }
    }

    /// Run `f` inside a transaction scope.
    pub fn transaction<T>(&mut self, f: impl FnOnce(&mut Context) -> T) -> T {
        let mut guard = self.enter_transaction();
        f(&mut guard)
    }

    /// Rule sets that apply to `entity_type` under the acting role.
    ///
    /// Empty when no role is active.
    pub fn rule_sets(&self, entity_type: &EntityType) -> Vec<&RuleSet> {
        match &self.role {
            Some(role) => role.collect_rule_sets(entity_type),
            None => Vec::new(),
        }
    }
}

/// An open transaction scope. Decrements the depth on drop.
#[derive(Debug)]
pub struct TransactionGuard<'a> {
    ctx: &'a mut Context,
}

impl Deref for TransactionGuard<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.ctx
    }
}

impl DerefMut for TransactionGuard<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        self.ctx.transaction_depth = self.ctx.transaction_depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables() {
        let mut ctx = Context::new();
        assert!(ctx.get("user").is_none());

        ctx.set("user", 10);
        assert_eq!(ctx.get("user"), Some(&Value::Int(10)));

        assert_eq!(ctx.unset("user"), Some(Value::Int(10)));
        assert!(ctx.get("user").is_none());
    }

    #[test]
    fn test_nested_transactions() {
        let mut ctx = Context::new();
        {
            let mut outer = ctx.enter_transaction();
            let inner = outer.enter_transaction();
            assert_eq!(inner.transaction_depth(), 2);
            drop(inner);
            assert_eq!(outer.transaction_depth(), 1);
        }
        assert_eq!(ctx.transaction_depth(), 0);
        assert!(!ctx.in_transaction());
    }

    #[test]
    fn test_transaction_released_on_error() {
        fn fails(ctx: &mut Context) -> Result<(), &'static str> {
            let tx = ctx.enter_transaction();
            assert!(tx.in_transaction());
            Err("boom")
        }

        let mut ctx = Context::new();
        assert!(fails(&mut ctx).is_err());
        assert_eq!(ctx.transaction_depth(), 0);
    }

    #[test]
    fn test_transaction_released_on_panic() {
        let mut ctx = Context::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            ctx.transaction(|_| panic!("boom"));
        }));
        assert!(result.is_err());
        assert_eq!(ctx.transaction_depth(), 0);
    }

    #[test]
    fn test_transaction_closure() {
        let mut ctx = Context::new();
        let depth = ctx.transaction(|c| c.transaction(|c| c.transaction_depth()));
        assert_eq!(depth, 2);
        assert_eq!(ctx.transaction_depth(), 0);
    }

    #[test]
    fn test_no_role_no_rule_sets() {
        let ctx = Context::new();
        let ty = EntityType::builder("bicycle").build();
        assert!(ctx.rule_sets(&ty).is_empty());
    }

    #[test]
    fn test_reset() {
        let mut ctx = Context::with_role(Arc::new(Role::new("api")));
        ctx.set("group", 1);
        let guard = ctx.enter_transaction();
        std::mem::forget(guard);

        ctx.reset();
        assert!(ctx.active_role().is_none());
        assert!(ctx.get("group").is_none());
        assert_eq!(ctx.transaction_depth(), 0);
    }
}
