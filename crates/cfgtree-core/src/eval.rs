//! Lazy, dependency-aware option resolution
//!
//! Resolution order for a single option: explicit override, literal
//! default, referenced option, derived expression. The first value found
//! is validated and memoized; a value that fails validation is never
//! cached, so the failure is re-raised on every repeated read.
//!
//! While a default expression runs, its (node, option) pair sits on the
//! evaluation stack. Every option read performed in that window is
//! recorded as a dependency edge for later invalidation, and re-entering a
//! pair already on the stack is a cycle.

use crate::error::{Error, Result};
use crate::option::DefaultValue;
use crate::options::Scope;
use crate::section::{SpecEntry, join_path};
use crate::tree::{Key, NodeId, Tree};
use crate::validate::validate;
use crate::value::Value;

impl Tree {
    /// Resolve one option on one node, memoizing the result.
    pub(crate) fn resolve(&self, node: NodeId, name: &str) -> Result<Value> {
        let data = self.node(node);
        let path = join_path(&data.path, name);
        let spec = match data.spec.get(name) {
            None => return Err(Error::UnknownOption { path }),
            Some(SpecEntry::Section(_)) => return Err(Error::NotAnOption { path }),
            Some(SpecEntry::Option(spec)) => spec,
        };

        let key: Key = (node, name.to_string());
        self.eval.borrow_mut().record_read(&key);

        if let Some(cached) = data.cache.borrow().get(name) {
            return Ok(cached.clone());
        }

        let raw = data.raw.borrow().get(name).cloned();
        if let Some(value) = raw {
            validate(&value, spec, &path)?;
            data.cache.borrow_mut().insert(name.to_string(), value.clone());
            return Ok(value);
        }

        let value = match spec.default() {
            None => return Err(Error::Required { path }),
            Some(DefaultValue::Literal(value)) => value.clone(),
            Some(DefaultValue::Reference(target)) => {
                let target = target.clone();
                self.eval_in_frame(key, |scope| scope.get(&target))?
            }
            Some(DefaultValue::Expr(expr)) => {
                tracing::trace!(path = %path, "evaluating default expression");
                let expr = expr.clone();
                self.eval_in_frame(key, |scope| expr(scope))?
            }
        };

        validate(&value, spec, &path)?;
        data.cache.borrow_mut().insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Run `f` with `key` pushed on the evaluation stack, popping it again
    /// whether or not `f` succeeds. Detects re-entry as a cycle and reports
    /// the chain from the first occurrence back to `key`.
    fn eval_in_frame<F>(&self, key: Key, f: F) -> Result<Value>
    where
        F: FnOnce(&Scope<'_>) -> Result<Value>,
    {
        let node = key.0;
        {
            let mut eval = self.eval.borrow_mut();
            if let Some(position) = eval.stack.iter().position(|k| *k == key) {
                let mut chain: Vec<String> = eval.stack[position..]
                    .iter()
                    .map(|k| self.key_path(k))
                    .collect();
                chain.push(self.key_path(&key));
                return Err(Error::Cycle { chain });
            }
            eval.stack.push(key);
        }

        let scope = Scope::new(self, node);
        let result = f(&scope);

        self.eval.borrow_mut().stack.pop();
        result
    }
}
