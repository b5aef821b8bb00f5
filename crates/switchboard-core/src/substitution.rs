//! Structural substitution
//!
//! [`Substitute`] walks a value and rewrites every string leaf it reaches with
//! [`template::substitute`](crate::template::substitute). Records opt in by
//! listing the fields to visit with [`impl_substitute!`](crate::impl_substitute);
//! fields that are not listed (numbers, booleans, enums, sequences) pass
//! through untouched.
//!
//! Walks mutate in place and stop at the first error. Anything already
//! rewritten stays rewritten, so callers that need the original intact should
//! use [`substituted`], which walks a clone.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::template::{self, Bindings};

/// A value whose string leaves can be expanded in place
pub trait Substitute {
    /// Expand placeholders in every reachable string leaf.
    fn substitute<B: Bindings + ?Sized>(&mut self, bindings: &B) -> Result<()>;
}

impl Substitute for String {
    fn substitute<B: Bindings + ?Sized>(&mut self, bindings: &B) -> Result<()> {
        *self = template::substitute(self, bindings)?;
        Ok(())
    }
}

/// Absent values are skipped, not an error.
impl<T: Substitute> Substitute for Option<T> {
    fn substitute<B: Bindings + ?Sized>(&mut self, bindings: &B) -> Result<()> {
        match self {
            Some(inner) => inner.substitute(bindings),
            None => Ok(()),
        }
    }
}

impl<T: Substitute + ?Sized> Substitute for Box<T> {
    fn substitute<B: Bindings + ?Sized>(&mut self, bindings: &B) -> Result<()> {
        (**self).substitute(bindings)
    }
}

/// Keys pass through; only string values are expanded.
impl<K: Eq + Hash, S> Substitute for HashMap<K, String, S>
where
    S: std::hash::BuildHasher,
{
    fn substitute<B: Bindings + ?Sized>(&mut self, bindings: &B) -> Result<()> {
        for value in self.values_mut() {
            value.substitute(bindings)?;
        }
        Ok(())
    }
}

impl<K: Ord> Substitute for BTreeMap<K, String> {
    fn substitute<B: Bindings + ?Sized>(&mut self, bindings: &B) -> Result<()> {
        for value in self.values_mut() {
            value.substitute(bindings)?;
        }
        Ok(())
    }
}

/// Dynamic trees: objects are walked, strings expanded, arrays and scalars
/// pass through.
impl Substitute for serde_json::Value {
    fn substitute<B: Bindings + ?Sized>(&mut self, bindings: &B) -> Result<()> {
        match self {
            serde_json::Value::String(s) => s.substitute(bindings),
            serde_json::Value::Object(map) => {
                for value in map.values_mut() {
                    value.substitute(bindings)?;
                }
                Ok(())
            }
            serde_json::Value::Null
            | serde_json::Value::Bool(_)
            | serde_json::Value::Number(_)
            | serde_json::Value::Array(_) => Ok(()),
        }
    }
}

/// Implement [`Substitute`] for a record by naming the fields to walk.
///
/// ```rust,ignore
/// struct Endpoint { url: String, port: u16, headers: HashMap<String, String> }
/// switchboard_core::impl_substitute!(Endpoint { url, headers });
/// ```
#[macro_export]
macro_rules! impl_substitute {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::substitution::Substitute for $ty {
            fn substitute<B: $crate::template::Bindings + ?Sized>(
                &mut self,
                bindings: &B,
            ) -> $crate::error::Result<()> {
                $( $crate::substitution::Substitute::substitute(&mut self.$field, bindings)?; )*
                Ok(())
            }
        }
    };
}

/// Walk `target` in place, reporting failures under [`Error::Substitution`].
pub fn substitute_struct<T, B>(target: &mut T, bindings: &B) -> Result<()>
where
    T: Substitute + ?Sized,
    B: Bindings + ?Sized,
{
    target.substitute(bindings).map_err(Error::substitution)
}

/// Walk a copy of `template`, leaving the original untouched.
pub fn substituted<T, B>(template: &T, bindings: &B) -> Result<T>
where
    T: Substitute + Clone,
    B: Bindings + ?Sized,
{
    let mut copy = template.clone();
    substitute_struct(&mut copy, bindings)?;
    Ok(copy)
}
