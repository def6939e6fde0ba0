//! Identity keys for supervised side-effect jobs.

use std::any::Any;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

/// Identity of a definition within a state graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DefinitionId {
    /// The root definition, shared by every state.
    Root,
    /// The definition registered for a concrete state variant.
    State(&'static str),
    /// The definition of a nested group of states.
    Group(&'static str),
}

impl Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::State(name) => write!(f, "state:{name}"),
            Self::Group(name) => write!(f, "group:{name}"),
        }
    }
}

trait KeyPart: Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_part(&self, other: &dyn KeyPart) -> bool;
}

impl<T> KeyPart for T
where
    T: PartialEq + Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_part(&self, other: &dyn KeyPart) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// A type-erased, comparable key value computed from a state.
///
/// Two key values are equal only when they hold the same type and that
/// type's `PartialEq` says so.
#[derive(Clone)]
pub struct KeyValue(Arc<dyn KeyPart>);

impl KeyValue {
    pub fn new<T>(value: T) -> Self
    where
        T: PartialEq + Debug + Send + Sync + 'static,
    {
        Self(Arc::new(value))
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.as_ref().eq_part(other.0.as_ref())
    }
}

impl Debug for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(self.0.as_ref(), f)
    }
}

/// Identity of a running side-effect job.
///
/// A job keeps running across state changes for as long as the freshly
/// computed key is equal to the one it was started with.
#[derive(Clone, Debug, PartialEq)]
pub struct SideEffectJobKey {
    pub definition: DefinitionId,
    pub index: usize,
    pub value: KeyValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_of_same_type_match() {
        assert_eq!(KeyValue::new(String::from("a")), KeyValue::new(String::from("a")));
        assert_ne!(KeyValue::new(1u32), KeyValue::new(2u32));
    }

    #[test]
    fn values_of_different_types_never_match() {
        assert_ne!(KeyValue::new(1u32), KeyValue::new(1u64));
        assert_ne!(KeyValue::new(()), KeyValue::new(Some(())));
    }

    #[test]
    fn job_keys_compare_all_parts() {
        let key = |definition, index, value: u8| SideEffectJobKey {
            definition,
            index,
            value: KeyValue::new(value),
        };

        assert_eq!(key(DefinitionId::Root, 0, 1), key(DefinitionId::Root, 0, 1));
        assert_ne!(key(DefinitionId::Root, 0, 1), key(DefinitionId::Root, 1, 1));
        assert_ne!(
            key(DefinitionId::State("A"), 0, 1),
            key(DefinitionId::Group("A"), 0, 1)
        );
    }

    #[test]
    fn definition_ids_display_their_kind() {
        assert_eq!(DefinitionId::Root.to_string(), "root");
        assert_eq!(DefinitionId::State("Editing").to_string(), "state:Editing");
        assert_eq!(DefinitionId::Group("Form").to_string(), "group:Form");
    }
}
