//! Macros for ergonomic state and event declarations.

/// Declare an enum and implement [`State`](crate::core::State) for it.
///
/// Derives `Clone`, `PartialEq` and `Debug`; the variant name is the
/// discriminant returned by `name`. Unit, tuple and struct variants are
/// supported.
///
/// # Example
///
/// ```
/// use strata::core::State;
/// use strata::state_enum;
///
/// state_enum! {
///     pub enum Upload {
///         Idle,
///         Sending(u32),
///         Failed { reason: String },
///     }
/// }
///
/// assert_eq!(Upload::Sending(40).name(), "Sending");
/// assert_eq!(Upload::Failed { reason: "offline".into() }.name(), "Failed");
/// ```
#[macro_export]
macro_rules! state_enum {
    ($($body:tt)*) => {
        $crate::__named_enum! {
            $crate::core::State;
            [Clone, PartialEq, Debug];
            $($body)*
        }
    };
}

/// Declare an enum and implement [`Event`](crate::core::Event) for it.
///
/// Derives `Clone` and `Debug`.
///
/// # Example
///
/// ```
/// use strata::core::Event;
/// use strata::event_enum;
///
/// event_enum! {
///     enum Input {
///         Retry,
///         Typed(String),
///     }
/// }
///
/// assert_eq!(Input::Typed("a".into()).name(), "Typed");
/// ```
#[macro_export]
macro_rules! event_enum {
    ($($body:tt)*) => {
        $crate::__named_enum! {
            $crate::core::Event;
            [Clone, Debug];
            $($body)*
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __named_enum {
    (
        $trait:path;
        [$($derive:path),*];
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
                $( ( $($tuple:ty),* $(,)? ) )?
                $( { $($field:ident : $field_ty:ty),* $(,)? } )?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive($($derive),*)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
                $( ( $($tuple),* ) )?
                $( { $($field : $field_ty),* } )?
            ),*
        }

        impl $trait for $name {
            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant { .. } => stringify!($variant)),*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Event, State};

    state_enum! {
        enum TestState {
            Initial,
            Loading(u8),
            Ready { value: String, dirty: bool },
        }
    }

    event_enum! {
        enum TestEvent {
            Load,
            Loaded(String),
        }
    }

    #[test]
    fn state_enum_names_every_variant_kind() {
        assert_eq!(TestState::Initial.name(), "Initial");
        assert_eq!(TestState::Loading(3).name(), "Loading");

        let ready = TestState::Ready {
            value: "v".into(),
            dirty: false,
        };
        assert_eq!(ready.name(), "Ready");
    }

    #[test]
    fn state_enum_derives_structural_equality() {
        assert_eq!(TestState::Loading(1), TestState::Loading(1).clone());
        assert_ne!(TestState::Loading(1), TestState::Loading(2));
    }

    #[test]
    fn event_enum_generates_trait() {
        assert_eq!(TestEvent::Load.name(), "Load");
        assert_eq!(TestEvent::Loaded("x".into()).name(), "Loaded");
    }

    #[test]
    fn macros_support_visibility_and_attributes() {
        state_enum! {
            /// Public state.
            #[allow(dead_code)]
            pub enum PublicState {
                A,
                #[allow(dead_code)]
                B(u8,),
            }
        }

        assert_eq!(PublicState::A.name(), "A");
    }
}
