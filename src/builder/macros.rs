//! Macros for declaring states and events with minimal boilerplate.

/// Declare a struct holding one [`State`](crate::core::State) per field.
///
/// Each state is named after its field. The generated `new` takes the
/// allocator every state is drawn from.
///
/// # Example
///
/// ```
/// use hierarch::core::IdAllocator;
/// use hierarch::states;
///
/// states! {
///     pub struct DoorStates {
///         closed,
///         opened,
///         locked,
///     }
/// }
///
/// let states = DoorStates::new(&IdAllocator::new()).unwrap();
/// assert_eq!(states.opened.name(), "opened");
/// ```
#[macro_export]
macro_rules! states {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $crate::core::State
            ),*
        }

        impl $name {
            pub fn new(
                allocator: &$crate::core::IdAllocator,
            ) -> ::std::result::Result<Self, $crate::core::StateError> {
                Ok(Self {
                    $($field: $crate::core::State::with_allocator(stringify!($field), allocator)?),*
                })
            }
        }
    };
}

/// Declare a module of contiguous application event codes, numbered from 0
/// in declaration order, plus an `ALL` slice for registration.
///
/// # Example
///
/// ```
/// use hierarch::events;
///
/// events! {
///     pub mod door_events {
///         OPEN,
///         CLOSE,
///         LOCK,
///     }
/// }
///
/// assert_eq!(door_events::OPEN.value(), 0);
/// assert_eq!(door_events::LOCK.value(), 2);
/// assert_eq!(door_events::ALL.len(), 3);
/// ```
#[macro_export]
macro_rules! events {
    (
        $vis:vis mod $name:ident {
            $($event:ident),* $(,)?
        }
    ) => {
        $vis mod $name {
            #[allow(non_camel_case_types, clippy::upper_case_acronyms, dead_code)]
            #[repr(i32)]
            enum Numbering {
                $($event),*
            }

            $(
                pub const $event: $crate::core::EventCode =
                    $crate::core::EventCode::new(Numbering::$event as i32);
            )*

            pub const ALL: &[$crate::core::EventCode] = &[$($event),*];
        }
    };
}
