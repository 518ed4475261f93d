/// Defines an immutable, cheaply clonable name type backed by `Arc<str>`.
///
/// The generated type derefs to `str`, borrows as `str` (so it can key a
/// map queried with `&str`) and compares directly against string slices.
macro_rules! define_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name($crate::sync::Arc<str>);

        impl $name {
            /// Creates a new name by copying `name`.
            #[inline]
            pub fn new(name: &str) -> Self {
                Self($crate::sync::Arc::from(name))
            }

            /// Gets the name as a string slice.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl core::borrow::Borrow<str> for $name {
            #[inline]
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(name: &str) -> Self {
                Self::new(name)
            }
        }

        impl From<alloc::string::String> for $name {
            #[inline]
            fn from(name: alloc::string::String) -> Self {
                Self::new(&name)
            }
        }

        impl From<&$name> for $name {
            #[inline]
            fn from(name: &$name) -> Self {
                name.clone()
            }
        }

        impl PartialEq<str> for $name {
            #[inline]
            fn eq(&self, other: &str) -> bool {
                &*self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            #[inline]
            fn eq(&self, other: &&str) -> bool {
                &*self.0 == *other
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Debug::fmt(&*self.0, f)
            }
        }
    };
}
