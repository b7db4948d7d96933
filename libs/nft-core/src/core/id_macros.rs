/// Declares a string-backed identifier newtype.
///
/// Identifiers travel over the wire as bare JSON strings, so the generated type
/// is `serde(transparent)`.
#[macro_export]
macro_rules! string_id {
    ($name:ident) => {
        #[derive(
            Default,
            Hash,
            Eq,
            PartialEq,
            Ord,
            PartialOrd,
            Clone,
            serde::Serialize,
            serde::Deserialize,
            Debug,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.into())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Ok(Self(value.into()))
            }
        }
    };
}
