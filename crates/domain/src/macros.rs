//! Macro for implementing Display and FromStr for string-backed enums
//!
//! Used by configuration and query enums whose wire form is a lowercase
//! string (`"sandbox"`, `"local"`, ...).
//!
//! # Example
//!
//! ```rust
//! use airalo_domain::impl_str_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum SharingOption {
//!     Link,
//!     Pdf,
//! }
//!
//! impl_str_enum_conversions!(SharingOption {
//!     Link => "link",
//!     Pdf => "pdf",
//! });
//! ```

/// Implements Display and FromStr traits for string-backed enums
///
/// Parsing is case-insensitive; display is always the canonical lowercase
/// form.
#[macro_export]
macro_rules! impl_str_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Channel {
        Stable,
        Beta,
    }

    impl_str_enum_conversions!(Channel {
        Stable => "stable",
        Beta => "beta",
    });

    #[test]
    fn display_uses_canonical_form() {
        assert_eq!(Channel::Stable.to_string(), "stable");
        assert_eq!(Channel::Beta.to_string(), "beta");
    }

    #[test]
    fn parsing_ignores_case_and_padding() {
        assert_eq!(Channel::from_str("STABLE").unwrap(), Channel::Stable);
        assert_eq!(Channel::from_str(" Beta ").unwrap(), Channel::Beta);
    }

    #[test]
    fn parsing_rejects_unknown_values() {
        let err = Channel::from_str("nightly").unwrap_err();
        assert!(err.contains("Invalid Channel"));
        assert!(err.contains("nightly"));
    }

    mod with_result_alias {
        use std::str::FromStr;

        #[allow(dead_code)]
        type Result<T> = std::result::Result<T, crate::AiraloError>;

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum Region {
            Europe,
            Asia,
        }

        impl_str_enum_conversions!(Region {
            Europe => "europe",
            Asia => "asia",
        });

        #[test]
        fn expands_next_to_a_single_parameter_result_alias() {
            assert_eq!(Region::from_str("Asia").unwrap(), Region::Asia);
            assert_eq!(Region::Europe.to_string(), "europe");
        }
    }
}
