//! Validated string types that enforce invariants at construction time

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for string types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("hostname cannot be empty or whitespace")]
    EmptyHostName,

    #[error("port cannot be 0")]
    InvalidPort,

    #[error("username cannot contain NUL bytes")]
    NulInUsername,

    #[error("password cannot contain NUL bytes")]
    NulInPassword,
}

/// Macro to generate validated string newtypes.
///
/// Each type gets a validating `new()`, `as_str()`, `AsRef<str>`, `Deref`,
/// `TryFrom<String>` and validating serde impls. `Display` and `Debug` are
/// left to the caller so secrets can be redacted.
macro_rules! validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident(String) {
            validation: |$s_param:ident| $validation:expr,
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " after validation")]
            pub fn new($s_param: String) -> Result<Self, ValidationError> {
                let validate = || $validation;
                validate()?;
                Ok(Self($s_param))
            }

            #[doc = concat!("Get the ", stringify!($name), " as a string slice")]
            #[must_use]
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from($s_param: String) -> Result<Self, Self::Error> {
                Self::new($s_param)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValidationError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

validated_string! {
    /// A hostname or IP literal that cannot be empty or whitespace-only
    ///
    /// # Examples
    /// ```
    /// use ais_feed::types::HostName;
    ///
    /// let host = HostName::new("ais.example.com".to_string()).unwrap();
    /// assert_eq!(host.as_str(), "ais.example.com");
    ///
    /// assert!(HostName::new("   ".to_string()).is_err());
    /// ```
    pub struct HostName(String) {
        validation: |s| if s.trim().is_empty() {
            Err(ValidationError::EmptyHostName)
        } else {
            Ok(())
        },
    }
}

validated_string! {
    /// Login name sent in the handshake
    ///
    /// NUL terminates the field on the wire, so it cannot appear inside.
    pub struct Username(String) {
        validation: |s| if s.contains('\0') {
            Err(ValidationError::NulInUsername)
        } else {
            Ok(())
        },
    }
}

validated_string! {
    /// Password sent in the handshake, redacted from `Debug` and `Display`
    pub struct Password(String) {
        validation: |s| if s.contains('\0') {
            Err(ValidationError::NulInPassword)
        } else {
            Ok(())
        },
    }
}

impl fmt::Display for HostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for HostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostName").field(&self.0).finish()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Username").field(&self.0).finish()
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(********)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_valid() {
        let host = HostName::new("127.0.0.1".to_string()).unwrap();
        assert_eq!(host.as_str(), "127.0.0.1");
        assert_eq!(&*host, "127.0.0.1");
        assert_eq!(host.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_hostname_rejects_blank() {
        assert_eq!(
            HostName::new(String::new()),
            Err(ValidationError::EmptyHostName)
        );
        assert_eq!(
            HostName::new(" \t".to_string()),
            Err(ValidationError::EmptyHostName)
        );
    }

    #[test]
    fn test_username_allows_empty() {
        let user = Username::new(String::new()).unwrap();
        assert!(user.is_empty());
    }

    #[test]
    fn test_credentials_reject_nul() {
        assert_eq!(
            Username::try_from("bad\0user"),
            Err(ValidationError::NulInUsername)
        );
        assert_eq!(
            Password::try_from("bad\0pass"),
            Err(ValidationError::NulInPassword)
        );
    }

    #[test]
    fn test_password_redacted() {
        let password = Password::try_from("hunter2").unwrap();
        assert_eq!(password.as_str(), "hunter2");
        assert!(!format!("{:?}", password).contains("hunter2"));
        assert!(!password.to_string().contains("hunter2"));
    }

    #[test]
    fn test_deserialize_validates() {
        #[derive(Debug, Deserialize)]
        struct Wrapper {
            host: HostName,
        }

        let ok: Wrapper = toml::from_str(r#"host = "ais.example.com""#).unwrap();
        assert_eq!(ok.host.as_str(), "ais.example.com");

        let err = toml::from_str::<Wrapper>(r#"host = "  ""#).unwrap_err();
        assert!(err.to_string().contains("hostname cannot be empty"));
    }
}
