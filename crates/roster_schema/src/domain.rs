//! Closed enumerated domains shared with editor collaborators.
//!
//! Each domain is a fixed set of canonical string values. Parsing is exact:
//! values outside the set are rejected, never mapped to a fallback.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned when a string is not a member of a closed domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {domain} (expected one of: {expected})")]
pub struct DomainParseError {
    pub domain: &'static str,
    pub value: String,
    pub expected: String,
}

macro_rules! closed_domain {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal, {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// All members of the domain, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            pub fn parse(s: &str) -> Result<Self, DomainParseError> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(DomainParseError {
                        domain: $label,
                        value: other.to_string(),
                        expected: Self::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DomainParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

closed_domain!(
    /// Form of address of a member.
    Salutation, "salutation", {
        Herr => "Herr",
        Frau => "Frau",
        Divers => "Divers",
        Keine => "Keine",
    }
);

closed_domain!(
    Gender, "gender", {
        Male => "male",
        Female => "female",
        Other => "other",
    }
);

closed_domain!(
    /// Billing cadence of a service. Drives contract end-date derivation.
    Term, "term", {
        OneOff => "one-off",
        Monthly => "monthly",
        Quarterly => "quarterly",
        Yearly => "yearly",
    }
);

closed_domain!(
    /// Grouping tag for the settings screen.
    SettingCategory, "setting category", {
        Finance => "finance",
        Program => "program",
        Company => "company",
        Print => "print",
        Other => "other",
    }
);

closed_domain!(
    /// Declared type of a setting's stored text.
    SettingType, "setting type", {
        String => "string",
        Number => "number",
        Boolean => "boolean",
        Date => "date",
    }
);

impl Term {
    /// Whole calendar months covered by one billing period (zero for one-off).
    pub fn months(&self) -> u32 {
        match self {
            Term::OneOff => 0,
            Term::Monthly => 1,
            Term::Quarterly => 3,
            Term::Yearly => 12,
        }
    }
}
