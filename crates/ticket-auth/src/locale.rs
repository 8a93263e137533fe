//! Localized messages shown to users whose ticket was rejected

use std::str::FromStr;

/// Language used for user-facing ticket errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl Locale {
    /// Resolve a language tag such as `fr`, `fr_FR` or `en-US`; unknown tags
    /// fall back to English.
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .split(['_', '-'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match primary.as_str() {
            "fr" => Locale::Fr,
            _ => Locale::En,
        }
    }

    pub(crate) fn decode_error(&self) -> &'static str {
        match self {
            Locale::En => "This access ticket could not be decoded. The link may be damaged or was issued by another site.",
            Locale::Fr => "Ce ticket d'accès n'a pas pu être décodé. Le lien est peut-être endommagé ou provient d'un autre site.",
        }
    }

    pub(crate) fn format_error(&self) -> &'static str {
        match self {
            Locale::En => "This access ticket is not valid.",
            Locale::Fr => "Ce ticket d'accès n'est pas valide.",
        }
    }

    pub(crate) fn encryption_error(&self) -> &'static str {
        match self {
            Locale::En => "An access ticket could not be generated.",
            Locale::Fr => "Le ticket d'accès n'a pas pu être généré.",
        }
    }
}

impl FromStr for Locale {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Locale::from_tag(s))
    }
}
