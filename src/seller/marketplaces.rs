//! Seller portal marketplaces, their obfuscated ids and portal domains.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marketplaces served by the opportunity explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    Us,
    Ca,
    Mx,
    Uk,
    Ie,
    De,
    #[default]
    Fr,
    It,
    Es,
    Nl,
    Se,
    Pl,
    Be,
    Ae,
    Sa,
    Eg,
    Tr,
    Jp,
    Au,
    Sg,
    In,
    Br,
    Cn,
}

impl Marketplace {
    /// Returns the upper-case country code used in the auth context.
    pub fn code(&self) -> &'static str {
        match self {
            Marketplace::Us => "US",
            Marketplace::Ca => "CA",
            Marketplace::Mx => "MX",
            Marketplace::Uk => "UK",
            Marketplace::Ie => "IE",
            Marketplace::De => "DE",
            Marketplace::Fr => "FR",
            Marketplace::It => "IT",
            Marketplace::Es => "ES",
            Marketplace::Nl => "NL",
            Marketplace::Se => "SE",
            Marketplace::Pl => "PL",
            Marketplace::Be => "BE",
            Marketplace::Ae => "AE",
            Marketplace::Sa => "SA",
            Marketplace::Eg => "EG",
            Marketplace::Tr => "TR",
            Marketplace::Jp => "JP",
            Marketplace::Au => "AU",
            Marketplace::Sg => "SG",
            Marketplace::In => "IN",
            Marketplace::Br => "BR",
            Marketplace::Cn => "CN",
        }
    }

    /// Returns the display name.
    pub fn name(&self) -> &'static str {
        match self {
            Marketplace::Us => "United States",
            Marketplace::Ca => "Canada",
            Marketplace::Mx => "Mexico",
            Marketplace::Uk => "United Kingdom",
            Marketplace::Ie => "Ireland",
            Marketplace::De => "Germany",
            Marketplace::Fr => "France",
            Marketplace::It => "Italy",
            Marketplace::Es => "Spain",
            Marketplace::Nl => "Netherlands",
            Marketplace::Se => "Sweden",
            Marketplace::Pl => "Poland",
            Marketplace::Be => "Belgium",
            Marketplace::Ae => "United Arab Emirates",
            Marketplace::Sa => "Saudi Arabia",
            Marketplace::Eg => "Egypt",
            Marketplace::Tr => "Turkey",
            Marketplace::Jp => "Japan",
            Marketplace::Au => "Australia",
            Marketplace::Sg => "Singapore",
            Marketplace::In => "India",
            Marketplace::Br => "Brazil",
            Marketplace::Cn => "China",
        }
    }

    /// Returns the obfuscated marketplace id expected by the GraphQL API.
    pub fn obfuscated_id(&self) -> &'static str {
        match self {
            Marketplace::Us => "ATVPDKIKX0DER",
            Marketplace::Ca => "A2EUQ1WTGCTBG2",
            Marketplace::Mx => "A1AM78C64UM0Y8",
            Marketplace::Uk => "A1F83G8C2ARO7P",
            Marketplace::Ie => "A28R8C7NBKEWEA",
            Marketplace::De => "A1PA6795UKMFR9",
            Marketplace::Fr => "A13V1IB3VIYZZH",
            Marketplace::It => "APJ6JRA9NG5V4",
            Marketplace::Es => "A1RKKUPIHCS9HS",
            Marketplace::Nl => "A1805IZSGTT6HS",
            Marketplace::Se => "A2NODRKZP88ZB9",
            Marketplace::Pl => "A1C3SOZRARQ6R3",
            Marketplace::Be => "AMEN7PMS3EDWL",
            Marketplace::Ae => "A2VIGQ35RCS4UG",
            Marketplace::Sa => "A17E79C6D8DWNP",
            Marketplace::Eg => "ARBP9OOSHTCHU",
            Marketplace::Tr => "A33AVAJ2PDY3EV",
            Marketplace::Jp => "A1VC38T7YXB528",
            Marketplace::Au => "A39IBJ37TRP1C6",
            Marketplace::Sg => "A19VAU5U5O7RUS",
            Marketplace::In => "A21TJRUUN4KGV",
            Marketplace::Br => "A2Q3Y263D00KWC",
            Marketplace::Cn => "AAHKV2X7AFYLW",
        }
    }

    /// Returns the retail domain whose seller portal serves this marketplace.
    ///
    /// Ireland is served by the UK portal.
    pub fn domain(&self) -> &'static str {
        match self {
            Marketplace::Us => "amazon.com",
            Marketplace::Ca => "amazon.ca",
            Marketplace::Mx => "amazon.com.mx",
            Marketplace::Uk | Marketplace::Ie => "amazon.co.uk",
            Marketplace::De => "amazon.de",
            Marketplace::Fr => "amazon.fr",
            Marketplace::It => "amazon.it",
            Marketplace::Es => "amazon.es",
            Marketplace::Nl => "amazon.nl",
            Marketplace::Se => "amazon.se",
            Marketplace::Pl => "amazon.pl",
            Marketplace::Be => "amazon.com.be",
            Marketplace::Ae => "amazon.ae",
            Marketplace::Sa => "amazon.sa",
            Marketplace::Eg => "amazon.eg",
            Marketplace::Tr => "amazon.com.tr",
            Marketplace::Jp => "amazon.co.jp",
            Marketplace::Au => "amazon.com.au",
            Marketplace::Sg => "amazon.sg",
            Marketplace::In => "amazon.in",
            Marketplace::Br => "amazon.com.br",
            Marketplace::Cn => "amazon.cn",
        }
    }

    /// Returns the seller portal base URL.
    pub fn portal_url(&self) -> String {
        format!("https://sellercentral.{}", self.domain())
    }

    /// Resolves a country code the way the relay does: unknown codes fall back to France.
    pub fn from_country_or_default(code: &str) -> Self {
        code.trim().parse().unwrap_or(Marketplace::Fr)
    }

    /// Returns all supported marketplaces.
    pub fn all() -> &'static [Marketplace] {
        &[
            Marketplace::Us,
            Marketplace::Ca,
            Marketplace::Mx,
            Marketplace::Uk,
            Marketplace::Ie,
            Marketplace::De,
            Marketplace::Fr,
            Marketplace::It,
            Marketplace::Es,
            Marketplace::Nl,
            Marketplace::Se,
            Marketplace::Pl,
            Marketplace::Be,
            Marketplace::Ae,
            Marketplace::Sa,
            Marketplace::Eg,
            Marketplace::Tr,
            Marketplace::Jp,
            Marketplace::Au,
            Marketplace::Sg,
            Marketplace::In,
            Marketplace::Br,
            Marketplace::Cn,
        ]
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Marketplace {
    type Err = MarketplaceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        if needle.eq_ignore_ascii_case("gb") {
            return Ok(Marketplace::Uk);
        }

        Marketplace::all()
            .iter()
            .copied()
            .find(|m| {
                needle.eq_ignore_ascii_case(m.code())
                    || needle.eq_ignore_ascii_case(m.name())
                    || needle == m.obfuscated_id()
            })
            .ok_or_else(|| MarketplaceParseError(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct MarketplaceParseError(String);

impl fmt::Display for MarketplaceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = Marketplace::all().iter().map(|m| m.code()).collect();
        write!(
            f,
            "Unknown marketplace '{}'. Valid codes: {}",
            self.0,
            codes.join(", ").to_lowercase()
        )
    }
}

impl std::error::Error for MarketplaceParseError {}
