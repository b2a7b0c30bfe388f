//! Page transition types: a core type in the low byte plus qualifier bits.

use std::fmt;

pub const CORE_MASK: u32 = 0xFF;
pub const QUALIFIER_MASK: u32 = 0xFFFF_FF00;

pub const FORWARD_BACK: u32 = 0x0100_0000;
pub const FROM_ADDRESS_BAR: u32 = 0x0200_0000;
pub const HOME_PAGE: u32 = 0x0400_0000;
pub const CHAIN_START: u32 = 0x1000_0000;
pub const CHAIN_END: u32 = 0x2000_0000;
pub const CLIENT_REDIRECT: u32 = 0x4000_0000;
pub const SERVER_REDIRECT: u32 = 0x8000_0000;
pub const IS_REDIRECT_MASK: u32 = CLIENT_REDIRECT | SERVER_REDIRECT;

const QUALIFIER_NAMES: [(u32, &str); 7] = [
    (FORWARD_BACK, "FORWARD_BACK"),
    (FROM_ADDRESS_BAR, "FROM_ADDRESS_BAR"),
    (HOME_PAGE, "HOME_PAGE"),
    (CHAIN_START, "CHAIN_START"),
    (CHAIN_END, "CHAIN_END"),
    (CLIENT_REDIRECT, "CLIENT_REDIRECT"),
    (SERVER_REDIRECT, "SERVER_REDIRECT"),
];

/// How the user got to a page, before qualifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreTransition {
    Link,
    Typed,
    AutoBookmark,
    AutoSubframe,
    ManualSubframe,
    Generated,
    AutoToplevel,
    FormSubmit,
    Reload,
    Keyword,
    KeywordGenerated,
    Other(u8),
}

impl CoreTransition {
    pub fn name(self) -> &'static str {
        match self {
            CoreTransition::Link => "LINK",
            CoreTransition::Typed => "TYPED",
            CoreTransition::AutoBookmark => "AUTO_BOOKMARK",
            CoreTransition::AutoSubframe => "AUTO_SUBFRAME",
            CoreTransition::ManualSubframe => "MANUAL_SUBFRAME",
            CoreTransition::Generated => "GENERATED",
            CoreTransition::AutoToplevel => "AUTO_TOPLEVEL",
            CoreTransition::FormSubmit => "FORM_SUBMIT",
            CoreTransition::Reload => "RELOAD",
            CoreTransition::Keyword => "KEYWORD",
            CoreTransition::KeywordGenerated => "KEYWORD_GENERATED",
            CoreTransition::Other(_) => "UNKNOWN",
        }
    }
}

impl From<u8> for CoreTransition {
    fn from(value: u8) -> Self {
        match value {
            0 => CoreTransition::Link,
            1 => CoreTransition::Typed,
            2 => CoreTransition::AutoBookmark,
            3 => CoreTransition::AutoSubframe,
            4 => CoreTransition::ManualSubframe,
            5 => CoreTransition::Generated,
            6 => CoreTransition::AutoToplevel,
            7 => CoreTransition::FormSubmit,
            8 => CoreTransition::Reload,
            9 => CoreTransition::Keyword,
            10 => CoreTransition::KeywordGenerated,
            other => CoreTransition::Other(other),
        }
    }
}

/// The raw bit-flagged transition value stored with a navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PageTransition(pub u32);

impl PageTransition {
    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn core(self) -> CoreTransition {
        CoreTransition::from((self.0 & CORE_MASK) as u8)
    }

    pub fn qualifiers(self) -> u32 {
        self.0 & QUALIFIER_MASK
    }

    pub fn has_qualifier(self, qualifier: u32) -> bool {
        self.0 & qualifier != 0
    }

    pub fn is_redirect(self) -> bool {
        self.has_qualifier(IS_REDIRECT_MASK)
    }

    /// Names of the qualifier bits that are set.
    pub fn qualifier_names(self) -> impl Iterator<Item = &'static str> {
        QUALIFIER_NAMES
            .into_iter()
            .filter(move |(bit, _)| self.has_qualifier(*bit))
            .map(|(_, name)| name)
    }
}

impl From<i32> for PageTransition {
    fn from(value: i32) -> Self {
        PageTransition(value as u32)
    }
}

impl From<PageTransition> for i32 {
    fn from(transition: PageTransition) -> Self {
        transition.0 as i32
    }
}

impl fmt::Display for PageTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.core().name())?;
        for name in self.qualifier_names() {
            write!(f, "|{name}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_and_qualifiers_split() {
        let transition = PageTransition(1 | FROM_ADDRESS_BAR | CHAIN_END);
        assert_eq!(transition.core(), CoreTransition::Typed);
        assert_eq!(transition.qualifiers(), FROM_ADDRESS_BAR | CHAIN_END);
        assert!(!transition.is_redirect());
        assert_eq!(transition.to_string(), "TYPED|FROM_ADDRESS_BAR|CHAIN_END");
    }

    #[test]
    fn negative_int_keeps_high_bit() {
        let raw = (SERVER_REDIRECT | 8) as i32;
        assert!(raw < 0);
        let transition = PageTransition::from(raw);
        assert!(transition.is_redirect());
        assert_eq!(transition.core(), CoreTransition::Reload);
        assert_eq!(i32::from(transition), raw);
    }

    #[test]
    fn unknown_core_type() {
        let transition = PageTransition(0x2A);
        assert_eq!(transition.core(), CoreTransition::Other(0x2A));
        assert_eq!(transition.to_string(), "UNKNOWN");
    }
}
