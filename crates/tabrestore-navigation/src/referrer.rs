use std::fmt;

/// Rule deciding how much referrer information a navigation sends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReferrerPolicy {
    Always,
    /// Used whenever the payload predates the policy field.
    #[default]
    Default,
    Never,
    Origin,
    /// A value newer than this table.
    Other(i32),
}

impl From<i32> for ReferrerPolicy {
    fn from(value: i32) -> Self {
        match value {
            0 => ReferrerPolicy::Always,
            1 => ReferrerPolicy::Default,
            2 => ReferrerPolicy::Never,
            3 => ReferrerPolicy::Origin,
            other => ReferrerPolicy::Other(other),
        }
    }
}

impl From<ReferrerPolicy> for i32 {
    fn from(policy: ReferrerPolicy) -> Self {
        match policy {
            ReferrerPolicy::Always => 0,
            ReferrerPolicy::Default => 1,
            ReferrerPolicy::Never => 2,
            ReferrerPolicy::Origin => 3,
            ReferrerPolicy::Other(value) => value,
        }
    }
}

impl fmt::Display for ReferrerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferrerPolicy::Always => f.write_str("always"),
            ReferrerPolicy::Default => f.write_str("default"),
            ReferrerPolicy::Never => f.write_str("never"),
            ReferrerPolicy::Origin => f.write_str("origin"),
            ReferrerPolicy::Other(value) => write!(f, "policy-{value}"),
        }
    }
}

/// A referrer URL together with the policy to apply to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Referrer {
    pub url: String,
    pub policy: ReferrerPolicy,
}

impl Referrer {
    pub fn new(url: impl Into<String>, policy: ReferrerPolicy) -> Self {
        Self {
            url: url.into(),
            policy,
        }
    }
}
