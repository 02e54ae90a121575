use derive_more::{Deref, Display, From};

/// One path to evict from the CDN cache.
///
/// Items carry no identity beyond their string, duplicates are purged once
/// per occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deref, From)]
pub struct PurgeItem(String);

impl PurgeItem {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PurgeItem {
    fn from(path: &str) -> Self {
        Self(path.to_owned())
    }
}
