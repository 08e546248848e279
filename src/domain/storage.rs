//! Storage domains and folder kinds

use std::fmt;

/// One of the two roots that hold per-app folders.
///
/// A folder name lives in exactly one domain at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageDomain {
    Private,
    Shared,
}

impl StorageDomain {
    pub fn other(self) -> Self {
        match self {
            StorageDomain::Private => StorageDomain::Shared,
            StorageDomain::Shared => StorageDomain::Private,
        }
    }
}

impl fmt::Display for StorageDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageDomain::Private => write!(f, "private"),
            StorageDomain::Shared => write!(f, "shared"),
        }
    }
}

/// The kind of folder stored under a domain root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FolderKind {
    /// Per-app data container, named by the app's data UUID
    Data,
    /// Per-app tweak folder
    Tweak,
    /// App group container contents
    AppGroup,
}

impl fmt::Display for FolderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderKind::Data => write!(f, "data"),
            FolderKind::Tweak => write!(f, "tweak"),
            FolderKind::AppGroup => write!(f, "app group"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_domain() {
        assert_eq!(StorageDomain::Private.other(), StorageDomain::Shared);
        assert_eq!(StorageDomain::Shared.other(), StorageDomain::Private);
    }

    #[test]
    fn test_display() {
        assert_eq!(StorageDomain::Shared.to_string(), "shared");
        assert_eq!(FolderKind::AppGroup.to_string(), "app group");
    }
}
