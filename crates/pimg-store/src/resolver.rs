use std::path::{Component, Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::key::ObjectKey;

/// Maps object keys to filesystem locations under a fixed root.
///
/// Resolution runs two independent checks: the key grammar (enforced when an
/// [`ObjectKey`] is parsed) and lexical containment of the joined path in the
/// root. Loosening the grammar later cannot silently open a traversal.
#[derive(Clone, Debug)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for `root`. Relative roots are made absolute against
    /// the current directory, then cleaned.
    pub fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let absolute = std::path::absolute(root.as_ref())?;
        Ok(Self {
            root: lexical_clean(&absolute),
        })
    }

    /// The cleaned, absolute storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a parsed key to `<root>/<collection>/<filename>`.
    pub fn resolve(&self, key: &ObjectKey) -> StoreResult<PathBuf> {
        let candidate = self
            .root
            .join(key.collection.to_string())
            .join(key.filename.as_str());
        self.contain(&candidate)
    }

    /// Parse raw URL segments and resolve them.
    pub fn resolve_raw(&self, collection: &str, filename: &str) -> StoreResult<PathBuf> {
        self.resolve(&ObjectKey::parse(collection, filename)?)
    }

    /// Clean `candidate` and require it to lie strictly below the root.
    pub fn contain(&self, candidate: &Path) -> StoreResult<PathBuf> {
        let cleaned = lexical_clean(candidate);
        if cleaned != self.root && cleaned.starts_with(&self.root) {
            Ok(cleaned)
        } else {
            Err(StoreError::InvalidPath("path escapes storage root".into()))
        }
    }
}

/// Normalize a path without touching the filesystem: `.` is dropped and `..`
/// removes the previous normal component. `..` directly under the root stays
/// at the root.
pub fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{CollectionId, Filename};
    use proptest::prelude::*;

    fn resolver() -> PathResolver {
        PathResolver::new("/srv/imagestore").unwrap()
    }

    #[test]
    fn resolves_under_root() {
        let path = resolver().resolve_raw("1", "meow.png").unwrap();
        assert_eq!(path, PathBuf::from("/srv/imagestore/1/meow.png"));
    }

    #[test]
    fn relative_root_becomes_absolute() {
        let r = PathResolver::new("./imagestore/../imagestore").unwrap();
        assert!(r.root().is_absolute());
        assert!(r.root().ends_with("imagestore"));
        assert!(!r.root().components().any(|c| c == Component::ParentDir));
    }

    #[test]
    fn traversal_filename_rejected() {
        for bad in ["../../etc/passwd", "..", "a/b.png", "/etc/pwd.txt", "meow.png/.."] {
            let err = resolver().resolve_raw("1", bad).unwrap_err();
            assert!(matches!(err, StoreError::InvalidPath(_)), "{bad:?}");
        }
    }

    #[test]
    fn traversal_collection_rejected() {
        let err = resolver().resolve_raw("..", "meow.png").unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath(_)));
    }

    #[test]
    fn containment_is_checked_independently() {
        let r = resolver();
        assert!(r.contain(Path::new("/srv/imagestore/1/../../etc/passwd")).is_err());
        assert!(r.contain(Path::new("/srv/imagestore")).is_err());
        assert!(r.contain(Path::new("/srv/imagestore/..")).is_err());
        assert!(r.contain(Path::new("/srv/imagestorex/1/a.png")).is_err());
        assert_eq!(
            r.contain(Path::new("/srv/imagestore/./1/a.png")).unwrap(),
            PathBuf::from("/srv/imagestore/1/a.png")
        );
    }

    #[test]
    fn clean_handles_leading_parent() {
        assert_eq!(lexical_clean(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(lexical_clean(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(lexical_clean(Path::new("a/./b/../c")), PathBuf::from("a/c"));
    }

    proptest! {
        #[test]
        fn valid_keys_resolve_to_descendants(
            id in any::<u64>(),
            stem in "[A-Za-z]{1,16}",
            ext in "[a-z]{3}",
        ) {
            let r = resolver();
            let key = ObjectKey::new(
                CollectionId::new(id),
                Filename::parse(&format!("{stem}.{ext}")).unwrap(),
            );
            let path = r.resolve(&key).unwrap();
            prop_assert!(path.starts_with(r.root()));
            prop_assert_eq!(path.parent().and_then(|p| p.parent()), Some(r.root()));
        }

        #[test]
        fn names_with_separators_or_dots_rejected(
            prefix in "[A-Za-z]{0,4}",
            bad in prop::sample::select(vec!["..", "/", "\\", ".", "%2e", " "]),
            suffix in "[A-Za-z.]{0,4}",
        ) {
            let name = format!("{prefix}{bad}{suffix}.png");
            let result = resolver().resolve_raw("1", &name);
            prop_assert!(matches!(result, Err(StoreError::InvalidPath(_))));
        }
    }
}
