//! Pack partitioning: one root group plus independently keyed sub-groups.
//!
//! A path `subpacks/<name>/...` with at least three segments belongs to the
//! sub-group rooted at `subpacks/<name>/`; everything else belongs to the
//! root group. Each group gets its own `contents.json` at the group root,
//! with record paths relative to that root.

pub const SUBPACK_PREFIX: &str = "subpacks/";

/// One independently keyed and manifested slice of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackGroup {
    /// Group root: "" for the root group, otherwise `subpacks/<name>/`.
    pub root: String,
    /// Full archive paths of member files, in archive order.
    pub files: Vec<String>,
}

impl PackGroup {
    pub fn is_root(&self) -> bool {
        self.root.is_empty()
    }

    /// Where this group's manifest lives in the archive.
    pub fn manifest_path(&self) -> String {
        format!("{}{}", self.root, crate::manifest::MANIFEST_NAME)
    }

    /// Manifest-record path for a member: relative to the group root for
    /// sub-groups, archive-relative for the root group.
    pub fn relative_path<'a>(&self, path: &'a str) -> &'a str {
        path.strip_prefix(self.root.as_str()).unwrap_or(path)
    }
}

/// The `subpacks/<name>/` root a path belongs to, if any.
fn subpack_root(path: &str) -> Option<String> {
    let rest = path.strip_prefix(SUBPACK_PREFIX)?;
    let (name, tail) = rest.split_once('/')?;
    if name.is_empty() || tail.is_empty() {
        return None;
    }
    Some(format!("{}{}/", SUBPACK_PREFIX, name))
}

/// Partition archive paths into groups: root group first (always present,
/// possibly empty), then sub-groups in order of first appearance.
pub fn partition_paths<S: AsRef<str>>(paths: &[S]) -> Vec<PackGroup> {
    let mut root = PackGroup {
        root: String::new(),
        files: Vec::new(),
    };
    let mut subpacks: Vec<PackGroup> = Vec::new();

    for path in paths {
        let path = path.as_ref().replace('\\', "/");
        match subpack_root(&path) {
            Some(group_root) => {
                match subpacks.iter_mut().find(|g| g.root == group_root) {
                    Some(group) => group.files.push(path),
                    None => subpacks.push(PackGroup {
                        root: group_root,
                        files: vec![path],
                    }),
                }
            }
            None => root.files.push(path),
        }
    }

    let mut groups = vec![root];
    groups.extend(subpacks);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subpack_paths_group_under_their_root() {
        let groups = partition_paths(&[
            "manifest.json",
            "subpacks/winter/textures/a.png",
            "subpacks/winter/textures/b.png",
            "subpacks/summer/sounds/c.ogg",
            "textures/a.png",
        ]);
        assert_eq!(groups.len(), 3);
        assert!(groups[0].is_root());
        assert_eq!(groups[0].files, vec!["manifest.json", "textures/a.png"]);
        assert_eq!(groups[1].root, "subpacks/winter/");
        assert_eq!(
            groups[1].files,
            vec![
                "subpacks/winter/textures/a.png",
                "subpacks/winter/textures/b.png"
            ]
        );
        assert_eq!(groups[2].root, "subpacks/summer/");
    }

    #[test]
    fn test_two_segment_subpack_path_stays_in_root() {
        // "subpacks/winter" is a file directly under subpacks/, not a member
        // of a sub-group.
        let groups = partition_paths(&["subpacks/winter", "textures/a.png"]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].files, vec!["subpacks/winter", "textures/a.png"]);
    }

    #[test]
    fn test_manifest_and_relative_paths() {
        let groups = partition_paths(&["a.txt", "subpacks/winter/textures/a.png"]);
        assert_eq!(groups[0].manifest_path(), "contents.json");
        assert_eq!(groups[0].relative_path("a.txt"), "a.txt");
        assert_eq!(groups[1].manifest_path(), "subpacks/winter/contents.json");
        assert_eq!(
            groups[1].relative_path("subpacks/winter/textures/a.png"),
            "textures/a.png"
        );
    }

    #[test]
    fn test_root_group_always_first_even_if_empty() {
        let groups = partition_paths(&["subpacks/x/file.bin"]);
        assert_eq!(groups.len(), 2);
        assert!(groups[0].is_root());
        assert!(groups[0].files.is_empty());
    }

    #[test]
    fn test_backslashes_normalized() {
        let groups = partition_paths(&["subpacks\\winter\\textures\\a.png"]);
        assert_eq!(groups[1].root, "subpacks/winter/");
    }
}
