//! Class name resolution for objects exported by bundles.

use bundlehost_api::ObjectKind;

const DEFAULT_FRAGMENT: &str = "MainFragment";

/// Resolve the class a bundle exports for `path`.
///
/// Fragment paths are shorthand relative to the bundle package:
///
/// | path              | class                      |
/// |-------------------|----------------------------|
/// | `""`              | `<package>.MainFragment`   |
/// | `.detail.Pane`    | `<package>.detail.Pane`    |
/// | `Pane`            | `<package>.Pane`           |
/// | `com.other.Pane`  | unchanged                  |
pub fn resolve_class_name(package_name: &str, kind: &ObjectKind, path: &str) -> String {
    match kind {
        ObjectKind::Fragment { .. } => {
            if path.is_empty() {
                format!("{package_name}.{DEFAULT_FRAGMENT}")
            } else if path.starts_with('.') {
                format!("{package_name}{path}")
            } else if path.chars().next().is_some_and(char::is_uppercase) {
                format!("{package_name}.{path}")
            } else {
                path.to_string()
            }
        }
        ObjectKind::Other(_) => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PKG: &str = "com.example.app.main";

    #[test]
    fn test_fragment_names() {
        let kind = ObjectKind::parse("fragment");
        assert_eq!(
            resolve_class_name(PKG, &kind, ""),
            "com.example.app.main.MainFragment"
        );
        assert_eq!(
            resolve_class_name(PKG, &kind, ".detail.Pane"),
            "com.example.app.main.detail.Pane"
        );
        assert_eq!(
            resolve_class_name(PKG, &kind, "Pane"),
            "com.example.app.main.Pane"
        );
        assert_eq!(resolve_class_name(PKG, &kind, "com.other.Pane"), "com.other.Pane");
    }

    #[test]
    fn test_other_kinds_pass_through() {
        let kind = ObjectKind::parse("view");
        assert_eq!(resolve_class_name(PKG, &kind, "Pane"), "Pane");
    }
}
