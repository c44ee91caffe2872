/// Coverage-mask naming convention: `<prefix>*.<extension>`, matched case-insensitively on the
/// entry's basename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskNaming {
    prefix: String,
    suffix: String,
}

impl MaskNaming {
    pub fn new(prefix: &str, extension: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            suffix: format!(".{extension}"),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// True when `basename` starts with the prefix and ends with the extension (ASCII
    /// case-insensitive). Prefix and suffix may not overlap.
    pub fn matches(&self, basename: &str) -> bool {
        if basename.len() < self.prefix.len() + self.suffix.len() {
            return false;
        }
        starts_with_ignore_case(basename, &self.prefix)
            && ends_with_ignore_case(basename, &self.suffix)
    }

    /// Output file key for a mask name: the leading prefix removed, everything else untouched.
    pub fn output_key(&self, name: &str) -> String {
        if starts_with_ignore_case(name, &self.prefix) {
            name[self.prefix.len()..].to_string()
        } else {
            name.to_string()
        }
    }
}

/// True when `key` can be joined onto an output directory without leaving it.
pub fn is_plain_file_name(key: &str) -> bool {
    !(key.is_empty() || key.contains(['/', '\\', '\0']) || key == "." || key == "..")
}

/// Last path component of an archive entry name. Archive entries always use `/`.
pub fn basename(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}

fn ends_with_ignore_case(s: &str, suffix: &str) -> bool {
    s.len() >= suffix.len()
        && s.as_bytes()[s.len() - suffix.len()..].eq_ignore_ascii_case(suffix.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naming() -> MaskNaming {
        MaskNaming::new("cloakp", "png")
    }

    #[test]
    fn matches_is_case_insensitive() {
        let n = naming();
        assert!(n.matches("cloakpN44W094.png"));
        assert!(n.matches("CLOAKPn44w094.PNG"));
        assert!(n.matches("cloakp.png"));
    }

    #[test]
    fn rejects_other_names() {
        let n = naming();
        assert!(!n.matches("N44W094.png"));
        assert!(!n.matches("cloakpN44W094.jpg"));
        assert!(!n.matches("xcloakp.png"));
        assert!(!n.matches("cloakpng"));
        assert!(!n.matches(""));
    }

    #[test]
    fn output_key_strips_leading_prefix_only() {
        let n = naming();
        assert_eq!(n.output_key("cloakpN44W094.png"), "N44W094.png");
        assert_eq!(n.output_key("CloakPTEST.png"), "TEST.png");
        assert_eq!(n.output_key("cloakpcloakp.png"), "cloakp.png");
        assert_eq!(n.output_key("other.png"), "other.png");
    }

    #[test]
    fn basename_takes_last_component() {
        assert_eq!(basename("files/cloakpA.png"), "cloakpA.png");
        assert_eq!(basename("cloakpA.png"), "cloakpA.png");
        assert_eq!(basename("files/"), "");
    }

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("N44W094.png"));
        assert!(is_plain_file_name(".png"));
        assert!(!is_plain_file_name("\\EVIL.png"));
        assert!(!is_plain_file_name("a/b.png"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(""));
    }

    #[test]
    fn non_ascii_names_do_not_panic() {
        let n = naming();
        assert!(!n.matches("clo\u{e9}kp.png"));
        assert_eq!(n.output_key("\u{e9}\u{e9}\u{e9}x.png"), "\u{e9}\u{e9}\u{e9}x.png");
    }
}
