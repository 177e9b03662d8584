/// Literal name prefixes that suppress a rename.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IgnoreList {
    prefixes: Vec<String>,
}

impl IgnoreList {
    /// One prefix per line; lines are trimmed and blank lines dropped.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = lines
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        Self { prefixes }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// First prefix (in list order) that `name` starts with.
    pub fn matching_prefix(&self, name: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|p| name.starts_with(p.as_str()))
            .map(String::as_str)
    }
}
