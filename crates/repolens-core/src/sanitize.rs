use thiserror::Error;

const HOST_MARKER: &str = "github.com/";

/// Normalizes free-form repository input into a canonical `owner/repo` token.
///
/// Strips embedded NUL bytes, trims surrounding whitespace, discards
/// everything up to and including a `github.com/` marker so that full
/// repository URLs are accepted, and removes a single trailing slash.
/// Idempotent: applying it twice yields the same result as applying it once.
/// Shape validation is left to [`RepoRef::parse`].
pub fn sanitize_repo_input(input: &str) -> String {
    let mut clean: String = input.chars().filter(|character| *character != '\0').collect();
    clean = clean.trim().to_string();

    if let Some(index) = clean.find(HOST_MARKER) {
        clean = clean[index + HOST_MARKER.len()..].to_string();
    }

    clean.strip_suffix('/').unwrap_or(&clean).to_string()
}

#[derive(Debug, Error)]
pub enum RepoRefError {
    #[error("repository must be in owner/repo format")]
    InvalidShape,
    #[error("repository owner must be non-empty")]
    EmptyOwner,
    #[error("repository name must be non-empty")]
    EmptyName,
}

/// A validated `owner/repo` pair, the identifier form required by all
/// fetch operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(value: &str) -> Result<Self, RepoRefError> {
        let mut parts = value.split('/');
        let owner = parts.next().unwrap_or_default();
        let Some(name) = parts.next() else {
            return Err(RepoRefError::InvalidShape);
        };
        if parts.next().is_some() {
            return Err(RepoRefError::InvalidShape);
        }
        if owner.is_empty() {
            return Err(RepoRefError::EmptyOwner);
        }
        if name.is_empty() {
            return Err(RepoRefError::EmptyName);
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_host_prefix_and_trailing_slash() {
        assert_eq!(
            sanitize_repo_input("https://github.com/acme/widget/"),
            "acme/widget"
        );
        assert_eq!(sanitize_repo_input("github.com/acme/widget"), "acme/widget");
    }

    #[test]
    fn sanitize_removes_nul_bytes_and_whitespace() {
        assert_eq!(sanitize_repo_input("  acme/wid\0get \n"), "acme/widget");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "https://github.com/acme/widget/",
            "  acme/widget ",
            "acme/widget",
            "",
            "///",
            "http://github.com/a/b",
        ];
        for input in inputs {
            let once = sanitize_repo_input(input);
            assert_eq!(sanitize_repo_input(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn repo_ref_accepts_owner_slash_name() {
        let reference = RepoRef::parse("octocat/Hello-World").expect("valid reference");
        assert_eq!(reference.owner, "octocat");
        assert_eq!(reference.name, "Hello-World");
        assert_eq!(reference.full_name(), "octocat/Hello-World");
    }

    #[test]
    fn repo_ref_rejects_malformed_input() {
        assert!(matches!(
            RepoRef::parse("not-a-repo"),
            Err(RepoRefError::InvalidShape)
        ));
        assert!(matches!(
            RepoRef::parse("a/b/c"),
            Err(RepoRefError::InvalidShape)
        ));
        assert!(matches!(RepoRef::parse("/b"), Err(RepoRefError::EmptyOwner)));
        assert!(matches!(RepoRef::parse("a/"), Err(RepoRefError::EmptyName)));
    }
}
