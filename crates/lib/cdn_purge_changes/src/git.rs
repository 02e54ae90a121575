use crate::{ChangeSetSource, ChangesError, command::run_command};
use regex::Regex;
use std::{path::PathBuf, sync::LazyLock};
use tracing::{info, instrument};

// `git log --name-status -z` status fields. Copies and renames carry a
// similarity score and are followed by two paths, everything else by one.
static STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(?<changed>[AMD])|(?<renamed>R)|(?<copied>C)|[TUXB])\d*$").unwrap());

/// Files changed between two commits of a local git checkout.
#[derive(Debug, Clone)]
pub struct GitChangeSet {
    git_bin: PathBuf,
    repository: PathBuf,
}

impl GitChangeSet {
    pub fn new(git_bin: impl Into<PathBuf>, repository: impl Into<PathBuf>) -> Self {
        Self {
            git_bin: git_bin.into(),
            repository: repository.into(),
        }
    }
}

impl ChangeSetSource for GitChangeSet {
    #[instrument(skip(self), fields(repository = %self.repository.display()))]
    async fn changed_files(&self, previous: &str, current: &str) -> Result<Vec<String>, ChangesError> {
        let range = format!("{previous}..{current}");
        let output = run_command(
            &self.git_bin,
            [
                "-c",
                "core.quotePath=false",
                "log",
                "--name-status",
                "-z",
                "--format=",
                range.as_str(),
            ],
            Some(self.repository.as_path()),
        )
        .await?;

        let files = parse_name_status(&output);
        info!(count = files.len(), %range, "collected changed files");
        Ok(files)
    }
}

/// Extract the paths of added, modified, deleted and renamed files from
/// NUL-separated `git log --name-status -z` output.
///
/// Paths arrive verbatim, tabs, quotes and non-ASCII names included. A file
/// touched by several commits in the range shows up once per commit,
/// duplicates are kept. Renames contribute both the old and the new path.
pub fn parse_name_status(output: &str) -> Vec<String> {
    let mut fields = output.split('\0');
    let mut files = Vec::new();

    while let Some(field) = fields.next() {
        // commits are separated by newlines in front of their first status
        let Some(status) = STATUS.captures(field.trim_start_matches('\n')) else {
            continue;
        };

        let (paths, keep) = if status.name("changed").is_some() {
            (1, true)
        } else if status.name("renamed").is_some() {
            (2, true)
        } else if status.name("copied").is_some() {
            (2, false)
        } else {
            (1, false)
        };

        for path in fields.by_ref().take(paths) {
            if keep && !path.is_empty() {
                files.push(path.to_owned());
            }
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn parses_git_log() {
        let output = concat!(
            "M\0static/app.js\0",
            "A\0static/new file.css\0",
            "\nD\0templates/old.html\0",
            "M\0static/app.js\0",
            "R087\0static/logo.png\0static/img/logo.png\0",
        );

        assert_eq!(
            parse_name_status(output),
            vec![
                "static/app.js",
                "static/new file.css",
                "templates/old.html",
                "static/app.js",
                "static/logo.png",
                "static/img/logo.png",
            ]
        );
    }

    #[test]
    fn keeps_names_git_would_quote() {
        let output = concat!(
            "A\0\u{fc}n\u{ef}code.txt\0",
            "M\0with\ttab.js\0",
            "M\0\"quoted\" back\\slash.css\0",
            "A\0new\nline.txt\0",
        );

        assert_eq!(
            parse_name_status(output),
            vec![
                "\u{fc}n\u{ef}code.txt",
                "with\ttab.js",
                "\"quoted\" back\\slash.css",
                "new\nline.txt",
            ]
        );
    }

    #[test_case("T\0static/link\0"; "type change")]
    #[test_case("C075\0a.js\0b.js\0"; "copy")]
    #[test_case("X\0broken\0"; "unknown")]
    #[test_case(""; "empty")]
    fn ignores_other_entries(output: &str) {
        assert!(parse_name_status(output).is_empty());
    }

    #[test]
    fn other_entries_do_not_shift_paths() {
        let output = "C100\0A\0M\0T\0D\0M\0real.js\0";
        assert_eq!(parse_name_status(output), vec!["real.js"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_git_in_repository() {
        let dir = tempfile::tempdir().unwrap();
        let repository = dir.path().join("repo");
        std::fs::create_dir(&repository).unwrap();

        let script = crate::test_utils::fake_command(
            dir.path(),
            "git",
            indoc! {r#"
                [ "$(basename "$PWD")" = "repo" ] || exit 3
                [ "$*" = "-c core.quotePath=false log --name-status -z --format= aaa..bbb" ] || exit 4
                printf 'M\0index.html\0\nD\0old.css\0'
            "#},
        );

        let files = GitChangeSet::new(script, &repository)
            .changed_files("aaa", "bbb")
            .await
            .unwrap();
        assert_eq!(files, vec!["index.html", "old.css"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn keeps_unicode_names_from_git() {
        let dir = tempfile::tempdir().unwrap();
        let script = crate::test_utils::fake_command(
            dir.path(),
            "git",
            r"printf 'A\0\303\274n\303\257code.txt\0M\0a\tb.js\0'",
        );

        let files = GitChangeSet::new(script, dir.path())
            .changed_files("aaa", "bbb")
            .await
            .unwrap();
        assert_eq!(files, vec!["\u{fc}n\u{ef}code.txt", "a\tb.js"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unknown_revision_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = crate::test_utils::fake_command(
            dir.path(),
            "git",
            "echo \"fatal: bad revision 'aaa..bbb'\" >&2; exit 128",
        );

        let err = GitChangeSet::new(script, dir.path())
            .changed_files("aaa", "bbb")
            .await
            .unwrap_err();
        assert!(matches!(err, ChangesError::CommandFailed { .. }), "{err:?}");
    }
}
