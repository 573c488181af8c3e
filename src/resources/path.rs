//! Platform-aware path joining.
//!
//! Every path the pipeline builds out of a directory and an authored name goes
//! through [`resolve`]. Fragments may use `/` or `\` interchangeably; the result
//! uses the host separator with no doubled or missing separators.

use std::path::{MAIN_SEPARATOR_STR, PathBuf};

/// Join `relative_name` onto `base_dir`.
///
/// * an empty `base_dir` yields `relative_name` as-is (normalized)
/// * an absolute `relative_name` replaces `base_dir`
/// * `.` segments are dropped and `..` pops the preceding segment; `..` never
///   climbs above a root
///
/// Pure path algebra, the filesystem is never touched.
pub fn resolve(base_dir: impl AsRef<std::path::Path>, relative_name: impl AsRef<std::path::Path>) -> PathBuf {
    let base = base_dir.as_ref().to_string_lossy();
    let relative = relative_name.as_ref().to_string_lossy();

    if base.is_empty() || is_absolute(&relative) {
        return Fragments::parse(&relative).into_path();
    }
    let mut fragments = Fragments::parse(&base);
    fragments.append(&relative);
    fragments.into_path()
}

/// Absolute in either convention: `/x`, `\x`, `C:\x` or `C:/x`.
pub fn is_absolute(path: &str) -> bool {
    path.starts_with(['/', '\\']) || drive_prefix(path).is_some()
}

fn drive_prefix(path: &str) -> Option<&str> {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        Some(&path[..2])
    } else {
        None
    }
}

#[derive(Debug, Default)]
struct Fragments {
    /// `Some("")` for a plain root, `Some("C:")` for a drive root.
    root: Option<String>,
    segments: Vec<String>,
}

impl Fragments {
    fn parse(path: &str) -> Self {
        let mut fragments = Fragments::default();
        let rest = match drive_prefix(path) {
            Some(drive) => {
                fragments.root = Some(drive.to_string());
                &path[drive.len()..]
            }
            None if path.starts_with(['/', '\\']) => {
                fragments.root = Some(String::new());
                path
            }
            None => path,
        };
        fragments.append(rest);
        fragments
    }

    fn append(&mut self, path: &str) {
        for segment in path.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => match self.segments.last().map(String::as_str) {
                    Some(last) if last != ".." => {
                        self.segments.pop();
                    }
                    // can't climb above a root
                    _ if self.root.is_some() => {}
                    _ => self.segments.push("..".to_string()),
                },
                segment => self.segments.push(segment.to_string()),
            }
        }
    }

    fn into_path(self) -> PathBuf {
        let mut path = match self.root {
            Some(drive) => PathBuf::from(format!("{drive}{MAIN_SEPARATOR_STR}")),
            None => PathBuf::new(),
        };
        for segment in self.segments {
            path.push(segment);
        }
        path
    }
}
