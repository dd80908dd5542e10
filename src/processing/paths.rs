//! Output path resolution

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ConversionRequest;
use crate::error::{ConvertError, ErrorContext, Result};
use crate::processing::discovery::Candidate;

/// Where a candidate will be written and which directories must exist first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    pub output_path: PathBuf,
    /// Parent-first; every entry is an ancestor of (or equal to) the output's parent
    pub directories: Vec<PathBuf>,
}

impl OutputPlan {
    /// Whether something already occupies the output path
    pub fn output_exists(&self) -> bool {
        fs::symlink_metadata(&self.output_path).is_ok()
    }

    /// Create the planned directories, tolerating ones that already exist
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in &self.directories {
            fs::create_dir_all(dir).with_file_context(dir.clone())?;
        }
        Ok(())
    }
}

/// Compute the output plan for a candidate.
///
/// * no output root: next to the input, extension swapped
/// * output root, flat: `output_root/<stem>.<ext>`
/// * output root, recursive: `output_root/<relative dir>/<stem>.<ext>`
pub fn plan_output(candidate: &Candidate, request: &ConversionRequest) -> Result<OutputPlan> {
    let file_name = output_file_name(&candidate.path, request.target.extension())?;

    let plan = match &request.output_root {
        None => OutputPlan {
            output_path: candidate.path.with_file_name(file_name),
            directories: Vec::new(),
        },
        Some(output_root) if !request.recursive => OutputPlan {
            output_path: output_root.join(file_name),
            directories: vec![output_root.clone()],
        },
        Some(output_root) => {
            let relative_dir = candidate.relative.parent().unwrap_or(Path::new(""));

            let mut directories = vec![output_root.clone()];
            let mut current = output_root.clone();
            for component in relative_dir.components() {
                current.push(component);
                directories.push(current.clone());
            }

            OutputPlan {
                output_path: current.join(file_name),
                directories,
            }
        }
    };

    debug!("Planned {:?} -> {:?}", candidate.path, plan.output_path);
    Ok(plan)
}

/// `<stem>.<extension>` for the input's file name
fn output_file_name(input: &Path, extension: &str) -> Result<OsString> {
    let stem = input.file_stem().ok_or_else(|| {
        ConvertError::unsupported_format("file name has no stem", Some(input.to_path_buf()))
    })?;

    let mut name = stem.to_os_string();
    name.push(".");
    name.push(extension);
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetFormat;

    fn candidate(root: &str, relative: &str) -> Candidate {
        let root = Path::new(root);
        Candidate::new(root, root.join(relative))
    }

    #[test]
    fn test_in_place_plan() {
        let request = ConversionRequest::new("in");
        let plan = plan_output(&candidate("in", "sub/photo.jpg"), &request).unwrap();

        assert_eq!(plan.output_path, PathBuf::from("in/sub/photo.png"));
        assert!(plan.directories.is_empty());
    }

    #[test]
    fn test_in_place_same_extension_targets_itself() {
        let request = ConversionRequest::new("in");
        let plan = plan_output(&candidate("in", "c.png"), &request).unwrap();
        assert_eq!(plan.output_path, PathBuf::from("in/c.png"));
    }

    #[test]
    fn test_flat_plan() {
        let request = ConversionRequest::new("in").output_root("out");
        let plan = plan_output(&candidate("in", "photo.jpeg"), &request).unwrap();

        assert_eq!(plan.output_path, PathBuf::from("out/photo.png"));
        assert_eq!(plan.directories, vec![PathBuf::from("out")]);
    }

    #[test]
    fn test_mirrored_plan() {
        let request = ConversionRequest::new("in").output_root("out").recursive(true);
        let plan = plan_output(&candidate("in", "a/b/d.gif"), &request).unwrap();

        assert_eq!(plan.output_path, PathBuf::from("out/a/b/d.png"));
        assert_eq!(
            plan.directories,
            vec![
                PathBuf::from("out"),
                PathBuf::from("out/a"),
                PathBuf::from("out/a/b"),
            ]
        );
    }

    #[test]
    fn test_mirrored_plan_top_level_file() {
        let request = ConversionRequest::new("in").output_root("out").recursive(true);
        let plan = plan_output(&candidate("in", "top.bmp"), &request).unwrap();

        assert_eq!(plan.output_path, PathBuf::from("out/top.png"));
        assert_eq!(plan.directories, vec![PathBuf::from("out")]);
    }

    #[test]
    fn test_only_last_extension_is_replaced() {
        let request = ConversionRequest::new("in").target(TargetFormat::WebP);
        let plan = plan_output(&candidate("in", "archive.tar.jpg"), &request).unwrap();
        assert_eq!(plan.output_path, PathBuf::from("in/archive.tar.webp"));
    }

    #[test]
    fn test_ensure_directories_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let plan = OutputPlan {
            output_path: dir.path().join("out/sub/x.png"),
            directories: vec![dir.path().join("out"), dir.path().join("out/sub")],
        };

        plan.ensure_directories().unwrap();
        plan.ensure_directories().unwrap();
        assert!(dir.path().join("out/sub").is_dir());
        assert!(!plan.output_exists());
    }

    #[test]
    fn test_directory_failure_names_the_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("out");
        fs::write(&blocker, b"regular file").unwrap();
        let plan = OutputPlan {
            output_path: blocker.join("x.png"),
            directories: vec![blocker.clone()],
        };

        let err = plan.ensure_directories().unwrap_err();
        match &err {
            ConvertError::PathIo { path, .. } => assert_eq!(path, &blocker),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains(&format!("{:?}", blocker)));
    }
}
