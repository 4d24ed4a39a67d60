use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Errors for resolving the home directory
#[derive(Debug, thiserror::Error)]
pub enum HomeDirError {
    #[error("HOME environment variable is not set")]
    HomeMissing,
    #[error("APPDATA environment variable is not set")]
    AppDataMissing,
    #[error("home_dir must be an absolute path (after ~ expansion): {0}")]
    AbsoluteRequired(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve the working directory.
///
/// A configured value may start with `~` (expanded to the user home) and must be
/// absolute after expansion. Without one, `default_subdir` is placed under
/// `$HOME` (`%APPDATA%` on Windows). With `create`, the directory is created.
pub fn resolve_home_dir(
    config_home: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let path = match config_home {
        Some(raw) => {
            let expanded = expand_tilde(&raw)?;
            if !expanded.is_absolute() {
                return Err(HomeDirError::AbsoluteRequired(
                    expanded.to_string_lossy().into(),
                ));
            }
            expanded
        }
        None => default_base()?.join(default_subdir),
    };

    if create {
        fs::create_dir_all(&path)?;
    }
    Ok(path)
}

fn user_home() -> Result<PathBuf, HomeDirError> {
    #[cfg(target_os = "windows")]
    let home = env::var("USERPROFILE").or_else(|_| env::var("HOME"));
    #[cfg(not(target_os = "windows"))]
    let home = env::var("HOME");

    home.map(PathBuf::from).map_err(|_| HomeDirError::HomeMissing)
}

fn default_base() -> Result<PathBuf, HomeDirError> {
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .map(PathBuf::from)
            .map_err(|_| HomeDirError::AppDataMissing)
    }
    #[cfg(not(target_os = "windows"))]
    {
        user_home()
    }
}

fn expand_tilde(raw: &str) -> Result<PathBuf, HomeDirError> {
    if raw == "~" {
        return user_home();
    }
    let rest = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\"));
    match rest {
        Some(rest) => Ok(user_home()?.join(rest)),
        None => Ok(Path::new(raw).to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absolute_path_is_kept_and_created() {
        let tmp = tempdir().unwrap();
        let wanted = tmp.path().join("nested").join("home");

        let result =
            resolve_home_dir(Some(wanted.to_string_lossy().into()), ".wirekit", true).unwrap();

        assert_eq!(result, wanted);
        assert!(result.is_dir());
    }

    #[test]
    fn relative_path_is_rejected() {
        let err = resolve_home_dir(Some("relative/dir".into()), ".wirekit", false).unwrap_err();
        assert!(matches!(err, HomeDirError::AbsoluteRequired(_)), "{err}");
    }

    #[test]
    #[cfg(not(target_os = "windows"))]
    fn tilde_expands_to_home() {
        let home = user_home().unwrap();
        let result = resolve_home_dir(Some("~/wirekit-test".into()), ".wirekit", false).unwrap();
        assert_eq!(result, home.join("wirekit-test"));
        assert!(!result.to_string_lossy().starts_with('~'));

        let bare = resolve_home_dir(Some("~".into()), ".wirekit", false).unwrap();
        assert_eq!(bare, home);
    }

    #[test]
    #[cfg(not(target_os = "windows"))]
    fn default_goes_under_home() {
        let result = resolve_home_dir(None, ".wirekit", false).unwrap();
        assert!(result.ends_with(".wirekit"));
        assert!(result.is_absolute());
    }
}
