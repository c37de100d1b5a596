//! Child-process environments for gem isolation.
//!
//! Each execution attempt owns its own snapshot of the host environment with
//! the RubyGems variables rewritten. The host process environment is read once
//! and never modified.

use std::collections::{BTreeMap, HashMap};
use std::ffi::{OsStr, OsString};
use std::path::Path;

pub const GEM_HOME: &str = "GEM_HOME";
pub const GEM_PATH: &str = "GEM_PATH";
pub const PATH: &str = "PATH";

#[cfg(windows)]
const PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_SEPARATOR: &str = ":";

/// Variables are kept as `OsString` so host values that are not valid UTF-8
/// reach the child unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionEnvironment {
    variables: BTreeMap<OsString, OsString>,
}

impl ExecutionEnvironment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_host() -> Self {
        Self {
            variables: std::env::vars_os().collect(),
        }
    }

    /// Host environment with the install root pointed at the persistent store.
    pub fn shared(install_dir: &Path) -> Self {
        Self::from_host().into_shared(install_dir)
    }

    /// Host environment with install root, lookup path and executable search
    /// path all redirected into `gem_home`.
    pub fn isolated(gem_home: &Path) -> Self {
        Self::from_host().into_isolated(gem_home)
    }

    pub fn into_shared(self, install_dir: &Path) -> Self {
        self.with_var(GEM_HOME, install_dir)
    }

    pub fn into_isolated(self, gem_home: &Path) -> Self {
        let mut env = self.with_var(GEM_HOME, gem_home).with_var(GEM_PATH, gem_home);
        env.prepend_path(&gem_home.join("bin"));
        env
    }

    pub fn with_var(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.variables
            .insert(key.as_ref().to_os_string(), value.as_ref().to_os_string());
        self
    }

    /// Value of `key`, if set and valid UTF-8.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_os(key).and_then(OsStr::to_str)
    }

    pub fn get_os(&self, key: &str) -> Option<&OsStr> {
        self.variables.get(OsStr::new(key)).map(OsString::as_os_str)
    }

    pub fn prepend_path(&mut self, dir: &Path) {
        let mut path = dir.as_os_str().to_os_string();
        if let Some(existing) = self.get_os(PATH).filter(|p| !p.is_empty()) {
            path.push(PATH_SEPARATOR);
            path.push(existing);
        }
        self.variables.insert(OsString::from(PATH), path);
    }

    /// Layer configured variables on top of the current ones.
    pub fn merge(mut self, extra: &HashMap<String, String>) -> Self {
        for (key, value) in extra {
            self.variables
                .insert(OsString::from(key), OsString::from(value));
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsString, &OsString)> {
        self.variables.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::PathBuf;

    #[test]
    #[serial]
    fn test_shared_points_gem_home_at_store() {
        let env = ExecutionEnvironment::shared(Path::new("/home/dev/.gem"));
        assert_eq!(env.get(GEM_HOME), Some("/home/dev/.gem"));
        assert_eq!(env.get(PATH), std::env::var(PATH).ok().as_deref());
    }

    #[test]
    #[serial]
    fn test_isolated_redirects_all_three() {
        let gem_home = PathBuf::from("/tmp/code-exec-abc/.gem");
        let env = ExecutionEnvironment::isolated(&gem_home);

        assert_eq!(env.get(GEM_HOME), Some("/tmp/code-exec-abc/.gem"));
        assert_eq!(env.get(GEM_PATH), Some("/tmp/code-exec-abc/.gem"));
        let path = env.get(PATH).unwrap();
        assert!(path.starts_with("/tmp/code-exec-abc/.gem/bin"));
    }

    #[test]
    #[serial]
    fn test_isolated_does_not_touch_host() {
        let before = std::env::var(GEM_HOME).ok();
        let _env = ExecutionEnvironment::isolated(Path::new("/tmp/elsewhere/.gem"));
        assert_eq!(std::env::var(GEM_HOME).ok(), before);
    }

    #[test]
    fn test_prepend_path_on_empty() {
        let mut env = ExecutionEnvironment::empty();
        env.prepend_path(Path::new("/opt/bin"));
        assert_eq!(env.get(PATH), Some("/opt/bin"));

        env.prepend_path(Path::new("/first"));
        assert_eq!(env.get(PATH), Some(format!("/first{}/opt/bin", PATH_SEPARATOR).as_str()));
    }

    #[test]
    fn test_strategy_applies_after_merge() {
        let extra: HashMap<String, String> = [
            (GEM_HOME.to_string(), "/somewhere/else".to_string()),
            (PATH.to_string(), "/custom/bin".to_string()),
            ("RUBYOPT".to_string(), "-W0".to_string()),
        ]
        .into_iter()
        .collect();

        let env = ExecutionEnvironment::empty()
            .merge(&extra)
            .into_isolated(Path::new("/ws/.gem"));

        assert_eq!(env.get(GEM_HOME), Some("/ws/.gem"));
        assert_eq!(env.get(GEM_PATH), Some("/ws/.gem"));
        assert_eq!(
            env.get(PATH),
            Some(format!("/ws/.gem/bin{}/custom/bin", PATH_SEPARATOR).as_str())
        );
        assert_eq!(env.get("RUBYOPT"), Some("-W0"));
        assert_eq!(env.iter().count(), 4);
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_host_snapshot_keeps_non_utf8_values() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"caf\xe9");
        std::env::set_var("RBEXEC_LATIN1_VALUE", raw);
        let env = ExecutionEnvironment::from_host();
        std::env::remove_var("RBEXEC_LATIN1_VALUE");

        assert_eq!(env.get_os("RBEXEC_LATIN1_VALUE"), Some(raw));
        assert_eq!(env.get("RBEXEC_LATIN1_VALUE"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_prepend_path_keeps_non_utf8_entries() {
        use std::os::unix::ffi::OsStrExt;

        let mut env = ExecutionEnvironment::empty()
            .with_var(PATH, OsStr::from_bytes(b"/opt/caf\xe9/bin"));
        env.prepend_path(Path::new("/ws/.gem/bin"));

        assert_eq!(
            env.get_os(PATH).map(OsStrExt::as_bytes),
            Some(&b"/ws/.gem/bin:/opt/caf\xe9/bin"[..])
        );
    }
}
