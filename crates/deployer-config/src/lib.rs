pub mod error;

pub use error::*;

use deployer_core::{TagPolicy, TemplateSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming a config file directly
pub const CONFIG_PATH_ENV: &str = "DEPLOYER_CONFIG_PATH";

const CANDIDATES: [&str; 4] = [
    "deployer.local.yml",
    ".deployer.local.yml",
    "deployer.yml",
    ".deployer.yml",
];

/// Tool configuration
///
/// ```yaml
/// manifest_dir: deploy
/// tag_policy: v-prefixed
/// template: stack.template.yml
/// timeout_secs: 300
/// apply:
///   program: docker
///   args: [stack, deploy, --compose-file, "{manifest}", "{project}"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployerConfig {
    /// Directory the rendered manifest is written to; unset means the
    /// current directory
    pub manifest_dir: Option<PathBuf>,
    pub tag_policy: TagPolicy,
    /// Project template replacing the built-in one
    pub template: Option<PathBuf>,
    /// Limit for the apply command; unset waits indefinitely
    pub timeout_secs: Option<u64>,
    pub apply: ApplyConfig,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            manifest_dir: None,
            tag_policy: TagPolicy::default(),
            template: None,
            timeout_secs: None,
            apply: ApplyConfig::default(),
        }
    }
}

impl DeployerConfig {
    /// Read a config file. Relative `manifest_dir` and `template` paths are
    /// resolved against the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: Self =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.manifest_dir = config.manifest_dir.map(|dir| relative_to(base, dir));
        config.template = config.template.map(|template| relative_to(base, template));

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.apply.program.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "apply.program must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-project manifest file, so releases of different projects never
    /// write the same path.
    pub fn manifest_path(&self, project: &str) -> PathBuf {
        self.manifest_dir
            .as_deref()
            .unwrap_or_else(|| Path::new("."))
            .join(format!("docker-compose.{project}.yml"))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn template_source(&self) -> TemplateSource {
        TemplateSource::from_path(self.template.clone())
    }
}

fn relative_to(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}

/// Orchestration-apply command
///
/// `{manifest}` and `{project}` are substituted inside each argument; the
/// arguments are handed to the program as-is, without a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplyConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
            args: ["stack", "deploy", "--compose-file", "{manifest}", "{project}"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ApplyConfig {
    pub fn render_args(&self, manifest: &Path, project: &str) -> Vec<String> {
        let manifest = manifest.display().to_string();
        let vars = [("manifest", manifest.as_str()), ("project", project)];
        self.args.iter().map(|arg| expand(arg, &vars)).collect()
    }
}

/// Single pass, so substituted values are never expanded again.
fn expand(arg: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut rest = arg;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];

        let value = tail.split_once('}').and_then(|(name, after)| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, after))
        });

        match value {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Locate the config file
///
/// Search order:
/// 1. `explicit` (the `--config` flag); must exist
/// 2. environment variable `DEPLOYER_CONFIG_PATH`
/// 3. current directory: deployer.local.yml, .deployer.local.yml, deployer.yml, .deployer.yml
/// 4. ./.deployer/ with the same names
/// 5. ~/.config/deployer/config.yml
///
/// `Ok(None)` means no file anywhere; built-in defaults apply.
pub fn find_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        tracing::warn!(
            "{} points to a missing file: {}",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;
    for dir in [current_dir.clone(), current_dir.join(".deployer")] {
        if !dir.is_dir() {
            continue;
        }
        for filename in &CANDIDATES {
            let path = dir.join(filename);
            if path.exists() {
                return Ok(Some(path));
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("deployer").join("config.yml");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// Find and read the config, falling back to defaults.
pub fn load(explicit: Option<&Path>) -> Result<DeployerConfig> {
    match find_config_file(explicit)? {
        Some(path) => DeployerConfig::from_path(path),
        None => {
            tracing::debug!("No config file found, using defaults");
            Ok(DeployerConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    /// Run `f` with the process cwd moved to `dir`.
    fn in_dir<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        let result = f();
        std::env::set_current_dir(original_dir).unwrap();
        result
    }

    #[test]
    fn test_defaults() {
        let config = DeployerConfig::default();

        assert_eq!(config.tag_policy, TagPolicy::Plain);
        assert_eq!(config.apply.program, "docker");
        assert_eq!(config.timeout(), None);
        assert_eq!(config.template_source(), TemplateSource::Builtin);
        assert_eq!(
            config.manifest_path("orders"),
            PathBuf::from("./docker-compose.orders.yml")
        );
    }

    #[test]
    fn test_render_default_apply_args() {
        let args = ApplyConfig::default()
            .render_args(Path::new("out/docker-compose.orders.yml"), "orders");

        assert_eq!(
            args,
            vec![
                "stack",
                "deploy",
                "--compose-file",
                "out/docker-compose.orders.yml",
                "orders"
            ]
        );
    }

    #[test]
    fn test_expand_is_single_pass() {
        let vars = [("manifest", "{project}.yml"), ("project", "p")];
        assert_eq!(expand("-f={manifest}", &vars), "-f={project}.yml");
        assert_eq!(expand("{unknown}/{project}", &vars), "{unknown}/p");
        assert_eq!(expand("{project", &vars), "{project");
    }

    #[test]
    fn test_from_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("deployer.yml");
        fs::write(
            &path,
            r#"
manifest_dir: out
tag_policy: v-prefixed
template: stack.yml
timeout_secs: 30
apply:
  program: echo
  args: ["{project}"]
"#,
        )
        .unwrap();

        let config = DeployerConfig::from_path(&path).unwrap();

        assert_eq!(config.manifest_dir, Some(temp_dir.path().join("out")));
        assert_eq!(config.tag_policy, TagPolicy::VPrefixed);
        assert_eq!(config.template, Some(temp_dir.path().join("stack.yml")));
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.apply.program, "echo");
        assert_eq!(config.apply.render_args(Path::new("m.yml"), "shop"), vec!["shop"]);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("deployer.yml");
        fs::write(&path, "tag_policy: plain\n").unwrap();

        let config = DeployerConfig::from_path(&path).unwrap();
        assert_eq!(config.apply, ApplyConfig::default());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("deployer.yml");
        fs::write(&path, "tag_polcy: plain\n").unwrap();

        let result = DeployerConfig::from_path(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("deployer.yml");
        fs::write(&path, "timeout_secs: 0\n").unwrap();

        let result = DeployerConfig::from_path(&path);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_explicit_missing_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("nope.yml");

        let result = find_config_file(Some(&missing));
        assert!(matches!(result, Err(ConfigError::NotFound(p)) if p == missing));
    }

    #[test]
    #[serial]
    fn test_find_in_current_dir_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("deployer.yml"), "{}").unwrap();
        fs::write(temp_dir.path().join("deployer.local.yml"), "{}").unwrap();

        let found = temp_env::with_var_unset(CONFIG_PATH_ENV, || {
            in_dir(temp_dir.path(), || find_config_file(None).unwrap())
        });

        assert!(found.unwrap().ends_with("deployer.local.yml"));
    }

    #[test]
    #[serial]
    fn test_find_in_deployer_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_dir = temp_dir.path().join(".deployer");
        fs::create_dir(&config_dir).unwrap();
        fs::write(config_dir.join("deployer.yml"), "{}").unwrap();

        let found = temp_env::with_var_unset(CONFIG_PATH_ENV, || {
            in_dir(temp_dir.path(), || find_config_file(None).unwrap())
        });

        assert!(found.unwrap().ends_with(".deployer/deployer.yml"));
    }

    #[test]
    #[serial]
    fn test_find_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yml");
        fs::write(&config_path, "{}").unwrap();

        let found = temp_env::with_var(CONFIG_PATH_ENV, Some(&config_path), || {
            find_config_file(None).unwrap()
        });

        assert_eq!(found, Some(config_path));
    }

    #[test]
    #[serial]
    #[cfg(target_os = "linux")]
    fn test_global_config_and_fallback() {
        let project_dir = tempfile::tempdir().unwrap();
        let xdg_dir = tempfile::tempdir().unwrap();

        let vars = [
            (CONFIG_PATH_ENV, None),
            ("XDG_CONFIG_HOME", Some(xdg_dir.path().as_os_str())),
        ];

        // nothing anywhere: defaults
        let config = temp_env::with_vars(vars, || in_dir(project_dir.path(), || load(None).unwrap()));
        assert_eq!(config, DeployerConfig::default());

        let global_dir = xdg_dir.path().join("deployer");
        fs::create_dir(&global_dir).unwrap();
        fs::write(global_dir.join("config.yml"), "tag_policy: v-prefixed\n").unwrap();

        let config = temp_env::with_vars(vars, || in_dir(project_dir.path(), || load(None).unwrap()));
        assert_eq!(config.tag_policy, TagPolicy::VPrefixed);
        assert_eq!(
            config.manifest_path("orders"),
            PathBuf::from("./docker-compose.orders.yml")
        );
    }

    #[test]
    fn test_relative_manifest_dir_follows_config_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_dir = temp_dir.path().join("deployer");
        fs::create_dir(&config_dir).unwrap();
        let path = config_dir.join("config.yml");
        fs::write(&path, "manifest_dir: out\n").unwrap();

        let config = DeployerConfig::from_path(&path).unwrap();

        assert_eq!(
            config.manifest_path("orders"),
            config_dir.join("out").join("docker-compose.orders.yml")
        );
    }

    #[test]
    fn test_absolute_manifest_dir_kept() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("deployer.yml");
        fs::write(&path, format!("manifest_dir: {}\n", target.path().display())).unwrap();

        let config = DeployerConfig::from_path(&path).unwrap();
        assert_eq!(config.manifest_dir.as_deref(), Some(target.path()));
    }
}
