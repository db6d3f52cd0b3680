//! Link a build script into a bound configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::script::BuildScript;
use crate::host::{BoundConfiguration, CompositionHost};
use crate::util::config::{self, Config};

/// Options for linking a build script.
#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    /// Build unit name (defaults to the script's directory name)
    pub unit: Option<String>,

    /// Explicit configuration; when `None`, global and project config files are read
    pub config: Option<Config>,
}

/// Evaluate the build script at `path` in a fresh pass and close it.
pub fn link_script(path: &Path, options: &LinkOptions) -> Result<BoundConfiguration> {
    let script = BuildScript::load(path)?;
    let project_root = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let unit = options
        .unit
        .clone()
        .or_else(|| unit_name(&project_root, path))
        .unwrap_or_else(|| script.software_type().to_string());

    let config = match &options.config {
        Some(config) => config.clone(),
        None => config::load_config(
            config::global_config_path().as_deref(),
            &config::project_config_path(&project_root),
        ),
    };

    link(&script, &unit, config)
}

/// Evaluate an already parsed script.
pub fn link(script: &BuildScript, unit: &str, config: Config) -> Result<BoundConfiguration> {
    let host = CompositionHost::new(config);
    let mut pass = host.begin_pass(unit);

    script
        .apply(&mut pass)
        .with_context(|| format!("failed to configure `{}`", unit))?;

    pass.close()
        .with_context(|| format!("failed to close the configuration pass of `{}`", unit))
}

fn unit_name(project_root: &Path, script: &Path) -> Option<String> {
    project_root
        .canonicalize()
        .ok()
        .and_then(|root| root.file_name().map(|n| n.to_string_lossy().into_owned()))
        .or_else(|| {
            script
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LinkError;
    use tempfile::TempDir;

    #[test]
    fn test_link_script_uses_directory_name() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("greeter");
        std::fs::create_dir_all(&root).unwrap();
        let path = root.join("build.unify.toml");
        std::fs::write(
            &path,
            "[kotlinApplication]\n[[kotlinApplication.targets]]\nname = \"desktop\"\nkind = \"jvm\"\n",
        )
        .unwrap();

        let bound = link_script(
            &path,
            &LinkOptions {
                config: Some(Config::default()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(bound.unit, "greeter");
        assert!(bound.compile_target("desktop").is_some());
    }

    #[test]
    fn test_link_errors_keep_link_error() {
        let script = BuildScript::parse(
            "[kotlinApplication]\n[[kotlinApplication.targets]]\nname = \"main\"\nkind = \"native\"\n",
            "build.unify.toml",
        )
        .unwrap();

        let err = link(&script, "app", Config::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LinkError>(),
            Some(LinkError::MissingRequiredProperty { .. })
        ));
    }

    #[test]
    fn test_missing_script() {
        let tmp = TempDir::new().unwrap();
        let err = link_script(&tmp.path().join("nope.toml"), &LinkOptions::default()).unwrap_err();
        assert!(err.to_string().contains("failed to read build script"));
    }
}
