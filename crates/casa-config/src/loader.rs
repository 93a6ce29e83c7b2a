//! YAML loader resolving `!secret`, `!env_var` and `!include`

use crate::error::{ConfigError, ConfigResult};
use crate::secrets::Secrets;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Loads YAML documents relative to a config directory
pub struct YamlLoader {
    config_dir: PathBuf,
    secrets: Secrets,
    /// Files currently being loaded, innermost last
    include_stack: Vec<PathBuf>,
}

impl YamlLoader {
    /// Create a loader, reading `secrets.yaml` from the config directory
    pub fn new(config_dir: impl Into<PathBuf>) -> ConfigResult<Self> {
        let config_dir = config_dir.into();
        let secrets = Secrets::load(&config_dir)?;
        Ok(Self::with_secrets(config_dir, secrets))
    }

    pub fn with_secrets(config_dir: impl Into<PathBuf>, secrets: Secrets) -> Self {
        Self {
            config_dir: config_dir.into(),
            secrets,
            include_stack: Vec::new(),
        }
    }

    /// Load a file and resolve its tags
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<Value> {
        let path = self.resolve(path.as_ref());
        if self.include_stack.contains(&path) {
            return Err(ConfigError::CircularInclude { path });
        }

        debug!("Loading YAML file: {:?}", path);
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        self.include_stack.push(path.clone());
        let result = self.load_str(&content, &path);
        self.include_stack.pop();
        result
    }

    /// Parse a YAML string and resolve its tags
    pub fn load_str(&mut self, content: &str, source: &Path) -> ConfigResult<Value> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: source.to_path_buf(),
            source: e,
        })?;
        self.resolve_value(value)
    }

    fn resolve_value(&mut self, value: Value) -> ConfigResult<Value> {
        match value {
            Value::Tagged(tagged) => self.resolve_tag(*tagged),
            Value::Mapping(map) => {
                let mut resolved = Mapping::with_capacity(map.len());
                for (k, v) in map {
                    resolved.insert(k, self.resolve_value(v)?);
                }
                Ok(Value::Mapping(resolved))
            }
            Value::Sequence(seq) => seq
                .into_iter()
                .map(|v| self.resolve_value(v))
                .collect::<ConfigResult<Vec<_>>>()
                .map(Value::Sequence),
            other => Ok(other),
        }
    }

    fn resolve_tag(&mut self, tagged: TaggedValue) -> ConfigResult<Value> {
        let tag = tagged.tag.to_string();
        trace!("Resolving tag {}", tag);

        match tag.as_str() {
            "!secret" => {
                let key = tag_argument(&tag, tagged.value)?;
                let secret = self.secrets.get(&key)?;
                Ok(Value::String(secret.to_string()))
            }
            "!env_var" => {
                let var = tag_argument(&tag, tagged.value)?;
                std::env::var(&var)
                    .map(Value::String)
                    .map_err(|_| ConfigError::EnvVarNotFound { var })
            }
            "!include" => {
                let file = tag_argument(&tag, tagged.value)?;
                let path = self.resolve(Path::new(&file));
                if !path.exists() {
                    return Err(ConfigError::IncludeNotFound { path });
                }
                self.load_file(path)
            }
            _ => {
                let value = self.resolve_value(tagged.value)?;
                Ok(Value::Tagged(Box::new(TaggedValue {
                    tag: tagged.tag,
                    value,
                })))
            }
        }
    }

    /// Relative paths resolve against the including file, or the config dir
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        let base = self
            .include_stack
            .last()
            .and_then(|p| p.parent())
            .unwrap_or(&self.config_dir);
        base.join(path)
    }
}

fn tag_argument(tag: &str, value: Value) -> ConfigResult<String> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(ConfigError::InvalidValue {
            key: tag.to_string(),
            reason: "argument must be a string".to_string(),
        }),
    }
}

/// Load `file` from `config_dir`, resolving custom tags
pub fn load_yaml(config_dir: impl AsRef<Path>, file: impl AsRef<Path>) -> ConfigResult<Value> {
    let mut loader = YamlLoader::new(config_dir.as_ref())?;
    loader.load_file(file)
}
