//! Configuration file management for vigor.
//!
//! Provides a TOML-based config file at `~/.config/vigor/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use vigor_core::ai::{CommandCompleter, Completer, GeminiCompleter};
use vigor_core::generate::{GeneratorConfig, ScheduleGenerator};
use vigor_core::schedule::SchemaPolicy;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub ai: AiSection,
    #[serde(default)]
    pub generation: GenerationSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    /// Gemini API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Program run by the `command` provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_policy: Option<SchemaPolicy>,
}

/// Which AI backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    Command,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => f.write_str("gemini"),
            Self::Command => f.write_str("command"),
        }
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "command" => Ok(Self::Command),
            other => bail!("unknown AI provider {other:?} (expected gemini or command)"),
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the vigor config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/vigor` or `~/.config/vigor`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("vigor");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("vigor")
}

/// Return the path to the vigor config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // The file may hold an API key.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Flags that take precedence over env vars and the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// Skip the AI backend entirely.
    pub offline: bool,
    pub timeout_secs: Option<u64>,
    pub language: Option<String>,
}

/// The AI backend after resolution.
#[derive(Clone)]
pub enum Backend {
    /// No credential or `--offline`: every generation uses the fallback.
    None,
    Gemini { api_key: String, model: Option<String> },
    Command { program: String, args: Vec<String> },
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Gemini { model, .. } => f
                .debug_struct("Gemini")
                .field("api_key", &"[REDACTED]")
                .field("model", model)
                .finish(),
            Self::Command { program, args } => f
                .debug_struct("Command")
                .field("program", program)
                .field("args", args)
                .finish(),
        }
    }
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct VigorConfig {
    pub backend: Backend,
    pub generator: GeneratorConfig,
}

impl VigorConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Provider: `VIGOR_AI_PROVIDER` env > `ai.provider` > gemini
    /// - Gemini key: `VIGOR_GEMINI_API_KEY` env > `GEMINI_API_KEY` env > `ai.api_key` > none
    /// - Language: `--language` > `VIGOR_LANGUAGE` env > `generation.language` > English
    /// - Timeout: `--timeout` > `ai.timeout_secs` > 60 s
    ///
    /// A missing config file is not an error; a malformed one is.
    pub fn resolve(overrides: &Overrides) -> Result<Self> {
        let file_config = if config_path().exists() {
            Some(load_config()?)
        } else {
            None
        };
        Self::resolve_with(file_config.unwrap_or_default(), overrides)
    }

    fn resolve_with(file: ConfigFile, overrides: &Overrides) -> Result<Self> {
        let provider = match env_nonempty("VIGOR_AI_PROVIDER") {
            Some(raw) => raw
                .parse()
                .context("VIGOR_AI_PROVIDER env var is invalid")?,
            None => file.ai.provider.unwrap_or_default(),
        };

        let backend = if overrides.offline {
            Backend::None
        } else {
            match provider {
                Provider::Gemini => {
                    let api_key = env_nonempty("VIGOR_GEMINI_API_KEY")
                        .or_else(|| env_nonempty("GEMINI_API_KEY"))
                        .or_else(|| file.ai.api_key.clone().filter(|k| !k.trim().is_empty()));
                    match api_key {
                        Some(api_key) => Backend::Gemini {
                            api_key,
                            model: file.ai.model.clone(),
                        },
                        None => Backend::None,
                    }
                }
                Provider::Command => match file.ai.command.clone() {
                    Some(program) => Backend::Command {
                        program,
                        args: file.ai.args.clone(),
                    },
                    None => {
                        let default = CommandCompleter::default();
                        Backend::Command {
                            program: default.program().to_string(),
                            args: default.args().to_vec(),
                        }
                    }
                },
            }
        };

        let defaults = GeneratorConfig::default();
        let timeout = overrides
            .timeout_secs
            .or(file.ai.timeout_secs)
            .map_or(defaults.timeout, Duration::from_secs);
        if timeout.is_zero() {
            bail!("timeout must be at least one second");
        }
        let language = overrides
            .language
            .clone()
            .or_else(|| env_nonempty("VIGOR_LANGUAGE"))
            .or(file.generation.language)
            .unwrap_or(defaults.language);

        Ok(Self {
            backend,
            generator: GeneratorConfig {
                timeout,
                language,
                schema_policy: file.generation.schema_policy.unwrap_or_default(),
                ..defaults
            },
        })
    }

    /// Build the completer for the resolved backend, if any.
    pub fn completer(&self) -> Result<Option<Arc<dyn Completer>>> {
        let completer: Arc<dyn Completer> = match &self.backend {
            Backend::None => return Ok(None),
            Backend::Gemini { api_key, model } => {
                let mut gemini = GeminiCompleter::new(api_key.clone())?;
                if let Some(model) = model {
                    gemini = gemini.with_model(model.clone());
                }
                Arc::new(gemini)
            }
            Backend::Command { program, args } => {
                Arc::new(CommandCompleter::new(program.clone(), args.clone()))
            }
        };
        Ok(Some(completer))
    }

    /// Build a schedule generator from the resolved settings.
    pub fn schedule_generator(&self) -> Result<ScheduleGenerator> {
        Ok(ScheduleGenerator::new(
            self.completer()?,
            self.generator.clone(),
        ))
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ENV_VARS: [&str; 4] = [
        "VIGOR_AI_PROVIDER",
        "VIGOR_GEMINI_API_KEY",
        "GEMINI_API_KEY",
        "VIGOR_LANGUAGE",
    ];

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    fn clear_env() {
        for var in ENV_VARS {
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    fn parse_full_config_file() {
        let toml_src = r#"
            [ai]
            provider = "command"
            command = "llm"
            args = ["-m", "local"]
            timeout_secs = 30

            [generation]
            language = "Korean"
            schema_policy = "accept_parsed"
        "#;
        let cfg: ConfigFile = toml::from_str(toml_src).unwrap();
        assert_eq!(cfg.ai.provider, Some(Provider::Command));
        assert_eq!(cfg.ai.command.as_deref(), Some("llm"));
        assert_eq!(cfg.ai.args, vec!["-m", "local"]);
        assert_eq!(cfg.generation.schema_policy, Some(SchemaPolicy::AcceptParsed));
    }

    #[test]
    fn output_language_defaults_to_english_and_file_selects_korean() {
        let _lock = lock_env();
        clear_env();
        let profile = vigor_core::profile::ProfileDraft::with_level("250")
            .validate()
            .unwrap();

        let default = VigorConfig::resolve_with(ConfigFile::default(), &Overrides::default()).unwrap();
        let prompt = vigor_core::generate::build_prompt(&profile, &default.generator.language);
        assert!(prompt.contains("Write all text values in English."), "{prompt}");

        let file = ConfigFile {
            generation: GenerationSection {
                language: Some("Korean".to_string()),
                ..GenerationSection::default()
            },
            ..ConfigFile::default()
        };
        let korean = VigorConfig::resolve_with(file, &Overrides::default()).unwrap();
        let prompt = vigor_core::generate::build_prompt(&profile, &korean.generator.language);
        assert!(prompt.contains("Write all text values in Korean."), "{prompt}");
    }

    #[test]
    fn empty_config_file_is_valid() {
        let cfg: ConfigFile = toml::from_str("").unwrap();
        assert!(cfg.ai.provider.is_none());
        assert!(cfg.generation.language.is_none());
    }

    #[test]
    fn provider_parse() {
        assert_eq!("Gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!("command".parse::<Provider>().unwrap(), Provider::Command);
        assert!("openai".parse::<Provider>().is_err());
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };

        let original = ConfigFile {
            ai: AiSection {
                provider: Some(Provider::Gemini),
                api_key: Some("test-key".to_string()),
                ..AiSection::default()
            },
            generation: GenerationSection::default(),
        };
        let saved = save_config(&original);
        let loaded = load_config();
        let path = config_path();

        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }

        saved.unwrap();
        let loaded = loaded.unwrap();
        assert!(path.starts_with(tmp.path()));
        assert_eq!(loaded.ai.api_key.as_deref(), Some("test-key"));
        assert_eq!(loaded.ai.provider, Some(Provider::Gemini));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let meta = std::fs::metadata(&path).unwrap();
            assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        }
    }

    #[test]
    fn no_key_resolves_to_no_backend() {
        let _lock = lock_env();
        clear_env();

        let config = VigorConfig::resolve_with(ConfigFile::default(), &Overrides::default()).unwrap();
        assert!(matches!(config.backend, Backend::None));
        assert!(config.completer().unwrap().is_none());
        assert_eq!(config.generator.language, "English");
        assert_eq!(config.generator.timeout, Duration::from_secs(60));
    }

    #[test]
    fn env_key_overrides_config_file() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var("GEMINI_API_KEY", "from-env") };

        let file = ConfigFile {
            ai: AiSection {
                api_key: Some("from-file".to_string()),
                ..AiSection::default()
            },
            ..ConfigFile::default()
        };
        let config = VigorConfig::resolve_with(file, &Overrides::default());
        clear_env();

        match config.unwrap().backend {
            Backend::Gemini { api_key, .. } => assert_eq!(api_key, "from-env"),
            other => panic!("expected gemini backend, got {other:?}"),
        }
    }

    #[test]
    fn vigor_key_wins_over_generic_key() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var("GEMINI_API_KEY", "generic") };
        unsafe { std::env::set_var("VIGOR_GEMINI_API_KEY", "specific") };

        let config = VigorConfig::resolve_with(ConfigFile::default(), &Overrides::default());
        clear_env();

        match config.unwrap().backend {
            Backend::Gemini { api_key, .. } => assert_eq!(api_key, "specific"),
            other => panic!("expected gemini backend, got {other:?}"),
        }
    }

    #[test]
    fn offline_flag_ignores_credentials() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var("VIGOR_GEMINI_API_KEY", "key") };

        let overrides = Overrides {
            offline: true,
            ..Overrides::default()
        };
        let config = VigorConfig::resolve_with(ConfigFile::default(), &overrides);
        clear_env();

        assert!(matches!(config.unwrap().backend, Backend::None));
    }

    #[test]
    fn command_provider_defaults_to_claude() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var("VIGOR_AI_PROVIDER", "command") };

        let config = VigorConfig::resolve_with(ConfigFile::default(), &Overrides::default());
        clear_env();

        match config.unwrap().backend {
            Backend::Command { program, args } => {
                assert_eq!(program, "claude");
                assert_eq!(args, vec!["-p"]);
            }
            other => panic!("expected command backend, got {other:?}"),
        }
    }

    #[test]
    fn cli_flags_override_language_and_timeout() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var("VIGOR_LANGUAGE", "Korean") };

        let file = ConfigFile {
            ai: AiSection {
                timeout_secs: Some(30),
                ..AiSection::default()
            },
            generation: GenerationSection {
                language: Some("German".to_string()),
                schema_policy: Some(SchemaPolicy::AcceptParsed),
            },
        };
        let from_env = VigorConfig::resolve_with(file, &Overrides::default());
        let from_cli = VigorConfig::resolve_with(
            ConfigFile::default(),
            &Overrides {
                timeout_secs: Some(5),
                language: Some("Spanish".to_string()),
                ..Overrides::default()
            },
        );
        clear_env();

        let from_env = from_env.unwrap();
        assert_eq!(from_env.generator.language, "Korean");
        assert_eq!(from_env.generator.timeout, Duration::from_secs(30));
        assert_eq!(from_env.generator.schema_policy, SchemaPolicy::AcceptParsed);

        let from_cli = from_cli.unwrap();
        assert_eq!(from_cli.generator.language, "Spanish");
        assert_eq!(from_cli.generator.timeout, Duration::from_secs(5));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let _lock = lock_env();
        clear_env();
        let overrides = Overrides {
            timeout_secs: Some(0),
            ..Overrides::default()
        };
        assert!(VigorConfig::resolve_with(ConfigFile::default(), &overrides).is_err());
    }

    #[test]
    fn backend_debug_redacts_key() {
        let backend = Backend::Gemini {
            api_key: "secret".to_string(),
            model: None,
        };
        let dbg = format!("{backend:?}");
        assert!(!dbg.contains("secret"));
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("vigor/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
