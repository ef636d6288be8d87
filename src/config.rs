use crate::error::ConfigError;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// 记录存储后端
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    /// 进程内存储，仅用于本地调试
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("未知的存储后端: {}", other)),
        }
    }
}

/// 程序配置
///
/// 在启动时加载一次，然后显式传给存储和各个客户端。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 存储配置 ---
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// 启动时执行内置迁移
    pub run_migrations: bool,
    // --- HTTP 服务配置 ---
    pub bind_addr: String,
    /// 未指定时每批处理的文档数量
    pub default_batch_size: usize,
    /// 单批文档数量上限
    pub max_batch_size: usize,
    // --- 增强服务配置 ---
    pub captioning_api_url: String,
    pub ocr_api_url: String,
    pub face_api_url: String,
    /// 单次调用超时（秒）
    pub client_timeout_secs: u64,
    pub client_connect_timeout_secs: u64,
    /// 相对路径形式的文档定位符以此为根目录
    pub payload_root: String,
    // --- 日志配置 ---
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// `text` 或 `json`
    pub log_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Postgres,
            database_url: String::new(),
            db_max_connections: 5,
            db_acquire_timeout_secs: 5,
            run_migrations: true,
            bind_addr: "0.0.0.0:8080".to_string(),
            default_batch_size: 10,
            max_batch_size: 100,
            captioning_api_url: String::new(),
            ocr_api_url: String::new(),
            face_api_url: String::new(),
            client_timeout_secs: 60,
            client_connect_timeout_secs: 10,
            payload_root: ".".to_string(),
            verbose_logging: false,
            log_format: "text".to_string(),
        }
    }
}

impl Config {
    /// 加载配置：可选的 TOML 文件（`CONFIG_FILE`），再用环境变量覆盖，最后校验
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("CONFIG_FILE") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(&path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 用 `lookup` 提供的变量覆盖当前值
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup: &lookup };

        env.set(&mut self.store_backend, "STORE_BACKEND", "store backend")?;
        env.set_string(&mut self.database_url, "DATABASE_URL");
        env.set(&mut self.db_max_connections, "DB_MAX_CONNECTIONS", "u32")?;
        env.set(&mut self.db_acquire_timeout_secs, "DB_ACQUIRE_TIMEOUT_SECS", "u64")?;
        env.set(&mut self.run_migrations, "RUN_MIGRATIONS", "bool")?;
        env.set_string(&mut self.bind_addr, "BIND_ADDR");
        env.set(&mut self.default_batch_size, "DEFAULT_BATCH_SIZE", "usize")?;
        env.set(&mut self.max_batch_size, "MAX_BATCH_SIZE", "usize")?;
        env.set_string(&mut self.captioning_api_url, "CAPTIONING_API_URL");
        env.set_string(&mut self.ocr_api_url, "OCR_API_URL");
        env.set_string(&mut self.face_api_url, "FACE_API_URL");
        env.set(&mut self.client_timeout_secs, "CLIENT_TIMEOUT_SECS", "u64")?;
        env.set(
            &mut self.client_connect_timeout_secs,
            "CLIENT_CONNECT_TIMEOUT_SECS",
            "u64",
        )?;
        env.set_string(&mut self.payload_root, "PAYLOAD_ROOT");
        env.set(&mut self.verbose_logging, "VERBOSE_LOGGING", "bool")?;
        env.set_string(&mut self.log_format, "LOG_FORMAT");
        Ok(())
    }

    /// 启动前校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_backend == StoreBackend::Postgres && self.database_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "database_url".to_string(),
            });
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::invalid("db_max_connections", "必须大于 0"));
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::invalid("max_batch_size", "必须大于 0"));
        }
        if self.default_batch_size == 0 || self.default_batch_size > self.max_batch_size {
            return Err(ConfigError::invalid(
                "default_batch_size",
                format!("必须在 1..={} 之间", self.max_batch_size),
            ));
        }
        for (field, url) in [
            ("captioning_api_url", &self.captioning_api_url),
            ("ocr_api_url", &self.ocr_api_url),
            ("face_api_url", &self.face_api_url),
        ] {
            if url.trim().is_empty() {
                return Err(ConfigError::Missing {
                    field: field.to_string(),
                });
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::invalid(field, format!("不是 HTTP 地址: {}", url)));
            }
        }
        if self.client_timeout_secs == 0 {
            return Err(ConfigError::invalid("client_timeout_secs", "必须大于 0"));
        }
        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(ConfigError::invalid("log_format", "只支持 text 或 json"));
        }
        Ok(())
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }

    pub fn client_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.client_connect_timeout_secs)
    }

    pub fn db_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }

    /// 把请求的批量大小规整到允许范围内
    pub fn effective_batch_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_batch_size)
            .min(self.max_batch_size)
    }
}

struct EnvReader<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<'_, F> {
    fn set_string(&self, target: &mut String, var_name: &str) {
        if let Some(value) = (self.lookup)(var_name) {
            *target = value;
        }
    }

    fn set<T: FromStr>(
        &self,
        target: &mut T,
        var_name: &str,
        expected_type: &str,
    ) -> Result<(), ConfigError> {
        if let Some(value) = (self.lookup)(var_name) {
            *target = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::EnvVarParseFailed {
                    var_name: var_name.to_string(),
                    value: value.clone(),
                    expected_type: expected_type.to_string(),
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid_config() -> Config {
        Config {
            database_url: "postgres://localhost/enrich".to_string(),
            captioning_api_url: "http://caption.local/caption".to_string(),
            ocr_api_url: "http://ocr.local/ocr".to_string(),
            face_api_url: "http://face.local/faces".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("STORE_BACKEND", "memory"),
            ("DEFAULT_BATCH_SIZE", "25"),
            ("OCR_API_URL", "http://ocr:9000/ocr"),
            ("VERBOSE_LOGGING", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.default_batch_size, 25);
        assert_eq!(config.ocr_api_url, "http://ocr:9000/ocr");
        assert!(config.verbose_logging);
        assert_eq!(config.max_batch_size, 100);
    }

    #[test]
    fn test_override_parse_failure() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|name| (name == "MAX_BATCH_SIZE").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvVarParseFailed { ref var_name, .. } if var_name == "MAX_BATCH_SIZE"
        ));
    }

    #[test]
    fn test_validate() {
        assert!(valid_config().validate().is_ok());

        let missing_db = Config {
            database_url: String::new(),
            ..valid_config()
        };
        assert!(matches!(
            missing_db.validate(),
            Err(ConfigError::Missing { .. })
        ));

        // 内存后端不需要数据库地址
        let memory = Config {
            store_backend: StoreBackend::Memory,
            database_url: String::new(),
            ..valid_config()
        };
        assert!(memory.validate().is_ok());

        let bad_url = Config {
            face_api_url: "face.local".to_string(),
            ..valid_config()
        };
        assert!(matches!(bad_url.validate(), Err(ConfigError::Invalid { .. })));

        let bad_batch = Config {
            default_batch_size: 500,
            ..valid_config()
        };
        assert!(bad_batch.validate().is_err());
    }

    #[test]
    fn test_toml_partial_file_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            database_url = "postgres://db/enrich"
            max_batch_size = 50
            store_backend = "postgres"
            "#,
        )
        .unwrap();
        assert_eq!(config.database_url, "postgres://db/enrich");
        assert_eq!(config.max_batch_size, 50);
        assert_eq!(config.default_batch_size, 10);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_effective_batch_size() {
        let config = valid_config();
        assert_eq!(config.effective_batch_size(None), 10);
        assert_eq!(config.effective_batch_size(Some(3)), 3);
        assert_eq!(config.effective_batch_size(Some(1000)), 100);
    }
}
