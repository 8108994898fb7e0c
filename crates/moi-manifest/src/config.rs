/// Tunables for [`crate::ManifestCoder`].
#[derive(Debug, Clone)]
pub struct CoderConfig {
    /// Memoize compiled schemas per type descriptor.
    pub cache_schemas: bool,
}

impl Default for CoderConfig {
    fn default() -> Self {
        Self {
            cache_schemas: true,
        }
    }
}

impl CoderConfig {
    /// Build from the environment; `MOI_SCHEMA_CACHE=0` disables the schema cache.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("MOI_SCHEMA_CACHE") {
            config.cache_schemas = parse_flag(&raw).unwrap_or(config.cache_schemas);
        }
        config
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_parsing_accepts_common_spellings() {
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("maybe"), None);
        assert!(CoderConfig::default().cache_schemas);
    }
}
