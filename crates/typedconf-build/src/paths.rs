use proc_macro2::TokenStream;
use quote::quote;
use syn::Path;

/// Env override for the runtime crate path.
pub const CORE_CRATE_ENV: &str = "TYPEDCONF_CORE_CRATE";

fn parse_path(value: &str) -> Option<TokenStream> {
    syn::parse_str::<Path>(value.trim())
        .ok()
        .map(|path| quote!(#path))
}

///
/// CratePaths
///
/// Resolves crate roots for generated code. Generated files go through the
/// public `typedconf::core` facade unless configured otherwise; the
/// `TYPEDCONF_CORE_CRATE` env var wins over configuration.
///

#[derive(Clone, Debug)]
pub struct CratePaths {
    pub core: TokenStream,
}

impl CratePaths {
    /// Resolve paths, preferring the env override, then `configured`.
    #[must_use]
    pub fn new(configured: Option<&str>) -> Self {
        let core = std::env::var(CORE_CRATE_ENV)
            .ok()
            .and_then(|value| parse_path(&value))
            .or_else(|| configured.and_then(parse_path))
            .unwrap_or_else(|| quote!(::typedconf::core));

        Self { core }
    }
}

impl Default for CratePaths {
    fn default() -> Self {
        Self::new(None)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, sync::Mutex};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct TempEnv {
        key: &'static str,
        prev: Option<String>,
    }

    impl TempEnv {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let prev = env::var(key).ok();
            unsafe {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
            Self { key, prev }
        }
    }

    impl Drop for TempEnv {
        fn drop(&mut self) {
            unsafe {
                match &self.prev {
                    Some(value) => env::set_var(self.key, value),
                    None => env::remove_var(self.key),
                }
            }
        }
    }

    #[test]
    fn defaults_to_the_facade() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _core = TempEnv::set(CORE_CRATE_ENV, None);

        let paths = CratePaths::new(None);
        assert_eq!(paths.core.to_string(), quote!(::typedconf::core).to_string());
    }

    #[test]
    fn configuration_is_used_when_valid() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _core = TempEnv::set(CORE_CRATE_ENV, None);

        assert_eq!(
            CratePaths::new(Some("typedconf_core")).core.to_string(),
            quote!(typedconf_core).to_string()
        );
        assert_eq!(
            CratePaths::new(Some("not a path")).core.to_string(),
            quote!(::typedconf::core).to_string()
        );
    }

    #[test]
    fn env_override_wins() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _core = TempEnv::set(CORE_CRATE_ENV, Some("custom::core"));

        let paths = CratePaths::new(Some("typedconf_core"));
        assert_eq!(paths.core.to_string(), quote!(custom::core).to_string());
    }
}
