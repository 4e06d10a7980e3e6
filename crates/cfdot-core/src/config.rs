// crates/cfdot-core/src/config.rs - Configuration resolution and validation
//
// CONFIGURATION HIERARCHY (highest to lowest priority):
// 1. Flag given on the command line (even when empty)
// 2. Non-empty environment variable
// 3. Built-in default
//
// Resolution and validation are separate passes. `Config::resolve` only turns
// raw strings into typed values; the `validate_*` methods check the
// cross-field rules for the collaborator a command actually talks to, so a
// lock-service command never trips over a malformed BBS URL.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;

use crate::error::{CfdotError, CfdotResult};

/// A flag name paired with the environment variable that backs it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionName {
    pub flag: &'static str,
    pub env: &'static str,
}

impl OptionName {
    const fn new(flag: &'static str, env: &'static str) -> Self {
        Self { flag, env }
    }
}

pub const BBS_URL: OptionName = OptionName::new("bbsURL", "BBS_URL");
pub const BBS_SKIP_CERT_VERIFY: OptionName =
    OptionName::new("bbsSkipCertVerify", "BBS_SKIP_CERT_VERIFY");
pub const BBS_CA_CERT_FILE: OptionName = OptionName::new("bbsCACertFile", "BBS_CA_CERT_FILE");
pub const BBS_CERT_FILE: OptionName = OptionName::new("bbsCertFile", "BBS_CERT_FILE");
pub const BBS_KEY_FILE: OptionName = OptionName::new("bbsKeyFile", "BBS_KEY_FILE");
pub const LOCKET_API_LOCATION: OptionName =
    OptionName::new("locketAPILocation", "LOCKET_API_LOCATION");
pub const SKIP_CERT_VERIFY: OptionName = OptionName::new("skipCertVerify", "SKIP_CERT_VERIFY");
pub const CA_CERT_FILE: OptionName = OptionName::new("caCertFile", "CA_CERT_FILE");
pub const CLIENT_CERT_FILE: OptionName = OptionName::new("clientCertFile", "CLIENT_CERT_FILE");
pub const CLIENT_KEY_FILE: OptionName = OptionName::new("clientKeyFile", "CLIENT_KEY_FILE");
pub const TIMEOUT: OptionName = OptionName::new("timeout", "CFDOT_TIMEOUT");

const BOOL_TOKENS: &str = "1, t, T, TRUE, true, True, 0, f, F, FALSE, false, False";

/// Flag values exactly as the command line delivered them
///
/// `None` means the flag was not given at all; `Some("")` means it was given
/// with an empty value, which still wins over the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOptions {
    pub bbs_url: Option<String>,
    pub bbs_skip_cert_verify: Option<String>,
    pub bbs_ca_cert_file: Option<String>,
    pub bbs_cert_file: Option<String>,
    pub bbs_key_file: Option<String>,
    pub locket_api_location: Option<String>,
    pub skip_cert_verify: Option<String>,
    pub ca_cert_file: Option<String>,
    pub client_cert_file: Option<String>,
    pub client_key_file: Option<String>,
    pub timeout: Option<String>,
}

/// Record store endpoint and its TLS settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BbsConfig {
    pub url: String,
    pub skip_cert_verify: bool,
    pub ca_cert_file: String,
    pub cert_file: String,
    pub key_file: String,
}

/// TLS settings shared by the lock service and the cell workers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    pub skip_cert_verify: bool,
    pub ca_cert_file: String,
    pub client_cert_file: String,
    pub client_key_file: String,
}

impl TlsConfig {
    /// Whether any TLS material or override was supplied at all
    pub fn is_configured(&self) -> bool {
        self.skip_cert_verify
            || !self.ca_cert_file.is_empty()
            || !self.client_cert_file.is_empty()
            || !self.client_key_file.is_empty()
    }
}

/// Fully resolved, immutable settings for one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub bbs: BbsConfig,
    pub locket_api_location: String,
    pub tls: TlsConfig,
    pub timeout_seconds: u64,
}

/// Resolve one option: explicit flag, then non-empty environment, then default
pub fn resolve_option<T, E, P>(
    flag_value: Option<&str>,
    name: OptionName,
    env: &E,
    default: T,
    parse: P,
) -> CfdotResult<T>
where
    E: Fn(&str) -> Option<String>,
    P: Fn(&str, &str) -> CfdotResult<T>,
{
    if let Some(value) = flag_value {
        return parse(value, &format!("--{}", name.flag));
    }

    match env(name.env) {
        Some(value) if !value.is_empty() => parse(&value, name.env),
        _ => Ok(default),
    }
}

pub fn parse_string(raw: &str, _source: &str) -> CfdotResult<String> {
    Ok(raw.to_string())
}

/// Accepts the usual one-letter, upper, lower and title-case spellings
pub fn parse_bool(raw: &str, source: &str) -> CfdotResult<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(CfdotError::validation(format!(
            "Invalid value '{raw}' for {source}. Accepted values are: {BOOL_TOKENS}"
        ))),
    }
}

pub fn parse_timeout(raw: &str, source: &str) -> CfdotResult<u64> {
    let invalid = || {
        CfdotError::validation(format!(
            "Invalid value '{raw}' for {source}: must be a non-negative integer number of seconds"
        ))
    };

    let seconds: i64 = raw.trim().parse().map_err(|_| invalid())?;
    u64::try_from(seconds).map_err(|_| invalid())
}

impl Config {
    /// Resolve every option against an injected environment lookup
    pub fn resolve<E>(raw: &RawOptions, env: E) -> CfdotResult<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let string = |flag: &Option<String>, name| {
            resolve_option(flag.as_deref(), name, &env, String::new(), parse_string)
        };
        let boolean =
            |flag: &Option<String>, name| resolve_option(flag.as_deref(), name, &env, false, parse_bool);

        Ok(Self {
            bbs: BbsConfig {
                url: string(&raw.bbs_url, BBS_URL)?,
                skip_cert_verify: boolean(&raw.bbs_skip_cert_verify, BBS_SKIP_CERT_VERIFY)?,
                ca_cert_file: string(&raw.bbs_ca_cert_file, BBS_CA_CERT_FILE)?,
                cert_file: string(&raw.bbs_cert_file, BBS_CERT_FILE)?,
                key_file: string(&raw.bbs_key_file, BBS_KEY_FILE)?,
            },
            locket_api_location: string(&raw.locket_api_location, LOCKET_API_LOCATION)?,
            tls: TlsConfig {
                skip_cert_verify: boolean(&raw.skip_cert_verify, SKIP_CERT_VERIFY)?,
                ca_cert_file: string(&raw.ca_cert_file, CA_CERT_FILE)?,
                client_cert_file: string(&raw.client_cert_file, CLIENT_CERT_FILE)?,
                client_key_file: string(&raw.client_key_file, CLIENT_KEY_FILE)?,
            },
            timeout_seconds: resolve_option(
                raw.timeout.as_deref(),
                TIMEOUT,
                &env,
                0,
                parse_timeout,
            )?,
        })
    }

    /// Resolve against the real process environment
    pub fn from_env(raw: &RawOptions) -> CfdotResult<Self> {
        Self::resolve(raw, |name| std::env::var(name).ok())
    }

    /// Per-request deadline; zero means none
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }

    /// Check everything a record-store command needs and return the parsed URL
    pub fn validate_record_store(&self) -> CfdotResult<Url> {
        let raw = self.bbs.url.as_str();
        let hint = format!(
            "Please specify one with the '--{}' flag or the '{}' environment variable.",
            BBS_URL.flag, BBS_URL.env
        );

        if raw.is_empty() {
            return Err(CfdotError::validation(format!("BBS URL not set. {hint}")));
        }

        let url = Url::parse(raw).map_err(|_| {
            CfdotError::validation(format!("The value '{raw}' is not a valid BBS URL. {hint}"))
        })?;

        let https = match url.scheme() {
            "http" => false,
            "https" => true,
            _ => {
                return Err(CfdotError::validation(format!(
                    "The URL '{raw}' does not have an 'http' or 'https' scheme. {hint}"
                )));
            }
        };

        if https && !self.bbs.skip_cert_verify && self.bbs.ca_cert_file.is_empty() {
            return Err(CfdotError::validation(format!(
                "--{} must be specified if using HTTPS and --{} is not set",
                BBS_CA_CERT_FILE.flag, BBS_SKIP_CERT_VERIFY.flag
            )));
        }

        validate_key_pair(&self.bbs.cert_file, &self.bbs.key_file, BBS_CERT_FILE, BBS_KEY_FILE)?;
        validate_readable("CA cert", &self.bbs.ca_cert_file)?;
        validate_readable("Cert", &self.bbs.cert_file)?;
        validate_readable("Key", &self.bbs.key_file)?;

        Ok(url)
    }

    /// Check everything a lock-service command needs
    pub fn validate_lock_service(&self) -> CfdotResult<()> {
        if self.locket_api_location.is_empty() {
            return Err(CfdotError::validation(format!(
                "Locket API Location not set. Please specify one with the '--{}' flag or the '{}' environment variable.",
                LOCKET_API_LOCATION.flag, LOCKET_API_LOCATION.env
            )));
        }

        if !self.tls.skip_cert_verify && self.tls.ca_cert_file.is_empty() {
            return Err(CfdotError::validation(format!(
                "--{} must be specified if using HTTPS and --{} is not set",
                CA_CERT_FILE.flag, SKIP_CERT_VERIFY.flag
            )));
        }

        self.validate_shared_tls()
    }

    /// Cell workers reuse the shared TLS triple but do not require a CA
    pub fn validate_cell_tls(&self) -> CfdotResult<()> {
        self.validate_shared_tls()
    }

    fn validate_shared_tls(&self) -> CfdotResult<()> {
        validate_key_pair(
            &self.tls.client_cert_file,
            &self.tls.client_key_file,
            CLIENT_CERT_FILE,
            CLIENT_KEY_FILE,
        )?;
        validate_readable("CA cert", &self.tls.ca_cert_file)?;
        validate_readable("Client cert", &self.tls.client_cert_file)?;
        validate_readable("Client key", &self.tls.client_key_file)
    }
}

fn validate_key_pair(cert: &str, key: &str, cert_name: OptionName, key_name: OptionName) -> CfdotResult<()> {
    if cert.is_empty() != key.is_empty() {
        return Err(CfdotError::validation(format!(
            "--{} and --{} must both be specified for mutual TLS connections.",
            cert_name.flag, key_name.flag
        )));
    }
    Ok(())
}

/// Open and immediately release the file; empty paths are not referenced
fn validate_readable(role: &str, path: &str) -> CfdotResult<()> {
    if path.is_empty() {
        return Ok(());
    }

    File::open(Path::new(path)).map(drop).map_err(|err| {
        CfdotError::validation(format!(
            "{role} file '{path}' doesn't exist or is not readable: {err}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn no_env() -> impl Fn(&str) -> Option<String> {
        |_| None
    }

    fn message(err: CfdotError) -> String {
        assert_eq!(err.kind(), ErrorKind::Validation);
        err.message().to_string()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = Config::resolve(&RawOptions::default(), no_env()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_env_used_when_flag_absent() {
        let env = env_of(&[
            ("BBS_URL", "http://bbs.service.cf.internal:8889"),
            ("BBS_SKIP_CERT_VERIFY", "TRUE"),
            ("CFDOT_TIMEOUT", "7"),
            ("LOCKET_API_LOCATION", "locket.service.cf.internal:8891"),
        ]);
        let config = Config::resolve(&RawOptions::default(), env).unwrap();
        assert_eq!(config.bbs.url, "http://bbs.service.cf.internal:8889");
        assert!(config.bbs.skip_cert_verify);
        assert_eq!(config.timeout(), Some(Duration::from_secs(7)));
        assert_eq!(config.locket_api_location, "locket.service.cf.internal:8891");
    }

    #[test]
    fn test_empty_env_falls_back_to_default() {
        let env = env_of(&[("BBS_URL", ""), ("SKIP_CERT_VERIFY", "")]);
        let config = Config::resolve(&RawOptions::default(), env).unwrap();
        assert_eq!(config.bbs.url, "");
        assert!(!config.tls.skip_cert_verify);
    }

    #[test]
    fn test_explicit_empty_flag_beats_env() {
        let raw = RawOptions {
            bbs_url: Some(String::new()),
            ..Default::default()
        };
        let config = Config::resolve(&raw, env_of(&[("BBS_URL", "http://from-env")])).unwrap();
        assert_eq!(config.bbs.url, "");
    }

    #[test]
    fn test_invalid_bool_names_value_and_tokens() {
        let err = Config::resolve(&RawOptions::default(), env_of(&[("SKIP_CERT_VERIFY", "yes")]))
            .unwrap_err();
        let msg = message(err);
        assert!(msg.contains("'yes'"));
        assert!(msg.contains("SKIP_CERT_VERIFY"));
        assert!(msg.contains(BOOL_TOKENS));

        let raw = RawOptions {
            bbs_skip_cert_verify: Some("nope".into()),
            ..Default::default()
        };
        let msg = message(Config::resolve(&raw, no_env()).unwrap_err());
        assert!(msg.contains("--bbsSkipCertVerify"));
    }

    #[test]
    fn test_timeout_must_be_non_negative_integer() {
        for bad in ["abc", "1.5", "-3"] {
            let raw = RawOptions {
                timeout: Some(bad.into()),
                ..Default::default()
            };
            let msg = message(Config::resolve(&raw, no_env()).unwrap_err());
            assert!(msg.contains(bad), "{msg}");
        }
    }

    fn bbs_config(url: &str) -> Config {
        Config {
            bbs: BbsConfig {
                url: url.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_bbs_url() {
        let msg = message(bbs_config("").validate_record_store().unwrap_err());
        assert_eq!(
            msg,
            "BBS URL not set. Please specify one with the '--bbsURL' flag or the 'BBS_URL' environment variable."
        );
    }

    #[test]
    fn test_unparseable_and_wrong_scheme_urls() {
        let msg = message(bbs_config("::not a url").validate_record_store().unwrap_err());
        assert!(msg.starts_with("The value '::not a url' is not a valid BBS URL."));

        let msg = message(bbs_config("ftp://bbs:21").validate_record_store().unwrap_err());
        assert!(msg.contains("does not have an 'http' or 'https' scheme"));
    }

    #[test]
    fn test_https_requires_ca_unless_skipping() {
        let msg = message(bbs_config("https://bbs:8889").validate_record_store().unwrap_err());
        assert_eq!(
            msg,
            "--bbsCACertFile must be specified if using HTTPS and --bbsSkipCertVerify is not set"
        );

        let mut config = bbs_config("https://bbs:8889");
        config.bbs.skip_cert_verify = true;
        assert!(config.validate_record_store().is_ok());
    }

    #[test]
    fn test_mixed_cert_pair_is_rejected() {
        let cert = NamedTempFile::new().unwrap();
        let mut config = bbs_config("http://bbs:8889");
        config.bbs.cert_file = cert.path().display().to_string();
        let msg = message(config.validate_record_store().unwrap_err());
        assert_eq!(
            msg,
            "--bbsCertFile and --bbsKeyFile must both be specified for mutual TLS connections."
        );
    }

    #[test]
    fn test_unreadable_ca_file() {
        let mut config = bbs_config("https://bbs:8889");
        config.bbs.ca_cert_file = "/does/not/exist.crt".into();
        let msg = message(config.validate_record_store().unwrap_err());
        assert!(msg.starts_with("CA cert file '/does/not/exist.crt' doesn't exist or is not readable: "));
    }

    #[test]
    fn test_valid_mutual_tls_record_store() {
        let ca = NamedTempFile::new().unwrap();
        let cert = NamedTempFile::new().unwrap();
        let key = NamedTempFile::new().unwrap();
        let mut config = bbs_config("https://bbs:8889");
        config.bbs.ca_cert_file = ca.path().display().to_string();
        config.bbs.cert_file = cert.path().display().to_string();
        config.bbs.key_file = key.path().display().to_string();

        let url = config.validate_record_store().unwrap();
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn test_lock_service_validation() {
        let config = Config::default();
        let msg = message(config.validate_lock_service().unwrap_err());
        assert!(msg.starts_with("Locket API Location not set."));

        let config = Config {
            locket_api_location: "locket:8891".into(),
            ..Default::default()
        };
        let msg = message(config.validate_lock_service().unwrap_err());
        assert_eq!(
            msg,
            "--caCertFile must be specified if using HTTPS and --skipCertVerify is not set"
        );

        let key = NamedTempFile::new().unwrap();
        let config = Config {
            locket_api_location: "locket:8891".into(),
            tls: TlsConfig {
                skip_cert_verify: true,
                client_key_file: key.path().display().to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let msg = message(config.validate_lock_service().unwrap_err());
        assert_eq!(
            msg,
            "--clientCertFile and --clientKeyFile must both be specified for mutual TLS connections."
        );
    }

    #[test]
    fn test_cell_tls_does_not_require_ca() {
        assert!(Config::default().validate_cell_tls().is_ok());
        assert!(!Config::default().tls.is_configured());
    }

    proptest! {
        #[test]
        fn prop_flag_always_overrides_env(flag in "[a-z0-9:/.]{0,24}", env_value in "[a-z0-9:/.]{1,24}") {
            let raw = RawOptions { locket_api_location: Some(flag.clone()), ..Default::default() };
            let config = Config::resolve(&raw, env_of(&[("LOCKET_API_LOCATION", env_value.as_str())])).unwrap();
            prop_assert_eq!(config.locket_api_location, flag);
        }

        #[test]
        fn prop_timeout_flag_overrides_env(flag in 0u32..100_000, env_value in 0u32..100_000) {
            let raw = RawOptions { timeout: Some(flag.to_string()), ..Default::default() };
            let env = env_of(&[("CFDOT_TIMEOUT", env_value.to_string().as_str())]);
            let config = Config::resolve(&raw, env).unwrap();
            prop_assert_eq!(config.timeout_seconds, u64::from(flag));
        }
    }
}
