// crates/cfdot-core/src/tls.rs - HTTP client construction for every collaborator
//
// Four shapes of client come out of here:
//   - plain:        no TLS material at all
//   - server-auth:  CA bundle only
//   - mutual-auth:  CA bundle plus client certificate and key
//   - skip-verify:  server certificate is not checked (client identity optional)
//
// Session caching is left to rustls' defaults and idle pooling is fixed; there
// is no tuning surface.

use std::fs;
use std::path::{Path, PathBuf};

use reqwest::{Certificate, Client, Identity};
use tracing::debug;

use crate::error::{CfdotError, CfdotResult};

/// Idle connections kept per host
pub const MAX_IDLE_CONNS_PER_HOST: usize = 16;

/// TLS material, already validated as readable by the config pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsFiles {
    pub ca_cert_file: Option<PathBuf>,
    pub client_cert_file: Option<PathBuf>,
    pub client_key_file: Option<PathBuf>,
    pub skip_verify: bool,
}

impl TlsFiles {
    pub fn new(ca: &str, cert: &str, key: &str, skip_verify: bool) -> Self {
        let path = |p: &str| (!p.is_empty()).then(|| PathBuf::from(p));
        Self {
            ca_cert_file: path(ca),
            client_cert_file: path(cert),
            client_key_file: path(key),
            skip_verify,
        }
    }
}

/// Client with no TLS configuration beyond reqwest's defaults
pub fn plain_client() -> CfdotResult<Client> {
    Client::builder()
        .pool_max_idle_per_host(MAX_IDLE_CONNS_PER_HOST)
        .build()
        .map_err(|err| CfdotError::remote(format!("Failed to create HTTP client: {err}")))
}

/// Client that speaks TLS using the given material
pub fn tls_client(files: &TlsFiles) -> CfdotResult<Client> {
    let mut builder = Client::builder()
        .pool_max_idle_per_host(MAX_IDLE_CONNS_PER_HOST)
        .use_rustls_tls();

    if files.skip_verify {
        debug!("tls: skipping server certificate verification");
        builder = builder.danger_accept_invalid_certs(true);
    } else if let Some(ca) = &files.ca_cert_file {
        let pem = read_pem(ca, "CA cert")?;
        let bundle = Certificate::from_pem_bundle(&pem).map_err(|err| {
            CfdotError::remote(format!("Failed to load CA cert file '{}': {err}", ca.display()))
        })?;
        if bundle.is_empty() {
            return Err(CfdotError::remote(format!(
                "CA cert file '{}' contains no certificates",
                ca.display()
            )));
        }
        builder = builder.tls_built_in_root_certs(false);
        for cert in bundle {
            builder = builder.add_root_certificate(cert);
        }
    }

    if let (Some(cert), Some(key)) = (&files.client_cert_file, &files.client_key_file) {
        builder = builder.identity(load_identity(cert, key)?);
    }

    builder
        .build()
        .map_err(|err| CfdotError::remote(format!("Failed to create TLS client: {err}")))
}

fn load_identity(cert: &Path, key: &Path) -> CfdotResult<Identity> {
    let mut pem = read_pem(cert, "Client cert")?;
    pem.push(b'\n');
    pem.extend(read_pem(key, "Client key")?);

    Identity::from_pem(&pem).map_err(|err| {
        CfdotError::remote(format!(
            "Failed to load client certificate '{}' and key '{}': {err}",
            cert.display(),
            key.display()
        ))
    })
}

fn read_pem(path: &Path, role: &str) -> CfdotResult<Vec<u8>> {
    fs::read(path).map_err(|err| {
        CfdotError::remote(format!("Failed to read {role} file '{}': {err}", path.display()))
    })
}
