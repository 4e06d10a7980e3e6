// crates/cfdot-core/src/factory.rs - Builds the three client kinds from a Config
//
// Each constructor runs the config checks for its collaborator first, so a
// failure there is still a validation error (exit 3). Anything that goes wrong
// after validation, while assembling TLS state, is a remote error (exit 4).

use tracing::debug;

use crate::bbs::HttpRecordStore;
use crate::config::Config;
use crate::error::CfdotResult;
use crate::locket::HttpLockService;
use crate::rep::RepClientFactory;
use crate::tls::{self, TlsFiles};

/// Hands out clients for one resolved configuration
pub struct ClientFactory<'a> {
    config: &'a Config,
}

impl<'a> ClientFactory<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Plain HTTP, TLS without verification, or (mutual) TLS against the CA
    pub fn record_store(&self) -> CfdotResult<HttpRecordStore> {
        let url = self.config.validate_record_store()?;
        let bbs = &self.config.bbs;

        let http = if url.scheme() == "https" {
            tls::tls_client(&TlsFiles::new(
                &bbs.ca_cert_file,
                &bbs.cert_file,
                &bbs.key_file,
                bbs.skip_cert_verify,
            ))?
        } else {
            tls::plain_client()?
        };

        debug!(url = %url, "created record store client");
        Ok(HttpRecordStore::new(http, url))
    }

    pub fn lock_service(&self) -> CfdotResult<HttpLockService> {
        self.config.validate_lock_service()?;
        let http = tls::tls_client(&self.shared_tls_files())?;

        debug!(address = %self.config.locket_api_location, "created lock service client");
        Ok(HttpLockService::new(http, &self.config.locket_api_location))
    }

    /// Factory for per-cell clients; TLS only when any TLS material was given
    pub fn cell_workers(&self) -> CfdotResult<RepClientFactory> {
        self.config.validate_cell_tls()?;

        let tls_enabled = self.config.tls.is_configured();
        let http = if tls_enabled {
            tls::tls_client(&self.shared_tls_files())?
        } else {
            tls::plain_client()?
        };

        Ok(RepClientFactory::new(http, tls_enabled))
    }

    fn shared_tls_files(&self) -> TlsFiles {
        let shared = &self.config.tls;
        TlsFiles::new(
            &shared.ca_cert_file,
            &shared.client_cert_file,
            &shared.client_key_file,
            shared.skip_cert_verify,
        )
    }
}
