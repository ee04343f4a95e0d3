// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::time::Duration;

use reqwest::ClientBuilder;
#[cfg(feature = "fips")]
use tracing::debug;

const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 128;
const IDLE_CONNECTION_TIMEOUT: Duration = Duration::from_secs(90);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

/// Builds the pooled client used to deliver chunks. TLS 1.2 is the minimum.
///
/// # Errors
///
/// Fails when the TLS configuration cannot be built.
pub fn build_client() -> Result<reqwest::Client, Box<dyn Error + Send + Sync>> {
    let client = client_builder()?
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
        .pool_idle_timeout(IDLE_CONNECTION_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .tcp_keepalive(TCP_KEEPALIVE)
        .build()?;
    Ok(client)
}

#[cfg(not(feature = "fips"))]
fn client_builder() -> Result<ClientBuilder, Box<dyn Error + Send + Sync>> {
    Ok(reqwest::Client::builder().use_rustls_tls())
}

/// Uses the process wide FIPS crypto provider with the native root store.
#[cfg(feature = "fips")]
fn client_builder() -> Result<ClientBuilder, Box<dyn Error + Send + Sync>> {
    let provider =
        rustls::crypto::CryptoProvider::get_default().ok_or("No crypto provider configured")?;
    if !provider.fips() {
        return Err("Crypto provider is not FIPS-compliant".into());
    }

    let mut roots = rustls::RootCertStore::empty();
    let mut valid = 0;
    for cert in rustls_native_certs::load_native_certs().certs {
        match roots.add(cert) {
            Ok(()) => valid += 1,
            Err(err) => debug!("Skipping unparsable root certificate: {err:?}"),
        }
    }
    if valid == 0 {
        return Err("No valid certificates found in native root store".into());
    }

    let config = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])
        .map_err(|_| "Failed to set protocol versions")?
        .with_root_certificates(roots)
        .with_no_client_auth();
    if !config.fips() {
        return Err("The final TLS configuration is not FIPS-compliant".into());
    }
    debug!("HTTP client is configured with FIPS");

    Ok(reqwest::Client::builder().use_preconfigured_tls(config))
}
