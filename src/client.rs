use crate::error::{Error, Result};

use http::{Method, Request, Uri, header};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

pub type HttpsClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, String>;

/// Something that can hand back one JSON record collection.
pub trait Source: Send + Sync {
    fn name(&self) -> &str;
    fn fetch(&self) -> impl Future<Output = Result<Value>> + Send;
}

/// Builds the shared HTTPS client. `insecure` skips certificate verification.
pub fn build_client(insecure: bool) -> Result<HttpsClient> {
    let https_connector = if insecure {
        let tls_config = rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerifier))
            .with_no_client_auth();

        HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build()
    } else {
        let mut root_store = rustls::RootCertStore::empty();
        let result = rustls_native_certs::load_native_certs();
        root_store.add_parsable_certificates(result.certs);

        if root_store.is_empty() {
            return Err(Error::Config(
                "No valid system certificates found.".to_string(),
            ));
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build()
    };

    Ok(Client::builder(TokioExecutor::new()).build(https_connector))
}

/// GETs a JSON array from one endpoint of the schedule API.
#[derive(Clone, Debug)]
pub struct HttpSource {
    name: String,
    uri: Uri,
    client: HttpsClient,
}

impl HttpSource {
    pub fn new(name: &str, url: &str, insecure: bool) -> Result<Self> {
        Self::with_client(name, url, build_client(insecure)?)
    }

    pub fn with_client(name: &str, url: &str, client: HttpsClient) -> Result<Self> {
        let uri: Uri = url
            .parse()
            .map_err(|e: http::uri::InvalidUri| Error::Config(format!("invalid url {:?}: {}", url, e)))?;
        Ok(Self {
            name: name.to_string(),
            uri,
            client,
        })
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }
}

impl Source for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Value> {
        let req = Request::builder()
            .method(Method::GET)
            .uri(self.uri.clone())
            .header(header::ACCEPT, "application/json")
            .header(header::CACHE_CONTROL, "no-store")
            .body(String::new())
            .map_err(|e| Error::unavailable(&self.name, e))?;

        tracing::debug!(source = %self.name, uri = %self.uri, "fetching");
        let response = self
            .client
            .request(req)
            .await
            .map_err(|e| Error::unavailable(&self.name, format!("{:?}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::unavailable(&self.name, format!("HTTP {}", status)));
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::unavailable(&self.name, e))?
            .to_bytes();

        serde_json::from_slice(&body)
            .map_err(|e| Error::unavailable(&self.name, format!("invalid JSON body: {}", e)))
    }
}

/// Fixed payload or fixed failure.
#[derive(Clone, Debug)]
pub struct StaticSource {
    name: String,
    outcome: std::result::Result<Value, String>,
}

impl StaticSource {
    pub fn ok(name: &str, data: Value) -> Self {
        Self {
            name: name.to_string(),
            outcome: Ok(data),
        }
    }

    pub fn failing(name: &str, reason: &str) -> Self {
        Self {
            name: name.to_string(),
            outcome: Err(reason.to_string()),
        }
    }
}

impl Source for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Value> {
        match &self.outcome {
            Ok(data) => Ok(data.clone()),
            Err(reason) => Err(Error::unavailable(&self.name, reason)),
        }
    }
}

#[derive(Debug)]
struct NoVerifier;
impl rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _: &rustls::pki_types::CertificateDer<'_>,
        _: &[rustls::pki_types::CertificateDer<'_>],
        _: &rustls::pki_types::ServerName<'_>,
        _: &[u8],
        _: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }
    fn verify_tls12_signature(
        &self,
        _: &[u8],
        _: &rustls::pki_types::CertificateDer<'_>,
        _: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }
    fn verify_tls13_signature(
        &self,
        _: &[u8],
        _: &rustls::pki_types::CertificateDer<'_>,
        _: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }
    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        use rustls::SignatureScheme::*;
        vec![
            RSA_PKCS1_SHA256,
            RSA_PKCS1_SHA384,
            RSA_PKCS1_SHA512,
            ECDSA_NISTP256_SHA256,
            RSA_PSS_SHA256,
            ED25519,
        ]
    }
}
