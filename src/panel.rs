//! Authenticated client for the Ctrlpanel.gg storefront API
//!
//! One client is bound to one owner. Credentials are fetched and decrypted
//! lazily on the first operation that needs them, cached for the life of the
//! instance, and zeroized when it drops.

use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::credential::{CredentialService, PlainCredentials};
use crate::error::{Result, VaultError};

/// API name under which panel credentials are stored
pub const API_NAME: &str = "Ctrlpanel.gg";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const VOUCHERS_PATH: &str = "vouchers";
const STORE_PATH: &str = "store";

/// Session cache state for one client instance
enum Session {
    /// No operation has needed credentials yet
    Uninitialized,
    /// Decrypted credentials cached for the life of the instance
    Loaded(PlainCredentials),
    /// A credential-layer error occurred; terminal for this instance
    Failed(CredentialFault),
}

/// The two credential-layer faults worth remembering per instance
///
/// Both mean the owner has to act; re-fetching on every call would only
/// repeat the same failure.
#[derive(Clone, Copy)]
enum CredentialFault {
    NotConfigured,
    Corrupted,
}

impl CredentialFault {
    fn classify(err: &VaultError) -> Option<Self> {
        match err {
            VaultError::CredentialsNotConfigured { .. } => Some(Self::NotConfigured),
            VaultError::CredentialsCorrupted(_) => Some(Self::Corrupted),
            _ => None,
        }
    }

    fn to_error(self, owner_id: &str) -> VaultError {
        match self {
            Self::NotConfigured => VaultError::CredentialsNotConfigured {
                owner_id: owner_id.to_string(),
            },
            Self::Corrupted => {
                VaultError::CredentialsCorrupted("recorded from an earlier failed load".to_string())
            }
        }
    }
}

/// A successfully issued voucher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voucher {
    /// Link the recipient uses on the panel storefront
    pub redeem_url: String,
}

#[derive(Serialize)]
struct VoucherRequest<'a> {
    uses: u32,
    code: &'a str,
    credits: i64,
    memo: &'a str,
}

/// Panel API client bound to one owner
pub struct PanelClient {
    owner_id: String,
    service: Arc<CredentialService>,
    http: reqwest::Client,
    session: Session,
    memo: String,
}

impl PanelClient {
    /// Create a client with the default request timeout
    pub fn new(owner_id: impl Into<String>, service: Arc<CredentialService>) -> Result<Self> {
        Self::with_timeout(owner_id, service, DEFAULT_TIMEOUT)
    }

    /// Create a client with a caller-chosen request timeout
    pub fn with_timeout(
        owner_id: impl Into<String>,
        service: Arc<CredentialService>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VaultError::TransportError(e.without_url().to_string()))?;

        Ok(Self {
            owner_id: owner_id.into(),
            service,
            http,
            session: Session::Uninitialized,
            memo: "Generated by panel-vault".to_string(),
        })
    }

    /// Set the memo attached to issued vouchers (e.g. the issuing bot's tag)
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    /// The owner this client is bound to
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Issue a voucher for `amount` credits redeemable `uses` times
    ///
    /// Loads credentials on first use, POSTs to the panel's voucher endpoint
    /// and returns the storefront redeem link. Remote rejection
    /// ([`VaultError::RemoteRejected`]) and network failure
    /// ([`VaultError::TransportError`]) are reported separately; only the
    /// latter is worth retrying.
    pub async fn generate_voucher(&mut self, code: &str, amount: i64, uses: u32) -> Result<Voucher> {
        let http = self.http.clone();
        let owner_id = self.owner_id.clone();
        let memo = self.memo.clone();

        let creds = self.ensure_credentials().await?;

        let base = Url::parse(creds.url()).map_err(|e| {
            VaultError::InvalidCredentials(format!("stored panel URL is not a valid URL: {}", e))
        })?;
        let endpoint = join_path(&base, VOUCHERS_PATH)?;

        debug!("Issuing voucher for owner {}", owner_id);

        let response = http
            .post(endpoint)
            .bearer_auth(creds.token())
            .json(&VoucherRequest {
                uses,
                code,
                credits: amount,
                memo: &memo,
            })
            .send()
            .await
            .map_err(|e| VaultError::TransportError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Panel rejected voucher request for owner {} with status {}", owner_id, status);
            return Err(VaultError::RemoteRejected {
                status: status.as_u16(),
                body,
            });
        }

        let redeem_url = redeem_url(&base, code)?;
        info!("Issued voucher for owner {}", owner_id);
        Ok(Voucher { redeem_url })
    }

    /// Encrypt and persist a new url + token pair for this owner
    ///
    /// Does not touch the session cache: an `Uninitialized` client stays so,
    /// and the next credential-needing operation picks up the new values.
    pub async fn update_api_credentials(
        &self,
        scheme: &str,
        domain: &str,
        token: &str,
    ) -> Result<()> {
        if scheme.is_empty() || domain.is_empty() {
            return Err(VaultError::InvalidCredentials(
                "scheme and domain must be non-empty".to_string(),
            ));
        }

        let url = format!("{}://{}", scheme, domain);
        self.service.put(&self.owner_id, API_NAME, &url, token).await
    }

    /// Drive the session state machine to `Loaded`, or surface the fault
    async fn ensure_credentials(&mut self) -> Result<&PlainCredentials> {
        if let Session::Uninitialized = self.session {
            match self.service.fetch(&self.owner_id, API_NAME).await {
                Ok(creds) => self.session = Session::Loaded(creds),
                Err(err) => {
                    if let Some(fault) = CredentialFault::classify(&err) {
                        warn!("Credential load failed for owner {}: {}", self.owner_id, err);
                        self.session = Session::Failed(fault);
                    }
                    // store-level errors leave the session Uninitialized so a
                    // later call can retry the fetch
                    return Err(err);
                }
            }
        }

        match &self.session {
            Session::Loaded(creds) => Ok(creds),
            Session::Failed(fault) => Err(fault.to_error(&self.owner_id)),
            Session::Uninitialized => Err(VaultError::CredentialsNotConfigured {
                owner_id: self.owner_id.clone(),
            }),
        }
    }
}

/// Append a path segment without disturbing any base path the panel URL has
fn join_path(base: &Url, segment: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| VaultError::InvalidCredentials("stored panel URL cannot be a base".to_string()))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

// Escape everything outside the RFC 3986 unreserved set, so URL-safe codes
// round-trip byte for byte and nothing else reaches the query raw.
const VOUCHER_CODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// `{base}/store?voucher={code}`, escaping codes that are not URL-safe
fn redeem_url(base: &Url, code: &str) -> Result<String> {
    let mut url = join_path(base, STORE_PATH)?;
    let encoded = utf8_percent_encode(code, VOUCHER_CODE_SET).to_string();
    url.set_query(Some(&format!("voucher={}", encoded)));
    Ok(url.to_string())
}
