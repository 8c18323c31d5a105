use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::error::TrialTraceError;

/// Default per-request timeout. Every registry call must be bounded or a
/// single stalled request can hold up the whole batch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A capability-capped HTTP client that only talks to the trial registry's
/// own hosts, with a bounded timeout on every request.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl RegistryClient {
    /// Creates a client allowing the registry's API and page hosts.
    pub fn new(timeout: Duration) -> Result<Self, TrialTraceError> {
        let mut allowlist = HashSet::new();
        let domains = [
            "clinicaltrials.gov",         // v2 API + study pages
            "classic.clinicaltrials.gov", // archived page renderings
            "localhost",                  // local fixtures in tests
            "127.0.0.1",
        ];

        for d in domains {
            allowlist.insert(d.to_string());
        }

        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| TrialTraceError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Exact match or a subdomain of an allowed domain
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Exposes the inner `reqwest::Client` builder pattern safely for GET requests.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, TrialTraceError> {
        if !self.is_allowed(url) {
            return Err(TrialTraceError::Security(format!(
                "Network capabilities capped: domain not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.get(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_hosts_allowed() {
        let client = RegistryClient::new(DEFAULT_TIMEOUT).unwrap();
        assert!(client.is_allowed("https://clinicaltrials.gov/api/v2/studies"));
        assert!(client.is_allowed("https://classic.clinicaltrials.gov/ct2/history/NCT00000001"));
        assert!(client.is_allowed("https://www.clinicaltrials.gov/study/NCT00000001"));
    }

    #[test]
    fn test_foreign_host_rejected() {
        let client = RegistryClient::new(DEFAULT_TIMEOUT).unwrap();
        assert!(!client.is_allowed("https://example.com/study/NCT00000001"));
        assert!(client.get("https://example.com/").is_err());
    }

    #[test]
    fn test_allow_domain_extends_policy() {
        let mut client = RegistryClient::new(DEFAULT_TIMEOUT).unwrap();
        assert!(!client.is_allowed("https://mirror.example.org/"));
        client.allow_domain("mirror.example.org");
        assert!(client.is_allowed("https://mirror.example.org/"));
    }
}
