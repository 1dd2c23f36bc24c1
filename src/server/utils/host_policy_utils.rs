use url::Url;

/// which origin hosts the relay is willing to fetch from
///
/// an empty policy is open and lets everything through, which is the default. entries match the
/// host itself and any of its subdomains, so `cdn.example.com` is allowed by `example.com`
#[derive(Debug, Clone, Default)]
pub struct HostPolicy {
    allowed: Vec<String>,
}

impl HostPolicy {
    pub fn new(hosts: &[String]) -> Self {
        let allowed = hosts
            .iter()
            .map(|h| h.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        Self { allowed }
    }

    pub fn is_open(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn permits(&self, url: &Url) -> bool {
        if self.is_open() {
            return true;
        }

        // url already lowercases domains while parsing
        let Some(host) = url.host_str() else {
            return false;
        };

        self.allowed.iter().any(|allowed| {
            host == allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}
