//! User-Agent sent with download requests.
//!
//! The provider serves shared folders to common download clients without the
//! interstitial pages browsers get, so requests identify as wget.

/// User-Agent for every download request.
pub(crate) const DOWNLOAD_USER_AGENT: &str = "Wget/1.19.4 (linux-gnu)";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_user_agent_identifies_as_wget() {
        assert!(DOWNLOAD_USER_AGENT.starts_with("Wget/"));
        assert!(DOWNLOAD_USER_AGENT.is_ascii());
    }
}
