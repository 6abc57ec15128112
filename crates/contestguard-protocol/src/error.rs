//! Error types for the protocol layer.

/// Errors raised while interpreting a client payload.
///
/// Most of what students send is accepted permissively (see
/// [`LogSubmission`](crate::LogSubmission)); the only payload that can be
/// outright rejected is the admin's allowed-IP list, because replacing the
/// policy with garbage would lock students out of the contest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// `allowed_ips` was present but not a JSON array of strings.
    #[error("allowed_ips must be a list of strings")]
    InvalidIpList,
}
