use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthorListError {
    /// A registry profile that cannot become an author, e.g. no family name.
    #[error("malformed author record {orcid}: {reason}")]
    MalformedAuthorRecord { orcid: String, reason: String },

    #[error("invalid roster: {0}")]
    InvalidRoster(String),
}
