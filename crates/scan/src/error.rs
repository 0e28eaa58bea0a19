use texdep_expand::SourceLocation;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    /// An `\end` that does not terminate the innermost open environment,
    /// an `\end` with nothing open, or an environment left open at end of
    /// input. Always fatal.
    #[error("malformed environment `{name}` at {location}: {detail}")]
    MalformedEnvironment {
        name: String,
        location: SourceLocation,
        detail: String,
    },
}
