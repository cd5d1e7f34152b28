use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    /// Input ended before the blank line that separates headers from body
    #[error("no header/body separator found in message")]
    MissingSeparator,
}
