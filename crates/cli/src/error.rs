use kotopdf::BookError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Book(#[from] BookError),

	#[error("book id must not be empty")]
	EmptyBookId,
}

pub type Result<T> = std::result::Result<T, CliError>;
