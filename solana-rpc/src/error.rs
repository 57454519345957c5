pub type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("transport: {0}")]
	Transport(#[source] AnyError),
	#[error("malformed response: {0}")]
	Malformed(String),
}

impl Error {
	pub fn transport(e: impl Into<AnyError>) -> Self {
		Self::Transport(e.into())
	}
}
