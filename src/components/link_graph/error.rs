//! Error types for graph construction and initialization.

use thiserror::Error;

/// A selector string that could not be parsed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid selector `{input}`")]
pub struct SelectorError {
	/// The rejected selector text.
	pub input: String,
}

/// Errors raised while building or driving the graph instance.
#[derive(Debug, Error)]
pub enum GraphError {
	/// An element was given without a usable `data.id`.
	#[error("element in `{group}` has no id")]
	MissingId {
		/// Group the element was declared in.
		group: &'static str,
	},
	/// Two elements share the same id.
	#[error("duplicate element id `{0}`")]
	DuplicateId(String),
	/// An edge references a node that does not exist.
	#[error("edge `{edge}` references unknown node `{node}`")]
	MissingEndpoint {
		/// The offending edge.
		edge: String,
		/// The endpoint that could not be resolved.
		node: String,
	},
	/// An event name that the instance does not emit.
	#[error("unknown event type `{0}`")]
	UnknownEvent(String),
	/// No layout is registered under this name.
	#[error("no such layout `{0}`")]
	UnknownLayout(String),
	/// A binding or style rule carried an invalid selector.
	#[error(transparent)]
	Selector(#[from] SelectorError),
}

/// Errors returned by [`Initializer::init`](super::init::Initializer::init).
#[derive(Debug, Error)]
pub enum InitError {
	/// The initializer already produced an instance.
	#[error("graph instance already initialized")]
	AlreadyInitialized,
	/// The container element could not be found in the document.
	#[error("container `{0}` not found")]
	MissingContainer(String),
	/// Building the instance failed.
	#[error(transparent)]
	Graph(#[from] GraphError),
}
