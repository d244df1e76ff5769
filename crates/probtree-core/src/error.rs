pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("graph has no nodes")]
    EmptyGraph,

    #[error(
        "unrecognized input shape: expected a flat graph ({{nodes, edges}}), an adjacency bundle ({{root, nodes_by_id}}) or a nested tree object"
    )]
    UnknownInputShape,

    #[error("invalid settings: {message}")]
    InvalidSettings { message: String },
}
