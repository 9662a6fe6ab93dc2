//! Database repositories for members and bills.

pub mod bills;
pub mod members;

/// Error type shared by repository operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
