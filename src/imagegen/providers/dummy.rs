//! Offline providers.
//!
//! - [`DummyProvider`] echoes the wall image back; exercises the remote tier
//!   without a network.
//! - [`LocalOnlyProvider`] refuses every call so the compositor always goes
//!   straight to local compositing.

use crate::imagegen::{InlineImage, ProviderError};

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn edit(
        &self,
        _instruction: &str,
        wall: &InlineImage,
        _artwork: &InlineImage,
    ) -> Result<InlineImage, ProviderError> {
        Ok(wall.clone())
    }
}

#[derive(Debug, Clone)]
pub struct LocalOnlyProvider;

impl LocalOnlyProvider {
    pub async fn edit(
        &self,
        _instruction: &str,
        _wall: &InlineImage,
        _artwork: &InlineImage,
    ) -> Result<InlineImage, ProviderError> {
        Err(ProviderError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(bytes: &[u8]) -> InlineImage {
        InlineImage::new("image/png", bytes.to_vec())
    }

    #[tokio::test]
    async fn dummy_echoes_wall() {
        let out = DummyProvider.edit("place it", &img(b"wall"), &img(b"art")).await.unwrap();
        assert_eq!(out.data, b"wall");
    }

    #[tokio::test]
    async fn local_only_refuses() {
        let err = LocalOnlyProvider.edit("place it", &img(b"wall"), &img(b"art")).await;
        assert!(matches!(err, Err(ProviderError::Disabled)));
    }
}
