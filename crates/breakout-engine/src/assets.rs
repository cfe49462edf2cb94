//! Asset-loading seam.
//!
//! Textures belong to the host. The core asks an [`AssetLoader`] for a
//! handle per named image and only keeps the returned [`TextureHandle`]s.

use crate::components::TextureHandle;

pub const BACKGROUND: &str = "Images/background";
pub const BRICK: &str = "Images/brick";
pub const PADDLE: &str = "Images/paddle";
pub const BALL: &str = "Images/ball";

/// Errors reported by an [`AssetLoader`].
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset '{name}' not found")]
    NotFound { name: String },

    #[error("failed to load asset '{name}': {message}")]
    Backend { name: String, message: String },
}

/// Host-side texture loader.
pub trait AssetLoader {
    fn load_texture(&mut self, name: &str) -> Result<TextureHandle, AssetError>;
}

/// Texture handles for every sprite the game draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameAssets {
    pub background: TextureHandle,
    pub brick: TextureHandle,
    pub paddle: TextureHandle,
    pub ball: TextureHandle,
}

impl GameAssets {
    /// Load all four textures. The first failure aborts the load.
    pub fn load(loader: &mut dyn AssetLoader) -> Result<Self, AssetError> {
        let assets = Self {
            background: loader.load_texture(BACKGROUND)?,
            brick: loader.load_texture(BRICK)?,
            paddle: loader.load_texture(PADDLE)?,
            ball: loader.load_texture(BALL)?,
        };
        tracing::debug!(?assets, "textures loaded");
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        requested: Vec<String>,
    }

    impl AssetLoader for Counting {
        fn load_texture(&mut self, name: &str) -> Result<TextureHandle, AssetError> {
            self.requested.push(name.to_owned());
            Ok(TextureHandle(self.requested.len() as u32))
        }
    }

    struct Missing(&'static str);

    impl AssetLoader for Missing {
        fn load_texture(&mut self, name: &str) -> Result<TextureHandle, AssetError> {
            if name == self.0 {
                Err(AssetError::NotFound { name: name.to_owned() })
            } else {
                Ok(TextureHandle(0))
            }
        }
    }

    #[test]
    fn loads_every_texture_in_order() {
        let mut loader = Counting::default();
        let assets = GameAssets::load(&mut loader).unwrap();
        assert_eq!(loader.requested, vec![BACKGROUND, BRICK, PADDLE, BALL]);
        assert_eq!(assets.ball, TextureHandle(4));
    }

    #[test]
    fn missing_texture_fails_the_load() {
        let err = GameAssets::load(&mut Missing(PADDLE)).unwrap_err();
        assert!(matches!(err, AssetError::NotFound { ref name } if name == PADDLE));
    }
}
