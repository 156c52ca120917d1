//! Collision layer system for filtering collision detection
//!
//! A collider sits on exactly one [`CollisionLayer`] (what it is) and carries
//! a [`CollisionLayers`] mask (what it is willing to hit). Masks compose with
//! `|` and pairs are filtered with a single `&`.

use bitflags::bitflags;

/// Category of a collider; each variant is a distinct power of two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u32)]
pub enum CollisionLayer {
    /// Anything without a more specific category
    #[default]
    Default = 1 << 0,
    /// Player character
    Player = 1 << 1,
    /// Enemies and their attacks
    Enemy = 1 << 2,
    /// Player projectiles
    Bullet = 1 << 3,
    /// Static level geometry
    Wall = 1 << 4,
    /// Pickups and collectibles
    Item = 1 << 5,
}

impl CollisionLayer {
    /// Every layer, in bit order
    pub const ALL: [CollisionLayer; 6] = [
        CollisionLayer::Default,
        CollisionLayer::Player,
        CollisionLayer::Enemy,
        CollisionLayer::Bullet,
        CollisionLayer::Wall,
        CollisionLayer::Item,
    ];

    /// Raw bit value
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Single-layer mask
    pub const fn mask(self) -> CollisionLayers {
        CollisionLayers::from_bits_retain(self.bits())
    }
}

bitflags! {
    /// Bit set of collision layers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionLayers: u32 {
        /// [`CollisionLayer::Default`]
        const DEFAULT = CollisionLayer::Default.bits();
        /// [`CollisionLayer::Player`]
        const PLAYER = CollisionLayer::Player.bits();
        /// [`CollisionLayer::Enemy`]
        const ENEMY = CollisionLayer::Enemy.bits();
        /// [`CollisionLayer::Bullet`]
        const BULLET = CollisionLayer::Bullet.bits();
        /// [`CollisionLayer::Wall`]
        const WALL = CollisionLayer::Wall.bits();
        /// [`CollisionLayer::Item`]
        const ITEM = CollisionLayer::Item.bits();
    }
}

impl CollisionLayers {
    /// No collision layer
    pub const NONE: Self = Self::empty();

    /// Every bit set, including layers not named above
    pub const EVERYTHING: Self = Self::from_bits_retain(u32::MAX);

    /// Whether `layer` is part of this mask
    pub const fn accepts(self, layer: CollisionLayer) -> bool {
        self.bits() & layer.bits() != 0
    }

    /// Check if two colliders should collide based on their layers and masks
    ///
    /// Both masks must accept the other side's layer.
    ///
    /// # Example
    /// ```
    /// use sweep_engine::physics::{CollisionLayer, CollisionLayers};
    ///
    /// let player_mask = CollisionLayer::Enemy | CollisionLayer::Wall;
    /// let enemy_mask = CollisionLayer::Player | CollisionLayer::Bullet;
    ///
    /// assert!(CollisionLayers::should_collide(
    ///     CollisionLayer::Player, player_mask,
    ///     CollisionLayer::Enemy, enemy_mask,
    /// ));
    /// ```
    pub const fn should_collide(
        layer_a: CollisionLayer,
        mask_a: CollisionLayers,
        layer_b: CollisionLayer,
        mask_b: CollisionLayers,
    ) -> bool {
        mask_b.accepts(layer_a) && mask_a.accepts(layer_b)
    }

    /// Helper to create a mask from multiple layers
    pub fn mask(layers: &[CollisionLayer]) -> Self {
        layers
            .iter()
            .fold(Self::NONE, |acc, &layer| acc | layer.mask())
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::EVERYTHING
    }
}

impl From<CollisionLayer> for CollisionLayers {
    fn from(layer: CollisionLayer) -> Self {
        layer.mask()
    }
}

impl std::ops::BitOr for CollisionLayer {
    type Output = CollisionLayers;

    fn bitor(self, rhs: Self) -> CollisionLayers {
        self.mask() | rhs.mask()
    }
}

impl std::ops::BitOr<CollisionLayer> for CollisionLayers {
    type Output = CollisionLayers;

    fn bitor(self, rhs: CollisionLayer) -> CollisionLayers {
        self | rhs.mask()
    }
}
